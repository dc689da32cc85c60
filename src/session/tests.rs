use bytes::{Bytes, BytesMut};

use crate::{
	coding::{Encode, Reader, Stream, Version, Writer},
	data::{FrameHeader, GroupFlags, GroupHeader},
	message::{self, Message, RequestId},
	transport::mem::{pair, MemSession},
	transport::Session as _,
	Broadcast, Error, Path, Session, Track,
};

/// The scripted peer side of a session, driven manually over the raw codec.
struct Peer {
	session: MemSession,
	control: Stream<MemSession, Version>,
	version: Version,
}

impl Peer {
	async fn send<M: Message>(&mut self, msg: &M) {
		let mut buf = BytesMut::new();
		M::ID.encode(&mut buf, self.version);
		msg.encode_framed(&mut buf, self.version).unwrap();
		self.control.writer.write_all(&mut buf).await.unwrap();
	}

	async fn recv<M: Message>(&mut self) -> M {
		let id: u64 = self.control.reader.decode().await.unwrap();
		assert_eq!(id, M::ID, "unexpected message id");

		let size = match self.version {
			Version::DRAFT_07 => self.control.reader.decode::<usize>().await.unwrap(),
			_ => self.control.reader.decode::<u16>().await.unwrap() as usize,
		};

		let mut data = self.control.reader.read_exact(size).await.unwrap();
		let msg = M::decode_msg(&mut data, self.version).unwrap();
		assert!(data.is_empty(), "trailing bytes in control message");
		msg
	}
}

/// Handshake a client session against a hand-driven peer.
async fn connect(version: Version) -> (Session<MemSession>, Peer) {
	let (client, server) = pair();

	let connecting = tokio::spawn(async move { Session::connect(client).await });

	let control = Stream::accept(&server, Version::DRAFT_14).await.unwrap();
	let mut peer = Peer {
		session: server,
		control,
		// Setup always uses draft-14 framing.
		version: Version::DRAFT_14,
	};

	let setup: message::ClientSetup = peer.recv().await;
	assert!(setup.versions.contains(&version));

	peer.send(&message::ServerSetup {
		version,
		parameters: Default::default(),
	})
	.await;

	let session = connecting.await.unwrap().unwrap();
	peer.version = version;

	if version != Version::DRAFT_07 {
		// The engine advertises its request id window right away.
		let max: message::MaxRequestId = peer.recv().await;
		assert_eq!(max.request_id, RequestId((1 << 31) - 1));
	}

	(session, peer)
}

#[tokio::test]
async fn announce_and_teardown() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	let broadcast = Broadcast::produce();
	session.publish("room/a", broadcast.consumer).unwrap();

	let announce: message::PublishNamespace = peer.recv().await;
	assert_eq!(announce.request_id, RequestId(0));
	assert_eq!(announce.track_namespace.as_str(), "room/a");

	// Closing the broadcast withdraws the namespace.
	drop(broadcast.producer);

	let done: message::PublishNamespaceDone = peer.recv().await;
	assert_eq!(done.track_namespace.as_str(), "room/a");
}

#[tokio::test]
async fn subscribe_unknown_broadcast() {
	let (_session, mut peer) = connect(Version::DRAFT_14).await;

	peer.send(&message::Subscribe {
		request_id: RequestId(42),
		track_namespace: Path::new("room/missing"),
		track_name: "video".into(),
		subscriber_priority: 128,
	})
	.await;

	let err: message::SubscribeError = peer.recv().await;
	assert_eq!(err.request_id, RequestId(42));
	assert_eq!(err.error_code, 404);
	assert_eq!(err.reason_phrase, "Broadcast not found");
}

#[tokio::test]
async fn subscribe_known_broadcast() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	let broadcast = Broadcast::produce();
	session.publish("room/a", broadcast.consumer).unwrap();
	let _announce: message::PublishNamespace = peer.recv().await;

	// The application serves the requested track with a single group. The
	// broadcast itself stays open until the end of the test.
	let mut producer = broadcast.producer;
	let serving = tokio::spawn(async move {
		let track = producer.requested_track().await.unwrap();
		assert_eq!(track.info.name, "video");
		assert_eq!(track.info.priority, 200);

		let group = track.create_group(0);
		group.write_frame(Bytes::from_static(&[0x01, 0x02, 0x03]));
		group.close();
		track.close();

		producer
	});

	peer.send(&message::Subscribe {
		request_id: RequestId(7),
		track_namespace: Path::new("room/a"),
		track_name: "video".into(),
		subscriber_priority: 200,
	})
	.await;

	let ok: message::SubscribeOk = peer.recv().await;
	assert_eq!(ok.request_id, RequestId(7));

	// The group arrives on its own unidirectional stream.
	let stream = peer.session.accept_uni().await.unwrap();
	let mut reader = Reader::new(stream, Version::DRAFT_14);

	let header: GroupHeader = reader.decode().await.unwrap();
	assert_eq!(header.request_id, RequestId(7));
	assert_eq!(header.group_id, 0);
	assert!(header.flags.has_end);
	assert!(!header.flags.has_subgroup);
	assert!(!header.flags.has_subgroup_object);
	assert!(!header.flags.has_extensions);

	let mut reader = reader.with_version((header.flags, Version::DRAFT_14));
	let frame = reader.decode_maybe::<FrameHeader>().await.unwrap().unwrap();
	assert_eq!(frame, FrameHeader::Payload(3));
	assert_eq!(reader.read_exact(3).await.unwrap().as_ref(), &[0x01, 0x02, 0x03]);

	// The stream FIN is the end of the group.
	assert!(reader.decode_maybe::<FrameHeader>().await.unwrap().is_none());

	let done: message::PublishDone = peer.recv().await;
	assert_eq!(done.request_id, RequestId(7));
	assert_eq!(done.status_code, 200);
	assert_eq!(done.reason_phrase, "OK");

	// Closing the broadcast now withdraws the namespace.
	drop(serving.await.unwrap());
	let done: message::PublishNamespaceDone = peer.recv().await;
	assert_eq!(done.track_namespace.as_str(), "room/a");
}

#[tokio::test]
async fn consumer_subscribe() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	let broadcast = session.consume("room/b");
	let mut track = broadcast.subscribe_track(Track {
		name: "audio".to_string(),
		priority: 64,
	});

	let subscribe: message::Subscribe = peer.recv().await;
	assert_eq!(subscribe.request_id, RequestId(0));
	assert_eq!(subscribe.track_namespace.as_str(), "room/b");
	assert_eq!(subscribe.track_name, "audio");
	assert_eq!(subscribe.subscriber_priority, 64);

	peer.send(&message::SubscribeOk {
		request_id: subscribe.request_id,
	})
	.await;

	// Serve group 5 with two frames and a FIN.
	let stream = peer.session.open_uni().await.unwrap();
	let flags = GroupFlags {
		has_end: true,
		..Default::default()
	};
	let mut writer = Writer::new(stream, Version::DRAFT_14);
	writer
		.encode(&GroupHeader {
			request_id: subscribe.request_id,
			group_id: 5,
			publisher_priority: 0,
			flags,
		})
		.await
		.unwrap();

	let mut writer = writer.with_version((flags, Version::DRAFT_14));
	writer.encode(&FrameHeader::Payload(2)).await.unwrap();
	writer.write_all(&mut Bytes::from_static(b"aa")).await.unwrap();
	writer.encode(&FrameHeader::Payload(1)).await.unwrap();
	writer.write_all(&mut Bytes::from_static(b"b")).await.unwrap();
	writer.finish().unwrap();

	let mut group = track.next_group().await.unwrap().unwrap();
	assert_eq!(group.info.sequence, 5);
	assert_eq!(group.read_frame().await.unwrap().unwrap().as_ref(), b"aa");
	assert_eq!(group.read_frame().await.unwrap().unwrap().as_ref(), b"b");
	assert!(group.read_frame().await.unwrap().is_none());

	// Dropping the track tells the peer we lost interest.
	drop(group);
	drop(track);

	let unsubscribe: message::Unsubscribe = peer.recv().await;
	assert_eq!(unsubscribe.request_id, subscribe.request_id);
}

#[tokio::test]
async fn namespace_subscription() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	let mut announced = session.announced("room/").unwrap();

	let interest: message::SubscribeNamespace = peer.recv().await;
	let request_id = interest.request_id;
	assert_eq!(interest.prefix.as_str(), "room");

	peer.send(&message::PublishNamespace {
		request_id: RequestId(1),
		track_namespace: Path::new("room/x"),
	})
	.await;

	let event = announced.next().await.unwrap();
	assert_eq!(event.path.as_str(), "room/x");
	assert!(event.active);

	// The engine acknowledges the announcement.
	let ok: message::PublishNamespaceOk = peer.recv().await;
	assert_eq!(ok.request_id, RequestId(1));

	peer.send(&message::PublishNamespaceDone {
		track_namespace: Path::new("room/x"),
	})
	.await;

	let event = announced.next().await.unwrap();
	assert_eq!(event.path.as_str(), "room/x");
	assert!(!event.active);

	// Closing the endpoint unsubscribes.
	drop(announced);

	let unsubscribe: message::UnsubscribeNamespace = peer.recv().await;
	assert_eq!(unsubscribe.request_id, request_id);
}

#[tokio::test]
async fn announced_replays_active_paths() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	// An announcement that arrives before anyone subscribes.
	peer.send(&message::PublishNamespace {
		request_id: RequestId(1),
		track_namespace: Path::new("room/x"),
	})
	.await;
	let _ok: message::PublishNamespaceOk = peer.recv().await;

	let mut announced = session.announced("room/").unwrap();
	let _interest: message::SubscribeNamespace = peer.recv().await;

	let event = announced.next().await.unwrap();
	assert_eq!(event.path.as_str(), "room/x");
	assert!(event.active);

	// Paths outside the prefix are filtered.
	peer.send(&message::PublishNamespace {
		request_id: RequestId(3),
		track_namespace: Path::new("lobby/y"),
	})
	.await;
	peer.send(&message::PublishNamespace {
		request_id: RequestId(5),
		track_namespace: Path::new("room/z"),
	})
	.await;

	let event = announced.next().await.unwrap();
	assert_eq!(event.path.as_str(), "room/z");
}

#[tokio::test]
async fn subscribe_rejected_by_peer() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	let broadcast = session.consume("room/b");
	let mut track = broadcast.subscribe_track(Track {
		name: "audio".to_string(),
		priority: 0,
	});

	let subscribe: message::Subscribe = peer.recv().await;
	peer.send(&message::SubscribeError {
		request_id: subscribe.request_id,
		error_code: 404,
		reason_phrase: "no such track".into(),
	})
	.await;

	// A per-subscription failure, not a session failure.
	match track.next_group().await {
		Err(Error::Failed { code: 404, .. }) => {}
		other => panic!("expected subscription failure, got {other:?}"),
	}
}

#[tokio::test]
async fn goaway_is_fatal() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	peer.send(&message::GoAway {
		new_session_uri: "https://elsewhere".into(),
	})
	.await;

	// The session closes without following the redirect.
	assert!(matches!(session.closed().await, Error::Unsupported));
	peer.session.closed().await;
}

#[tokio::test]
async fn lite_variant_subscribe() {
	let (session, mut peer) = connect(Version::DRAFT_07).await;

	let broadcast = session.consume("room/c");
	let mut track = broadcast.subscribe_track(Track {
		name: "audio".to_string(),
		priority: 1,
	});

	let subscribe: message::Subscribe = peer.recv().await;
	assert_eq!(subscribe.request_id, RequestId(0));
	assert_eq!(subscribe.track_namespace.as_str(), "room/c");

	peer.send(&message::SubscribeOk {
		request_id: subscribe.request_id,
	})
	.await;

	// A lite group stream: plain header, bare length-prefixed frames.
	let stream = peer.session.open_uni().await.unwrap();
	let mut writer = Writer::new(stream, Version::DRAFT_07);
	writer
		.encode(&GroupHeader {
			request_id: subscribe.request_id,
			group_id: 2,
			publisher_priority: 0,
			flags: GroupFlags {
				has_end: true,
				..Default::default()
			},
		})
		.await
		.unwrap();

	let mut writer = writer.with_version((GroupFlags::default(), Version::DRAFT_07));
	writer.encode(&FrameHeader::Payload(2)).await.unwrap();
	writer.write_all(&mut Bytes::from_static(b"hi")).await.unwrap();
	writer.finish().unwrap();

	let mut group = track.next_group().await.unwrap().unwrap();
	assert_eq!(group.info.sequence, 2);
	assert_eq!(group.read_frame().await.unwrap().unwrap().as_ref(), b"hi");
	assert!(group.read_frame().await.unwrap().is_none());

	// Lite request ids advance by 1.
	let _track2 = broadcast.subscribe_track(Track {
		name: "video".to_string(),
		priority: 2,
	});
	let subscribe: message::Subscribe = peer.recv().await;
	assert_eq!(subscribe.request_id, RequestId(1));
}

#[tokio::test]
async fn unknown_object_stream_is_stopped() {
	let (session, mut peer) = connect(Version::DRAFT_14).await;

	// A group for a request id nobody subscribed to.
	let stream = peer.session.open_uni().await.unwrap();
	let flags = GroupFlags {
		has_end: true,
		..Default::default()
	};
	let mut writer = Writer::new(stream, Version::DRAFT_14);
	writer
		.encode(&GroupHeader {
			request_id: RequestId(88),
			group_id: 0,
			publisher_priority: 0,
			flags,
		})
		.await
		.unwrap();

	// The engine stops the stream; the session stays up.
	writer.closed().await;

	let broadcast = session.consume("room/d");
	let _track = broadcast.subscribe_track(Track {
		name: "audio".to_string(),
		priority: 0,
	});
	let subscribe: message::Subscribe = peer.recv().await;
	assert_eq!(subscribe.track_namespace.as_str(), "room/d");
}
