use std::{
	collections::{HashMap, HashSet},
	sync::{Arc, Mutex},
};

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::{
	coding::{DecodeError, Reader, Version},
	data::{FrameHeader, GroupFlags, GroupHeader, GROUP_STREAM},
	message::{self, RequestId},
	transport, AnnouncedConsumer, AnnouncedProducer, Broadcast, BroadcastConsumer, Effect, Error, GroupProducer,
	PathOwned, TrackProducer,
};

use super::Control;

#[derive(Default)]
struct State {
	// Currently-active announcements from the peer.
	announced: HashSet<PathOwned>,

	// Application endpoints interested in announcements, by request id.
	consumers: HashMap<RequestId, AnnouncedEntry>,

	// Active incoming tracks, by request id.
	subscribes: HashMap<RequestId, TrackProducer>,

	// Pending Subscribe responses, by request id.
	callbacks: HashMap<RequestId, oneshot::Sender<Result<(), Error>>>,
}

struct AnnouncedEntry {
	prefix: PathOwned,
	producer: AnnouncedProducer,
}

/// Consumes remote broadcasts and announcements from the peer.
#[derive(Clone)]
pub(super) struct Subscriber<S: transport::Session> {
	session: S,
	control: Control,
	version: Version,
	state: Arc<Mutex<State>>,
}

impl<S: transport::Session> Subscriber<S> {
	pub fn new(session: S, control: Control, version: Version) -> Self {
		Self {
			session,
			control,
			version,
			state: Default::default(),
		}
	}

	/// Subscribe to namespace announcements under a prefix.
	pub fn announced(&self, prefix: PathOwned) -> Result<AnnouncedConsumer, Error> {
		let request_id = self.control.next_request_id();

		let mut scope = Effect::new();
		scope.cleanup({
			let control = self.control.clone();
			let state = self.state.clone();
			move || {
				state.lock().unwrap().consumers.remove(&request_id);
				control.send(message::UnsubscribeNamespace { request_id }).ok();
			}
		});

		let pair = AnnouncedConsumer::produce(scope);

		{
			let mut state = self.state.lock().unwrap();

			// Replay everything that is already active under the prefix.
			for path in state.announced.iter() {
				if path.has_prefix(&prefix) {
					pair.producer.announce(path.clone(), true);
				}
			}

			state.consumers.insert(
				request_id,
				AnnouncedEntry {
					prefix: prefix.clone(),
					producer: pair.producer,
				},
			);
		}

		self.control.send(message::SubscribeNamespace { request_id, prefix })?;

		Ok(pair.consumer)
	}

	/// Obtain a broadcast whose tracks are subscribed lazily on request.
	pub fn consume(&self, path: PathOwned) -> BroadcastConsumer {
		let broadcast = Broadcast::produce();
		let this = self.clone();

		tokio::spawn(async move {
			let mut producer = broadcast.producer;
			while let Some(track) = producer.requested_track().await {
				let this = this.clone();
				let path = path.clone();
				tokio::spawn(async move {
					this.run_subscribe(path, track).await;
				});
			}
		});

		broadcast.consumer
	}

	async fn run_subscribe(&self, path: PathOwned, track: TrackProducer) {
		let request_id = self.control.next_request_id();

		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.state.lock().unwrap();
			state.subscribes.insert(request_id, track.clone());
			state.callbacks.insert(request_id, tx);
		}

		let result = match self.control.send(message::Subscribe {
			request_id,
			track_namespace: path.clone(),
			track_name: track.info.name.as_str().into(),
			subscriber_priority: track.info.priority,
		}) {
			Ok(()) => rx.await.unwrap_or(Err(Error::Cancel)),
			Err(err) => Err(err),
		};

		match result {
			Ok(()) => {
				tracing::info!(broadcast = %path, track = %track.info.name, id = %request_id, "subscription started");

				tokio::select! {
					// The consumer lost interest; tell the peer.
					_ = track.unused() => {
						self.control.send(message::Unsubscribe { request_id }).ok();
						track.abort(Error::Cancel);
					}
					// The peer finished the track first.
					_ = track.closed() => {}
				}
			}
			Err(err) => {
				tracing::debug!(broadcast = %path, track = %track.info.name, id = %request_id, %err, "subscription failed");
				track.abort(err);
			}
		}

		let mut state = self.state.lock().unwrap();
		state.subscribes.remove(&request_id);
		state.callbacks.remove(&request_id);
	}

	pub fn recv_subscribe_ok(&self, msg: message::SubscribeOk) -> Result<(), Error> {
		match self.state.lock().unwrap().callbacks.remove(&msg.request_id) {
			Some(callback) => {
				callback.send(Ok(())).ok();
			}
			None => tracing::warn!(id = %msg.request_id, "subscribe ok for unknown request"),
		}
		Ok(())
	}

	pub fn recv_subscribe_error(&self, msg: message::SubscribeError<'_>) -> Result<(), Error> {
		match self.state.lock().unwrap().callbacks.remove(&msg.request_id) {
			Some(callback) => {
				callback
					.send(Err(Error::Failed {
						code: msg.error_code,
						reason: msg.reason_phrase.to_string(),
					}))
					.ok();
			}
			None => tracing::warn!(id = %msg.request_id, "subscribe error for unknown request"),
		}
		Ok(())
	}

	pub fn recv_publish_done(&self, msg: message::PublishDone<'_>) -> Result<(), Error> {
		let mut state = self.state.lock().unwrap();

		// A rejection can arrive as PublishDone before SubscribeOk.
		if let Some(callback) = state.callbacks.remove(&msg.request_id) {
			callback
				.send(Err(Error::Failed {
					code: msg.status_code,
					reason: msg.reason_phrase.to_string(),
				}))
				.ok();
			return Ok(());
		}

		match state.subscribes.remove(&msg.request_id) {
			Some(track) if msg.status_code == 200 => track.close(),
			Some(track) => track.abort(Error::Failed {
				code: msg.status_code,
				reason: msg.reason_phrase.to_string(),
			}),
			None => tracing::warn!(id = %msg.request_id, "publish done for unknown subscription"),
		}

		Ok(())
	}

	pub fn recv_publish_namespace(&self, msg: message::PublishNamespace<'_>) -> Result<(), Error> {
		let path = msg.track_namespace.to_owned();

		let mut state = self.state.lock().unwrap();
		if !state.announced.insert(path.clone()) {
			tracing::warn!(broadcast = %path, "duplicate announcement, ignoring");
			return Ok(());
		}

		tracing::debug!(broadcast = %path, "announced");
		for entry in state.consumers.values() {
			if path.has_prefix(&entry.prefix) {
				entry.producer.announce(path.clone(), true);
			}
		}
		drop(state);

		self.control.send(message::PublishNamespaceOk {
			request_id: msg.request_id,
		})
	}

	pub fn recv_publish_namespace_done(&self, msg: message::PublishNamespaceDone<'_>) -> Result<(), Error> {
		let path = msg.track_namespace.to_owned();

		let mut state = self.state.lock().unwrap();
		if !state.announced.remove(&path) {
			tracing::warn!(broadcast = %path, "unannounce for unknown path, ignoring");
			return Ok(());
		}

		tracing::debug!(broadcast = %path, "unannounced");
		for entry in state.consumers.values() {
			if path.has_prefix(&entry.prefix) {
				entry.producer.announce(path.clone(), false);
			}
		}

		Ok(())
	}

	pub fn recv_subscribe_namespace_ok(&self, msg: message::SubscribeNamespaceOk) -> Result<(), Error> {
		match self.state.lock().unwrap().consumers.get(&msg.request_id) {
			Some(entry) => tracing::debug!(prefix = %entry.prefix, "announcement subscription accepted"),
			None => tracing::warn!(id = %msg.request_id, "namespace ok for unknown request"),
		}
		Ok(())
	}

	pub fn recv_subscribe_namespace_error(&self, msg: message::SubscribeNamespaceError<'_>) -> Result<(), Error> {
		tracing::warn!(id = %msg.request_id, code = msg.error_code, reason = %msg.reason_phrase, "announcement subscription rejected");

		// Dropping the producer ends the endpoint's stream.
		self.state.lock().unwrap().consumers.remove(&msg.request_id);
		Ok(())
	}

	pub fn recv_track_status(&self, msg: message::TrackStatus) -> Result<(), Error> {
		tracing::debug!(id = %msg.request_id, status = ?msg.status, "track status");
		Ok(())
	}

	/// Accept incoming unidirectional object streams.
	pub async fn run(self) -> Result<(), Error> {
		loop {
			let stream = self.session.accept_uni().await.map_err(Error::from_transport)?;
			let reader = Reader::new(stream, self.version);

			let this = self.clone();
			tokio::spawn(async move {
				if let Err(err) = this.run_stream(reader).await {
					tracing::debug!(%err, "object stream failed");
				}
			});
		}
	}

	async fn run_stream(&self, mut reader: Reader<S::RecvStream, Version>) -> Result<(), Error> {
		let kind: u64 = reader.decode_peek().await?;

		let expected = match self.version {
			Version::DRAFT_07 => kind == GROUP_STREAM,
			_ => (GroupFlags::START..=GroupFlags::END).contains(&kind),
		};
		if !expected {
			let err = Error::UnexpectedStream(kind);
			reader.abort(&err);
			return Err(err);
		}

		let header: GroupHeader = match reader.decode().await {
			Ok(header) => header,
			Err(err) => {
				reader.abort(&err);
				return Err(err);
			}
		};
		tracing::trace!(?header, "received group header");

		// Frame decoding depends on the group's flags.
		let mut reader = reader.with_version((header.flags, self.version));

		if let Err(err) = self.recv_group(&header, &mut reader).await {
			reader.abort(&err);
			return Err(err);
		}

		Ok(())
	}

	async fn recv_group(
		&self,
		header: &GroupHeader,
		reader: &mut Reader<S::RecvStream, (GroupFlags, Version)>,
	) -> Result<(), Error> {
		let (producer, track) = {
			let state = self.state.lock().unwrap();
			let track = state.subscribes.get(&header.request_id).ok_or(Error::NotFound)?;
			let producer = track.create_group(header.group_id);
			(producer, track.clone())
		};

		let result = tokio::select! {
			biased;
			// The consumer no longer wants this group.
			_ = producer.unused() => Err(Error::Cancel),
			// The consumer no longer wants the track.
			_ = track.closed() => Err(Error::Cancel),
			result = Self::run_group(reader, &producer) => result,
		};

		match result {
			Ok(()) => {
				tracing::trace!(group = %producer.info.sequence, "group complete");
				producer.close();
				Ok(())
			}
			Err(err) => {
				producer.abort(err.clone());
				Err(err)
			}
		}
	}

	async fn run_group(
		reader: &mut Reader<S::RecvStream, (GroupFlags, Version)>,
		producer: &GroupProducer,
	) -> Result<(), Error> {
		loop {
			match reader.decode_maybe::<FrameHeader>().await? {
				// The stream ended; the FIN is the end marker.
				None => return Ok(()),
				Some(FrameHeader::End) => return Ok(()),
				Some(FrameHeader::Empty) => producer.write_frame(Bytes::new()),
				Some(FrameHeader::Payload(size)) => {
					let size = usize::try_from(size).map_err(|_| DecodeError::BoundsExceeded)?;
					let payload = reader.read_exact(size).await?;
					producer.write_frame(payload);
				}
			}
		}
	}
}
