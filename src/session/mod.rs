mod control;
mod publisher;
mod subscriber;

#[cfg(test)]
mod tests;

use control::Control;
use publisher::Publisher;
use subscriber::Subscriber;

use bytes::BytesMut;
use tokio::sync::mpsc;

use crate::{
	coding::{Encode, Reader, Stream, Version},
	message::{self, unsupported, Message, RequestId},
	transport, AnnouncedConsumer, BroadcastConsumer, Effect, Error, PathOwned, Signal,
};

/// The versions offered by [Session::connect], in preference order.
pub const VERSIONS: [Version; 2] = [Version::DRAFT_14, Version::DRAFT_07];

/// A MoQ session riding on an established transport.
///
/// One bidirectional control stream carries typed messages in both directions;
/// each group of each subscribed track arrives on its own unidirectional
/// stream. Dropping the session (or calling [Session::close]) tears down the
/// engine and closes the transport.
pub struct Session<S: transport::Session> {
	transport: S,
	publisher: Publisher<S>,
	subscriber: Subscriber<S>,
	closed: Signal<Option<Error>>,
	_scope: Effect,
}

impl<S: transport::Session> Session<S> {
	/// Perform the MoQ handshake as a client, negotiating the version.
	pub async fn connect(transport: S) -> Result<Self, Error> {
		// Setup is always exchanged with draft-14 framing; the negotiated
		// framing applies afterwards.
		let mut stream = Stream::open(&transport, Version::DRAFT_14).await?;

		let client = message::ClientSetup {
			versions: VERSIONS.into(),
			parameters: Default::default(),
		};
		tracing::trace!(?client, "sending client setup");

		let mut buf = BytesMut::new();
		message::ClientSetup::ID.encode(&mut buf, Version::DRAFT_14);
		client.encode_framed(&mut buf, Version::DRAFT_14)?;
		stream.writer.write_all(&mut buf).await?;

		let id: u64 = stream.reader.decode().await?;
		if id != message::ServerSetup::ID {
			return Err(Error::UnexpectedMessage(id));
		}
		let size: u16 = stream.reader.decode().await?;
		let mut data = stream.reader.read_exact(size as usize).await?;
		let server = message::ServerSetup::decode_msg(&mut data, Version::DRAFT_14)?;
		if !data.is_empty() {
			return Err(Error::WrongSize);
		}
		tracing::trace!(?server, "received server setup");

		let version = server.version;
		if !VERSIONS.contains(&version) {
			return Err(Error::Version(client.versions, [version].into()));
		}

		let stream = stream.with_version(version);

		let (tx, rx) = mpsc::unbounded_channel();
		let control = Control::new(tx, version);

		if version != Version::DRAFT_07 {
			// Advertise an effectively-unlimited request id window.
			control.send(message::MaxRequestId {
				request_id: RequestId((1 << 31) - 1),
			})?;
		}

		let publisher = Publisher::new(transport.clone(), control.clone(), version);
		let subscriber = Subscriber::new(transport.clone(), control.clone(), version);

		let closed = Signal::new(None::<Error>);
		let mut scope = Effect::new();

		// Close the transport whenever the engine records a terminal error.
		scope.effect({
			let closed = closed.clone();
			let transport = transport.clone();
			move |scope| {
				if let Some(err) = scope.get(&closed) {
					transport.close(err.to_code(), &err.to_string());
				}
			}
		});

		// Tearing down the scope always closes the transport.
		scope.cleanup({
			let transport = transport.clone();
			move || transport.close(Error::Cancel.to_code(), "session dropped")
		});

		// Race the engine tasks to quiescence; any failure ends the session.
		scope.spawn({
			let publisher = publisher.clone();
			let subscriber = subscriber.clone();
			let transport = transport.clone();
			let closed = closed.clone();
			async move {
				let result = tokio::select! {
					result = run_read(stream.reader, version, publisher, subscriber.clone()) => result,
					result = Control::run::<S>(stream.writer, rx) => result,
					result = subscriber.run() => result,
					err = transport.closed() => Err(Error::from_transport(err)),
				};

				let err = match result {
					Ok(()) => {
						tracing::info!("session closed");
						Error::Cancel
					}
					Err(err) => {
						tracing::warn!(%err, "session error");
						err
					}
				};

				closed.replace(Some(err));
			}
		});

		tracing::debug!(?version, "connected");

		Ok(Self {
			transport,
			publisher,
			subscriber,
			closed,
			_scope: scope,
		})
	}

	/// Advertise `broadcast` to the peer under `path`.
	///
	/// The peer may then subscribe to its tracks; the namespace is withdrawn
	/// when the application closes the broadcast.
	pub fn publish(&self, path: impl Into<PathOwned>, broadcast: BroadcastConsumer) -> Result<(), Error> {
		self.publisher.publish(path.into(), broadcast)
	}

	/// Obtain a broadcast published by the peer under `path`.
	///
	/// Track subscriptions are materialized lazily as tracks are requested
	/// from the returned consumer.
	pub fn consume(&self, path: impl Into<PathOwned>) -> BroadcastConsumer {
		self.subscriber.consume(path.into())
	}

	/// Subscribe to namespace announcements under a prefix.
	///
	/// Currently-active paths are replayed, then events arrive as the peer
	/// announces or withdraws namespaces.
	pub fn announced(&self, prefix: impl Into<PathOwned>) -> Result<AnnouncedConsumer, Error> {
		self.subscriber.announced(prefix.into())
	}

	/// Shut down the session; all streams fail.
	pub fn close(self) {
		self.transport.close(Error::Cancel.to_code(), "");
	}

	/// Resolves when the session is closed, with the terminal error.
	pub async fn closed(&self) -> Error {
		self.closed.wait_for(|err| err.clone()).await
	}
}

/// The single reader of the control stream: demultiplex every message to the
/// publisher or subscriber.
async fn run_read<S: transport::Session>(
	mut reader: Reader<S::RecvStream, Version>,
	version: Version,
	publisher: Publisher<S>,
	subscriber: Subscriber<S>,
) -> Result<(), Error> {
	loop {
		let id: u64 = match reader.decode_maybe().await? {
			Some(id) => id,
			None => return Ok(()),
		};

		let size = match version {
			Version::DRAFT_07 => reader.decode::<usize>().await?,
			_ => reader.decode::<u16>().await? as usize,
		};
		tracing::trace!(id, size, "reading control message");

		let mut data = reader.read_exact(size).await?;
		tracing::trace!(hex = %hex::encode(&data), "decoding control message");

		match id {
			message::Subscribe::ID => {
				let msg = message::Subscribe::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_subscribe(msg)?;
			}
			message::SubscribeOk::ID => {
				let msg = message::SubscribeOk::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_subscribe_ok(msg)?;
			}
			message::SubscribeError::ID => {
				let msg = message::SubscribeError::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_subscribe_error(msg)?;
			}
			message::Unsubscribe::ID => {
				let msg = message::Unsubscribe::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_unsubscribe(msg)?;
			}
			message::PublishDone::ID => {
				let msg = message::PublishDone::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_publish_done(msg)?;
			}
			message::PublishNamespace::ID => {
				let msg = message::PublishNamespace::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_publish_namespace(msg)?;
			}
			message::PublishNamespaceOk::ID => {
				let msg = message::PublishNamespaceOk::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_publish_namespace_ok(msg)?;
			}
			message::PublishNamespaceError::ID => {
				let msg = message::PublishNamespaceError::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_publish_namespace_error(msg)?;
			}
			message::PublishNamespaceDone::ID => {
				let msg = message::PublishNamespaceDone::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_publish_namespace_done(msg)?;
			}
			message::PublishNamespaceCancel::ID => {
				let msg = message::PublishNamespaceCancel::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_publish_namespace_cancel(msg)?;
			}
			message::SubscribeNamespace::ID => {
				let msg = message::SubscribeNamespace::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_subscribe_namespace(msg)?;
			}
			message::SubscribeNamespaceOk::ID => {
				let msg = message::SubscribeNamespaceOk::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_subscribe_namespace_ok(msg)?;
			}
			message::SubscribeNamespaceError::ID => {
				let msg = message::SubscribeNamespaceError::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_subscribe_namespace_error(msg)?;
			}
			message::UnsubscribeNamespace::ID => {
				let msg = message::UnsubscribeNamespace::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_unsubscribe_namespace(msg)?;
			}
			message::TrackStatusRequest::ID => {
				let msg = message::TrackStatusRequest::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				publisher.recv_track_status_request(msg)?;
			}
			message::TrackStatus::ID => {
				let msg = message::TrackStatus::decode_msg(&mut data, version)?;
				tracing::debug!(message = ?msg, "received control message");
				subscriber.recv_track_status(msg)?;
			}
			message::MaxRequestId::ID => {
				let msg = message::MaxRequestId::decode_msg(&mut data, version)?;
				// No flow control is enforced on the allocator.
				tracing::debug!(message = ?msg, "ignoring max request id");
			}
			message::RequestsBlocked::ID => {
				let msg = message::RequestsBlocked::decode_msg(&mut data, version)?;
				tracing::warn!(message = ?msg, "ignoring requests blocked");
			}
			message::GoAway::ID => {
				let msg = message::GoAway::decode_msg(&mut data, version)?;
				// Redirects are not supported; tear down instead of following.
				tracing::warn!(uri = %msg.new_session_uri, "go away is not supported");
				return Err(Error::Unsupported);
			}
			unsupported::FETCH
			| unsupported::FETCH_CANCEL
			| unsupported::FETCH_OK
			| unsupported::FETCH_ERROR
			| unsupported::PUBLISH
			| unsupported::PUBLISH_OK
			| unsupported::PUBLISH_ERROR => {
				tracing::warn!(id, "unsupported control message");
				return Err(Error::Unsupported);
			}
			_ => return Err(Error::UnexpectedMessage(id)),
		}

		if !data.is_empty() {
			return Err(Error::WrongSize);
		}
	}
}
