use std::{
	collections::{hash_map::Entry, HashMap},
	sync::{Arc, Mutex},
};

use tokio::sync::oneshot;

use crate::{
	coding::{Version, Writer},
	data::{FrameHeader, GroupFlags, GroupHeader},
	message::{self, RequestId, TrackStatusCode},
	transport, BroadcastConsumer, Error, GroupConsumer, PathOwned, Track, TrackConsumer,
};

use super::Control;

/// Serves locally-published broadcasts to the peer.
#[derive(Clone)]
pub(super) struct Publisher<S: transport::Session> {
	session: S,
	control: Control,
	version: Version,

	// Everything published via [Session::publish], by namespace.
	broadcasts: Arc<Mutex<HashMap<PathOwned, BroadcastConsumer>>>,

	// Outstanding PublishNamespace requests, to correlate replies.
	announces: Arc<Mutex<HashMap<RequestId, PathOwned>>>,

	// Active subscriptions from the peer; send to cancel.
	subscribes: Arc<Mutex<HashMap<RequestId, oneshot::Sender<()>>>>,
}

impl<S: transport::Session> Publisher<S> {
	pub fn new(session: S, control: Control, version: Version) -> Self {
		Self {
			session,
			control,
			version,
			broadcasts: Default::default(),
			announces: Default::default(),
			subscribes: Default::default(),
		}
	}

	/// Advertise a broadcast under the given namespace.
	///
	/// The namespace is withdrawn once the application closes the broadcast.
	pub fn publish(&self, path: PathOwned, broadcast: BroadcastConsumer) -> Result<(), Error> {
		match self.broadcasts.lock().unwrap().entry(path.clone()) {
			Entry::Occupied(_) => return Err(Error::Duplicate),
			Entry::Vacant(entry) => entry.insert(broadcast.clone()),
		};

		let request_id = self.control.next_request_id();
		self.announces.lock().unwrap().insert(request_id, path.clone());

		if let Err(err) = self.control.send(message::PublishNamespace {
			request_id,
			track_namespace: path.clone(),
		}) {
			self.broadcasts.lock().unwrap().remove(&path);
			return Err(err);
		}

		tracing::debug!(broadcast = %path, id = %request_id, "publishing namespace");

		let this = self.clone();
		tokio::spawn(async move {
			broadcast.closed().await;
			tracing::debug!(broadcast = %path, "namespace done");

			if this.broadcasts.lock().unwrap().remove(&path).is_some() {
				this.control
					.send(message::PublishNamespaceDone {
						track_namespace: path,
					})
					.ok();
			}
			this.announces.lock().unwrap().remove(&request_id);
		});

		Ok(())
	}

	pub fn recv_subscribe(&self, msg: message::Subscribe<'_>) -> Result<(), Error> {
		let request_id = msg.request_id;
		let path = msg.track_namespace.to_owned();

		let broadcast = self.broadcasts.lock().unwrap().get(&path).cloned();
		let Some(broadcast) = broadcast else {
			tracing::debug!(broadcast = %path, id = %request_id, "subscribe for unknown broadcast");
			return self.control.send(message::SubscribeError {
				request_id,
				error_code: 404,
				reason_phrase: "Broadcast not found".into(),
			});
		};

		let priority = msg.subscriber_priority;
		let track = broadcast.subscribe_track(Track {
			name: msg.track_name.to_string(),
			priority,
		});

		self.control.send(message::SubscribeOk { request_id })?;
		tracing::info!(broadcast = %path, track = %track.info.name, id = %request_id, "subscribe started");

		let (cancel_tx, cancel_rx) = oneshot::channel();
		self.subscribes.lock().unwrap().insert(request_id, cancel_tx);

		let this = self.clone();
		tokio::spawn(async move {
			let res = Self::run_track(this.session.clone(), this.version, request_id, track, cancel_rx).await;

			let done = match &res {
				Ok(()) => message::PublishDone {
					request_id,
					status_code: 200,
					stream_count: 0,
					reason_phrase: "OK".into(),
				},
				Err(err) => message::PublishDone {
					request_id,
					status_code: 500,
					stream_count: 0,
					reason_phrase: err.to_string().into(),
				},
			};
			this.control.send(done).ok();

			if let Err(err) = res {
				tracing::debug!(%err, id = %request_id, "subscribe failed");
			}
			this.subscribes.lock().unwrap().remove(&request_id);
		});

		Ok(())
	}

	async fn run_track(
		session: S,
		version: Version,
		request_id: RequestId,
		mut track: TrackConsumer,
		mut cancel: oneshot::Receiver<()>,
	) -> Result<(), Error> {
		loop {
			let group = tokio::select! {
				biased;
				_ = &mut cancel => return Ok(()),
				group = track.next_group() => group?,
			};

			// The track is exhausted.
			let Some(group) = group else { return Ok(()) };

			let session = session.clone();
			let priority = stream_priority(track.info.priority, group.info.sequence);
			let track_priority = track.info.priority;

			tokio::spawn(async move {
				if let Err(err) = Self::run_group(session, version, request_id, track_priority, priority, group).await {
					tracing::debug!(%err, id = %request_id, "error serving group");
				}
			});
		}
	}

	async fn run_group(
		session: S,
		version: Version,
		request_id: RequestId,
		track_priority: u8,
		priority: i32,
		mut group: GroupConsumer,
	) -> Result<(), Error> {
		let stream = session.open_uni().await.map_err(Error::from_transport)?;
		let mut writer = Writer::new(stream, version);
		writer.set_priority(priority);

		let flags = GroupFlags {
			has_end: true,
			..Default::default()
		};
		let header = GroupHeader {
			request_id,
			group_id: group.info.sequence,
			publisher_priority: track_priority,
			flags,
		};

		tracing::trace!(?header, "sending group header");
		writer.encode(&header).await?;
		let mut writer = writer.with_version((flags, version));

		loop {
			let frame = tokio::select! {
				biased;
				_ = writer.closed() => Err(Error::Cancel),
				frame = group.read_frame() => frame,
			};

			let frame = match frame {
				Ok(Some(frame)) => frame,
				// Closing the stream delivers the end marker.
				Ok(None) => break,
				Err(err) => {
					writer.abort(&err);
					return Err(err);
				}
			};

			if frame.is_empty() {
				writer.encode(&FrameHeader::Empty).await?;
			} else {
				writer.encode(&FrameHeader::Payload(frame.len() as u64)).await?;
				let mut payload = frame;
				writer.write_all(&mut payload).await?;
			}
		}

		writer.finish()?;
		tracing::debug!(sequence = %group.info.sequence, id = %request_id, "finished group");

		Ok(())
	}

	pub fn recv_unsubscribe(&self, msg: message::Unsubscribe) -> Result<(), Error> {
		if let Some(cancel) = self.subscribes.lock().unwrap().remove(&msg.request_id) {
			cancel.send(()).ok();
		} else {
			tracing::warn!(id = %msg.request_id, "unsubscribe for unknown subscription");
		}
		Ok(())
	}

	pub fn recv_publish_namespace_ok(&self, msg: message::PublishNamespaceOk) -> Result<(), Error> {
		match self.announces.lock().unwrap().get(&msg.request_id) {
			Some(path) => tracing::debug!(broadcast = %path, "namespace accepted"),
			None => tracing::warn!(id = %msg.request_id, "namespace ok for unknown request"),
		}
		Ok(())
	}

	pub fn recv_publish_namespace_error(&self, msg: message::PublishNamespaceError<'_>) -> Result<(), Error> {
		tracing::warn!(id = %msg.request_id, code = msg.error_code, reason = %msg.reason_phrase, "namespace rejected");

		if let Some(path) = self.announces.lock().unwrap().remove(&msg.request_id) {
			self.broadcasts.lock().unwrap().remove(&path);
		}
		Ok(())
	}

	pub fn recv_publish_namespace_cancel(&self, msg: message::PublishNamespaceCancel<'_>) -> Result<(), Error> {
		let path = msg.track_namespace.to_owned();
		tracing::warn!(broadcast = %path, code = msg.error_code, reason = %msg.reason_phrase, "namespace cancelled by peer");

		self.broadcasts.lock().unwrap().remove(&path);
		Ok(())
	}

	pub fn recv_subscribe_namespace(&self, msg: message::SubscribeNamespace<'_>) -> Result<(), Error> {
		// Namespaces are announced regardless of interest; just acknowledge.
		self.control.send(message::SubscribeNamespaceOk {
			request_id: msg.request_id,
		})
	}

	pub fn recv_unsubscribe_namespace(&self, msg: message::UnsubscribeNamespace) -> Result<(), Error> {
		tracing::debug!(id = %msg.request_id, "peer unsubscribed from announcements");
		Ok(())
	}

	pub fn recv_track_status_request(&self, msg: message::TrackStatusRequest<'_>) -> Result<(), Error> {
		let path = msg.track_namespace.to_owned();
		let status = match self.broadcasts.lock().unwrap().contains_key(&path) {
			true => TrackStatusCode::InProgress,
			false => TrackStatusCode::NotFound,
		};

		self.control.send(message::TrackStatus {
			request_id: msg.request_id,
			status,
			largest_group: 0,
			largest_object: 0,
		})
	}
}

// The transport takes an i32 priority; fold the track priority byte and the
// group sequence into it. Group sequences past 2^24 wrap and will be
// misprioritized.
fn stream_priority(track_priority: u8, sequence: u64) -> i32 {
	let sequence = 0xFFFFFF - (sequence as u32 & 0xFFFFFF);
	((track_priority as i32) << 24) | sequence as i32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn priority_orders_tracks_then_groups() {
		const U24: i32 = (1 << 24) - 1;

		assert_eq!(stream_priority(0, 0), U24);
		assert_eq!(stream_priority(0, 50), U24 - 50);
		assert_eq!(stream_priority(1, 0), 2 * U24 + 1);
		assert_eq!(stream_priority(1, 50), 2 * U24 - 49);

		// A higher track priority beats any sequence.
		assert!(stream_priority(1, u64::MAX) > stream_priority(0, 0));
	}
}
