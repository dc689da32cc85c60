use crate::{Produce, Signal, Track, TrackConsumer, TrackProducer};

/// A named rendezvous between a producer and consumers of tracks.
///
/// Track subscriptions are materialized lazily: a consumer requests a track by
/// name and the producer decides how to serve it.
pub struct Broadcast;

impl Broadcast {
	pub fn produce() -> Produce<BroadcastProducer, BroadcastConsumer> {
		let (tx, rx) = async_channel::unbounded();
		let state = Signal::new(BroadcastState::default());

		Produce {
			producer: BroadcastProducer {
				requests: rx,
				state: state.clone(),
			},
			consumer: BroadcastConsumer { requests: tx, state },
		}
	}
}

#[derive(Default)]
struct BroadcastState {
	closed: bool,
}

/// The serving half of a broadcast.
pub struct BroadcastProducer {
	requests: async_channel::Receiver<TrackProducer>,
	state: Signal<BroadcastState>,
}

impl BroadcastProducer {
	/// The next track requested by a consumer; None once every consumer is gone.
	pub async fn requested_track(&mut self) -> Option<TrackProducer> {
		self.requests.recv().await.ok()
	}

	/// Stop serving; consumers observe the closure and new requests fail.
	pub fn close(&self) {
		self.requests.close();
		self.state.update(|state| state.closed = true);
	}
}

impl Drop for BroadcastProducer {
	fn drop(&mut self) {
		self.close();
	}
}

/// The requesting half of a broadcast.
#[derive(Clone)]
pub struct BroadcastConsumer {
	requests: async_channel::Sender<TrackProducer>,
	state: Signal<BroadcastState>,
}

impl BroadcastConsumer {
	/// Request a track from the producer.
	///
	/// If the broadcast is already closed the returned track fails with
	/// [crate::Error::Cancel].
	pub fn subscribe_track(&self, track: Track) -> TrackConsumer {
		let pair = track.produce();
		self.requests.try_send(pair.producer).ok();
		pair.consumer
	}

	/// Wait until the producer closes the broadcast.
	pub async fn closed(&self) {
		self.state.wait_for(|state| state.closed.then_some(())).await
	}
}
