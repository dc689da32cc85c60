use std::sync::Arc;

use crate::{Error, Group, GroupConsumer, GroupProducer, Produce, Signal};

/// An ordered sequence of groups sharing a name and a priority.
///
/// The priority is a peer hint; it is always transmitted but scheduling is
/// best-effort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
	pub name: String,
	pub priority: u8,
}

impl Track {
	pub fn produce(self) -> Produce<TrackProducer, TrackConsumer> {
		let info = Arc::new(self);
		let state = Signal::new(TrackState {
			groups: Vec::new(),
			closed: None,
			next_sequence: 0,
			producers: 1,
			consumer: true,
		});

		Produce {
			producer: TrackProducer {
				info: info.clone(),
				state: state.clone(),
			},
			consumer: TrackConsumer { info, state, index: 0 },
		}
	}
}

struct TrackState {
	// Groups in arrival order, taken once by the consumer.
	groups: Vec<Option<GroupConsumer>>,
	closed: Option<Result<(), Error>>,
	next_sequence: u64,
	producers: usize,
	consumer: bool,
}

/// The write half of a track.
pub struct TrackProducer {
	pub info: Arc<Track>,
	state: Signal<TrackState>,
}

impl TrackProducer {
	/// Create a group with the given sequence.
	pub fn create_group(&self, sequence: u64) -> GroupProducer {
		let group = Group { sequence }.produce();
		self.state.update(|state| {
			if state.closed.is_none() {
				state.groups.push(Some(group.consumer));
				state.next_sequence = state.next_sequence.max(sequence + 1);
			}
		});
		group.producer
	}

	/// Create a group with the next unused sequence.
	pub fn append_group(&self) -> GroupProducer {
		let sequence = self.state.with(|state| state.next_sequence);
		self.create_group(sequence)
	}

	/// Close the track; the consumer drains any remaining groups.
	pub fn close(&self) {
		self.state.update(|state| {
			if state.closed.is_none() {
				state.closed = Some(Ok(()));
			}
		});
	}

	/// Fail the track, cancelling any unclaimed groups.
	pub fn abort(&self, err: Error) {
		self.state.update(|state| {
			if state.closed.is_none() {
				state.closed = Some(Err(err));
				// Dropping the unclaimed consumers cancels their groups.
				state.groups.clear();
			}
		});
	}

	/// Wait until the consumer is gone.
	pub async fn unused(&self) {
		self.state.wait_for(|state| (!state.consumer).then_some(())).await
	}

	/// Wait until the track is closed or failed.
	pub async fn closed(&self) {
		self.state.wait_for(|state| state.closed.as_ref().map(|_| ())).await
	}
}

impl Clone for TrackProducer {
	fn clone(&self) -> Self {
		self.state.update(|state| state.producers += 1);
		Self {
			info: self.info.clone(),
			state: self.state.clone(),
		}
	}
}

impl Drop for TrackProducer {
	fn drop(&mut self) {
		self.state.update(|state| {
			state.producers -= 1;
			if state.producers == 0 && state.closed.is_none() {
				state.closed = Some(Err(Error::Cancel));
			}
		});
	}
}

/// The read half of a track.
pub struct TrackConsumer {
	pub info: Arc<Track>,
	state: Signal<TrackState>,
	index: usize,
}

impl TrackConsumer {
	/// The next group, in arrival order; None once the track closes cleanly.
	pub async fn next_group(&mut self) -> Result<Option<GroupConsumer>, Error> {
		loop {
			let index = self.index;
			let available = self
				.state
				.wait_for(|state| {
					if index < state.groups.len() {
						return Some(Ok(true));
					}
					match &state.closed {
						Some(Ok(())) => Some(Ok(false)),
						Some(Err(err)) => Some(Err(err.clone())),
						None => None,
					}
				})
				.await?;

			if !available {
				return Ok(None);
			}

			let group = self.state.update(|state| state.groups[index].take());
			self.index += 1;

			if let Some(group) = group {
				return Ok(Some(group));
			}
		}
	}
}

impl Drop for TrackConsumer {
	fn drop(&mut self) {
		self.state.update(|state| state.consumer = false);
	}
}
