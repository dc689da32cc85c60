use bytes::Bytes;

use crate::{Error, Produce, Signal};

/// An indexed, ordered sequence of frames within a track.
///
/// Each group is carried on exactly one unidirectional stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Group {
	pub sequence: u64,
}

impl Group {
	pub fn produce(self) -> Produce<GroupProducer, GroupConsumer> {
		let state = Signal::new(GroupState {
			frames: Vec::new(),
			closed: None,
			producers: 1,
			consumer: true,
		});

		Produce {
			producer: GroupProducer {
				info: self,
				state: state.clone(),
			},
			consumer: GroupConsumer {
				info: self,
				state,
				index: 0,
			},
		}
	}
}

#[derive(Debug)]
struct GroupState {
	frames: Vec<Bytes>,
	closed: Option<Result<(), Error>>,
	producers: usize,
	consumer: bool,
}

/// The write half of a group.
pub struct GroupProducer {
	pub info: Group,
	state: Signal<GroupState>,
}

impl GroupProducer {
	/// Append a frame; ignored once the group is closed.
	pub fn write_frame(&self, payload: Bytes) {
		self.state.update(|state| {
			if state.closed.is_none() {
				state.frames.push(payload);
			}
		});
	}

	/// End the group; the consumer drains any remaining frames.
	pub fn close(&self) {
		self.state.update(|state| {
			if state.closed.is_none() {
				state.closed = Some(Ok(()));
			}
		});
	}

	/// Fail the group with an error.
	pub fn abort(&self, err: Error) {
		self.state.update(|state| {
			if state.closed.is_none() {
				state.closed = Some(Err(err));
			}
		});
	}

	/// Wait until the consumer is gone.
	pub async fn unused(&self) {
		self.state.wait_for(|state| (!state.consumer).then_some(())).await
	}
}

impl Clone for GroupProducer {
	fn clone(&self) -> Self {
		self.state.update(|state| state.producers += 1);
		Self {
			info: self.info,
			state: self.state.clone(),
		}
	}
}

impl Drop for GroupProducer {
	fn drop(&mut self) {
		self.state.update(|state| {
			state.producers -= 1;
			if state.producers == 0 && state.closed.is_none() {
				state.closed = Some(Err(Error::Cancel));
			}
		});
	}
}

/// The read half of a group.
#[derive(Debug)]
pub struct GroupConsumer {
	pub info: Group,
	state: Signal<GroupState>,
	index: usize,
}

impl GroupConsumer {
	/// The next frame, in order; None once the group ends cleanly.
	pub async fn read_frame(&mut self) -> Result<Option<Bytes>, Error> {
		let index = self.index;
		let result = self
			.state
			.wait_for(|state| {
				if index < state.frames.len() {
					return Some(Ok(Some(state.frames[index].clone())));
				}
				match &state.closed {
					Some(Ok(())) => Some(Ok(None)),
					Some(Err(err)) => Some(Err(err.clone())),
					None => None,
				}
			})
			.await;

		if matches!(result, Ok(Some(_))) {
			self.index += 1;
		}
		result
	}
}

impl Drop for GroupConsumer {
	fn drop(&mut self) {
		self.state.update(|state| state.consumer = false);
	}
}
