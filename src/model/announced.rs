use crate::{Effect, PathOwned, Produce};

/// A namespace availability event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
	pub path: PathOwned,
	pub active: bool,
}

/// Feeds announcements to a single consumer endpoint.
#[derive(Clone)]
pub struct AnnouncedProducer {
	tx: async_channel::Sender<Announcement>,
}

impl AnnouncedProducer {
	pub fn announce(&self, path: PathOwned, active: bool) {
		self.tx.try_send(Announcement { path, active }).ok();
	}
}

/// A stream of announcements under a prefix.
///
/// Dropping the consumer tears down its scope, which deregisters it from the
/// session and notifies the peer.
pub struct AnnouncedConsumer {
	rx: async_channel::Receiver<Announcement>,
	_scope: Effect,
}

impl AnnouncedConsumer {
	pub(crate) fn produce(scope: Effect) -> Produce<AnnouncedProducer, AnnouncedConsumer> {
		let (tx, rx) = async_channel::unbounded();
		Produce {
			producer: AnnouncedProducer { tx },
			consumer: AnnouncedConsumer { rx, _scope: scope },
		}
	}

	/// The next announcement; None once the subscription ends.
	pub async fn next(&mut self) -> Option<Announcement> {
		self.rx.recv().await.ok()
	}
}
