//! A small reactive substrate: value cells and scoped effects.

mod effect;

pub use effect::*;

use std::sync::Arc;

use tokio::sync::watch;

/// A cell holding a value, notifying subscribers when it changes.
pub struct Signal<T> {
	tx: Arc<watch::Sender<T>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Signal").field("tx", &self.tx.borrow()).finish()
	}
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

impl<T: Send + Sync> Signal<T> {
	pub fn new(value: T) -> Self {
		Self {
			tx: Arc::new(watch::Sender::new(value)),
		}
	}

	/// Read the current value without subscribing.
	pub fn peek(&self) -> T
	where
		T: Clone,
	{
		self.tx.borrow().clone()
	}

	/// Inspect the current value without cloning or subscribing.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.tx.borrow())
	}

	/// Replace the value, notifying subscribers only if it changed.
	pub fn set(&self, value: T)
	where
		T: PartialEq,
	{
		self.tx.send_if_modified(|current| {
			if *current == value {
				false
			} else {
				*current = value;
				true
			}
		});
	}

	/// Replace the value unconditionally, notifying subscribers.
	pub fn replace(&self, value: T) {
		self.tx.send_modify(|current| *current = value);
	}

	/// Mutate the value in place, notifying subscribers.
	pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
		let mut result = None;
		self.tx.send_modify(|value| result = Some(f(value)));
		result.unwrap()
	}

	/// Subscribe to changes, positioned at the current value.
	pub fn subscribe(&self) -> watch::Receiver<T> {
		self.tx.subscribe()
	}

	/// Resolve once `f` returns Some, re-checking whenever the value changes.
	pub async fn wait_for<R>(&self, mut f: impl FnMut(&T) -> Option<R>) -> R {
		let mut rx = self.tx.subscribe();
		loop {
			if let Some(result) = f(&rx.borrow_and_update()) {
				return result;
			}
			if rx.changed().await.is_err() {
				// Every producer is gone; the value can never change again.
				std::future::pending::<()>().await;
			}
		}
	}

	/// A read-only projection of this signal.
	pub fn getter(&self) -> Getter<T> {
		Getter { inner: self.clone() }
	}
}

/// A read-only projection of a [Signal].
pub struct Getter<T> {
	inner: Signal<T>,
}

impl<T> Clone for Getter<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Send + Sync> Getter<T> {
	pub fn peek(&self) -> T
	where
		T: Clone,
	{
		self.inner.peek()
	}

	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.inner.with(f)
	}

	pub fn subscribe(&self) -> watch::Receiver<T> {
		self.inner.subscribe()
	}

	pub async fn wait_for<R>(&self, f: impl FnMut(&T) -> Option<R>) -> R {
		self.inner.wait_for(f).await
	}
}
