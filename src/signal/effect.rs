use std::time::Duration;

use futures::future::BoxFuture;

use crate::Signal;

/// A scope that owns cleanup callbacks, spawned tasks and signal
/// subscriptions.
///
/// Teardown (explicit or on drop) aborts every spawned task and interval and
/// runs the registered cleanups in reverse registration order. Reading a
/// signal with [Effect::get] records a dependency; a child scope created with
/// [Effect::effect] is torn down and re-run whenever one of its dependencies
/// changes.
#[derive(Default)]
pub struct Effect {
	cleanups: Vec<Box<dyn FnOnce() + Send>>,
	tasks: Vec<tokio::task::JoinHandle<()>>,
	deps: Vec<BoxFuture<'static, ()>>,
}

impl Effect {
	pub fn new() -> Self {
		Self::default()
	}

	/// Run `f` when this scope is torn down.
	pub fn cleanup(&mut self, f: impl FnOnce() + Send + 'static) {
		self.cleanups.push(Box::new(f));
	}

	/// Spawn a task that is aborted when this scope is torn down.
	pub fn spawn(&mut self, f: impl std::future::Future<Output = ()> + Send + 'static) {
		self.tasks.push(tokio::spawn(f));
	}

	/// Call `f` every `period` until this scope is torn down.
	pub fn interval(&mut self, period: Duration, mut f: impl FnMut() + Send + 'static) {
		self.spawn(async move {
			let mut timer = tokio::time::interval(period);
			// The first tick completes immediately.
			timer.tick().await;
			loop {
				timer.tick().await;
				f();
			}
		});
	}

	/// Read a signal, recording it as a dependency of this scope.
	pub fn get<T: Clone + Send + Sync + 'static>(&mut self, signal: &Signal<T>) -> T {
		let mut rx = signal.subscribe();
		let value = rx.borrow_and_update().clone();

		self.deps.push(Box::pin(async move {
			if rx.changed().await.is_err() {
				// No producers left; this dependency can never fire.
				std::future::pending::<()>().await;
			}
		}));

		value
	}

	/// Run `f` in a child scope, re-running it whenever a signal it read
	/// changes. The previous child scope is torn down before each re-run.
	pub fn effect(&mut self, mut f: impl FnMut(&mut Effect) + Send + 'static) {
		self.spawn(async move {
			loop {
				let mut scope = Effect::new();
				f(&mut scope);

				let deps = std::mem::take(&mut scope.deps);
				if deps.is_empty() {
					// Nothing to watch; hold the scope until cancelled.
					std::future::pending::<()>().await;
				}

				futures::future::select_all(deps).await;
			}
		});
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		for task in self.tasks.drain(..) {
			task.abort();
		}
		for cleanup in self.cleanups.drain(..).rev() {
			cleanup();
		}
	}
}
