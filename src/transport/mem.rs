//! An in-process transport, useful for tests and loopback sessions.

use std::{future::Future, sync::Arc};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::sync::watch;

use crate::transport;

/// Errors surfaced by the in-process transport.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MemError {
	#[error("session closed: code={code} reason={reason}")]
	SessionClosed { code: u32, reason: String },

	#[error("stream reset: code={0}")]
	Reset(u32),

	#[error("stream stopped: code={0}")]
	Stopped(u32),

	#[error("stream finished")]
	Finished,
}

enum Chunk {
	Data(Bytes),
	Fin,
	Reset(u32),
}

fn pipe() -> (MemSendStream, MemRecvStream) {
	let (tx, rx) = async_channel::unbounded();
	let (stop_tx, stop_rx) = watch::channel(None);

	let send = MemSendStream {
		tx: Some(tx),
		stop: stop_rx,
	};
	let recv = MemRecvStream {
		rx,
		stop: stop_tx,
		buffer: BytesMut::new(),
		done: false,
		reset: None,
	};

	(send, recv)
}

/// Create a connected pair of in-process sessions.
pub fn pair() -> (MemSession, MemSession) {
	let (left_bi_tx, left_bi_rx) = async_channel::unbounded();
	let (right_bi_tx, right_bi_rx) = async_channel::unbounded();
	let (left_uni_tx, left_uni_rx) = async_channel::unbounded();
	let (right_uni_tx, right_uni_rx) = async_channel::unbounded();

	let closed = Arc::new(watch::channel(None).0);

	let left = MemSession {
		accept_bi: left_bi_rx,
		accept_uni: left_uni_rx,
		peer_bi: right_bi_tx,
		peer_uni: right_uni_tx,
		closed: closed.clone(),
	};
	let right = MemSession {
		accept_bi: right_bi_rx,
		accept_uni: right_uni_rx,
		peer_bi: left_bi_tx,
		peer_uni: left_uni_tx,
		closed,
	};

	(left, right)
}

#[derive(Clone, Debug)]
struct Closed {
	code: u32,
	reason: String,
}

/// One endpoint of an in-process session pair.
#[derive(Clone)]
pub struct MemSession {
	accept_bi: async_channel::Receiver<(MemSendStream, MemRecvStream)>,
	accept_uni: async_channel::Receiver<MemRecvStream>,
	peer_bi: async_channel::Sender<(MemSendStream, MemRecvStream)>,
	peer_uni: async_channel::Sender<MemRecvStream>,
	closed: Arc<watch::Sender<Option<Closed>>>,
}

impl MemSession {
	fn closed_error(&self) -> MemError {
		match &*self.closed.borrow() {
			Some(closed) => MemError::SessionClosed {
				code: closed.code,
				reason: closed.reason.clone(),
			},
			None => MemError::SessionClosed {
				code: 0,
				reason: "peer gone".to_string(),
			},
		}
	}

	fn check_open(&self) -> Result<(), MemError> {
		match self.closed.borrow().is_some() {
			true => Err(self.closed_error()),
			false => Ok(()),
		}
	}
}

impl transport::Session for MemSession {
	type SendStream = MemSendStream;
	type RecvStream = MemRecvStream;
	type Error = MemError;

	fn open_bi(&self) -> impl Future<Output = Result<(MemSendStream, MemRecvStream), MemError>> + Send {
		let this = self.clone();
		async move {
			this.check_open()?;
			let (local_send, remote_recv) = pipe();
			let (remote_send, local_recv) = pipe();
			this.peer_bi
				.send((remote_send, remote_recv))
				.await
				.map_err(|_| this.closed_error())?;
			Ok((local_send, local_recv))
		}
	}

	fn accept_bi(&self) -> impl Future<Output = Result<(MemSendStream, MemRecvStream), MemError>> + Send {
		let this = self.clone();
		async move {
			let mut closed = this.closed.subscribe();
			tokio::select! {
				biased;
				stream = this.accept_bi.recv() => stream.map_err(|_| this.closed_error()),
				_ = closed.wait_for(|c| c.is_some()) => Err(this.closed_error()),
			}
		}
	}

	fn open_uni(&self) -> impl Future<Output = Result<MemSendStream, MemError>> + Send {
		let this = self.clone();
		async move {
			this.check_open()?;
			let (local_send, remote_recv) = pipe();
			this.peer_uni
				.send(remote_recv)
				.await
				.map_err(|_| this.closed_error())?;
			Ok(local_send)
		}
	}

	fn accept_uni(&self) -> impl Future<Output = Result<MemRecvStream, MemError>> + Send {
		let this = self.clone();
		async move {
			let mut closed = this.closed.subscribe();
			tokio::select! {
				biased;
				stream = this.accept_uni.recv() => stream.map_err(|_| this.closed_error()),
				_ = closed.wait_for(|c| c.is_some()) => Err(this.closed_error()),
			}
		}
	}

	fn close(&self, code: u32, reason: &str) {
		// The first close wins; later calls are no-ops.
		self.closed.send_if_modified(|state| match state {
			Some(_) => false,
			None => {
				*state = Some(Closed {
					code,
					reason: reason.to_string(),
				});
				true
			}
		});
	}

	fn closed(&self) -> impl Future<Output = MemError> + Send {
		let closed = self.closed.clone();
		async move {
			let mut rx = closed.subscribe();
			let state = rx.wait_for(|c| c.is_some()).await.expect("sender is held");
			let state = state.clone().unwrap();
			MemError::SessionClosed {
				code: state.code,
				reason: state.reason,
			}
		}
	}
}

/// The write half of an in-process stream.
pub struct MemSendStream {
	tx: Option<async_channel::Sender<Chunk>>,
	stop: watch::Receiver<Option<u32>>,
}

impl transport::SendStream for MemSendStream {
	type Error = MemError;

	fn write_buf<B: Buf + Send>(&mut self, buf: &mut B) -> impl Future<Output = Result<usize, MemError>> + Send {
		async move {
			if let Some(code) = *self.stop.borrow() {
				return Err(MemError::Stopped(code));
			}

			let tx = self.tx.as_ref().ok_or(MemError::Finished)?;

			let data = buf.copy_to_bytes(buf.remaining());
			let size = data.len();
			if size == 0 {
				return Ok(0);
			}

			tx.send(Chunk::Data(data)).await.map_err(|_| MemError::Stopped(0))?;
			Ok(size)
		}
	}

	fn finish(&mut self) -> Result<(), MemError> {
		match self.tx.take() {
			Some(tx) => {
				tx.try_send(Chunk::Fin).ok();
				Ok(())
			}
			None => Err(MemError::Finished),
		}
	}

	fn reset(&mut self, code: u32) {
		if let Some(tx) = self.tx.take() {
			tx.try_send(Chunk::Reset(code)).ok();
		}
	}

	fn set_priority(&mut self, _priority: i32) {}

	fn closed(&self) -> impl Future<Output = ()> + Send {
		let mut stop = self.stop.clone();
		async move {
			loop {
				if stop.borrow_and_update().is_some() {
					return;
				}
				if stop.changed().await.is_err() {
					// The peer vanished without a stop; nothing left to observe.
					std::future::pending::<()>().await;
				}
			}
		}
	}
}

impl Drop for MemSendStream {
	fn drop(&mut self) {
		if let Some(tx) = self.tx.take() {
			tx.try_send(Chunk::Reset(0)).ok();
		}
	}
}

/// The read half of an in-process stream.
pub struct MemRecvStream {
	rx: async_channel::Receiver<Chunk>,
	stop: watch::Sender<Option<u32>>,
	buffer: BytesMut,
	done: bool,
	reset: Option<u32>,
}

impl MemRecvStream {
	/// Pull the next chunk into the buffer, returning false at the end.
	async fn fill(&mut self) -> Result<bool, MemError> {
		if let Some(code) = self.reset {
			return Err(MemError::Reset(code));
		}
		if self.done {
			return Ok(false);
		}

		match self.rx.recv().await {
			Ok(Chunk::Data(data)) => {
				self.buffer.extend_from_slice(&data);
				Ok(true)
			}
			Ok(Chunk::Fin) | Err(_) => {
				self.done = true;
				Ok(false)
			}
			Ok(Chunk::Reset(code)) => {
				self.reset = Some(code);
				Err(MemError::Reset(code))
			}
		}
	}
}

impl transport::RecvStream for MemRecvStream {
	type Error = MemError;

	fn read_buf<B: BufMut + Send>(&mut self, buf: &mut B) -> impl Future<Output = Result<Option<usize>, MemError>> + Send {
		async move {
			if self.buffer.is_empty() && !self.fill().await? {
				return Ok(None);
			}

			let size = self.buffer.len().min(buf.remaining_mut());
			buf.put(self.buffer.split_to(size));
			Ok(Some(size))
		}
	}

	fn read_chunk(&mut self, max: usize) -> impl Future<Output = Result<Option<Bytes>, MemError>> + Send {
		async move {
			if self.buffer.is_empty() && !self.fill().await? {
				return Ok(None);
			}

			let size = self.buffer.len().min(max);
			Ok(Some(self.buffer.split_to(size).freeze()))
		}
	}

	fn stop(&mut self, code: u32) {
		self.stop.send_replace(Some(code));
		self.rx.close();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::{RecvStream, SendStream, Session};

	#[tokio::test]
	async fn uni_round_trip() {
		let (left, right) = pair();

		let mut send = left.open_uni().await.unwrap();
		let mut recv = right.accept_uni().await.unwrap();

		let mut data = Bytes::from_static(b"hello");
		send.write_buf(&mut data).await.unwrap();
		send.finish().unwrap();

		let chunk = recv.read_chunk(usize::MAX).await.unwrap().unwrap();
		assert_eq!(chunk.as_ref(), b"hello");
		assert!(recv.read_chunk(usize::MAX).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn reset_surfaces() {
		let (left, right) = pair();

		let mut send = left.open_uni().await.unwrap();
		let mut recv = right.accept_uni().await.unwrap();

		send.reset(7);
		assert!(matches!(
			recv.read_chunk(usize::MAX).await,
			Err(MemError::Reset(7))
		));
	}

	#[tokio::test]
	async fn close_resolves_both_sides() {
		let (left, right) = pair();
		left.close(3, "bye");

		assert!(matches!(
			left.closed().await,
			MemError::SessionClosed { code: 3, .. }
		));
		assert!(matches!(
			right.closed().await,
			MemError::SessionClosed { code: 3, .. }
		));
		assert!(left.open_uni().await.is_err());
	}
}
