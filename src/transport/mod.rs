//! The transport seam consumed by the engine.
//!
//! The engine rides on an established QUIC or WebTransport session; this
//! module describes exactly the surface it consumes. [mem] provides an
//! in-process implementation for tests and loopback sessions.

pub mod mem;

use std::future::Future;

use bytes::{Buf, BufMut, Bytes};

/// An established session offering bidirectional and unidirectional streams.
pub trait Session: Clone + Send + Sync + 'static {
	type SendStream: SendStream;
	type RecvStream: RecvStream;
	type Error: std::error::Error + Send + Sync + 'static;

	/// Open a bidirectional stream.
	fn open_bi(&self) -> impl Future<Output = Result<(Self::SendStream, Self::RecvStream), Self::Error>> + Send;

	/// Accept a bidirectional stream opened by the peer.
	fn accept_bi(&self) -> impl Future<Output = Result<(Self::SendStream, Self::RecvStream), Self::Error>> + Send;

	/// Open a unidirectional stream.
	fn open_uni(&self) -> impl Future<Output = Result<Self::SendStream, Self::Error>> + Send;

	/// Accept a unidirectional stream opened by the peer.
	fn accept_uni(&self) -> impl Future<Output = Result<Self::RecvStream, Self::Error>> + Send;

	/// Close the session with an error code; all streams fail.
	fn close(&self, code: u32, reason: &str);

	/// Resolves when the session is closed by either side.
	fn closed(&self) -> impl Future<Output = Self::Error> + Send;
}

/// The write half of a stream.
pub trait SendStream: Send + Sync + 'static {
	type Error: std::error::Error + Send + Sync + 'static;

	/// Write a chunk from the buffer, returning the number of bytes consumed.
	fn write_buf<B: Buf + Send>(&mut self, buf: &mut B) -> impl Future<Output = Result<usize, Self::Error>> + Send;

	/// Gracefully finish the stream after all pending writes.
	fn finish(&mut self) -> Result<(), Self::Error>;

	/// Abruptly reset the stream with an error code.
	fn reset(&mut self, code: u32);

	/// Hint the relative scheduling priority.
	fn set_priority(&mut self, priority: i32);

	/// Resolves when the stream is no longer writable.
	fn closed(&self) -> impl Future<Output = ()> + Send;
}

/// The read half of a stream.
pub trait RecvStream: Send + 'static {
	type Error: std::error::Error + Send + Sync + 'static;

	/// Read into the buffer, returning None at the end of the stream.
	fn read_buf<B: BufMut + Send>(
		&mut self,
		buf: &mut B,
	) -> impl Future<Output = Result<Option<usize>, Self::Error>> + Send;

	/// Read up to `max` bytes, returning None at the end of the stream.
	fn read_chunk(&mut self, max: usize) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send;

	/// Tell the peer to stop sending, with an error code.
	fn stop(&mut self, code: u32);
}
