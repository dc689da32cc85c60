use std::fmt::Debug;

use bytes::Buf;

use crate::{coding::*, transport, Error};

/// Encodes values onto a stream. The stream is reset on drop unless it was
/// finished or handed off.
pub struct Writer<S: transport::SendStream, V> {
	stream: Option<S>,
	scratch: bytes::BytesMut,
	version: V,
}

impl<S: transport::SendStream, V> Writer<S, V> {
	pub fn new(stream: S, version: V) -> Self {
		Self {
			stream: Some(stream),
			scratch: Default::default(),
			version,
		}
	}

	/// Encode the given value and write it out in full.
	pub async fn encode<T: Encode<V> + Debug>(&mut self, value: &T) -> Result<(), Error>
	where
		V: Clone,
	{
		value.encode(&mut self.scratch, self.version.clone());
		let mut buffer = self.scratch.split();
		self.write_all(&mut buffer).await
	}

	/// Write the entire [Buf] to the stream.
	///
	/// NOTE: This can avoid a copy when using [bytes::Bytes].
	pub async fn write_all<B: Buf + Send>(&mut self, buf: &mut B) -> Result<(), Error> {
		let stream = self.stream.as_mut().unwrap();
		while buf.has_remaining() {
			stream.write_buf(buf).await.map_err(Error::from_transport)?;
		}
		Ok(())
	}

	/// Mark the stream as finished.
	pub fn finish(&mut self) -> Result<(), Error> {
		self.stream.as_mut().unwrap().finish().map_err(Error::from_transport)
	}

	/// Abort the stream with the given error.
	pub fn abort(&mut self, err: &Error) {
		self.stream.as_mut().unwrap().reset(err.to_code());
	}

	/// Wait until the stream is no longer writable.
	pub async fn closed(&self) {
		self.stream.as_ref().unwrap().closed().await
	}

	/// Hint the scheduling priority of the stream.
	pub fn set_priority(&mut self, priority: i32) {
		self.stream.as_mut().unwrap().set_priority(priority);
	}

	/// Cast the writer to a different version, used after negotiation.
	pub fn with_version<O>(mut self, version: O) -> Writer<S, O> {
		Writer {
			// Take the stream so Drop doesn't reset it.
			stream: self.stream.take(),
			scratch: std::mem::take(&mut self.scratch),
			version,
		}
	}
}

impl<S: transport::SendStream, V> Drop for Writer<S, V> {
	fn drop(&mut self) {
		// An abandoned stream is a cancelled stream.
		if let Some(mut stream) = self.stream.take() {
			stream.reset(Error::Cancel.to_code());
		}
	}
}
