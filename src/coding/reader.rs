use std::{fmt::Debug, io};

use bytes::{Buf, Bytes, BytesMut};

use crate::{coding::*, transport, Error};

/// Decodes values from a stream, buffering chunks until a full value is
/// available.
pub struct Reader<S: transport::RecvStream, V> {
	stream: S,
	buffer: BytesMut,
	version: V,
}

impl<S: transport::RecvStream, V> Reader<S, V> {
	pub fn new(stream: S, version: V) -> Self {
		Self {
			stream,
			buffer: Default::default(),
			version,
		}
	}

	/// Pull one more chunk from the stream into the buffer.
	///
	/// Returns false once the stream has ended.
	async fn fill(&mut self) -> Result<bool, Error> {
		match self.stream.read_buf(&mut self.buffer).await {
			Ok(Some(_)) => Ok(true),
			Ok(None) => Ok(false),
			Err(err) => Err(Error::from_transport(err)),
		}
	}

	/// Attempt a decode from the buffered bytes alone.
	///
	/// Returns None when the buffer holds a value prefix; the caller should
	/// fill and retry. Nothing is consumed unless the decode succeeds and
	/// `consume` is set.
	fn try_decode<T: Decode<V>>(&mut self, consume: bool) -> Result<Option<T>, Error>
	where
		V: Clone,
	{
		let mut cursor = io::Cursor::new(self.buffer.as_ref());
		match T::decode(&mut cursor, self.version.clone()) {
			Ok(value) => {
				let taken = cursor.position() as usize;
				if consume {
					self.buffer.advance(taken);
				}
				Ok(Some(value))
			}
			Err(DecodeError::Short) => Ok(None),
			Err(err) => Err(Error::Decode(err)),
		}
	}

	/// Decode the next value from the stream.
	pub async fn decode<T: Decode<V> + Debug>(&mut self) -> Result<T, Error>
	where
		V: Clone,
	{
		loop {
			if let Some(value) = self.try_decode(true)? {
				return Ok(value);
			}
			if !self.fill().await? {
				// The stream ended mid-value.
				return Err(DecodeError::Short.into());
			}
		}
	}

	/// Decode the next value, or None if the stream has ended cleanly.
	pub async fn decode_maybe<T: Decode<V> + Debug>(&mut self) -> Result<Option<T>, Error>
	where
		V: Clone,
	{
		if self.buffer.is_empty() && !self.fill().await? {
			return Ok(None);
		}
		self.decode().await.map(Some)
	}

	/// Decode the next value without consuming it.
	pub async fn decode_peek<T: Decode<V> + Debug>(&mut self) -> Result<T, Error>
	where
		V: Clone,
	{
		loop {
			if let Some(value) = self.try_decode(false)? {
				return Ok(value);
			}
			if !self.fill().await? {
				return Err(DecodeError::Short.into());
			}
		}
	}

	/// The next chunk of data, up to `max` bytes; None once the stream ends.
	pub async fn read(&mut self, max: usize) -> Result<Option<Bytes>, Error> {
		if self.buffer.is_empty() {
			// Nothing buffered, so hand out the stream's chunk directly.
			return self.stream.read_chunk(max).await.map_err(Error::from_transport);
		}

		let take = self.buffer.len().min(max);
		Ok(Some(self.buffer.split_to(take).freeze()))
	}

	/// Exactly `size` bytes, or [DecodeError::Short] if the stream ends first.
	pub async fn read_exact(&mut self, size: usize) -> Result<Bytes, Error> {
		while self.buffer.len() < size {
			if !self.fill().await? {
				return Err(DecodeError::Short.into());
			}
		}
		Ok(self.buffer.split_to(size).freeze())
	}

	/// Everything remaining until the stream ends.
	pub async fn read_all(&mut self) -> Result<Bytes, Error> {
		while self.fill().await? {}
		Ok(self.buffer.split().freeze())
	}

	/// Wait for the stream to end, erroring if any bytes arrive instead.
	pub async fn closed(&mut self) -> Result<(), Error> {
		if self.buffer.is_empty() && !self.fill().await? {
			return Ok(());
		}
		Err(DecodeError::ExpectedEnd.into())
	}

	/// Abort the stream with the given error.
	pub fn abort(&mut self, err: &Error) {
		self.stream.stop(err.to_code());
	}

	/// Cast the reader to a different version, used after negotiation.
	pub fn with_version<O>(self, version: O) -> Reader<S, O> {
		Reader {
			stream: self.stream,
			buffer: self.buffer,
			version,
		}
	}
}
