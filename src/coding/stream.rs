use crate::{
	coding::{Reader, Writer},
	transport, Error,
};

/// A [Writer] and [Reader] pair for a single bidirectional stream.
pub struct Stream<S: transport::Session, V> {
	pub writer: Writer<S::SendStream, V>,
	pub reader: Reader<S::RecvStream, V>,
}

impl<S: transport::Session, V> Stream<S, V> {
	/// Open a new stream with the given version.
	pub async fn open(session: &S, version: V) -> Result<Self, Error>
	where
		V: Clone,
	{
		let (send, recv) = session.open_bi().await.map_err(Error::from_transport)?;

		Ok(Stream {
			writer: Writer::new(send, version.clone()),
			reader: Reader::new(recv, version),
		})
	}

	/// Accept a new stream with the given version.
	pub async fn accept(session: &S, version: V) -> Result<Self, Error>
	where
		V: Clone,
	{
		let (send, recv) = session.accept_bi().await.map_err(Error::from_transport)?;

		Ok(Stream {
			writer: Writer::new(send, version.clone()),
			reader: Reader::new(recv, version),
		})
	}

	/// Cast the stream to a different version, used after negotiation.
	pub fn with_version<O: Clone>(self, version: O) -> Stream<S, O> {
		Stream {
			writer: self.writer.with_version(version.clone()),
			reader: self.reader.with_version(version),
		}
	}
}
