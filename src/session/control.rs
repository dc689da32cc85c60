use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::{
	coding::{Encode, Version, Writer},
	message::{Message, RequestId},
	transport, Error,
};

/// The write half of the control-stream multiplexer.
///
/// Every message is queued here and drained onto the stream by a single
/// writer task, so concurrent senders serialize. Request ids are allocated by
/// the same handle.
#[derive(Clone)]
pub(super) struct Control {
	tx: mpsc::UnboundedSender<Vec<u8>>,
	next: Arc<Mutex<RequestId>>,
	version: Version,
}

impl Control {
	pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>, version: Version) -> Self {
		Self {
			tx,
			next: Arc::new(Mutex::new(RequestId(0))),
			version,
		}
	}

	pub fn send<T: Message>(&self, msg: T) -> Result<(), Error> {
		tracing::debug!(message = ?msg, "sending control message");

		let mut buf = Vec::new();
		T::ID.encode(&mut buf, self.version);
		msg.encode_framed(&mut buf, self.version)?;

		tracing::trace!(id = T::ID, size = buf.len(), hex = %hex::encode(&buf), "encoded control message");

		self.tx.send(buf).map_err(|_| Error::Cancel)?;
		Ok(())
	}

	/// Allocate the next request id.
	///
	/// The server's MaxRequestId is not enforced and ids are never returned
	/// to the pool, so a long-lived session will exhaust the space.
	pub fn next_request_id(&self) -> RequestId {
		self.next.lock().unwrap().increment(self.version)
	}

	/// Drain queued messages onto the control stream; the single writer.
	pub async fn run<S: transport::Session>(
		mut writer: Writer<S::SendStream, Version>,
		mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
	) -> Result<(), Error> {
		while let Some(msg) = rx.recv().await {
			let mut buf = std::io::Cursor::new(msg);
			writer.write_all(&mut buf).await?;
		}

		Ok(())
	}
}
