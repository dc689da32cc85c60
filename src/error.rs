use std::sync::Arc;

use crate::coding::{DecodeError, Versions};

/// An error that can be shared across tasks.
pub trait SendSyncError: std::error::Error + Send + Sync {}
impl<T: std::error::Error + Send + Sync> SendSyncError for T {}

/// A session-level error.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
	/// The underlying transport failed; terminal for the session.
	#[error("transport error: {0}")]
	Transport(Arc<dyn SendSyncError>),

	#[error("decode error: {0}")]
	Decode(#[from] DecodeError),

	/// The peer selected a version outside our offer.
	#[error("unsupported versions: offered={0:?} server={1:?}")]
	Version(Versions, Versions),

	/// A message or feature we refuse to handle.
	#[error("unsupported")]
	Unsupported,

	#[error("unexpected message: 0x{0:02x}")]
	UnexpectedMessage(u64),

	#[error("unexpected stream type: 0x{0:02x}")]
	UnexpectedStream(u64),

	/// A framed message left trailing bytes.
	#[error("wrong size")]
	WrongSize,

	/// A framed payload exceeds the u16 length prefix.
	#[error("message too large")]
	MessageTooLarge,

	#[error("not found")]
	NotFound,

	#[error("duplicate")]
	Duplicate,

	#[error("cancelled")]
	Cancel,

	/// The peer rejected a single request; not fatal to the session.
	#[error("rejected: code={code} reason={reason}")]
	Failed { code: u64, reason: String },
}

impl Error {
	/// The application error code used on stream resets and session close.
	pub fn to_code(&self) -> u32 {
		match self {
			Self::Cancel => 0,
			Self::Transport(_) => 1,
			Self::Decode(_) => 2,
			Self::Version(..) => 3,
			Self::Unsupported => 4,
			Self::UnexpectedMessage(_) => 5,
			Self::UnexpectedStream(_) => 6,
			Self::WrongSize => 7,
			Self::MessageTooLarge => 8,
			Self::NotFound => 9,
			Self::Duplicate => 10,
			Self::Failed { .. } => 11,
		}
	}

	pub(crate) fn from_transport<E: SendSyncError + 'static>(err: E) -> Self {
		Self::Transport(Arc::new(err))
	}
}
