//! Typed control messages, shared by both wire variants.

mod flow;
mod goaway;
mod namespace;
mod parameters;
mod publish_namespace;
mod request;
mod setup;
mod subscribe;
mod subscribe_namespace;
mod track_status;

pub use flow::*;
pub use goaway::*;
pub use namespace::*;
pub use parameters::*;
pub use publish_namespace::*;
pub use request::*;
pub use setup::*;
pub use subscribe::*;
pub use subscribe_namespace::*;
pub use track_status::*;

use std::fmt::Debug;

use bytes::{Buf, BufMut, BytesMut};

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	Error,
};

/// A control message with a static type id.
///
/// On the wire each message is `(id varint ‖ length prefix ‖ body)`. The
/// length prefix is a varint for [Version::DRAFT_07] and a big-endian u16 for
/// [Version::DRAFT_14].
pub trait Message: Sized + Debug {
	/// The message type id.
	const ID: u64;

	/// Encode the message body.
	fn encode_msg<W: BufMut>(&self, w: &mut W, version: Version);

	/// Decode the message body.
	fn decode_msg<R: Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError>;

	/// Write the length prefix and body; the id is written by the caller.
	///
	/// The body is serialized into a scratch buffer first because the length
	/// must precede it on the wire.
	fn encode_framed<W: BufMut>(&self, w: &mut W, version: Version) -> Result<(), Error> {
		let mut body = BytesMut::new();
		self.encode_msg(&mut body, version);

		if version == Version::DRAFT_07 {
			body.len().encode(w, version);
		} else {
			let size: u16 = body.len().try_into().map_err(|_| Error::MessageTooLarge)?;
			size.encode(w, version);
		}

		w.put(body);
		Ok(())
	}

	/// Read the length prefix and body, rejecting trailing bytes inside the
	/// frame. Bytes beyond the frame are left in the buffer.
	fn decode_framed<R: Buf>(r: &mut R, version: Version) -> Result<Self, Error> {
		let size = if version == Version::DRAFT_07 {
			usize::decode(r, version)?
		} else {
			u16::decode(r, version)? as usize
		};

		if r.remaining() < size {
			return Err(Error::Decode(DecodeError::Short));
		}

		let mut body = r.copy_to_bytes(size);
		let msg = Self::decode_msg(&mut body, version)?;
		if !body.is_empty() {
			return Err(Error::WrongSize);
		}

		Ok(msg)
	}
}

/// Message ids that are recognized but not handled; receiving one is fatal.
pub mod unsupported {
	pub const FETCH: u64 = 0x16;
	pub const FETCH_CANCEL: u64 = 0x17;
	pub const FETCH_OK: u64 = 0x18;
	pub const FETCH_ERROR: u64 = 0x19;
	pub const PUBLISH: u64 = 0x1d;
	pub const PUBLISH_OK: u64 = 0x1e;
	pub const PUBLISH_ERROR: u64 = 0x1f;
}
