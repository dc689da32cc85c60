use std::fmt;

use crate::coding::{Decode, DecodeError, Encode, Version, MAX_U53};

/// A session-scoped identifier for a control request and its data streams.
///
/// Clients allocate even ids. [Version::DRAFT_14] restricts ids to 53 bits
/// and advances by 2; [Version::DRAFT_07] uses the full 62-bit range and
/// advances by 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
	/// Return the current id, advancing by the variant's step.
	///
	/// Ids are never returned to the pool; a long-lived session will
	/// eventually exhaust the space.
	pub(crate) fn increment(&mut self, version: Version) -> RequestId {
		let current = *self;
		self.0 += match version {
			Version::DRAFT_07 => 1,
			_ => 2,
		};
		current
	}
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl Decode<Version> for RequestId {
	fn decode<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let v = u64::decode(r, version)?;
		if version != Version::DRAFT_07 && v > MAX_U53 {
			return Err(DecodeError::BoundsExceeded);
		}
		Ok(Self(v))
	}
}

impl Encode<Version> for RequestId {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.0.encode(w, version);
	}
}
