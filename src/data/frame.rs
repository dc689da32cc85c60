use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	data::GroupFlags,
};

/// The status byte carried by a zero-length frame object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum ObjectStatus {
	Normal = 0x00,
	GroupEnd = 0x03,
}

/// The preamble of a single frame object, telling what follows on the stream.
///
/// Frame decoding depends on the group's [GroupFlags], so the codec version is
/// the `(flags, version)` pair; cast a reader with
/// [crate::coding::Reader::with_version] after decoding the group header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameHeader {
	/// This many payload bytes follow.
	Payload(u64),
	/// A frame with an empty payload.
	Empty,
	/// The explicit end of the group; nothing follows.
	End,
}

impl Encode<(GroupFlags, Version)> for FrameHeader {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: (GroupFlags, Version)) {
		let (flags, version) = version;

		if version == Version::DRAFT_07 {
			// Frames are a bare length prefix; the stream FIN ends the group.
			match self {
				Self::Payload(size) => size.encode(w, version),
				Self::Empty => 0u64.encode(w, version),
				Self::End => unreachable!("lite groups end with the stream"),
			}
			return;
		}

		0u64.encode(w, version); // id_delta
		if flags.has_extensions {
			0u64.encode(w, version); // extensions_length
		}

		match self {
			Self::Payload(size) => size.encode(w, version),
			Self::Empty => {
				0u64.encode(w, version);
				u64::from(ObjectStatus::Normal).encode(w, version);
			}
			Self::End => {
				assert!(!flags.has_end, "the stream FIN already carries the end marker");
				0u64.encode(w, version);
				u64::from(ObjectStatus::GroupEnd).encode(w, version);
			}
		}
	}
}

impl Decode<(GroupFlags, Version)> for FrameHeader {
	fn decode<R: bytes::Buf>(r: &mut R, version: (GroupFlags, Version)) -> Result<Self, DecodeError> {
		let (flags, version) = version;

		if version == Version::DRAFT_07 {
			let size = u64::decode(r, version)?;
			return Ok(match size {
				0 => Self::Empty,
				_ => Self::Payload(size),
			});
		}

		let id_delta = u64::decode(r, version)?;
		if id_delta != 0 {
			// Object id gaps are not supported.
			return Err(DecodeError::Unsupported);
		}

		if flags.has_extensions {
			let extensions = u64::decode(r, version)?;
			if extensions != 0 {
				return Err(DecodeError::Unsupported);
			}
		}

		let size = u64::decode(r, version)?;
		if size > 0 {
			return Ok(Self::Payload(size));
		}

		let status = u64::decode(r, version)?;
		let status = ObjectStatus::try_from(status).map_err(|_| DecodeError::Unsupported)?;

		match (flags.has_end, status) {
			(true, ObjectStatus::Normal) => Ok(Self::Empty),
			// Some servers send status 0 instead of GROUP_END here; accept both.
			(false, _) => Ok(Self::End),
			_ => Err(DecodeError::Unsupported),
		}
	}
}
