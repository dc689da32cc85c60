use crate::{
	coding::{Decode, DecodeError, Encode, Version, MAX_U53},
	message::RequestId,
};

/// The stream type of a [Version::DRAFT_07] group stream.
pub const GROUP_STREAM: u64 = 0x00;

/// Feature flags packed into the low bits of a [Version::DRAFT_14] stream
/// type, in the range `[0x10, 0x1f]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GroupFlags {
	pub has_extensions: bool,
	pub has_subgroup_object: bool,
	pub has_subgroup: bool,
	pub has_end: bool,
}

impl GroupFlags {
	/// The first draft-14 group stream type.
	pub const START: u64 = 0x10;
	/// The last draft-14 group stream type.
	pub const END: u64 = 0x1f;

	const EXTENSIONS: u64 = 0x01;
	const SUBGROUP_OBJECT: u64 = 0x02;
	const SUBGROUP: u64 = 0x04;
	const GROUP_END: u64 = 0x08;

	pub fn to_type(self) -> u64 {
		// The subgroup id comes from at most one place.
		assert!(!(self.has_subgroup && self.has_subgroup_object));

		let mut kind = Self::START;
		if self.has_extensions {
			kind |= Self::EXTENSIONS;
		}
		if self.has_subgroup_object {
			kind |= Self::SUBGROUP_OBJECT;
		}
		if self.has_subgroup {
			kind |= Self::SUBGROUP;
		}
		if self.has_end {
			kind |= Self::GROUP_END;
		}
		kind
	}

	pub fn from_type(kind: u64) -> Result<Self, DecodeError> {
		if !(Self::START..=Self::END).contains(&kind) {
			return Err(DecodeError::InvalidValue);
		}

		let flags = Self {
			has_extensions: kind & Self::EXTENSIONS != 0,
			has_subgroup_object: kind & Self::SUBGROUP_OBJECT != 0,
			has_subgroup: kind & Self::SUBGROUP != 0,
			has_end: kind & Self::GROUP_END != 0,
		};

		if flags.has_subgroup && flags.has_subgroup_object {
			return Err(DecodeError::InvalidValue);
		}

		Ok(flags)
	}
}

/// The header starting every unidirectional object stream.
///
/// One group per stream; groups are never multiplexed. When
/// [GroupFlags::has_subgroup] is set the wire carries a subgroup id byte,
/// which must be 0: subgroup layers are not supported and any other value is
/// rejected on decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupHeader {
	pub request_id: RequestId,
	pub group_id: u64,
	/// A peer hint, ignored on decode.
	pub publisher_priority: u8,
	pub flags: GroupFlags,
}

impl Encode<Version> for GroupHeader {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		if version == Version::DRAFT_07 {
			GROUP_STREAM.encode(w, version);
			self.request_id.encode(w, version);
			self.group_id.encode(w, version);
			return;
		}

		self.flags.to_type().encode(w, version);
		self.request_id.encode(w, version);
		self.group_id.encode(w, version);
		if self.flags.has_subgroup {
			0u8.encode(w, version); // the only subgroup
		}
		self.publisher_priority.encode(w, version);
	}
}

impl Decode<Version> for GroupHeader {
	fn decode<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		if version == Version::DRAFT_07 {
			let kind = u64::decode(r, version)?;
			if kind != GROUP_STREAM {
				return Err(DecodeError::InvalidValue);
			}

			return Ok(Self {
				request_id: RequestId::decode(r, version)?,
				group_id: decode_sequence(r, version)?,
				publisher_priority: 0,
				// The stream FIN is the end marker.
				flags: GroupFlags {
					has_end: true,
					..Default::default()
				},
			});
		}

		let flags = GroupFlags::from_type(u64::decode(r, version)?)?;
		let request_id = RequestId::decode(r, version)?;
		let group_id = decode_sequence(r, version)?;

		if flags.has_subgroup {
			let subgroup_id = u8::decode(r, version)?;
			if subgroup_id != 0 {
				return Err(DecodeError::Unsupported);
			}
		}

		let publisher_priority = u8::decode(r, version)?;

		Ok(Self {
			request_id,
			group_id,
			publisher_priority,
			flags,
		})
	}
}

/// Group sequences are interop-sensitive and capped at 53 bits.
fn decode_sequence<R: bytes::Buf>(r: &mut R, version: Version) -> Result<u64, DecodeError> {
	let v = u64::decode(r, version)?;
	if v > MAX_U53 {
		return Err(DecodeError::BoundsExceeded);
	}
	Ok(v)
}
