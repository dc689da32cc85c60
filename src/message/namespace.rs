use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	Path,
};

/// A namespace tuple may hold at most this many components.
const MAX_COMPONENTS: u64 = 32;

/// Encode a path as a tuple of name components.
pub fn encode_namespace<W: bytes::BufMut>(w: &mut W, path: &Path, version: Version) {
	let count = path.components().count() as u64;
	count.encode(w, version);
	for part in path.components() {
		part.encode(w, version);
	}
}

/// Decode a tuple of name components into a path.
pub fn decode_namespace<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Path<'static>, DecodeError> {
	let count = u64::decode(r, version)?;
	if count > MAX_COMPONENTS {
		return Err(DecodeError::TooMany);
	}

	let mut parts = Vec::with_capacity(count as usize);
	for _ in 0..count {
		let part = String::decode(r, version)?;
		if part.is_empty() || part.contains('/') {
			return Err(DecodeError::InvalidValue);
		}
		parts.push(part);
	}

	Ok(Path::from(parts.join("/")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::{Buf, Bytes, BytesMut};

	fn round_trip(path: &str) -> Path<'static> {
		let mut buf = BytesMut::new();
		encode_namespace(&mut buf, &Path::new(path), Version::DRAFT_14);
		let decoded = decode_namespace(&mut buf, Version::DRAFT_14).unwrap();
		assert!(!buf.has_remaining());
		decoded
	}

	#[test]
	fn tuple_round_trip() {
		assert_eq!(round_trip("room/a").as_str(), "room/a");
		assert_eq!(round_trip("room").as_str(), "room");
		assert_eq!(round_trip("").as_str(), "");
	}

	#[test]
	fn prefix_drops_trailing_slash() {
		assert_eq!(round_trip("room/").as_str(), "room");
	}

	#[test]
	fn rejects_empty_component() {
		// One component, zero-length string.
		let mut buf: Bytes = vec![0x01, 0x00].into();
		assert!(matches!(
			decode_namespace(&mut buf, Version::DRAFT_14),
			Err(DecodeError::InvalidValue)
		));
	}
}
