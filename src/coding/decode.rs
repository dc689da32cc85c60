use std::{borrow::Cow, string::FromUtf8Error};

use thiserror::Error;

/// Read from the buffer using the given version.
///
/// If [DecodeError::Short] is returned, the caller should try again with more
/// data; the buffer position is discarded on failure.
pub trait Decode<V>: Sized {
	/// Decode the value from the given buffer.
	fn decode<B: bytes::Buf>(buf: &mut B, version: V) -> Result<Self, DecodeError>;
}

/// A decode error.
#[derive(Error, Debug, Clone)]
pub enum DecodeError {
	/// Not enough data yet; retry with a larger buffer.
	#[error("short buffer")]
	Short,

	#[error("invalid string")]
	InvalidString(#[from] FromUtf8Error),

	#[error("invalid value")]
	InvalidValue,

	#[error("too many")]
	TooMany,

	/// A varint exceeded the width the field allows.
	#[error("bounds exceeded")]
	BoundsExceeded,

	/// The stream was expected to end here.
	#[error("expected end")]
	ExpectedEnd,

	#[error("duplicate")]
	Duplicate,

	#[error("unsupported")]
	Unsupported,
}

impl<V> Decode<V> for bool {
	fn decode<R: bytes::Buf>(r: &mut R, version: V) -> Result<Self, DecodeError> {
		match u8::decode(r, version)? {
			0 => Ok(false),
			1 => Ok(true),
			_ => Err(DecodeError::InvalidValue),
		}
	}
}

impl<V> Decode<V> for u8 {
	fn decode<R: bytes::Buf>(r: &mut R, _: V) -> Result<Self, DecodeError> {
		if !r.has_remaining() {
			return Err(DecodeError::Short);
		}
		Ok(r.get_u8())
	}
}

impl<V> Decode<V> for u16 {
	/// Decode a big-endian u16.
	fn decode<R: bytes::Buf>(r: &mut R, _: V) -> Result<Self, DecodeError> {
		if r.remaining() < 2 {
			return Err(DecodeError::Short);
		}
		Ok(r.get_u16())
	}
}

impl<V> Decode<V> for i32 {
	/// Decode a big-endian two's complement i32.
	fn decode<R: bytes::Buf>(r: &mut R, _: V) -> Result<Self, DecodeError> {
		if r.remaining() < 4 {
			return Err(DecodeError::Short);
		}
		Ok(r.get_i32())
	}
}

impl<V> Decode<V> for bytes::Bytes {
	/// Decode a byte blob with a varint length prefix.
	fn decode<R: bytes::Buf>(r: &mut R, version: V) -> Result<Self, DecodeError> {
		let size = usize::decode(r, version)?;
		if r.remaining() < size {
			return Err(DecodeError::Short);
		}
		Ok(r.copy_to_bytes(size))
	}
}

impl<V> Decode<V> for Vec<u8> {
	fn decode<B: bytes::Buf>(buf: &mut B, version: V) -> Result<Self, DecodeError> {
		Ok(bytes::Bytes::decode(buf, version)?.to_vec())
	}
}

impl<V> Decode<V> for String {
	/// Decode a UTF-8 string with a varint length prefix.
	fn decode<R: bytes::Buf>(r: &mut R, version: V) -> Result<Self, DecodeError> {
		let bytes = Vec::<u8>::decode(r, version)?;
		Ok(String::from_utf8(bytes)?)
	}
}

impl<V> Decode<V> for Cow<'_, str> {
	fn decode<R: bytes::Buf>(r: &mut R, version: V) -> Result<Self, DecodeError> {
		Ok(Cow::Owned(String::decode(r, version)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::coding::Encode;
	use bytes::{Buf, Bytes, BytesMut};

	#[test]
	fn string_round_trip() {
		for s in ["", "video", "日本語のトラック", "a/b/c"] {
			let mut buf = BytesMut::new();
			s.encode(&mut buf, ());
			let decoded = String::decode(&mut buf, ()).unwrap();
			assert_eq!(decoded, s);
			assert!(!buf.has_remaining());
		}
	}

	#[test]
	fn string_invalid_utf8() {
		let mut buf: Bytes = vec![0x02, 0xff, 0xfe].into();
		assert!(matches!(
			String::decode(&mut buf, ()),
			Err(DecodeError::InvalidString(_))
		));
	}

	#[test]
	fn bool_invalid() {
		let mut buf: Bytes = vec![0x02].into();
		assert!(matches!(bool::decode(&mut buf, ()), Err(DecodeError::InvalidValue)));
	}

	#[test]
	fn fixed_width() {
		let mut buf = BytesMut::new();
		0xfeedu16.encode(&mut buf, ());
		(-2i32).encode(&mut buf, ());
		assert_eq!(buf.to_vec(), vec![0xfe, 0xed, 0xff, 0xff, 0xff, 0xfe]);

		assert_eq!(u16::decode(&mut buf, ()).unwrap(), 0xfeed);
		assert_eq!(i32::decode(&mut buf, ()).unwrap(), -2);
	}
}
