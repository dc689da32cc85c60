use crate::coding::{Decode, DecodeError, Encode};

/// The largest value that fits in a 1-byte varint.
pub const MAX_U6: u64 = (1 << 6) - 1;

/// The largest value that fits in a 2-byte varint.
pub const MAX_U14: u64 = (1 << 14) - 1;

/// The largest value that fits in a 4-byte varint.
pub const MAX_U30: u64 = (1 << 30) - 1;

/// The largest value representable without loss in JavaScript.
/// Interop-sensitive fields (lengths, sequences, ietf request ids) are capped here.
pub const MAX_U53: u64 = (1 << 53) - 1;

/// The largest value that fits in an 8-byte varint.
pub const MAX_U62: u64 = (1 << 62) - 1;

impl<V> Decode<V> for u64 {
	/// Decode a QUIC variable-length integer.
	///
	/// The top two bits of the first byte select a total width of 1, 2, 4 or 8
	/// bytes; the remaining bits hold the big-endian magnitude.
	fn decode<R: bytes::Buf>(r: &mut R, _: V) -> Result<Self, DecodeError> {
		if !r.has_remaining() {
			return Err(DecodeError::Short);
		}

		let first = r.get_u8();
		let size = 1usize << (first >> 6);
		let mut value = (first & 0b0011_1111) as u64;

		if r.remaining() < size - 1 {
			return Err(DecodeError::Short);
		}

		for _ in 1..size {
			value = (value << 8) | r.get_u8() as u64;
		}

		Ok(value)
	}
}

impl<V> Encode<V> for u64 {
	/// Encode a QUIC variable-length integer at the minimum width.
	fn encode<W: bytes::BufMut>(&self, w: &mut W, _: V) {
		let x = *self;
		match x {
			0..=MAX_U6 => w.put_u8(x as u8),
			0..=MAX_U14 => w.put_u16(0x4000 | x as u16),
			0..=MAX_U30 => w.put_u32(0x8000_0000 | x as u32),
			0..=MAX_U62 => w.put_u64(0xc000_0000_0000_0000 | x),
			_ => panic!("varint too large"),
		}
	}
}

impl<V> Decode<V> for usize {
	/// Decode a varint length, bounded to 53 bits.
	fn decode<R: bytes::Buf>(r: &mut R, version: V) -> Result<Self, DecodeError> {
		let v = u64::decode(r, version)?;
		if v > MAX_U53 {
			return Err(DecodeError::BoundsExceeded);
		}
		v.try_into().map_err(|_| DecodeError::BoundsExceeded)
	}
}

impl<V> Encode<V> for usize {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		(*self as u64).encode(w, version)
	}
}
