use std::borrow::Cow;

/// Write the value to the buffer using the given version.
pub trait Encode<V>: Sized {
	/// Encode the value to the given writer.
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V);
}

impl<V> Encode<V> for bool {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, _: V) {
		w.put_u8(*self as u8);
	}
}

impl<V> Encode<V> for u8 {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, _: V) {
		w.put_u8(*self);
	}
}

impl<V> Encode<V> for u16 {
	/// Encode a big-endian u16.
	fn encode<W: bytes::BufMut>(&self, w: &mut W, _: V) {
		w.put_u16(*self);
	}
}

impl<V> Encode<V> for i32 {
	/// Encode a big-endian two's complement i32.
	fn encode<W: bytes::BufMut>(&self, w: &mut W, _: V) {
		w.put_i32(*self);
	}
}

impl<V> Encode<V> for &[u8] {
	/// Encode a byte blob with a varint length prefix.
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		self.len().encode(w, version);
		w.put_slice(self);
	}
}

impl<V> Encode<V> for &str {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		self.as_bytes().encode(w, version)
	}
}

impl<V> Encode<V> for String {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		self.as_bytes().encode(w, version)
	}
}

impl<V> Encode<V> for Cow<'_, str> {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		self.as_bytes().encode(w, version)
	}
}

impl<V> Encode<V> for Vec<u8> {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		self.as_slice().encode(w, version)
	}
}

impl<V> Encode<V> for bytes::Bytes {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		self.as_ref().encode(w, version)
	}
}
