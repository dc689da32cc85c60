use std::collections::{hash_map, HashMap};

use bytes::Bytes;

use crate::coding::{Decode, DecodeError, Encode};

/// A message may carry at most this many parameters.
const MAX_PARAMS: u64 = 64;

/// Well-known parameter ids.
pub mod param {
	pub const MAX_REQUEST_ID: u64 = 2;
	pub const IMPLEMENTATION: u64 = 7;
}

/// An `id → opaque bytes` map carried by setup and namespace messages.
///
/// Unknown ids are kept verbatim; duplicate ids are a fatal decode error.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Parameters(HashMap<u64, Bytes>);

impl Parameters {
	pub fn get(&self, id: u64) -> Option<&Bytes> {
		self.0.get(&id)
	}

	pub fn set(&mut self, id: u64, value: Bytes) {
		self.0.insert(id, value);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<V: Clone> Decode<V> for Parameters {
	fn decode<R: bytes::Buf>(r: &mut R, version: V) -> Result<Self, DecodeError> {
		let count = u64::decode(r, version.clone())?;
		if count > MAX_PARAMS {
			return Err(DecodeError::TooMany);
		}

		let mut entries = HashMap::new();
		for _ in 0..count {
			let id = u64::decode(r, version.clone())?;
			let value = Bytes::decode(r, version.clone())?;

			match entries.entry(id) {
				hash_map::Entry::Occupied(_) => return Err(DecodeError::Duplicate),
				hash_map::Entry::Vacant(entry) => entry.insert(value),
			};
		}

		Ok(Self(entries))
	}
}

impl<V: Clone> Encode<V> for Parameters {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: V) {
		(self.0.len() as u64).encode(w, version.clone());

		for (id, value) in &self.0 {
			id.encode(w, version.clone());
			value.encode(w, version.clone());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::BytesMut;

	#[test]
	fn round_trip() {
		let mut params = Parameters::default();
		params.set(param::MAX_REQUEST_ID, Bytes::from_static(&[0x40, 0x80]));
		params.set(param::IMPLEMENTATION, Bytes::from_static(b"moq-client-rs"));

		let mut buf = BytesMut::new();
		params.encode(&mut buf, ());
		let decoded = Parameters::decode(&mut buf, ()).unwrap();

		assert_eq!(decoded, params);
	}

	#[test]
	fn duplicate_id_is_fatal() {
		// Two entries with id 2.
		let mut buf = BytesMut::new();
		2u64.encode(&mut buf, ());
		for _ in 0..2 {
			2u64.encode(&mut buf, ());
			Bytes::from_static(b"x").encode(&mut buf, ());
		}

		assert!(matches!(
			Parameters::decode(&mut buf, ()),
			Err(DecodeError::Duplicate)
		));
	}

	#[test]
	fn too_many_is_fatal() {
		let mut buf = BytesMut::new();
		(MAX_PARAMS + 1).encode(&mut buf, ());

		assert!(matches!(Parameters::decode(&mut buf, ()), Err(DecodeError::TooMany)));
	}
}
