use std::borrow::Cow;

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	message::{decode_namespace, encode_namespace, Message, Parameters, RequestId},
	Path,
};

/// SubscribeNamespace (0x11): request announcements under a prefix.
#[derive(Clone, Debug)]
pub struct SubscribeNamespace<'a> {
	pub request_id: RequestId,
	pub prefix: Path<'a>,
}

impl Message for SubscribeNamespace<'_> {
	const ID: u64 = 0x11;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		encode_namespace(w, &self.prefix, version);
		0u8.encode(w, version); // no parameters
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let request_id = RequestId::decode(r, version)?;
		let prefix = decode_namespace(r, version)?;

		// Parameters are accepted and ignored.
		let _params = Parameters::decode(r, version)?;

		Ok(Self { request_id, prefix })
	}
}

/// SubscribeNamespaceOk (0x12).
#[derive(Clone, Debug)]
pub struct SubscribeNamespaceOk {
	pub request_id: RequestId,
}

impl Message for SubscribeNamespaceOk {
	const ID: u64 = 0x12;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
		})
	}
}

/// SubscribeNamespaceError (0x13).
#[derive(Clone, Debug)]
pub struct SubscribeNamespaceError<'a> {
	pub request_id: RequestId,
	pub error_code: u64,
	pub reason_phrase: Cow<'a, str>,
}

impl Message for SubscribeNamespaceError<'_> {
	const ID: u64 = 0x13;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		self.error_code.encode(w, version);
		self.reason_phrase.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
			error_code: u64::decode(r, version)?,
			reason_phrase: Cow::<str>::decode(r, version)?,
		})
	}
}

/// UnsubscribeNamespace (0x14): stop receiving announcements.
#[derive(Clone, Debug)]
pub struct UnsubscribeNamespace {
	pub request_id: RequestId,
}

impl Message for UnsubscribeNamespace {
	const ID: u64 = 0x14;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::BytesMut;

	#[test]
	fn prefix_round_trip() {
		let msg = SubscribeNamespace {
			request_id: RequestId(4),
			prefix: Path::new("room/"),
		};

		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		let decoded = SubscribeNamespace::decode_msg(&mut buf.freeze(), Version::DRAFT_14).unwrap();

		assert_eq!(decoded.request_id, RequestId(4));
		// The trailing slash is not carried by the tuple encoding.
		assert_eq!(decoded.prefix.as_str(), "room");
	}
}
