use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	message::{Message, RequestId},
};

/// MaxRequestId (0x15): advertise the largest request id the peer may use.
///
/// Received values are logged and ignored; the allocator is not flow
/// controlled.
#[derive(Clone, Debug)]
pub struct MaxRequestId {
	pub request_id: RequestId,
}

impl Message for MaxRequestId {
	const ID: u64 = 0x15;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
		})
	}
}

/// RequestsBlocked (0x1a): the peer ran out of request ids.
#[derive(Clone, Debug)]
pub struct RequestsBlocked {
	pub max_request_id: RequestId,
}

impl Message for RequestsBlocked {
	const ID: u64 = 0x1a;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.max_request_id.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			max_request_id: RequestId::decode(r, version)?,
		})
	}
}
