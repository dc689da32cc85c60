use std::borrow::Cow;

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	message::{decode_namespace, encode_namespace, Message, Parameters, RequestId},
	Path,
};

/// PublishNamespace (0x06): announce that a namespace is available.
#[derive(Clone, Debug)]
pub struct PublishNamespace<'a> {
	pub request_id: RequestId,
	pub track_namespace: Path<'a>,
}

impl Message for PublishNamespace<'_> {
	const ID: u64 = 0x06;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		encode_namespace(w, &self.track_namespace, version);
		0u8.encode(w, version); // no parameters
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let request_id = RequestId::decode(r, version)?;
		let track_namespace = decode_namespace(r, version)?;

		// Parameters are accepted and ignored.
		let _params = Parameters::decode(r, version)?;

		Ok(Self {
			request_id,
			track_namespace,
		})
	}
}

/// PublishNamespaceOk (0x07): the peer accepted the announcement.
#[derive(Clone, Debug)]
pub struct PublishNamespaceOk {
	pub request_id: RequestId,
}

impl Message for PublishNamespaceOk {
	const ID: u64 = 0x07;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
		})
	}
}

/// PublishNamespaceError (0x08): the peer rejected the announcement.
#[derive(Clone, Debug)]
pub struct PublishNamespaceError<'a> {
	pub request_id: RequestId,
	pub error_code: u64,
	pub reason_phrase: Cow<'a, str>,
}

impl Message for PublishNamespaceError<'_> {
	const ID: u64 = 0x08;

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

/// PublishNamespaceDone (0x09): the namespace is no longer available.
#[derive(Clone, Debug)]
pub struct PublishNamespaceDone<'a> {
	pub track_namespace: Path<'a>,
}

impl Message for PublishNamespaceDone<'_> {
	const ID: u64 = 0x09;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		encode_namespace(w, &self.track_namespace, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			track_namespace: decode_namespace(r, version)?,
		})
	}
}

/// PublishNamespaceCancel (0x0c): the peer revoked its acceptance.
#[derive(Clone, Debug)]
pub struct PublishNamespaceCancel<'a> {
	pub track_namespace: Path<'a>,
	pub error_code: u64,
	pub reason_phrase: Cow<'a, str>,
}

impl Message for PublishNamespaceCancel<'_> {
	const ID: u64 = 0x0c;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		encode_namespace(w, &self.track_namespace, version);
		self.error_code.encode(w, version);
		self.reason_phrase.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			track_namespace: decode_namespace(r, version)?,
			error_code: u64::decode(r, version)?,
			reason_phrase: Cow::<str>::decode(r, version)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::BytesMut;

	fn round_trip<M: Message>(msg: &M) -> M {
		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		M::decode_msg(&mut buf.freeze(), Version::DRAFT_14).unwrap()
	}

	#[test]
	fn publish_namespace() {
		let decoded = round_trip(&PublishNamespace {
			request_id: RequestId(0),
			track_namespace: Path::new("room/a"),
		});

		assert_eq!(decoded.request_id, RequestId(0));
		assert_eq!(decoded.track_namespace.as_str(), "room/a");
	}

	#[test]
	fn publish_namespace_ok() {
		let decoded = round_trip(&PublishNamespaceOk {
			request_id: RequestId(12),
		});
		assert_eq!(decoded.request_id, RequestId(12));
	}

	#[test]
	fn publish_namespace_error() {
		let decoded = round_trip(&PublishNamespaceError {
			request_id: RequestId(2),
			error_code: 403,
			reason_phrase: "Unauthorized".into(),
		});

		assert_eq!(decoded.request_id, RequestId(2));
		assert_eq!(decoded.error_code, 403);
		assert_eq!(decoded.reason_phrase, "Unauthorized");
	}

	#[test]
	fn publish_namespace_done() {
		let decoded = round_trip(&PublishNamespaceDone {
			track_namespace: Path::new("room/a"),
		});
		assert_eq!(decoded.track_namespace.as_str(), "room/a");
	}

	#[test]
	fn publish_namespace_cancel() {
		let decoded = round_trip(&PublishNamespaceCancel {
			track_namespace: Path::new("room/a"),
			error_code: 1,
			reason_phrase: "shutdown".into(),
		});

		assert_eq!(decoded.track_namespace.as_str(), "room/a");
		assert_eq!(decoded.error_code, 1);
		assert_eq!(decoded.reason_phrase, "shutdown");
	}
}
