use std::borrow::Cow;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	message::{decode_namespace, encode_namespace, Message, Parameters, RequestId},
	Path,
};

/// Group delivery order. Only descending (newest first) is supported;
/// 0 is accepted on decode as "no preference".
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GroupOrder {
	Any = 0x00,
	Descending = 0x02,
}

impl Encode<Version> for GroupOrder {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		u8::from(*self).encode(w, version);
	}
}

impl Decode<Version> for GroupOrder {
	fn decode<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Self::try_from(u8::decode(r, version)?).map_err(|_| DecodeError::InvalidValue)
	}
}

/// Subscription filters. Only live filters are supported; absolute ranges are
/// rejected on decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum FilterType {
	NextGroup = 0x01,
	LargestObject = 0x02,
}

impl Encode<Version> for FilterType {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		u64::from(*self).encode(w, version);
	}
}

impl Decode<Version> for FilterType {
	fn decode<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Self::try_from(u64::decode(r, version)?).map_err(|_| DecodeError::InvalidValue)
	}
}

/// Subscribe (0x03): request all future groups for a track.
#[derive(Clone, Debug)]
pub struct Subscribe<'a> {
	pub request_id: RequestId,
	pub track_namespace: Path<'a>,
	pub track_name: Cow<'a, str>,
	pub subscriber_priority: u8,
}

impl Message for Subscribe<'_> {
	const ID: u64 = 0x03;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		encode_namespace(w, &self.track_namespace, version);
		self.track_name.encode(w, version);
		self.subscriber_priority.encode(w, version);
		GroupOrder::Descending.encode(w, version);
		true.encode(w, version); // forward
		FilterType::LargestObject.encode(w, version);
		0u8.encode(w, version); // no parameters
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let request_id = RequestId::decode(r, version)?;
		let track_namespace = decode_namespace(r, version)?;
		let track_name = Cow::<str>::decode(r, version)?;
		let subscriber_priority = u8::decode(r, version)?;

		let _group_order = GroupOrder::decode(r, version)?;

		let forward = bool::decode(r, version)?;
		if !forward {
			return Err(DecodeError::Unsupported);
		}

		let _filter_type = FilterType::decode(r, version)?;

		// Parameters are accepted and ignored.
		let _params = Parameters::decode(r, version)?;

		Ok(Self {
			request_id,
			track_namespace,
			track_name,
			subscriber_priority,
		})
	}
}

/// SubscribeOk (0x04): the subscription is live.
///
/// The track alias always equals the request id; the decoder rejects anything
/// else, along with a non-zero expiry.
#[derive(Clone, Debug)]
pub struct SubscribeOk {
	pub request_id: RequestId,
}

impl Message for SubscribeOk {
	const ID: u64 = 0x04;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		self.request_id.encode(w, version); // track_alias = request_id
		0u64.encode(w, version); // expires = 0
		GroupOrder::Descending.encode(w, version);
		false.encode(w, version); // no content
		0u8.encode(w, version); // no parameters
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let request_id = RequestId::decode(r, version)?;

		let track_alias = u64::decode(r, version)?;
		if track_alias != request_id.0 {
			return Err(DecodeError::Unsupported);
		}

		let expires = u64::decode(r, version)?;
		if expires != 0 {
			return Err(DecodeError::Unsupported);
		}

		let _group_order = u8::decode(r, version)?;

		// We don't track the largest group/object.
		if bool::decode(r, version)? {
			let _group = u64::decode(r, version)?;
			let _object = u64::decode(r, version)?;
		}

		let _params = Parameters::decode(r, version)?;

		Ok(Self { request_id })
	}
}

/// SubscribeError (0x05): the subscription was rejected.
#[derive(Clone, Debug)]
pub struct SubscribeError<'a> {
	pub request_id: RequestId,
	pub error_code: u64,
	pub reason_phrase: Cow<'a, str>,
}

impl Message for SubscribeError<'_> {
	const ID: u64 = 0x05;

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

/// Unsubscribe (0x0a): the subscriber is no longer interested.
#[derive(Clone, Debug)]
pub struct Unsubscribe {
	pub request_id: RequestId,
}

impl Message for Unsubscribe {
	const ID: u64 = 0x0a;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
		})
	}
}

/// PublishDone (0x0b): the publisher finished serving a subscription.
#[derive(Clone, Debug)]
pub struct PublishDone<'a> {
	pub request_id: RequestId,
	pub status_code: u64,
	pub stream_count: u64,
	pub reason_phrase: Cow<'a, str>,
}

impl Message for PublishDone<'_> {
	const ID: u64 = 0x0b;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		self.status_code.encode(w, version);
		self.stream_count.encode(w, version);
		self.reason_phrase.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			request_id: RequestId::decode(r, version)?,
			status_code: u64::decode(r, version)?,
			stream_count: u64::decode(r, version)?,
			reason_phrase: Cow::<str>::decode(r, version)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::BytesMut;

	fn encode_message<M: Message>(msg: &M) -> Vec<u8> {
		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		buf.to_vec()
	}

	fn decode_message<M: Message>(bytes: &[u8]) -> Result<M, DecodeError> {
		let mut buf = bytes::Bytes::from(bytes.to_vec());
		M::decode_msg(&mut buf, Version::DRAFT_14)
	}

	#[test]
	fn subscribe_round_trip() {
		let msg = Subscribe {
			request_id: RequestId(2),
			track_namespace: Path::new("room/a"),
			track_name: "video".into(),
			subscriber_priority: 128,
		};

		let encoded = encode_message(&msg);
		let decoded: Subscribe = decode_message(&encoded).unwrap();

		assert_eq!(decoded.request_id, RequestId(2));
		assert_eq!(decoded.track_namespace.as_str(), "room/a");
		assert_eq!(decoded.track_name, "video");
		assert_eq!(decoded.subscriber_priority, 128);
	}

	#[test]
	fn subscribe_rejects_invalid_filter_type() {
		#[rustfmt::skip]
		let invalid = vec![
			0x02, // request_id
			0x01, // namespace: 1 component
			0x04, 0x72, 0x6f, 0x6f, 0x6d, // "room"
			0x05, 0x76, 0x69, 0x64, 0x65, 0x6f, // "video"
			0x80, // subscriber_priority
			0x02, // group_order
			0x01, // forward
			0x40, 0x99, // INVALID filter_type
			0x00, // num_params
		];

		let result: Result<Subscribe, _> = decode_message(&invalid);
		assert!(result.is_err());
	}

	#[test]
	fn subscribe_accepts_group_order_zero() {
		#[rustfmt::skip]
		let valid = vec![
			0x02, // request_id
			0x01, // namespace: 1 component
			0x04, 0x72, 0x6f, 0x6f, 0x6d, // "room"
			0x05, 0x76, 0x69, 0x64, 0x65, 0x6f, // "video"
			0x80, // subscriber_priority
			0x00, // group_order: don't care
			0x01, // forward
			0x02, // filter_type
			0x00, // num_params
		];

		let result: Result<Subscribe, _> = decode_message(&valid);
		assert!(result.is_ok());
	}

	#[test]
	fn subscribe_rejects_forward_zero() {
		#[rustfmt::skip]
		let invalid = vec![
			0x02, // request_id
			0x01, // namespace: 1 component
			0x04, 0x72, 0x6f, 0x6f, 0x6d, // "room"
			0x05, 0x76, 0x69, 0x64, 0x65, 0x6f, // "video"
			0x80, // subscriber_priority
			0x02, // group_order
			0x00, // INVALID forward
			0x02, // filter_type
			0x00, // num_params
		];

		let result: Result<Subscribe, _> = decode_message(&invalid);
		assert!(matches!(result, Err(DecodeError::Unsupported)));
	}

	#[test]
	fn subscribe_ok_round_trip() {
		let msg = SubscribeOk {
			request_id: RequestId(42),
		};

		let encoded = encode_message(&msg);
		let decoded: SubscribeOk = decode_message(&encoded).unwrap();
		assert_eq!(decoded.request_id, RequestId(42));
	}

	#[test]
	fn subscribe_ok_rejects_non_zero_expires() {
		#[rustfmt::skip]
		let invalid = vec![
			0x01, // request_id
			0x01, // track_alias
			0x05, // INVALID: expires = 5
			0x02, // group_order
			0x00, // content_exists
			0x00, // num_params
		];

		let result: Result<SubscribeOk, _> = decode_message(&invalid);
		assert!(matches!(result, Err(DecodeError::Unsupported)));
	}

	#[test]
	fn subscribe_ok_rejects_mismatched_alias() {
		#[rustfmt::skip]
		let invalid = vec![
			0x01, // request_id
			0x03, // INVALID: track_alias != request_id
			0x00, // expires
			0x02, // group_order
			0x00, // content_exists
			0x00, // num_params
		];

		let result: Result<SubscribeOk, _> = decode_message(&invalid);
		assert!(matches!(result, Err(DecodeError::Unsupported)));
	}

	#[test]
	fn subscribe_error_round_trip() {
		let msg = SubscribeError {
			request_id: RequestId(4),
			error_code: 404,
			reason_phrase: "Broadcast not found".into(),
		};

		let encoded = encode_message(&msg);
		let decoded: SubscribeError = decode_message(&encoded).unwrap();

		assert_eq!(decoded.request_id, RequestId(4));
		assert_eq!(decoded.error_code, 404);
		assert_eq!(decoded.reason_phrase, "Broadcast not found");
	}

	#[test]
	fn unsubscribe_round_trip() {
		let msg = Unsubscribe {
			request_id: RequestId(999),
		};

		let encoded = encode_message(&msg);
		let decoded: Unsubscribe = decode_message(&encoded).unwrap();
		assert_eq!(decoded.request_id, RequestId(999));
	}

	#[test]
	fn publish_done_round_trip() {
		let msg = PublishDone {
			request_id: RequestId(6),
			status_code: 200,
			stream_count: 0,
			reason_phrase: "OK".into(),
		};

		let encoded = encode_message(&msg);
		let decoded: PublishDone = decode_message(&encoded).unwrap();

		assert_eq!(decoded.request_id, RequestId(6));
		assert_eq!(decoded.status_code, 200);
		assert_eq!(decoded.stream_count, 0);
		assert_eq!(decoded.reason_phrase, "OK");
	}
}
