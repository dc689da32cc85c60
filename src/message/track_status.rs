use std::borrow::Cow;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	message::{decode_namespace, encode_namespace, FilterType, GroupOrder, Message, Parameters, RequestId},
	Path,
};

/// TrackStatusRequest (0x0d): one-shot query for the state of a track.
#[derive(Clone, Debug)]
pub struct TrackStatusRequest<'a> {
	pub request_id: RequestId,
	pub track_namespace: Path<'a>,
	pub track_name: Cow<'a, str>,
}

impl Message for TrackStatusRequest<'_> {
	const ID: u64 = 0x0d;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		encode_namespace(w, &self.track_namespace, version);
		self.track_name.encode(w, version);
		0u8.encode(w, version); // subscriber priority
		GroupOrder::Descending.encode(w, version);
		false.encode(w, version); // forward
		FilterType::LargestObject.encode(w, version);
		0u8.encode(w, version); // no parameters
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let request_id = RequestId::decode(r, version)?;
		let track_namespace = decode_namespace(r, version)?;
		let track_name = Cow::<str>::decode(r, version)?;

		let _subscriber_priority = u8::decode(r, version)?;
		let _group_order = GroupOrder::decode(r, version)?;
		let _forward = bool::decode(r, version)?;
		let _filter_type = u64::decode(r, version)?;

		// Parameters are accepted and ignored.
		let _params = Parameters::decode(r, version)?;

		Ok(Self {
			request_id,
			track_namespace,
			track_name,
		})
	}
}

/// The state reported by a [TrackStatus].
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum TrackStatusCode {
	InProgress = 0x00,
	NotFound = 0x01,
	NotAuthorized = 0x02,
	Ended = 0x03,
}

impl Encode<Version> for TrackStatusCode {
	fn encode<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		u64::from(*self).encode(w, version);
	}
}

impl Decode<Version> for TrackStatusCode {
	fn decode<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Self::try_from(u64::decode(r, version)?).map_err(|_| DecodeError::InvalidValue)
	}
}

/// TrackStatus (0x0e): the answer to a [TrackStatusRequest].
#[derive(Clone, Debug)]
pub struct TrackStatus {
	pub request_id: RequestId,
	pub status: TrackStatusCode,
	pub largest_group: u64,
	pub largest_object: u64,
}

impl Message for TrackStatus {
	const ID: u64 = 0x0e;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.request_id.encode(w, version);
		self.status.encode(w, version);
		self.largest_group.encode(w, version);
		self.largest_object.encode(w, version);
		0u8.encode(w, version); // no parameters
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		let request_id = RequestId::decode(r, version)?;
		let status = TrackStatusCode::decode(r, version)?;
		let largest_group = u64::decode(r, version)?;
		let largest_object = u64::decode(r, version)?;

		let _params = Parameters::decode(r, version)?;

		Ok(Self {
			request_id,
			status,
			largest_group,
			largest_object,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::BytesMut;

	#[test]
	fn request_round_trip() {
		let msg = TrackStatusRequest {
			request_id: RequestId(10),
			track_namespace: Path::new("room/a"),
			track_name: "video".into(),
		};

		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		let decoded = TrackStatusRequest::decode_msg(&mut buf.freeze(), Version::DRAFT_14).unwrap();

		assert_eq!(decoded.request_id, RequestId(10));
		assert_eq!(decoded.track_namespace.as_str(), "room/a");
		assert_eq!(decoded.track_name, "video");
	}

	#[test]
	fn status_round_trip() {
		let msg = TrackStatus {
			request_id: RequestId(10),
			status: TrackStatusCode::NotFound,
			largest_group: 0,
			largest_object: 0,
		};

		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		let decoded = TrackStatus::decode_msg(&mut buf.freeze(), Version::DRAFT_14).unwrap();

		assert_eq!(decoded.request_id, RequestId(10));
		assert_eq!(decoded.status, TrackStatusCode::NotFound);
		assert_eq!(decoded.largest_group, 0);
		assert_eq!(decoded.largest_object, 0);
	}
}
