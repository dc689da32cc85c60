use std::borrow::Cow;

use crate::{
	coding::{Decode, DecodeError, Encode, Version},
	message::Message,
};

/// GoAway (0x10): the server asks us to migrate to a new session.
///
/// Redirects are not supported; receiving this message is fatal.
#[derive(Clone, Debug)]
pub struct GoAway<'a> {
	pub new_session_uri: Cow<'a, str>,
}

impl Message for GoAway<'_> {
	const ID: u64 = 0x10;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.new_session_uri.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			new_session_uri: Cow::<str>::decode(r, version)?,
		})
	}
}
