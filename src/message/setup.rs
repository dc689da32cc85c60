use crate::{
	coding::{Decode, DecodeError, Encode, Version, Versions},
	message::{Message, Parameters},
};

/// ClientSetup (0x20): offer a list of versions plus parameters.
///
/// Setup is always exchanged with [Version::DRAFT_14] framing; the negotiated
/// version applies to everything afterwards.
#[derive(Clone, Debug)]
pub struct ClientSetup {
	pub versions: Versions,
	pub parameters: Parameters,
}

impl Message for ClientSetup {
	const ID: u64 = 0x20;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.versions.encode(w, version);
		self.parameters.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			versions: Versions::decode(r, version)?,
			parameters: Parameters::decode(r, version)?,
		})
	}
}

/// ServerSetup (0x21): the selected version plus parameters.
#[derive(Clone, Debug)]
pub struct ServerSetup {
	pub version: Version,
	pub parameters: Parameters,
}

impl Message for ServerSetup {
	const ID: u64 = 0x21;

	fn encode_msg<W: bytes::BufMut>(&self, w: &mut W, version: Version) {
		self.version.encode(w, version);
		self.parameters.encode(w, version);
	}

	fn decode_msg<R: bytes::Buf>(r: &mut R, version: Version) -> Result<Self, DecodeError> {
		Ok(Self {
			version: Version::decode(r, version)?,
			parameters: Parameters::decode(r, version)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::coding::MAX_VERSIONS;
	use bytes::BytesMut;

	#[test]
	fn client_setup_round_trip() {
		let msg = ClientSetup {
			versions: [Version::DRAFT_14, Version::DRAFT_07].into(),
			parameters: Default::default(),
		};

		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		let decoded = ClientSetup::decode_msg(&mut buf.freeze(), Version::DRAFT_14).unwrap();

		assert_eq!(*decoded.versions, vec![Version::DRAFT_14, Version::DRAFT_07]);
		assert!(decoded.parameters.is_empty());
	}

	#[test]
	fn server_setup_round_trip() {
		let msg = ServerSetup {
			version: Version::DRAFT_14,
			parameters: Default::default(),
		};

		let mut buf = BytesMut::new();
		msg.encode_msg(&mut buf, Version::DRAFT_14);
		let decoded = ServerSetup::decode_msg(&mut buf.freeze(), Version::DRAFT_14).unwrap();

		assert_eq!(decoded.version, Version::DRAFT_14);
	}

	#[test]
	fn client_setup_caps_versions() {
		let mut buf = BytesMut::new();
		(MAX_VERSIONS + 1).encode(&mut buf, Version::DRAFT_14);

		assert!(matches!(
			ClientSetup::decode_msg(&mut buf.freeze(), Version::DRAFT_14),
			Err(DecodeError::TooMany)
		));
	}
}
