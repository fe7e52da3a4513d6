use crate::{
	crypto::KeyType,
	varint::{encode_varint, VarintEncoding},
};

/// The key algorithms that can be embedded in a `did:key`.
///
/// This set is deliberately closed, every variant has a fixed multicodec value
/// and a fixed length for its raw public key.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum KeyAlgo {
	Ed25519,
	Secp256k1,
	/// A secp256k1 key whose signatures are over ethereum "personal_sign"
	/// digests.
	Eth,
}

impl KeyAlgo {
	pub const ALL: [Self; 3] = [Self::Ed25519, Self::Secp256k1, Self::Eth];

	/// Length of the raw public key, in bytes.
	pub const fn pub_key_len(&self) -> usize {
		match self {
			Self::Ed25519 => Ed25519::PUB_KEY_LEN,
			Self::Secp256k1 => Secp256k1::PUB_KEY_LEN,
			Self::Eth => Eth::PUB_KEY_LEN,
		}
	}

	/// The multicodec value identifying this algorithm's public keys.
	pub const fn multicodec(&self) -> u16 {
		match self {
			Self::Ed25519 => Ed25519::MULTICODEC_VALUE,
			Self::Secp256k1 => Secp256k1::MULTICODEC_VALUE,
			Self::Eth => Eth::MULTICODEC_VALUE,
		}
	}

	pub(crate) const fn multicodec_encoded(&self) -> VarintEncoding {
		match self {
			Self::Ed25519 => Ed25519::MULTICODEC_VALUE_ENCODED,
			Self::Secp256k1 => Secp256k1::MULTICODEC_VALUE_ENCODED,
			Self::Eth => Eth::MULTICODEC_VALUE_ENCODED,
		}
	}

	pub const fn from_multicodec(value: u16) -> Option<Self> {
		let mut idx = 0;
		while idx < Self::ALL.len() {
			if Self::ALL[idx].multicodec() == value {
				return Some(Self::ALL[idx]);
			}
			idx += 1;
		}
		None
	}

	pub const fn key_type(&self) -> KeyType {
		match self {
			Self::Ed25519 => KeyType::Ed25519,
			Self::Secp256k1 => KeyType::Secp256k1,
			Self::Eth => KeyType::Eth,
		}
	}

	pub const fn name(&self) -> &'static str {
		match self {
			Self::Ed25519 => "ed25519",
			Self::Secp256k1 => "secp256k1",
			Self::Eth => "eth",
		}
	}
}

impl TryFrom<KeyType> for KeyAlgo {
	type Error = UnsupportedKeyType;

	fn try_from(value: KeyType) -> Result<Self, Self::Error> {
		match value {
			KeyType::Ed25519 => Ok(Self::Ed25519),
			KeyType::Secp256k1 => Ok(Self::Secp256k1),
			KeyType::Eth => Ok(Self::Eth),
			other => Err(UnsupportedKeyType(other)),
		}
	}
}

impl std::fmt::Display for KeyAlgo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.name().fmt(f)
	}
}

impl std::str::FromStr for KeyAlgo {
	type Err = UnknownKeyAlgo;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|algo| algo.name().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownKeyAlgo(s.to_owned()))
	}
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
#[error("key type {0:?} cannot be used with did:key")]
pub struct UnsupportedKeyType(pub KeyType);

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
#[error("unknown key algorithm {0:?}, expected one of ed25519, secp256k1, eth")]
pub struct UnknownKeyAlgo(pub String);

// ---- internal code ----

/// A key algorithm that is known statically, at compile time.
pub(crate) trait StaticKeyAlgo {
	const PUB_KEY_LEN: usize;
	const MULTICODEC_VALUE: u16;
	const MULTICODEC_VALUE_ENCODED: VarintEncoding =
		encode_varint(Self::MULTICODEC_VALUE);
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct Ed25519;

impl StaticKeyAlgo for Ed25519 {
	const PUB_KEY_LEN: usize = 32;
	const MULTICODEC_VALUE: u16 = 0xED;
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct Secp256k1;

impl StaticKeyAlgo for Secp256k1 {
	/// SEC1 compressed point.
	const PUB_KEY_LEN: usize = 33;
	const MULTICODEC_VALUE: u16 = 0xE7;
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct Eth;

impl StaticKeyAlgo for Eth {
	const PUB_KEY_LEN: usize = Secp256k1::PUB_KEY_LEN;
	const MULTICODEC_VALUE: u16 = 0xEF01;
}
