//! Key material for the algorithms that can back a `did:key`.
//!
//! Keys are modelled as closed enums ([`PublicKey`], [`PrivateKey`]) over the
//! supported [`KeyAlgo`]s. Keys coming from elsewhere only need to implement
//! [`TypedPublicKey`] to be formatted as a `did:key`.

// Re-exports
#[cfg(feature = "random")]
pub use rand_core;

pub mod ed25519;
pub mod eth;
pub mod secp256k1;

use std::fmt::Debug;

use crate::{
	key_algos::KeyAlgo,
	methods::key::{decode_tagged, encode_tagged, TaggedKeyError},
};

/// Every key type a [`TypedPublicKey`] can report. Only some of them are
/// representable as a `did:key`, see [`KeyAlgo`].
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
#[non_exhaustive]
pub enum KeyType {
	Rsa,
	Ed25519,
	Secp256k1,
	Ecdsa,
	Eth,
}

/// The capabilities we need from a public key, regardless of where it came
/// from.
pub trait TypedPublicKey {
	fn key_type(&self) -> KeyType;

	/// The raw, algorithm specific encoding of the key.
	fn raw(&self) -> Result<Vec<u8>, RawKeyError>;

	/// Returns `Ok(false)` if the signature is well formed but doesn't match.
	fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<bool, SignatureError>;
}

#[derive(thiserror::Error, Debug)]
#[error("failed to get raw key bytes")]
pub struct RawKeyError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum SignatureError {
	#[error("signature is not a valid {0} signature encoding")]
	Malformed(KeyAlgo),
}

#[derive(thiserror::Error, Debug)]
#[error("failed to sign message")]
pub struct SignError(#[from] k256::ecdsa::Error);

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum KeyBytesError {
	#[error("expected {expected} bytes for a {algo} key but got {got}")]
	WrongLength {
		algo: KeyAlgo,
		expected: usize,
		got: usize,
	},
	#[error(
		"the provided bytes was not the y coordinate of a valid point on the curve"
	)]
	NotOnCurve,
	#[error("public key has a low order and is too weak, which would allow the key to generate signatures that work for almost any message. To prevent this, we reject weak keys.")]
	WeakKey,
	#[error("the provided bytes are not a valid {0} key")]
	Invalid(KeyAlgo),
}

/// A public key of one of the supported algorithms.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PublicKey {
	Ed25519(ed25519::PubKey),
	Secp256k1(secp256k1::PubKey),
	Eth(eth::PubKey),
}

impl PublicKey {
	pub fn algo(&self) -> KeyAlgo {
		match self {
			Self::Ed25519(_) => KeyAlgo::Ed25519,
			Self::Secp256k1(_) => KeyAlgo::Secp256k1,
			Self::Eth(_) => KeyAlgo::Eth,
		}
	}

	/// Parses the raw encoding of a key. This is the inverse of
	/// [`Self::to_raw`].
	pub fn try_from_raw(algo: KeyAlgo, bytes: &[u8]) -> Result<Self, KeyBytesError> {
		Ok(match algo {
			KeyAlgo::Ed25519 => Self::Ed25519(ed25519::PubKey::try_from_slice(bytes)?),
			KeyAlgo::Secp256k1 => {
				Self::Secp256k1(secp256k1::PubKey::try_from_bytes(bytes)?)
			}
			KeyAlgo::Eth => Self::Eth(eth::PubKey::try_from_bytes(bytes)?),
		})
	}

	/// The raw encoding of the key: 32 bytes for ed25519, and a 33 byte SEC1
	/// compressed point for the secp256k1 based keys.
	pub fn to_raw(&self) -> Vec<u8> {
		match self {
			Self::Ed25519(k) => k.as_bytes().to_vec(),
			Self::Secp256k1(k) => k.to_bytes(),
			Self::Eth(k) => k.to_bytes(),
		}
	}

	pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<bool, SignatureError> {
		match self {
			Self::Ed25519(k) => k.verify(msg, sig),
			Self::Secp256k1(k) => k.verify(msg, sig),
			Self::Eth(k) => k.verify(msg, sig),
		}
	}
}

impl TypedPublicKey for PublicKey {
	fn key_type(&self) -> KeyType {
		self.algo().key_type()
	}

	fn raw(&self) -> Result<Vec<u8>, RawKeyError> {
		Ok(self.to_raw())
	}

	fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<bool, SignatureError> {
		PublicKey::verify(self, msg, sig)
	}
}

/// A private key of one of the supported algorithms.
#[derive(Clone)]
pub enum PrivateKey {
	Ed25519(ed25519::PrivKey),
	Secp256k1(secp256k1::PrivKey),
	Eth(eth::PrivKey),
}

impl PrivateKey {
	/// Generates a fresh key using the OS random number generator.
	#[cfg(feature = "random")]
	pub fn generate(algo: KeyAlgo) -> Self {
		let mut rng = rand_core::OsRng;
		match algo {
			KeyAlgo::Ed25519 => Self::Ed25519(ed25519::PrivKey::random(&mut rng)),
			KeyAlgo::Secp256k1 => Self::Secp256k1(secp256k1::PrivKey::random(&mut rng)),
			KeyAlgo::Eth => Self::Eth(eth::PrivKey::random(&mut rng)),
		}
	}

	/// Imports a 32 byte secret. This is the inverse of [`Self::to_secret_bytes`].
	pub fn try_from_secret_bytes(
		algo: KeyAlgo,
		bytes: &[u8],
	) -> Result<Self, KeyBytesError> {
		Ok(match algo {
			KeyAlgo::Ed25519 => Self::Ed25519(ed25519::PrivKey::try_from_slice(bytes)?),
			KeyAlgo::Secp256k1 => {
				Self::Secp256k1(secp256k1::PrivKey::try_from_bytes(bytes)?)
			}
			KeyAlgo::Eth => Self::Eth(eth::PrivKey::try_from_bytes(bytes)?),
		})
	}

	pub fn to_secret_bytes(&self) -> Vec<u8> {
		match self {
			Self::Ed25519(k) => k.to_bytes().to_vec(),
			Self::Secp256k1(k) => k.to_bytes(),
			Self::Eth(k) => k.to_bytes(),
		}
	}

	pub fn algo(&self) -> KeyAlgo {
		match self {
			Self::Ed25519(_) => KeyAlgo::Ed25519,
			Self::Secp256k1(_) => KeyAlgo::Secp256k1,
			Self::Eth(_) => KeyAlgo::Eth,
		}
	}

	pub fn public_key(&self) -> PublicKey {
		match self {
			Self::Ed25519(k) => PublicKey::Ed25519(k.public_key()),
			Self::Secp256k1(k) => PublicKey::Secp256k1(k.public_key()),
			Self::Eth(k) => PublicKey::Eth(k.public_key()),
		}
	}

	pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignError> {
		match self {
			Self::Ed25519(k) => Ok(k.sign(msg)),
			Self::Secp256k1(k) => k.sign(msg),
			Self::Eth(k) => k.sign(msg),
		}
	}
}

impl Debug for PrivateKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PrivateKey")
			.field("public_key", &self.public_key())
			.finish_non_exhaustive()
	}
}

/// An opaque key identifier, as exchanged between peers. It holds a
/// multicodec-tagged public key.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct KeyId {
	pub public_key: Vec<u8>,
}

impl KeyId {
	pub fn from_public_key(key: &PublicKey) -> Self {
		Self {
			public_key: encode_tagged(key.algo(), &key.to_raw()),
		}
	}

	pub fn public_key(&self) -> Result<PublicKey, TaggedKeyError> {
		decode_tagged(&self.public_key)
	}
}

#[cfg(all(test, feature = "random"))]
mod test {
	use super::*;

	#[test]
	fn test_sign_verify_all_algos() {
		for algo in KeyAlgo::ALL {
			let privk = PrivateKey::generate(algo);
			let pubk = privk.public_key();
			assert_eq!(pubk.algo(), algo);
			assert_eq!(pubk.to_raw().len(), algo.pub_key_len());

			let msg = b"i am a walrus";
			let sig = privk.sign(msg).expect("signing failed");
			assert_eq!(Ok(true), pubk.verify(msg, &sig), "{algo}");
			assert_eq!(Ok(false), pubk.verify(b"tamper", &sig), "{algo}");
		}
	}

	#[test]
	fn test_raw_round_trip() {
		for algo in KeyAlgo::ALL {
			let pubk = PrivateKey::generate(algo).public_key();
			let parsed = PublicKey::try_from_raw(algo, &pubk.to_raw())
				.expect("failed to parse raw key");
			assert_eq!(parsed, pubk);
		}
	}

	#[test]
	fn test_secret_round_trip() {
		for algo in KeyAlgo::ALL {
			let privk = PrivateKey::generate(algo);
			let imported =
				PrivateKey::try_from_secret_bytes(algo, &privk.to_secret_bytes())
					.expect("failed to import secret");
			assert_eq!(imported.public_key(), privk.public_key());
		}
	}

	#[test]
	fn test_malformed_signature() {
		for algo in KeyAlgo::ALL {
			let pubk = PrivateKey::generate(algo).public_key();
			assert_eq!(
				Err(SignatureError::Malformed(algo)),
				pubk.verify(b"msg", &[1, 2, 3])
			);
		}
	}

	#[test]
	fn test_key_id() {
		let pubk = PrivateKey::generate(KeyAlgo::Ed25519).public_key();
		let id = KeyId::from_public_key(&pubk);
		assert_eq!(&id.public_key[..2], &[0xed, 0x01]);
		assert_eq!(id.public_key().expect("valid id"), pubk);

		let garbage = KeyId {
			public_key: b"not-a-valid-key".to_vec(),
		};
		assert!(garbage.public_key().is_err());
	}

	#[test]
	fn test_debug_hides_secret() {
		let privk = PrivateKey::generate(KeyAlgo::Secp256k1);
		let secret_hex = hex::encode(privk.to_secret_bytes());
		let debug = format!("{privk:?}");
		assert!(!debug.contains(&secret_hex));
	}
}
