use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};

use super::{KeyBytesError, SignatureError};
use crate::key_algos::{KeyAlgo, StaticKeyAlgo as _};

/// An ed25519 public key.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PubKey(VerifyingKey);

impl PubKey {
	pub const LEN: usize = Self::key_len();

	/// Instantiates `PubKey` from some bytes. Performs all necessary validation
	/// that the key is valid and of sufficient strength.
	///
	/// Note that we will reject any keys that are too weak (aka low order).
	pub fn try_from_bytes(bytes: &[u8; Self::LEN]) -> Result<Self, KeyBytesError> {
		let compressed_edwards = CompressedEdwardsY(bytes.to_owned());
		let Some(edwards) = compressed_edwards.decompress() else {
			return Err(KeyBytesError::NotOnCurve);
		};
		let key = VerifyingKey::from(edwards);
		if key.is_weak() {
			return Err(KeyBytesError::WeakKey);
		}
		Ok(Self(key))
	}

	pub fn try_from_slice(bytes: &[u8]) -> Result<Self, KeyBytesError> {
		let bytes: &[u8; Self::LEN] =
			bytes.try_into().map_err(|_| KeyBytesError::WrongLength {
				algo: KeyAlgo::Ed25519,
				expected: Self::LEN,
				got: bytes.len(),
			})?;
		Self::try_from_bytes(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; Self::LEN] {
		self.0.as_bytes()
	}

	pub fn into_inner(self) -> VerifyingKey {
		self.0
	}

	pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<bool, SignatureError> {
		let sig = Signature::from_slice(sig)
			.map_err(|_| SignatureError::Malformed(KeyAlgo::Ed25519))?;
		Ok(self.0.verify(msg, &sig).is_ok())
	}

	// TODO: Turn this into inline const when that feature stabilizes
	const fn key_len() -> usize {
		let len = crate::key_algos::Ed25519::PUB_KEY_LEN;
		assert!(len == ed25519_dalek::PUBLIC_KEY_LENGTH);
		len
	}
}

/// An ed25519 signing key.
#[derive(Clone)]
pub struct PrivKey(SigningKey);

impl PrivKey {
	pub const LEN: usize = ed25519_dalek::SECRET_KEY_LENGTH;

	#[cfg(feature = "random")]
	pub fn random(rng: &mut impl rand_core::CryptoRngCore) -> Self {
		Self(SigningKey::generate(rng))
	}

	pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
		Self(SigningKey::from_bytes(bytes))
	}

	pub fn try_from_slice(bytes: &[u8]) -> Result<Self, KeyBytesError> {
		let bytes: &[u8; Self::LEN] =
			bytes.try_into().map_err(|_| KeyBytesError::WrongLength {
				algo: KeyAlgo::Ed25519,
				expected: Self::LEN,
				got: bytes.len(),
			})?;
		Ok(Self::from_bytes(bytes))
	}

	pub fn to_bytes(&self) -> [u8; Self::LEN] {
		self.0.to_bytes()
	}

	pub fn public_key(&self) -> PubKey {
		PubKey(self.0.verifying_key())
	}

	pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
		self.0.sign(msg).to_bytes().to_vec()
	}
}
