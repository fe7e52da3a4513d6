//! Ethereum flavored secp256k1 keys.
//!
//! The key material is identical to [`super::secp256k1`], but messages are
//! signed the way ethereum wallets do for `personal_sign`: ECDSA over the
//! Keccak-256 digest of `"\x19Ethereum Signed Message:\n" || len(msg) || msg`.
//! Signatures are DER encoded. This is what hardware wallets produce.

use k256::ecdsa::{
	signature::hazmat::{PrehashSigner as _, PrehashVerifier as _},
	Signature, SigningKey, VerifyingKey,
};
use sha3::{Digest as _, Keccak256};

use super::{
	secp256k1::{decode_der, decode_point, decode_secret, encode_point},
	KeyBytesError, SignError, SignatureError,
};
use crate::key_algos::KeyAlgo;

const MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// The digest that actually gets signed for `msg`.
pub fn message_digest(msg: &[u8]) -> [u8; 32] {
	let mut hasher = Keccak256::new();
	hasher.update(MESSAGE_PREFIX);
	hasher.update(msg.len().to_string().as_bytes());
	hasher.update(msg);
	hasher.finalize().into()
}

/// An ethereum style secp256k1 public key.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PubKey(VerifyingKey);

impl PubKey {
	/// Accepts a SEC1 encoded point, compressed or not.
	pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, KeyBytesError> {
		decode_point(KeyAlgo::Eth, bytes).map(Self)
	}

	/// SEC1 compressed encoding of the key.
	pub fn to_bytes(&self) -> Vec<u8> {
		encode_point(&self.0)
	}

	pub fn into_inner(self) -> VerifyingKey {
		self.0
	}

	pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<bool, SignatureError> {
		let sig = decode_der(KeyAlgo::Eth, sig)?;
		Ok(self
			.0
			.verify_prehash(&message_digest(msg), &sig)
			.is_ok())
	}
}

impl From<VerifyingKey> for PubKey {
	fn from(value: VerifyingKey) -> Self {
		Self(value)
	}
}

/// An ethereum style secp256k1 signing key.
#[derive(Clone)]
pub struct PrivKey(SigningKey);

impl PrivKey {
	#[cfg(feature = "random")]
	pub fn random(rng: &mut impl rand_core::CryptoRngCore) -> Self {
		Self(SigningKey::random(rng))
	}

	pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, KeyBytesError> {
		decode_secret(KeyAlgo::Eth, bytes).map(Self)
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		self.0.to_bytes().to_vec()
	}

	pub fn public_key(&self) -> PubKey {
		PubKey(*self.0.verifying_key())
	}

	pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignError> {
		let sig: Signature = self.0.sign_prehash(&message_digest(msg))?;
		Ok(sig.to_der().as_bytes().to_vec())
	}
}
