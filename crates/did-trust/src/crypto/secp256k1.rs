//! secp256k1 keys, signing ECDSA over the SHA-256 digest of the message.
//! Signatures are DER encoded.

use k256::ecdsa::{
	signature::{Signer as _, Verifier as _},
	Signature, SigningKey, VerifyingKey,
};

use super::{KeyBytesError, SignError, SignatureError};
use crate::key_algos::{KeyAlgo, Secp256k1, StaticKeyAlgo as _};

pub(crate) const SECRET_LEN: usize = 32;
const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PubKey(VerifyingKey);

impl PubKey {
	/// Accepts a SEC1 encoded point, compressed (`02`/`03`) or uncompressed
	/// (`04`). Other SEC1 forms are rejected.
	pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, KeyBytesError> {
		decode_point(KeyAlgo::Secp256k1, bytes).map(Self)
	}

	/// SEC1 compressed encoding of the key.
	pub fn to_bytes(&self) -> Vec<u8> {
		encode_point(&self.0)
	}

	pub fn into_inner(self) -> VerifyingKey {
		self.0
	}

	pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<bool, SignatureError> {
		let sig = decode_der(KeyAlgo::Secp256k1, sig)?;
		Ok(self.0.verify(msg, &sig).is_ok())
	}
}

impl From<VerifyingKey> for PubKey {
	fn from(value: VerifyingKey) -> Self {
		Self(value)
	}
}

/// A secp256k1 signing key.
#[derive(Clone)]
pub struct PrivKey(SigningKey);

impl PrivKey {
	#[cfg(feature = "random")]
	pub fn random(rng: &mut impl rand_core::CryptoRngCore) -> Self {
		Self(SigningKey::random(rng))
	}

	pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, KeyBytesError> {
		decode_secret(KeyAlgo::Secp256k1, bytes).map(Self)
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		self.0.to_bytes().to_vec()
	}

	pub fn public_key(&self) -> PubKey {
		PubKey(*self.0.verifying_key())
	}

	pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignError> {
		let sig: Signature = self.0.try_sign(msg)?;
		Ok(sig.to_der().as_bytes().to_vec())
	}
}

// ---- shared with the eth flavor ----

pub(crate) fn decode_point(
	algo: KeyAlgo,
	bytes: &[u8],
) -> Result<VerifyingKey, KeyBytesError> {
	if bytes.len() < Secp256k1::PUB_KEY_LEN {
		return Err(KeyBytesError::WrongLength {
			algo,
			expected: Secp256k1::PUB_KEY_LEN,
			got: bytes.len(),
		});
	}
	let well_formed = match bytes[0] {
		0x02 | 0x03 => bytes.len() == Secp256k1::PUB_KEY_LEN,
		0x04 => bytes.len() == UNCOMPRESSED_LEN,
		_ => false,
	};
	if !well_formed {
		return Err(KeyBytesError::Invalid(algo));
	}
	VerifyingKey::from_sec1_bytes(bytes).map_err(|_| KeyBytesError::NotOnCurve)
}

pub(crate) fn encode_point(key: &VerifyingKey) -> Vec<u8> {
	key.to_encoded_point(true).as_bytes().to_vec()
}

pub(crate) fn decode_secret(
	algo: KeyAlgo,
	bytes: &[u8],
) -> Result<SigningKey, KeyBytesError> {
	if bytes.len() != SECRET_LEN {
		return Err(KeyBytesError::WrongLength {
			algo,
			expected: SECRET_LEN,
			got: bytes.len(),
		});
	}
	SigningKey::from_slice(bytes).map_err(|_| KeyBytesError::Invalid(algo))
}

/// Parses a DER signature, normalizing it to low-S so that signers which don't
/// normalize are still accepted.
pub(crate) fn decode_der(
	algo: KeyAlgo,
	sig: &[u8],
) -> Result<Signature, SignatureError> {
	let sig = Signature::from_der(sig).map_err(|_| SignatureError::Malformed(algo))?;
	Ok(sig.normalize_s().unwrap_or(sig))
}

#[cfg(test)]
mod test {
	use super::*;
	use hex_literal::hex;

	// The generator point, compressed and uncompressed.
	const G_COMPRESSED: [u8; 33] =
		hex!("0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");
	const G_UNCOMPRESSED: [u8; 65] = hex!(
		"0479BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798"
		"483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8"
	);

	#[test]
	fn test_accepts_both_sec1_forms() {
		let a = PubKey::try_from_bytes(&G_COMPRESSED).expect("compressed");
		let b = PubKey::try_from_bytes(&G_UNCOMPRESSED).expect("uncompressed");
		assert_eq!(a, b);
		assert_eq!(a.to_bytes(), G_COMPRESSED);
	}

	#[test]
	fn test_secret_one_is_generator() {
		let mut one = [0u8; SECRET_LEN];
		one[SECRET_LEN - 1] = 1;
		let privk = PrivKey::try_from_bytes(&one).expect("valid scalar");
		assert_eq!(privk.public_key().to_bytes(), G_COMPRESSED);
		assert!(PrivKey::try_from_bytes(&[0u8; SECRET_LEN]).is_err());
	}

	#[test]
	fn test_rejects_bad_points() {
		assert!(matches!(
			PubKey::try_from_bytes(&G_COMPRESSED[..20]),
			Err(KeyBytesError::WrongLength { got: 20, .. })
		));
		let mut compact = G_COMPRESSED;
		compact[0] = 0x05;
		assert_eq!(
			PubKey::try_from_bytes(&compact),
			Err(KeyBytesError::Invalid(KeyAlgo::Secp256k1))
		);
		let mut trailing = G_COMPRESSED.to_vec();
		trailing.push(0);
		assert_eq!(
			PubKey::try_from_bytes(&trailing),
			Err(KeyBytesError::Invalid(KeyAlgo::Secp256k1))
		);
		// x coordinate with no point on the curve
		let mut off_curve = G_COMPRESSED;
		off_curve[1..].fill(0);
		off_curve[32] = 0x05;
		assert_eq!(
			PubKey::try_from_bytes(&off_curve),
			Err(KeyBytesError::NotOnCurve)
		);
	}
}
