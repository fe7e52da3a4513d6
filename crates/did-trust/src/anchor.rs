//! Anchors verify signatures for a DID, providers produce them.

use std::fmt::Debug;

use crate::{
	crypto::{PrivateKey, PublicKey, SignError, SignatureError},
	did::Did,
	ledger::LedgerError,
};

/// A DID together with the public key that verifies its signatures.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Anchor {
	did: Did,
	public_key: PublicKey,
}

impl Anchor {
	/// Pairs `did` with `public_key` verbatim. Used by resolvers of methods other
	/// than `did:key`, where the DID isn't derived from the key.
	pub fn new(did: Did, public_key: PublicKey) -> Self {
		Self { did, public_key }
	}

	/// The anchor of the `did:key` for `public_key`.
	pub fn from_public_key(public_key: PublicKey) -> Self {
		Self {
			did: Did::from_public_key(&public_key),
			public_key,
		}
	}

	pub fn did(&self) -> &Did {
		&self.did
	}

	pub fn public_key(&self) -> &PublicKey {
		&self.public_key
	}

	/// Checks that `sig` is a signature of `msg` by this anchor.
	pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), VerifyError> {
		if self.public_key.verify(msg, sig)? {
			Ok(())
		} else {
			Err(VerifyError::InvalidSignature)
		}
	}
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum VerifyError {
	#[error("invalid signature")]
	InvalidSignature,
	#[error(transparent)]
	Signature(#[from] SignatureError),
}

/// Something that can sign on behalf of a DID.
pub trait Provider: Debug + Send + Sync {
	fn did(&self) -> &Did;

	fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, ProviderError>;

	/// The anchor that verifies signatures from [`Self::sign`].
	fn anchor(&self) -> Anchor;

	/// Exports the private key. Fails for keys that live in hardware.
	fn private_key(&self) -> Result<PrivateKey, ProviderError>;
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
	#[error(transparent)]
	Sign(#[from] SignError),
	#[error("private key cannot be exported from a hardware wallet")]
	HardwareKeyUnexportable,
	#[error("hardware wallet failed")]
	Ledger(#[from] LedgerError),
}

/// A [`Provider`] backed by an in-process private key.
#[derive(Debug, Clone)]
pub struct KeyProvider {
	did: Did,
	private_key: PrivateKey,
}

impl KeyProvider {
	pub fn new(private_key: PrivateKey) -> Self {
		Self {
			did: Did::from_public_key(&private_key.public_key()),
			private_key,
		}
	}

	/// Generates a fresh key of the given algorithm.
	#[cfg(feature = "random")]
	pub fn generate(algo: crate::key_algos::KeyAlgo) -> Self {
		Self::new(PrivateKey::generate(algo))
	}
}

impl From<PrivateKey> for KeyProvider {
	fn from(value: PrivateKey) -> Self {
		Self::new(value)
	}
}

impl Provider for KeyProvider {
	fn did(&self) -> &Did {
		&self.did
	}

	fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, ProviderError> {
		Ok(self.private_key.sign(msg)?)
	}

	fn anchor(&self) -> Anchor {
		Anchor {
			did: self.did.clone(),
			public_key: self.private_key.public_key(),
		}
	}

	fn private_key(&self) -> Result<PrivateKey, ProviderError> {
		Ok(self.private_key.clone())
	}
}

#[cfg(all(test, feature = "random"))]
mod test {
	use super::*;
	use crate::key_algos::KeyAlgo;
	use eyre::Result;

	#[test]
	fn test_sign_and_verify_all_algos() -> Result<()> {
		for algo in KeyAlgo::ALL {
			let provider = KeyProvider::generate(algo);
			let anchor = provider.anchor();
			assert_eq!(anchor.did(), provider.did());
			assert_eq!(anchor, Anchor::from_public_key(anchor.public_key().clone()));

			let msg = b"some payload";
			let sig = provider.sign(msg)?;
			anchor.verify(msg, &sig)?;
			assert_eq!(
				anchor.verify(b"some other payload", &sig),
				Err(VerifyError::InvalidSignature),
				"{algo}"
			);
		}
		Ok(())
	}

	#[test]
	fn test_did_matches_private_key() -> Result<()> {
		let privk = PrivateKey::generate(KeyAlgo::Ed25519);
		let provider = KeyProvider::new(privk.clone());
		assert_eq!(provider.did(), &Did::from_public_key(&privk.public_key()));
		assert!(provider.did().as_str().starts_with("did:key:z6Mk"));
		assert_eq!(provider.private_key()?.public_key(), privk.public_key());
		assert_eq!(provider.did().public_key()?, privk.public_key());
		Ok(())
	}

	#[test]
	fn test_malformed_signature() {
		let anchor = KeyProvider::generate(KeyAlgo::Secp256k1).anchor();
		assert_eq!(
			anchor.verify(b"msg", b"definitely not DER"),
			Err(VerifyError::Signature(SignatureError::Malformed(
				KeyAlgo::Secp256k1
			)))
		);
	}
}
