use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
	crypto::{KeyId, PublicKey, TypedPublicKey},
	methods::key::{self, ParseKeyUriError, TaggedKeyError},
};

const SCHEME: &str = "did";

/// A decentralized identifier, `did:<method>:<identifier>`.
///
/// The empty DID is valid, and stands for "no identity". Cloning is cheap, and
/// two DIDs are equal exactly when their uris are.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "DidRepr", into = "DidRepr")]
pub struct Did {
	uri: Arc<str>,
}

impl Did {
	/// The empty DID.
	pub fn empty() -> Self {
		Self { uri: Arc::from("") }
	}

	pub fn is_empty(&self) -> bool {
		self.uri.is_empty()
	}

	pub fn as_str(&self) -> &str {
		&self.uri
	}

	/// The method of the DID, or `""` if the uri doesn't have three segments.
	pub fn method(&self) -> &str {
		self.segments().map(|(_, method, _)| method).unwrap_or_default()
	}

	/// The method-specific identifier, or `""` if the uri doesn't have three
	/// segments.
	pub fn identifier(&self) -> &str {
		self.segments().map(|(_, _, id)| id).unwrap_or_default()
	}

	/// The `did:key` of `key`. This is the empty DID if the key can't be
	/// represented as a `did:key`.
	pub fn from_public_key(key: &(impl TypedPublicKey + ?Sized)) -> Self {
		Self::from_uri_unchecked(key::format_key_uri(key))
	}

	pub fn from_key_id(id: &KeyId) -> Result<Self, TaggedKeyError> {
		let pubk = id.public_key()?;
		Ok(Self::from_public_key(&pubk))
	}

	/// Recovers the public key embedded in a `did:key`.
	pub fn public_key(&self) -> Result<PublicKey, PublicKeyFromDidError> {
		if self.method() != key::METHOD {
			return Err(PublicKeyFromDidError::WrongMethod(self.method().to_owned()));
		}
		Ok(key::parse_key_uri(self.as_str())?)
	}

	pub(crate) fn from_uri_unchecked(uri: String) -> Self {
		Self { uri: uri.into() }
	}

	fn segments(&self) -> Option<(&str, &str, &str)> {
		let mut parts = self.uri.split(':');
		match (parts.next(), parts.next(), parts.next(), parts.next()) {
			(Some(scheme), Some(method), Some(id), None) => Some((scheme, method, id)),
			_ => None,
		}
	}
}

impl Default for Did {
	fn default() -> Self {
		Self::empty()
	}
}

impl FromStr for Did {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::try_from(s.to_owned())
	}
}

impl TryFrom<String> for Did {
	type Error = ParseError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		if s.is_empty() {
			return Ok(Self::empty());
		}
		let did = Self::from_uri_unchecked(s);
		let Some((scheme, method, id)) = did.segments() else {
			return Err(ParseError::Malformed(did.as_str().to_owned()));
		};
		if method.is_empty() || id.is_empty() {
			return Err(ParseError::Malformed(did.as_str().to_owned()));
		}
		if scheme != SCHEME {
			return Err(ParseError::InvalidScheme(did.as_str().to_owned()));
		}

		Ok(did)
	}
}

impl fmt::Display for Did {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.as_str().fmt(f)
	}
}

impl fmt::Debug for Did {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Did").field(&self.as_str()).finish()
	}
}

impl AsRef<str> for Did {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum ParseError {
	#[error("invalid DID {0:?}: expected the did: scheme")]
	InvalidScheme(String),
	#[error("invalid DID {0:?}: expected did:<method>:<identifier>")]
	Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PublicKeyFromDidError {
	#[error("invalid DID: expected \"key\" method but got {0:?}")]
	WrongMethod(String),
	#[error("parsing did key identifier")]
	ParseKeyUri(#[from] ParseKeyUriError),
}

/// Wire format, `{"uri": "did:..."}`, with the uri omitted for the empty DID.
#[derive(Serialize, Deserialize)]
struct DidRepr {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	uri: String,
}

impl From<Did> for DidRepr {
	fn from(value: Did) -> Self {
		Self {
			uri: value.as_str().to_owned(),
		}
	}
}

impl TryFrom<DidRepr> for Did {
	type Error = ParseError;

	fn try_from(value: DidRepr) -> Result<Self, Self::Error> {
		Self::try_from(value.uri)
	}
}
