//! An implementation of the [did:key] method.
//!
//! A `did:key` is `did:key:` followed by the multibase (always base58-btc,
//! so always starting with `z`) encoding of the public key, prefixed with the
//! unsigned varint of the key's multicodec value.
//!
//! [did:key]: https://w3c-ccg.github.io/did-method-key/

use tracing::error;

use crate::{
	crypto::{KeyBytesError, PublicKey, TypedPublicKey},
	key_algos::KeyAlgo,
	varint::{decode_varint, DecodeError},
};

pub const METHOD: &str = "key";
pub const PREFIX: &str = "did:key:";

/// Multibase prefix for base58-btc.
const BASE58_BTC: char = 'z';

/// Multibase prefixes that we recognize, but refuse to decode.
const OTHER_MULTIBASES: &[(char, &str)] = &[
	('\0', "identity"),
	('0', "base2"),
	('7', "base8"),
	('9', "base10"),
	('f', "base16"),
	('F', "base16upper"),
	('v', "base32hex"),
	('V', "base32hexupper"),
	('t', "base32hexpad"),
	('T', "base32hexpadupper"),
	('b', "base32"),
	('B', "base32upper"),
	('c', "base32pad"),
	('C', "base32padupper"),
	('h', "base32z"),
	('k', "base36"),
	('K', "base36upper"),
	('Z', "base58flickr"),
	('m', "base64"),
	('M', "base64pad"),
	('u', "base64url"),
	('U', "base64urlpad"),
	('p', "proquint"),
];

/// Formats `key` as a `did:key` uri.
///
/// Returns an empty string if the key type can't be used with `did:key` or if
/// its raw bytes couldn't be retrieved. Callers must check for that.
pub fn format_key_uri(key: &(impl TypedPublicKey + ?Sized)) -> String {
	let algo = match KeyAlgo::try_from(key.key_type()) {
		Ok(algo) => algo,
		Err(err) => {
			error!("cannot format did:key uri: {err}");
			return String::new();
		}
	};
	let raw = match key.raw() {
		Ok(raw) => raw,
		Err(err) => {
			error!("cannot format did:key uri: {err}");
			return String::new();
		}
	};

	let b58 = bs58::encode(encode_tagged(algo, &raw))
		.with_alphabet(bs58::Alphabet::BITCOIN)
		.into_string();
	format!("{PREFIX}{BASE58_BTC}{b58}")
}

/// Parses a `did:key` uri back into the public key it embeds.
pub fn parse_key_uri(uri: &str) -> Result<PublicKey, ParseKeyUriError> {
	let multibase = uri
		.strip_prefix(PREFIX)
		.ok_or(ParseKeyUriError::InvalidMethod)?;
	let mut decoded = Vec::new();
	decode_multibase(multibase, &mut decoded)?;
	Ok(decode_tagged(&decoded)?)
}

#[derive(thiserror::Error, Debug)]
pub enum ParseKeyUriError {
	#[error("decentralized identifier is not a 'key' type")]
	InvalidMethod,
	#[error("decoding multibase: {0}")]
	Multibase(#[from] MultibaseDecodeError),
	#[error(transparent)]
	Tagged(#[from] TaggedKeyError),
}

/// `varint(multicodec) || raw`
pub(crate) fn encode_tagged(algo: KeyAlgo, raw: &[u8]) -> Vec<u8> {
	let prefix = algo.multicodec_encoded();
	let mut out = Vec::with_capacity(prefix.len() + raw.len());
	out.extend_from_slice(prefix.as_slice());
	out.extend_from_slice(raw);
	out
}

/// Inverse of [`encode_tagged`].
///
/// The body must be exactly the raw key length of the algorithm, so that every
/// key has a single tagged encoding.
pub(crate) fn decode_tagged(bytes: &[u8]) -> Result<PublicKey, TaggedKeyError> {
	let (multicodec, prefix_len) = decode_varint(bytes).map_err(|err| match err {
		DecodeError::MissingBytes => TaggedKeyError::TruncatedTag { got: bytes.len() },
		err => TaggedKeyError::InvalidPrefix(err),
	})?;
	let algo = KeyAlgo::from_multicodec(multicodec)
		.ok_or(TaggedKeyError::UnsupportedKeyType(multicodec))?;
	let body = &bytes[prefix_len..];
	let expected = algo.pub_key_len();
	if body.len() < expected {
		return Err(TaggedKeyError::TruncatedPayload {
			algo,
			expected,
			got: body.len(),
		});
	}
	if body.len() > expected {
		return Err(TaggedKeyError::InvalidKey(KeyBytesError::WrongLength {
			algo,
			expected,
			got: body.len(),
		}));
	}
	Ok(PublicKey::try_from_raw(algo, body)?)
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum TaggedKeyError {
	#[error("invalid multicodec prefix")]
	InvalidPrefix(#[source] DecodeError),
	#[error("truncated payload: multicodec prefix cut short after {got} bytes")]
	TruncatedTag { got: usize },
	#[error("unsupported multicodec key type 0x{0:x}")]
	UnsupportedKeyType(u16),
	#[error("truncated payload: {algo} keys need {expected} bytes but only {got} remain")]
	TruncatedPayload {
		algo: KeyAlgo,
		expected: usize,
		got: usize,
	},
	#[error(transparent)]
	InvalidKey(#[from] KeyBytesError),
}

fn decode_multibase(
	multibase: &str,
	out_buf: &mut Vec<u8>,
) -> Result<(), MultibaseDecodeError> {
	out_buf.clear();
	let mut chars = multibase.chars();
	let base = chars.next().ok_or(MultibaseDecodeError::Empty)?;
	if base != BASE58_BTC {
		return Err(
			match OTHER_MULTIBASES.iter().find(|(code, _)| *code == base) {
				Some((_, name)) => MultibaseDecodeError::UnsupportedEncoding(name),
				None => MultibaseDecodeError::UnknownBase(base),
			},
		);
	}
	bs58::decode(chars.as_str())
		.with_alphabet(bs58::Alphabet::BITCOIN)
		.onto(out_buf)?;
	Ok(())
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum MultibaseDecodeError {
	#[error("multibase string is empty")]
	Empty,
	#[error("{0:?} is not a known multibase prefix")]
	UnknownBase(char),
	#[error("unexpected multibase encoding: {0}")]
	UnsupportedEncoding(&'static str),
	#[error(transparent)]
	Bs58(#[from] bs58::decode::Error),
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::crypto::{KeyType, RawKeyError, SignatureError};

	use eyre::WrapErr;
	use hex_literal::hex;

	// From: https://w3c-ccg.github.io/did-method-key/#example-5
	fn ed25519_examples() -> &'static [&'static str] {
		&[
			"did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp",
			"did:key:z6MkjchhfUsD6mmvni8mCdXHw216Xrm9bQe2mBH1P5RDjVJG",
			"did:key:z6MknGc3ocHs3zdPiJbnaaqDi58NGb4pk1Sp9WxWufuXSdxf",
		]
	}

	// From: https://w3c-ccg.github.io/did-method-key/#secp256k1
	fn secp256k1_examples() -> &'static [&'static str] {
		&[
			"did:key:zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme",
		]
	}

	/// A key of a type that did:key can't represent.
	struct BogusKey;

	impl TypedPublicKey for BogusKey {
		fn key_type(&self) -> KeyType {
			KeyType::Rsa
		}

		fn raw(&self) -> Result<Vec<u8>, RawKeyError> {
			Ok(vec![1, 2, 3])
		}

		fn verify(&self, _msg: &[u8], _sig: &[u8]) -> Result<bool, SignatureError> {
			Ok(false)
		}
	}

	/// A key whose raw bytes can't be retrieved.
	struct BadRawKey;

	impl TypedPublicKey for BadRawKey {
		fn key_type(&self) -> KeyType {
			KeyType::Ed25519
		}

		fn raw(&self) -> Result<Vec<u8>, RawKeyError> {
			Err(RawKeyError("raw failure".into()))
		}

		fn verify(&self, _msg: &[u8], _sig: &[u8]) -> Result<bool, SignatureError> {
			Ok(false)
		}
	}

	fn base58_uri(payload: &[u8]) -> String {
		format!("{PREFIX}z{}", bs58::encode(payload).into_string())
	}

	#[test]
	fn test_did_key_examples_round_trip() -> eyre::Result<()> {
		for (&example, algo) in ed25519_examples()
			.iter()
			.map(|e| (e, KeyAlgo::Ed25519))
			.chain(secp256k1_examples().iter().map(|e| (e, KeyAlgo::Secp256k1)))
		{
			let key = parse_key_uri(example)
				.wrap_err_with(|| format!("failed to parse {example}"))?;
			assert_eq!(key.algo(), algo);
			assert_eq!(format_key_uri(&key), example);
		}
		Ok(())
	}

	#[test]
	fn test_eth_prefix() -> eyre::Result<()> {
		// Generator point, as an eth key.
		let raw =
			hex!("0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");
		let key = PublicKey::try_from_raw(KeyAlgo::Eth, &raw)?;
		let uri = format_key_uri(&key);
		let decoded = bs58::decode(&uri[PREFIX.len() + 1..]).into_vec()?;
		assert_eq!(&decoded[..3], &[0x81, 0xde, 0x03]);
		assert_eq!(&decoded[3..], raw);
		assert_eq!(parse_key_uri(&uri)?, key);
		Ok(())
	}

	#[test]
	fn test_unsupported_type_is_empty() {
		assert_eq!(format_key_uri(&BogusKey), "");
	}

	#[test]
	fn test_raw_failure_is_empty() {
		assert_eq!(format_key_uri(&BadRawKey), "");
	}

	#[test]
	fn test_wrong_method() {
		assert!(matches!(
			parse_key_uri("did:web:xyz"),
			Err(ParseKeyUriError::InvalidMethod)
		));
	}

	#[test]
	fn test_unexpected_multibase() {
		// 'u' is base64url
		assert!(matches!(
			parse_key_uri("did:key:uSGVsbG8"),
			Err(ParseKeyUriError::Multibase(
				MultibaseDecodeError::UnsupportedEncoding("base64url")
			))
		));
		let err = parse_key_uri("did:key:uSGVsbG8").unwrap_err();
		assert!(err.to_string().contains("unexpected multibase"), "{err}");
	}

	#[test]
	fn test_invalid_base58() {
		for uri in ["did:key:z!@#$", "did:key:z!!invalid", "did:key:z0OIl"] {
			assert!(
				matches!(
					parse_key_uri(uri),
					Err(ParseKeyUriError::Multibase(MultibaseDecodeError::Bs58(_)))
				),
				"{uri}"
			);
		}
		assert!(matches!(
			parse_key_uri("did:key:notBase58"),
			Err(ParseKeyUriError::Multibase(MultibaseDecodeError::UnknownBase(
				'n'
			)))
		));
		assert!(matches!(
			parse_key_uri("did:key:"),
			Err(ParseKeyUriError::Multibase(MultibaseDecodeError::Empty))
		));
	}

	#[test]
	fn test_truncated_payload() {
		// Only the ed25519 multicodec, no key bytes.
		assert!(matches!(
			parse_key_uri(&base58_uri(&[0xed, 0x01])),
			Err(ParseKeyUriError::Tagged(TaggedKeyError::TruncatedPayload {
				algo: KeyAlgo::Ed25519,
				expected: 32,
				got: 0,
			}))
		));
		// The varint itself is cut short.
		assert!(matches!(
			parse_key_uri(&base58_uri(&[0xed])),
			Err(ParseKeyUriError::Tagged(TaggedKeyError::TruncatedTag { got: 1 }))
		));
		let err = parse_key_uri(&base58_uri(&[0x81, 0xde])).unwrap_err();
		assert!(err.to_string().contains("truncated payload"), "{err}");
	}

	#[test]
	fn test_non_minimal_prefix_rejected() -> eyre::Result<()> {
		let key = parse_key_uri(ed25519_examples()[0])?;
		let mut payload = vec![0xed, 0x81, 0x00];
		payload.extend_from_slice(&key.to_raw());
		assert!(matches!(
			parse_key_uri(&base58_uri(&payload)),
			Err(ParseKeyUriError::Tagged(TaggedKeyError::InvalidPrefix(
				DecodeError::NotMinimal
			)))
		));
		Ok(())
	}

	#[test]
	fn test_only_canonical_secp256k1_bodies() -> eyre::Result<()> {
		let compressed =
			hex!("0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");
		let uncompressed = hex!(
			"0479BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798"
			"483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8"
		);
		let tagged = |raw: &[u8]| encode_tagged(KeyAlgo::Secp256k1, raw);

		let uri = base58_uri(&tagged(&compressed));
		let key = parse_key_uri(&uri)?;
		assert_eq!(format_key_uri(&key), uri);

		assert!(matches!(
			parse_key_uri(&base58_uri(&tagged(&uncompressed))),
			Err(ParseKeyUriError::Tagged(TaggedKeyError::InvalidKey(
				KeyBytesError::WrongLength {
					expected: 33,
					got: 65,
					..
				}
			)))
		));

		let mut compact = compressed;
		compact[0] = 0x05;
		assert!(matches!(
			parse_key_uri(&base58_uri(&tagged(&compact))),
			Err(ParseKeyUriError::Tagged(TaggedKeyError::InvalidKey(
				KeyBytesError::Invalid(KeyAlgo::Secp256k1)
			)))
		));
		Ok(())
	}

	#[test]
	fn test_unsupported_codec() {
		let mut payload = vec![0x99, 0x01];
		payload.extend_from_slice(&[0xff; 32]);
		assert!(matches!(
			parse_key_uri(&base58_uri(&payload)),
			Err(ParseKeyUriError::Tagged(TaggedKeyError::UnsupportedKeyType(
				0x99
			)))
		));
	}

	#[test]
	fn test_decode_multibase() -> eyre::Result<()> {
		#[derive(Debug)]
		struct Example {
			decoded: &'static [u8],
			encoded: &'static str,
		}
		// from: https://datatracker.ietf.org/doc/html/draft-msporny-base58-03#section-5
		let examples = [
			Example {
				decoded: b"Hello World!",
				encoded: "2NEpo7TZRRrLZSi2U",
			},
			Example {
				decoded: b"The quick brown fox jumps over the lazy dog.",
				encoded: "USm3fpXnKG5EUBx2ndxBDMPVciP5hGey2Jh4NDv6gmeo1LkMeiKrLJUUBk6Z",
			},
			Example {
				decoded: &hex!("0000287fb4cd"),
				encoded: "11233QC4",
			},
		];

		let mut buf = Vec::new();
		for e @ Example { decoded, encoded } in examples {
			decode_multibase(&format!("z{encoded}"), &mut buf)
				.wrap_err_with(|| format!("Failed to decode example {e:?}"))?;
			assert_eq!(buf, decoded, "failed comparison in example {e:?}");
		}

		Ok(())
	}
}
