//! Unsigned varints, as used by [multicodec] prefixes.
//!
//! Only `u16` values are supported, which covers every multicodec used by
//! `did:key` that we care about. A `u16` takes at most three bytes.
//!
//! [multicodec]: https://github.com/multiformats/unsigned-varint

/// bitmask for 7 least significant bits
const LSB_7: u8 = u8::MAX / 2;
/// bitmask for most significant bit
const MSB: u8 = !LSB_7;
/// Max number of bytes a `u16` can occupy.
pub(crate) const MAX_LEN: usize = 3;

#[inline]
const fn msb_is_1(val: u8) -> bool {
	val & MSB == MSB
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub(crate) struct VarintEncoding {
	buf: [u8; MAX_LEN],
	len: u8,
}

impl VarintEncoding {
	pub const fn as_slice(&self) -> &[u8] {
		self.buf.split_at(self.len as usize).0
	}

	pub const fn len(&self) -> usize {
		self.len as usize
	}
}

/// Encodes a value as a varint.
pub(crate) const fn encode_varint(value: u16) -> VarintEncoding {
	let mut buf = [0; MAX_LEN];
	let mut remaining = value;
	let mut len = 0;
	// No for loops in const fn :(
	loop {
		let chunk = (remaining as u8) & LSB_7;
		remaining >>= 7;
		if remaining == 0 {
			buf[len] = chunk;
			len += 1;
			break;
		}
		buf[len] = chunk | MSB;
		len += 1;
	}

	VarintEncoding {
		buf,
		len: len as u8,
	}
}

/// Decodes a varint from the front of `encoded`.
///
/// Returns the value along with the number of bytes it occupied. Any bytes
/// after the varint are ignored.
pub(crate) const fn decode_varint(encoded: &[u8]) -> Result<(u16, usize), DecodeError> {
	let mut result: u32 = 0;
	let mut idx = 0;
	loop {
		if idx == MAX_LEN {
			return Err(DecodeError::WouldOverflow);
		}
		if idx >= encoded.len() {
			return Err(DecodeError::MissingBytes);
		}
		let b = encoded[idx];
		result |= ((b & LSB_7) as u32) << (7 * idx);
		idx += 1;
		if !msb_is_1(b) {
			break;
		}
	}
	// a trailing zero group means a shorter encoding exists
	if idx > 1 && encoded[idx - 1] == 0 {
		return Err(DecodeError::NotMinimal);
	}
	if result > u16::MAX as u32 {
		return Err(DecodeError::WouldOverflow);
	}
	Ok((result as u16, idx))
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum DecodeError {
	#[error("expected more bytes than what were provided")]
	MissingBytes,
	#[error(
		"the decoded number is too large to fit into the type without overflowing"
	)]
	WouldOverflow,
	#[error("varint is not minimally encoded")]
	NotMinimal,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_known_examples() {
		// See https://github.com/multiformats/unsigned-varint/blob/16bf9f7d3ff78c10c1ab26d397c03c91205cd4ee/README.md
		let examples1 = [
			(0x01, [0x01].as_slice()),
			(0x7f, &[0x7f]),         // 127
			(0x80, &[0x80, 0x01]),   // 128
			(0xff, &[0xff, 0x01]),   // 255
			(0x012c, &[0xac, 0x02]), // 300
			(0x4000, &[0x80, 0x80, 0x01]),
			(u16::MAX, &[0xff, 0xff, 0x03]),
		];
		let examples2 = [
			(0xed, [0xed, 0x01].as_slice()), // ed25519
			(0xe7, &[0xe7, 0x01]),           // secp256k1
			(0xef01, &[0x81, 0xde, 0x03]),   // eth-style secp256k1
		];

		for (decoded, encoded) in examples1.into_iter().chain(examples2) {
			assert_eq!(Ok((decoded, encoded.len())), decode_varint(encoded));
			assert_eq!(encoded, encode_varint(decoded).as_slice());
		}
	}

	#[test]
	fn test_decode_ignores_trailing_bytes() {
		assert_eq!(Ok((0xed, 2)), decode_varint(&[0xed, 0x01, 0xaa, 0xbb]));
		assert_eq!(Ok((0x05, 1)), decode_varint(&[0x05, 0xff]));
	}

	#[test]
	fn test_decode_errors() {
		assert_eq!(Err(DecodeError::MissingBytes), decode_varint(&[]));
		assert_eq!(Err(DecodeError::MissingBytes), decode_varint(&[0xed]));
		assert_eq!(Err(DecodeError::MissingBytes), decode_varint(&[0x81, 0xde]));
		assert_eq!(
			Err(DecodeError::WouldOverflow),
			decode_varint(&[0xff, 0xff, 0x04])
		);
		assert_eq!(
			Err(DecodeError::WouldOverflow),
			decode_varint(&[0x80, 0x80, 0x80, 0x01])
		);
	}

	#[test]
	fn test_decode_rejects_non_minimal() {
		assert_eq!(Err(DecodeError::NotMinimal), decode_varint(&[0x81, 0x00]));
		assert_eq!(Err(DecodeError::NotMinimal), decode_varint(&[0xed, 0x81, 0x00]));
		assert_eq!(Err(DecodeError::NotMinimal), decode_varint(&[0x80, 0x80, 0x00]));
		// a lone zero is the minimal encoding of 0
		assert_eq!(Ok((0, 1)), decode_varint(&[0x00]));
	}
}
