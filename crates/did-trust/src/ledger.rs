//! A [`Provider`] backed by a Ledger hardware wallet.
//!
//! We don't talk to the device ourselves. Instead we shell out to a
//! `ledger-cli` helper, which writes its result as JSON into the file given
//! with `-o`:
//!
//! - `ledger-cli key -o <out> -a <account>` writes `{"key": <hex>, "address": <hex>}`,
//!   where `key` is the compressed secp256k1 public key.
//! - `ledger-cli sign -o <out> -a <account> <hex data>` writes
//!   `{"ecdsa": {"v": .., "r": <hex>, "s": <hex>}}`, an ethereum `personal_sign`
//!   signature of the data.

use std::{
	io,
	path::{Path, PathBuf},
	process::{Command, ExitStatus},
};

use k256::ecdsa::Signature;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, instrument};

use crate::{
	anchor::{Anchor, Provider, ProviderError},
	crypto::{eth, KeyBytesError, PrivateKey, PublicKey},
	did::Did,
};

/// The name of the helper binary, looked up in `PATH`.
pub const LEDGER_CLI: &str = "ledger-cli";

const SCALAR_LEN: usize = 32;

/// Where to find the wallet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LedgerConfig {
	/// Path to, or name of, the `ledger-cli` helper.
	pub cli: PathBuf,
	/// The wallet account index.
	pub account: u32,
}

impl Default for LedgerConfig {
	fn default() -> Self {
		Self {
			cli: PathBuf::from(LEDGER_CLI),
			account: 0,
		}
	}
}

impl LedgerConfig {
	/// Fetches the public key of the account, which requires the device to be
	/// connected and unlocked.
	#[instrument(skip_all, fields(cli = %self.cli.display(), account = self.account))]
	pub fn connect(self) -> Result<LedgerProvider, LedgerError> {
		let output: KeyOutput = self.exec("key", &[])?;
		debug!(address = %output.address, "got ledger key");

		let raw = hex::decode(&output.key).map_err(LedgerError::DecodeKey)?;
		let public_key = PublicKey::Eth(eth::PubKey::try_from_bytes(&raw)?);

		Ok(LedgerProvider {
			did: Did::from_public_key(&public_key),
			public_key,
			config: self,
		})
	}

	/// Runs `<cli> <cmd> -o <tmp> -a <account> <extra..>` and parses what it
	/// wrote to `<tmp>`.
	fn exec<T: DeserializeOwned>(
		&self,
		cmd: &str,
		extra: &[&str],
	) -> Result<T, LedgerError> {
		let out = tempfile::Builder::new()
			.prefix("ledger")
			.suffix(".out")
			.tempfile()
			.map_err(LedgerError::TempFile)?;

		let status = Command::new(&self.cli)
			.arg(cmd)
			.arg("-o")
			.arg(out.path())
			.arg("-a")
			.arg(self.account.to_string())
			.args(extra)
			.status()
			.map_err(|err| match err.kind() {
				io::ErrorKind::NotFound => LedgerError::CliNotFound(self.cli.clone()),
				_ => LedgerError::Spawn(err),
			})?;
		if !status.success() {
			return Err(LedgerError::CliFailed(status));
		}

		read_output(out.path())
	}
}

fn read_output<T: DeserializeOwned>(path: &Path) -> Result<T, LedgerError> {
	let bytes = std::fs::read(path).map_err(LedgerError::ReadOutput)?;
	serde_json::from_slice(&bytes).map_err(LedgerError::ParseOutput)
}

#[derive(Debug, Deserialize)]
struct KeyOutput {
	key: String,
	address: String,
}

#[derive(Debug, Deserialize)]
struct SignOutput {
	ecdsa: EcdsaOutput,
}

#[derive(Debug, Deserialize)]
struct EcdsaOutput {
	r: String,
	s: String,
}

impl EcdsaOutput {
	/// Converts to a low-S DER signature.
	fn to_der(&self) -> Result<Vec<u8>, LedgerError> {
		let r = decode_scalar("r", &self.r)?;
		let s = decode_scalar("s", &self.s)?;
		let sig =
			Signature::from_scalars(r, s).map_err(LedgerError::InvalidSignature)?;
		let sig = sig.normalize_s().unwrap_or(sig);
		Ok(sig.to_der().as_bytes().to_vec())
	}
}

/// Decodes a big endian hex scalar, left padding it to 32 bytes.
fn decode_scalar(
	name: &'static str,
	hex_str: &str,
) -> Result<[u8; SCALAR_LEN], LedgerError> {
	let bytes = hex::decode(hex_str)
		.map_err(|source| LedgerError::DecodeSignature { name, source })?;
	if bytes.len() > SCALAR_LEN {
		return Err(LedgerError::ScalarOverflow(name));
	}
	let mut scalar = [0; SCALAR_LEN];
	scalar[SCALAR_LEN - bytes.len()..].copy_from_slice(&bytes);
	Ok(scalar)
}

/// Signs with an Eth-style key held by a Ledger wallet. See [`LedgerConfig`].
#[derive(Debug, Clone)]
pub struct LedgerProvider {
	did: Did,
	public_key: PublicKey,
	config: LedgerConfig,
}

impl LedgerProvider {
	/// Connects to the given account with the default `ledger-cli`.
	pub fn new(account: u32) -> Result<Self, LedgerError> {
		LedgerConfig {
			account,
			..Default::default()
		}
		.connect()
	}

	pub fn config(&self) -> &LedgerConfig {
		&self.config
	}
}

impl Provider for LedgerProvider {
	fn did(&self) -> &Did {
		&self.did
	}

	#[instrument(skip_all, fields(did = %self.did, account = self.config.account))]
	fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, ProviderError> {
		let output: SignOutput = self.config.exec("sign", &[hex::encode(msg).as_str()])?;
		Ok(output.ecdsa.to_der()?)
	}

	fn anchor(&self) -> Anchor {
		Anchor::new(self.did.clone(), self.public_key.clone())
	}

	fn private_key(&self) -> Result<PrivateKey, ProviderError> {
		Err(ProviderError::HardwareKeyUnexportable)
	}
}

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
	#[error("can't find {0:?}, is it in PATH?")]
	CliNotFound(PathBuf),
	#[error("failed to create temporary output file")]
	TempFile(#[source] io::Error),
	#[error("failed to run ledger cli")]
	Spawn(#[source] io::Error),
	#[error("ledger cli exited unsuccessfully: {0}")]
	CliFailed(ExitStatus),
	#[error("failed to read ledger cli output")]
	ReadOutput(#[source] io::Error),
	#[error("failed to parse ledger cli output")]
	ParseOutput(#[source] serde_json::Error),
	#[error("ledger key is not valid hex")]
	DecodeKey(#[source] hex::FromHexError),
	#[error("ledger key is not a valid eth key")]
	InvalidKey(#[from] KeyBytesError),
	#[error("signature {name} is not valid hex")]
	DecodeSignature {
		name: &'static str,
		#[source]
		source: hex::FromHexError,
	},
	#[error("signature {0} overflowed")]
	ScalarOverflow(&'static str),
	#[error("ledger returned an invalid signature")]
	InvalidSignature(#[source] k256::ecdsa::Error),
}
