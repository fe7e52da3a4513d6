use std::{path::PathBuf, sync::Arc};

use clap::{Parser as _, Subcommand};
use color_eyre::eyre::{bail, Context as _};
use did_trust::{
	ledger::{LedgerConfig, LEDGER_CLI},
	Did, KeyAlgo, KeyProvider, PrivateKey, Provider, TrustContext,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Generates a new key, printing its DID and hex encoded secret.
	Generate {
		#[clap(long, short, default_value_t = KeyAlgo::Ed25519)]
		algo: KeyAlgo,
	},
	/// Prints the public key embedded in a DID.
	Resolve { did: Did },
	/// Signs a message with a hex encoded secret.
	Sign {
		#[clap(long, short, default_value_t = KeyAlgo::Ed25519)]
		algo: KeyAlgo,
		#[clap(long, env = "DID_SECRET")]
		secret: String,
		message: String,
	},
	/// Checks a hex encoded signature of a message against a DID.
	Verify {
		did: Did,
		message: String,
		signature: String,
	},
	/// Prints the DID of a Ledger hardware wallet account.
	Ledger {
		#[clap(long, short, default_value = "0")]
		account: u32,
		#[clap(long, env = "LEDGER_CLI", default_value = LEDGER_CLI)]
		cli: PathBuf,
		/// Also sign this message with the wallet.
		#[clap(long)]
		sign: Option<String>,
	},
}

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or("info".into()))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let cli = Cli::parse();
	debug!(?cli, "parsed arguments");

	match cli.command {
		Commands::Generate { algo } => {
			let privk = PrivateKey::generate(algo);
			let did = Did::from_public_key(&privk.public_key());
			println!("{did}");
			println!("{}", hex::encode(privk.to_secret_bytes()));
		}
		Commands::Resolve { did } => {
			let ctx = TrustContext::new();
			let anchor = ctx
				.get_anchor(&did)
				.wrap_err_with(|| format!("failed to resolve {did}"))?;
			let pubk = anchor.public_key();
			println!("method: {}", did.method());
			println!("algo: {}", pubk.algo());
			println!("key: {}", hex::encode(pubk.to_raw()));
		}
		Commands::Sign {
			algo,
			secret,
			message,
		} => {
			let secret = hex::decode(secret.trim()).wrap_err("secret is not hex")?;
			let privk = PrivateKey::try_from_secret_bytes(algo, &secret)
				.wrap_err("invalid secret")?;
			let provider = KeyProvider::new(privk);
			let sig = provider
				.sign(message.as_bytes())
				.wrap_err("failed to sign")?;
			println!("{}", provider.did());
			println!("{}", hex::encode(sig));
		}
		Commands::Verify {
			did,
			message,
			signature,
		} => {
			let sig = hex::decode(signature.trim()).wrap_err("signature is not hex")?;
			let ctx = TrustContext::new();
			let anchor = ctx
				.get_anchor(&did)
				.wrap_err_with(|| format!("failed to resolve {did}"))?;
			if let Err(err) = anchor.verify(message.as_bytes(), &sig) {
				bail!("signature rejected for {did}: {err}");
			}
			info!(%did, "signature is valid");
			println!("ok");
		}
		Commands::Ledger { account, cli, sign } => {
			let provider = LedgerConfig { cli, account }
				.connect()
				.wrap_err("failed to connect to ledger")?;
			println!("{}", provider.did());
			if let Some(message) = sign {
				let ctx = TrustContext::with_provider(Arc::new(provider));
				let provider = ctx.get_provider(&ctx.providers()[0])?;
				let sig = provider
					.sign(message.as_bytes())
					.wrap_err("ledger failed to sign")?;
				provider
					.anchor()
					.verify(message.as_bytes(), &sig)
					.wrap_err("ledger produced a signature that doesn't verify")?;
				println!("{}", hex::encode(sig));
			}
		}
	}

	Ok(())
}
