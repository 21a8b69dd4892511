//! `fg-show-pubkey`: reads a hex-encoded secp256k1 secret key from a file
//! and prints the BIP-340 X-only public key an operator registers on the
//! Babylon control chain as their finality provider's BTC pubkey.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{self, Context};
use secp256k1::{Keypair, Secp256k1, SecretKey};

#[derive(Parser, Debug)]
#[command(about = "Print the BTC pubkey derived from a secret key file")]
struct Args {
    /// Path to a file containing a hex-encoded 32-byte secp256k1 secret key.
    #[arg(long, value_name = "KEY_FILE")]
    key_file: PathBuf,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let contents = std::fs::read_to_string(&args.key_file)
        .with_context(|| format!("failed to read {}", args.key_file.display()))?;
    let bytes = hex::decode(contents.trim()).context("key file does not contain valid hex")?;
    let secret = SecretKey::from_slice(&bytes).context("not a valid secp256k1 secret key")?;

    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, &secret);
    let (xonly, _parity) = keypair.x_only_public_key();

    println!("{}", hex::encode(xonly.serialize()));
    Ok(())
}
