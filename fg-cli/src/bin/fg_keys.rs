//! `fg-keys`: provisions and inspects the EOTS keystore used by `fg-node`,
//! following the original operator's `keys restore`/`keys show` commands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre;

use fg_cli::args::default_home_dir;
use fg_eotsmanager::keyring::{FileKeyRing, KeyRing};

#[derive(Parser, Debug)]
#[command(about = "Manage the EOTS keystore for a finality provider")]
struct Args {
    /// Home directory holding the keystore (default: `$HOME/.finality-gadget`).
    #[arg(long, env = "FG_HOME", value_name = "HOME_DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new BTC keypair and store it encrypted under `--home`.
    Create {
        /// Operator-chosen name for the key.
        name: String,
        /// Passphrase the key is encrypted with; required again to sign.
        #[arg(long)]
        passphrase: String,
        /// BIP-32 HD derivation path, recorded for informational purposes.
        #[arg(long, default_value = "m/86'/0'/0'/0/0")]
        hd_path: String,
    },
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let home = match args.home {
        Some(path) => path,
        None => default_home_dir()?,
    };
    let keyring = FileKeyRing::new(home.join("keyring"));

    match args.command {
        Command::Create {
            name,
            passphrase,
            hd_path,
        } => {
            let fp_pk = keyring.create_key(&name, &passphrase, &hd_path)?;
            println!("{}", fp_pk.to_hex());
        }
    }

    Ok(())
}
