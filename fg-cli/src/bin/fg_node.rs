//! `fg-node`: runs the finality-gadget operator daemon for a single
//! registered finality provider.

use color_eyre::eyre;

use fg_cli::args::Args;
use fg_cli::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse_args();
    init_tracing(&args.log_level, args.log_format);

    let home = args.home_dir()?;
    let config_path = args.config_file_path()?;
    let config = fg_cli::load_config(&config_path)?;

    let code = fg_cli::run(&home, config).await?;
    std::process::exit(code);
}
