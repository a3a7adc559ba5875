use clap::Parser;
use overnight_drift::{cli::Cli, obs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level)?;
    overnight_drift::cli::run(cli).await
}
