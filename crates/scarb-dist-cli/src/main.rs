//! scarb-dist CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scarb_dist_cli::cmd::{self, Context};
use scarb_dist_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::from_env(cli.registry, cli.quiet)?;

    match cli.command {
        Commands::List => cmd::list::list(&ctx),
        Commands::Resolve { selector, host } => cmd::resolve::resolve(&ctx, &selector, host),
        Commands::Install {
            selector,
            dest,
            host,
        } => cmd::install::install(&ctx, &selector, &dest, host).await,
        Commands::Verify { dest, host } => cmd::verify::verify(&dest, host),
        Commands::Matrix {
            dest,
            hosts,
            versions,
            jobs,
        } => cmd::matrix::matrix(&ctx, &dest, &hosts, &versions, jobs).await,
        Commands::Update { dry_run } => cmd::update::update(&ctx, dry_run).await,
    }
}
