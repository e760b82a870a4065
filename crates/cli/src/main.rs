//! CLI entry point for ringlb.

use clap::Parser;
use ringlb::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    let result = cli.run().await?;
    print!("{result}");
    Ok(())
}
