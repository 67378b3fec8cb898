use aemet_normalizer::cli::{run, Cli};
use aemet_normalizer::error::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
