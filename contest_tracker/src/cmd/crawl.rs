use crate::{
    cmd::{solve, Services},
    modules::ingestion::IngestionOutcome,
    settings::Settings,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Match solution videos after the contests are saved.
    #[arg(long)]
    with_solutions: bool,
}

pub async fn run(args: CrawlArgs) -> Result<()> {
    let settings = Settings::from_env()?;
    let services = Services::build(&settings).await?;
    services.migrate().await?;

    if let IngestionOutcome::Completed { fetched, ingested } = services.ingestion.run().await {
        tracing::info!("{} contests fetched, {} saved", fetched, ingested);
    }

    if args.with_solutions {
        solve::match_solutions(&services).await?;
    }

    Ok(())
}
