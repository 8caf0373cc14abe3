use crate::{cmd::Services, settings::Settings};
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct SolveArgs {}

pub async fn run(_args: SolveArgs) -> Result<()> {
    let settings = Settings::from_env()?;
    let services = Services::build(&settings).await?;
    services.migrate().await?;

    match_solutions(&services).await
}

pub async fn match_solutions(services: &Services) -> Result<()> {
    let playlists = services.playlists.fetch_all().await;
    let updated = services.matcher.run(&playlists).await.with_context(|| {
        let message = "failed to match solution videos";
        tracing::error!(message);
        message
    })?;
    services.reader.invalidate().await;

    for contest in updated.iter() {
        tracing::info!(
            "{} -> {}",
            contest.contest_id,
            contest.youtube_video.as_deref().unwrap_or_default()
        );
    }
    tracing::info!("{} contests matched with solution videos", updated.len());

    Ok(())
}
