use crate::{
    cmd::{migrate_until_ready, Services},
    modules::{
        handlers::{
            contest::{attach_solution, list_contests, sync_contests},
            liveness, readiness,
        },
        scheduler,
    },
    settings::Settings,
};
use anyhow::{Context, Result};
use axum::{extract::Extension, routing, Router, Server};
use clap::Args;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    port: Option<u16>,
    /// Do not run the periodic ingestion inside the server process.
    #[arg(long)]
    no_schedule: bool,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let settings = Settings::from_env()?;
    let services = Services::build(&settings).await?;

    let store = services.store.clone();
    let background = if args.no_schedule {
        tracing::info!("periodic ingestion is disabled");
        tokio::spawn(migrate_until_ready(store))
    } else {
        tracing::info!(
            "periodic ingestion every {} hours",
            settings.ingestion_interval.as_secs() / 3600
        );
        let ingestion = services.ingestion.clone();
        let period = settings.ingestion_interval;
        tokio::spawn(async move {
            migrate_until_ready(store).await;
            scheduler::run_periodically(ingestion, period).await;
        })
    };

    let app = create_router(&services);
    let port = match args.port {
        Some(port) => port,
        None => {
            tracing::warn!("API server will be launched at default port number 8000");
            8000u16
        }
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    let served = Server::try_bind(&addr)
        .with_context(|| {
            let message = format!("failed to bind port {}", port);
            tracing::error!(message);
            message
        })?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    background.abort();
    served.context("server terminated unexpectedly")?;

    Ok(())
}

pub fn create_router(services: &Services) -> Router {
    Router::new()
        .route("/api/contests", routing::get(list_contests))
        .route("/api/contests/sync", routing::post(sync_contests))
        .route("/api/contests/:contest_id/solution", routing::patch(attach_solution))
        .route("/api/liveness", routing::get(liveness))
        .route("/api/readiness", routing::get(readiness))
        .layer(Extension(services.store.clone()))
        .layer(Extension(services.reader.clone()))
        .layer(Extension(services.ingestion.clone()))
        .layer(Extension(services.matcher.clone()))
        .layer(Extension(services.playlists.clone()))
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler.");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, starting graceful shutdown.");
}
