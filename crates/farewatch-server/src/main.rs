mod config;
mod pipeline;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::bail;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use farewatch_api::AppStateInner;
use farewatch_core::{JsonDumpSource, MailTransport};
use farewatch_db::Database;
use farewatch_mail::{LogTransport, MailgunTransport};

use crate::config::Config;
use crate::pipeline::Pipeline;

const USAGE: &str = "usage: farewatch [serve | reconcile | ingest <flight-result.json>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farewatch=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::open(&config.db_path)?;

    let transport: Arc<dyn MailTransport> = match &config.mailgun {
        Some(mailgun) => {
            info!("Sending mail through Mailgun domain {}", mailgun.domain);
            Arc::new(MailgunTransport::new(mailgun.clone()))
        }
        None => {
            warn!("Mailgun is not configured; notifications will only be logged");
            Arc::new(LogTransport)
        }
    };
    let pipeline = Arc::new(Pipeline::new(db.clone(), transport, &config.currency_prefix));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["serve"] => serve(config, db, pipeline).await,
        ["reconcile"] => pipeline.reconcile().await,
        ["ingest", path] => {
            pipeline.scrape(&JsonDumpSource::new(*path)).await?;
            pipeline.reconcile().await
        }
        _ => bail!(USAGE),
    }
}

async fn serve(config: Config, db: Database, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    tokio::spawn(pipeline::run_loop(
        pipeline,
        config.dump_dir.clone(),
        config.interval_secs,
    ));

    let app = farewatch_api::router(Arc::new(AppStateInner { db }))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Fare Watch listening on {}", addr);
    info!(
        "Checking {} every {} seconds",
        config.dump_dir.display(),
        config.interval_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
