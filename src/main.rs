use std::path::Path;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;

use config::env::{self as app_env, EnvKey};
use config::settings::AppConfig;
use state::AppState;

const LOG_FILE: &str = "log.txt";

/// `<dir>/log.txt`, appended to across restarts.
fn log_file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let log_dir = app_env::get_or(EnvKey::LogDir, "logs");
    let appender = log_file_appender(Path::new(&log_dir))
        .with_context(|| format!("failed to open log file in {log_dir}"))?;
    let (file_writer, _log_guard) = tracing_appender::non_blocking(appender);

    // Initialize tracing: stdout plus the log file
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("invalid configuration")?;

    for path in [&config.motion_config, &config.retarget_config] {
        if !path.is_file() {
            warn!("Pipeline config {} not found, jobs will fail until it exists", path.display());
        }
    }

    let addr = config.bind_addr();
    let app = app::create_app(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
