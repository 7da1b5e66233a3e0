use anyhow::Result;
use dealerdesk::{
    config::ServiceConfig,
    fetch::GoogleSheets,
    server,
};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) read config ──────────────────────────────────────────────
    let config = ServiceConfig::from_env()?;

    // ─── 2) init logging ─────────────────────────────────────────────
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(config.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();
    info!("Starting sheet-data service");

    // ─── 3) wire the sheet reader ────────────────────────────────────
    let location = config.location();
    info!(
        spreadsheet = %location.spreadsheet_id,
        range = %location.range,
        api_base = %location.api_base,
        "Reading sheet"
    );
    let sheets = Arc::new(GoogleSheets::new(Client::new(), location));

    // ─── 4) serve ────────────────────────────────────────────────────
    info!("Server starting on port {}", config.port);
    info!("Health check: http://localhost:{}/health", config.port);
    info!("Sheet data: GET http://localhost:{}/api/sheet-data", config.port);

    warp::serve(server::routes(sheets))
        .run(([0, 0, 0, 0], config.port))
        .await;

    Ok(())
}
