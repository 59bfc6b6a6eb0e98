use chrono::Local;
use clap::Parser;
use portal_scrap::{
    config::Config,
    info_time,
    logging::init_logging,
    server::{serve, AppState},
    Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    init_logging();

    let cfg = Config::parse();
    tracing::debug!(?cfg, "Loaded config");

    let state = AppState::from_config(&cfg)?;
    serve(state, cfg.addr()).await?;
    info_time!(start_time, "Server stopped.");

    Ok(())
}
