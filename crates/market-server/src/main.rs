mod config;
mod wiring;

use std::error::Error;

use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = config::Config::from_env()?;
    runtime::init_logging(config.log_format).map_err(|err| err as Box<dyn Error>)?;

    let roster = config.load_roster()?;
    info!(
        instruments = roster.len(),
        tick_ms = config.cadence.advance_period.as_millis() as u64,
        "starting market server"
    );

    let server = wiring::start(&config, roster)?;
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, server.app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let report = server.scheduler.stop().await?;
    info!(
        ticks = report.ticks,
        failed_ticks = report.failed_ticks,
        p99_micros = report.latency.as_ref().map(|latency| latency.p99_micros),
        "market server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to install Ctrl-C handler, running until killed");
        std::future::pending::<()>().await;
    }
}
