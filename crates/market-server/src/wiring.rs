use std::sync::Arc;

use analysis::{AnalysisError, Analyst, GeminiAdvisor};
use api::AppState;
use axum::{routing::get, Router};
use core_sim::{Instrument, MarketError, MarketRegistry};
use runtime::{MarketEngine, SchedulerError, SchedulerHandle, TickScheduler, SNAPSHOT_CHANNEL_CAPACITY};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build market registry: {0}")]
    Market(#[from] MarketError),

    #[error("failed to build advice provider: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("failed to start tick scheduler: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// A started market: the HTTP surface plus the running tick loop behind it.
pub struct MarketServer {
    pub app: Router,
    pub scheduler: SchedulerHandle,
}

/// Builds the registry, starts the scheduler and wires the HTTP app.
/// Must be called from within a tokio runtime.
pub fn start(config: &Config, roster: Vec<Instrument>) -> Result<MarketServer, StartupError> {
    let registry = Arc::new(MarketRegistry::new(roster, config.sim)?);
    let (snapshots_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);

    let advisor = GeminiAdvisor::new(config.advisor.clone())?;
    if advisor.is_configured() {
        info!(model = advisor.model(), "advice provider configured");
    } else {
        warn!("ADVISOR_API_KEY is not set, advice requests will receive the fallback answer");
    }

    let state = AppState::new(
        Arc::clone(&registry),
        snapshots_tx.clone(),
        Analyst::new(Arc::new(advisor)),
        config.cadence,
    );
    let scheduler = TickScheduler::spawn(MarketEngine::new(registry, snapshots_tx), config.cadence)?;

    Ok(MarketServer {
        app: build_app(state),
        scheduler,
    })
}

pub fn build_app(state: AppState) -> Router {
    api::app(state).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use analysis::GeminiConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use core_sim::{default_roster, SimConfig};
    use runtime::{CadenceConfig, LogFormat};
    use tower::ServiceExt;

    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cadence: CadenceConfig {
                advance_period: Duration::from_millis(50),
                ..CadenceConfig::default()
            },
            sim: SimConfig {
                rng_seed: Some(9),
                ..SimConfig::default()
            },
            roster_path: None,
            log_format: LogFormat::Pretty,
            advisor: GeminiConfig::default(),
        }
    }

    #[tokio::test]
    async fn server_healthcheck_responds_ok() {
        let server = super::start(&test_config(), default_roster()).unwrap();

        let response = server
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        server.scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn started_market_ticks_until_stopped() {
        let server = super::start(&test_config(), default_roster()).unwrap();

        tokio::time::sleep(Duration::from_millis(275)).await;
        let report = server.scheduler.stop().await.unwrap();

        assert!(report.ticks >= 1);
        assert_eq!(report.failed_ticks, 0);
    }

    #[tokio::test]
    async fn empty_roster_fails_startup() {
        let err = super::start(&test_config(), Vec::new()).err().unwrap();

        assert!(matches!(
            err,
            super::StartupError::Market(core_sim::MarketError::EmptyRoster)
        ));
    }
}
