use std::sync::Arc;

use analysis::{market_context, select_instrument, Advice};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use core_sim::{InstrumentState, MarketError, MarketSnapshot};
use serde::Deserialize;

use crate::{error::ApiError, state::AppState, ws};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(snapshot))
        .route("/instruments/:symbol", get(instrument))
        .route("/advice", post(advice))
        .route("/ws/snapshots", get(ws::snapshots_socket))
        .with_state(state)
}

async fn snapshot(State(state): State<AppState>) -> Json<Arc<MarketSnapshot>> {
    Json(state.registry().snapshot())
}

async fn instrument(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<InstrumentState>, ApiError> {
    Ok(Json(state.registry().lookup(&symbol)?))
}

#[derive(Debug, Deserialize)]
struct AdviceRequest {
    query: String,
    symbol: Option<String>,
}

async fn advice(
    State(state): State<AppState>,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<Advice>, ApiError> {
    let snapshot = state.registry().snapshot();
    let selected = select_instrument(&snapshot, request.symbol.as_deref()).ok_or_else(|| {
        MarketError::InvalidInstrument(request.symbol.clone().unwrap_or_default())
    })?;
    let context = market_context(selected);

    let advice = state.analyst().advise(&request.query, &context).await?;
    Ok(Json(advice))
}
