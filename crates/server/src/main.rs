use std::{net::SocketAddr, sync::Arc};

use aggregator::{aggregate, AggregatorContext};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use shared::{error::ApiError, protocol::AggregatedListing};
use tracing::{error, info, warn};
use upstream::UpstreamClient;

mod config;

use config::{load_settings, Settings};

#[derive(Clone)]
struct AppState {
    aggregator: AggregatorContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    if settings.access_token.is_none() {
        warn!("no upstream access token configured; /api/vacancies will report a configuration error");
    }

    let state = app_state(&settings)?;
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn app_state(settings: &Settings) -> anyhow::Result<AppState> {
    let upstream = UpstreamClient::new(settings.upstream_config())?;
    Ok(AppState {
        aggregator: AggregatorContext {
            upstream,
            fan_out_limit: settings.fan_out_limit,
        },
    })
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/vacancies", get(list_vacancies))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_vacancies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AggregatedListing>, (StatusCode, Json<ApiError>)> {
    let listing = aggregate(&state.aggregator).await.map_err(|err| {
        error!(%err, "vacancy aggregation failed");
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ApiError::new(err.error_code(), err.to_string())))
    })?;
    Ok(Json(listing))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
