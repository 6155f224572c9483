use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use forecast_core::{ForecastClient, ForecastError, ForecastResult};
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub city: String,
}

/// Error body returned for failed lookups.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        Self { status: status_for(&err), message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Translate a forecast failure into the status returned to our own callers.
pub fn status_for(err: &ForecastError) -> StatusCode {
    match err {
        ForecastError::Upstream { .. } if err.is_not_found() => StatusCode::NOT_FOUND,
        ForecastError::Upstream { .. } | ForecastError::Deserialization(_) => {
            StatusCode::BAD_GATEWAY
        }
        ForecastError::Transport(inner) if inner.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        ForecastError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn router(client: ForecastClient) -> Router {
    Router::new().route("/api/forecast", get(get_forecast)).with_state(client)
}

async fn get_forecast(
    State(client): State<ForecastClient>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResult>, ApiError> {
    let city = query.city.trim();
    if city.is_empty() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "query parameter 'city' must not be empty".to_string(),
        });
    }

    match client.fetch_forecast(city).await {
        Ok(forecast) => Ok(Json(forecast)),
        Err(err) => {
            warn!(city, error = %err, "forecast lookup failed");
            Err(err.into())
        }
    }
}

/// Serve `GET /api/forecast?city=...` until Ctrl-C.
pub async fn serve(client: ForecastClient, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!(address = %bind, "forecast endpoint listening on /api/forecast");

    axum::serve(listener, router(client))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
            }
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
