//! HTTP routes and the mapping from forecast errors to JSON responses

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use horizon_forecast::{
    ForecastError, HorizonForecaster, HorizonPoint, LatestPrediction, SingleStepPredictor,
    DEFAULT_HORIZON,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error as _;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::SharedContext;

pub const HOME_MESSAGE: &str = "Crypto Price Prediction API is running!";

/// Build the service router
pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict_latest", get(predict_latest))
        .route("/predict_horizon", get(predict_horizon))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Errors a handler can return
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// `n` was not an integer
    #[error("n must be an integer, got '{0}'")]
    BadHorizonParam(String),

    /// The blocking forecast task panicked or was cancelled
    #[error("Unexpected computation error: {0}")]
    Unexpected(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadHorizonParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Forecast(err) => match err {
                ForecastError::InvalidHorizon { .. }
                | ForecastError::MissingFeatures { .. }
                | ForecastError::NoValidData => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::Forecast(ForecastError::MissingFeatures { names }) => json!({
                "error": "Model requires additional features not found in data.",
                "missing_features": names,
            }),
            ApiError::Forecast(ForecastError::InsufficientHistory { step, .. }) => json!({
                "error": self.to_string(),
                "step": step,
            }),
            _ if self.status() == StatusCode::BAD_REQUEST => json!({ "error": self.to_string() }),
            _ => json!({
                "error": self.to_string(),
                "traceback": self.traceback(),
            }),
        }
    }

    /// The error and its sources, one per line
    fn traceback(&self) -> String {
        let mut lines = vec![format!("{:?}", self)];
        let mut source = self.source();
        while let Some(err) = source {
            lines.push(format!("caused by: {}", err));
            source = err.source();
        }
        lines.join("\n")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Run CPU-bound forecast work off the async executor
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> horizon_forecast::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Unexpected(err.to_string()))?
        .map_err(ApiError::from)
}

async fn home() -> Json<Value> {
    Json(json!({ "message": HOME_MESSAGE }))
}

async fn predict_latest(State(ctx): State<SharedContext>) -> Result<Json<LatestPrediction>, ApiError> {
    let prediction = blocking(move || {
        SingleStepPredictor::new(&ctx.artifact, ctx.deriver).predict_latest(&ctx.history)
    })
    .await?;

    Ok(Json(prediction))
}

#[derive(Debug, Deserialize)]
pub struct HorizonParams {
    n: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HorizonResponse {
    pub predictions: Vec<HorizonPoint>,
}

/// Parse the `n` query value; absent means the default horizon
pub fn parse_horizon(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        None => Ok(DEFAULT_HORIZON),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ApiError::BadHorizonParam(value.to_string())),
    }
}

async fn predict_horizon(
    State(ctx): State<SharedContext>,
    Query(params): Query<HorizonParams>,
) -> Result<Json<HorizonResponse>, ApiError> {
    let n = parse_horizon(params.n.as_deref())?;

    let predictions = blocking(move || {
        HorizonForecaster::new(&ctx.artifact, ctx.deriver).forecast(&ctx.history, n)
    })
    .await?;

    Ok(Json(HorizonResponse { predictions }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_horizon() {
        assert_eq!(parse_horizon(None).unwrap(), DEFAULT_HORIZON);
        assert_eq!(parse_horizon(Some(" 12 ")).unwrap(), 12);
        assert_eq!(parse_horizon(Some("-1")).unwrap(), -1);
        assert!(matches!(
            parse_horizon(Some("seven")),
            Err(ApiError::BadHorizonParam(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(ForecastError::InvalidHorizon {
                    requested: 0,
                    max: 90,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(ForecastError::NoValidData), StatusCode::BAD_REQUEST),
            (
                ApiError::from(ForecastError::ModelUnavailable),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(ForecastError::InsufficientHistory {
                    step: 2,
                    detail: "MA200".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Unexpected("panicked".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{}", err);
        }
    }

    #[test]
    fn test_error_bodies() {
        let body = ApiError::from(ForecastError::MissingFeatures {
            names: vec!["rsi14".to_string()],
        })
        .body();
        assert_eq!(body["missing_features"], json!(["rsi14"]));

        let body = ApiError::from(ForecastError::InsufficientHistory {
            step: 4,
            detail: "MA200".to_string(),
        })
        .body();
        assert_eq!(body["step"], json!(4));

        let body = ApiError::from(ForecastError::ModelUnavailable).body();
        assert_eq!(body["error"], json!("Model not loaded properly"));
        assert!(body["traceback"].as_str().unwrap().contains("ModelUnavailable"));
    }
}
