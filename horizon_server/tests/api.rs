use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Days, NaiveDate};
use horizon_forecast::model::LinearRegressor;
use horizon_forecast::{DailyBar, FeatureDeriver, ModelArtifact, StandardScaler};
use horizon_server::api::{router, HOME_MESSAGE};
use horizon_server::state::AppContext;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn history(days: u64) -> Vec<DailyBar> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..days)
        .map(|i| {
            let close = 100.0 + i as f64;
            DailyBar::new(start + Days::new(i), close, close + 1.0, close - 1.0, close, Some(5.0))
        })
        .collect()
}

fn close_model(features: &[&str]) -> ModelArtifact {
    ModelArtifact::new(
        LinearRegressor::selecting(0, features.len()).unwrap().into(),
        StandardScaler::identity(features.len()),
        features.iter().map(|f| f.to_string()).collect(),
    )
    .unwrap()
}

fn app(artifact: ModelArtifact, days: u64) -> Router {
    router(AppContext::new(artifact, history(days), FeatureDeriver::new()).into_shared())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_home() {
    let (status, body) = get(app(close_model(&["close"]), 250), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": HOME_MESSAGE }));
}

#[tokio::test]
async fn test_predict_latest() {
    let (status, body) = get(app(close_model(&["close", "MA7"]), 250), "/predict_latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_next_close"], json!(349.0));
    assert_eq!(body["date_used"], json!("2023-09-07"));
    assert_eq!(body["features_used"], json!(["close", "MA7"]));
}

#[tokio::test]
async fn test_predict_horizon() {
    let (status, body) = get(app(close_model(&["close"]), 250), "/predict_horizon?n=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "predictions": [
                { "date": "2023-09-08", "predicted_close": 349.0 },
                { "date": "2023-09-09", "predicted_close": 349.0 },
                { "date": "2023-09-10", "predicted_close": 349.0 },
            ]
        })
    );
}

#[tokio::test]
async fn test_predict_horizon_defaults_to_seven() {
    let (status, body) = get(app(close_model(&["close"]), 250), "/predict_horizon").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_predict_horizon_rejects_bad_n() {
    for uri in [
        "/predict_horizon?n=0",
        "/predict_horizon?n=91",
        "/predict_horizon?n=-1",
        "/predict_horizon?n=abc",
    ] {
        let (status, body) = get(app(close_model(&["close"]), 250), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string());
        assert!(body.get("traceback").is_none());
    }
}

#[tokio::test]
async fn test_missing_features_are_bad_requests() {
    for uri in ["/predict_latest", "/predict_horizon?n=2"] {
        let (status, body) = get(app(close_model(&["close", "funding_rate"]), 250), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["missing_features"], json!(["funding_rate"]));
    }
}

#[tokio::test]
async fn test_no_valid_rows() {
    // 50 bars never fill the 200-day window
    let (status, body) = get(app(close_model(&["close"]), 50), "/predict_latest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No valid rows found in dataset"));
}

#[tokio::test]
async fn test_insufficient_history_reports_step() {
    let (status, body) = get(app(close_model(&["close", "MA200"]), 50), "/predict_horizon?n=2").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["step"], json!(1));
}

#[tokio::test]
async fn test_unloaded_model_is_server_error() {
    let (status, body) = get(app(ModelArtifact::unloaded(), 250), "/predict_latest").await;

    if FeatureDeriver::new().supports_oscillators() {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Model not loaded properly"));
        assert!(body["traceback"].is_string());
    } else {
        // Default features include the oscillators
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
