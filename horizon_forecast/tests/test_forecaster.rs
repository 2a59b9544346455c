mod common;

use approx::assert_relative_eq;
use chrono::Days;
use common::{linear_series, random_walk, selecting_model};
use horizon_forecast::model::LinearRegressor;
use horizon_forecast::{
    FeatureDeriver, ForecastError, HorizonForecaster, ModelArtifact, StandardScaler,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const FEATURES: [&str; 3] = ["close", "lag1_close", "MA7"];

#[rstest]
#[case(-1)]
#[case(0)]
#[case(91)]
fn test_rejects_out_of_range_horizon(#[case] n: i64) {
    let artifact = selecting_model(&FEATURES, "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    let result = forecaster.forecast(&linear_series(250), n);
    assert!(matches!(
        result,
        Err(ForecastError::InvalidHorizon { requested, max: 90 }) if requested == n
    ));
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(90)]
fn test_horizon_length_and_dates(#[case] n: i64) {
    let history = linear_series(250);
    let artifact = selecting_model(&FEATURES, "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    let points = forecaster.forecast(&history, n).unwrap();
    assert_eq!(points.len(), n as usize);

    let last = history.last().unwrap().date;
    for (i, point) in points.iter().enumerate() {
        assert_eq!(point.date, last + Days::new(i as u64 + 1));
    }
}

#[test]
fn test_identity_on_lag_feeds_back_synthesized_closes() {
    let history = linear_series(250);
    let artifact = selecting_model(&FEATURES, "lag1_close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    let run = forecaster.run(&history, 3).unwrap();
    let predictions: Vec<f64> = run.points.iter().map(|p| p.predicted_close).collect();

    // lag1 of the last real bar, then of the last real close, then of the
    // first synthesized bar
    assert_eq!(predictions, vec![348.0, 349.0, 348.0]);

    let mut previous_close = history.last().unwrap().close;
    for (point, bar) in run.points.iter().zip(&run.series.bars()[250..]) {
        assert!((point.predicted_close - previous_close).abs() <= 1.0 + 1e-9);
        previous_close = bar.close;
    }
}

#[test]
fn test_synthesized_bars_follow_predictions() {
    let history = random_walk(300, 7);
    let artifact = selecting_model(&FEATURES, "MA7");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    let run = forecaster.run(&history, 10).unwrap();
    assert_eq!(run.series.len(), 310);
    assert_eq!(run.table.len(), 310);

    let synthesized = &run.series.bars()[300..];
    for (i, (point, bar)) in run.points.iter().zip(synthesized).enumerate() {
        assert_eq!(point.date, bar.date);
        assert_relative_eq!(bar.close, point.predicted_close, epsilon = 0.005 + 1e-9);
        assert!(bar.high >= bar.close && bar.close >= bar.low);

        let previous = &run.series.bars()[299 + i];
        assert_eq!(bar.open, previous.close);
        assert_eq!(bar.volume, previous.volume);
    }
}

#[test]
fn test_forecast_is_deterministic() {
    let history = random_walk(260, 42);
    let features = ["close", "MA30", "volatility7", "roc5", "day_of_week"];
    let artifact = ModelArtifact::new(
        LinearRegressor::new(5.0, vec![0.9, 0.1, -0.2, 30.0, 1.5]).unwrap().into(),
        StandardScaler::identity(features.len()),
        features.iter().map(|f| f.to_string()).collect(),
    )
    .unwrap();
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    let first = forecaster.forecast(&history, 30).unwrap();
    let second = forecaster.forecast(&history, 30).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_unsorted_history_is_sorted() {
    let history = linear_series(250);
    let mut shuffled = history.clone();
    shuffled.reverse();

    let artifact = selecting_model(&FEATURES, "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    assert_eq!(
        forecaster.forecast(&shuffled, 5).unwrap(),
        forecaster.forecast(&history, 5).unwrap()
    );
}

#[test]
fn test_missing_features_fail_before_forecasting() {
    let artifact = selecting_model(&["close", "not_a_feature"], "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    match forecaster.forecast(&linear_series(250), 3) {
        Err(ForecastError::MissingFeatures { names }) => {
            assert_eq!(names, vec!["not_a_feature".to_string()])
        }
        other => panic!("expected MissingFeatures, got {:?}", other),
    }
}

#[test]
fn test_oscillators_missing_when_disabled() {
    let artifact = selecting_model(&["close", "rsi14"], "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::without_oscillators());

    assert!(matches!(
        forecaster.forecast(&linear_series(250), 1),
        Err(ForecastError::MissingFeatures { .. })
    ));
}

#[test]
fn test_starved_window_reports_step() {
    // MA200 cannot be computed from 20 bars, even after filling
    let artifact = selecting_model(&["close", "MA200"], "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    match forecaster.forecast(&linear_series(20), 3) {
        Err(ForecastError::InsufficientHistory { step, detail }) => {
            assert_eq!(step, 1);
            assert!(detail.contains("MA200"));
        }
        other => panic!("expected InsufficientHistory, got {:?}", other),
    }
}

#[test]
fn test_empty_history_is_insufficient() {
    let artifact = selecting_model(&FEATURES, "close");
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    assert!(matches!(
        forecaster.forecast(&[], 1),
        Err(ForecastError::InsufficientHistory { step: 1, .. })
    ));
}

#[test]
fn test_unloaded_model_is_unavailable() {
    let artifact = ModelArtifact::unloaded();
    let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());

    let result = forecaster.forecast(&random_walk(250, 1), 2);
    if FeatureDeriver::new().supports_oscillators() {
        assert!(matches!(result, Err(ForecastError::ModelUnavailable)));
    } else {
        assert!(matches!(result, Err(ForecastError::MissingFeatures { .. })));
    }
}
