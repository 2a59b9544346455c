#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use horizon_forecast::model::LinearRegressor;
use horizon_forecast::{DailyBar, ModelArtifact, StandardScaler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

/// Daily bars whose close rises by 1.0 per day from 100.0
pub fn linear_series(days: usize) -> Vec<DailyBar> {
    (0..days)
        .map(|i| {
            let close = 100.0 + i as f64;
            DailyBar::new(
                start_date() + Days::new(i as u64),
                close - 0.5,
                close + 1.0,
                close - 1.0,
                close,
                Some(10.0),
            )
        })
        .collect()
}

/// Seeded random walk with consistent OHLC
pub fn random_walk(days: usize, seed: u64) -> Vec<DailyBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close: f64 = 20_000.0;

    (0..days)
        .map(|i| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.03..0.03);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            DailyBar::new(
                start_date() + Days::new(i as u64),
                open,
                high,
                low,
                close,
                Some(rng.gen_range(100.0..1000.0)),
            )
        })
        .collect()
}

/// Model returning the named feature unchanged
pub fn selecting_model(features: &[&str], selected: &str) -> ModelArtifact {
    let index = features.iter().position(|f| *f == selected).unwrap();
    ModelArtifact::new(
        LinearRegressor::selecting(index, features.len()).unwrap().into(),
        StandardScaler::identity(features.len()),
        features.iter().map(|f| f.to_string()).collect(),
    )
    .unwrap()
}
