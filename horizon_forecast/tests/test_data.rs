mod common;

use common::linear_series;
use horizon_forecast::{normalize_history, resample_daily, DataLoader, FeatureDeriver};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,symbol,open,high,low,close,Volume BTC,Volume USD").unwrap();
    writeln!(file, "2023-01-03,BTC/USD,106.0,110.0,104.0,108.0,15,1500").unwrap();
    writeln!(file, "2023-01-01,BTC/USD,100.0,105.0,98.0,103.0,10,1000").unwrap();
    writeln!(file, "2023-01-02,BTC/USD,103.0,107.0,101.0,,12,1200").unwrap();
    writeln!(file, "2023-01-04,BTC/USD,108.0,111.0,107.0,109.0,9,900").unwrap();

    let data = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(data.len(), 4);
    assert_eq!(data.time_column(), "date");
    assert_eq!(data.volume_column(), Some("Volume BTC"));

    // The row without a close is skipped
    let bars = normalize_history(data.to_daily_bars().unwrap()).unwrap();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![103.0, 108.0, 109.0]);
    assert_eq!(bars[0].volume, Some(10.0));
}

#[test]
fn test_data_loader_error_handling() {
    let result = DataLoader::from_csv("nonexistent_file.csv");
    assert!(result.is_err());

    // No price columns
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,price").unwrap();
    writeln!(file, "2023-01-01,1.0").unwrap();
    assert!(DataLoader::from_csv(file.path()).is_err());
}

#[test]
fn test_minute_csv_resamples_to_daily() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "unix,date,open,high,low,close,Volume BTC").unwrap();
    writeln!(file, "1672531200,2023-01-01 00:00:00,100,101,99,100.5,1.5").unwrap();
    writeln!(file, "1672531260,2023-01-01 00:01:00,100.5,103,100,102,2.5").unwrap();
    writeln!(file, "1672617600,2023-01-02 00:00:00,102,102,95,96,1").unwrap();

    let minute = DataLoader::from_csv(file.path())
        .unwrap()
        .to_minute_bars()
        .unwrap();
    assert_eq!(minute.len(), 3);

    let daily = resample_daily(&minute);
    assert_eq!(daily.len(), 2);
    assert_eq!(
        (daily[0].open, daily[0].high, daily[0].low, daily[0].close),
        (100.0, 103.0, 99.0, 102.0)
    );
    assert_eq!(daily[0].volume, Some(4.0));
    assert_eq!(daily[1].close, 96.0);
}

#[test]
fn test_feature_csv_reloads_as_bars() {
    let history = linear_series(210);
    let table = FeatureDeriver::new().derive(&history);

    let dir = tempdir().unwrap();
    let path = dir.path().join("features.csv");
    table.drop_incomplete().write_csv(&path).unwrap();

    let data = DataLoader::from_csv(&path).unwrap();
    assert_eq!(data.volume_column(), Some("Volume BTC"));

    let bars = data.to_daily_bars().unwrap();
    assert_eq!(bars.as_slice(), &history[199..]);
}
