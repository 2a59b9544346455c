use horizon_server::config::ServiceConfig;
use horizon_server::state::AppContext;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_missing_data_file_is_fatal() {
    let dir = tempdir().unwrap();
    let config = ServiceConfig {
        data_path: dir.path().join("absent.csv"),
        model_path: dir.path().join("absent.json"),
        ..Default::default()
    };

    let err = AppContext::load(&config).unwrap_err();
    assert!(err.to_string().contains("Data file not found"));
}

#[test]
fn test_missing_model_is_not_fatal() {
    let dir = tempdir().unwrap();
    let data_path = dir.path().join("history.csv");
    let mut file = std::fs::File::create(&data_path).unwrap();
    writeln!(file, "date,open,high,low,close,Volume BTC").unwrap();
    writeln!(file, "2023-01-02,2,3,1,2.5,7").unwrap();
    writeln!(file, "2023-01-01,1,2,0.5,1.5,4").unwrap();

    let config = ServiceConfig {
        data_path,
        model_path: dir.path().join("absent.json"),
        oscillators: false,
        ..Default::default()
    };

    let ctx = AppContext::load(&config).unwrap();
    assert!(!ctx.artifact.is_loaded());
    assert!(!ctx.deriver.supports_oscillators());
    assert_eq!(ctx.history.len(), 2);
    assert!(ctx.history[0].date < ctx.history[1].date);
}
