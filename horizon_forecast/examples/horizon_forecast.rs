use chrono::{Days, NaiveDate};
use horizon_forecast::{
    DailyBar, FeatureDeriver, HorizonForecaster, ModelSelector, SingleStepPredictor, TrainingSet,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Horizon Forecast Example");
    println!("========================");

    // Generate a year of synthetic daily bars
    let mut rng = StdRng::seed_from_u64(2017);
    let start = NaiveDate::from_ymd_opt(2017, 1, 1).ok_or("bad start date")?;
    let mut close: f64 = 1_000.0;
    let history: Vec<DailyBar> = (0..365)
        .map(|i| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.04..0.05);
            DailyBar::new(
                start + Days::new(i),
                open,
                open.max(close) * 1.01,
                open.min(close) * 0.99,
                close,
                Some(rng.gen_range(500.0..5_000.0)),
            )
        })
        .collect();

    // Train on the rolling features only
    let deriver = FeatureDeriver::new();
    let features = ["close", "lag1_close", "MA7", "MA30", "volatility7", "roc5"];
    let table = deriver.derive(&history).drop_incomplete();
    let set = TrainingSet::from_table(&table, &features)?;
    let selection = ModelSelector::default().select(&set)?;
    for score in &selection.candidates {
        println!("{:<20} RMSE {:.2}  R2 {:.3}", score.name, score.rmse_mean, score.r2_mean);
    }
    println!("Best: {}", selection.best);
    let report = selection.report;

    if let Some(metrics) = &report.metrics {
        println!(
            "Hold-out ({} rows): MAE {:.2}  RMSE {:.2}  R2 {:.3}",
            report.test_rows, metrics.mae, metrics.rmse, metrics.r2
        );
    }

    let latest = SingleStepPredictor::new(&report.artifact, deriver).predict_latest(&history)?;
    println!(
        "\nNext close after {:?}: {:.2}",
        latest.date_used, latest.predicted_next_close
    );

    println!("\n7-day horizon:");
    let forecaster = HorizonForecaster::new(&report.artifact, deriver);
    for point in forecaster.forecast(&history, 7)? {
        println!("  {}  {:.2}", point.date, point.predicted_close);
    }

    Ok(())
}
