use chrono::NaiveDate;
use tracing::{info, warn};
use crate::config::ForecastConfig;
use crate::data::types::MarketFrame;
use crate::forecast::series::future_dates;
use crate::forecast::{ArimaModel, ForecastSeries, Model, ModelError, SarimaxModel};

#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub greed: ForecastSeries,
    pub price: ForecastSeries,
}

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Error during ARIMA model processing: {0}")]
    Greed(#[source] ModelError),

    #[error("Error during SARIMAX model processing: {0}")]
    Price(#[source] ModelError),

    #[error("No complete rows to model")]
    NoData,
}

/// Forecast the greed coefficient, then price with that forecast as regressor.
pub fn run_forecast(
    frame: &MarketFrame,
    config: &ForecastConfig,
    today: NaiveDate,
) -> Result<ForecastOutcome, ForecastError> {
    let rows = frame.complete();
    if rows.is_empty() {
        return Err(ForecastError::NoData);
    }
    let dropped = frame.len() - rows.len();
    if dropped > 0 {
        warn!("Dropping {} rows without a numeric greed coefficient", dropped);
    }

    let horizon = config.horizon_days;
    let dates = future_dates(today, horizon);
    let prices: Vec<f64> = rows.iter().map(|(_, price, _)| *price).collect();
    let greed: Vec<f64> = rows.iter().map(|(_, _, greed)| *greed).collect();

    let mut arima = ArimaModel::new(greed.clone(), config.greed_order.into(), dates.clone())
        .with_max_iter(config.max_iter);
    let (greed_series, future_coef) = forecast_greed(&mut arima, horizon).map_err(ForecastError::Greed)?;
    info!("{}", greed_series);

    let exog: Vec<Vec<f64>> = greed.into_iter().map(|g| vec![g]).collect();
    let mut sarimax = SarimaxModel::new(
        prices,
        exog,
        config.price_order.into(),
        config.price_seasonal_order.into(),
        dates,
    )
    .with_max_iter(config.max_iter);
    let price_series = forecast_price(&mut sarimax, horizon, &future_coef).map_err(ForecastError::Price)?;
    info!("{}", price_series);

    Ok(ForecastOutcome {
        greed: greed_series,
        price: price_series,
    })
}

fn forecast_greed(
    model: &mut ArimaModel,
    horizon: usize,
) -> Result<(ForecastSeries, Vec<Vec<f64>>), ModelError> {
    let order = model.order();
    let summary = model.fit()?;
    log_fit(&format!("ARIMA{}", order), summary.converged, &summary.to_string());

    model.forecast(horizon, None)?;
    Ok((model.series()?, model.future_coef()?))
}

fn forecast_price(
    model: &mut SarimaxModel,
    horizon: usize,
    future_exog: &[Vec<f64>],
) -> Result<ForecastSeries, ModelError> {
    let (order, seasonal) = model.order();
    let summary = model.fit()?;
    log_fit(&format!("SARIMAX{}x{}", order, seasonal), summary.converged, &summary.to_string());

    model.forecast(horizon, Some(future_exog))?;
    model.series()
}

fn log_fit(model: &str, converged: bool, summary: &str) {
    if converged {
        info!("{} fitted: {}", model, summary);
    } else {
        warn!("{} hit the iteration limit before converging: {}", model, summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Observation;
    use chrono::Days;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn fixed_frame(n: usize) -> MarketFrame {
        let mut rng = StdRng::seed_from_u64(42);
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut frame = MarketFrame::new();
        let mut greed: f64 = 55.0;
        let mut price: f64 = 25_000.0;

        for i in 0..n {
            greed = (55.0 + 0.85 * (greed - 55.0) + rng.gen_range(-6.0..6.0)).clamp(5.0, 95.0);
            price += 8.0 * (greed - 55.0) + rng.gen_range(-300.0..300.0);
            frame.insert(
                start.checked_add_days(Days::new(i as u64)).unwrap(),
                Observation { price, greed_coef: Some(greed.round()) },
            );
        }
        frame
    }

    #[test]
    fn test_both_models_forecast_full_horizon() {
        let frame = fixed_frame(200);
        let today = NaiveDate::from_ymd_opt(2023, 7, 20).unwrap();

        let outcome = run_forecast(&frame, &ForecastConfig::default(), today).unwrap();

        assert_eq!(outcome.greed.len(), 10);
        assert_eq!(outcome.price.len(), 10);
        assert_eq!(outcome.greed.points[0].0, NaiveDate::from_ymd_opt(2023, 7, 21).unwrap());
        assert_eq!(outcome.price.points[9].0, NaiveDate::from_ymd_opt(2023, 7, 30).unwrap());
        assert!(outcome.greed.values().iter().all(|v| v.is_finite()));
        assert!(outcome.price.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rows_without_greed_are_skipped() {
        let mut frame = fixed_frame(150);
        frame.insert(
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            Observation { price: 24_000.0, greed_coef: None },
        );
        let config = ForecastConfig { horizon_days: 5, ..ForecastConfig::default() };

        let outcome = run_forecast(&frame, &config, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()).unwrap();
        assert_eq!(outcome.price.len(), 5);
    }

    #[test]
    fn test_greed_failure_stops_before_price_model() {
        let frame = fixed_frame(2);
        let err = run_forecast(&frame, &ForecastConfig::default(), NaiveDate::from_ymd_opt(2023, 1, 3).unwrap())
            .unwrap_err();

        assert!(matches!(err, ForecastError::Greed(ModelError::InsufficientData { .. })));
        assert!(err.to_string().starts_with("Error during ARIMA model processing"));
    }

    #[test]
    fn test_price_failure_is_reported_separately() {
        // Enough rows for ARIMA(1,0,2) but not for the seasonal price model
        let frame = fixed_frame(20);
        let err = run_forecast(&frame, &ForecastConfig::default(), NaiveDate::from_ymd_opt(2023, 1, 21).unwrap())
            .unwrap_err();

        assert!(matches!(err, ForecastError::Price(ModelError::InsufficientData { .. })));
    }

    #[test]
    fn test_empty_frame_is_no_data() {
        let err = run_forecast(&MarketFrame::new(), &ForecastConfig::default(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, ForecastError::NoData));
    }
}
