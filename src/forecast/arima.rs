use chrono::NaiveDate;
use crate::forecast::estimation::{self, Estimate, Specification};
use crate::forecast::{ArimaOrder, FitSummary, ForecastSeries, Model, ModelError, SeasonalOrder};

pub const SERIES_NAME: &str = "Predicted GreedCoef";

/// Univariate ARIMA(p, d, q). A constant is estimated when `d == 0`.
pub struct ArimaModel {
    data: Vec<f64>,
    order: ArimaOrder,
    future_dates: Vec<NaiveDate>,
    max_iter: usize,
    estimate: Option<Estimate>,
    forecast: Option<Vec<f64>>,
}

impl ArimaModel {
    pub fn new(data: Vec<f64>, order: ArimaOrder, future_dates: Vec<NaiveDate>) -> Self {
        Self {
            data,
            order,
            future_dates,
            max_iter: 1000,
            estimate: None,
            forecast: None,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// The forecast as a one-column regressor matrix, for use as future exog.
    pub fn future_coef(&self) -> Result<Vec<Vec<f64>>, ModelError> {
        let forecast = self.forecast.as_ref().ok_or(ModelError::NotForecast)?;
        Ok(forecast.iter().map(|v| vec![*v]).collect())
    }

    fn specification(&self) -> Specification {
        Specification {
            order: self.order,
            seasonal: SeasonalOrder::none(),
            trend: self.order.d == 0,
            k_exog: 0,
        }
    }
}

impl Model for ArimaModel {
    fn fit(&mut self) -> Result<&FitSummary, ModelError> {
        let estimate = estimation::fit(self.specification(), &self.data, &[], self.max_iter)
            .map_err(|e| match e {
                ModelError::Fit(msg) => ModelError::Fit(format!("ARIMA{}: {}", self.order, msg)),
                other => other,
            })?;

        self.forecast = None;
        Ok(&self.estimate.insert(estimate).summary)
    }

    fn forecast(&mut self, steps: usize, exog: Option<&[Vec<f64>]>) -> Result<&[f64], ModelError> {
        if exog.is_some_and(|rows| !rows.is_empty()) {
            return Err(ModelError::Forecast("ARIMA model takes no exogenous data".to_string()));
        }

        let estimate = self.estimate.as_ref().ok_or(ModelError::NotFitted)?;
        let values = estimate.forecast(steps, &[])?;
        Ok(self.forecast.insert(values).as_slice())
    }

    fn series(&self) -> Result<ForecastSeries, ModelError> {
        let forecast = self.forecast.as_ref().ok_or(ModelError::NotForecast)?;
        ForecastSeries::new(SERIES_NAME, &self.future_dates, forecast).ok_or_else(|| {
            ModelError::Forecast(format!(
                "{} forecast values for {} future dates",
                forecast.len(),
                self.future_dates.len()
            ))
        })
    }
}
