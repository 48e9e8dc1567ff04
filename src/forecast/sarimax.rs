use chrono::NaiveDate;
use crate::forecast::estimation::{self, Estimate, Specification};
use crate::forecast::{ArimaOrder, FitSummary, ForecastSeries, Model, ModelError, SeasonalOrder};

pub const SERIES_NAME: &str = "Predicted Prices";

/// Seasonal ARIMA with exogenous regressors, no constant term.
pub struct SarimaxModel {
    data: Vec<f64>,
    exog: Vec<Vec<f64>>,
    order: ArimaOrder,
    seasonal_order: SeasonalOrder,
    future_dates: Vec<NaiveDate>,
    max_iter: usize,
    estimate: Option<Estimate>,
    predicted: Option<Vec<f64>>,
}

impl SarimaxModel {
    /// `exog` holds one row of regressors per observation in `data`.
    pub fn new(
        data: Vec<f64>,
        exog: Vec<Vec<f64>>,
        order: ArimaOrder,
        seasonal_order: SeasonalOrder,
        future_dates: Vec<NaiveDate>,
    ) -> Self {
        Self {
            data,
            exog,
            order,
            seasonal_order,
            future_dates,
            max_iter: 1000,
            estimate: None,
            predicted: None,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn order(&self) -> (ArimaOrder, SeasonalOrder) {
        (self.order, self.seasonal_order)
    }

    fn specification(&self) -> Specification {
        Specification {
            order: self.order,
            seasonal: self.seasonal_order,
            trend: false,
            k_exog: self.exog.first().map_or(0, |row| row.len()),
        }
    }
}

impl Model for SarimaxModel {
    fn fit(&mut self) -> Result<&FitSummary, ModelError> {
        let estimate = estimation::fit(self.specification(), &self.data, &self.exog, self.max_iter)
            .map_err(|e| match e {
                ModelError::Fit(msg) => ModelError::Fit(format!(
                    "SARIMAX{}x{}: {}",
                    self.order, self.seasonal_order, msg
                )),
                other => other,
            })?;

        self.predicted = None;
        Ok(&self.estimate.insert(estimate).summary)
    }

    fn forecast(&mut self, steps: usize, exog: Option<&[Vec<f64>]>) -> Result<&[f64], ModelError> {
        let estimate = self.estimate.as_ref().ok_or(ModelError::NotFitted)?;
        let k_exog = self.specification().k_exog;

        let future_exog: &[Vec<f64>] = match exog {
            Some(rows) => rows,
            None if k_exog == 0 => &[],
            None => return Err(ModelError::ExogMismatch { expected: steps, got: 0 }),
        };

        let values = estimate.forecast(steps, future_exog)?;
        Ok(self.predicted.insert(values).as_slice())
    }

    fn series(&self) -> Result<ForecastSeries, ModelError> {
        let predicted = self.predicted.as_ref().ok_or(ModelError::NotForecast)?;
        ForecastSeries::new(SERIES_NAME, &self.future_dates, predicted).ok_or_else(|| {
            ModelError::Forecast(format!(
                "{} forecast values for {} future dates",
                predicted.len(),
                self.future_dates.len()
            ))
        })
    }
}
