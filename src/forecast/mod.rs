pub mod arima;
pub(crate) mod estimation;
pub mod optimize;
pub mod pipeline;
pub mod polynomial;
pub mod sarimax;
pub mod series;

pub use arima::ArimaModel;
pub use sarimax::SarimaxModel;
pub use series::ForecastSeries;

/// Non-seasonal (p, d, q) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

/// Seasonal (P, D, Q, s) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn none() -> Self {
        Self { p: 0, d: 0, q: 0, period: 0 }
    }
}

impl From<[usize; 3]> for ArimaOrder {
    fn from([p, d, q]: [usize; 3]) -> Self {
        Self { p, d, q }
    }
}

impl From<[usize; 4]> for SeasonalOrder {
    fn from([p, d, q, period]: [usize; 4]) -> Self {
        Self { p, d, q, period }
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

impl std::fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.period)
    }
}

/// Estimation results reported after a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub params: Vec<(String, f64)>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub nobs: usize,
    pub iterations: usize,
    pub converged: bool,
}

impl std::fmt::Display for FitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self.params
            .iter()
            .map(|(name, value)| format!("{}={:.4}", name, value))
            .collect();
        write!(
            f,
            "[{}] sigma2={:.4} llf={:.2} aic={:.2} nobs={} iterations={}",
            params.join(", "),
            self.sigma2,
            self.log_likelihood,
            self.aic,
            self.nobs,
            self.iterations
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to fit model: {0}")]
    Fit(String),

    #[error("Failed to forecast: {0}")]
    Forecast(String),

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("No forecast available")]
    NotForecast,

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Exogenous data has {got} rows, expected {expected}")]
    ExogMismatch { expected: usize, got: usize },
}

/// Shared interface of the forecasting models.
pub trait Model {
    /// Estimate parameters from the model's historical data.
    fn fit(&mut self) -> Result<&FitSummary, ModelError>;

    /// Forecast `steps` ahead, with future exogenous rows when the model has any.
    fn forecast(&mut self, steps: usize, exog: Option<&[Vec<f64>]>) -> Result<&[f64], ModelError>;

    /// The last forecast indexed by the model's future dates.
    fn series(&self) -> Result<ForecastSeries, ModelError>;
}
