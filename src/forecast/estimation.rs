use nalgebra::{DMatrix, DVector};
use crate::forecast::optimize::Minimizer;
use crate::forecast::polynomial::{constrain_stationary, differencing, filter, lag_polynomial, multiply};
use crate::forecast::{ArimaOrder, FitSummary, ModelError, SeasonalOrder};

/// Model structure shared by ARIMA and SARIMAX.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Specification {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
    /// Constant term in the differenced regression
    pub trend: bool,
    pub k_exog: usize,
}

impl Specification {
    fn k_regression(&self) -> usize {
        usize::from(self.trend) + self.k_exog
    }

    fn k_params(&self) -> usize {
        self.k_regression()
            + self.order.p
            + self.order.q
            + self.seasonal.p
            + self.seasonal.q
    }

    fn ar_degree(&self) -> usize {
        self.order.p + self.seasonal.p * self.seasonal.period
    }

    fn param_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.k_params());
        if self.trend {
            names.push("const".to_string());
        }
        names.extend((1..=self.k_exog).map(|i| format!("x{}", i)));
        names.extend((1..=self.order.p).map(|i| format!("ar.L{}", i)));
        names.extend((1..=self.order.q).map(|i| format!("ma.L{}", i)));
        let s = self.seasonal.period;
        names.extend((1..=self.seasonal.p).map(|i| format!("ar.S.L{}", i * s)));
        names.extend((1..=self.seasonal.q).map(|i| format!("ma.S.L{}", i * s)));
        names
    }

    /// Split an unconstrained parameter vector into regression coefficients
    /// and the expanded AR and MA lag polynomials.
    fn polynomials(&self, params: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let (regression, rest) = params.split_at(self.k_regression());
        let (ar, rest) = rest.split_at(self.order.p);
        let (ma, rest) = rest.split_at(self.order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(self.seasonal.p);

        let regression = regression.to_vec();
        let ar = constrain_stationary(ar);
        let ma: Vec<f64> = constrain_stationary(ma).iter().map(|v| -v).collect();
        let seasonal_ar = constrain_stationary(seasonal_ar);
        let seasonal_ma: Vec<f64> = constrain_stationary(seasonal_ma).iter().map(|v| -v).collect();

        let s = self.seasonal.period.max(1);
        let ar_poly = multiply(&lag_polynomial(&ar, -1.0, 1), &lag_polynomial(&seasonal_ar, -1.0, s));
        let ma_poly = multiply(&lag_polynomial(&ma, 1.0, 1), &lag_polynomial(&seasonal_ma, 1.0, s));

        let mut constrained = regression.clone();
        constrained.extend(ar);
        constrained.extend(ma);
        constrained.extend(seasonal_ar);
        constrained.extend(seasonal_ma);

        (regression, ar_poly, ma_poly, constrained)
    }
}

/// A fitted model: everything needed to extend the series forward.
#[derive(Debug, Clone)]
pub(crate) struct Estimate {
    spec: Specification,
    regression: Vec<f64>,
    ar_poly: Vec<f64>,
    ma_poly: Vec<f64>,
    differencing: Vec<f64>,
    endog: Vec<f64>,
    exog: Vec<Vec<f64>>,
    /// Differenced series net of the regression component
    disturbances: Vec<f64>,
    innovations: Vec<f64>,
    pub summary: FitSummary,
}

struct Design {
    differencing: Vec<f64>,
    /// Differenced endogenous series
    target: Vec<f64>,
    /// Differenced regressors, one row per target point
    regressors: Vec<Vec<f64>>,
}

impl Design {
    fn new(spec: &Specification, endog: &[f64], exog: &[Vec<f64>]) -> Self {
        let differencing = differencing(spec.order.d, spec.seasonal.d, spec.seasonal.period);
        let target = filter(&differencing, endog);

        let columns: Vec<Vec<f64>> = (0..spec.k_exog)
            .map(|j| {
                let column: Vec<f64> = exog.iter().map(|row| row[j]).collect();
                filter(&differencing, &column)
            })
            .collect();

        let regressors = (0..target.len())
            .map(|t| {
                let mut row = Vec::with_capacity(spec.k_regression());
                if spec.trend {
                    row.push(1.0);
                }
                row.extend(columns.iter().map(|c| c[t]));
                row
            })
            .collect();

        Self { differencing, target, regressors }
    }

    fn disturbances(&self, regression: &[f64]) -> Vec<f64> {
        self.target
            .iter()
            .zip(&self.regressors)
            .map(|(w, z)| w - z.iter().zip(regression).map(|(a, b)| a * b).sum::<f64>())
            .collect()
    }
}

/// Innovations by conditional recursion; the first `ar_poly.len() - 1` are zero.
fn innovations(disturbances: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let ar_degree = ar_poly.len() - 1;
    let mut e = vec![0.0; disturbances.len()];

    for t in ar_degree..disturbances.len() {
        let ar_part: f64 = ar_poly
            .iter()
            .enumerate()
            .map(|(k, c)| c * disturbances[t - k])
            .sum();
        let ma_part: f64 = ma_poly
            .iter()
            .enumerate()
            .skip(1)
            .take_while(|(k, _)| *k <= t)
            .map(|(k, c)| c * e[t - k])
            .sum();
        e[t] = ar_part - ma_part;
    }
    e
}

/// Fit by conditional sum of squares.
pub(crate) fn fit(
    spec: Specification,
    endog: &[f64],
    exog: &[Vec<f64>],
    max_iter: usize,
) -> Result<Estimate, ModelError> {
    let seasonal = spec.seasonal;
    if seasonal.period < 2 && (seasonal.p > 0 || seasonal.d > 0 || seasonal.q > 0) {
        return Err(ModelError::Fit(format!(
            "seasonal order {} needs a period of at least 2",
            seasonal
        )));
    }
    if endog.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Fit("endogenous series contains non-finite values".to_string()));
    }
    if spec.k_exog > 0 {
        if exog.len() != endog.len() {
            return Err(ModelError::ExogMismatch { expected: endog.len(), got: exog.len() });
        }
        if exog.iter().any(|row| row.len() != spec.k_exog || row.iter().any(|v| !v.is_finite())) {
            return Err(ModelError::Fit("exogenous rows are ragged or non-finite".to_string()));
        }
    }

    let design = Design::new(&spec, endog, exog);
    let ar_degree = spec.ar_degree();
    let needed = ar_degree + spec.k_params() + 1;
    if design.target.len() < needed {
        return Err(ModelError::InsufficientData {
            needed: needed + design.differencing.len() - 1,
            got: endog.len(),
        });
    }
    let n_eff = (design.target.len() - ar_degree) as f64;

    let objective = |params: &[f64]| -> f64 {
        let (regression, ar_poly, ma_poly, _) = spec.polynomials(params);
        let u = design.disturbances(&regression);
        let e = innovations(&u, &ar_poly, &ma_poly);
        e[ar_degree..].iter().map(|v| v * v).sum::<f64>() / n_eff
    };

    let mut start = least_squares(&design.regressors, &design.target);
    start.resize(spec.k_params(), 0.0);

    // Relative to the objective at the start point
    let start_value = objective(&start);
    let scale = if start_value.is_finite() { start_value.abs().clamp(1.0, 1e12) } else { 1.0 };
    let sd_tolerance = 1e-8 * scale;
    let minimum = Minimizer::new(max_iter)
        .with_sd_tolerance(sd_tolerance)
        .minimize(objective, &start)?;
    if !minimum.value.is_finite() {
        return Err(ModelError::Fit("objective did not reach a finite value".to_string()));
    }

    let (regression, ar_poly, ma_poly, constrained) = spec.polynomials(&minimum.x);
    let disturbances = design.disturbances(&regression);
    let innovations = innovations(&disturbances, &ar_poly, &ma_poly);

    let sigma2 = minimum.value;
    let log_likelihood =
        -0.5 * n_eff * ((2.0 * std::f64::consts::PI * sigma2.max(f64::MIN_POSITIVE)).ln() + 1.0);
    let k = (spec.k_params() + 1) as f64;

    let summary = FitSummary {
        params: spec.param_names().into_iter().zip(constrained).collect(),
        sigma2,
        log_likelihood,
        aic: 2.0 * k - 2.0 * log_likelihood,
        nobs: n_eff as usize,
        iterations: minimum.iterations,
        converged: minimum.converged,
    };

    Ok(Estimate {
        spec,
        regression,
        ar_poly,
        ma_poly,
        differencing: design.differencing,
        endog: endog.to_vec(),
        exog: exog.to_vec(),
        disturbances,
        innovations,
        summary,
    })
}

impl Estimate {
    /// Point forecast `steps` ahead; future innovations are zero.
    pub fn forecast(&self, steps: usize, future_exog: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if self.spec.k_exog > 0 && future_exog.len() != steps {
            return Err(ModelError::ExogMismatch { expected: steps, got: future_exog.len() });
        }
        if future_exog.iter().any(|row| row.len() != self.spec.k_exog) {
            return Err(ModelError::Forecast(format!(
                "expected {} exogenous columns",
                self.spec.k_exog
            )));
        }

        let n = self.endog.len();
        let lags = self.differencing.len() - 1;
        let mut endog = self.endog.clone();
        let mut exog = self.exog.clone();
        exog.extend(future_exog.iter().cloned());
        let mut u = self.disturbances.clone();
        let mut e = self.innovations.clone();

        for h in 0..steps {
            let t = n + h;

            let mut z = Vec::with_capacity(self.regression.len());
            if self.spec.trend {
                z.push(1.0);
            }
            for j in 0..self.spec.k_exog {
                z.push((0..=lags).map(|k| self.differencing[k] * exog[t - k][j]).sum());
            }

            let ar_part: f64 = self.ar_poly
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(k, _)| *k <= u.len())
                .map(|(k, c)| c * u[u.len() - k])
                .sum();
            let ma_part: f64 = self.ma_poly
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(k, _)| *k <= e.len())
                .map(|(k, c)| c * e[e.len() - k])
                .sum();
            let u_next = ma_part - ar_part;
            u.push(u_next);
            e.push(0.0);

            let w = u_next + z.iter().zip(&self.regression).map(|(a, b)| a * b).sum::<f64>();
            let integrated: f64 = (1..=lags).map(|k| self.differencing[k] * endog[t - k]).sum();
            endog.push(w - integrated);
        }

        let forecast = endog.split_off(n);
        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Forecast("forecast produced non-finite values".to_string()));
        }
        Ok(forecast)
    }
}

/// Least-squares start values via SVD; zeros when the solve fails.
fn least_squares(rows: &[Vec<f64>], target: &[f64]) -> Vec<f64> {
    let k = rows.first().map_or(0, |r| r.len());
    if k == 0 {
        return Vec::new();
    }

    let design = DMatrix::from_fn(rows.len(), k, |i, j| rows[i][j]);
    let observed = DVector::from_iterator(rows.len(), target.iter().copied());

    design
        .svd(true, true)
        .solve(&observed, 1e-12)
        .ok()
        .map(|beta| beta.iter().copied().collect::<Vec<f64>>())
        .filter(|beta| beta.iter().all(|v| v.is_finite()))
        .unwrap_or_else(|| vec![0.0; k])
}
