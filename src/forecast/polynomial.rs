//! Lag polynomials. A polynomial is stored by ascending power of the lag
//! operator `L`, with `poly[0] == 1.0`.

pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c1 L^step + c2 L^(2 step) + ...)`
pub fn lag_polynomial(coefs: &[f64], sign: f64, step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// `(1 - L)^d (1 - L^s)^D`
pub fn differencing(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// Apply `poly` to `series`; the output drops the first `poly.len() - 1` points.
pub fn filter(poly: &[f64], series: &[f64]) -> Vec<f64> {
    let lags = poly.len().saturating_sub(1);
    if series.len() <= lags {
        return Vec::new();
    }

    (lags..series.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * series[t - k]).sum())
        .collect()
}

/// Map unconstrained reals to the coefficients of a stationary AR polynomial
/// `1 - phi_1 L - ... - phi_n L^n` (Monahan's partial autocorrelation transform).
///
/// Negate the result to get an invertible MA polynomial `1 + theta_1 L + ...`.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let n = unconstrained.len();
    if n == 0 {
        return Vec::new();
    }

    let r: Vec<f64> = unconstrained
        .iter()
        .map(|x| x / (1.0 + x * x).sqrt())
        .collect();

    let mut y = vec![vec![0.0; n]; n];
    for k in 0..n {
        for i in 0..k {
            y[k][i] = y[k - 1][i] + r[k] * y[k - 1][k - i - 1];
        }
        y[k][k] = r[k];
    }

    y[n - 1].iter().map(|v| -v).collect()
}
