//! Ordinary least squares trend fit over an ordered price window.
//!
//! Prices are regressed on a 1-based time index with a constant term:
//! price[i] = intercept + slope * (i + 1).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFit {
    pub intercept: f64,
    pub slope: f64,
}

/// Fit (intercept, slope). Returns `None` for fewer than two prices or any
/// non-finite price.
pub fn fit_trend(prices: &[f64]) -> Option<TrendFit> {
    let n = prices.len();
    if n < 2 || prices.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let n_f = n as f64;
    let x_mean = (n_f + 1.0) / 2.0;
    let y_mean = prices.iter().sum::<f64>() / n_f;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in prices.iter().enumerate() {
        let dx = (i + 1) as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(TrendFit {
        intercept: y_mean - slope * x_mean,
        slope,
    })
}
