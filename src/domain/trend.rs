//! Rolling-window OLS trend estimator.

use std::collections::BTreeMap;
use tracing::debug;

use super::ols::{fit_trend, TrendFit};
use super::tick::Tick;
use super::window::{RollingWindow, WindowConfig};
use crate::ports::trend_port::TrendEstimator;

/// Fits a linear trend over each instrument's trailing window whenever the
/// window refreshes.
#[derive(Debug, Clone)]
pub struct OlsTrendEstimator {
    window: RollingWindow,
}

impl OlsTrendEstimator {
    pub fn new(config: WindowConfig) -> Self {
        OlsTrendEstimator {
            window: RollingWindow::new(config),
        }
    }

    pub fn config(&self) -> WindowConfig {
        self.window.config()
    }
}

impl Default for OlsTrendEstimator {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

impl TrendEstimator for OlsTrendEstimator {
    fn configure(&mut self, config: WindowConfig) {
        self.window = RollingWindow::new(config);
    }

    fn handle_data(&mut self, tick: &Tick) -> Option<BTreeMap<String, TrendFit>> {
        let windows = self.window.push(tick)?;
        let fits: BTreeMap<String, TrendFit> = windows
            .iter()
            .filter_map(|(code, prices)| fit_trend(prices).map(|fit| (code.clone(), fit)))
            .collect();
        debug!(date = %tick.date, instruments = fits.len(), "trend refreshed");
        if fits.is_empty() { None } else { Some(fits) }
    }
}
