//! Trend estimation port.

use std::collections::BTreeMap;

use crate::domain::ols::TrendFit;
use crate::domain::tick::Tick;
use crate::domain::window::WindowConfig;

pub trait TrendEstimator {
    /// Apply window parameters and discard any accumulated history.
    fn configure(&mut self, config: WindowConfig);

    /// Feed one tick. Returns fresh fits per instrument when a refresh is
    /// due, `None` otherwise.
    fn handle_data(&mut self, tick: &Tick) -> Option<BTreeMap<String, TrendFit>>;
}
