//! Trade in the direction of the fitted price trend.
//!
//! Each refresh fits price against time over a trailing window per
//! instrument. A slope of at least +0.4 buys, at most -0.4 sells, sized
//! `50 * slope` either way.

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{AlgoContext, AlgoState, Lifecycle, Strategy, StrategyProperties};
use crate::domain::error::TrendtraderError;
use crate::domain::ols::TrendFit;
use crate::domain::portfolio::Portfolio;
use crate::domain::tick::Tick;
use crate::domain::trend::OlsTrendEstimator;
use crate::domain::window::WindowConfig;
use crate::ports::trend_port::TrendEstimator;

pub const BUY_THRESHOLD: f64 = 0.4;
pub const SELL_THRESHOLD: f64 = -0.4;
pub const ORDER_MULTIPLIER: f64 = 50.0;

pub struct FollowTrend<E: TrendEstimator = OlsTrendEstimator> {
    lifecycle: Lifecycle,
    estimator: E,
    fits: BTreeMap<String, TrendFit>,
    slope: f64,
    buy: bool,
    sell: bool,
}

impl FollowTrend<OlsTrendEstimator> {
    pub fn new() -> Self {
        Self::with_estimator(OlsTrendEstimator::default())
    }
}

impl Default for FollowTrend<OlsTrendEstimator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TrendEstimator> FollowTrend<E> {
    pub fn with_estimator(estimator: E) -> Self {
        FollowTrend {
            lifecycle: Lifecycle::new("FollowTrend"),
            estimator,
            fits: BTreeMap::new(),
            slope: 0.0,
            buy: false,
            sell: false,
        }
    }

    /// Latest fit per instrument.
    pub fn fits(&self) -> &BTreeMap<String, TrendFit> {
        &self.fits
    }

    pub fn fit(&self, code: &str) -> Option<TrendFit> {
        self.fits.get(code).copied()
    }

    /// Slope of the last instrument processed on the most recent refresh.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn buy(&self) -> bool {
        self.buy
    }

    pub fn sell(&self) -> bool {
        self.sell
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    fn record(&self, ctx: &mut AlgoContext<'_>) {
        ctx.record("slope", self.slope);
        ctx.record("buy", self.buy);
        ctx.record("sell", self.sell);
        for (code, fit) in &self.fits {
            ctx.record(&format!("{}.slope", code), fit.slope);
        }
    }
}

impl<E: TrendEstimator> Strategy for FollowTrend<E> {
    fn name(&self) -> &str {
        "FollowTrend"
    }

    fn initialize(&mut self, properties: &StrategyProperties) -> Result<(), TrendtraderError> {
        if properties.refresh_period == 0 {
            return Err(TrendtraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "refresh_period".into(),
                reason: "refresh_period must be at least 1".into(),
            });
        }
        if properties.window_length < 2 {
            return Err(TrendtraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "window_length".into(),
                reason: "window_length must be at least 2".into(),
            });
        }

        self.estimator.configure(WindowConfig {
            window_length: properties.window_length,
            refresh_period: properties.refresh_period,
        });
        self.fits.clear();
        self.slope = 0.0;
        debug!(
            window_length = properties.window_length,
            refresh_period = properties.refresh_period,
            "FollowTrend initialized"
        );
        Ok(())
    }

    fn handle_data(
        &mut self,
        tick: &Tick,
        ctx: &mut AlgoContext<'_>,
    ) -> Result<(), TrendtraderError> {
        self.lifecycle.ensure_active()?;
        self.lifecycle.start();

        self.buy = false;
        self.sell = false;

        let Some(coeffs) = self.estimator.handle_data(tick) else {
            self.record(ctx);
            return Ok(());
        };

        for code in tick.codes() {
            let Some(fit) = coeffs.get(code).copied() else {
                continue;
            };
            self.fits.insert(code.to_string(), fit);
            self.slope = fit.slope;

            if fit.slope >= BUY_THRESHOLD {
                let quantity = fit.slope * ORDER_MULTIPLIER;
                info!("{}: Ordering {} {} stocks", ctx.date(), code, quantity);
                ctx.order(code, quantity);
                self.buy = true;
            }
            if fit.slope <= SELL_THRESHOLD {
                let quantity = fit.slope * ORDER_MULTIPLIER;
                info!("{}: Ordering {} {} stocks", ctx.date(), code, quantity);
                ctx.order(code, quantity);
                self.sell = true;
            }
        }

        self.record(ctx);
        Ok(())
    }

    fn stop_trading(&mut self, _portfolio: &Portfolio) -> Result<(), TrendtraderError> {
        self.lifecycle.stop()?;
        info!("Trader out of the market");
        Ok(())
    }

    fn state(&self) -> AlgoState {
        self.lifecycle.state()
    }
}
