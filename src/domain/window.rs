//! Rolling price window with a refresh cadence.
//!
//! Keeps the trailing `window_length` prices per instrument. Once any
//! instrument's window is full the window emits on that tick and then
//! every `refresh_period` ticks; in between it yields nothing.

use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

use super::tick::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub window_length: usize,
    pub refresh_period: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            window_length: 50,
            refresh_period: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    config: WindowConfig,
    prices: BTreeMap<String, VecDeque<f64>>,
    ticks_since_emit: Option<usize>,
}

impl RollingWindow {
    pub fn new(config: WindowConfig) -> Self {
        RollingWindow {
            config,
            prices: BTreeMap::new(),
            ticks_since_emit: None,
        }
    }

    pub fn config(&self) -> WindowConfig {
        self.config
    }

    /// Number of prices currently held for `code`.
    pub fn depth(&self, code: &str) -> usize {
        self.prices.get(code).map_or(0, VecDeque::len)
    }

    /// Feed one tick. Returns the full windows (oldest price first) when a
    /// refresh is due.
    pub fn push(&mut self, tick: &Tick) -> Option<BTreeMap<String, Vec<f64>>> {
        for (code, quote) in &tick.quotes {
            if !quote.price.is_finite() {
                warn!(code = %code, date = %tick.date, "ignoring non-finite price");
                continue;
            }
            let window = self.prices.entry(code.clone()).or_default();
            window.push_back(quote.price);
            while window.len() > self.config.window_length {
                window.pop_front();
            }
        }

        let full: BTreeMap<String, Vec<f64>> = self
            .prices
            .iter()
            .filter(|(_, w)| w.len() == self.config.window_length)
            .map(|(code, w)| (code.clone(), w.iter().copied().collect()))
            .collect();

        if full.is_empty() {
            return None;
        }

        match self.ticks_since_emit {
            Some(n) if n + 1 < self.config.refresh_period => {
                self.ticks_since_emit = Some(n + 1);
                None
            }
            _ => {
                self.ticks_since_emit = Some(0);
                Some(full)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn tick(day: u32, prices: &[(&str, f64)]) -> Tick {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day as i64);
        prices
            .iter()
            .fold(Tick::new(date), |t, (code, p)| t.with_price(code, *p))
    }

    fn window(window_length: usize, refresh_period: usize) -> RollingWindow {
        RollingWindow::new(WindowConfig {
            window_length,
            refresh_period,
        })
    }

    #[test]
    fn silent_until_full() {
        let mut w = window(3, 1);
        assert!(w.push(&tick(0, &[("BHP", 1.0)])).is_none());
        assert!(w.push(&tick(1, &[("BHP", 2.0)])).is_none());
        let out = w.push(&tick(2, &[("BHP", 3.0)])).unwrap();
        assert_eq!(out["BHP"], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn drops_oldest_beyond_length() {
        let mut w = window(3, 1);
        for (i, p) in [1.0, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
            w.push(&tick(i as u32, &[("BHP", *p)]));
        }
        assert_eq!(w.depth("BHP"), 3);
        let out = w.push(&tick(5, &[("BHP", 6.0)])).unwrap();
        assert_eq!(out["BHP"], vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn refresh_period_spaces_emissions() {
        let mut w = window(2, 3);
        let emitted: Vec<bool> = (0..9)
            .map(|i| w.push(&tick(i, &[("BHP", i as f64 + 1.0)])).is_some())
            .collect();
        // full at tick 1, then every third tick
        assert_eq!(
            emitted,
            vec![false, true, false, false, true, false, false, true, false]
        );
    }

    #[test]
    fn only_full_windows_are_emitted() {
        let mut w = window(2, 1);
        w.push(&tick(0, &[("BHP", 1.0)]));
        let out = w.push(&tick(1, &[("BHP", 2.0), ("CBA", 10.0)])).unwrap();
        assert!(out.contains_key("BHP"));
        assert!(!out.contains_key("CBA"));

        let out = w.push(&tick(2, &[("BHP", 3.0), ("CBA", 11.0)])).unwrap();
        assert_eq!(out["CBA"], vec![10.0, 11.0]);
    }

    #[test]
    fn non_finite_prices_are_skipped() {
        let mut w = window(2, 1);
        w.push(&tick(0, &[("BHP", 1.0)]));
        assert!(w.push(&tick(1, &[("BHP", f64::NAN)])).is_none());
        assert_eq!(w.depth("BHP"), 1);
    }

    proptest! {
        #[test]
        fn window_never_exceeds_length(
            length in 1usize..20,
            prices in proptest::collection::vec(1.0f64..100.0, 0..80),
        ) {
            let mut w = window(length, 1);
            for (i, p) in prices.iter().enumerate() {
                if let Some(out) = w.push(&tick(i as u32, &[("BHP", *p)])) {
                    prop_assert_eq!(out["BHP"].len(), length);
                    prop_assert_eq!(*out["BHP"].last().unwrap(), *p);
                }
                prop_assert!(w.depth("BHP") <= length);
            }
        }
    }
}
