//! Holdings per instrument.

/// Signed share count in one instrument with its average entry price.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub code: String,
    pub quantity: i64,
    pub average_price: f64,
}

impl Holding {
    /// Signed value at `price`: shorts contribute negatively.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.average_price)
    }

    /// Apply a signed fill and return the PnL realised by the part of the
    /// fill that reduces the existing exposure.
    ///
    /// Adding to a position averages the entry price; crossing through zero
    /// opens the remainder at the fill price.
    pub fn apply_fill(&mut self, quantity: i64, price: f64) -> f64 {
        if quantity == 0 {
            return 0.0;
        }

        let same_direction = self.quantity == 0 || (self.quantity > 0) == (quantity > 0);
        if same_direction {
            let total = self.quantity + quantity;
            self.average_price = (self.quantity as f64 * self.average_price
                + quantity as f64 * price)
                / total as f64;
            self.quantity = total;
            return 0.0;
        }

        let closing = quantity.abs().min(self.quantity.abs());
        let direction = self.quantity.signum();
        let realized = closing as f64 * direction as f64 * (price - self.average_price);

        self.quantity += quantity;
        if self.quantity == 0 {
            self.average_price = 0.0;
        } else if self.quantity.signum() != direction {
            self.average_price = price;
        }

        realized
    }
}
