//! Buy every observed instrument on the first tick and hold.

use chrono::NaiveDate;
use tracing::{error, info};

use super::{AlgoContext, AlgoState, Lifecycle, Strategy, StrategyProperties};
use crate::domain::error::TrendtraderError;
use crate::domain::order::{Instruction, Signals};
use crate::domain::portfolio::Portfolio;
use crate::domain::tick::Tick;
use crate::ports::order_router::OrderRouter;

pub struct BuyAndHold<R: OrderRouter> {
    lifecycle: Lifecycle,
    router: R,
}

impl<R: OrderRouter> BuyAndHold<R> {
    pub fn new(router: R) -> Self {
        BuyAndHold {
            lifecycle: Lifecycle::new("BuyAndHold"),
            router,
        }
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.state() != AlgoState::Idle
    }

    /// Log a pending user instruction. Order instructions are reported but
    /// not submitted.
    pub fn process_instruction(&self, date: NaiveDate, instruction: Option<&Instruction>) {
        let Some(instruction) = instruction else {
            return;
        };
        info!("Processing user instruction");
        if instruction.is_order() {
            let amount = instruction.amount.unwrap_or_default();
            let asset = instruction.asset.as_deref().unwrap_or("");
            error!("{}: Ordering {} {} stocks", date, amount, asset);
        }
    }
}

impl<R: OrderRouter> Strategy for BuyAndHold<R> {
    fn name(&self) -> &str {
        "BuyAndHold"
    }

    fn initialize(&mut self, _properties: &StrategyProperties) -> Result<(), TrendtraderError> {
        Ok(())
    }

    fn handle_data(
        &mut self,
        tick: &Tick,
        ctx: &mut AlgoContext<'_>,
    ) -> Result<(), TrendtraderError> {
        self.lifecycle.ensure_active()?;

        let instruction = self.router.update(ctx.portfolio(), ctx.date(), false)?;
        self.process_instruction(ctx.date(), instruction.as_ref());

        let mut signals = Signals::new();
        if self.lifecycle.start() {
            for (code, quote) in &tick.quotes {
                signals.insert(code.clone(), quote.price);
            }
        }

        if !signals.is_empty() {
            let order_book = self.router.trade_signals_handler(&signals);
            for (code, quantity) in &order_book {
                info!("{}: Ordering {} {} stocks", ctx.date(), code, quantity);
                ctx.order(code, *quantity);
            }
        }

        Ok(())
    }

    fn stop_trading(&mut self, portfolio: &Portfolio) -> Result<(), TrendtraderError> {
        self.lifecycle.ensure_active()?;
        info!("Trader out of the market");
        self.router.save_portfolio(portfolio)?;
        self.lifecycle.stop()
    }

    fn state(&self) -> AlgoState {
        self.lifecycle.state()
    }
}
