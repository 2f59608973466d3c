//! Channel breakout on aggregated windows.
//!
//! Base bars are folded into `window`-minute bars. Each completed window
//! re-arms stop orders at its extremes: entry stops on both sides while flat,
//! a single protective stop on the far side while holding.

use crate::data::BarAggregator;
use crate::domain::{Bar, Intent};
use crate::strategy::{count_param, param, Params, Strategy, StrategyContext, StrategyError};

pub struct ChannelBreakout {
    quantity: f64,
    aggregator: BarAggregator,
    windows: usize,
}

impl ChannelBreakout {
    pub const NAME: &'static str = "channel_breakout";

    pub fn new(window_minutes: u32, quantity: f64) -> Result<Self, StrategyError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(StrategyError::InvalidParam {
                name: "quantity".into(),
                reason: format!("expected a positive number, got {quantity}"),
            });
        }
        Ok(Self {
            quantity,
            aggregator: BarAggregator::minutes(window_minutes)?,
            windows: 0,
        })
    }

    /// Build from `window` (minutes) and `quantity` parameters.
    pub fn from_params(params: &Params) -> Result<Self, StrategyError> {
        Self::new(count_param(params, "window")?, param(params, "quantity")?)
    }

    /// Completed windows seen so far.
    pub fn windows(&self) -> usize {
        self.windows
    }
}

impl Strategy for ChannelBreakout {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        let Some(window) = self.aggregator.update(bar)? else {
            return Ok(());
        };
        self.windows += 1;
        ctx.record("channel_high", window.high);
        ctx.record("channel_low", window.low);

        ctx.cancel_stops();
        let position = ctx.position();
        if position > 0.0 {
            ctx.stop(window.low, position, Intent::CloseLong)?;
        } else if position < 0.0 {
            ctx.stop(window.high, -position, Intent::CloseShort)?;
        } else {
            ctx.stop(window.high, self.quantity, Intent::OpenLong)?;
            ctx.stop(window.low, self.quantity, Intent::OpenShort)?;
        }
        Ok(())
    }
}
