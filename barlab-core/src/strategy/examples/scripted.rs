//! Scripted strategy: replays a fixed list of order actions by bar index.
//!
//! Useful for driving the engine with an exact sequence of order intents.

use crate::domain::{Bar, Intent};
use crate::strategy::{Strategy, StrategyContext, StrategyError};
use std::collections::BTreeMap;

/// One order-entry call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedAction {
    Buy { price: f64, quantity: f64 },
    Sell { price: f64, quantity: f64 },
    Short { price: f64, quantity: f64 },
    Cover { price: f64, quantity: f64 },
    Stop { price: f64, quantity: f64, intent: Intent },
    CancelAll,
    CancelActive,
    CancelStops,
}

#[derive(Debug, Clone, Default)]
pub struct Scripted {
    actions: BTreeMap<usize, Vec<ScriptedAction>>,
    bar_index: usize,
    positions: Vec<f64>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` for the bar at `index` (0-based).
    pub fn at(mut self, index: usize, action: ScriptedAction) -> Self {
        self.actions.entry(index).or_default().push(action);
        self
    }

    /// Position observed on each bar, in bar order.
    pub fn observed_positions(&self) -> &[f64] {
        &self.positions
    }
}

impl Strategy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn on_bar(&mut self, _bar: &Bar, ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        self.positions.push(ctx.position());
        let index = self.bar_index;
        self.bar_index += 1;

        let Some(actions) = self.actions.get(&index) else {
            return Ok(());
        };
        for action in actions {
            match *action {
                ScriptedAction::Buy { price, quantity } => {
                    ctx.buy(price, quantity)?;
                }
                ScriptedAction::Sell { price, quantity } => {
                    ctx.sell(price, quantity)?;
                }
                ScriptedAction::Short { price, quantity } => {
                    ctx.short(price, quantity)?;
                }
                ScriptedAction::Cover { price, quantity } => {
                    ctx.cover(price, quantity)?;
                }
                ScriptedAction::Stop {
                    price,
                    quantity,
                    intent,
                } => {
                    ctx.stop(price, quantity, intent)?;
                }
                ScriptedAction::CancelAll => {
                    ctx.cancel_all();
                }
                ScriptedAction::CancelActive => {
                    ctx.cancel_active();
                }
                ScriptedAction::CancelStops => {
                    ctx.cancel_stops();
                }
            }
        }
        Ok(())
    }
}
