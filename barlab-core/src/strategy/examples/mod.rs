//! Example strategies

pub mod channel_breakout;
pub mod scripted;

pub use channel_breakout::ChannelBreakout;
pub use scripted::{Scripted, ScriptedAction};
