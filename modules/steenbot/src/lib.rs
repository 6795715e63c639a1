//! The polling bot that drives the event pipeline, plus the process wiring.

pub mod bot;
pub mod wiring;

pub use bot::{BotConfig, BotMetrics, BotState, BotStatus, SteenBot};
pub use wiring::{build, Runtime};
