pub mod config;
pub mod error;
pub mod timeout;

pub use config::Config;
pub use error::{Result, SteenBotError};
pub use timeout::with_timeout;
