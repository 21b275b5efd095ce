pub mod config;
pub mod date;
pub mod error;
pub mod json;

pub use config::AnalyticsConfig;
pub use error::{AppError, AppResult, ErrorKind};
