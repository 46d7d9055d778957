//! Node wiring for the risk parameter engine.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::NodeConfig;
pub use error::{AppError, AppResult};
