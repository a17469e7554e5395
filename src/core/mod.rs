//! Configuration and error types shared by every component.

pub mod config;
pub mod errors;

pub use config::AssistantConfig;
pub use errors::{AssistantError, AssistantResult};
