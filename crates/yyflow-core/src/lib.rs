//! # yyflow-core
//!
//! Shared building blocks for the yyflow workflow controller:
//! error taxonomy, TOML configuration, device/execution data model,
//! and the collaborator traits the host application implements.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::YyFlowConfig;
pub use error::{Result, YyFlowError};
