//! Core types shared by every stage.
//!
//! This module contains:
//! - Error types
//! - Harness settings
//! - The stage context and its invocation helpers

pub mod context;
pub mod error;
pub mod settings;

// Re-export commonly used types
pub use context::StageContext;
pub use error::{HarnessError, HarnessResult};
pub use settings::HarnessSettings;
