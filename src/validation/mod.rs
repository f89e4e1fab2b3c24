//! Validation stages and the fail-fast pipeline that runs them.

pub mod config;
pub mod latency;
pub mod pipeline;
pub mod progress;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use pipeline::{RunReport, StageFailure, StageRecord, ValidationPipeline};
pub use progress::{ProgressCallback, ProgressReporter, ProgressUpdate};
pub use stages::{
    ConfigValidation, CustomDataValidation, DatasetPresence, DocumentCountAudit, LatencySampling,
    ParsingValidation, ValidationStage,
};
