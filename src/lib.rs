//! # geostack-check - Pelias stack smoke validation
//!
//! Runs a fixed, fail-fast sequence of checks against a deployed geocoding
//! stack and reports the first failure, or success if every check passes.
//!
//! ## Stages
//!
//! 1. **Config Validation**: `config/pelias.json` exists, parses, has every
//!    required section and points the importers at the expected files
//! 2. **Dataset Presence**: the OSM extract is visible inside the importer
//!    container
//! 3. **Parsing Validation**: the search API parses a street address
//! 4. **Latency Sampling**: p95 latency over ten sequential searches
//!    (reported, never fails on its own)
//! 5. **Document Count Audit**: the index holds more than 10 000 documents
//! 6. **Custom Data Validation**: records from the custom CSV are searchable
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geostack_check::prelude::*;
//!
//! let settings = HarnessSettings::load(None)?;
//! let http = UreqClient::new(settings.http_timeout);
//! let progress = ProgressReporter::with_callback(|update| {
//!     if let ProgressUpdate::Info { message } = update {
//!         println!("[integration] {message}");
//!     }
//! });
//! let ctx = StageContext::new(&settings, &SystemCommandRunner, &http, &progress);
//!
//! let report = ValidationPipeline::default().run(&ctx);
//! std::process::exit(report.exit_code().into());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: errors, settings and the per-run stage context
//! - [`invoke`]: command and HTTP capabilities, with real implementations
//! - [`validation`]: the stages, the latency statistic and the pipeline
//!
//! Stages only reach the outside world through [`invoke::CommandRunner`]
//! and [`invoke::HttpClient`], so a pipeline can be run against fakes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod invoke;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use geostack_check::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use crate::core::context::StageContext;
    pub use crate::core::error::{HarnessError, HarnessResult};
    pub use crate::core::settings::HarnessSettings;

    // Invocation
    pub use crate::invoke::command::{CommandOutput, CommandRunner, SystemCommandRunner};
    pub use crate::invoke::http::{HttpClient, UreqClient};

    // Validation
    pub use crate::validation::latency::{percentile, LatencySamples};
    pub use crate::validation::pipeline::{RunReport, StageFailure, StageRecord, ValidationPipeline};
    pub use crate::validation::progress::{ProgressCallback, ProgressReporter, ProgressUpdate};
    pub use crate::validation::stages::{
        ConfigValidation, CustomDataValidation, DatasetPresence, DocumentCountAudit,
        LatencySampling, ParsingValidation, ValidationStage,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
