//! Individual validation stages.
//!
//! Each stage checks one contract of the deployed stack and either passes
//! or fails the whole run.

use crate::core::context::{parse_json, StageContext};
use crate::core::error::{HarnessError, HarnessResult};
use crate::validation::config::{validate_config_file, EXPECTED_OSM_FILENAME};
use crate::validation::latency::{round2, LatencySamples, SAMPLE_COUNT};
use serde_json::Value;

/// Compose profile the importer services are declared under.
pub const IMPORT_PROFILE: &str = "import";

/// Service that runs the OSM importer.
pub const OSM_IMPORT_SERVICE: &str = "pelias-osm";

/// Service running the document store.
pub const DOCUMENT_STORE_SERVICE: &str = "elasticsearch";

/// Count endpoint of the search index, as seen from inside its container.
pub const COUNT_URL: &str = "http://localhost:9200/pelias/_count";

/// The index must hold strictly more documents than this.
pub const DOCUMENT_THRESHOLD: u64 = 10_000;

/// Query whose parse must expose a street component.
pub const PARSING_QUERY: &str = "/v1/search?text=Friedrichstrasse+Berlin";

/// Query used for latency sampling.
pub const LATENCY_QUERY: &str = "/v1/search?text=Berlin";

/// Query for the custom CSV record.
pub const CUSTOM_DATA_QUERY: &str = "/v1/search?text=Dynop+Distribution+Center+Berlin";

/// Substring a custom record's name must contain.
pub const CUSTOM_RECORD_MARKER: &str = "Dynop Distribution Center";

/// Trait for validation stages.
pub trait ValidationStage: Send + Sync {
    /// Short stable identifier, used on the command line and in reports.
    fn id(&self) -> &'static str;

    /// Name of this validation stage.
    fn name(&self) -> &str;

    /// Run the check against the live stack.
    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()>;
}

/// Config validation - checks the stack configuration file.
///
/// Verifies, in order:
/// - The file exists and parses as a JSON object
/// - All required sections are present
/// - The OSM and CSV importers point at the expected files
pub struct ConfigValidation;

impl ValidationStage for ConfigValidation {
    fn id(&self) -> &'static str {
        "config"
    }

    fn name(&self) -> &str {
        "Config Validation"
    }

    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()> {
        let path = ctx.settings().config_path();
        ctx.info(format!("Validating Pelias config at {}", path.display()));
        validate_config_file(&path)?;
        ctx.info("pelias.json structure OK");
        Ok(())
    }
}

/// Dataset presence - the OSM extract is visible inside the importer container.
///
/// Runs a one-off `ls` in the importer service without starting its
/// dependencies. A non-zero exit fails the stage; the listing is not read.
pub struct DatasetPresence;

impl ValidationStage for DatasetPresence {
    fn id(&self) -> &'static str {
        "dataset"
    }

    fn name(&self) -> &str {
        "Dataset Presence"
    }

    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()> {
        ctx.info(format!("Checking that the OSM PBF is visible inside {OSM_IMPORT_SERVICE}"));
        ctx.compose(&[
            "--profile",
            IMPORT_PROFILE,
            "run",
            "--rm",
            "--no-deps",
            "-T",
            OSM_IMPORT_SERVICE,
            "ls",
            EXPECTED_OSM_FILENAME,
        ])?;
        Ok(())
    }
}

/// Parsing validation - the API parses a street address.
pub struct ParsingValidation;

impl ValidationStage for ParsingValidation {
    fn id(&self) -> &'static str {
        "parsing"
    }

    fn name(&self) -> &str {
        "Parsing Validation"
    }

    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()> {
        let body = ctx.get_json(PARSING_QUERY)?;
        if !has_parsed_street(&body) {
            return Err(HarnessError::ParsedFieldMissing {
                path: "geocoding.query.parsed_text.street".to_string(),
            });
        }
        ctx.info("Libpostal parsing validated");
        Ok(())
    }
}

/// Latency sampling - reports p95 latency of a simple query.
///
/// Observational only: any measured latency passes, but a failed probe
/// fails the stage.
pub struct LatencySampling;

impl ValidationStage for LatencySampling {
    fn id(&self) -> &'static str {
        "latency"
    }

    fn name(&self) -> &str {
        "Latency Sampling"
    }

    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()> {
        let samples =
            LatencySamples::collect(SAMPLE_COUNT, || ctx.get_json(LATENCY_QUERY).map(drop))?;
        log::debug!("latency samples (ms): {:?}", samples.as_millis());
        if let Some(p95) = samples.p95() {
            ctx.info(latency_line(p95));
        }
        Ok(())
    }
}

/// Document count audit - the index holds a non-trivial corpus.
pub struct DocumentCountAudit;

impl ValidationStage for DocumentCountAudit {
    fn id(&self) -> &'static str {
        "documents"
    }

    fn name(&self) -> &str {
        "Document Count Audit"
    }

    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()> {
        let output = ctx.compose(&["exec", "-T", DOCUMENT_STORE_SERVICE, "curl", "-s", COUNT_URL])?;
        let data = parse_json(COUNT_URL, &output.stdout)?;
        let count = document_count(&data);
        if count <= DOCUMENT_THRESHOLD {
            return Err(HarnessError::InsufficientDocumentCount {
                count,
                threshold: DOCUMENT_THRESHOLD,
            });
        }
        ctx.info(format!("Elasticsearch doc count OK ({count})"));
        Ok(())
    }
}

/// Custom data validation - records from the CSV import are searchable.
pub struct CustomDataValidation;

impl ValidationStage for CustomDataValidation {
    fn id(&self) -> &'static str {
        "custom-data"
    }

    fn name(&self) -> &str {
        "Custom Data Validation"
    }

    fn run(&self, ctx: &StageContext<'_>) -> HarnessResult<()> {
        let body = ctx.get_json(CUSTOM_DATA_QUERY)?;
        let found = feature_names(&body)
            .iter()
            .any(|name| name.contains(CUSTOM_RECORD_MARKER));
        if !found {
            return Err(HarnessError::CustomRecordNotFound {
                expected: CUSTOM_RECORD_MARKER.to_string(),
            });
        }
        ctx.info("Custom CSV entries available via API");
        Ok(())
    }
}

/// Report line for a p95 value, rounded to two decimals and printed the
/// shortest way that keeps a fractional part (`7.0`, `12.35`).
pub fn latency_line(p95_ms: f64) -> String {
    format!("p95 latency: {:?} ms", round2(p95_ms))
}

/// Whether `geocoding.query.parsed_text` carries a `street` key.
pub fn has_parsed_street(body: &Value) -> bool {
    body.pointer("/geocoding/query/parsed_text")
        .and_then(Value::as_object)
        .is_some_and(|parsed| parsed.contains_key("street"))
}

/// `count` field of a count response; absent or non-integer counts are 0.
pub fn document_count(body: &Value) -> u64 {
    body.get("count").and_then(Value::as_u64).unwrap_or(0)
}

/// `properties.name` of every result feature that has one.
pub fn feature_names(body: &Value) -> Vec<&str> {
    body.get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter_map(|feature| feature.pointer("/properties/name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}
