//! Structural checks for the stack configuration document.
//!
//! Checks run in a fixed order and stop at the first violation:
//! existence, parseability, section completeness, OSM path, CSV path.

use crate::core::error::{HarnessError, HarnessResult};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path;

/// Top-level sections every configuration must carry.
pub const REQUIRED_SECTIONS: [&str; 5] = ["api", "imports", "elasticsearch", "interpolation", "placeholder"];

/// Dataset the OSM importer must be pointed at.
pub const EXPECTED_OSM_FILENAME: &str = "/osm-data/europe/europe-latest.osm.pbf";

/// File the CSV importer must be pointed at.
pub const EXPECTED_CSV_FILENAME: &str = "/data/custom.csv";

/// Read and parse the configuration document at `path`.
pub fn load_document(path: &Path) -> HarnessResult<Map<String, Value>> {
    let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => HarnessError::ConfigMissing {
            path: path.to_path_buf(),
        },
        _ => HarnessError::ConfigMalformed {
            path: path.to_path_buf(),
            detail: err.to_string(),
        },
    })?;

    let malformed = |detail: String| HarnessError::ConfigMalformed {
        path: path.to_path_buf(),
        detail,
    };
    let value: Value = serde_json::from_str(&text).map_err(|err| malformed(err.to_string()))?;
    match value {
        Value::Object(document) => Ok(document),
        _ => Err(malformed("top-level value must be an object".to_string())),
    }
}

/// Required sections absent from `document`, in declaration order.
pub fn missing_sections(document: &Map<String, Value>) -> Vec<String> {
    REQUIRED_SECTIONS
        .iter()
        .filter(|section| !document.contains_key(**section))
        .map(|section| section.to_string())
        .collect()
}

/// Check a parsed document: sections first, then the two import paths.
pub fn check_document(document: &Map<String, Value>) -> HarnessResult<()> {
    let missing = missing_sections(document);
    if !missing.is_empty() {
        return Err(HarnessError::ConfigIncomplete { missing });
    }
    check_import_filename(document, "osm", EXPECTED_OSM_FILENAME)?;
    check_import_filename(document, "csv", EXPECTED_CSV_FILENAME)
}

/// Load and fully check the configuration at `path`.
pub fn validate_config_file(path: &Path) -> HarnessResult<()> {
    let document = load_document(path)?;
    check_document(&document)
}

fn check_import_filename(
    document: &Map<String, Value>,
    importer: &str,
    expected: &str,
) -> HarnessResult<()> {
    let actual = document
        .get("imports")
        .and_then(|imports| imports.get(importer))
        .and_then(|section| section.get("filename"));

    if actual.and_then(Value::as_str) == Some(expected) {
        return Ok(());
    }
    Err(HarnessError::ConfigValueMismatch {
        field: format!("imports.{importer}.filename"),
        expected: expected.to_string(),
        actual: actual.map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    })
}
