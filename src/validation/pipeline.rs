//! Validation pipeline implementation.

use crate::core::context::StageContext;
use crate::core::error::HarnessError;
use crate::validation::progress::ProgressUpdate;
use crate::validation::stages::{
    ConfigValidation, CustomDataValidation, DatasetPresence, DocumentCountAudit, LatencySampling,
    ParsingValidation, ValidationStage,
};
use std::time::Instant;

/// Ordered, fail-fast sequence of validation stages.
///
/// Stages run one at a time in insertion order. The first failure ends the
/// run; no later stage executes and nothing is retried.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self { stages }
    }

    /// Create the full pipeline: config, dataset, parsing, latency,
    /// document count, custom data.
    pub fn default_pipeline() -> Self {
        Self {
            stages: vec![
                Box::new(ConfigValidation),
                Box::new(DatasetPresence),
                Box::new(ParsingValidation),
                Box::new(LatencySampling),
                Box::new(DocumentCountAudit),
                Box::new(CustomDataValidation),
            ],
        }
    }

    /// Create a pipeline that only checks the configuration file.
    pub fn config_only() -> Self {
        Self {
            stages: vec![Box::new(ConfigValidation)],
        }
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// `(id, name)` of every stage, in run order.
    pub fn stages(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.stages.iter().map(|stage| (stage.id(), stage.name()))
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage until one fails.
    pub fn run(&self, ctx: &StageContext<'_>) -> RunReport {
        let start = Instant::now();
        let progress = ctx.progress();
        let total = self.stages.len();
        let mut report = RunReport::new();

        for (index, stage) in self.stages.iter().enumerate() {
            progress.send_update(ProgressUpdate::StageStarted {
                stage_id: stage.id(),
                stage_name: stage.name().to_string(),
                index,
                total,
            });
            log::debug!("stage {}/{}: {}", index + 1, total, stage.name());

            let stage_start = Instant::now();
            let result = stage.run(ctx);
            let duration_ms = stage_start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    progress.send_update(ProgressUpdate::StageCompleted {
                        stage_id: stage.id(),
                        duration_ms,
                    });
                    report.completed.push(StageRecord {
                        stage_id: stage.id(),
                        stage_name: stage.name().to_string(),
                        duration_ms,
                    });
                }
                Err(error) => {
                    log::warn!("{} failed with {}", stage.name(), error.condition());
                    progress.send_update(ProgressUpdate::StageFailed {
                        stage_id: stage.id(),
                        message: error.to_string(),
                    });
                    report.failure = Some(StageFailure {
                        stage_id: stage.id(),
                        stage_name: stage.name().to_string(),
                        error,
                    });
                    report.duration_ms = start.elapsed().as_millis() as u64;
                    return report;
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        progress.send_update(ProgressUpdate::Completed {
            total_duration_ms: report.duration_ms,
            stages_run: report.completed.len(),
        });
        report
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

/// A stage that passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    /// Stage identifier.
    pub stage_id: &'static str,
    /// Stage display name.
    pub stage_name: String,
    /// Time the stage took in milliseconds.
    pub duration_ms: u64,
}

/// The stage that stopped the run, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// Stage identifier.
    pub stage_id: &'static str,
    /// Stage display name.
    pub stage_name: String,
    /// Condition that stopped the run.
    pub error: HarnessError,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Stages that passed, in run order.
    pub completed: Vec<StageRecord>,
    /// The failing stage, if any.
    pub failure: Option<StageFailure>,
    /// Wall-clock time for the whole run in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Create an empty report (success).
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every stage passed.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Process exit code for this outcome: 0 on success, 1 on failure.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// The error that stopped the run.
    pub fn error(&self) -> Option<&HarnessError> {
        self.failure.as_ref().map(|failure| &failure.error)
    }

    /// Single-line failure report for the operator.
    pub fn failure_message(&self) -> Option<String> {
        self.failure.as_ref().map(|failure| failure.error.to_string())
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!(
                "{} stage(s) passed in {}ms",
                self.completed.len(),
                self.duration_ms
            ),
            Some(failure) => format!(
                "{} failed ({}) after {} stage(s) passed",
                failure.stage_name,
                failure.error.condition(),
                self.completed.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HarnessResult;
    use crate::validation::stages::{CUSTOM_DATA_QUERY, PARSING_QUERY};
    use crate::validation::testing::{healthy_config, FakeStack};
    use serde_json::json;

    fn run_default(stack: &FakeStack) -> RunReport {
        let pipeline = ValidationPipeline::default_pipeline();
        stack.with_context(|ctx| pipeline.run(ctx))
    }

    fn failed_stage(report: &RunReport) -> &'static str {
        report.failure.as_ref().unwrap().stage_id
    }

    #[test]
    fn test_stage_order() {
        let pipeline = ValidationPipeline::default();
        let ids: Vec<_> = pipeline.stages().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec!["config", "dataset", "parsing", "latency", "documents", "custom-data"]
        );
    }

    #[test]
    fn test_healthy_stack_passes() {
        let stack = FakeStack::healthy();
        let report = run_default(&stack);

        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.completed.len(), 6);
        assert!(matches!(
            stack.updates().last(),
            Some(ProgressUpdate::Completed { stages_run: 6, .. })
        ));
        assert_eq!(stack.commands().len(), 2);
        // parsing + 10 latency probes + custom data
        assert_eq!(stack.urls().len(), 12);
    }

    #[test]
    fn test_bad_config_stops_before_external_calls() {
        let stack = FakeStack::healthy();
        let mut config = healthy_config();
        config["imports"]["osm"]["filename"] = json!("/osm-data/planet-latest.osm.pbf");
        stack.write_config(&config);

        let report = run_default(&stack);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.error().unwrap().condition(), "ConfigValueMismatch");
        assert!(stack.commands().is_empty());
        assert!(stack.urls().is_empty());
    }

    #[test]
    fn test_missing_config() {
        let stack = FakeStack::healthy();
        stack.remove_config();
        let report = run_default(&stack);
        assert_eq!(report.error().unwrap().condition(), "ConfigMissing");
        assert!(report.completed.is_empty());
    }

    #[test]
    fn test_missing_dataset() {
        let stack = FakeStack::healthy();
        stack.fail_command("pelias-osm", 1, "ls: /osm-data/europe/europe-latest.osm.pbf: No such file or directory");
        let report = run_default(&stack);

        assert_eq!(failed_stage(&report), "dataset");
        assert!(report.failure_message().unwrap().contains("No such file or directory"));
        assert!(stack.urls().is_empty());
    }

    #[test]
    fn test_missing_street_stops_pipeline() {
        let stack = FakeStack::healthy();
        stack.respond(
            PARSING_QUERY,
            json!({ "geocoding": { "query": { "parsed_text": { "city": "berlin" } } } }),
        );
        let report = run_default(&stack);

        assert_eq!(report.error().unwrap().condition(), "ParsedFieldMissing");
        assert_eq!(report.completed.len(), 2);
        // only the parsing probe; latency never ran
        assert_eq!(stack.urls().len(), 1);
        assert_eq!(stack.commands().len(), 1);
    }

    #[test]
    fn test_api_down() {
        let stack = FakeStack::healthy();
        stack.fail_url(PARSING_QUERY, "Connection refused (os error 111)");
        let report = run_default(&stack);
        assert_eq!(report.error().unwrap().condition(), "NetworkError");
        assert_eq!(failed_stage(&report), "parsing");
    }

    #[test]
    fn test_small_index() {
        let stack = FakeStack::healthy();
        stack.count_output(r#"{"count": 8000}"#);
        let report = run_default(&stack);

        assert_eq!(failed_stage(&report), "documents");
        assert_eq!(
            report.failure_message().unwrap(),
            "expected more than 10000 documents, found 8000"
        );
        // custom data probe never issued
        assert!(!stack.urls().iter().any(|url| url.ends_with(CUSTOM_DATA_QUERY)));
    }

    #[test]
    fn test_store_container_down() {
        let stack = FakeStack::healthy();
        stack.fail_command("elasticsearch", 1, "service \"elasticsearch\" is not running");
        let report = run_default(&stack);
        assert_eq!(report.error().unwrap().condition(), "ExternalCommandFailed");
        assert_eq!(failed_stage(&report), "documents");
    }

    #[test]
    fn test_custom_data_missing() {
        let stack = FakeStack::healthy();
        stack.respond(CUSTOM_DATA_QUERY, json!({ "features": [] }));
        let report = run_default(&stack);

        assert_eq!(report.error().unwrap().condition(), "CustomRecordNotFound");
        assert_eq!(report.completed.len(), 5);
        assert!(report.summary().contains("Custom Data Validation failed"));
    }

    #[test]
    fn test_unparseable_response() {
        let stack = FakeStack::healthy();
        stack.respond_raw(CUSTOM_DATA_QUERY, "<html>Bad Gateway</html>");
        let report = run_default(&stack);
        assert_eq!(report.error().unwrap().condition(), "ResponseParseError");
    }

    #[test]
    fn test_failure_event_emitted() {
        let stack = FakeStack::healthy();
        stack.remove_config();
        run_default(&stack);

        let updates = stack.updates();
        assert!(matches!(
            updates.last(),
            Some(ProgressUpdate::StageFailed { stage_id: "config", .. })
        ));
        assert!(!updates
            .iter()
            .any(|update| matches!(update, ProgressUpdate::Completed { .. })));
    }

    struct Always(HarnessResult<()>);

    impl ValidationStage for Always {
        fn id(&self) -> &'static str {
            "always"
        }

        fn name(&self) -> &str {
            "Always"
        }

        fn run(&self, _ctx: &StageContext<'_>) -> HarnessResult<()> {
            self.0.clone()
        }
    }

    #[test]
    fn test_custom_stage_appended() {
        let stack = FakeStack::healthy();
        let mut pipeline = ValidationPipeline::config_only();
        pipeline.add_stage(Box::new(Always(Err(HarnessError::CustomRecordNotFound {
            expected: "Depot".to_string(),
        }))));
        pipeline.add_stage(Box::new(Always(Ok(()))));
        assert_eq!(pipeline.len(), 3);

        let report = stack.with_context(|ctx| pipeline.run(ctx));
        assert_eq!(report.completed.len(), 1);
        assert_eq!(failed_stage(&report), "always");
    }

    #[test]
    fn test_empty_pipeline_succeeds() {
        let stack = FakeStack::healthy();
        let pipeline = ValidationPipeline::new(Vec::new());
        assert!(pipeline.is_empty());
        let report = stack.with_context(|ctx| pipeline.run(ctx));
        assert!(report.is_success());
    }
}
