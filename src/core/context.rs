//! Context handed to every validation stage.
//!
//! Besides giving access to settings, the context owns the two shared
//! invocation helpers: compose commands and JSON API probes. Both announce
//! themselves on the progress stream before doing any work.

use crate::core::error::{HarnessError, HarnessResult};
use crate::core::settings::HarnessSettings;
use crate::invoke::command::{command_line, CommandOutput, CommandRunner};
use crate::invoke::http::HttpClient;
use crate::validation::progress::ProgressReporter;
use serde_json::Value;

/// Everything a stage may touch during a run.
pub struct StageContext<'a> {
    settings: &'a HarnessSettings,
    commands: &'a dyn CommandRunner,
    http: &'a dyn HttpClient,
    progress: &'a ProgressReporter,
}

impl<'a> StageContext<'a> {
    /// Create a new stage context.
    pub fn new(
        settings: &'a HarnessSettings,
        commands: &'a dyn CommandRunner,
        http: &'a dyn HttpClient,
        progress: &'a ProgressReporter,
    ) -> Self {
        Self {
            settings,
            commands,
            http,
            progress,
        }
    }

    /// Settings for this run.
    pub fn settings(&self) -> &HarnessSettings {
        self.settings
    }

    /// Progress reporter for this run.
    pub fn progress(&self) -> &ProgressReporter {
        self.progress
    }

    /// Report an informational line.
    pub fn info(&self, message: impl Into<String>) {
        self.progress.info(message);
    }

    /// Run the compose command prefix extended with `args` in the project root.
    ///
    /// A non-zero exit becomes [`HarnessError::ExternalCommandFailed`] carrying
    /// the captured stderr.
    pub fn compose(&self, args: &[&str]) -> HarnessResult<CommandOutput> {
        let (program, prefix) = self
            .settings
            .compose_command
            .split_first()
            .ok_or_else(|| HarnessError::InvalidSettings("compose command is empty".to_string()))?;
        let full_args: Vec<String> = prefix
            .iter()
            .cloned()
            .chain(args.iter().map(|arg| arg.to_string()))
            .collect();
        let line = command_line(program, &full_args);
        self.info(format!("Running: {line}"));

        let output = self
            .commands
            .run(program, &full_args, &self.settings.project_root)?;
        if !output.is_success() {
            log::warn!("{} failed: {:?}", line, output.status);
            return Err(HarnessError::ExternalCommandFailed {
                command: line,
                detail: output.failure_detail(),
            });
        }
        Ok(output)
    }

    /// GET an API endpoint relative to the base URL and parse the body as JSON.
    pub fn get_json(&self, endpoint: &str) -> HarnessResult<Value> {
        let url = self.settings.api_url(endpoint);
        self.info(format!("HTTP GET {url}"));
        let body = self.http.get_text(&url)?;
        parse_json(&url, &body)
    }
}

/// Parse `text` as JSON, naming `source_name` in the error.
pub fn parse_json(source_name: &str, text: &str) -> HarnessResult<Value> {
    serde_json::from_str(text).map_err(|err| HarnessError::ResponseParse {
        source_name: source_name.to_string(),
        detail: err.to_string(),
    })
}
