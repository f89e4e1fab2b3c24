//! Scripted stand-in for a live stack, shared by stage and pipeline tests.

use crate::core::context::StageContext;
use crate::core::error::{HarnessError, HarnessResult};
use crate::core::settings::HarnessSettings;
use crate::invoke::command::{command_line, CommandOutput, CommandRunner};
use crate::invoke::http::HttpClient;
use crate::validation::config::{EXPECTED_CSV_FILENAME, EXPECTED_OSM_FILENAME};
use crate::validation::progress::{ProgressReporter, ProgressUpdate};
use crate::validation::stages::{CUSTOM_DATA_QUERY, LATENCY_QUERY, PARSING_QUERY};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub(crate) struct FakeStack {
    _root: tempfile::TempDir,
    pub(crate) settings: HarnessSettings,
    responses: RefCell<HashMap<String, Result<String, String>>>,
    command_failures: RefCell<Vec<(String, CommandOutput)>>,
    count_stdout: RefCell<String>,
    commands: RefCell<Vec<String>>,
    urls: RefCell<Vec<String>>,
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

impl FakeStack {
    /// A stack where every contract holds.
    pub(crate) fn healthy() -> Self {
        let root = tempfile::tempdir().unwrap();
        let settings = HarnessSettings::new().with_project_root(root.path());
        let stack = Self {
            _root: root,
            settings,
            responses: RefCell::new(HashMap::new()),
            command_failures: RefCell::new(Vec::new()),
            count_stdout: RefCell::new(r#"{"count":15000,"_shards":{"total":1}}"#.to_string()),
            commands: RefCell::new(Vec::new()),
            urls: RefCell::new(Vec::new()),
            updates: Arc::new(Mutex::new(Vec::new())),
        };
        stack.write_config(&healthy_config());
        stack.respond(
            PARSING_QUERY,
            json!({
                "geocoding": { "query": { "text": "Friedrichstrasse Berlin",
                    "parsed_text": { "street": "friedrichstrasse", "city": "berlin" } } },
                "features": []
            }),
        );
        stack.respond(
            LATENCY_QUERY,
            json!({ "features": [ { "properties": { "name": "Berlin" } } ] }),
        );
        stack.respond(
            CUSTOM_DATA_QUERY,
            json!({ "features": [ { "properties": { "name": "Dynop Distribution Center Berlin (East)" } } ] }),
        );
        stack
    }

    pub(crate) fn write_config(&self, config: &Value) {
        let path = self.settings.config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, config.to_string()).unwrap();
    }

    pub(crate) fn remove_config(&self) {
        std::fs::remove_file(self.settings.config_path()).unwrap();
    }

    pub(crate) fn respond(&self, endpoint: &str, body: Value) {
        self.respond_raw(endpoint, &body.to_string());
    }

    pub(crate) fn respond_raw(&self, endpoint: &str, body: &str) {
        self.responses
            .borrow_mut()
            .insert(self.settings.api_url(endpoint), Ok(body.to_string()));
    }

    pub(crate) fn fail_url(&self, endpoint: &str, detail: &str) {
        self.responses
            .borrow_mut()
            .insert(self.settings.api_url(endpoint), Err(detail.to_string()));
    }

    /// Make every command line containing `needle` exit with `status`.
    pub(crate) fn fail_command(&self, needle: &str, status: i32, stderr: &str) {
        self.command_failures
            .borrow_mut()
            .push((needle.to_string(), CommandOutput::failure(status, stderr)));
    }

    pub(crate) fn count_output(&self, stdout: &str) {
        *self.count_stdout.borrow_mut() = stdout.to_string();
    }

    pub(crate) fn with_context<R>(&self, f: impl FnOnce(&StageContext<'_>) -> R) -> R {
        let sink = Arc::clone(&self.updates);
        let progress = ProgressReporter::with_callback(move |update| {
            sink.lock().unwrap().push(update);
        });
        let ctx = StageContext::new(&self.settings, self, self, &progress);
        f(&ctx)
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.borrow().clone()
    }

    pub(crate) fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn info_lines(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter_map(|update| match update {
                ProgressUpdate::Info { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl CommandRunner for FakeStack {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> HarnessResult<CommandOutput> {
        assert_eq!(cwd, self.settings.project_root.as_path());
        let line = command_line(program, args);
        self.commands.borrow_mut().push(line.clone());

        if let Some((_, output)) = self
            .command_failures
            .borrow()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
        {
            return Ok(output.clone());
        }
        if line.contains("_count") {
            return Ok(CommandOutput::success(self.count_stdout.borrow().clone()));
        }
        Ok(CommandOutput::success(""))
    }
}

impl HttpClient for FakeStack {
    fn get_text(&self, url: &str) -> HarnessResult<String> {
        self.urls.borrow_mut().push(url.to_string());
        match self.responses.borrow().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(detail)) => Err(HarnessError::Network {
                url: url.to_string(),
                detail: detail.clone(),
            }),
            None => Err(HarnessError::Network {
                url: url.to_string(),
                detail: "HTTP status 404".to_string(),
            }),
        }
    }
}

pub(crate) fn healthy_config() -> Value {
    json!({
        "api": { "textAnalyzer": "libpostal", "services": { "placeholder": { "url": "http://placeholder:4100" } } },
        "imports": {
            "osm": { "datapath": "/osm-data", "filename": EXPECTED_OSM_FILENAME },
            "csv": { "datapath": "/data", "filename": EXPECTED_CSV_FILENAME }
        },
        "elasticsearch": { "settings": { "index": { "number_of_shards": 1 } } },
        "interpolation": { "client": { "adapter": "http", "host": "http://interpolation:4300" } },
        "placeholder": { "url": "http://placeholder:4100" }
    })
}
