//! Harness settings.
//!
//! Settings are assembled once at startup from built-in defaults, an
//! optional TOML settings file and environment variables, then passed down
//! to every stage through the [`StageContext`](crate::core::context::StageContext).

use crate::core::error::{HarnessError, HarnessResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default search API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Default orchestration command prefix.
pub const DEFAULT_COMPOSE_COMMAND: &str = "docker compose";

/// Default HTTP timeout for API probes.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Location of the stack configuration, relative to the project root.
pub const CONFIG_RELATIVE_PATH: &str = "config/pelias.json";

/// Environment keys read while assembling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEnv {
    /// Search API base URL.
    BaseUrl,
    /// Orchestration command prefix, split with shell quoting rules.
    ComposeCommand,
    /// Directory the compose project lives in.
    ProjectRoot,
    /// Explicit configuration file path.
    ConfigPath,
    /// HTTP timeout in seconds (positive integer).
    HttpTimeoutSeconds,
    /// Optional TOML settings file.
    SettingsFile,
}

impl SettingsEnv {
    /// All keys applied by [`HarnessSettings::apply_env_with`].
    pub const OVERRIDES: [SettingsEnv; 5] = [
        SettingsEnv::BaseUrl,
        SettingsEnv::ComposeCommand,
        SettingsEnv::ProjectRoot,
        SettingsEnv::ConfigPath,
        SettingsEnv::HttpTimeoutSeconds,
    ];

    /// Returns the environment variable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            SettingsEnv::BaseUrl => "PELIAS_URL",
            SettingsEnv::ComposeCommand => "DOCKER_COMPOSE",
            SettingsEnv::ProjectRoot => "GEOSTACK_PROJECT_ROOT",
            SettingsEnv::ConfigPath => "GEOSTACK_CONFIG",
            SettingsEnv::HttpTimeoutSeconds => "GEOSTACK_HTTP_TIMEOUT_SECS",
            SettingsEnv::SettingsFile => "GEOSTACK_SETTINGS",
        }
    }
}

/// Settings shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Base address of the search API, without a trailing slash.
    pub base_url: String,
    /// Orchestration program followed by its leading arguments.
    pub compose_command: Vec<String>,
    /// Working directory for compose invocations.
    pub project_root: PathBuf,
    /// Explicit configuration path; `None` means `<project_root>/config/pelias.json`.
    pub config_path: Option<PathBuf>,
    /// Timeout applied to every HTTP probe.
    pub http_timeout: Duration,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            compose_command: split_command(DEFAULT_COMPOSE_COMMAND).unwrap_or_default(),
            project_root: PathBuf::from("."),
            config_path: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// On-disk settings file. Every field is optional and overrides the default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    base_url: Option<String>,
    compose_command: Option<String>,
    project_root: Option<PathBuf>,
    config_path: Option<PathBuf>,
    http_timeout_secs: Option<u64>,
}

impl HarnessSettings {
    /// Create settings with built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings: defaults, then the optional file, then the process environment.
    pub fn load(settings_file: Option<&Path>) -> HarnessResult<Self> {
        let mut settings = Self::new();
        let file = match settings_file {
            Some(path) => Some(path.to_path_buf()),
            None => read_env_nonempty(SettingsEnv::SettingsFile.as_str(), read_process_env)?
                .map(PathBuf::from),
        };
        if let Some(path) = file {
            settings.merge_file(&path)?;
        }
        settings.apply_env_with(read_process_env)?;
        Ok(settings)
    }

    /// Merge a TOML settings file over the current values.
    pub fn merge_file(&mut self, path: &Path) -> HarnessResult<()> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            HarnessError::InvalidSettings(format!("cannot read {}: {}", path.display(), err))
        })?;
        self.merge_toml(&text)
            .map_err(|err| HarnessError::InvalidSettings(format!("{}: {}", path.display(), err)))
    }

    /// Merge TOML settings text over the current values.
    pub fn merge_toml(&mut self, text: &str) -> Result<(), String> {
        let file: SettingsFile = toml::from_str(text).map_err(|err| err.to_string())?;
        if let Some(base_url) = file.base_url {
            self.set_base_url(&base_url)?;
        }
        if let Some(command) = file.compose_command {
            self.set_compose_command(&command)?;
        }
        if let Some(root) = file.project_root {
            self.project_root = root;
        }
        if let Some(path) = file.config_path {
            self.config_path = Some(path);
        }
        if let Some(secs) = file.http_timeout_secs {
            if secs == 0 {
                return Err("http_timeout_secs must be greater than zero".to_string());
            }
            self.http_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// The lookup returns `Ok(None)` for unset variables and `Err` for values
    /// that are not valid UTF-8.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> HarnessResult<()>
    where
        F: Fn(&str) -> Result<Option<String>, String>,
    {
        let invalid = HarnessError::InvalidSettings;
        for key in SettingsEnv::OVERRIDES {
            let name = key.as_str();
            let Some(value) = read_env_nonempty(name, &lookup)? else {
                continue;
            };
            match key {
                SettingsEnv::BaseUrl => self.set_base_url(&value).map_err(invalid)?,
                SettingsEnv::ComposeCommand => self
                    .set_compose_command(&value)
                    .map_err(|err| invalid(format!("{name}: {err}")))?,
                SettingsEnv::ProjectRoot => self.project_root = PathBuf::from(value),
                SettingsEnv::ConfigPath => self.config_path = Some(PathBuf::from(value)),
                SettingsEnv::HttpTimeoutSeconds => {
                    self.http_timeout = parse_timeout_seconds(name, &value).map_err(invalid)?
                }
                SettingsEnv::SettingsFile => {}
            }
        }
        Ok(())
    }

    /// Override the configuration file path.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Override the project root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Configuration file the Config Validator reads.
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| self.project_root.join(CONFIG_RELATIVE_PATH))
    }

    /// Full URL for an API endpoint such as `/v1/search?text=Berlin`.
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn set_base_url(&mut self, raw: &str) -> Result<(), String> {
        let trimmed = raw.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(format!("base URL must start with http:// or https://, got {raw:?}"));
        }
        self.base_url = trimmed.to_string();
        Ok(())
    }

    fn set_compose_command(&mut self, raw: &str) -> Result<(), String> {
        let parts = split_command(raw)
            .ok_or_else(|| format!("compose command has unbalanced quotes: {raw:?}"))?;
        if parts.is_empty() {
            return Err("compose command must not be empty".to_string());
        }
        self.compose_command = parts;
        Ok(())
    }
}

/// Split a command prefix such as `docker compose` into program and arguments
/// using shell quoting rules. Returns `None` for unbalanced quotes.
pub fn split_command(raw: &str) -> Option<Vec<String>> {
    shlex::split(raw)
}

fn read_process_env(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

fn read_env_nonempty<F>(name: &str, lookup: F) -> HarnessResult<Option<String>>
where
    F: Fn(&str) -> Result<Option<String>, String>,
{
    match lookup(name).map_err(HarnessError::InvalidSettings)? {
        Some(value) if value.trim().is_empty() => Err(HarnessError::InvalidSettings(format!(
            "{name} must not be empty"
        ))),
        other => Ok(other),
    }
}

fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
