//! Progress reporting for a validation run.

/// A progress update event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// A stage is about to run.
    StageStarted {
        stage_id: &'static str,
        stage_name: String,
        index: usize,
        total: usize,
    },
    /// An informational line produced by a stage.
    Info { message: String },
    /// A stage passed.
    StageCompleted {
        stage_id: &'static str,
        duration_ms: u64,
    },
    /// A stage failed; no later stage will run.
    StageFailed {
        stage_id: &'static str,
        message: String,
    },
    /// Every stage passed.
    Completed {
        total_duration_ms: u64,
        stages_run: usize,
    },
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Delivers progress updates to an optional callback.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    /// Create a reporter that discards every update.
    pub fn silent() -> Self {
        Self { callback: None }
    }

    /// Create a reporter that forwards updates to `callback`.
    pub fn with_callback<F>(callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Report an informational line.
    pub fn info(&self, message: impl Into<String>) {
        self.send_update(ProgressUpdate::Info {
            message: message.into(),
        });
    }

    /// Send an update to the callback, if any.
    pub fn send_update(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}
