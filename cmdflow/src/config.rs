//! Configuration for the orchestrator and its logging.

use serde::{Deserialize, Serialize};

use crate::errors::CmdflowError;

/// What to do with a command the administrative interface refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchFailurePolicy {
    /// Record a failed outcome carrying the dispatch error (default).
    ///
    /// Keeps the request live: a stage whose commands were all refused
    /// drains immediately and the pipeline advances.
    #[default]
    RecordFailed,
    /// Log the refusal and keep only the command's tag; no outcome is kept
    /// and the request still ends up failed.
    Drop,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Result code counted as success.
    #[serde(default = "default_success_code")]
    pub success_code: i32,
    /// Handling of commands the interface refuses.
    #[serde(default)]
    pub dispatch_failure: DispatchFailurePolicy,
    /// Result code recorded for refused commands.
    #[serde(default = "default_dispatch_failure_code")]
    pub dispatch_failure_code: i32,
    /// Bound of the async completion channel.
    #[serde(default = "default_channel_capacity")]
    pub completion_channel_capacity: usize,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_success_code() -> i32 {
    0
}

fn default_dispatch_failure_code() -> i32 {
    -5 // -EIO
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            success_code: default_success_code(),
            dispatch_failure: DispatchFailurePolicy::default(),
            dispatch_failure_code: default_dispatch_failure_code(),
            completion_channel_capacity: default_channel_capacity(),
            logging: LoggingConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CmdflowError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies `CMDFLOW_LOG_LEVEL` and `CMDFLOW_LOG_JSON` from the environment.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.logging = self.logging.with_overrides(
            std::env::var("CMDFLOW_LOG_LEVEL").ok(),
            std::env::var("CMDFLOW_LOG_JSON").ok(),
        );
        self
    }

    /// Sets the success code.
    #[must_use]
    pub fn with_success_code(mut self, code: i32) -> Self {
        self.success_code = code;
        self
    }

    /// Sets the dispatch failure policy.
    #[must_use]
    pub fn with_dispatch_failure(mut self, policy: DispatchFailurePolicy) -> Self {
        self.dispatch_failure = policy;
        self
    }

    /// Sets the code recorded for refused commands.
    #[must_use]
    pub fn with_dispatch_failure_code(mut self, code: i32) -> Self {
        self.dispatch_failure_code = code;
        self
    }

    /// Sets the completion channel bound (minimum 1).
    #[must_use]
    pub fn with_completion_channel_capacity(mut self, capacity: usize) -> Self {
        self.completion_channel_capacity = capacity.max(1);
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `cmdflow=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Enables or disables JSON output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn with_overrides(mut self, level: Option<String>, json: Option<String>) -> Self {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(json) = json {
            self.json = matches!(json.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }
}
