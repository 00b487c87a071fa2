//! Command payloads and the pipeline shape built from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::CmdflowError;

/// A set of payloads dispatched concurrently.
pub type Stage = Vec<CommandPayload>;

/// Stages executed strictly in order.
pub type Pipeline = Vec<Stage>;

/// An administrative command, as a JSON object with a `prefix` naming the
/// command and any number of arguments.
///
/// The orchestrator never interprets the arguments; it only serializes the
/// payload for the command interface and renders it for observability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandPayload(Map<String, Value>);

impl CommandPayload {
    /// Creates a payload for the given command prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("prefix".to_string(), Value::String(prefix.into()));
        Self(map)
    }

    /// Adds an argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builds a payload from an arbitrary JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, CmdflowError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CmdflowError::invalid(format!(
                "Command payload must be a JSON object, got {other}"
            ))),
        }
    }

    /// Returns the command prefix, if present.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.0.get("prefix").and_then(Value::as_str)
    }

    /// Returns an argument by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serializes the payload to the JSON string sent to the interface.
    pub fn to_json_string(&self) -> Result<String, CmdflowError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Renders the payload as `prefix key=value ...` for humans.
    ///
    /// Arguments are listed in key order; string values are printed bare.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = vec![self.prefix().unwrap_or("<unknown>").to_string()];
        for (key, value) in &self.0 {
            if key == "prefix" {
                continue;
            }
            match value {
                Value::String(s) => out.push(format!("{key}={s}")),
                other => out.push(format!("{key}={other}")),
            }
        }
        out.join(" ")
    }
}

impl fmt::Display for CommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl TryFrom<Value> for CommandPayload {
    type Error = CmdflowError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Parses a pipeline from its JSON form: an array of arrays of objects.
pub fn pipeline_from_value(value: Value) -> Result<Pipeline, CmdflowError> {
    let Value::Array(stages) = value else {
        return Err(CmdflowError::invalid("Pipeline must be a JSON array of stages"));
    };

    stages
        .into_iter()
        .map(|stage| match stage {
            Value::Array(commands) => commands
                .into_iter()
                .map(CommandPayload::from_value)
                .collect::<Result<Stage, _>>(),
            _ => Err(CmdflowError::invalid("Each stage must be a JSON array of commands")),
        })
        .collect()
}
