//! Executes API operations against the orchestrator.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

use super::routes::{resolve, Method, Operation};
use crate::commands::{
    osd_command_pipeline, osd_flags_pipeline, osd_update_pipeline, pool_create_pipeline,
    pool_delete_pipeline, pool_update_pipeline, Args,
};
use crate::core::Pipeline;
use crate::errors::CmdflowError;
use crate::orchestrator::Orchestrator;

/// Handles API calls on behalf of a transport layer.
#[derive(Debug, Clone)]
pub struct ApiHandler {
    orchestrator: Arc<Orchestrator>,
}

impl ApiHandler {
    /// Creates a handler over a shared orchestrator.
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Routes and executes a call, rendering failures as `{"error": ...}`.
    #[must_use]
    pub fn handle(&self, method: Method, path: &str, body: Option<&Value>) -> Value {
        let Some((route, params)) = resolve(method, path) else {
            warn!(%method, path, "No route");
            return json!({ "error": format!("No route for {method} {path}") });
        };

        let empty = Value::Object(Args::new());
        match self.execute(route.operation, &params, body.unwrap_or(&empty)) {
            Ok(value) => value,
            Err(err) => {
                error!(%method, path, error = %err, "API call failed");
                json!({ "error": err.to_string() })
            }
        }
    }

    /// Executes an operation with its path parameters and request body.
    pub fn execute(
        &self,
        operation: Operation,
        params: &HashMap<String, String>,
        body: &Value,
    ) -> Result<Value, CmdflowError> {
        match operation {
            Operation::ListRequests => Ok(serde_json::to_value(self.orchestrator.list())?),
            Operation::CleanupRequests => Ok(json!(self.orchestrator.cleanup_finished())),
            Operation::GetRequest => {
                let detail = self.orchestrator.get(param(params, "uuid")?)?;
                Ok(serde_json::to_value(detail)?)
            }
            Operation::CancelRequest => Ok(json!(self.orchestrator.cancel(param(params, "uuid")?))),
            Operation::PatchOsdFlags => self.submit(osd_flags_pipeline(args(body)?)),
            Operation::PatchOsd => {
                let pipeline = osd_update_pipeline(osd_id(params)?, args(body)?)?;
                self.submit(pipeline)
            }
            Operation::RunOsdCommand => {
                let pipeline = osd_command_pipeline(osd_id(params)?, param(params, "command")?)?;
                self.submit(pipeline)
            }
            Operation::CreatePool => self.submit(pool_create_pipeline(args(body)?)?),
            Operation::UpdatePool => {
                self.submit(pool_update_pipeline(param(params, "pool")?, args(body)?)?)
            }
            Operation::DeletePool => self.submit(pool_delete_pipeline(param(params, "pool")?)),
        }
    }

    fn submit(&self, pipeline: Pipeline) -> Result<Value, CmdflowError> {
        Ok(Value::String(self.orchestrator.submit(pipeline)))
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, CmdflowError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| CmdflowError::invalid(format!("Missing path parameter \"{name}\"")))
}

fn osd_id(params: &HashMap<String, String>) -> Result<i64, CmdflowError> {
    let raw = param(params, "osd_id")?;
    raw.parse()
        .map_err(|_| CmdflowError::invalid(format!("Failed to identify the OSD id \"{raw}\"")))
}

fn args(body: &Value) -> Result<&Args, CmdflowError> {
    body.as_object()
        .ok_or_else(|| CmdflowError::invalid("Request body must be a JSON object"))
}
