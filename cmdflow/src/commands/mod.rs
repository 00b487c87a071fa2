//! Builders turning resource updates into command pipelines.
//!
//! These are the translations the API layer performs before submitting:
//! they only shape payloads and validate arguments, and never touch the
//! orchestrator themselves.

mod osd;
mod pool;

pub use osd::{
    osd_command_pipeline, osd_flags_pipeline, osd_update_pipeline, OSD_FLAGS,
    OSD_IMPLEMENTED_COMMANDS,
};
pub use pool::{
    invalid_pool_args, pool_create_pipeline, pool_delete_pipeline, pool_update_pipeline,
    pool_update_stage, POOL_PROPERTIES, POOL_QUOTA_PROPERTIES,
};

use serde_json::Value;

/// JSON arguments of a resource update.
pub type Args = serde_json::Map<String, Value>;

/// Loose truthiness, as request bodies use `0`/`""` and `false` alike.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Renders a value as a bare string (strings unquoted).
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
