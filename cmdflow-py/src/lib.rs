//! Python bindings for the cmdflow Rust library.
//!
//! The host cluster manager constructs one `Orchestrator`, passing the
//! callable it uses to send commands, and forwards every command-completion
//! notification to `Orchestrator.notify`.

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::sync::Arc;

use cmdflow::api::{ApiHandler, Method};
use cmdflow::config::{LoggingConfig, OrchestratorConfig};
use cmdflow::core::{pipeline_from_value, CommandPayload, CommandTag, CompletionEvent};
use cmdflow::dispatch::CommandInterface;
use cmdflow::errors::{CmdflowError, DispatchError};
use cmdflow::orchestrator::Orchestrator;

/// Command interface backed by a Python callable `send_command(payload_json, tag)`.
struct PyCommandInterface {
    send_command: PyObject,
}

impl CommandInterface for PyCommandInterface {
    fn submit_command(&self, payload: &CommandPayload, tag: &CommandTag) -> Result<(), DispatchError> {
        let json = payload
            .to_json_string()
            .map_err(|e| DispatchError::rejected(tag.as_str(), e.to_string()))?;

        Python::with_gil(|py| {
            self.send_command
                .call1(py, (json, tag.as_str()))
                .map(|_| ())
                .map_err(|e| DispatchError::rejected(tag.as_str(), e.to_string()))
        })
    }
}

/// Python wrapper for the orchestrator.
///
/// Every call releases the GIL while it holds orchestrator locks, since
/// dispatch re-acquires the GIL to call `send_command`.
#[pyclass(name = "Orchestrator")]
pub struct PyOrchestrator {
    inner: Arc<Orchestrator>,
    api: ApiHandler,
}

#[pymethods]
impl PyOrchestrator {
    /// Creates an orchestrator sending commands through `send_command`.
    #[new]
    #[pyo3(signature = (send_command, config_json=None))]
    fn new(send_command: PyObject, config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => OrchestratorConfig::from_json_str(json).map_err(to_py_err)?,
            None => OrchestratorConfig::default(),
        }
        .with_env_overrides();

        let inner = Arc::new(Orchestrator::new(
            Arc::new(PyCommandInterface { send_command }),
            config,
        ));
        Ok(Self {
            api: ApiHandler::new(inner.clone()),
            inner,
        })
    }

    /// Submits a pipeline (list of lists of dicts); returns the request id.
    fn submit(&self, py: Python<'_>, pipeline: &Bound<'_, PyAny>) -> PyResult<String> {
        let pipeline = pipeline_from_value(py_to_json(pipeline)?).map_err(to_py_err)?;
        let inner = self.inner.clone();
        Ok(py.allow_threads(move || inner.submit(pipeline)))
    }

    /// Delivers a command completion. Returns False if the tag was dropped.
    #[pyo3(signature = (tag, code, outs=String::new(), outb=Vec::new()))]
    fn notify(&self, py: Python<'_>, tag: String, code: i32, outs: String, outb: Vec<u8>) -> bool {
        let event = CompletionEvent::new(tag, code).with_outs(outs).with_outb(outb);
        let inner = self.inner.clone();
        py.allow_threads(move || inner.notify(event).is_ok())
    }

    /// Returns the detail of one request as a dict.
    fn get(&self, py: Python<'_>, uuid: &str) -> PyResult<PyObject> {
        let inner = self.inner.clone();
        let uuid = uuid.to_string();
        let detail = py
            .allow_threads(move || inner.get(&uuid))
            .map_err(|e| PyKeyError::new_err(e.to_string()))?;
        let value = serde_json::to_value(detail).map_err(|e| to_py_err(e.into()))?;
        json_to_py(py, &value)
    }

    /// Returns a dict of request id to status.
    fn list(&self, py: Python<'_>) -> PyResult<PyObject> {
        let inner = self.inner.clone();
        let statuses = py.allow_threads(move || inner.list());
        let dict = PyDict::new_bound(py);
        for (id, status) in statuses {
            dict.set_item(id, status.to_string())?;
        }
        Ok(dict.into_py(py))
    }

    /// Removes finished requests; returns how many were removed.
    fn cleanup_finished(&self, py: Python<'_>) -> usize {
        let inner = self.inner.clone();
        py.allow_threads(move || inner.cleanup_finished())
    }

    /// Removes a request regardless of state.
    fn cancel(&self, py: Python<'_>, uuid: &str) -> bool {
        let inner = self.inner.clone();
        let uuid = uuid.to_string();
        py.allow_threads(move || inner.cancel(&uuid))
    }

    /// Serves one API call, e.g. `handle("PATCH", "/config/osd", {"noout": True})`.
    #[pyo3(signature = (method, path, body=None))]
    fn handle(
        &self,
        py: Python<'_>,
        method: &str,
        path: &str,
        body: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<PyObject> {
        let method = parse_method(method)?;
        let body = body.map(py_to_json).transpose()?;
        let api = self.api.clone();
        let path = path.to_string();
        let response = py.allow_threads(move || api.handle(method, &path, body.as_ref()));
        json_to_py(py, &response)
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        let inner = self.inner.clone();
        let requests = py.allow_threads(move || inner.list().len());
        format!("Orchestrator(requests={requests})")
    }
}

/// Installs the cmdflow tracing subscriber. Returns False if another was set.
#[pyfunction]
#[pyo3(signature = (level="info", json=false))]
fn init_logging(level: &str, json: bool) -> bool {
    cmdflow::observability::init_logging(&LoggingConfig::default().with_level(level).with_json(json))
}

fn parse_method(method: &str) -> PyResult<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::Get),
        "POST" => Ok(Method::Post),
        "PATCH" => Ok(Method::Patch),
        "DELETE" => Ok(Method::Delete),
        other => Err(PyValueError::new_err(format!("Unsupported method '{other}'"))),
    }
}

fn to_py_err(err: CmdflowError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<serde_json::Value> {
    if obj.is_none() {
        return Ok(serde_json::Value::Null);
    }

    if let Ok(b) = obj.extract::<bool>() {
        return Ok(serde_json::Value::Bool(b));
    }

    if let Ok(i) = obj.extract::<i64>() {
        return Ok(serde_json::Value::Number(i.into()));
    }

    if let Ok(f) = obj.extract::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Ok(serde_json::Value::Number(n));
        }
    }

    if let Ok(s) = obj.extract::<String>() {
        return Ok(serde_json::Value::String(s));
    }

    if let Ok(list) = obj.downcast::<PyList>() {
        let mut arr = Vec::new();
        for item in list.iter() {
            arr.push(py_to_json(&item)?);
        }
        return Ok(serde_json::Value::Array(arr));
    }

    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut map = serde_json::Map::new();
        for (key, value) in dict.iter() {
            let key_str: String = key.extract()?;
            map.insert(key_str, py_to_json(&value)?);
        }
        return Ok(serde_json::Value::Object(map));
    }

    // Fallback: convert to string representation
    Ok(serde_json::Value::String(obj.str()?.to_string()))
}

fn json_to_py(py: Python<'_>, value: &serde_json::Value) -> PyResult<PyObject> {
    Ok(match value {
        serde_json::Value::Null => py.None(),
        serde_json::Value::Bool(b) => b.into_py(py),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_py(py)
            } else if let Some(f) = n.as_f64() {
                f.into_py(py)
            } else {
                py.None()
            }
        }
        serde_json::Value::String(s) => s.into_py(py),
        serde_json::Value::Array(arr) => {
            let items = arr
                .iter()
                .map(|v| json_to_py(py, v))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new_bound(py, items).into_py(py)
        }
        serde_json::Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (k, v) in map {
                dict.set_item(k, json_to_py(py, v)?)?;
            }
            dict.into_py(py)
        }
    })
}

/// The cmdflow Python module.
#[pymodule]
fn cmdflow_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyOrchestrator>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Add version info
    m.add("__version__", "0.1.0")?;
    m.add("__rust_version__", env!("CARGO_PKG_VERSION"))?;

    tracing::debug!("cmdflow_py module initialized");
    Ok(())
}
