//! Statically declared route table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// HTTP-style method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read.
    Get,
    /// Create or run.
    Post,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Operations the API layer can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Status of every request.
    ListRequests,
    /// Remove finished requests.
    CleanupRequests,
    /// Detail of one request.
    GetRequest,
    /// Remove one request.
    CancelRequest,
    /// Set/unset cluster OSD flags.
    PatchOsdFlags,
    /// Change one OSD's state or weight.
    PatchOsd,
    /// Run a maintenance command on one OSD.
    RunOsdCommand,
    /// Create a pool.
    CreatePool,
    /// Update pool properties.
    UpdatePool,
    /// Delete a pool.
    DeletePool,
}

/// One entry of the route table. Path segments written `{name}` capture a
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Method.
    pub method: Method,
    /// Path template.
    pub path: &'static str,
    /// Operation served.
    pub operation: Operation,
}

/// Every route the API layer serves.
pub static ROUTES: &[Route] = &[
    Route { method: Method::Get, path: "/request", operation: Operation::ListRequests },
    Route { method: Method::Delete, path: "/request", operation: Operation::CleanupRequests },
    Route { method: Method::Get, path: "/request/{uuid}", operation: Operation::GetRequest },
    Route { method: Method::Delete, path: "/request/{uuid}", operation: Operation::CancelRequest },
    Route { method: Method::Patch, path: "/config/osd", operation: Operation::PatchOsdFlags },
    Route { method: Method::Patch, path: "/osd/{osd_id}", operation: Operation::PatchOsd },
    Route {
        method: Method::Post,
        path: "/osd/{osd_id}/command/{command}",
        operation: Operation::RunOsdCommand,
    },
    Route { method: Method::Post, path: "/pool", operation: Operation::CreatePool },
    Route { method: Method::Patch, path: "/pool/{pool}", operation: Operation::UpdatePool },
    Route { method: Method::Delete, path: "/pool/{pool}", operation: Operation::DeletePool },
];

impl Route {
    /// Matches a concrete path, returning captured parameters.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let template: Vec<&str> = segments(self.path).collect();
        let actual: Vec<&str> = segments(path).collect();
        if template.len() != actual.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (expected, value) in template.iter().zip(&actual) {
            if let Some(name) = expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                params.insert(name.to_string(), (*value).to_string());
            } else if expected != value {
                return None;
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Resolves a method and concrete path against [`ROUTES`].
#[must_use]
pub fn resolve(method: Method, path: &str) -> Option<(&'static Route, HashMap<String, String>)> {
    ROUTES
        .iter()
        .filter(|route| route.method == method)
        .find_map(|route| route.matches(path).map(|params| (route, params)))
}
