use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Behavior switches for a [`DocumentGraph`](crate::DocumentGraph).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Require both endpoints of a new edge (and the target of a node
    /// replacement) to exist as documents.
    pub verify_edge_endpoints: bool,
    /// Treat bulk edge removal that matches nothing as an error.
    pub strict_edge_cleanup: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            verify_edge_endpoints: true,
            strict_edge_cleanup: false,
        }
    }
}

impl GraphConfig {
    pub fn from_toml_str(text: &str) -> GraphResult<Self> {
        toml::from_str(text).map_err(|e| GraphError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> GraphResult<String> {
        toml::to_string(self).map_err(|e| GraphError::Config(e.to_string()))
    }
}
