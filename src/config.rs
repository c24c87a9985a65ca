//! Middleware configuration from TOML.
//!
//! Each `[[middleware]]` table names one registry entry and the built-in it
//! resolves to. Keys other than `name` and `kind` are options for that
//! built-in:
//!
//! ```toml
//! [[middleware]]
//! name = "logged"
//! kind = "trace"
//!
//! [[middleware]]
//! name = "cors"
//! kind = "set-header"
//! header = "access-control-allow-origin"
//! value = "*"
//! ```
//!
//! Entries keep file order, so the first unresolvable one is the one reported.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::registry::{MiddlewareEntry, MiddlewareRegistry};

/// Top-level configuration document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesConfig {
    #[serde(default)]
    pub middleware: Vec<MiddlewareConfig>,
}

/// One `[[middleware]]` table.
#[derive(Clone, Debug, Deserialize)]
pub struct MiddlewareConfig {
    pub name: String,
    pub kind: String,
    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
}

impl RoutesConfig {
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// Registry entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (String, MiddlewareEntry)> + '_ {
        self.middleware.iter().map(|m| {
            (
                m.name.clone(),
                MiddlewareEntry::builtin_with(m.kind.clone(), m.options.clone()),
            )
        })
    }
}

impl MiddlewareRegistry {
    /// Builds a registry from configuration, resolving each entry in order.
    pub fn from_config(config: &RoutesConfig) -> Result<Self, Error> {
        Self::new(config.entries())
    }
}
