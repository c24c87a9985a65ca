//! Named middleware.
//!
//! A route set is handed a map of names to middleware once, up front, and
//! from then on refers to middleware by name:
//! `routes.middleware("auth", Some(handle))`. The registry is filled at
//! construction and read-only afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::middleware::{self, BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::IntoResponse;

/// The value side of a middleware mapping.
///
/// Typed middleware is callable by construction. A builtin entry names a
/// catalog middleware (`trace`, `set-header`) and is only resolved when the
/// registry is built, which is where an unknown name is rejected.
pub enum MiddlewareEntry {
    Callable(BoxedMiddleware),
    Builtin {
        kind: String,
        options: BTreeMap<String, String>,
    },
}

impl MiddlewareEntry {
    pub fn new(mw: impl Middleware) -> Self {
        Self::Callable(Arc::new(mw))
    }

    /// Shorthand for `MiddlewareEntry::new(middleware::from_fn(f))`.
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        Self::new(middleware::from_fn(f))
    }

    pub fn builtin(kind: impl Into<String>) -> Self {
        Self::Builtin { kind: kind.into(), options: BTreeMap::new() }
    }

    pub fn builtin_with<K, V>(kind: impl Into<String>, options: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Builtin {
            kind: kind.into(),
            options: options.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    fn resolve(self) -> Option<BoxedMiddleware> {
        match self {
            Self::Callable(mw) => Some(mw),
            Self::Builtin { kind, options } => middleware::builtin(&kind, &options),
        }
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::Builtin { kind, options } => f
                .debug_struct("Builtin")
                .field("kind", kind)
                .field("options", options)
                .finish(),
        }
    }
}

/// Name → middleware lookup table.
///
/// Cloning is cheap; clones share one table.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: Arc<HashMap<String, BoxedMiddleware>>,
}

impl MiddlewareRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a registry, resolving entries one at a time in the order given.
    ///
    /// Fails with [`Error::InvalidMiddleware`] on the first entry that does
    /// not resolve to callable middleware. A repeated name replaces the
    /// earlier entry.
    pub fn new<N>(entries: impl IntoIterator<Item = (N, MiddlewareEntry)>) -> Result<Self, Error>
    where
        N: Into<String>,
    {
        let mut table = HashMap::new();
        for (name, entry) in entries {
            let name = name.into();
            let mw = entry
                .resolve()
                .ok_or_else(|| Error::InvalidMiddleware(name.clone()))?;
            debug!(%name, "middleware registered");
            table.insert(name, mw);
        }
        Ok(Self { entries: Arc::new(table) })
    }

    pub fn get(&self, name: &str) -> Option<&BoxedMiddleware> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("names", &self.names())
            .finish()
    }
}
