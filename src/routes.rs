//! Route sets: grouped route declarations with named middleware.
//!
//! An application splits its routes into sets, one type per area, each
//! implementing [`RouteDefinition`]. A [`RouteSet`] pairs a definition with
//! the middleware it may refer to by name, and [`RouteSet::init`] runs every
//! set against one shared [`Router`].
//!
//! ```rust
//! use routeset::{Error, MiddlewareEntry, Request, RouteDefinition, RouteSet, Router, Routes};
//!
//! struct Users;
//!
//! impl RouteDefinition for Users {
//!     fn define(&self, routes: &mut Routes<'_>) -> Result<(), Error> {
//!         let users = routes.group("/users", |users| {
//!             users.get("/{id}", show)?;
//!             users.post("", create)?;
//!             Ok(())
//!         })?;
//!         routes.middleware("logged", Some(users))?;
//!         Ok(())
//!     }
//! }
//!
//! async fn show(req: Request) -> String { req.param("id").unwrap_or("").to_owned() }
//! async fn create(_: Request) -> &'static str { "created" }
//!
//! # fn main() -> Result<(), Error> {
//! let users = RouteSet::new(Users, [("logged", MiddlewareEntry::builtin("trace"))])?;
//! let mut router = Router::new();
//! RouteSet::init(&mut router, [users])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::error::Error;
use crate::handler::{self, Handler};
use crate::method::Method;
use crate::registry::{MiddlewareEntry, MiddlewareRegistry};
use crate::router::{Attach, GroupHandle, RouteHandle, Router};

/// The route declarations of one area of an application.
pub trait RouteDefinition: Send + Sync {
    /// Registers this set's routes. Runs once, at startup.
    fn define(&self, routes: &mut Routes<'_>) -> Result<(), Error>;
}

/// A definition plus the named middleware it may apply.
pub struct RouteSet {
    definition: Box<dyn RouteDefinition>,
    registry: MiddlewareRegistry,
}

impl RouteSet {
    /// Pairs `definition` with named middleware.
    ///
    /// Entries are resolved eagerly in the order given; the first one that is
    /// not callable fails with [`Error::InvalidMiddleware`] and no routes are
    /// declared.
    pub fn new<D, N>(
        definition: D,
        middleware: impl IntoIterator<Item = (N, MiddlewareEntry)>,
    ) -> Result<Self, Error>
    where
        D: RouteDefinition + 'static,
        N: Into<String>,
    {
        Ok(Self::with_registry(definition, MiddlewareRegistry::new(middleware)?))
    }

    /// A set with no named middleware.
    pub fn plain(definition: impl RouteDefinition + 'static) -> Self {
        Self::with_registry(definition, MiddlewareRegistry::empty())
    }

    /// A set sharing an already built registry, e.g. one loaded from config.
    pub fn with_registry(definition: impl RouteDefinition + 'static, registry: MiddlewareRegistry) -> Self {
        Self { definition: Box::new(definition), registry }
    }

    pub fn registry(&self) -> &MiddlewareRegistry {
        &self.registry
    }

    /// Runs this set's definition against `router`.
    pub fn apply(&self, router: &mut Router) -> Result<(), Error> {
        let mut routes = Routes { router, registry: self.registry.clone() };
        self.definition.define(&mut routes)
    }

    /// Runs every set in order against one router, stopping at the first error.
    pub fn init(router: &mut Router, sets: impl IntoIterator<Item = RouteSet>) -> Result<(), Error> {
        let mut applied = 0usize;
        for set in sets {
            set.apply(router)?;
            applied += 1;
        }
        info!(sets = applied, routes = router.routes().count(), "route sets initialised");
        Ok(())
    }
}

/// Registration surface handed to [`RouteDefinition::define`].
///
/// Every helper forwards to the [`Router`] and returns the handle it hands
/// back, ready for [`Routes::middleware`].
pub struct Routes<'r> {
    router: &'r mut Router,
    registry: MiddlewareRegistry,
}

impl<'r> Routes<'r> {
    pub fn get(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.map(&[Method::Get], path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.map(&[Method::Post], path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.map(&[Method::Put], path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.map(&[Method::Delete], path, handler)
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.map(&[Method::Patch], path, handler)
    }

    pub fn options(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.map(&[Method::Options], path, handler)
    }

    /// `OPTIONS` route whose handler returns the untouched response.
    pub fn options_default(&mut self, path: &str) -> Result<RouteHandle, Error> {
        self.options(path, handler::untouched)
    }

    /// Route answering every verb in [`Method::STANDARD`].
    pub fn any(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.router.any(path, handler)
    }

    pub fn map(&mut self, methods: &[Method], path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        self.router.map(methods, path, handler)
    }

    /// Declares a group at `prefix`; `define` registers its members.
    pub fn group<F>(&mut self, prefix: &str, define: F) -> Result<GroupHandle, Error>
    where
        F: FnOnce(&mut Routes<'_>) -> Result<(), Error>,
    {
        let registry = self.registry.clone();
        self.router
            .group(prefix, move |router| define(&mut Routes { router, registry }))
    }

    /// Attaches the middleware registered as `name` to `target`.
    ///
    /// Fails with [`Error::MiddlewareNotFound`] when the name is not
    /// registered, and with [`Error::MiddlewareArgs`] when it is but no
    /// target was supplied. On success returns what the router's attach
    /// operation returned.
    pub fn middleware<H: Attach>(&mut self, name: &str, target: Option<H>) -> Result<H, Error> {
        let mw = self
            .registry
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| Error::MiddlewareNotFound(name.to_owned()))?;
        let target = target.ok_or_else(|| Error::MiddlewareArgs(name.to_owned()))?;
        Ok(target.attach(self.router, mw))
    }

    pub fn registry(&self) -> &MiddlewareRegistry {
        &self.registry
    }
}
