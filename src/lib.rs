//! # routeset
//!
//! Route sets, route groups and named middleware for a small hyper-based
//! router.
//!
//! An application declares its routes in sets, one type per area of the
//! API. Each set implements [`RouteDefinition`] and is paired with the
//! middleware it may apply by name. [`RouteSet::init`] runs every set against
//! one [`Router`], and [`Server`] serves the result.
//!
//! - Route helpers for every verb, `any`, `map` and nested `group`s whose
//!   prefixes compose by concatenation
//! - Named middleware resolved from a registry, attachable to a route or a
//!   whole group
//! - Radix-tree lookup per method via [`matchit`]
//! - HTTP/1.1 and HTTP/2 via hyper, graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use routeset::{Error, MiddlewareEntry, Request, Response, RouteDefinition, RouteSet, Router, Routes, Server};
//!
//! struct Api;
//!
//! impl RouteDefinition for Api {
//!     fn define(&self, routes: &mut Routes<'_>) -> Result<(), Error> {
//!         let users = routes.group("/users", |users| {
//!             users.get("/{id}", get_user)?;
//!             users.post("", create_user)?;
//!             users.options_default("")?;
//!             Ok(())
//!         })?;
//!         routes.middleware("logged", Some(users))?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let api = RouteSet::new(Api, [("logged", MiddlewareEntry::builtin("trace"))])?;
//!
//!     let mut router = Router::new();
//!     RouteSet::init(&mut router, [api])?;
//!
//!     Server::bind("0.0.0.0:3000").await?.serve(router).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(_req: Request) -> Response {
//!     Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .no_body()
//! }
//! ```

mod config;
mod error;
mod handler;
mod method;
mod registry;
mod request;
mod response;
mod router;
mod routes;
mod server;

pub mod middleware;

pub use config::{MiddlewareConfig, RoutesConfig};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use middleware::{BoxedMiddleware, Middleware, Next};
pub use registry::{MiddlewareEntry, MiddlewareRegistry};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{Attach, GroupHandle, Route, RouteHandle, Router};
pub use routes::{RouteDefinition, RouteSet, Routes};
pub use server::Server;
