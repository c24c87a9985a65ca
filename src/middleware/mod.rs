//! Middleware layer.
//!
//! Middleware wraps a route or a whole group: it sees the [`Request`] on the
//! way in, decides whether to call [`Next::run`], and may touch the
//! [`Response`](crate::Response) on the way out. Attach it through a named
//! registry ([`Routes::middleware`](crate::Routes::middleware)) or directly on
//! the router ([`Router::add_route_middleware`](crate::Router::add_route_middleware)).
//!
//! ```rust
//! use routeset::middleware::{self, Next};
//! use routeset::Request;
//!
//! let tagged = middleware::from_fn(|req: Request, next: Next| async move {
//!     let mut res = next.run(req).await;
//!     res.append_header("x-served-by", "routeset");
//!     res
//! });
//! # let _ = tagged;
//! ```
//!
//! Built-in middleware, also reachable by name from configuration:
//! - [`Trace`] (`trace`): one log line per request with method, path, status, latency
//! - [`SetHeader`] (`set-header`): appends a fixed header to every response

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{self, BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::IntoResponse;

mod header;
mod trace;

pub use header::SetHeader;
pub use trace::Trace;

/// A request/response interceptor.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

/// Shared, type-erased middleware. One instance may be attached to any
/// number of routes and groups.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain: remaining middleware, then the route handler.
pub struct Next {
    // Innermost at the front; `pop` yields the next layer to run.
    stack: Vec<BoxedMiddleware>,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Vec<BoxedMiddleware>, handler: BoxedHandler) -> Self {
        Self { stack, handler }
    }

    /// Runs the remaining chain and resolves to its response.
    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.stack.pop() {
            Some(layer) => layer.handle(req, self),
            None => self.handler.call(req),
        }
    }
}

/// Adapts an async closure `Fn(Request, Next) -> impl IntoResponse` into
/// [`Middleware`].
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn(f)
}

/// See [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        handler::respond((self.0)(req, next))
    }
}

/// Resolves a built-in middleware by catalog name.
///
/// `None` means the name is unknown or its options do not describe a usable
/// instance.
pub(crate) fn builtin(kind: &str, options: &BTreeMap<String, String>) -> Option<BoxedMiddleware> {
    match kind {
        "trace" => Some(Arc::new(Trace::new())),
        "set-header" => {
            let name = options.get("header")?;
            let value = options.get("value")?;
            SetHeader::new(name, value).map(|m| Arc::new(m) as BoxedMiddleware)
        }
        _ => None,
    }
}
