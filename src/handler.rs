//! Route handlers.
//!
//! A handler is anything that turns a [`Request`] into a boxed response
//! future. Plain `async fn`s and closures qualify through the blanket impl;
//! a struct carrying state can implement [`Handler`] directly.
//!
//! The router stores handlers as `Arc<dyn Handler>`, so an `any` route keeps
//! one handler behind every verb it answers to.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// Handlers and middleware both produce one of these.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

pub(crate) type BoxedHandler = Arc<dyn Handler>;

/// Answers requests for a route.
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        respond(self(req))
    }
}

/// Boxes a future of anything response-like. Shared with middleware adapters.
pub(crate) fn respond<Fut, R>(fut: Fut) -> BoxFuture
where
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Box::pin(async move { fut.await.into_response() })
}

/// The handler `options_default` installs: hands back the untouched response.
pub(crate) async fn untouched(_req: Request) -> Response {
    Response::default()
}
