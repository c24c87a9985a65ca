//! Radix-tree request router.
//!
//! One tree per HTTP method, each mapping a pattern to an index into the
//! route table. Routes and groups are registered at startup, handles come
//! back for attaching middleware, and the finished router is read-only while
//! it serves.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use http::StatusCode;
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Next};
use crate::request::Request;
use crate::response::Response;

static NEXT_ROUTER_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque reference to a registered route.
///
/// Only meaningful to the router that issued it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RouteHandle {
    router: u64,
    index: usize,
}

/// Opaque reference to a registered route group.
///
/// Only meaningful to the router that issued it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GroupHandle {
    router: u64,
    index: usize,
}

/// A registered route.
pub struct Route {
    methods: Vec<Method>,
    pattern: String,
    handler: BoxedHandler,
    middleware: Vec<BoxedMiddleware>,
    // Enclosing groups, outermost first.
    groups: Vec<GroupHandle>,
}

impl Route {
    /// Methods in the order they were registered.
    pub fn methods(&self) -> &[Method] { &self.methods }

    /// The full pattern, group prefixes included.
    pub fn pattern(&self) -> &str { &self.pattern }
}

struct Group {
    prefix: String,
    middleware: Vec<BoxedMiddleware>,
}

/// The application router.
///
/// ```rust
/// use routeset::{Method, Request, Response, Router};
///
/// # fn main() -> Result<(), routeset::Error> {
/// let mut router = Router::new();
/// router.group("/users", |users| {
///     users.map(&[Method::Get], "/{id}", show)?;
///     users.map(&[Method::Post], "", create)?;
///     Ok(())
/// })?;
/// assert_eq!(router.routes().count(), 2);
/// # Ok(())
/// # }
/// # async fn show(_: Request) -> Response { Response::text("") }
/// # async fn create(_: Request) -> Response { Response::text("") }
/// ```
pub struct Router {
    id: u64,
    trees: HashMap<Method, MatchitRouter<usize>>,
    routes: Vec<Route>,
    groups: Vec<Group>,
    // Groups whose definition is currently running, outermost first.
    scope: Vec<GroupHandle>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            id: NEXT_ROUTER_ID.fetch_add(1, Ordering::Relaxed),
            trees: HashMap::new(),
            routes: Vec::new(),
            groups: Vec::new(),
            scope: Vec::new(),
        }
    }

    /// Registers `handler` for every method in `methods` at `path`, under the
    /// prefix of any open groups.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    /// An empty `methods` slice fails with [`Error::NoMethods`].
    pub fn map(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: impl Handler,
    ) -> Result<RouteHandle, Error> {
        let pattern = format!("{}{path}", self.prefix());
        self.insert(methods.to_vec(), pattern, Arc::new(handler))
    }

    /// Registers `handler` for every verb in [`Method::STANDARD`].
    pub fn any(&mut self, path: &str, handler: impl Handler) -> Result<RouteHandle, Error> {
        let pattern = format!("{}{path}", self.prefix());
        self.insert(Method::STANDARD.to_vec(), pattern, Arc::new(handler))
    }

    /// Opens a group at `prefix` and runs `define` inside it. Routes and
    /// nested groups registered by `define` inherit the composed prefix.
    ///
    /// The group is closed again whether or not `define` succeeds.
    pub fn group<F>(&mut self, prefix: &str, define: F) -> Result<GroupHandle, Error>
    where
        F: FnOnce(&mut Router) -> Result<(), Error>,
    {
        let handle = GroupHandle { router: self.id, index: self.groups.len() };
        let prefix = format!("{}{prefix}", self.prefix());
        debug!(%prefix, "group opened");
        self.groups.push(Group { prefix, middleware: Vec::new() });

        self.scope.push(handle);
        let result = define(self);
        self.scope.pop();

        result.map(|()| handle)
    }

    /// Attaches middleware to one route. Returns the same handle.
    ///
    /// # Panics
    ///
    /// Panics if `route` was issued by a different router.
    pub fn add_route_middleware(&mut self, route: RouteHandle, mw: BoxedMiddleware) -> RouteHandle {
        let id = self.id;
        match self.routes.get_mut(route.index) {
            Some(r) if route.router == id => r.middleware.push(mw),
            _ => panic!("{route:?} was not issued by this router"),
        }
        route
    }

    /// Attaches middleware to every route of a group, present and future.
    /// Returns the same handle.
    ///
    /// # Panics
    ///
    /// Panics if `group` was issued by a different router.
    pub fn add_group_middleware(&mut self, group: GroupHandle, mw: BoxedMiddleware) -> GroupHandle {
        let id = self.id;
        match self.groups.get_mut(group.index) {
            Some(g) if group.router == id => g.middleware.push(mw),
            _ => panic!("{group:?} was not issued by this router"),
        }
        group
    }

    /// Registered routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// `None` for a handle issued by another router.
    pub fn route(&self, handle: RouteHandle) -> Option<&Route> {
        if handle.router != self.id {
            return None;
        }
        self.routes.get(handle.index)
    }

    /// The composed prefix of a group; `None` for a foreign handle.
    pub fn group_prefix(&self, handle: GroupHandle) -> Option<&str> {
        if handle.router != self.id {
            return None;
        }
        self.groups.get(handle.index).map(|g| g.prefix.as_str())
    }

    /// Routes one request through its middleware chain and handler.
    ///
    /// `HEAD` falls back to the `GET` route, answered without a body. `404`
    /// when no tree knows the path; `405` with an `Allow` header when only
    /// other methods do.
    pub async fn call(&self, mut req: Request) -> Response {
        let (found, head_via_get) = match self.lookup(req.method, &req.path) {
            Some(found) => (Some(found), false),
            None if req.method == Method::Head => (self.lookup(Method::Get, &req.path), true),
            None => (None, false),
        };

        match found {
            Some((route, params)) => {
                req.params = params;
                let mut res = self.chain(route).run(req).await;
                if head_via_get {
                    res.body.clear();
                }
                res
            }
            None => {
                let allowed = self.allowed(&req.path);
                if allowed.is_empty() {
                    return Response::status(StatusCode::NOT_FOUND);
                }
                let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
                Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header("allow", &allow)
                    .no_body()
            }
        }
    }

    fn prefix(&self) -> &str {
        self.scope
            .last()
            .map(|g| self.groups[g.index].prefix.as_str())
            .unwrap_or("")
    }

    fn insert(
        &mut self,
        methods: Vec<Method>,
        pattern: String,
        handler: BoxedHandler,
    ) -> Result<RouteHandle, Error> {
        if methods.is_empty() {
            return Err(Error::NoMethods(pattern));
        }

        let index = self.routes.len();
        let mut inserted: Vec<Method> = Vec::with_capacity(methods.len());

        for &method in &methods {
            if inserted.contains(&method) {
                continue;
            }
            let tree = self.trees.entry(method).or_default();
            if let Err(source) = tree.insert(pattern.as_str(), index) {
                // Undo the trees already touched so the route is all-or-nothing.
                for m in inserted {
                    if let Some(t) = self.trees.get_mut(&m) {
                        t.remove(pattern.as_str());
                    }
                }
                return Err(Error::InvalidRoute { pattern, source });
            }
            inserted.push(method);
        }

        debug!(?methods, %pattern, "route registered");
        self.routes.push(Route {
            methods,
            pattern,
            handler,
            middleware: Vec::new(),
            groups: self.scope.clone(),
        });
        Ok(RouteHandle { router: self.id, index })
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        let tree = self.trees.get(&method)?;
        let matched = tree.at(path).ok()?;
        let route = &self.routes[*matched.value];
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((route, params))
    }

    /// Methods with a route matching `path`, sorted by name. `HEAD` is
    /// listed wherever `GET` is.
    fn allowed(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self.trees
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect();
        if methods.contains(&Method::Get) && !methods.contains(&Method::Head) {
            methods.push(Method::Head);
        }
        methods.sort_by_key(|m| m.as_str());
        methods
    }

    fn chain(&self, route: &Route) -> Next {
        // `Next` pops from the back: push innermost layers first.
        let mut stack = route.middleware.clone();
        for group in route.groups.iter().rev() {
            stack.extend(self.groups[group.index].middleware.iter().cloned());
        }
        Next::new(stack, route.handler.clone())
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Something middleware can be attached to: a route or a group handle.
pub trait Attach: Copy {
    /// Attaches `mw` through the router and returns the router's result.
    fn attach(self, router: &mut Router, mw: BoxedMiddleware) -> Self;
}

impl Attach for RouteHandle {
    fn attach(self, router: &mut Router, mw: BoxedMiddleware) -> Self {
        router.add_route_middleware(self, mw)
    }
}

impl Attach for GroupHandle {
    fn attach(self, router: &mut Router, mw: BoxedMiddleware) -> Self {
        router.add_group_middleware(self, mw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::middleware::{self, Next};

    async fn ok(_req: Request) -> &'static str { "ok" }

    fn tag(label: &'static str) -> BoxedMiddleware {
        Arc::new(middleware::from_fn(move |req: Request, next: Next| async move {
            let mut res = next.run(req).await;
            res.append_header("x-order", label);
            res
        }))
    }

    fn order(res: &Response) -> Vec<&str> {
        res.headers()
            .iter()
            .filter(|(k, _)| k == "x-order")
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn conflicting_pattern_is_rejected_and_rolled_back() {
        let mut router = Router::new();
        router.map(&[Method::Post], "/x", ok).unwrap();
        let err = router.map(&[Method::Get, Method::Post], "/x", ok).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { ref pattern, .. } if pattern == "/x"));
        assert_eq!(router.routes().count(), 1);
        assert!(router.lookup(Method::Get, "/x").is_none());
    }

    #[test]
    fn duplicate_methods_register_once() {
        let mut router = Router::new();
        let handle = router.map(&[Method::Get, Method::Get], "/dup", ok).unwrap();
        assert_eq!(router.route(handle).unwrap().methods(), [Method::Get, Method::Get]);
        assert!(router.lookup(Method::Get, "/dup").is_some());
    }

    #[test]
    fn group_scope_closes_after_failure() {
        let mut router = Router::new();
        let result = router.group("/broken", |r| {
            r.map(&[Method::Get], "/a", ok)?;
            r.map(&[Method::Get], "/a", ok)?;
            Ok(())
        });
        assert!(result.is_err());
        let after = router.map(&[Method::Get], "/top", ok).unwrap();
        assert_eq!(router.route(after).unwrap().pattern(), "/top");
    }

    #[tokio::test]
    async fn unknown_path_is_404_and_wrong_method_is_405() {
        let mut router = Router::new();
        router.map(&[Method::Get], "/only-get", ok).unwrap();

        let res = router.call(Request::new(Method::Get, "/missing")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

        let res = router.call(Request::new(Method::Delete, "/only-get")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, HEAD"));
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn allow_lists_every_matching_method() {
        let mut router = Router::new();
        router.map(&[Method::Put, Method::Delete], "/items/{id}", ok).unwrap();
        router.map(&[Method::Post], "/items/{id}", ok).unwrap();

        let res = router.call(Request::new(Method::Get, "/items/7")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("DELETE, POST, PUT"));
    }

    #[tokio::test]
    async fn head_falls_back_to_get_without_body() {
        let mut router = Router::new();
        router.map(&[Method::Get], "/page", ok).unwrap();

        let res = router.call(Request::new(Method::Head, "/page")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn explicit_head_route_wins_over_get() {
        let mut router = Router::new();
        router.map(&[Method::Get], "/page", ok).unwrap();
        router.map(&[Method::Head], "/page", |_req: Request| async { "head" }).unwrap();

        let res = router.call(Request::new(Method::Head, "/page")).await;
        assert_eq!(res.body(), b"head");
    }

    #[test]
    fn empty_method_set_is_rejected() {
        let mut router = Router::new();
        let err = router.map(&[], "/ghost", ok).unwrap_err();
        assert!(matches!(err, Error::NoMethods(ref pattern) if pattern == "/ghost"));
        assert_eq!(router.routes().count(), 0);
    }

    #[test]
    fn foreign_handles_are_not_resolved() {
        let mut first = Router::new();
        let mut second = Router::new();
        let route = first.map(&[Method::Get], "/a", ok).unwrap();
        let group = first.group("/g", |_| Ok(())).unwrap();
        second.map(&[Method::Get], "/b", ok).unwrap();
        second.group("/h", |_| Ok(())).unwrap();

        assert!(second.route(route).is_none());
        assert!(second.group_prefix(group).is_none());
        assert_eq!(first.group_prefix(group), Some("/g"));
    }

    #[test]
    #[should_panic(expected = "was not issued by this router")]
    fn attaching_through_a_foreign_route_handle_panics() {
        let mut first = Router::new();
        let mut second = Router::new();
        let route = first.map(&[Method::Get], "/a", ok).unwrap();
        second.map(&[Method::Get], "/b", ok).unwrap();
        second.add_route_middleware(route, tag("stray"));
    }

    #[test]
    #[should_panic(expected = "was not issued by this router")]
    fn attaching_through_a_foreign_group_handle_panics() {
        let mut first = Router::new();
        let mut second = Router::new();
        let group = first.group("/g", |_| Ok(())).unwrap();
        second.add_group_middleware(group, tag("stray"));
    }

    #[tokio::test]
    async fn request_headers_reach_the_handler() {
        let mut router = Router::new();
        router
            .map(&[Method::Get], "/whoami", |req: Request| async move {
                req.header("X-User").unwrap_or("anonymous").to_owned()
            })
            .unwrap();
        let req = Request::new(Method::Get, "/whoami").with_header("x-user", "alice");
        let res = router.call(req).await;
        assert_eq!(res.body(), b"alice");
    }

    #[tokio::test]
    async fn params_reach_the_handler() {
        let mut router = Router::new();
        router
            .map(&[Method::Get], "/users/{id}", |req: Request| async move {
                req.param("id").unwrap_or("none").to_owned()
            })
            .unwrap();
        let res = router.call(Request::new(Method::Get, "/users/42")).await;
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn groups_wrap_routes_and_last_added_runs_first() {
        let mut router = Router::new();
        let mut route = None;
        let outer = router
            .group("/a", |r| {
                let inner = r.group("/b", |r| {
                    route = Some(r.map(&[Method::Get], "/c", ok)?);
                    Ok(())
                })?;
                r.add_group_middleware(inner, tag("inner"));
                Ok(())
            })
            .unwrap();
        let route = route.unwrap();
        router.add_group_middleware(outer, tag("outer"));
        router.add_route_middleware(route, tag("route-1"));
        router.add_route_middleware(route, tag("route-2"));

        let res = router.call(Request::new(Method::Get, "/a/b/c")).await;
        // Headers are appended on the way out, so innermost shows up first.
        assert_eq!(order(&res), ["route-1", "route-2", "inner", "outer"]);
    }
}
