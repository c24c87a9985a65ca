//! Two route sets sharing one router, with named middleware on a group.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -i -X OPTIONS http://localhost:3000/users
//!   curl -i http://localhost:3000/healthz

use http::StatusCode;
use routeset::{
    Error, MiddlewareEntry, Request, Response, RouteDefinition, RouteSet, Router, Routes, Server,
};

struct Users;

impl RouteDefinition for Users {
    fn define(&self, routes: &mut Routes<'_>) -> Result<(), Error> {
        let users = routes.group("/users", |users| {
            users.get("/{id}", get_user)?;
            users.post("", create_user)?;
            users.delete("/{id}", delete_user)?;
            users.options_default("")?;
            Ok(())
        })?;
        routes.middleware("logged", Some(users))?;
        routes.middleware("cors", Some(users))?;
        Ok(())
    }
}

struct Health;

impl RouteDefinition for Health {
    fn define(&self, routes: &mut Routes<'_>) -> Result<(), Error> {
        routes.get("/healthz", |_req: Request| async { "ok" })?;
        routes.get("/readyz", |_req: Request| async { "ready" })?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let users = RouteSet::new(Users, [
        ("logged", MiddlewareEntry::builtin("trace")),
        (
            "cors",
            MiddlewareEntry::builtin_with("set-header", [
                ("header", "access-control-allow-origin"),
                ("value", "*"),
            ]),
        ),
    ])?;

    let mut router = Router::new();
    RouteSet::init(&mut router, [users, RouteSet::plain(Health)])?;

    Server::bind("0.0.0.0:3000").await?.serve(router).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#.to_owned().into_bytes())
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
