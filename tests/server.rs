use std::net::SocketAddr;

use routeset::{
    Error, MiddlewareRegistry, Request, RouteDefinition, RouteSet, Router, Routes, RoutesConfig, Server,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Echo;

impl RouteDefinition for Echo {
    fn define(&self, routes: &mut Routes<'_>) -> Result<(), Error> {
        let api = routes.group("/api", |api| {
            api.get("/users/{id}", |req: Request| async move {
                format!("user {}", req.param("id").unwrap_or("?"))
            })?;
            api.post("/echo", |req: Request| async move {
                String::from_utf8_lossy(req.body()).into_owned()
            })?;
            Ok(())
        })?;
        routes.middleware("cors", Some(api))?;
        routes.middleware("logged", Some(api))?;
        Ok(())
    }
}

const CONFIG: &str = r#"
    [[middleware]]
    name = "logged"
    kind = "trace"

    [[middleware]]
    name = "cors"
    kind = "set-header"
    header = "access-control-allow-origin"
    value = "*"
"#;

async fn start() -> (SocketAddr, oneshot::Sender<()>, JoinHandle<Result<(), Error>>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let registry = MiddlewareRegistry::from_config(&RoutesConfig::from_toml(CONFIG).unwrap()).unwrap();
    let mut router = Router::new();
    RouteSet::init(&mut router, [RouteSet::with_registry(Echo, registry)]).unwrap();

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(router, async move {
        let _ = rx.await;
    }));
    (addr, tx, handle)
}

async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).to_lowercase()
}

#[tokio::test]
async fn serves_grouped_routes_with_configured_middleware() {
    let (addr, shutdown, handle) = start().await;

    let res = roundtrip(
        addr,
        "GET /api/users/42 HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
    )
    .await;
    assert!(res.starts_with("http/1.1 200"), "{res}");
    assert!(res.contains("access-control-allow-origin: *"), "{res}");
    assert!(res.ends_with("user 42"), "{res}");

    let res = roundtrip(
        addr,
        "POST /api/echo HTTP/1.1\r\nhost: localhost\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello",
    )
    .await;
    assert!(res.ends_with("hello"), "{res}");

    shutdown.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_paths_and_methods_get_status_codes() {
    let (addr, shutdown, handle) = start().await;

    let res = roundtrip(addr, "GET /nowhere HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("http/1.1 404"), "{res}");

    let res = roundtrip(addr, "DELETE /api/echo HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("http/1.1 405"), "{res}");
    assert!(res.contains("allow: post\r\n"), "{res}");

    let res = roundtrip(addr, "PURGE /api/echo HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("http/1.1 405"), "{res}");

    shutdown.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
