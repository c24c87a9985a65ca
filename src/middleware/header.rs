use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Appends a fixed header to every response that passes through.
#[derive(Clone, Debug)]
pub struct SetHeader {
    name: String,
    value: String,
}

impl SetHeader {
    /// Returns `None` if `name` or `value` is not valid in an HTTP header.
    pub fn new(name: &str, value: &str) -> Option<Self> {
        http::HeaderName::from_bytes(name.as_bytes()).ok()?;
        http::HeaderValue::from_str(value).ok()?;
        Some(Self { name: name.to_ascii_lowercase(), value: value.to_owned() })
    }
}

impl Middleware for SetHeader {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let (name, value) = (self.name.clone(), self.value.clone());
        Box::pin(async move {
            let mut res = next.run(req).await;
            res.append_header(&name, &value);
            res
        })
    }
}
