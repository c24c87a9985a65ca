//! Per-request log line.

use std::time::{Duration, Instant};

use tracing::info;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Logs method, path, status and latency once the inner chain has answered.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self { Self }
}

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let method = req.method();
        let path = req.path().to_owned();
        let start = Instant::now();
        Box::pin(async move {
            let res = next.run(req).await;
            info!(
                %method,
                %path,
                status = res.status_code().as_u16(),
                latency_us = micros(start.elapsed()),
                "request"
            );
            res
        })
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_saturates_instead_of_wrapping() {
        assert_eq!(micros(Duration::from_millis(3)), 3_000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
