//! Unified error type.

/// The error type returned by routeset's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// declaration-time failures (bad middleware, bad patterns, bad config) and
/// infrastructure failures (binding a port, reading a file).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A middleware entry could not be resolved to something callable.
    #[error("middleware must be callable for middleware {0}")]
    InvalidMiddleware(String),

    /// A route set asked for a middleware name its registry does not hold.
    #[error("middleware {0} not found")]
    MiddlewareNotFound(String),

    /// A registered middleware was applied without a route or group to attach to.
    #[error("no route or group supplied to middleware {0}")]
    MiddlewareArgs(String),

    /// The router rejected a pattern (bad syntax or a conflicting route).
    #[error("invalid route `{pattern}`: {source}")]
    InvalidRoute {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    /// A route was registered with an empty method set.
    #[error("route `{0}` has no methods")]
    NoMethods(String),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
