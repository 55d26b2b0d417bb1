//! HTTP plumbing middleware: logging, rate limiting, CORS, security headers.

pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod security_headers;

pub use cors::cors_layer;
pub use logging::request_logging;
pub use rate_limit::{rate_limit, RateLimiter};
pub use security_headers::security_headers;
