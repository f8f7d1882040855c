pub mod cors;
pub mod rate_limit;
pub mod security_headers;

pub use cors::create_cors;
pub use rate_limit::{RateLimitMiddleware, RateLimiter};
pub use security_headers::security_headers;
