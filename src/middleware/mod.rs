pub mod auth;
pub mod errors;
pub mod rate_limit;

pub use auth::{AuthenticatedUser, SessionToken};
pub use errors::{expose_error_details, panic_response, preflight_no_content};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
