pub mod auth;
pub mod json_body;
pub mod rate_limit;

pub use auth::AuthenticatedUser;
pub use json_body::JsonBody;
pub use rate_limit::{GenerateLimiter, check_quota, daily_limiter};
