pub mod auth;
pub mod json;
pub mod rate_limit;
pub mod response;

pub use auth::{require_admin, require_auth, AuthUser};
pub use json::ApiJson;
pub use rate_limit::{login_rate_limit, LoginRateLimiter};
pub use response::{ApiResponse, ApiResult};
