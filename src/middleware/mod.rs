pub mod auth;
pub mod json;
pub mod query;
pub mod rate_limit;
pub mod response;

pub use auth::jwt_auth_middleware;
pub use json::ApiJson;
pub use query::ApiQuery;
pub use rate_limit::{client_ip, RateLimiter};
pub use response::{success_with, ApiResponse, ApiResult};
