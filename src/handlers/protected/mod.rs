// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`; handlers read the
// caller with `Extension<AuthUser>` and apply their own role and brand checks.
pub mod ai;
pub mod brands;
pub mod claims;
pub mod products;
pub mod templates;
pub mod tools;
