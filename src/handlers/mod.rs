// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth)  → `/`, `/health`
// Protected (JWT)   → `/api/*`, caller available as `Extension<AuthUser>`
pub mod protected;
pub mod public;
pub mod utils;
