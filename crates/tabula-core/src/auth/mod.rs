//! Authentication domain module.
//!
//! - `model`: Users, credentials and token payloads
//! - `token_store`: Persistence trait for the bearer token
//! - `guard`: Routes and the redirect-to-login guard

mod guard;
mod model;
mod token_store;

pub use guard::{token_expired, Route, RouteDecision, RouteGuard};
pub use model::{LoginRequest, RegisterRequest, StoredToken, TokenResponse, User};
pub use token_store::TokenStore;
