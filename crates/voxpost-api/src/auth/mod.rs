//! Bearer-token authentication.
//!
//! Requests carry an HS256 JWT issued by the identity provider. The
//! middleware validates it, upserts the local user row, and stores an
//! [`AuthContext`] in request extensions for handlers to extract.

pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, AuthState};
pub use models::AuthContext;
