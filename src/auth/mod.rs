// Authentication module
// Signup with email verification, JWT sign-in, refresh token revocation,
// and password reset

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use middleware::{AdminUser, AuthenticatedUser, MaybeUser};
pub use service::AuthService;
pub use token::TokenService;
