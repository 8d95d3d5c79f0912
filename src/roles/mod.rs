// Role management module (admin only)

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{Role, RoleRequest};
pub use repository::RoleRepository;
