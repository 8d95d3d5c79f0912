// User management module
// Admin CRUD plus self-service profile updates

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::UserResponse;
pub use repository::UserAdminRepository;
