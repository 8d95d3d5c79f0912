// Property listings module
// Public search/show, authenticated mutations with ownership checks

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{PropertyResponse, PropertyRow};
pub use repository::PropertyRepository;
