//! Typed wrappers over the backend REST endpoints

pub mod envelope;
pub mod models;
pub mod poetry;
pub mod user;

pub use envelope::Envelope;
pub use poetry::PoetryApi;
pub use user::UserApi;
