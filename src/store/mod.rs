//! Application-lifetime state stores

pub mod reference;
pub mod session;

pub use reference::ReferenceStore;
pub use session::{SessionEvent, SessionStore, SharedSession};
