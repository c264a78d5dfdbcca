//! Durable, cookie-referenced session state

pub mod store;

pub use store::{Session, SessionStore, SESSION_COOKIE};
