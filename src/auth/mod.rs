//! Registration and authentication
//!
//! Provides:
//! - Password hashing with Argon2
//! - The credential store (register / authenticate / serialize / deserialize)
//! - Request-scoped identity resolution and route gating

pub mod middleware;
pub mod password;
pub mod store;

pub use middleware::{current_user, establish, require_user, teardown};
pub use password::{hash_password, verify_password};
pub use store::{CredentialStore, RegistrationDraft};
