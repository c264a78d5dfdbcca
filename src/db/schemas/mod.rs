//! Database schemas
//!
//! MongoDB document structures for users and sessions.

mod metadata;
mod session;
mod user;

pub use metadata::Metadata;
pub use session::{
    session_ttl, touch_after, Flash, FlashKind, SessionDoc, SESSION_COLLECTION,
    SESSION_TTL_DAYS, TOUCH_AFTER_HOURS,
};
pub use user::{UserDoc, USER_COLLECTION};
