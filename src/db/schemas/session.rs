//! Session document schema
//!
//! Server-side session state referenced by the client's signed cookie.
//! Sessions live 7 days; MongoDB's TTL monitor reaps expired documents via
//! the `expires_at` index, and an expired document that has not been reaped
//! yet is treated as absent on load.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Duration, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::metadata::Metadata;
use crate::db::mongo::{IntoIndexes, MutMetadata};

/// Collection name for sessions
pub const SESSION_COLLECTION: &str = "sessions";

/// Session lifetime in days (cookie Max-Age matches this)
pub const SESSION_TTL_DAYS: i64 = 7;

/// How stale a session's last write may get, in hours, before a read
/// refreshes it. Bounds the write rate for clients that only ever read.
pub const TOUCH_AFTER_HOURS: i64 = 24;

/// Session lifetime as a [`Duration`]
pub fn session_ttl() -> Duration {
    Duration::days(SESSION_TTL_DAYS)
}

/// Touch threshold as a [`Duration`]
pub fn touch_after() -> Duration {
    Duration::hours(TOUCH_AFTER_HOURS)
}

/// Flash message severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-time notification, cleared when read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Session document stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Standard metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Opaque token held by the client (signed inside the cookie)
    #[serde(default)]
    pub session_id: String,

    /// Authenticated user, if any. Weak reference: deleting the user does
    /// not cascade here, the session just resolves to unauthenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,

    /// Pending flash messages, drained on first read
    #[serde(default)]
    pub flash: Vec<Flash>,

    /// Username stashed for register-form prefill, from the /register
    /// query string or a failed submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill_username: Option<String>,

    /// Email stashed from a failed registration so the form stays sticky
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill_email: Option<String>,

    /// Absolute expiry (never more than SESSION_TTL past the last write)
    #[serde(default = "default_expires_at")]
    pub expires_at: DateTime<Utc>,
}

fn default_expires_at() -> DateTime<Utc> {
    Utc::now()
}

impl Default for SessionDoc {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl SessionDoc {
    /// Create a fresh anonymous session with a 7-day expiry
    pub fn new(session_id: String) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            session_id,
            user_id: None,
            flash: Vec::new(),
            prefill_username: None,
            prefill_email: None,
            expires_at: Utc::now() + session_ttl(),
        }
    }

    /// An expired session is treated as absent
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether a read-only request should still rewrite the document.
    /// True once more than TOUCH_AFTER has passed since the last write.
    pub fn needs_touch(&self, now: DateTime<Utc>) -> bool {
        match self.metadata.updated_at {
            Some(updated) => {
                let updated: DateTime<Utc> = updated.into();
                now - updated > touch_after()
            }
            // No recorded write; refresh to repair the record
            None => true,
        }
    }
}

impl IntoIndexes for SessionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on the session token
            (
                doc! { "session_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("session_id_unique".to_string())
                        .build(),
                ),
            ),
            // TTL index for automatic expiration cleanup
            (
                doc! { "expires_at": 1 },
                Some(
                    IndexOptions::builder()
                        .expire_after(std::time::Duration::from_secs(0))
                        .name("expires_at_ttl".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SessionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_anonymous_and_unexpired() {
        let session = SessionDoc::new("sid-123".into());
        assert!(session.user_id.is_none());
        assert!(session.flash.is_empty());
        assert!(!session.is_expired());
        assert!(session.expires_at <= Utc::now() + session_ttl());
    }

    #[test]
    fn past_expiry_means_expired() {
        let mut session = SessionDoc::new("sid-123".into());
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn touch_only_after_threshold() {
        let mut session = SessionDoc::new("sid-123".into());
        let now = Utc::now();

        // Written just now: no touch needed
        assert!(!session.needs_touch(now));

        // Last write 25 hours ago: touch
        let stale = now - Duration::hours(25);
        session.metadata.updated_at =
            Some(bson::DateTime::from_millis(stale.timestamp_millis()));
        assert!(session.needs_touch(now));

        // Last write 23 hours ago: still fresh enough
        let recent = now - Duration::hours(23);
        session.metadata.updated_at =
            Some(bson::DateTime::from_millis(recent.timestamp_millis()));
        assert!(!session.needs_touch(now));
    }

    #[test]
    fn session_token_is_uniquely_indexed_and_ttl_backed() {
        let indices = SessionDoc::into_indices();
        assert_eq!(indices.len(), 2);
        assert_eq!(indices[0].1.as_ref().unwrap().unique, Some(true));
        assert_eq!(
            indices[1].1.as_ref().unwrap().expire_after,
            Some(std::time::Duration::from_secs(0))
        );
    }
}
