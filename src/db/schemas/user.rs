//! User document schema
//!
//! Stores account credentials. Username and email each carry a unique
//! index; those indexes are the only uniqueness guarantee in the system.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Unique username (5-25 characters, enforced by the validation layer)
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2 password hash (PHC string; the salt lives inside it)
    pub password_hash: String,
}

impl UserDoc {
    /// Create a new user document from validated registration input
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            username,
            email,
            password_hash,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on username
            (
                doc! { "username": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("username_unique".to_string())
                        .build(),
                ),
            ),
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_and_email_are_uniquely_indexed() {
        let indices = UserDoc::into_indices();
        assert_eq!(indices.len(), 2);
        for (_, opts) in indices {
            assert_eq!(opts.unwrap().unique, Some(true));
        }
    }

    #[test]
    fn new_user_has_no_id_until_insert() {
        let user = UserDoc::new(
            "galleria".into(),
            "galleria@example.com".into(),
            "$argon2id$v=19$...".into(),
        );
        assert!(user.id.is_none());
        assert!(!user.metadata.is_deleted);
    }
}
