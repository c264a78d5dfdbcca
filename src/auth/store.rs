//! Credential store
//!
//! Owns the `users` collection. Registration hashes the password and
//! relies on the collection's unique indexes to settle races: when two
//! concurrent registrations collide on a username or email, exactly one
//! insert succeeds and the other surfaces as a duplicate-key failure.
//!
//! Neither the plaintext password nor the derived hash is ever logged.

use bson::{doc, oid::ObjectId};
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{AppError, Result};

/// Validated registration input, produced by the validation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Persistence and verification of user credentials
#[derive(Clone)]
pub struct CredentialStore {
    users: MongoCollection<UserDoc>,
}

impl CredentialStore {
    /// Open the users collection (applies its unique indexes)
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;
        Ok(Self { users })
    }

    /// Register a new user.
    ///
    /// Fails with `DuplicateKey` when the username or email is taken; the
    /// message is rewritten to the user-facing form before it reaches the
    /// flash surface.
    pub async fn register(&self, draft: RegistrationDraft) -> Result<UserDoc> {
        let password_hash = hash_password(&draft.password)?;
        let mut user = UserDoc::new(draft.username, draft.email, password_hash);

        let inserted_id = self.users.insert_one(user.clone()).await.map_err(|e| {
            match e {
                AppError::DuplicateKey(raw) => {
                    // The raw server message names the index; keep that out
                    // of the page and report which field collided instead.
                    AppError::DuplicateKey(format!(
                        "A user with the given {} is already registered",
                        duplicate_field(&raw)
                    ))
                }
                other => other,
            }
        })?;

        user.id = Some(inserted_id);
        info!("Registered new user: {}", user.username);
        Ok(user)
    }

    /// Authenticate by username and password.
    ///
    /// Unknown user and wrong password both come back as the same
    /// `InvalidCredentials` error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserDoc> {
        let user = match self
            .users
            .find_one(doc! { "username": username })
            .await?
        {
            Some(u) => u,
            None => {
                warn!("Login failed - unknown username");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!("Login failed - password mismatch for {}", user.username);
            return Err(AppError::InvalidCredentials);
        }

        info!("Login successful: {}", user.username);
        Ok(user)
    }

    /// Reduce a user to the id persisted in the session
    pub fn serialize(user: &UserDoc) -> Option<ObjectId> {
        user.id
    }

    /// Restore a user from a session-held id.
    ///
    /// Returns `Ok(None)` for an unknown or soft-deleted user; the caller
    /// treats that as an unauthenticated request, not an error.
    pub async fn deserialize(&self, id: ObjectId) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "_id": id }).await
    }
}

/// Which unique index an E11000 rejection names. Matched on the index
/// name, not the dup-key value: the value is user-supplied and may itself
/// contain "email" (a username like `emailfan99`).
fn duplicate_field(raw: &str) -> &'static str {
    if raw.contains("email_unique") {
        "email"
    } else {
        "username"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_matches_the_index_name() {
        // A username that happens to contain "email" must still be
        // reported as a username collision
        let username_collision = r#"E11000 duplicate key error collection: gallery_timeless.users index: username_unique dup key: { username: "emailfan99" }"#;
        assert_eq!(duplicate_field(username_collision), "username");

        let email_collision = r#"E11000 duplicate key error collection: gallery_timeless.users index: email_unique dup key: { email: "ansel@photos.com" }"#;
        assert_eq!(duplicate_field(email_collision), "email");
    }

    #[test]
    fn duplicate_key_message_is_user_facing() {
        assert_eq!(
            format!(
                "A user with the given {} is already registered",
                duplicate_field("index: username_unique dup key")
            ),
            "A user with the given username is already registered"
        );
    }
}
