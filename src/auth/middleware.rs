//! Request-scoped identity
//!
//! Maintains the authenticated-user relation for the lifetime of one
//! request, backed by the session store. A session is Anonymous until
//! `establish` binds it to a user, and returns to Anonymous via `teardown`
//! (logout) or silently when the stored id no longer resolves.

use tracing::warn;

use crate::auth::store::CredentialStore;
use crate::db::schemas::{Flash, UserDoc};
use crate::session::Session;
use crate::types::{AppError, Result};

/// Resolve the session's stored user id to a user, if any.
///
/// Resolution failures (deleted user, corrupt id, database hiccup) are
/// swallowed: the request proceeds unauthenticated and the client sees
/// nothing unusual.
pub async fn current_user(store: &CredentialStore, session: &Session) -> Option<UserDoc> {
    let id = session.user_id()?;
    match store.deserialize(id).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Failed to restore session user {}: {}", id, e);
            None
        }
    }
}

/// Bind the session to a freshly registered or logged-in user.
///
/// The binding only marks the session; the store write happens when the
/// router saves the session, and a failure there propagates as a fatal
/// request error rather than being silently dropped.
pub fn establish(session: &mut Session, user: &UserDoc) -> Result<()> {
    let id = CredentialStore::serialize(user)
        .ok_or_else(|| AppError::Auth("Cannot establish a session for an unsaved user".into()))?;
    session.set_user(id);
    Ok(())
}

/// Clear the session's user binding. The session record itself survives,
/// ready to carry the logout flash to the next page.
pub fn teardown(session: &mut Session) {
    session.clear_user();
}

/// Gate a protected route. Returns the user when authenticated; otherwise
/// flashes the sign-in prompt so the caller can redirect to /login.
pub fn require_user<'a>(
    current: Option<&'a UserDoc>,
    session: &mut Session,
) -> Option<&'a UserDoc> {
    match current {
        Some(user) => Some(user),
        None => {
            session.add_flash(Flash::error("You must be signed in first!"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    fn saved_user() -> UserDoc {
        let mut user = UserDoc::new(
            "galleria".into(),
            "galleria@example.com".into(),
            "$argon2id$...".into(),
        );
        user.id = Some(ObjectId::new());
        user
    }

    #[test]
    fn establish_then_teardown() {
        let mut session = Session::fresh();
        let user = saved_user();

        establish(&mut session, &user).unwrap();
        assert_eq!(session.user_id(), user.id);

        teardown(&mut session);
        assert!(session.user_id().is_none());
    }

    #[test]
    fn establish_rejects_unsaved_user() {
        let mut session = Session::fresh();
        let user = UserDoc::new("galleria".into(), "g@example.com".into(), "hash".into());
        assert!(establish(&mut session, &user).is_err());
    }

    #[test]
    fn gate_flashes_and_blocks_anonymous() {
        let mut session = Session::fresh();
        assert!(require_user(None, &mut session).is_none());

        let flashes = session.take_flash();
        assert_eq!(flashes.len(), 1);
        assert!(flashes[0].message.contains("signed in"));
    }

    #[test]
    fn gate_passes_authenticated_user_through() {
        let mut session = Session::fresh();
        let user = saved_user();
        let gated = require_user(Some(&user), &mut session);
        assert_eq!(gated.unwrap().username, "galleria");
        assert!(session.take_flash().is_empty());
    }
}
