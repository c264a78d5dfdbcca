//! Mongo-backed session store
//!
//! The client holds a signed cookie `sid=<token>.<signature>`; the server
//! holds everything else. A missing, tampered, or expired cookie yields a
//! fresh anonymous session, and every response to a client without a valid
//! session carries a new Set-Cookie.
//!
//! Write policy: new and mutated sessions are always persisted; an
//! untouched session is rewritten only when its last write is older than
//! the touch threshold, so read-heavy clients do not hammer the store.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::db::schemas::{
    session_ttl, Flash, SessionDoc, SESSION_COLLECTION, SESSION_TTL_DAYS,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{AppError, Result};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sid";

type HmacSha256 = Hmac<Sha256>;

/// Request-scoped working copy of a session document.
///
/// Mutations mark the session dirty; nothing reaches MongoDB until the
/// router calls [`SessionStore::save`] after the handler returns.
#[derive(Debug)]
pub struct Session {
    doc: SessionDoc,
    is_new: bool,
    dirty: bool,
}

impl Session {
    pub(crate) fn fresh() -> Self {
        Self {
            doc: SessionDoc::new(Uuid::new_v4().to_string()),
            is_new: true,
            dirty: false,
        }
    }

    fn existing(doc: SessionDoc) -> Self {
        Self {
            doc,
            is_new: false,
            dirty: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.doc.session_id
    }

    pub fn user_id(&self) -> Option<ObjectId> {
        self.doc.user_id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bind the session to an authenticated user
    pub fn set_user(&mut self, id: ObjectId) {
        self.doc.user_id = Some(id);
        self.dirty = true;
    }

    /// Drop the user binding (logout). The session itself survives.
    pub fn clear_user(&mut self) {
        if self.doc.user_id.take().is_some() {
            self.dirty = true;
        }
    }

    /// Queue a one-time notification for the next rendered page
    pub fn add_flash(&mut self, flash: Flash) {
        self.doc.flash.push(flash);
        self.dirty = true;
    }

    /// Drain pending flash messages (read-once semantics)
    pub fn take_flash(&mut self) -> Vec<Flash> {
        if self.doc.flash.is_empty() {
            return Vec::new();
        }
        self.dirty = true;
        std::mem::take(&mut self.doc.flash)
    }

    /// Stash a username for register-form prefill
    pub fn set_prefill_username(&mut self, username: String) {
        if self.doc.prefill_username.as_deref() != Some(username.as_str()) {
            self.doc.prefill_username = Some(username);
            self.dirty = true;
        }
    }

    pub fn prefill_username(&self) -> Option<&str> {
        self.doc.prefill_username.as_deref()
    }

    /// Stash an email for register-form prefill
    pub fn set_prefill_email(&mut self, email: String) {
        if self.doc.prefill_email.as_deref() != Some(email.as_str()) {
            self.doc.prefill_email = Some(email);
            self.dirty = true;
        }
    }

    pub fn prefill_email(&self) -> Option<&str> {
        self.doc.prefill_email.as_deref()
    }
}

/// MongoDB-backed session store with signed-cookie addressing
#[derive(Clone)]
pub struct SessionStore {
    sessions: MongoCollection<SessionDoc>,
    secret: String,
}

impl SessionStore {
    /// Open the sessions collection (applies the unique and TTL indexes)
    pub async fn new(mongo: &MongoClient, secret: &str) -> Result<Self> {
        let sessions = mongo.collection::<SessionDoc>(SESSION_COLLECTION).await?;
        Ok(Self {
            sessions,
            secret: secret.to_string(),
        })
    }

    /// Load the session referenced by the request's Cookie header, or
    /// start a fresh one when the reference is absent or unusable.
    pub async fn load(&self, cookie_header: Option<&str>) -> Result<Session> {
        let token = cookie_header
            .and_then(|h| extract_cookie(h, SESSION_COOKIE))
            .and_then(|v| verify_cookie_value(&self.secret, &v));

        let token = match token {
            Some(t) => t,
            None => return Ok(Session::fresh()),
        };

        match self
            .sessions
            .find_one(doc! { "session_id": &token })
            .await?
        {
            Some(doc) if !doc.is_expired() => Ok(Session::existing(doc)),
            Some(_) => {
                debug!("Session {} expired, starting fresh", token);
                Ok(Session::fresh())
            }
            None => Ok(Session::fresh()),
        }
    }

    /// Persist the session and return a Set-Cookie value when the client
    /// needs one. A write failure here is fatal for the request.
    pub async fn save(&self, session: &mut Session) -> Result<Option<String>> {
        if session.is_new {
            self.sessions.insert_one(session.doc.clone()).await?;
            session.is_new = false;
            session.dirty = false;
            return Ok(Some(cookie_for(&self.secret, session.session_id())));
        }

        let now = Utc::now();
        if session.dirty {
            // Mutated this request: full rewrite, sliding the expiry
            session.doc.expires_at = now + session_ttl();
            let flash = bson::to_bson(&session.doc.flash)
                .map_err(|e| AppError::Database(format!("Session encode failed: {}", e)))?;
            let prefill = session
                .doc
                .prefill_username
                .clone()
                .map(bson::Bson::String)
                .unwrap_or(bson::Bson::Null);
            let prefill_email = session
                .doc
                .prefill_email
                .clone()
                .map(bson::Bson::String)
                .unwrap_or(bson::Bson::Null);
            let user_id = session
                .doc
                .user_id
                .map(bson::Bson::ObjectId)
                .unwrap_or(bson::Bson::Null);

            self.sessions
                .update_one(
                    doc! { "session_id": session.session_id() },
                    doc! { "$set": {
                        "user_id": user_id,
                        "flash": flash,
                        "prefill_username": prefill,
                        "prefill_email": prefill_email,
                        "expires_at": bson::DateTime::from_millis(session.doc.expires_at.timestamp_millis()),
                        "metadata.updated_at": bson::DateTime::now(),
                    }},
                )
                .await?;
            session.dirty = false;
        } else if session.doc.needs_touch(now) {
            // Untouched but stale: refresh expiry only
            let expires_at = now + session_ttl();
            self.sessions
                .update_one(
                    doc! { "session_id": session.session_id() },
                    doc! { "$set": {
                        "expires_at": bson::DateTime::from_millis(expires_at.timestamp_millis()),
                        "metadata.updated_at": bson::DateTime::now(),
                    }},
                )
                .await?;
        }

        Ok(None)
    }
}

/// Build the signed, HttpOnly Set-Cookie value for a session token
fn cookie_for(secret: &str, token: &str) -> String {
    format!(
        "{}={}.{}; Path=/; HttpOnly; Max-Age={}",
        SESSION_COOKIE,
        token,
        sign(secret, token),
        SESSION_TTL_DAYS * 24 * 60 * 60,
    )
}

/// HMAC-SHA256 signature over the session token, base64url encoded
fn sign(secret: &str, token: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key length is unrestricted"));
    mac.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Split a `token.signature` cookie value and check the signature.
/// Returns the token only when the signature verifies.
fn verify_cookie_value(secret: &str, value: &str) -> Option<String> {
    let (token, signature) = value.rsplit_once('.')?;
    if token.is_empty() {
        return None;
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(token.as_bytes());
    let decoded = URL_SAFE_NO_PAD.decode(signature).ok()?;
    mac.verify_slice(&decoded).ok()?;

    Some(token.to_string())
}

/// Pull one cookie's value out of a Cookie header
fn extract_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_value_round_trips() {
        let token = Uuid::new_v4().to_string();
        let value = format!("{}.{}", token, sign("topsecret", &token));
        assert_eq!(
            verify_cookie_value("topsecret", &value),
            Some(token.clone())
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = "aaaa-bbbb";
        let value = format!("{}.{}", "cccc-dddd", sign("topsecret", token));
        assert_eq!(verify_cookie_value("topsecret", &value), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = "aaaa-bbbb";
        let value = format!("{}.{}", token, sign("topsecret", token));
        assert_eq!(verify_cookie_value("othersecret", &value), None);
    }

    #[test]
    fn garbage_cookie_values_are_rejected() {
        assert_eq!(verify_cookie_value("s", "no-separator"), None);
        assert_eq!(verify_cookie_value("s", ".only-signature"), None);
        assert_eq!(verify_cookie_value("s", "token.!!not-base64!!"), None);
    }

    #[test]
    fn extracts_cookie_among_many() {
        let header = "theme=dark; sid=abc.def; lang=en";
        assert_eq!(extract_cookie(header, "sid"), Some("abc.def".to_string()));
        assert_eq!(extract_cookie(header, "lang"), Some("en".to_string()));
        assert_eq!(extract_cookie(header, "missing"), None);
    }

    #[test]
    fn flash_is_read_once() {
        let mut session = Session::fresh();
        session.add_flash(Flash::success("Welcome"));
        session.add_flash(Flash::error("nope"));

        let drained = session.take_flash();
        assert_eq!(drained.len(), 2);
        assert!(session.take_flash().is_empty());
    }

    #[test]
    fn mutations_mark_dirty() {
        let mut session = Session::fresh();
        assert!(!session.is_dirty());

        session.set_user(ObjectId::new());
        assert!(session.is_dirty());

        let mut session = Session::fresh();
        session.clear_user(); // already anonymous, nothing changed
        assert!(!session.is_dirty());

        session.set_prefill_username("galleria".into());
        assert!(session.is_dirty());
    }

    #[test]
    fn logout_clears_binding_but_keeps_session() {
        let mut session = Session::fresh();
        let sid = session.session_id().to_string();
        session.set_user(ObjectId::new());

        session.clear_user();
        assert!(session.user_id().is_none());
        assert_eq!(session.session_id(), sid);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = cookie_for("topsecret", "tok");
        assert!(cookie.starts_with("sid=tok."));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));

        // The value part must verify with the same secret
        let value = cookie
            .strip_prefix("sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert_eq!(
            verify_cookie_value("topsecret", value),
            Some("tok".to_string())
        );
    }
}
