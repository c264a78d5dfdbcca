//! Registration, login, and logout controllers
//!
//! User-correctable failures (validation, duplicate account, wrong
//! credentials) are converted into a flash message plus a 302 back to the
//! originating form. Anything else propagates to the terminal error
//! handler in `server::http`.

use hyper::body::Incoming;
use hyper::{Request, Response};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{establish, teardown};
use crate::db::schemas::Flash;
use crate::routes::{parse_form, redirect, BoxBody};
use crate::server::AppState;
use crate::session::Session;
use crate::types::Result;
use crate::validation::RegistrationInput;

/// Login form fields
#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Flash shown when the form body itself cannot be decoded. The decode
/// error text is internal and never reaches the page.
const INVALID_FORM_MESSAGE: &str = "Invalid form submission";

/// Send an unreadable form back to its page with a generic flash
fn reject_unreadable_form(session: &mut Session, back: &str) -> Response<BoxBody> {
    session.add_flash(Flash::error(INVALID_FORM_MESSAGE));
    redirect(back)
}

/// Send a failed registration back to the form. The submitted email and
/// username are stashed so the re-rendered form stays sticky; only the
/// passwords are dropped.
fn reject_registration(
    session: &mut Session,
    input: &RegistrationInput,
    message: String,
) -> Response<BoxBody> {
    session.set_prefill_username(input.username.trim().to_string());
    session.set_prefill_email(input.email.trim().to_string());
    session.add_flash(Flash::error(message));
    redirect("/register")
}

/// POST /register
///
/// Validation → credential store → session establishment. Success lands
/// on the gallery; every user-correctable failure flashes its message and
/// returns to the form.
pub async fn register(
    req: Request<Incoming>,
    state: &AppState,
    session: &mut Session,
) -> Result<Response<BoxBody>> {
    let input: RegistrationInput = match parse_form(req).await {
        Ok(form) => form,
        Err(e) => {
            debug!("Unreadable registration form: {}", e);
            return Ok(reject_unreadable_form(session, "/register"));
        }
    };

    let draft = match input.validate() {
        Ok(d) => d,
        Err(e) => {
            return Ok(reject_registration(session, &input, e.to_string()));
        }
    };

    let user = match state.creds.register(draft).await {
        Ok(u) => u,
        Err(e) if e.is_user_correctable() => {
            return Ok(reject_registration(session, &input, e.to_string()));
        }
        Err(e) => return Err(e),
    };

    // Log the new user straight in
    establish(session, &user)?;
    session.add_flash(Flash::success("Welcome"));
    Ok(redirect("/gallery"))
}

/// POST /login
pub async fn login(
    req: Request<Incoming>,
    state: &AppState,
    session: &mut Session,
) -> Result<Response<BoxBody>> {
    let form: LoginForm = match parse_form(req).await {
        Ok(f) => f,
        Err(e) => {
            debug!("Unreadable login form: {}", e);
            return Ok(reject_unreadable_form(session, "/login"));
        }
    };

    let user = match state
        .creds
        .authenticate(form.username.trim(), &form.password)
        .await
    {
        Ok(u) => u,
        Err(e) if e.is_user_correctable() => {
            session.add_flash(Flash::error(e.to_string()));
            return Ok(redirect("/login"));
        }
        Err(e) => return Err(e),
    };

    establish(session, &user)?;
    session.add_flash(Flash::success("Welcome to Gallery Timeless!"));
    Ok(redirect("/gallery"))
}

/// GET /logout
pub fn logout(session: &mut Session) -> Response<BoxBody> {
    teardown(session);
    session.add_flash(Flash::success("Goodbye!"));
    redirect("/login")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use hyper::StatusCode;

    #[test]
    fn failed_registration_keeps_email_and_username_sticky() {
        let mut session = Session::fresh();
        let input = RegistrationInput {
            email: " ansel@photos.com ".into(),
            username: " abc ".into(),
            password: "Abcdef12".into(),
            password_confirmation: "Abcdef12".into(),
        };
        let message = input.validate().unwrap_err().to_string();

        let resp = reject_registration(&mut session, &input, message.clone());
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()["Location"], "/register");

        // Submitted values survive the redirect, trimmed; passwords do not
        assert_eq!(session.prefill_username(), Some("abc"));
        assert_eq!(session.prefill_email(), Some("ansel@photos.com"));

        let flashes = session.take_flash();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, message);
    }

    #[test]
    fn unreadable_form_flash_is_generic() {
        let mut session = Session::fresh();
        let resp = reject_unreadable_form(&mut session, "/login");
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()["Location"], "/login");

        let flashes = session.take_flash();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, "Invalid form submission");
        assert!(!flashes[0].message.contains("HTTP error"));
    }

    #[test]
    fn logout_clears_user_and_flashes_goodbye() {
        let mut session = Session::fresh();
        session.set_user(ObjectId::new());
        session.take_flash();

        let resp = logout(&mut session);
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()["Location"], "/login");
        assert!(session.user_id().is_none());

        let flashes = session.take_flash();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, "Goodbye!");
    }
}
