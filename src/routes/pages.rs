//! GET page handlers
//!
//! Each handler drains the session's pending flash messages into the page
//! it renders; the router persists the drained state afterwards.

use hyper::StatusCode;
use serde::Deserialize;

use crate::auth::require_user;
use crate::db::schemas::UserDoc;
use crate::routes::{html_response, redirect, BoxBody};
use crate::session::Session;
use crate::views;

/// Query parameters accepted by GET /register
#[derive(Debug, Default, Deserialize)]
struct RegisterQuery {
    username: Option<String>,
}

/// GET /
pub fn home(session: &mut Session, current: Option<&UserDoc>) -> hyper::Response<BoxBody> {
    let flashes = session.take_flash();
    let username = current.map(|u| u.username.as_str());
    html_response(StatusCode::OK, views::home(username, &flashes))
}

/// GET /login
pub fn login_form(session: &mut Session, current: Option<&UserDoc>) -> hyper::Response<BoxBody> {
    let flashes = session.take_flash();
    let username = current.map(|u| u.username.as_str());
    html_response(StatusCode::OK, views::login(username, &flashes))
}

/// GET /register
///
/// An optional `?username=` parameter is stashed in the session before
/// rendering, so the form prefills it on this response rather than the
/// next one.
pub fn register_form(
    query: Option<&str>,
    session: &mut Session,
    current: Option<&UserDoc>,
) -> hyper::Response<BoxBody> {
    if let Some(q) = query {
        let parsed: RegisterQuery = serde_urlencoded::from_str(q).unwrap_or_default();
        if let Some(username) = parsed.username {
            session.set_prefill_username(username);
        }
    }

    let prefill = session.prefill_username().map(|s| s.to_string());
    let prefill_email = session.prefill_email().map(|s| s.to_string());
    let flashes = session.take_flash();
    let username = current.map(|u| u.username.as_str());
    html_response(
        StatusCode::OK,
        views::register(username, &flashes, prefill.as_deref(), prefill_email.as_deref()),
    )
}

/// GET /gallery (gated)
pub fn gallery(session: &mut Session, current: Option<&UserDoc>) -> hyper::Response<BoxBody> {
    match require_user(current, session) {
        Some(user) => {
            let flashes = session.take_flash();
            html_response(
                StatusCode::OK,
                views::gallery(Some(user.username.as_str()), &flashes),
            )
        }
        None => redirect("/login"),
    }
}
