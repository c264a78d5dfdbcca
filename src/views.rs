//! Server-rendered HTML pages
//!
//! A minimal stand-in for the template engine: one shared layout with a
//! nav and flash banner, plus the five page bodies. Everything dynamic
//! goes through `escape` before it reaches the markup.

use crate::db::schemas::{Flash, FlashKind};

/// Escape text for interpolation into HTML
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flash_banner(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| {
            let class = match f.kind {
                FlashKind::Success => "flash flash-success",
                FlashKind::Error => "flash flash-error",
            };
            format!(
                r#"<div class="{}" role="alert">{}</div>"#,
                class,
                escape(&f.message)
            )
        })
        .collect()
}

fn nav(current_user: Option<&str>) -> String {
    match current_user {
        Some(username) => format!(
            concat!(
                r#"<nav><a href="/">Home</a> <a href="/gallery">Gallery</a> "#,
                r#"<span>Signed in as {}</span> <a href="/logout">Logout</a></nav>"#
            ),
            escape(username)
        ),
        None => concat!(
            r#"<nav><a href="/">Home</a> <a href="/gallery">Gallery</a> "#,
            r#"<a href="/login">Login</a> <a href="/register">Register</a></nav>"#
        )
        .to_string(),
    }
}

fn layout(title: &str, current_user: Option<&str>, flashes: &[Flash], body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            "<title>{title} | Gallery Timeless</title></head>\n",
            "<body>\n{nav}\n{flash}\n<main>\n{body}\n</main>\n</body></html>"
        ),
        title = escape(title),
        nav = nav(current_user),
        flash = flash_banner(flashes),
        body = body,
    )
}

/// Landing page (unauthenticated-safe)
pub fn home(current_user: Option<&str>, flashes: &[Flash]) -> String {
    layout(
        "Home",
        current_user,
        flashes,
        concat!(
            "<h1>Gallery Timeless</h1>\n",
            "<p>A timeless collection of photographs.</p>\n",
            r#"<p><a href="/gallery">Enter the gallery</a></p>"#
        ),
    )
}

/// Login form
pub fn login(current_user: Option<&str>, flashes: &[Flash]) -> String {
    layout(
        "Login",
        current_user,
        flashes,
        concat!(
            "<h1>Login</h1>\n",
            r#"<form method="post" action="/login">"#,
            r#"<label>Username <input type="text" name="username" required></label>"#,
            r#"<label>Password <input type="password" name="password" required></label>"#,
            r#"<button type="submit">Login</button>"#,
            "</form>"
        ),
    )
}

/// Registration form. Stashed values keep the form sticky: the username
/// from the query string or a failed submission, the email from a failed
/// submission only.
pub fn register(
    current_user: Option<&str>,
    flashes: &[Flash],
    prefill_username: Option<&str>,
    prefill_email: Option<&str>,
) -> String {
    let username_value = prefill_username.map(escape).unwrap_or_default();
    let email_value = prefill_email.map(escape).unwrap_or_default();
    let body = format!(
        concat!(
            "<h1>Register</h1>\n",
            r#"<form method="post" action="/register">"#,
            r#"<label>Email <input type="email" name="email" value="{email}"></label>"#,
            r#"<label>Username <input type="text" name="username" value="{username}"></label>"#,
            r#"<label>Password <input type="password" name="password"></label>"#,
            r#"<label>Confirm password <input type="password" name="password_confirmation"></label>"#,
            r#"<button type="submit">Register</button>"#,
            "</form>"
        ),
        email = email_value,
        username = username_value,
    );
    layout("Register", current_user, flashes, &body)
}

/// Gallery page, only reachable through the auth gate
pub fn gallery(current_user: Option<&str>, flashes: &[Flash]) -> String {
    layout(
        "Gallery",
        current_user,
        flashes,
        concat!(
            "<h1>Gallery</h1>\n",
            "<p>Welcome to the collection.</p>"
        ),
    )
}

/// Terminal error page
pub fn error_page(status: u16, message: &str) -> String {
    let body = format!("<h1>{}</h1>\n<p>{}</p>", status, escape(message));
    layout("Error", None, &[], &body)
}
