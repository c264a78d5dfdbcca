//! HTTP route handlers

pub mod pages;
pub mod users;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::{Response, StatusCode};
use serde::Deserialize;

use crate::types::{AppError, Result};

/// Largest accepted form body. The reader stops at this bound, so an
/// oversized upload never accumulates in memory.
const MAX_FORM_BYTES: usize = 10 * 1024;

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Render an HTML page
pub(crate) fn html_response(status: StatusCode, body: String) -> Response<BoxBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("X-Content-Type-Options", "nosniff")
        .body(full_body(body))
        .unwrap()
}

/// 302 redirect
pub(crate) fn redirect(location: &str) -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", location)
        .body(full_body(Bytes::new()))
        .unwrap()
}

/// Read and decode an application/x-www-form-urlencoded body
pub(crate) async fn parse_form<T: for<'de> Deserialize<'de>>(
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<T> {
    decode_form(req.into_body()).await
}

async fn decode_form<T, B>(body: B) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    B: hyper::body::Body,
    B::Data: bytes::Buf,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let collected = Limited::new(body, MAX_FORM_BYTES)
        .collect()
        .await
        .map_err(|e| AppError::Http(format!("Failed to read body: {}", e)))?;

    serde_urlencoded::from_bytes(&collected.to_bytes())
        .map_err(|e| AppError::Http(format!("Invalid form body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_is_302_with_location() {
        let resp = redirect("/gallery");
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()["Location"], "/gallery");
    }

    #[derive(Debug, Deserialize)]
    struct NameForm {
        name: String,
    }

    #[tokio::test]
    async fn form_body_decodes() {
        let body = Full::new(Bytes::from_static(b"name=ansel%20a"));
        let form: NameForm = decode_form(body).await.unwrap();
        assert_eq!(form.name, "ansel a");
    }

    #[tokio::test]
    async fn oversized_form_body_is_rejected() {
        let oversized = format!("name={}", "x".repeat(MAX_FORM_BYTES));
        let body = Full::new(Bytes::from(oversized));
        let result: Result<NameForm> = decode_form(body).await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn html_response_sets_content_type() {
        let resp = html_response(StatusCode::OK, "<html></html>".into());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()["Content-Type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(resp.headers()["X-Content-Type-Options"], "nosniff");
    }
}
