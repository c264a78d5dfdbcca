//! HTTP server implementation
//!
//! hyper http1 with TokioIo; one task per connection. The route table,
//! session persistence, and the terminal error handler all live in
//! `handle_request`, so every handler above it only has to return a
//! `Result<Response, AppError>`.

use hyper::body::Incoming;
use hyper::header::{HeaderValue, COOKIE, SET_COOKIE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::{self, CredentialStore};
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes::{html_response, pages, users, BoxBody};
use crate::session::SessionStore;
use crate::types::{AppError, Result};
use crate::views;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub creds: CredentialStore,
    pub sessions: SessionStore,
}

impl AppState {
    /// Open both collections (users, sessions) and build the state.
    /// Index creation happens here, before the first request is accepted.
    pub async fn new(args: Args, mongo: &MongoClient) -> Result<Self> {
        let creds = CredentialStore::new(mongo).await?;
        let sessions = SessionStore::new(mongo, args.session_secret()).await?;
        Ok(Self {
            args,
            creds,
            sessions,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Gallery Timeless listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route one request: load session, resolve identity, dispatch, render
/// errors, persist the session, attach the cookie.
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    info!("[{}] {} {}", addr, method, path);

    let cookie_header = req
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let mut session = match state.sessions.load(cookie_header.as_deref()).await {
        Ok(s) => s,
        Err(e) => {
            error!("Session load failed: {}", e);
            return Ok(render_error(&e));
        }
    };

    let current = auth::current_user(&state.creds, &session).await;

    let result: Result<Response<BoxBody>> = match (method, path.as_str()) {
        (Method::GET, "/") => Ok(pages::home(&mut session, current.as_ref())),
        (Method::GET, "/login") => Ok(pages::login_form(&mut session, current.as_ref())),
        (Method::GET, "/register") => Ok(pages::register_form(
            query.as_deref(),
            &mut session,
            current.as_ref(),
        )),
        (Method::POST, "/register") => users::register(req, &state, &mut session).await,
        (Method::POST, "/login") => users::login(req, &state, &mut session).await,
        (Method::GET, "/logout") => Ok(users::logout(&mut session)),
        (Method::GET, "/gallery") => Ok(pages::gallery(&mut session, current.as_ref())),

        // Any unmatched verb+path
        _ => Err(AppError::NotFound("Page Not Found".into())),
    };

    let mut response = match result {
        Ok(r) => r,
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("Request failed: {}", e);
            }
            render_error(&e)
        }
    };

    // Persist session state; a store write failure is fatal for the request
    match state.sessions.save(&mut session).await {
        Ok(Some(cookie)) => {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(SET_COOKIE, value);
            }
        }
        Ok(None) => {}
        Err(e) => {
            error!("Session write failed: {}", e);
            response = render_error(&e);
        }
    }

    Ok(response)
}

/// Terminal error handler: render the error page with the error's status
/// and public message.
fn render_error(err: &AppError) -> Response<BoxBody> {
    let status = err.status_code();
    html_response(
        status,
        views::error_page(status.as_u16(), &err.public_message()),
    )
}
