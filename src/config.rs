//! Configuration for Gallery Timeless
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Gallery Timeless - server-rendered gallery with user accounts
#[derive(Parser, Debug, Clone)]
#[command(name = "timeless")]
#[command(about = "Server-rendered gallery with registration, login, and sessions")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "gallery_timeless")]
    pub mongodb_db: String,

    /// Secret used to sign session cookies (required)
    #[arg(long, env = "SESSION_SECRET")]
    pub session_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get the session signing secret. Only meaningful after `validate()`.
    pub fn session_secret(&self) -> &str {
        self.session_secret.as_deref().unwrap_or("")
    }

    /// Validate configuration
    ///
    /// There is no fallback signing secret: an unset or empty
    /// SESSION_SECRET fails startup.
    pub fn validate(&self) -> Result<(), String> {
        match &self.session_secret {
            None => Err("SESSION_SECRET is required".to_string()),
            Some(s) if s.is_empty() => Err("SESSION_SECRET must not be empty".to_string()),
            Some(_) => Ok(()),
        }
    }
}
