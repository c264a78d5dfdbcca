//! Error types for Gallery Timeless

use hyper::StatusCode;

/// Main error type for application operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Form validation failed; the message is the comma-joined list of
    /// per-field errors, shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    /// Wrong username or password. One message for both cases so the
    /// response never reveals whether the account exists.
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("{0}")]
    DuplicateKey(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl AppError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DuplicateKey(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The text shown on an error page. Server-side failures get one
    /// generic message; everything else is already user-facing.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Auth(_) => "Oh No, Something Went Wrong!".to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures the user can fix by resubmitting the form.
    /// These flash their message and redirect instead of rendering an
    /// error page.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidCredentials | Self::DuplicateKey(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, AppError>;
