//! Registration input validation
//!
//! Checks every rule, collects every failure, and joins them into a single
//! comma-separated message so the form can show the whole story at once.
//! The message strings are load-bearing: the front end and its tests match
//! on them verbatim.

use serde::Deserialize;

use crate::auth::store::RegistrationDraft;
use crate::types::{AppError, Result};

/// Raw registration form fields, straight from the POST body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

pub const USERNAME_MIN: usize = 5;
pub const USERNAME_MAX: usize = 25;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 32;

/// Top-level domains accepted for registration emails
const ALLOWED_TLDS: [&str; 2] = ["com", "net"];

impl RegistrationInput {
    /// Validate and normalize.
    ///
    /// On success the email and username come back trimmed; on failure all
    /// collected messages are joined into one `AppError::Validation`.
    pub fn validate(&self) -> Result<RegistrationDraft> {
        let mut errors: Vec<String> = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push("\"email\" is required".to_string());
        } else if !is_valid_email(email) {
            errors.push("Please fill a valid email address".to_string());
        }

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("\"username\" is required".to_string());
        } else {
            let len = username.chars().count();
            if len < USERNAME_MIN {
                errors.push("Username: minimum 5 character required".to_string());
            } else if len > USERNAME_MAX {
                errors.push("Username: maximum 25 characters allowed".to_string());
            }
        }

        if self.password.is_empty() {
            errors.push("\"password\" is required".to_string());
        } else {
            let len = self.password.chars().count();
            if len < PASSWORD_MIN {
                errors.push("Password: minimum 8 character required".to_string());
            } else if len > PASSWORD_MAX {
                errors.push("Password: maximum 32 characters allowed".to_string());
            }
            if !has_required_character_classes(&self.password) {
                errors.push(
                    "Password must contain atleast one Upper and Lower case letter with one Number"
                        .to_string(),
                );
            }
        }

        if self.password_confirmation.is_empty() {
            errors.push("\"Confirm password\" is required".to_string());
        } else if self.password_confirmation != self.password {
            errors.push("Password does not match".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(",")));
        }

        Ok(RegistrationDraft {
            email: email.to_string(),
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

/// Syntactic email check with an allow-listed TLD.
///
/// One `@`, a non-empty local part, and a dotted domain of at least two
/// non-empty labels ending in an allowed TLD.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }

    let tld = labels[labels.len() - 1].to_ascii_lowercase();
    ALLOWED_TLDS.contains(&tld.as_str())
}

/// At least one lowercase letter, one uppercase letter, and one digit
fn has_required_character_classes(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str, username: &str, password: &str, confirmation: &str) -> RegistrationInput {
        RegistrationInput {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
        }
    }

    fn error_message(input: &RegistrationInput) -> String {
        match input.validate() {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn valid_input_normalizes() {
        let draft = input("  ansel@photos.com ", " adamsgallery ", "Abcdef12", "Abcdef12")
            .validate()
            .unwrap();
        assert_eq!(draft.email, "ansel@photos.com");
        assert_eq!(draft.username, "adamsgallery");
        assert_eq!(draft.password, "Abcdef12");
    }

    #[test]
    fn password_without_upper_and_digit_fails_with_exact_message() {
        let msg = error_message(&input(
            "user@example.com",
            "validuser",
            "abcdefgh",
            "abcdefgh",
        ));
        assert!(msg.contains(
            "Password must contain atleast one Upper and Lower case letter with one Number"
        ));
    }

    #[test]
    fn confirmation_mismatch_fails_with_exact_message() {
        let msg = error_message(&input(
            "user@example.com",
            "validuser",
            "Abcdef12",
            "Abcdef13",
        ));
        assert_eq!(msg, "Password does not match");
    }

    #[test]
    fn email_tld_allow_list() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("a@b.net"));
        assert!(is_valid_email("a@mail.b.COM"));
        assert!(!is_valid_email("a@b.org"));
        assert!(!is_valid_email("a@b.io"));
    }

    #[test]
    fn email_syntax_rules() {
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@missing-local.com"));
        assert!(!is_valid_email("a@no-dot-com"));
        assert!(!is_valid_email("a@double..com"));
        assert!(!is_valid_email("a b@spaces.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn username_length_bounds() {
        let msg = error_message(&input("u@e.com", "abcd", "Abcdef12", "Abcdef12"));
        assert!(msg.contains("Username: minimum 5 character required"));

        let long = "a".repeat(26);
        let msg = error_message(&input("u@e.com", &long, "Abcdef12", "Abcdef12"));
        assert!(msg.contains("Username: maximum 25 characters allowed"));

        // Inclusive bounds
        assert!(input("u@e.com", "abcde", "Abcdef12", "Abcdef12")
            .validate()
            .is_ok());
        assert!(input("u@e.com", &"a".repeat(25), "Abcdef12", "Abcdef12")
            .validate()
            .is_ok());
    }

    #[test]
    fn password_length_bounds() {
        let msg = error_message(&input("u@e.com", "validuser", "Abc1", "Abc1"));
        assert!(msg.contains("Password: minimum 8 character required"));

        let long = format!("Aa1{}", "x".repeat(30));
        let msg = error_message(&input("u@e.com", "validuser", &long, &long));
        assert!(msg.contains("Password: maximum 32 characters allowed"));

        // Inclusive bounds: 8 and 32 characters both pass
        assert!(input("u@e.com", "validuser", "Abcdef12", "Abcdef12")
            .validate()
            .is_ok());
        let max = format!("Aa1{}", "x".repeat(29));
        assert_eq!(max.len(), 32);
        assert!(input("u@e.com", "validuser", &max, &max).validate().is_ok());
    }

    #[test]
    fn errors_aggregate_in_field_order() {
        let msg = error_message(&input("bad-email", "abc", "Abcde1", "different"));
        let parts: Vec<&str> = msg.split(',').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "Please fill a valid email address");
        assert_eq!(parts[1], "Username: minimum 5 character required");
        assert_eq!(parts[2], "Password: minimum 8 character required");
        assert_eq!(parts[3], "Password does not match");
    }

    #[test]
    fn missing_fields_are_reported_as_required() {
        let msg = error_message(&RegistrationInput::default());
        assert!(msg.contains("\"email\" is required"));
        assert!(msg.contains("\"username\" is required"));
        assert!(msg.contains("\"password\" is required"));
        assert!(msg.contains("\"Confirm password\" is required"));
    }

    #[test]
    fn validation_error_carries_bad_request_status() {
        let err = input("bad", "bad", "bad", "bad").validate().unwrap_err();
        assert_eq!(err.status_code(), hyper::StatusCode::BAD_REQUEST);
    }
}
