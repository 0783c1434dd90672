//! Backend message classification.
//!
//! The auth backend reports failures as free-form message text. The
//! screens need a stable reason to pick their copy from, so the substring
//! checks live here as one adapter instead of being scattered through
//! callers. If the backend ever grows structured error codes, this is the
//! only module that changes.

use super::auth::AuthError;

/// Why a sign-in was refused, as far as the message text reveals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInFailure {
    /// The account exists but its email was never confirmed.
    EmailNotConfirmed,
    /// Email/password combination was wrong.
    InvalidCredentials,
    /// Anything else; carries the raw backend message.
    Other(String),
}

impl SignInFailure {
    /// Copy shown on the sign-in screen.
    pub fn user_message(&self) -> String {
        match self {
            SignInFailure::EmailNotConfirmed => {
                "Your email is not confirmed. Please check your inbox for a verification link."
                    .to_string()
            }
            SignInFailure::InvalidCredentials => {
                "Invalid email or password. Please check your credentials and try again."
                    .to_string()
            }
            SignInFailure::Other(message) if !message.is_empty() => message.clone(),
            SignInFailure::Other(_) => "Failed to sign in. Please try again.".to_string(),
        }
    }
}

/// Why a sign-up was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpFailure {
    /// The email already has an account.
    AlreadyRegistered,
    /// Anything else; carries the raw backend message.
    Other(String),
}

impl SignUpFailure {
    /// Copy shown on the sign-up screen.
    pub fn user_message(&self) -> String {
        match self {
            SignUpFailure::AlreadyRegistered => {
                "An account with this email already exists. Please sign in instead.".to_string()
            }
            SignUpFailure::Other(message) if !message.is_empty() => message.clone(),
            SignUpFailure::Other(_) => "Failed to create account. Please try again.".to_string(),
        }
    }
}

/// Classify a sign-in failure from the backend's message text.
pub fn classify_sign_in(err: &AuthError) -> SignInFailure {
    let message = err.message();
    if message.contains("Email not confirmed") {
        SignInFailure::EmailNotConfirmed
    } else if message.contains("Invalid login credentials") {
        SignInFailure::InvalidCredentials
    } else {
        SignInFailure::Other(message.to_string())
    }
}

/// Classify a sign-up failure from the backend's message text.
pub fn classify_sign_up(err: &AuthError) -> SignUpFailure {
    let message = err.message();
    if message.contains("User already registered") {
        SignUpFailure::AlreadyRegistered
    } else {
        SignUpFailure::Other(message.to_string())
    }
}
