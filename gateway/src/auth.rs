//! Bearer token checks for the event stream.

use crate::error::GatewayError;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::collections::HashSet;

/// Decides whether a bearer token may open a stream.
pub trait TokenValidator: Send + Sync {
    /// Whether `token` is accepted.
    fn validate(&self, token: &str) -> bool;
}

/// Accepts a fixed set of tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashSet<String>,
}

impl StaticTokens {
    /// Accept exactly these tokens. Blank entries are ignored.
    #[must_use]
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }

    /// Number of accepted tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token is accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenValidator for StaticTokens {
    fn validate(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively and the token is trimmed.
///
/// # Errors
///
/// [`GatewayError::MissingToken`] if the header is absent, not text, or not
/// a bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GatewayError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(GatewayError::MissingToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(GatewayError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GatewayError::MissingToken);
    }

    Ok(token.trim())
}

/// Check the request's bearer token against `validator`.
///
/// # Errors
///
/// - [`GatewayError::MissingToken`] without a bearer credential
/// - [`GatewayError::InvalidToken`] if the validator rejects it
pub fn authorize(headers: &HeaderMap, validator: &dyn TokenValidator) -> Result<(), GatewayError> {
    let token = bearer_token(headers)?;
    if token.is_empty() || !validator.validate(token) {
        return Err(GatewayError::InvalidToken);
    }
    Ok(())
}
