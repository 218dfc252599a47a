//! Identity value types: bearer token, identity id, authentication outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

const BEARER_PREFIX: &str = "Bearer ";

/// Raw bearer credential. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token, rejecting empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == raw.len() {
            Some(Self(raw))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Extract the token from an `Authorization` header value of the form
    /// `Bearer <token>`. The scheme is matched case-sensitively.
    pub fn from_bearer_header(value: Option<&str>) -> Option<Self> {
        value?.strip_prefix(BEARER_PREFIX).and_then(Token::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep credentials out of logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Authenticated principal identifier returned by the auth backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(i64);

impl IdentityId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IdentityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Why a token was rejected. Decides 401 vs 503 at the Authentication stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCause {
    /// The token itself is missing, malformed or refused by the backend.
    InvalidCredentials,
    /// The backend could not be reached, timed out, or answered 5xx.
    ServiceUnavailable,
    /// The backend answered with something we could not interpret.
    ServiceError,
}

/// Result of validating a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    Authenticated { identity_id: IdentityId },
    Rejected { reason: String, cause: RejectionCause },
}

impl AuthenticationOutcome {
    pub fn authenticated(identity_id: impl Into<IdentityId>) -> Self {
        Self::Authenticated {
            identity_id: identity_id.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>, cause: RejectionCause) -> Self {
        Self::Rejected {
            reason: reason.into(),
            cause,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::rejected(reason, RejectionCause::InvalidCredentials)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authenticated { .. } => "authenticated",
            Self::Rejected {
                cause: RejectionCause::InvalidCredentials,
                ..
            } => "rejected",
            Self::Rejected {
                cause: RejectionCause::ServiceUnavailable,
                ..
            } => "unavailable",
            Self::Rejected {
                cause: RejectionCause::ServiceError,
                ..
            } => "error",
        }
    }
}
