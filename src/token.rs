//! Signed token issuance and verification.
//!
//! Both token kinds carry the same identity claim (the subject) and differ
//! only in lifetime and in the `typ` claim. Verification distinguishes a
//! legitimately expired token from a tampered one because only the former
//! is eligible for silent rotation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Token kind, embedded as the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived, authorizes requests directly.
    Access,
    /// Long-lived, only ever exchanged for a new access token.
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity (user email).
    pub sub: String,
    /// Token kind.
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// Outcome of decoding a token. Callers must branch on all three.
#[derive(Debug, Clone)]
pub enum Decoded {
    /// Signature and expiry check out.
    Valid(Claims),
    /// Signature checks out but the token is past its expiry.
    Expired,
    /// Bad signature, malformed structure, wrong algorithm, or wrong kind.
    Invalid,
}

impl Decoded {
    pub fn subject(&self) -> Option<&str> {
        match self {
            Decoded::Valid(claims) => Some(&claims.sub),
            Decoded::Expired | Decoded::Invalid => None,
        }
    }
}

/// Errors that can occur when issuing a token.
#[derive(Debug)]
pub enum TokenError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}

/// HS256 signing configuration. Built once at startup from the process-wide
/// secret; rotating the secret invalidates all outstanding tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a signed token for `subject` expiring `ttl_secs` from now.
    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl_secs: u64,
    ) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::TimeError)?
            .as_secs();

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            iat: now,
            exp: now + ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Issue an access token (15 minutes).
    pub fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenKind::Access, ACCESS_TOKEN_TTL_SECS)
    }

    /// Issue a refresh token (7 days).
    pub fn issue_refresh(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenKind::Refresh, REFRESH_TOKEN_TTL_SECS)
    }

    /// Decode and verify a token, expecting the given kind.
    ///
    /// A token of the wrong kind is `Invalid` even when its signature and
    /// expiry check out: a refresh token must never authorize a request,
    /// and an access token must never mint new credentials. The kind check
    /// applies to expired tokens too, so only a legitimately expired token
    /// of the expected kind is reported rotation-eligible.
    pub fn decode(&self, token: &str, kind: TokenKind) -> Decoded {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) if data.claims.kind == kind => Decoded::Valid(data.claims),
            Ok(_) => Decoded::Invalid,
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    self.check_expired_kind(token, kind)
                }
                _ => Decoded::Invalid,
            },
        }
    }

    /// Expiry is reported before the claims are ever surfaced, so re-decode
    /// without the expiry check to read the `typ` claim of an expired token.
    /// The signature has already been verified at this point.
    fn check_expired_kind(&self, token: &str, kind: TokenKind) -> Decoded {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;

        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) if data.claims.kind == kind => Decoded::Expired,
            _ => Decoded::Invalid,
        }
    }

    /// Decode an access token.
    pub fn decode_access(&self, token: &str) -> Decoded {
        self.decode(token, TokenKind::Access)
    }

    /// Decode a refresh token.
    pub fn decode_refresh(&self, token: &str) -> Decoded {
        self.decode(token, TokenKind::Refresh)
    }
}
