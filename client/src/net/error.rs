//! Errors surfaced by the backend platform client.

/// Errors produced by platform calls (auth, table queries, realtime).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The request never produced a response (network, CORS, socket open).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The platform answered with a non-success HTTP status.
    #[error("platform returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A response body or realtime frame could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The call needs a session and none is stored.
    #[error("not signed in")]
    Unauthenticated,

    /// The OAuth provider redirected back with an error.
    #[error("sign-in failed: {0}")]
    OAuth(String),

    /// Browser storage is unavailable or rejected the write.
    #[error("session storage unavailable: {0}")]
    Storage(String),

    /// Platform configuration is missing or malformed.
    #[error("platform config invalid: {0}")]
    Config(String),
}

impl PlatformError {
    /// Whether the platform rejected the caller's credentials.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Status { status: 401 | 403, .. })
    }
}
