use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT payload. `sub` stays a string here so a missing or malformed subject
/// is reported separately from a bad signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String, // user ID
    pub exp: u64,    // expires at (unix timestamp)
    pub iat: u64,    // issued at (unix timestamp)
    pub iss: String,
    pub aud: String,
    pub jti: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}
