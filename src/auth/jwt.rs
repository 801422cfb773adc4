use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{
    claims::{Claims, TokenKind},
    error::AuthError,
};
use crate::config::JwtConfig;

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies access/refresh tokens. Built once from `JwtConfig`.
pub struct JwtKeys {
    signing: Option<SigningKeys>,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    // None when the configured minutes do not fit a Duration.
    access_ttl: Option<Duration>,
    refresh_ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let signing = (!cfg.secret.is_empty()).then(|| SigningKeys {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
        });
        Self {
            signing,
            algorithm: cfg.algorithm,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: ttl_from_minutes(cfg.ttl_minutes),
            refresh_ttl: ttl_from_minutes(cfg.refresh_ttl_minutes),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.signing.is_some()
    }

    fn keys(&self) -> Result<&SigningKeys, AuthError> {
        self.signing.as_ref().ok_or(AuthError::Unconfigured)
    }

    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        let keys = self.keys()?;
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = ttl
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(AuthError::LifetimeOutOfRange)?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as u64,
            exp: expires_at.unix_timestamp() as u64,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            kind,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &keys.encoding)
            .map_err(AuthError::Encoding)?;
        debug!(user_id = %user_id, kind = %kind, "jwt signed");
        Ok(token)
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id)?,
            refresh_token: self.issue_refresh(user_id)?,
        })
    }

    /// Verifies signature, algorithm, issuer, audience and expiry, then returns
    /// the claims untouched. Subject and type checks belong to the caller.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self.keys()?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(std::slice::from_ref(&self.audience));

        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;

        // The library accepts exp == now; a token is dead from its expiry second on.
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if data.claims.exp as i64 <= now {
            return Err(AuthError::Expired);
        }

        debug!(sub = %data.claims.sub, kind = %data.claims.kind, "jwt verified");
        Ok(data.claims)
    }
}

fn ttl_from_minutes(minutes: i64) -> Option<Duration> {
    minutes.checked_mul(60).map(Duration::seconds)
}
