//! Authentication Types

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Crowdin OAuth access token.
///
/// Crowdin issues JWTs; the expiry and organization domain are read from the
/// claims when present. Tokens that do not decode are still usable, they just
/// carry no metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<i64>,
    domain: Option<String>,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    domain: Option<String>,
}

impl AccessToken {
    /// Wrap a raw token string, decoding JWT claims best-effort.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        let claims = decode_claims(&secret);

        Self {
            expires_at: claims.as_ref().and_then(|c| c.exp),
            domain: claims
                .and_then(|c| c.domain)
                .filter(|d| !d.trim().is_empty()),
            secret,
        }
    }

    /// Set an expiry when the claims did not provide one.
    ///
    /// A lifetime too large to represent leaves the expiry unknown.
    pub fn with_expires_in(self, seconds: i64) -> Self {
        if seconds <= 0 {
            return self;
        }
        match Utc::now().timestamp().checked_add(seconds) {
            Some(ts) => self.with_expires_at(ts),
            None => self,
        }
    }

    /// Set an absolute expiry when the claims did not provide one.
    pub(crate) fn with_expires_at(mut self, ts: i64) -> Self {
        if self.expires_at.is_none() && DateTime::<Utc>::from_timestamp(ts, 0).is_some() {
            self.expires_at = Some(ts);
        }
        self
    }

    /// Raw token value for the `Authorization` header and secure storage.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Expiry as a Unix timestamp, if known.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }

    /// Crowdin Enterprise organization the token belongs to.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// True only when an expiry is known and has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Utc::now().timestamp() >= exp)
            .unwrap_or(false)
    }

    /// API base URL for requests made with this token.
    ///
    /// Enterprise tokens talk to `https://{domain}.api.crowdin.com/api/v2/`;
    /// everything else uses `default`.
    pub fn api_base_url(&self, default: &str) -> String {
        match &self.domain {
            Some(domain) => format!("https://{}.api.crowdin.com/api/v2/", domain),
            None => default.to_string(),
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("domain", &self.domain)
            .finish()
    }
}

fn decode_claims(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
pub(crate) fn jwt_with_claims(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
