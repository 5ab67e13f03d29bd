//! Token validation: pure claim decoding and expiry arithmetic.
//!
//! The bearer token is three dot-separated segments; the middle segment is
//! base64url-encoded JSON claims. Decoding here is advisory and serves UX
//! only (warning banners, forced sign-out) - no signature is checked, and
//! the server remains the authority on every subsequent request.
//!
//! Nothing in this module performs I/O or reads the clock; callers pass the
//! current instant explicitly.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Why a token or stored credential set was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Wrong segment count, or the claims segment failed to decode/parse.
    #[error("token is structurally invalid")]
    MalformedToken,

    /// Structurally fine but carries no expiry claim.
    #[error("token has no expiry claim")]
    MissingExpiry,

    /// Valid structure, expiry in the past.
    #[error("token has expired")]
    Expired,

    /// The credential store held some but not all required fields.
    #[error("stored credentials are incomplete")]
    IncompleteCredentials,
}

/// Claims embedded in the token, extracted without verification.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Outcome of a validity check. Expiry is reported, not swallowed, so
/// callers can tell "expired" apart from "garbage".
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStatus {
    pub is_valid: bool,
    pub error: Option<AuthError>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Decode the claims segment of a bearer token.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}

/// Validate a token against the given instant.
pub fn validate(token: &str, now: DateTime<Utc>) -> TokenStatus {
    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(error) => {
            return TokenStatus {
                is_valid: false,
                error: Some(error),
                expires_at: None,
            }
        }
    };

    let Some(exp) = claims.exp else {
        return TokenStatus {
            is_valid: false,
            error: Some(AuthError::MissingExpiry),
            expires_at: None,
        };
    };

    // An exp outside the representable date range is as good as garbage.
    let Some(expires_at) = Utc.timestamp_opt(exp, 0).single() else {
        return TokenStatus {
            is_valid: false,
            error: Some(AuthError::MalformedToken),
            expires_at: None,
        };
    };

    if expires_at > now {
        TokenStatus {
            is_valid: true,
            error: None,
            expires_at: Some(expires_at),
        }
    } else {
        TokenStatus {
            is_valid: false,
            error: Some(AuthError::Expired),
            expires_at: Some(expires_at),
        }
    }
}

/// Seconds until expiry, clamped at zero. Undecodable tokens count as
/// already expired.
pub fn remaining_seconds(token: &str, now: DateTime<Utc>) -> i64 {
    match validate(token, now).expires_at {
        Some(expires_at) => (expires_at - now).num_seconds().max(0),
        None => 0,
    }
}

/// True when the token is still alive but inside the warning window:
/// `0 < remaining < threshold_minutes * 60`. False at exactly zero and at
/// exactly the threshold boundary.
pub fn is_expiring_soon(token: &str, threshold_minutes: i64, now: DateTime<Utc>) -> bool {
    let remaining = remaining_seconds(token, now);
    remaining > 0 && remaining < threshold_minutes * 60
}

/// Build an unsigned token carrying the given claims JSON. Test-only.
#[cfg(test)]
pub(crate) fn unsigned_token(claims_json: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims_json.as_bytes());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
pub(crate) fn token_expiring_at(exp: i64) -> String {
    unsigned_token(&format!(
        r#"{{"sub":"42","role":"Doctor","name":"Alice","exp":{}}}"#,
        exp
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn test_decode_claims_extracts_fields() {
        let token = unsigned_token(r#"{"sub":"7","role":"Nurse","name":"Bea","exp":1000}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("7"));
        assert_eq!(claims.role.as_deref(), Some("Nurse"));
        assert_eq!(claims.exp, Some(1000));
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        assert_eq!(decode_claims("only.two").unwrap_err(), AuthError::MalformedToken);
        assert_eq!(
            decode_claims("a.b.c.d").unwrap_err(),
            AuthError::MalformedToken
        );
        assert_eq!(decode_claims("single").unwrap_err(), AuthError::MalformedToken);
        assert_eq!(decode_claims("").unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn test_bad_base64_is_malformed() {
        let status = validate("header.!!!not-base64!!!.sig", at(0));
        assert!(!status.is_valid);
        assert_eq!(status.error, Some(AuthError::MalformedToken));
        assert_eq!(status.expires_at, None);
    }

    #[test]
    fn test_bad_json_is_malformed() {
        let payload = URL_SAFE_NO_PAD.encode(b"not json at all");
        let token = format!("h.{}.s", payload);
        assert_eq!(decode_claims(&token).unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn test_missing_expiry_claim() {
        let token = unsigned_token(r#"{"sub":"7","role":"Doctor"}"#);
        let status = validate(&token, at(0));
        assert!(!status.is_valid);
        assert_eq!(status.error, Some(AuthError::MissingExpiry));
        assert_eq!(status.expires_at, None);
    }

    #[test]
    fn test_past_expiry_reports_expired_with_timestamp() {
        let token = token_expiring_at(1000);
        let status = validate(&token, at(2000));
        assert!(!status.is_valid);
        assert_eq!(status.error, Some(AuthError::Expired));
        assert_eq!(status.expires_at, Some(at(1000)));
    }

    #[test]
    fn test_expiry_exactly_now_is_expired() {
        let token = token_expiring_at(1000);
        let status = validate(&token, at(1000));
        assert!(!status.is_valid);
        assert_eq!(status.error, Some(AuthError::Expired));
    }

    #[test]
    fn test_future_expiry_is_valid() {
        let token = token_expiring_at(5000);
        let status = validate(&token, at(1000));
        assert!(status.is_valid);
        assert_eq!(status.error, None);
        assert_eq!(status.expires_at, Some(at(5000)));
    }

    #[test]
    fn test_remaining_seconds_counts_down_and_clamps() {
        let token = token_expiring_at(1300);
        assert_eq!(remaining_seconds(&token, at(1000)), 300);
        assert_eq!(remaining_seconds(&token, at(1300)), 0);
        assert_eq!(remaining_seconds(&token, at(9999)), 0);
        assert_eq!(remaining_seconds("garbage", at(0)), 0);
    }

    #[test]
    fn test_is_expiring_soon_boundaries() {
        // threshold 5 minutes: true iff 0 < remaining < 300
        let token = token_expiring_at(1300);
        assert!(is_expiring_soon(&token, 5, at(1001))); // 299s left
        assert!(is_expiring_soon(&token, 5, at(1299))); // 1s left
        assert!(!is_expiring_soon(&token, 5, at(1000))); // exactly 300s
        assert!(!is_expiring_soon(&token, 5, at(1300))); // exactly 0s
        assert!(!is_expiring_soon(&token, 5, at(2000))); // long expired
        assert!(!is_expiring_soon(&token, 5, at(500))); // plenty of time
    }
}
