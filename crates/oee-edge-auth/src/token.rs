//! Bearer token signing and verification.
//!
//! Tokens are HS256 JWTs signed with the shared gateway secret. The codec is
//! a pure function of its input, the secret, and a clock reading; the
//! `*_at` variants take the clock reading explicitly.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use oee_edge_core::SubjectId;

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// The claim set carried by a bearer token.
///
/// Tokens minted by the user service carry the subject as `id`, possibly
/// next to a `sub` claim. When both are present `sub` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireClaims")]
pub struct Claims {
    /// Subject identity.
    pub sub: SubjectId,
    /// Issued-at, in seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, in seconds since the Unix epoch.
    pub exp: i64,
}

/// Claims as they appear on the wire, before the subject is resolved.
#[derive(Deserialize)]
struct WireClaims {
    sub: Option<SubjectId>,
    id: Option<SubjectId>,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

impl TryFrom<WireClaims> for Claims {
    type Error = &'static str;

    fn try_from(wire: WireClaims) -> std::result::Result<Self, Self::Error> {
        let sub = wire.sub.or(wire.id).ok_or("token has no subject claim")?;
        Ok(Self {
            sub,
            iat: wire.iat,
            exp: wire.exp,
        })
    }
}

impl Claims {
    /// When the token was issued.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// When the token expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the claims are expired at `now` (Unix seconds).
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Signs and verifies bearer tokens with the shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec for the configured shared secret.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `now >= exp` after decoding, without leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `subject` that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the token cannot be encoded.
    pub fn sign(&self, subject: &SubjectId, ttl: Duration) -> Result<String> {
        self.sign_at(subject, ttl, Utc::now().timestamp())
    }

    /// Sign a token for `subject` issued at `now` (Unix seconds).
    ///
    /// A zero `ttl` produces a token that is already expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the token cannot be encoded.
    pub fn sign_at(&self, subject: &SubjectId, ttl: Duration, now: i64) -> Result<String> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.clone(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to encode token: {e}")))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken`, `InvalidSignature` or `ExpiredToken`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token against `now` (Unix seconds).
    ///
    /// The signature is checked before the expiry, so a tampered token is
    /// reported as `InvalidSignature` even when it is also expired.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken`, `InvalidSignature` or `ExpiredToken`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token decode failed");
                match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        AuthError::InvalidSignature
                    }
                    ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::MalformedToken(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        if claims.is_expired_at(now) {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` if the header is absent, uses another
/// scheme, or has no token segment.
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let mut parts = header.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new("test-secret"))
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let codec = codec();
        let subject = SubjectId::from(42_i64);

        let token = codec
            .sign_at(&subject, Duration::from_secs(3600), NOW)
            .unwrap();
        let claims = codec.verify_at(&token, NOW + 10).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[test]
    fn string_subject_roundtrip() {
        let codec = codec();
        let subject = SubjectId::from("operator-3");

        let token = codec.sign(&subject, Duration::from_secs(60)).unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, subject);
    }

    #[test]
    fn signing_is_deterministic_within_a_second() {
        let codec = codec();
        let subject = SubjectId::from(1_i64);

        let a = codec.sign_at(&subject, Duration::from_secs(60), NOW).unwrap();
        let b = codec.sign_at(&subject, Duration::from_secs(60), NOW).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn expired_token_rejected() {
        let codec = codec();
        let token = codec
            .sign_at(&SubjectId::from(1_i64), Duration::from_secs(60), NOW)
            .unwrap();

        let err = codec.verify_at(&token, NOW + 61).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[test]
    fn token_expires_exactly_at_exp() {
        let codec = codec();
        let token = codec
            .sign_at(&SubjectId::from(1_i64), Duration::from_secs(60), NOW)
            .unwrap();

        assert!(codec.verify_at(&token, NOW + 59).is_ok());
        assert!(matches!(
            codec.verify_at(&token, NOW + 60),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn zero_ttl_token_is_immediately_expired() {
        let codec = codec();
        let token = codec
            .sign_at(&SubjectId::from(9_i64), Duration::ZERO, NOW)
            .unwrap();

        let err = codec.verify_at(&token, NOW).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[test]
    fn tampered_signature_is_invalid_signature() {
        let codec = codec();
        let token = codec
            .sign_at(&SubjectId::from(1_i64), Duration::from_secs(3600), NOW)
            .unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let err = codec.verify_at(&tampered, NOW).unwrap_err();
            assert!(
                matches!(err, AuthError::InvalidSignature),
                "byte {i} produced {err:?}"
            );
        }
    }

    #[test]
    fn tampered_and_expired_is_invalid_signature() {
        let codec = codec();
        let token = codec
            .sign_at(&SubjectId::from(1_i64), Duration::from_secs(10), NOW)
            .unwrap();
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let err = codec.verify_at(&tampered, NOW + 100).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn forged_payload_is_invalid_signature() {
        let codec = codec();
        let token = codec
            .sign_at(&SubjectId::from(1_i64), Duration::from_secs(10), NOW)
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = BASE64_URL_SAFE_NO_PAD
            .encode(format!(r#"{{"sub":1,"iat":{NOW},"exp":{}}}"#, NOW + 999_999));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        let err = codec.verify_at(&forged, NOW).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = TokenCodec::new(&AuthConfig::new("other-secret"))
            .sign_at(&SubjectId::from(1_i64), Duration::from_secs(60), NOW)
            .unwrap();

        let err = codec().verify_at(&token, NOW).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn other_algorithm_is_invalid_signature() {
        let claims = Claims {
            sub: SubjectId::from(1_i64),
            iat: NOW,
            exp: NOW + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = codec().verify_at(&token, NOW).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        for token in ["", "not-a-token", "a.b", "a.b.c"] {
            let err = codec.verify_at(token, NOW).unwrap_err();
            assert!(
                matches!(err, AuthError::MalformedToken(_)),
                "{token:?} produced {err:?}"
            );
        }
    }

    #[test]
    fn missing_exp_is_malformed() {
        #[derive(Serialize)]
        struct NoExp {
            sub: i64,
            iat: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExp { sub: 1, iat: NOW },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = codec().verify_at(&token, NOW).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn user_service_id_claim_is_accepted() {
        #[derive(Serialize)]
        struct UserServiceClaims {
            id: i64,
            iat: i64,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &UserServiceClaims {
                id: 12,
                iat: NOW,
                exp: NOW + 3600,
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let claims = codec().verify_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, SubjectId::Numeric(12));
    }

    #[test]
    fn sub_and_id_claims_together_prefer_sub() {
        #[derive(Serialize)]
        struct BothClaims {
            id: i64,
            sub: &'static str,
            iat: i64,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &BothClaims {
                id: 7,
                sub: "operator-7",
                iat: NOW,
                exp: NOW + 600,
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let claims = codec().verify_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, SubjectId::from("operator-7"));
        assert_eq!(claims.exp, NOW + 600);
    }

    #[test]
    fn missing_subject_is_malformed() {
        #[derive(Serialize)]
        struct NoSubject {
            iat: i64,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoSubject {
                iat: NOW,
                exp: NOW + 600,
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = codec().verify_at(&token, NOW).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn claims_timestamps() {
        let claims = Claims {
            sub: SubjectId::from(1_i64),
            iat: NOW,
            exp: NOW + 60,
        };
        assert_eq!(claims.issued_at().unwrap().timestamp(), NOW);
        assert_eq!(claims.expires_at().unwrap().timestamp(), NOW + 60);
        assert!(!claims.is_expired_at(NOW + 59));
        assert!(claims.is_expired_at(NOW + 60));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(Some("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn bearer_extraction_missing() {
        for header in [None, Some(""), Some("Bearer"), Some("Bearer "), Some("Basic abc")] {
            let err = bearer_token(header).unwrap_err();
            assert!(matches!(err, AuthError::MissingToken), "{header:?}");
        }
    }

    #[test]
    fn codec_debug_hides_secret() {
        let debug = format!("{:?}", codec());
        assert!(debug.contains("TokenCodec"));
        assert!(!debug.contains("test-secret"));
    }
}
