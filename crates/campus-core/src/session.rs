// ── Session decoding ──
//
// A session is never stored; it is recomputed from the credential each
// time it is needed. The server owns the signing secret, so the client
// only reads the payload and never verifies the signature.

use campus_api::EntityId;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode as decode_jwt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a credential could not be turned into a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential has no '{0}' claim")]
    MissingClaim(&'static str),

    #[error("credential expiry is out of range")]
    InvalidExpiry,
}

/// Identity and expiry derived from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub subject_id: EntityId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Strictly before expiry; a session expiring exactly at `now` is over.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Time left until expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.expires_at - now).max(chrono::Duration::zero())
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    sub: Option<EntityId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<Value>,
}

fn payload_only() -> Validation {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Decode a credential into a [`Session`].
pub fn decode(token: &str) -> Result<Session, DecodeError> {
    let data = decode_jwt::<Claims>(token.trim(), &DecodingKey::from_secret(&[]), &payload_only())
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let claims = data.claims;

    let subject_id = claims
        .id
        .or(claims.sub)
        .ok_or(DecodeError::MissingClaim("id"))?;
    let exp = claims.exp.ok_or(DecodeError::MissingClaim("exp"))?;

    Ok(Session {
        subject_id,
        display_name: claims.name,
        email: claims.email,
        expires_at: expiry_instant(&exp)?,
    })
}

/// True iff `token` decodes and has not expired at `now`.
pub fn is_valid(token: &str, now: DateTime<Utc>) -> bool {
    decode(token).is_ok_and(|session| session.is_live_at(now))
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn expiry_instant(exp: &Value) -> Result<DateTime<Utc>, DecodeError> {
    let secs = match exp {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
            .ok_or(DecodeError::InvalidExpiry)?,
        _ => return Err(DecodeError::InvalidExpiry),
    };
    DateTime::from_timestamp(secs, 0).ok_or(DecodeError::InvalidExpiry)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    /// Sign `claims` with a throwaway secret.
    pub(crate) fn credential(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    pub(crate) fn credential_expiring(at: DateTime<Utc>) -> String {
        credential(&json!({
            "id": 7,
            "name": "Lea Santos",
            "email": "lea@school.test",
            "exp": at.timestamp(),
        }))
    }

    #[test]
    fn decodes_identity_and_expiry() {
        let exp = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        let session = decode(&credential_expiring(exp)).unwrap();

        assert_eq!(session.subject_id, EntityId::from("7"));
        assert_eq!(session.display_name.as_deref(), Some("Lea Santos"));
        assert_eq!(session.email.as_deref(), Some("lea@school.test"));
        assert_eq!(session.expires_at, exp);
    }

    #[test]
    fn accepts_sub_as_identity() {
        let token = credential(&json!({"sub": "u-1", "exp": 1_900_000_000}));
        assert_eq!(decode(&token).unwrap().subject_id.as_str(), "u-1");
    }

    #[test]
    fn malformed_credentials_are_rejected() {
        for bad in ["", "not-a-token", "a.b.c", "x.eyJpZCI6MX0.y"] {
            assert!(
                matches!(decode(bad), Err(DecodeError::Malformed(_))),
                "expected Malformed for {bad:?}"
            );
            assert!(!is_valid(bad, Utc::now()));
        }
    }

    #[test]
    fn missing_claims_are_rejected() {
        let no_exp = credential(&json!({"id": 1}));
        assert_eq!(decode(&no_exp), Err(DecodeError::MissingClaim("exp")));

        let no_id = credential(&json!({"exp": 1_900_000_000}));
        assert_eq!(decode(&no_id), Err(DecodeError::MissingClaim("id")));
    }

    #[test]
    fn validity_is_strictly_before_expiry() {
        let now = DateTime::from_timestamp(1_800_000_000, 0).unwrap();

        assert!(is_valid(&credential_expiring(now + Duration::seconds(1)), now));
        assert!(!is_valid(&credential_expiring(now), now));
        assert!(!is_valid(&credential_expiring(now - Duration::seconds(10)), now));
    }

    #[test]
    fn valid_implies_future_expiry() {
        let now = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        for offset in [-3600, -1, 0, 1, 59, 3600] {
            let token = credential_expiring(now + Duration::seconds(offset));
            if is_valid(&token, now) {
                assert!(decode(&token).unwrap().expires_at > now);
            }
        }
    }

    #[test]
    fn fractional_expiry_is_floored() {
        let token = credential(&json!({"id": 1, "exp": 1_900_000_000.75}));
        assert_eq!(decode(&token).unwrap().expires_at.timestamp(), 1_900_000_000);
    }
}
