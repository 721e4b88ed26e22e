//! Per-message credential verification.
//!
//! Tokens are HS256-signed JWTs carrying the user id in `sub` and an `exp`
//! claim. Verification is pure: no clock state beyond the signature check,
//! no side effects, so the gateway can re-verify on every inbound message.

use {
    jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind},
    serde::Deserialize,
    thiserror::Error,
};

/// The caller's identity, derived from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credential expired")]
    Expired,
    #[error("invalid credential signature")]
    InvalidSignature,
    #[error("malformed credential")]
    Malformed,
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: u64,
}

/// Stateless verifier over a shared HS256 secret.
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and extract the caller's identity.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            })?;
        Ok(Identity {
            user_id: data.claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        jsonwebtoken::{EncodingKey, Header},
        serde::Serialize,
    };

    use super::*;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: u64,
    }

    fn sign(secret: &str, sub: &str, exp: u64) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &TestClaims {
                sub: sub.into(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> u64 {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn valid_token_yields_identity() {
        let verifier = CredentialVerifier::new("s3cret");
        let token = sign("s3cret", "user-42", far_future());
        let identity = verifier.verify(&token).unwrap();
        assert_eq!(identity.user_id, "user-42");
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = CredentialVerifier::new("s3cret");
        let token = sign("s3cret", "user-42", 1_600_000_000);
        assert!(matches!(verifier.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = CredentialVerifier::new("s3cret");
        let token = sign("other", "user-42", far_future());
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed_not_a_panic() {
        let verifier = CredentialVerifier::new("s3cret");
        assert!(matches!(
            verifier.verify("not-a-jwt"),
            Err(AuthError::Malformed)
        ));
    }
}
