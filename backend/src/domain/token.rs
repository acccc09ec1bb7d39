//! Stateless session tokens.
//!
//! Tokens are HMAC-signed JWTs carrying the user identifier as a decimal
//! string claim plus issued-at and expiry timestamps. Verification pins the
//! HMAC algorithm family so a token whose header names any other family is
//! rejected before its signature is looked at.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::UserId;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Longest lifetime a token is issued with; longer requests are capped.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(3650 * 24 * 60 * 60);

/// Reasons a token could not be issued or verified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The signing secret was empty.
    #[error("signing secret must not be empty")]
    EmptySecret,
    /// The header value was not exactly `<scheme> <credentials>`.
    #[error("authorization header must have the form '<scheme> <token>'")]
    MalformedHeader,
    /// The token header names an algorithm outside the HMAC family.
    #[error("token signed with an unexpected algorithm")]
    InvalidAlgorithm,
    /// The token expired.
    #[error("token has expired")]
    Expired,
    /// The token failed to parse or its signature did not match.
    #[error("invalid token: {message}")]
    InvalidToken { message: String },
    /// The user identifier claim was not a positive integer.
    #[error("token subject is not a valid user id")]
    InvalidSubject,
    /// Signing failed.
    #[error("failed to sign token: {message}")]
    Signing { message: String },
}

/// Verified contents of a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    user_id: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed session tokens.
///
/// The secret is supplied once at construction and never leaves the
/// service.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use user_service::domain::{TokenService, UserId};
///
/// let tokens = TokenService::new(b"secret", Duration::from_secs(60)).expect("secret present");
/// let user_id = UserId::new(7).expect("positive id");
/// let token = tokens.issue(user_id).expect("signing succeeds");
/// let claims = tokens.verify(&format!("Bearer {token}")).expect("token verifies");
/// assert_eq!(claims.user_id, user_id);
/// ```
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build a token service from a symmetric secret and token lifetime.
    ///
    /// Lifetimes above [`MAX_TOKEN_TTL`] are capped so the expiry always
    /// stays a representable timestamp.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_exp = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs: i64::try_from(ttl.min(MAX_TOKEN_TTL).as_secs()).unwrap_or(i64::MAX),
        })
    }

    /// Issue a token asserting that the bearer authenticated as `user_id`.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    fn issue_at(&self, user_id: UserId, issued_at: i64) -> Result<String, TokenError> {
        let claims = WireClaims {
            user_id: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key).map_err(|err| {
            TokenError::Signing {
                message: err.to_string(),
            }
        })
    }

    /// Verify a raw `Authorization` header value.
    ///
    /// The value must be exactly two whitespace-separated parts. The scheme
    /// itself is not inspected.
    pub fn verify(&self, header_value: &str) -> Result<SessionClaims, TokenError> {
        let mut parts = header_value.split_whitespace();
        let (Some(_scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TokenError::MalformedHeader);
        };

        let data =
            decode::<WireClaims>(token, &self.decoding_key, &self.validation).map_err(|err| {
                match err.kind() {
                    ErrorKind::InvalidAlgorithm => TokenError::InvalidAlgorithm,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::InvalidToken {
                        message: err.to_string(),
                    },
                }
            })?;

        let user_id = data
            .claims
            .user_id
            .parse::<UserId>()
            .map_err(|_| TokenError::InvalidSubject)?;
        let expires_at =
            DateTime::from_timestamp(data.claims.exp, 0).ok_or_else(|| TokenError::InvalidToken {
                message: "expiry out of range".to_owned(),
            })?;

        Ok(SessionClaims {
            user_id,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const SECRET: &[u8] = b"test-signing-secret";

    #[fixture]
    fn tokens() -> TokenService {
        TokenService::new(SECRET, Duration::from_secs(3600)).expect("secret present")
    }

    fn user(raw: i64) -> UserId {
        UserId::new(raw).expect("positive id")
    }

    fn segment(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[rstest]
    fn issued_token_verifies_to_the_same_user(tokens: TokenService) {
        let token = tokens.issue(user(42)).expect("signing succeeds");
        let claims = tokens
            .verify(&format!("Bearer {token}"))
            .expect("token verifies");
        assert_eq!(claims.user_id, user(42));
        assert!(claims.expires_at > Utc::now());
    }

    #[rstest]
    #[case(Duration::from_secs(u64::MAX))]
    #[case(Duration::MAX)]
    fn oversized_lifetimes_are_capped(#[case] ttl: Duration) {
        let tokens = TokenService::new(SECRET, ttl).expect("secret present");
        let token = tokens.issue(user(42)).expect("signing succeeds");

        let claims = tokens
            .verify(&format!("Bearer {token}"))
            .expect("token verifies");
        let cap = chrono::Duration::from_std(MAX_TOKEN_TTL).expect("cap fits");
        assert_eq!(claims.user_id, user(42));
        assert!(claims.expires_at <= Utc::now() + cap);
        assert!(claims.expires_at > Utc::now() + cap - chrono::Duration::minutes(1));
    }

    #[rstest]
    fn token_from_another_secret_is_rejected(tokens: TokenService) {
        let other = TokenService::new(b"another-secret", Duration::from_secs(3600))
            .expect("secret present");
        let token = other.issue(user(1)).expect("signing succeeds");

        let result = tokens.verify(&format!("Bearer {token}"));
        assert!(matches!(result, Err(TokenError::InvalidToken { .. })));
    }

    #[rstest]
    fn other_hmac_variants_share_the_pinned_family(tokens: TokenService) {
        let claims = WireClaims {
            user_id: "5".to_owned(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("signing succeeds");

        let verified = tokens
            .verify(&format!("Bearer {token}"))
            .expect("HS512 verifies");
        assert_eq!(verified.user_id, user(5));
    }

    #[rstest]
    #[case("RS256")]
    #[case("ES256")]
    #[case("PS512")]
    fn asymmetric_algorithm_header_is_rejected(tokens: TokenService, #[case] alg: &str) {
        let header = segment(&json!({ "alg": alg, "typ": "JWT" }));
        let payload = segment(&json!({
            "user_id": "1",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 60,
        }));
        let signature = URL_SAFE_NO_PAD.encode(b"structurally-valid-signature");
        let forged = format!("{header}.{payload}.{signature}");

        let result = tokens.verify(&format!("Bearer {forged}"));
        assert_eq!(result, Err(TokenError::InvalidAlgorithm));
    }

    #[rstest]
    fn unsigned_token_is_rejected(tokens: TokenService) {
        let header = segment(&json!({ "alg": "none", "typ": "JWT" }));
        let payload = segment(&json!({ "user_id": "1", "exp": Utc::now().timestamp() + 60 }));
        let result = tokens.verify(&format!("Bearer {header}.{payload}."));
        assert!(result.is_err());
    }

    #[rstest]
    fn expired_token_is_rejected(tokens: TokenService) {
        let two_hours_ago = Utc::now().timestamp() - 7200;
        let token = tokens
            .issue_at(user(3), two_hours_ago)
            .expect("signing succeeds");

        assert_eq!(
            tokens.verify(&format!("Bearer {token}")),
            Err(TokenError::Expired)
        );
    }

    #[rstest]
    fn token_without_expiry_is_rejected(tokens: TokenService) {
        #[derive(Serialize)]
        struct Legacy {
            user_id: String,
        }
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &Legacy {
                user_id: "3".to_owned(),
            },
            &EncodingKey::from_secret(SECRET),
        )
        .expect("signing succeeds");

        let result = tokens.verify(&format!("Bearer {token}"));
        assert!(matches!(result, Err(TokenError::InvalidToken { .. })));
    }

    #[rstest]
    #[case("abc")]
    #[case("")]
    #[case("-4")]
    fn non_numeric_subject_is_rejected(tokens: TokenService, #[case] subject: &str) {
        let claims = WireClaims {
            user_id: subject.to_owned(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("signing succeeds");

        assert_eq!(
            tokens.verify(&format!("Bearer {token}")),
            Err(TokenError::InvalidSubject)
        );
    }

    #[rstest]
    #[case("")]
    #[case("Bearer")]
    #[case("just-a-token")]
    #[case("Bearer a b")]
    fn header_must_have_two_parts(tokens: TokenService, #[case] header: &str) {
        assert_eq!(tokens.verify(header), Err(TokenError::MalformedHeader));
    }

    #[rstest]
    fn scheme_is_not_inspected(tokens: TokenService) {
        let token = tokens.issue(user(9)).expect("signing succeeds");
        let claims = tokens
            .verify(&format!("Token {token}"))
            .expect("any scheme accepted");
        assert_eq!(claims.user_id, user(9));
    }

    #[rstest]
    fn empty_secret_is_rejected() {
        let result = TokenService::new(b"", Duration::from_secs(60));
        assert!(matches!(result, Err(TokenError::EmptySecret)));
    }

    #[rstest]
    fn debug_output_omits_keys(tokens: TokenService) {
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("test-signing-secret"));
    }
}
