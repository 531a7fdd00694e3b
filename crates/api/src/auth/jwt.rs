//! Signed access and refresh tokens.
//!
//! Both token kinds are compact JWTs signed with one shared HMAC secret.
//! Access tokens ([`AccessClaims`]) are stateless and trusted on signature
//! alone. Refresh tokens ([`RefreshClaims`]) bind a user to a device and are
//! only honoured together with the matching server-side session.
//!
//! Only HMAC algorithms are accepted on decode. A header naming `none` or an
//! asymmetric algorithm is rejected before any claim is looked at.

use autoban_core::error::AuthError;
use autoban_core::roles::{Role, Status};
use autoban_db::models::user::User;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// String form of the user's UUID.
    pub user_id: String,
    pub role: Role,
    pub phone_number: String,
    pub status: Status,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Claims embedded in every refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: String,
    pub device_id: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id; keeps two refresh tokens minted in the same second
    /// for the same device distinct.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7). Also the session TTL.
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
pub const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Upper bound accepted for the access token lifetime (one day).
pub const MAX_ACCESS_EXPIRY_MINS: i64 = 24 * 60;
/// Upper bound accepted for the refresh token lifetime.
pub const MAX_REFRESH_EXPIRY_DAYS: i64 = 365;

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry_mins: DEFAULT_ACCESS_EXPIRY_MINS,
            refresh_token_expiry_days: DEFAULT_REFRESH_EXPIRY_DAYS,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_mins)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_expiry_days)
    }
}

/// Issues and verifies tokens with the configured secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_expires_in(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign an access token carrying the user's id, role, phone and status.
    pub fn issue_access(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            user_id: user.id.to_string(),
            role: user.role,
            phone_number: user.phone_number.clone(),
            status: user.status,
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign a refresh token bound to `(user_id, device_id)`.
    pub fn issue_refresh(&self, user_id: &str, device_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            user_id: user_id.to_string(),
            device_id: device_id.to_string(),
            exp: (now + self.refresh_ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        self.sign(&claims)
    }

    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode(token)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.decode(token)
    }

    /// Verify algorithm, signature and expiry, then deserialize the claims.
    ///
    /// A token whose claims do not fit `C` (for example an access token
    /// presented as a refresh token) is [`AuthError::MalformedToken`].
    pub fn decode<C: DeserializeOwned>(&self, token: &str) -> Result<C, AuthError> {
        decode::<C>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }
}

/// Map a `jsonwebtoken` failure onto the auth taxonomy.
fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use autoban_core::roles::{Role, Status};
    use serde_json::json;

    use super::*;

    /// `{"alg":"none","typ":"JWT"}`
    const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
    /// `{"alg":"RS256","typ":"JWT"}`
    const RS256_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig::new("test-secret-that-is-long-enough-for-hmac")
    }

    fn test_user(role: Role, status: Status) -> User {
        User {
            id: Uuid::new_v4(),
            phone_number: "09123456789".to_string(),
            password_hash: String::new(),
            role,
            status,
            created_at: Utc::now(),
        }
    }

    fn sign_raw(claims: &serde_json::Value, algorithm: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = TokenCodec::new(&test_config());
        let user = test_user(Role::Admin, Status::Deactivated);

        let token = codec.issue_access(&user).expect("token generation should succeed");
        let claims = codec.decode_access(&token).expect("token validation should succeed");

        assert_eq!(claims.user_id, user.id.to_string());
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.status, Status::Deactivated);
        assert_eq!(claims.phone_number, "09123456789");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_access_token_wire_claims() {
        let codec = TokenCodec::new(&test_config());
        let user = test_user(Role::SuperAdmin, Status::Active);
        let token = codec.issue_access(&user).unwrap();

        // Decoded generically, role and status are plain JSON integers.
        let raw: serde_json::Value = codec.decode(&token).unwrap();
        assert_eq!(raw["role"], json!(1));
        assert_eq!(raw["status"], json!(0));
        assert!(raw["user_id"].is_string());
        assert!(raw["phone_number"].is_string());
        assert!(raw["exp"].is_i64());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let codec = TokenCodec::new(&test_config());

        let token = codec.issue_refresh("user-1", "device-1").unwrap();
        let claims = codec.decode_refresh(&token).unwrap();

        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.device_id, "device-1");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_refresh_tokens_are_unique_per_issue() {
        let codec = TokenCodec::new(&test_config());
        let first = codec.issue_refresh("user-1", "device-1").unwrap();
        let second = codec.issue_refresh("user-1", "device-1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();
        let codec = TokenCodec::new(&config);
        let now = Utc::now().timestamp();
        let token = sign_raw(
            &json!({
                "user_id": "u",
                "role": 0,
                "phone_number": "09123456789",
                "status": 0,
                "exp": now - 300,
                "iat": now - 1200,
            }),
            Algorithm::HS256,
            &config.secret,
        );

        assert_matches!(codec.decode_access(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_different_secrets_fail() {
        let codec_a = TokenCodec::new(&JwtConfig::new("secret-alpha"));
        let codec_b = TokenCodec::new(&JwtConfig::new("secret-bravo"));

        let token = codec_a.issue_refresh("u", "d").unwrap();

        assert_matches!(codec_b.decode_refresh(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = TokenCodec::new(&test_config());
        for garbage in ["", "not-a-jwt", "a.b.c", "a.b"] {
            assert_matches!(
                codec.decode_refresh(garbage),
                Err(AuthError::MalformedToken),
                "{garbage:?}"
            );
        }
    }

    #[test]
    fn test_alg_none_is_rejected() {
        let codec = TokenCodec::new(&test_config());
        let token = codec.issue_refresh("u", "d").unwrap();
        let claims_segment = token.split('.').nth(1).unwrap();
        let forged = format!("{NONE_HEADER}.{claims_segment}.");

        let result = codec.decode_refresh(&forged);
        assert!(result.as_ref().is_err_and(AuthError::is_token_failure), "{result:?}");
    }

    #[test]
    fn test_asymmetric_alg_is_rejected() {
        let codec = TokenCodec::new(&test_config());
        let token = codec.issue_refresh("u", "d").unwrap();
        let mut parts = token.split('.');
        parts.next();
        let forged = format!(
            "{RS256_HEADER}.{}.{}",
            parts.next().unwrap(),
            parts.next().unwrap()
        );

        assert_matches!(codec.decode_refresh(&forged), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_other_hmac_variants_are_accepted() {
        let config = test_config();
        let codec = TokenCodec::new(&config);
        let exp = Utc::now().timestamp() + 60;
        let token = sign_raw(
            &json!({ "user_id": "u", "device_id": "d", "exp": exp, "iat": exp - 60, "jti": "j" }),
            Algorithm::HS512,
            &config.secret,
        );

        let claims = codec.decode_refresh(&token).unwrap();
        assert_eq!(claims.device_id, "d");
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let codec = TokenCodec::new(&test_config());
        let access = codec
            .issue_access(&test_user(Role::User, Status::Active))
            .unwrap();
        let refresh = codec.issue_refresh("u", "d").unwrap();

        assert_matches!(codec.decode_refresh(&access), Err(AuthError::MalformedToken));
        assert_matches!(codec.decode_access(&refresh), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_non_integer_role_claims_are_rejected() {
        let config = test_config();
        let codec = TokenCodec::new(&config);
        let exp = Utc::now().timestamp() + 60;

        for role in [json!(2.5), json!("2"), json!(-1), json!(4_294_967_298_i64)] {
            let token = sign_raw(
                &json!({
                    "user_id": "u",
                    "role": role,
                    "phone_number": "09123456789",
                    "status": 0,
                    "exp": exp,
                    "iat": exp - 60,
                }),
                Algorithm::HS256,
                &config.secret,
            );
            assert_matches!(
                codec.decode_access(&token),
                Err(AuthError::MalformedToken),
                "role {role} must not decode"
            );
        }
    }
}
