//! HS256 access tokens carrying the user id and username.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use insights_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const DEFAULT_ISSUER: &str = "insights-api";
const DEFAULT_LIFETIME_HOURS: i64 = 24;

/// Signing secret, token lifetime and the `iss` claim.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: DEFAULT_LIFETIME_HOURS,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

impl JwtConfig {
    /// Read `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`.
    pub fn from_env() -> Self {
        let config = Self {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string()),
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LIFETIME_HOURS),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
        };

        if config.uses_default_secret() {
            let production = matches!(
                std::env::var("RUST_ENV").as_deref(),
                Ok("production") | Ok("prod")
            );
            if production {
                tracing::error!("JWT_SECRET is unset in production; tokens are forgeable");
            } else {
                tracing::warn!("JWT_SECRET is unset, signing with the development secret");
            }
        }

        config
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }

    fn lifetime(&self) -> TimeDelta {
        TimeDelta::hours(self.expiration_hours)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    username: String,
    exp: i64,
    iat: i64,
    iss: String,
}

impl TryFrom<Claims> for TokenClaims {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::InvalidToken(format!("subject: {e}")))?;

        Ok(TokenClaims {
            user_id,
            username: claims.username,
            exp: claims.exp,
        })
    }
}

fn rejection(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (issued_at + self.config.lifetime()).timestamp(),
            iat: issued_at.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(rejection)
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(rejection)?
            .claims
            .try_into()
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.lifetime().num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str, hours: i64) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: secret.to_string(),
            expiration_hours: hours,
            issuer: DEFAULT_ISSUER.to_string(),
        })
    }

    #[test]
    fn test_access_token_identifies_user_for_configured_lifetime() {
        let tokens = issuer("s3cret", 2);
        let alice = Uuid::new_v4();

        let claims = tokens
            .validate_token(&tokens.generate_token(alice, "alice").unwrap())
            .unwrap();

        assert_eq!((claims.user_id, claims.username.as_str()), (alice, "alice"));
        let remaining = claims.exp - Utc::now().timestamp();
        assert!((7190..=7200).contains(&remaining), "remaining = {remaining}");
        assert_eq!(tokens.expiration_seconds(), 7200);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let forged = issuer("attacker", 1)
            .generate_token(Uuid::new_v4(), "alice")
            .unwrap();

        assert!(matches!(
            issuer("s3cret", 1).validate_token(&forged),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_edited_payload_breaks_signature() {
        let tokens = issuer("s3cret", 1);
        let token = tokens.generate_token(Uuid::new_v4(), "alice").unwrap();
        let other = tokens.generate_token(Uuid::new_v4(), "mallory").unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = other.split('.').nth(1).unwrap();

        assert!(tokens.validate_token(&parts.join(".")).is_err());
        assert!(matches!(
            tokens.validate_token("not.a.jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let partner = JwtTokenService::new(JwtConfig {
            secret: "s3cret".to_string(),
            expiration_hours: 1,
            issuer: "partner-api".to_string(),
        });
        let token = partner.generate_token(Uuid::new_v4(), "alice").unwrap();

        assert!(issuer("s3cret", 1).validate_token(&token).is_err());
    }

    #[test]
    fn test_lapsed_token_reports_expiry() {
        let tokens = issuer("s3cret", -1);
        let token = tokens.generate_token(Uuid::new_v4(), "alice").unwrap();

        assert!(matches!(tokens.validate_token(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let claims = Claims {
            sub: "42".to_string(),
            username: "alice".to_string(),
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
            iss: DEFAULT_ISSUER.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        assert!(matches!(
            issuer("s3cret", 1).validate_token(&token),
            Err(AuthError::InvalidToken(msg)) if msg.starts_with("subject")
        ));
    }

    #[test]
    fn test_defaults() {
        let config = JwtConfig::default();

        assert!(config.uses_default_secret());
        assert_eq!(config.issuer, "insights-api");
        assert_eq!(JwtTokenService::new(config).expiration_seconds(), 86_400);
    }
}
