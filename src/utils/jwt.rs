use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::users;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub email: String,
    pub iat: i64,        // date d'émission
    pub exp: i64,        // timestamp d'expiration
}

/// Signe et vérifie les bearer tokens avec la clé HMAC configurée.
/// Les tokens ne sont pas révocables : ils restent valides jusqu'à `exp`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm: config.algorithm,
            lifetime: Duration::minutes(config.access_token_expire_minutes),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Génère un JWT token pour un utilisateur
    pub fn issue(&self, user: &users::Model) -> Result<String, AppError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &users::Model, now: DateTime<Utc>) -> Result<String, AppError> {
        let expiration = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AppError::Internal("Failed to calculate expiration".to_string()))?;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Vérifie la signature et l'expiration, puis retourne les claims
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        // exp est vérifié plus bas contre `now`, sans marge
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if claims.exp <= now.timestamp() {
            return Err(AppError::Unauthorized("Token has expired".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config(secret: &str, minutes: i64) -> AuthConfig {
        AuthConfig {
            secret_key: secret.to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: minutes,
            password_hash_iterations: 1_000,
        }
    }

    fn user() -> users::Model {
        users::Model {
            id: 123,
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let issuer = TokenIssuer::new(&auth_config("secret", 30));

        let token = issuer.issue(&user()).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_token_expires_after_lifetime() {
        let issuer = TokenIssuer::new(&auth_config("secret", 30));
        let issued_at = Utc::now();
        let token = issuer.issue_at(&user(), issued_at).unwrap();

        assert!(issuer.verify_at(&token, issued_at + Duration::minutes(1)).is_ok());

        let expired = issuer.verify_at(&token, issued_at + Duration::minutes(31));
        assert!(matches!(expired, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new(&auth_config("secret", 30));
        let result = issuer.verify("invalid.token.here");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenIssuer::new(&auth_config("secret", 30));
        let other = TokenIssuer::new(&auth_config("another-secret", 30));

        let token = other.issue(&user()).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AppError::Unauthorized(_))));
    }
}
