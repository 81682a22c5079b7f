use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use rand::Rng;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Hasher PBKDF2-HMAC-SHA256, format Werkzeug :
/// `pbkdf2:sha256:<iterations>$<salt>$<hash>` (salt et hash en base64 URL-safe).
///
/// Le nombre d'itérations ne s'applique qu'aux nouveaux hash ; la vérification
/// le lit dans la chaîne stockée.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill(&mut salt);

        let mut key = [0u8; KEY_LENGTH];
        pbkdf2::<HmacSha256>(password.as_bytes(), &salt, self.iterations, &mut key)
            .map_err(|e| AppError::Internal(format!("PBKDF2 hash generation failed: {}", e)))?;

        Ok(format!(
            "pbkdf2:sha256:{}${}${}",
            self.iterations,
            URL_SAFE_NO_PAD.encode(salt),
            URL_SAFE_NO_PAD.encode(key)
        ))
    }

    /// Ok(false) si le mot de passe est faux, Err seulement si le hash stocké est illisible.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AppError> {
        let invalid = || AppError::Internal("Invalid password hash format".to_string());

        let mut parts = stored_hash.split('$');
        let (header, salt_str, hash_str) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(s), Some(k), None) => (h, s, k),
            _ => return Err(invalid()),
        };

        let iterations = match header.split(':').collect::<Vec<_>>().as_slice() {
            ["pbkdf2", "sha256", iterations] => iterations.parse::<u32>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        let salt = URL_SAFE_NO_PAD.decode(salt_str).map_err(|_| invalid())?;
        let expected = URL_SAFE_NO_PAD.decode(hash_str).map_err(|_| invalid())?;
        if expected.is_empty() {
            return Err(invalid());
        }

        let mut computed = vec![0u8; expected.len()];
        pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
            .map_err(|e| AppError::Internal(format!("PBKDF2 hash verification failed: {}", e)))?;

        Ok(constant_time_eq(&computed, &expected))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
