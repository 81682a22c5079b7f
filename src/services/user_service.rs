use actix_web::web;
use chrono::{SubsecRound, Utc};
use sea_orm::*;

use crate::error::AppError;
use crate::models::users::{self, Entity as Users};
use crate::utils::password::PasswordHasher;

pub struct UserService;

impl UserService {
    /// Crée un compte. Conflict si l'email est déjà utilisé.
    pub async fn register(
        db: &DatabaseConnection,
        hasher: PasswordHasher,
        email: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let email = normalize_email(email);
        if Self::find_by_email(db, &email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password = password.to_owned();
        let password_hash = web::block(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

        let new_user = users::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().trunc_subsecs(6)),
            ..Default::default()
        };

        match new_user.insert(db).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "user registered");
                Ok(user)
            }
            // une autre inscription avec le même email est passée avant
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Vérifie les identifiants. Même erreur pour un email inconnu et un
    /// mauvais mot de passe.
    pub async fn authenticate(
        db: &DatabaseConnection,
        hasher: PasswordHasher,
        email: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = Self::find_by_email(db, &normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        let password = password.to_owned();
        let stored_hash = user.password_hash.clone();
        let is_valid = web::block(move || hasher.verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

        if !is_valid {
            tracing::info!(user_id = user.id, "login rejected: wrong password");
            return Err(invalid());
        }

        Ok(user)
    }

    pub async fn find_by_id(db: &DatabaseConnection, user_id: i32) -> Result<users::Model, AppError> {
        Users::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
    }
}

/// Les comptes sont identifiés par l'adresse en minuscules.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
