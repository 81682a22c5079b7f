use actix_web::{post, get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{LoginRequest, MeResponse, RegisterRequest, RegisterResponse, TokenResponse};
use crate::services::user_service::UserService;
use crate::utils::jwt::TokenIssuer;
use crate::utils::password::PasswordHasher;

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    hasher: web::Data<PasswordHasher>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let user = UserService::register(db.get_ref(), *hasher.get_ref(), &body.email, &body.password).await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        user_id: user.id,
        email: user.email,
    }))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    hasher: web::Data<PasswordHasher>,
    tokens: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::authenticate(db.get_ref(), *hasher.get_ref(), &body.email, &body.password).await?;
    let token = tokens.issue(&user)?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: "bearer",
        expires_in: tokens.lifetime().num_seconds(),
    }))
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    // le token peut survivre au compte
    let user = UserService::find_by_id(db.get_ref(), auth_user.user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized("User no longer exists".to_string()),
            other => other,
        })?;

    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: user.id,
        email: user.email,
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(me)
    );
}
