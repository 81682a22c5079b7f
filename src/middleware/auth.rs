use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::utils::jwt::TokenIssuer;

/// Identité de l'appelant, vérifiée à partir du bearer token.
/// Les routes protégées la prennent en paramètre : la vérification passe avant le handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| AppError::Internal("TokenIssuer is not registered".to_string()))?;

    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    // 2. Extraire le token (format: "Bearer <token>")
    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format (expected: Bearer <token>)".to_string())
        })?;

    // 3. Vérifier la signature et l'expiration
    let claims = issuer.verify(token).map_err(|e| {
        tracing::debug!(error = %e, path = req.path(), "rejected bearer token");
        e
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    })
}
