pub mod auth;
pub mod documents;
pub mod health;
pub mod students;

use std::sync::Arc;

use actix_web::web;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::storage::DocumentStorage;
use crate::utils::jwt::TokenIssuer;
use crate::utils::password::PasswordHasher;

/// Tout ce que les handlers extraient via web::Data, construit une fois dans main().
#[derive(Clone)]
pub struct AppState {
    pub db: web::Data<DatabaseConnection>,
    pub config: web::Data<AppConfig>,
    pub tokens: web::Data<TokenIssuer>,
    pub hasher: web::Data<PasswordHasher>,
    pub storage: web::Data<dyn DocumentStorage>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig, storage: Arc<dyn DocumentStorage>) -> Self {
        Self {
            db: web::Data::new(db),
            tokens: web::Data::new(TokenIssuer::new(&config.auth)),
            hasher: web::Data::new(PasswordHasher::new(config.auth.password_hash_iterations)),
            config: web::Data::new(config),
            storage: web::Data::from(storage),
        }
    }
}

/// Enregistre l'état partagé, les handlers d'erreur des extracteurs et toutes les routes.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state.db)
            .app_data(state.config)
            .app_data(state.tokens)
            .app_data(state.hasher)
            .app_data(state.storage)
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config());

        configure_routes(cfg);
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::root)
        .service(health::health_check)
        .configure(auth::auth_routes)
        .configure(students::students_routes);
}

// Body / query string / id de chemin invalides : erreurs de validation (422).

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid request body: {}", err)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query string: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid path parameter: {}", err)).into()
    })
}
