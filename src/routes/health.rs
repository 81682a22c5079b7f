use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::db;
use crate::models::health::HealthResponse;

#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(concat!(
            "<html><head><title>Student Management System</title></head><body>",
            "<h1>Welcome to the Student Management System API</h1>",
            "<p>Try <a href=\"/health\">/health</a> or <a href=\"/students\">/students</a>.</p>",
            "</body></html>",
        ))
}

#[get("/health")]
pub async fn health_check(db: web::Data<DatabaseConnection>) -> HttpResponse {
    let database_up = db::ping(db.get_ref()).await;

    let response = HealthResponse {
        status: if database_up { "healthy" } else { "degraded" },
        database: if database_up { "up" } else { "down" },
        time: Utc::now(),
    };

    if database_up {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
