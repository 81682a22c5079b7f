use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,   // "healthy" | "degraded"
    pub database: &'static str, // "up" | "down"
    pub time: DateTime<Utc>,
}
