// Corps des requêtes / réponses de l'API HTTP
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::{academic_details, documents, students};

// ---------------------------------------------------------------- auth

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i32,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64, // secondes
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i32,
    pub email: String,
}

// ---------------------------------------------------------------- students

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AcademicDetailsInput {
    #[validate(length(min = 1, max = 200))]
    pub college_name: String,
    #[validate(length(min = 1, max = 100))]
    pub department: String,
    #[validate(range(min = 1900, max = 2100))]
    pub graduation_year: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub cgpa: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub backlogs: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 15))]
    pub phone: String,
    #[validate(length(min = 1, max = 10))]
    pub gender: String,
    #[validate(nested)]
    pub academic_details: AcademicDetailsInput,
}

/// Tous les champs sont optionnels : seul ce qui est envoyé est écrit.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AcademicDetailsPatch {
    #[validate(length(min = 1, max = 200))]
    pub college_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub department: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub graduation_year: Option<i32>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub cgpa: Option<f64>,
    #[validate(range(min = 0))]
    pub backlogs: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 15))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub gender: Option<String>,
    #[validate(nested)]
    pub academic_details: Option<AcademicDetailsPatch>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct Pagination {
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchQuery {
    pub college: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year: Option<i32>,
    pub department: Option<String>,
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

/// `?year=` (vide) veut dire "pas de filtre", pas une erreur de parsing.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Étudiant avec ses infos académiques et ses documents, tel que retourné par l'API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub owner_user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub academic_details: Option<academic_details::Model>,
    pub documents: Vec<documents::Model>,
}

impl StudentResponse {
    pub fn assemble(
        student: students::Model,
        academic_details: Option<academic_details::Model>,
        documents: Vec<documents::Model>,
    ) -> Self {
        Self {
            id: student.id,
            name: student.name,
            email: student.email,
            phone: student.phone,
            gender: student.gender,
            owner_user_id: student.owner_user_id,
            created_at: student.created_at,
            academic_details,
            documents,
        }
    }
}

// ---------------------------------------------------------------- documents

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<documents::Model>,
}
