use actix_web::{get, post, put, delete, web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateStudentRequest, Pagination, SearchQuery, UpdateStudentRequest};
use crate::routes::documents;
use crate::services::storage::DocumentStorage;
use crate::services::student_service::StudentService;

/// GET /students - Tous les étudiants, ?skip=&limit= optionnels
#[get("")]
pub async fn list_students(
    db: web::Data<DatabaseConnection>,
    query: web::Query<Pagination>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let students = StudentService::list(db.get_ref(), query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(students))
}

/// GET /students/search?college=&year=&department=
#[get("/search")]
pub async fn search_students(
    db: web::Data<DatabaseConnection>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let students = StudentService::search(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(students))
}

/// POST /students - Étudiant + infos académiques (PROTÉGÉE)
#[post("")]
pub async fn create_student(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateStudentRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let student = StudentService::create(db.get_ref(), Some(auth_user.user_id), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(student))
}

/// GET /students/{id}
#[get("/{student_id}")]
pub async fn get_student(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let student = StudentService::get(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(student))
}

/// PUT /students/{id} - Mise à jour partielle (PROTÉGÉE)
#[put("/{student_id}")]
pub async fn update_student(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<UpdateStudentRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let student_id = path.into_inner();
    tracing::debug!(student_id, user_id = auth_user.user_id, "updating student");

    let student = StudentService::update(db.get_ref(), student_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(student))
}

/// DELETE /students/{id} - Étudiant, infos académiques, documents et fichiers (PROTÉGÉE)
#[delete("/{student_id}")]
pub async fn delete_student(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn DocumentStorage>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();
    tracing::debug!(student_id, user_id = auth_user.user_id, "deleting student");

    StudentService::delete(db.get_ref(), storage.get_ref(), student_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn students_routes(cfg: &mut web::ServiceConfig) {
    // /search avant /{student_id}
    cfg.service(
        web::scope("/students")
            .service(list_students)
            .service(create_student)
            .service(search_students)
            .service(get_student)
            .service(update_student)
            .service(delete_student)
            .configure(documents::documents_routes)
    );
}
