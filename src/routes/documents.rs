use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse};
use futures::StreamExt;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::UploadResponse;
use crate::services::document_service::{DocumentService, IncomingFile, DEFAULT_DOC_TYPE};
use crate::services::storage::DocumentStorage;

/// POST /students/{id}/documents - Première part fichier du formulaire (PROTÉGÉE)
/// Le nom de la part sert de type de document ("resume", "id_proof", ...).
#[post("/{student_id}/documents")]
pub async fn upload_document(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn DocumentStorage>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();
    DocumentService::ensure_student(db.get_ref(), student_id).await?;

    let file = read_files(&mut payload, config.max_upload_bytes, 1, |_| true)
        .await?
        .pop()
        .ok_or_else(|| AppError::Validation("No file part in the request".to_string()))?;

    tracing::debug!(student_id, user_id = auth_user.user_id, filename = %file.filename, "upload");

    let document = DocumentService::upload(db.get_ref(), storage.get_ref(), student_id, file).await?;
    Ok(HttpResponse::Created().json(document))
}

/// POST /students/{id}/upload - Part `resume` obligatoire, `id_proof` optionnelle (PROTÉGÉE)
#[post("/{student_id}/upload")]
pub async fn upload_resume_and_id(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn DocumentStorage>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();
    DocumentService::ensure_student(db.get_ref(), student_id).await?;

    // premier resume et premier id_proof uniquement
    let mut seen_resume = false;
    let mut seen_id_proof = false;
    let wanted = |doc_type: &str| match doc_type {
        "resume" if !seen_resume => {
            seen_resume = true;
            true
        }
        "id_proof" if !seen_id_proof => {
            seen_id_proof = true;
            true
        }
        _ => false,
    };

    let mut resume = None;
    let mut id_proof = None;
    for file in read_files(&mut payload, config.max_upload_bytes, 2, wanted).await? {
        if file.doc_type == "resume" {
            resume = Some(file);
        } else {
            id_proof = Some(file);
        }
    }

    tracing::debug!(student_id, user_id = auth_user.user_id, "resume / id proof upload");

    let files = DocumentService::upload_set(db.get_ref(), storage.get_ref(), student_id, resume, id_proof).await?;
    Ok(HttpResponse::Created().json(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        files,
    }))
}

/// GET /students/{id}/documents - Métadonnées uniquement
#[get("/{student_id}/documents")]
pub async fn list_documents(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let documents = DocumentService::list(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(documents))
}

/// GET /students/{id}/documents/{doc_id}/download (PROTÉGÉE)
#[get("/{student_id}/documents/{document_id}/download")]
pub async fn download_document(
    _auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn DocumentStorage>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (student_id, document_id) = path.into_inner();

    let (document, bytes) =
        DocumentService::download(db.get_ref(), storage.get_ref(), student_id, document_id).await?;

    let content_type = document
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.filename)],
        })
        .body(bytes))
}

/// Bufferise au plus `max_files` parts fichier acceptées par `wanted` (appelé
/// avec le type de document), chacune limitée à `max_bytes`. Les autres parts
/// sont consommées sans être gardées ; la lecture s'arrête dès que c'est complet.
async fn read_files<F>(
    payload: &mut Multipart,
    max_bytes: usize,
    max_files: usize,
    mut wanted: F,
) -> Result<Vec<IncomingFile>, AppError>
where
    F: FnMut(&str) -> bool,
{
    let mut files = Vec::new();
    while files.len() < max_files {
        let Some(field) = payload.next().await else {
            break;
        };
        let mut field = field.map_err(invalid_multipart)?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_owned),
                cd.get_filename().map(str::to_owned),
            ),
            None => (None, None),
        };
        let doc_type = doc_type_for(name.as_deref());

        let Some(filename) = filename.filter(|_| wanted(&doc_type)) else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(invalid_multipart)?;
            }
            continue;
        };

        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(invalid_multipart)?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::Validation(format!(
                    "File exceeds the upload limit of {} bytes",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        files.push(IncomingFile {
            doc_type,
            filename,
            content_type,
            bytes,
        });
    }

    Ok(files)
}

fn invalid_multipart(e: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e))
}

/// Les noms de part génériques ("file", "") donnent le type par défaut.
fn doc_type_for(part_name: Option<&str>) -> String {
    match part_name.map(str::trim) {
        Some("") | Some("file") | None => DEFAULT_DOC_TYPE.to_string(),
        Some(name) => name.to_string(),
    }
}

pub fn documents_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_document)
        .service(upload_resume_and_id)
        .service(list_documents)
        .service(download_document);
}
