use chrono::{SubsecRound, Utc};
use sea_orm::*;

use crate::error::AppError;
use crate::models::documents::{self, Entity as Documents};
use crate::services::storage::DocumentStorage;
use crate::services::student_service::StudentService;

pub const DEFAULT_DOC_TYPE: &str = "document";
const MAX_DOC_TYPE_LEN: usize = 50;

/// Fichier reçu du client, entièrement en mémoire.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub doc_type: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct DocumentService;

impl DocumentService {
    /// Enregistre un fichier pour un étudiant. L'étudiant est vérifié avant
    /// toute écriture sur le disque.
    pub async fn upload(
        db: &DatabaseConnection,
        storage: &dyn DocumentStorage,
        student_id: i32,
        file: IncomingFile,
    ) -> Result<documents::Model, AppError> {
        Self::ensure_student(db, student_id).await?;
        Self::store(db, storage, student_id, file).await
    }

    /// CV (obligatoire) + pièce d'identité (optionnelle), un document chacun.
    pub async fn upload_set(
        db: &DatabaseConnection,
        storage: &dyn DocumentStorage,
        student_id: i32,
        resume: Option<IncomingFile>,
        id_proof: Option<IncomingFile>,
    ) -> Result<Vec<documents::Model>, AppError> {
        Self::ensure_student(db, student_id).await?;

        let resume = resume.ok_or_else(|| AppError::Validation("Missing file part: resume".to_string()))?;

        let mut stored = vec![Self::store(db, storage, student_id, resume).await?];
        if let Some(id_proof) = id_proof {
            stored.push(Self::store(db, storage, student_id, id_proof).await?);
        }
        Ok(stored)
    }

    /// Métadonnées uniquement, du plus ancien au plus récent.
    pub async fn list(db: &DatabaseConnection, student_id: i32) -> Result<Vec<documents::Model>, AppError> {
        Self::ensure_student(db, student_id).await?;

        Ok(Documents::find()
            .filter(documents::Column::StudentId.eq(student_id))
            .order_by_asc(documents::Column::Id)
            .all(db)
            .await?)
    }

    /// Retourne les métadonnées et le contenu d'un document de cet étudiant.
    pub async fn download(
        db: &DatabaseConnection,
        storage: &dyn DocumentStorage,
        student_id: i32,
        document_id: i32,
    ) -> Result<(documents::Model, Vec<u8>), AppError> {
        let document = Documents::find_by_id(document_id)
            .filter(documents::Column::StudentId.eq(student_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        let bytes = storage.read(&document.storage_path).await?;
        Ok((document, bytes))
    }

    pub async fn ensure_student(db: &DatabaseConnection, student_id: i32) -> Result<(), AppError> {
        if !StudentService::exists(db, student_id).await? {
            return Err(AppError::NotFound("Student not found".to_string()));
        }
        Ok(())
    }

    async fn store(
        db: &DatabaseConnection,
        storage: &dyn DocumentStorage,
        student_id: i32,
        file: IncomingFile,
    ) -> Result<documents::Model, AppError> {
        validate_file(&file)?;

        let storage_path = storage.save(student_id, &file.filename, &file.bytes).await?;

        let document = documents::ActiveModel {
            student_id: Set(student_id),
            doc_type: Set(file.doc_type),
            filename: Set(file.filename),
            storage_path: Set(storage_path.clone()),
            content_type: Set(file.content_type),
            size_bytes: Set(file.bytes.len() as i64),
            uploaded_at: Set(Utc::now().trunc_subsecs(6)),
            ..Default::default()
        };

        match document.insert(db).await {
            Ok(document) => {
                tracing::info!(student_id, document_id = document.id, doc_type = %document.doc_type, "document uploaded");
                Ok(document)
            }
            Err(e) => {
                // pas de ligne, pas de fichier
                if let Err(cleanup) = storage.remove(&storage_path).await {
                    tracing::warn!(storage_path = %storage_path, error = %cleanup, "could not remove file after failed insert");
                }
                Err(e.into())
            }
        }
    }
}

fn validate_file(file: &IncomingFile) -> Result<(), AppError> {
    if file.filename.trim().is_empty() {
        return Err(AppError::Validation("File name is empty".to_string()));
    }
    if file.doc_type.is_empty() || file.doc_type.len() > MAX_DOC_TYPE_LEN {
        return Err(AppError::Validation(format!(
            "Document type must be 1 to {} characters",
            MAX_DOC_TYPE_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::dto::{AcademicDetailsInput, CreateStudentRequest};
    use crate::services::storage::LocalDiskStorage;

    fn file(doc_type: &str, name: &str, bytes: &[u8]) -> IncomingFile {
        IncomingFile {
            doc_type: doc_type.to_string(),
            filename: name.to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    async fn student(db: &DatabaseConnection) -> i32 {
        let request = CreateStudentRequest {
            name: "Priya Patel".to_string(),
            email: "priya.patel@email.com".to_string(),
            phone: "+91-9876543211".to_string(),
            gender: "Female".to_string(),
            academic_details: AcademicDetailsInput {
                college_name: "Delhi University".to_string(),
                department: "Information Technology".to_string(),
                graduation_year: 2025,
                cgpa: 9.1,
                backlogs: 0,
            },
        };
        StudentService::create(db, None, request).await.unwrap().id
    }

    fn files_under(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| if e.path().is_dir() { files_under(&e.path()) } else { 1 })
                    .sum()
            })
            .unwrap_or(0)
    }

    #[actix_web::test]
    async fn test_upload_list_download() {
        let db = db::test_connection().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        let student_id = student(&db).await;

        let doc = DocumentService::upload(&db, &storage, student_id, file("resume", "cv.pdf", b"pdf bytes"))
            .await
            .unwrap();
        assert_eq!(doc.student_id, student_id);
        assert_eq!(doc.filename, "cv.pdf");
        assert_eq!(doc.size_bytes, 9);
        assert!(doc.storage_path.starts_with(&format!("student_{}/", student_id)));

        let listed = DocumentService::list(&db, student_id).await.unwrap();
        assert_eq!(listed, vec![doc.clone()]);

        let (meta, bytes) = DocumentService::download(&db, &storage, student_id, doc.id).await.unwrap();
        assert_eq!(meta.id, doc.id);
        assert_eq!(bytes, b"pdf bytes");

        // document d'un autre étudiant
        let wrong_owner = DocumentService::download(&db, &storage, student_id + 1, doc.id).await;
        assert!(matches!(wrong_owner, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_upload_to_unknown_student_writes_nothing() {
        let db = db::test_connection().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        let result = DocumentService::upload(&db, &storage, 404, file("resume", "cv.pdf", b"x")).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(files_under(dir.path()), 0);
        assert!(matches!(DocumentService::list(&db, 404).await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_upload_set_requires_resume() {
        let db = db::test_connection().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        let student_id = student(&db).await;

        let missing = DocumentService::upload_set(&db, &storage, student_id, None, Some(file("id_proof", "id.png", b"x"))).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));
        assert_eq!(files_under(dir.path()), 0);

        let stored = DocumentService::upload_set(
            &db,
            &storage,
            student_id,
            Some(file("resume", "cv.pdf", b"cv")),
            Some(file("id_proof", "id.png", b"id")),
        )
        .await
        .unwrap();

        let types: Vec<&str> = stored.iter().map(|d| d.doc_type.as_str()).collect();
        assert_eq!(types, vec!["resume", "id_proof"]);
        assert_eq!(files_under(dir.path()), 2);
    }

    #[actix_web::test]
    async fn test_deleting_student_removes_files() {
        let db = db::test_connection().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        let student_id = student(&db).await;

        DocumentService::upload(&db, &storage, student_id, file("resume", "cv.pdf", b"cv")).await.unwrap();
        assert_eq!(files_under(dir.path()), 1);

        StudentService::delete(&db, &storage, student_id).await.unwrap();

        assert_eq!(files_under(dir.path()), 0);
        assert_eq!(Documents::find().count(&db).await.unwrap(), 0);
    }

    #[test]
    fn test_validate_file() {
        assert!(validate_file(&file("resume", "cv.pdf", b"")).is_ok());
        assert!(validate_file(&file("resume", "  ", b"x")).is_err());
        assert!(validate_file(&file(&"x".repeat(51), "cv.pdf", b"x")).is_err());
    }
}
