/*
services/student_service.rs
├─ create()   ← étudiant + infos académiques, une transaction
├─ get()      ← étudiant + infos académiques + documents
├─ update()   ← mise à jour partielle, une transaction
├─ delete()   ← documents + infos académiques + étudiant, puis fichiers sur le disque
├─ list()     ← tous les étudiants, skip/limit optionnels
└─ search()   ← college / year / department, combinés en ET

Les relations sont chargées explicitement : une requête IN (...) par table
liée pour toute la page d'étudiants, puis assemblage en mémoire (load_views).
*/
use std::collections::HashMap;

use chrono::{SubsecRound, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::{
    AcademicDetailsPatch, CreateStudentRequest, Pagination, SearchQuery, StudentResponse,
    UpdateStudentRequest,
};
use crate::models::{academic_details, documents, students};
use crate::services::storage::DocumentStorage;

pub struct StudentService;

impl StudentService {
    pub async fn create(
        db: &DatabaseConnection,
        owner_user_id: Option<i32>,
        request: CreateStudentRequest,
    ) -> Result<StudentResponse, AppError> {
        let txn = db.begin().await?;

        Self::ensure_email_free(&txn, &request.email, None).await?;

        let student = students::ActiveModel {
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            gender: Set(request.gender),
            owner_user_id: Set(owner_user_id),
            created_at: Set(Utc::now().trunc_subsecs(6)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_unique_violation)?;

        let academic = request.academic_details;
        let academic = academic_details::ActiveModel {
            student_id: Set(student.id),
            college_name: Set(academic.college_name),
            department: Set(academic.department),
            graduation_year: Set(academic.graduation_year),
            cgpa: Set(academic.cgpa),
            backlogs: Set(academic.backlogs),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!(student_id = student.id, ?owner_user_id, "student created");

        Ok(StudentResponse::assemble(student, Some(academic), Vec::new()))
    }

    pub async fn get(db: &DatabaseConnection, student_id: i32) -> Result<StudentResponse, AppError> {
        let student = Self::find_student(db, student_id).await?;
        let mut views = Self::load_views(db, vec![student]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("student view went missing".to_string()))
    }

    pub async fn update(
        db: &DatabaseConnection,
        student_id: i32,
        patch: UpdateStudentRequest,
    ) -> Result<StudentResponse, AppError> {
        let txn = db.begin().await?;

        let student = Self::find_student(&txn, student_id).await?;

        if let Some(email) = &patch.email {
            Self::ensure_email_free(&txn, email, Some(student_id)).await?;
        }

        // 1. Colonnes de l'étudiant
        let mut active: students::ActiveModel = student.clone().into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(phone);
        }
        if let Some(gender) = patch.gender {
            active.gender = Set(gender);
        }
        let student = if active.is_changed() {
            active.update(&txn).await.map_err(map_unique_violation)?
        } else {
            student
        };

        // 2. Infos académiques
        if let Some(academic_patch) = patch.academic_details {
            Self::apply_academic_patch(&txn, student_id, academic_patch).await?;
        }

        txn.commit().await?;
        tracing::info!(student_id, "student updated");

        Self::get(db, student.id).await
    }

    /// Supprime l'étudiant, ses infos académiques et ses documents dans une
    /// transaction, puis supprime les fichiers.
    pub async fn delete(
        db: &DatabaseConnection,
        storage: &dyn DocumentStorage,
        student_id: i32,
    ) -> Result<(), AppError> {
        let txn = db.begin().await?;

        let student = Self::find_student(&txn, student_id).await?;

        let docs = documents::Entity::find()
            .filter(documents::Column::StudentId.eq(student_id))
            .all(&txn)
            .await?;

        documents::Entity::delete_many()
            .filter(documents::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await?;
        academic_details::Entity::delete_many()
            .filter(academic_details::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await?;
        student.delete(&txn).await?;

        txn.commit().await?;

        // les lignes sont déjà supprimées : un fichier non supprimé est seulement loggé
        for doc in &docs {
            if let Err(e) = storage.remove(&doc.storage_path).await {
                tracing::warn!(student_id, document_id = doc.id, error = %e, "orphaned document file");
            }
        }

        tracing::info!(student_id, documents = docs.len(), "student deleted");
        Ok(())
    }

    pub async fn list(
        db: &DatabaseConnection,
        pagination: Pagination,
    ) -> Result<Vec<StudentResponse>, AppError> {
        let query = students::Entity::find().order_by_asc(students::Column::Id);
        let rows = paginate(query, pagination).all(db).await?;
        Self::load_views(db, rows).await
    }

    /// Filtres combinés en ET, les filtres absents sont ignorés. College et
    /// department : sous-chaîne sans casse. Year : égalité stricte.
    pub async fn search(
        db: &DatabaseConnection,
        filters: &SearchQuery,
    ) -> Result<Vec<StudentResponse>, AppError> {
        let mut condition = Condition::all();

        if let Some(college) = non_blank(&filters.college) {
            condition = condition.add(ilike(academic_details::Column::CollegeName, college));
        }
        if let Some(year) = filters.year {
            condition = condition.add(academic_details::Column::GraduationYear.eq(year));
        }
        if let Some(department) = non_blank(&filters.department) {
            condition = condition.add(ilike(academic_details::Column::Department, department));
        }

        let query = students::Entity::find()
            .inner_join(academic_details::Entity)
            .filter(condition)
            .order_by_asc(students::Column::Id);

        let rows = paginate(query, filters.pagination()).all(db).await?;
        Self::load_views(db, rows).await
    }

    pub async fn exists<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<bool, AppError> {
        let count = students::Entity::find_by_id(student_id).count(db).await?;
        Ok(count > 0)
    }

    pub async fn count(db: &DatabaseConnection) -> Result<u64, AppError> {
        Ok(students::Entity::find().count(db).await?)
    }

    async fn find_student<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<students::Model, AppError> {
        students::Entity::find_by_id(student_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))
    }

    async fn ensure_email_free<C: ConnectionTrait>(
        db: &C,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<(), AppError> {
        let mut query = students::Entity::find().filter(students::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(students::Column::Id.ne(id));
        }

        if query.count(db).await? > 0 {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        Ok(())
    }

    async fn apply_academic_patch(
        txn: &DatabaseTransaction,
        student_id: i32,
        patch: AcademicDetailsPatch,
    ) -> Result<(), AppError> {
        let existing = academic_details::Entity::find()
            .filter(academic_details::Column::StudentId.eq(student_id))
            .one(txn)
            .await?;

        match existing {
            Some(row) => {
                let mut active: academic_details::ActiveModel = row.into();
                if let Some(v) = patch.college_name {
                    active.college_name = Set(v);
                }
                if let Some(v) = patch.department {
                    active.department = Set(v);
                }
                if let Some(v) = patch.graduation_year {
                    active.graduation_year = Set(v);
                }
                if let Some(v) = patch.cgpa {
                    active.cgpa = Set(v);
                }
                if let Some(v) = patch.backlogs {
                    active.backlogs = Set(v);
                }
                if active.is_changed() {
                    active.update(txn).await?;
                }
            }
            // pas encore de ligne : le patch doit être complet
            None => {
                let (Some(college_name), Some(department), Some(graduation_year), Some(cgpa)) =
                    (patch.college_name, patch.department, patch.graduation_year, patch.cgpa)
                else {
                    return Err(AppError::Validation(
                        "academic_details requires college_name, department, graduation_year and cgpa"
                            .to_string(),
                    ));
                };

                academic_details::ActiveModel {
                    student_id: Set(student_id),
                    college_name: Set(college_name),
                    department: Set(department),
                    graduation_year: Set(graduation_year),
                    cgpa: Set(cgpa),
                    backlogs: Set(patch.backlogs.unwrap_or(0)),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }

        Ok(())
    }

    /// Récupère infos académiques et documents de tous les étudiants donnés,
    /// une requête par table, en gardant l'ordre des étudiants.
    async fn load_views<C: ConnectionTrait>(
        db: &C,
        rows: Vec<students::Model>,
    ) -> Result<Vec<StudentResponse>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|s| s.id).collect();

        let mut academics: HashMap<i32, academic_details::Model> = academic_details::Entity::find()
            .filter(academic_details::Column::StudentId.is_in(ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.student_id, a))
            .collect();

        let mut docs: HashMap<i32, Vec<documents::Model>> = HashMap::new();
        for doc in documents::Entity::find()
            .filter(documents::Column::StudentId.is_in(ids))
            .order_by_asc(documents::Column::Id)
            .all(db)
            .await?
        {
            docs.entry(doc.student_id).or_default().push(doc);
        }

        Ok(rows
            .into_iter()
            .map(|student| {
                let academic = academics.remove(&student.id);
                let documents = docs.remove(&student.id).unwrap_or_default();
                StudentResponse::assemble(student, academic, documents)
            })
            .collect())
    }
}

fn paginate(query: Select<students::Entity>, pagination: Pagination) -> Select<students::Entity> {
    match (pagination.skip.filter(|&skip| skip > 0), pagination.limit) {
        (Some(skip), Some(limit)) => query.offset(skip).limit(limit),
        // SQLite refuse OFFSET sans LIMIT
        (Some(skip), None) => query.offset(skip).limit(i64::MAX as u64),
        (None, Some(limit)) => query.limit(limit),
        (None, None) => query,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `lower(column) LIKE lower('%value%')`, même résultat sur Postgres et SQLite
fn ilike(column: academic_details::Column, value: &str) -> SimpleExpr {
    let escaped = value
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("%{}%", escaped);

    Expr::expr(Func::lower(Expr::col((academic_details::Entity, column))))
        .like(LikeExpr::new(pattern).escape('\\'))
}

fn map_unique_violation(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email already registered".to_string())
        }
        _ => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::dto::AcademicDetailsInput;
    use crate::services::storage::LocalDiskStorage;

    fn student_request(name: &str, email: &str, college: &str, department: &str, year: i32) -> CreateStudentRequest {
        CreateStudentRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            gender: "Male".to_string(),
            academic_details: AcademicDetailsInput {
                college_name: college.to_string(),
                department: department.to_string(),
                graduation_year: year,
                cgpa: 8.5,
                backlogs: 0,
            },
        }
    }

    #[actix_web::test]
    async fn test_create_and_get() {
        let db = db::test_connection().await;

        let created = StudentService::create(
            &db,
            None,
            student_request("Uday", "Uday@example.com", "GGSIPU Delhi", "Computer Science", 2025),
        )
        .await
        .unwrap();

        let fetched = StudentService::get(&db, created.id).await.unwrap();
        assert_eq!(fetched, created);

        let academic = fetched.academic_details.unwrap();
        assert_eq!(academic.student_id, created.id);
        assert_eq!(academic.college_name, "GGSIPU Delhi");
        assert!(fetched.documents.is_empty());
    }

    #[actix_web::test]
    async fn test_duplicate_student_email_is_conflict() {
        let db = db::test_connection().await;
        let request = student_request("A", "dup@example.com", "X", "Y", 2024);

        StudentService::create(&db, None, request.clone()).await.unwrap();
        let second = StudentService::create(&db, None, request).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(StudentService::count(&db).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_get_missing_is_not_found() {
        let db = db::test_connection().await;
        assert!(matches!(StudentService::get(&db, 42).await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_partial_update() {
        let db = db::test_connection().await;
        let created = StudentService::create(&db, None, student_request("A", "a@example.com", "X", "Y", 2024))
            .await
            .unwrap();

        let patch = UpdateStudentRequest {
            phone: Some("1112223334".to_string()),
            academic_details: Some(AcademicDetailsPatch {
                cgpa: Some(9.2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = StudentService::update(&db, created.id, patch).await.unwrap();

        assert_eq!(updated.phone, "1112223334");
        assert_eq!(updated.name, "A");
        let academic = updated.academic_details.unwrap();
        assert_eq!(academic.cgpa, 9.2);
        assert_eq!(academic.college_name, "X");

        let missing = StudentService::update(&db, 999, UpdateStudentRequest::default()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_update_to_taken_email_is_conflict() {
        let db = db::test_connection().await;
        StudentService::create(&db, None, student_request("A", "a@example.com", "X", "Y", 2024)).await.unwrap();
        let b = StudentService::create(&db, None, student_request("B", "b@example.com", "X", "Y", 2024)).await.unwrap();

        let patch = UpdateStudentRequest {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(StudentService::update(&db, b.id, patch).await, Err(AppError::Conflict(_))));

        // garder son propre email est autorisé
        let same = UpdateStudentRequest {
            email: Some("b@example.com".to_string()),
            ..Default::default()
        };
        assert!(StudentService::update(&db, b.id, same).await.is_ok());
    }

    #[actix_web::test]
    async fn test_delete_then_get_is_not_found() {
        let db = db::test_connection().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        let created = StudentService::create(&db, None, student_request("A", "a@example.com", "X", "Y", 2024))
            .await
            .unwrap();

        StudentService::delete(&db, &storage, created.id).await.unwrap();

        assert!(matches!(StudentService::get(&db, created.id).await, Err(AppError::NotFound(_))));
        let orphans = academic_details::Entity::find().count(&db).await.unwrap();
        assert_eq!(orphans, 0);
        assert!(matches!(
            StudentService::delete(&db, &storage, created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_search_ands_filters() {
        let db = db::test_connection().await;
        let both = StudentService::create(&db, None, student_request("Both", "1@example.com", "GGSIPU Delhi", "Computer Science", 2025))
            .await
            .unwrap();
        StudentService::create(&db, None, student_request("College only", "2@example.com", "GGSIPU Delhi", "Computer Science", 2024))
            .await
            .unwrap();
        StudentService::create(&db, None, student_request("Year only", "3@example.com", "Delhi University", "Electronics", 2025))
            .await
            .unwrap();

        let filters = SearchQuery {
            college: Some("GGSIPU Delhi".to_string()),
            year: Some(2025),
            ..Default::default()
        };
        let found = StudentService::search(&db, &filters).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, both.id);
    }

    #[actix_web::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = db::test_connection().await;
        StudentService::create(&db, None, student_request("A", "1@example.com", "BITS Pilani", "Computer Science", 2024)).await.unwrap();
        StudentService::create(&db, None, student_request("B", "2@example.com", "VIT University", "Civil Engineering", 2024)).await.unwrap();

        let by_department = SearchQuery {
            department: Some("computer".to_string()),
            ..Default::default()
        };
        let found = StudentService::search(&db, &by_department).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "A");

        // aucun filtre : tout
        let all = StudentService::search(&db, &SearchQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[actix_web::test]
    async fn test_list_pagination() {
        let db = db::test_connection().await;
        for i in 0..5 {
            let email = format!("s{}@example.com", i);
            StudentService::create(&db, None, student_request("S", &email, "X", "Y", 2024)).await.unwrap();
        }

        let all = StudentService::list(&db, Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 5);

        let page = StudentService::list(&db, Pagination { skip: Some(1), limit: Some(2) }).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, all[1].id);
        assert_eq!(page[1].id, all[2].id);

        let tail = StudentService::list(&db, Pagination { skip: Some(3), limit: None }).await.unwrap();
        assert_eq!(tail.iter().map(|s| s.id).collect::<Vec<_>>(), vec![all[3].id, all[4].id]);

        let filters = SearchQuery {
            college: Some("x".to_string()),
            skip: Some(4),
            ..Default::default()
        };
        let found = StudentService::search(&db, &filters).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, all[4].id);
    }

    #[actix_web::test]
    async fn test_academic_patch_on_bare_student() {
        let db = db::test_connection().await;
        let bare = students::ActiveModel {
            name: Set("Bare".to_string()),
            email: Set("bare@example.com".to_string()),
            phone: Set("9876543210".to_string()),
            gender: Set("Female".to_string()),
            owner_user_id: Set(None),
            created_at: Set(Utc::now().trunc_subsecs(6)),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let partial = UpdateStudentRequest {
            academic_details: Some(AcademicDetailsPatch {
                cgpa: Some(7.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let rejected = StudentService::update(&db, bare.id, partial).await;
        assert!(matches!(rejected, Err(AppError::Validation(_))));
        assert!(StudentService::get(&db, bare.id).await.unwrap().academic_details.is_none());

        let complete = UpdateStudentRequest {
            academic_details: Some(AcademicDetailsPatch {
                college_name: Some("GGSIPU Delhi".to_string()),
                department: Some("Computer Science".to_string()),
                graduation_year: Some(2026),
                cgpa: Some(7.0),
                backlogs: None,
            }),
            ..Default::default()
        };
        let updated = StudentService::update(&db, bare.id, complete).await.unwrap();
        let academic = updated.academic_details.unwrap();
        assert_eq!(academic.graduation_year, 2026);
        assert_eq!(academic.backlogs, 0);
    }
}
