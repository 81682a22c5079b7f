// ============================================================================
// MODEL : DOCUMENTS
// ============================================================================
//
// Description:
//   Métadonnées d'un fichier uploadé pour un étudiant. Le contenu est sur
//   le disque (voir services::storage), cette ligne pointe seulement dessus.
//
// Colonnes:
//   - doc_type      : "resume", "id_proof", "document", ...
//   - filename      : nom du fichier envoyé par le client
//   - storage_path  : chemin relatif à UPLOAD_DIR, ex.
//                     student_12/4f1c..._resume.pdf
//
// Points d'attention:
//   - La ligne et le fichier sont supprimés ensemble (la suppression d'un
//     étudiant supprime les fichiers après le commit de la transaction)
//
// ============================================================================

use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub doc_type: String,
    pub filename: String,
    #[sea_orm(column_type = "Text")]
    pub storage_path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
