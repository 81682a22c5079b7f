use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::error::AppError;

/// Stockage du contenu des documents uploadés.
/// Les chemins retournés sont relatifs à la racine du stockage.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn save(&self, student_id: i32, filename: &str, bytes: &[u8]) -> Result<String, AppError>;

    async fn read(&self, storage_path: &str) -> Result<Vec<u8>, AppError>;

    /// Supprimer un fichier déjà absent n'est pas une erreur.
    async fn remove(&self, storage_path: &str) -> Result<(), AppError>;
}

/// Disque local, un dossier par étudiant : `<root>/student_<id>/<uuid>_<name>`
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Refuse les chemins absolus et `..` : un chemin stocké ne sort jamais de la racine.
    fn resolve(&self, storage_path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(storage_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::Internal(format!("Refusing storage path {:?}", storage_path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStorage for LocalDiskStorage {
    async fn save(&self, student_id: i32, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let dir_name = format!("student_{}", student_id);
        fs::create_dir_all(self.root.join(&dir_name)).await?;

        let file_name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(filename));
        let storage_path = format!("{}/{}", dir_name, file_name);

        fs::write(self.root.join(&dir_name).join(&file_name), bytes).await?;
        tracing::debug!(storage_path = %storage_path, size = bytes.len(), "document stored");

        Ok(storage_path)
    }

    async fn read(&self, storage_path: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(storage_path)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found on server".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, storage_path: &str) -> Result<(), AppError> {
        let path = self.resolve(storage_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Garde le dernier composant du chemin et remplace tout caractère hors de
/// `[A-Za-z0-9._-]` par `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("resume.pdf"), "resume.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cv final.pdf"), "cv_final.pdf");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[tokio::test]
    async fn test_save_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        let path = storage.save(7, "cv.pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.starts_with("student_7/"));
        assert!(path.ends_with("_cv.pdf"));
        assert!(dir.path().join(&path).exists());

        assert_eq!(storage.read(&path).await.unwrap(), b"%PDF-1.4");

        storage.remove(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        // la deuxième suppression ne fait rien
        storage.remove(&path).await.unwrap();
        assert!(matches!(storage.read(&path).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        let first = storage.save(1, "cv.pdf", b"one").await.unwrap();
        let second = storage.save(1, "cv.pdf", b"two").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(storage.read(&first).await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        assert!(matches!(storage.read("../secret").await, Err(AppError::Internal(_))));
        assert!(matches!(storage.remove("/etc/passwd").await, Err(AppError::Internal(_))));
    }
}
