//! Модуль для работы с временными файлами
//!
//! Каждый запрос получает собственную временную директорию; все артефакты
//! запроса создаются внутри нее и удаляются вместе с ней.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;
use uuid::Uuid;

use crate::error::Result;

/// Временная область одного запуска конвейера
pub struct ArtifactScope {
    request_id: Uuid,
    dir: PathBuf,
    temp_dir: Option<TempDir>,
    /// Зарегистрированные пути артефактов, записанные или нет
    files: Vec<PathBuf>,
}

impl ArtifactScope {
    /// Создать новую директорию запроса внутри `work_dir`
    pub fn new(work_dir: &Path) -> Result<Self> {
        fs::create_dir_all(work_dir)?;
        let request_id = Uuid::new_v4();
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("voiceover-{}-", request_id.simple()))
            .tempdir_in(work_dir)?;
        debug!(
            "Request {} scratch directory: {}",
            request_id,
            temp_dir.path().display()
        );

        Ok(Self {
            request_id,
            dir: temp_dir.path().to_path_buf(),
            temp_dir: Some(temp_dir),
            files: Vec::new(),
        })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Выдать уникальный путь для артефакта; на диске ничего не создается
    pub fn artifact_path(&mut self, stem: &str, extension: &str) -> PathBuf {
        let file_name = format!("{}_{}.{}", stem, self.request_id.simple(), extension);
        let path = self.dir.join(file_name);
        self.files.push(path.clone());
        path
    }

    /// Удалить все артефакты и директорию запроса
    pub fn close(mut self) {
        self.remove_files();
        if let Some(temp_dir) = self.temp_dir.take() {
            if let Err(e) = temp_dir.close() {
                debug!("Failed to remove scratch directory {}: {}", self.dir.display(), e);
            }
        }
    }

    fn remove_files(&mut self) {
        for file in self.files.drain(..) {
            match fs::remove_file(&file) {
                Ok(()) => debug!("Removed artifact {}", file.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!("Failed to remove artifact {}: {}", file.display(), e),
            }
        }
    }
}

impl Drop for ArtifactScope {
    fn drop(&mut self) {
        // TempDir удалит директорию сам, здесь только файлы
        self.remove_files();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_unique_per_request() {
        let root = tempfile::tempdir().unwrap();
        let mut first = ArtifactScope::new(root.path()).unwrap();
        let mut second = ArtifactScope::new(root.path()).unwrap();

        let a = first.artifact_path("generated_audio", "wav");
        let b = second.artifact_path("generated_audio", "wav");
        assert_ne!(a, b);
        assert!(a.starts_with(first.dir()));
        assert_eq!(a.extension().unwrap(), "wav");
    }

    #[test]
    fn test_close_removes_partial_files() {
        let root = tempfile::tempdir().unwrap();
        let mut scope = ArtifactScope::new(root.path()).unwrap();
        let written = scope.artifact_path("generated_audio", "mp3");
        let never_written = scope.artifact_path("final_video", "mp4");
        fs::write(&written, b"partial").unwrap();

        scope.close();

        assert!(!written.exists());
        assert!(!never_written.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let mut scope = ArtifactScope::new(root.path()).unwrap();
            let path = scope.artifact_path("final_video", "mp4");
            fs::write(&path, b"data").unwrap();
            path
        };
        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
