//! File access for prompts, generated outputs and reference examples.
//!
//! Relative paths resolve against the [`EvalFiles`] root (the directory of
//! the config file in the CLI). Absolute paths are used as given.

use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from file access. Every variant names the path involved.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct EvalFiles {
    root: PathBuf,
}

impl EvalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Read a whole text file.
    pub async fn load_text(&self, path: impl AsRef<Path>) -> Result<String, FileError> {
        let path = self.resolve(path);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FileError::NotFound { path }),
            Err(source) => Err(FileError::Read { path, source }),
        }
    }

    /// Files directly inside `dir`, sorted by path. With `extension` set,
    /// only files whose extension matches it ignoring case.
    pub async fn list_files(
        &self,
        dir: impl AsRef<Path>,
        extension: Option<&str>,
    ) -> Result<Vec<PathBuf>, FileError> {
        let dir = self.resolve(dir);
        if !fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(FileError::DirectoryNotFound { path: dir });
        }

        let read_error = |source: io::Error| FileError::Read {
            path: dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&dir).await.map_err(read_error)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map_err(read_error)?.is_file();
            if is_file && matches_extension(&path, extension) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Map of file stem to content for every matching file in `dir`.
    pub async fn load_dir(
        &self,
        dir: impl AsRef<Path>,
        extension: &str,
    ) -> Result<BTreeMap<String, String>, FileError> {
        let files = self.list_files(dir, Some(extension)).await?;
        let contents = self.load_all(&files).await?;

        Ok(files
            .iter()
            .zip(contents)
            .filter_map(|(path, content)| Some((file_stem(path)?, content)))
            .collect())
    }

    /// First file in `dir` whose stem equals `stem` ignoring case.
    pub async fn find_by_stem(
        &self,
        dir: impl AsRef<Path>,
        stem: &str,
    ) -> Result<Option<PathBuf>, FileError> {
        let files = self.list_files(dir, None).await?;
        Ok(files.into_iter().find(|path| {
            file_stem(path).is_some_and(|candidate| candidate.eq_ignore_ascii_case(stem))
        }))
    }

    /// Load several files concurrently, keeping input order.
    pub async fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<String>, FileError> {
        try_join_all(paths.iter().map(|path| self.load_text(path))).await
    }

    /// Write `content` to `<dir>/<title>.md`, creating `dir` if needed.
    pub async fn save_markdown(
        &self,
        dir: impl AsRef<Path>,
        content: &str,
        title: &str,
    ) -> Result<PathBuf, FileError> {
        let dir = self.resolve(dir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| FileError::Write {
                path: dir.clone(),
                source,
            })?;

        let path = dir.join(format!("{}.md", title));
        fs::write(&path, content)
            .await
            .map_err(|source| FileError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}

/// File name without its extension, if it is valid UTF-8.
pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn matches_extension(path: &Path, extension: Option<&str>) -> bool {
    let Some(wanted) = extension else {
        return true;
    };
    let wanted = wanted.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, EvalFiles) {
        let dir = tempfile::tempdir().unwrap();
        let files = EvalFiles::new(dir.path());
        (dir, files)
    }

    #[tokio::test]
    async fn test_load_text_relative_to_root() {
        let (dir, files) = setup();
        std::fs::write(dir.path().join("prompt.txt"), "hello").unwrap();
        assert_eq!(files.load_text("prompt.txt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_load_text_missing() {
        let (_dir, files) = setup();
        let err = files.load_text("missing.txt").await.unwrap_err();
        match err {
            FileError::NotFound { path } => assert!(path.ends_with("missing.txt")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_dir_filters_extension() {
        let (dir, files) = setup();
        let prompts = dir.path().join("prompts");
        std::fs::create_dir(&prompts).unwrap();
        std::fs::write(prompts.join("b.txt"), "B").unwrap();
        std::fs::write(prompts.join("a.TXT"), "A").unwrap();
        std::fs::write(prompts.join("notes.md"), "ignored").unwrap();

        let loaded = files.load_dir("prompts", "txt").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["a"], "A");
        assert_eq!(loaded["b"], "B");
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let (_dir, files) = setup();
        let result = files.list_files("nope", None).await;
        assert!(matches!(result, Err(FileError::DirectoryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_by_stem_ignores_case() {
        let (dir, files) = setup();
        std::fs::write(dir.path().join("Rust-Intro.txt"), "x").unwrap();
        let found = files.find_by_stem(".", "rust-intro").await.unwrap();
        assert!(found.unwrap().ends_with("Rust-Intro.txt"));
        assert!(files.find_by_stem(".", "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_all_keeps_order() {
        let (dir, files) = setup();
        let paths: Vec<PathBuf> = ["c", "a", "b"]
            .iter()
            .map(|name| {
                let path = dir.path().join(format!("{}.md", name));
                std::fs::write(&path, name).unwrap();
                path
            })
            .collect();
        let contents = files.load_all(&paths).await.unwrap();
        assert_eq!(contents, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_save_markdown_creates_directory() {
        let (dir, files) = setup();
        let path = files
            .save_markdown("out/nested", "# Done", "result")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("out/nested/result.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Done");
    }
}
