//! Directory Lister
//!
//! The filesystem seam used by the manifest scanner. `FsLister` talks to the
//! real disk; tests substitute an in-memory tree.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A subdirectory of the plugins root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryStat {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Immediate subdirectories of `root`. Fails with `NotFound` when `root`
    /// does not exist.
    async fn list_dirs(&self, root: &Path) -> io::Result<Vec<DirEntryStat>>;

    /// Modification time of `path`, or `None` if it does not exist.
    async fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>>;

    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    async fn is_file(&self, path: &Path) -> bool;
}

/// Lists plugin directories on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

#[async_trait]
impl DirectoryLister for FsLister {
    async fn list_dirs(&self, root: &Path) -> io::Result<Vec<DirEntryStat>> {
        let mut entries = tokio::fs::read_dir(root).await?;
        let mut dirs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            // Follows symlinks so linked theme checkouts count as plugins
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            if !metadata.is_dir() {
                continue;
            }

            dirs.push(DirEntryStat {
                name,
                path,
                modified: metadata.modified().ok(),
            });
        }

        Ok(dirs)
    }

    async fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.modified().ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn is_file(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lists_only_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::create_dir(dir.path().join("beta")).unwrap();
        std::fs::write(dir.path().join("README.md"), "not a plugin").unwrap();

        let mut names: Vec<String> = FsLister
            .list_dirs(dir.path())
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let dir = tempdir().unwrap();
        let err = FsLister
            .list_dirs(&dir.path().join("absent"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_modified_of_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let missing = FsLister.modified(&dir.path().join("theme.json")).await.unwrap();
        assert!(missing.is_none());
        assert!(!FsLister.is_file(&dir.path().join("theme.json")).await);
    }
}
