// src/infra/fs.rs — Filesystem capability
//
// The suite builder and the summary writer only talk to `FileSystem`, so
// tests can run against `MemoryFileSystem` without touching the disk.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub trait FileSystem: Send + Sync {
    fn read_text(&self, path: &Path) -> io::Result<String>;
    fn write_text(&self, path: &Path, content: &str) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    /// Direct children of `path`, sorted. Empty when `path` is not a directory.
    fn list_dir(&self, path: &Path) -> Vec<PathBuf>;
    /// Create `path` and any missing parents.
    fn mkdir(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_dir(&self, path: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(path) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();
        paths
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// In-memory filesystem. Directories are implied by the files under them
/// plus any created explicitly with `mkdir`.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<PathBuf, String>>,
    dirs: RwLock<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for fixtures.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), content.into());
        }
        self
    }

    fn has_descendants(&self, path: &Path) -> bool {
        let in_files = self
            .files
            .read()
            .map(|f| f.keys().any(|p| p != path && p.starts_with(path)))
            .unwrap_or(false);
        let in_dirs = self
            .dirs
            .read()
            .map(|d| d.iter().any(|p| p.starts_with(path)))
            .unwrap_or(false);
        in_files || in_dirs
    }
}

fn poisoned() -> io::Error {
    io::Error::other("memory filesystem lock poisoned")
}

impl FileSystem for MemoryFileSystem {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        let files = self.files.read().map_err(|_| poisoned())?;
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn write_text(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        !self.is_file(path) && self.has_descendants(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|f| f.contains_key(path))
            .unwrap_or(false)
    }

    fn list_dir(&self, path: &Path) -> Vec<PathBuf> {
        let mut children: Vec<PathBuf> = Vec::new();
        let mut push_child = |p: &Path| {
            if let Ok(rest) = p.strip_prefix(path) {
                if let Some(first) = rest.components().next() {
                    let child = path.join(first);
                    if !children.contains(&child) {
                        children.push(child);
                    }
                }
            }
        };
        if let Ok(files) = self.files.read() {
            files.keys().filter(|p| *p != path).for_each(|p| push_child(p.as_path()));
        }
        if let Ok(dirs) = self.dirs.read() {
            dirs.iter().filter(|p| *p != path).for_each(|p| push_child(p.as_path()));
        }
        children.sort();
        children
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.write().map_err(|_| poisoned())?;
        if !dirs.iter().any(|d| d == path) {
            dirs.push(path.to_path_buf());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file("skills/a/SKILL.md", "# A")
            .with_file("skills/a/test.json", "[]")
            .with_file("skills/b/SKILL.md", "# B")
    }

    // ─── MemoryFileSystem ───────────────────────────────────────

    #[test]
    fn test_memory_read_write() {
        let fs = MemoryFileSystem::new();
        fs.write_text(Path::new("out/summary.json"), "{}").unwrap();
        assert_eq!(fs.read_text(Path::new("out/summary.json")).unwrap(), "{}");
        assert!(fs.is_file(Path::new("out/summary.json")));
        assert!(fs.is_dir(Path::new("out")));
    }

    #[test]
    fn test_memory_read_missing() {
        let fs = MemoryFileSystem::new();
        let err = fs.read_text(Path::new("nope.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_list_dir_children_only() {
        let fs = fixture();
        let children = fs.list_dir(Path::new("skills"));
        assert_eq!(
            children,
            vec![PathBuf::from("skills/a"), PathBuf::from("skills/b")]
        );
        assert!(fs.is_dir(Path::new("skills/a")));
        assert!(!fs.is_file(Path::new("skills/a")));
    }

    #[test]
    fn test_memory_mkdir_creates_empty_dir() {
        let fs = MemoryFileSystem::new();
        fs.mkdir(Path::new("results/ollama")).unwrap();
        assert!(fs.is_dir(Path::new("results")));
        assert!(fs.exists(Path::new("results/ollama")));
        assert!(fs.list_dir(Path::new("results/ollama")).is_empty());
    }

    // ─── LocalFileSystem ────────────────────────────────────────

    #[test]
    fn test_local_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem;
        let path = dir.path().join("nested/file.txt");
        fs.write_text(&path, "hello").unwrap();
        assert_eq!(fs.read_text(&path).unwrap(), "hello");
        assert!(fs.is_file(&path));
        assert!(fs.is_dir(&dir.path().join("nested")));
        assert_eq!(fs.list_dir(&dir.path().join("nested")), vec![path]);
    }

    #[test]
    fn test_local_list_missing_dir() {
        let fs = LocalFileSystem;
        assert!(fs.list_dir(Path::new("/definitely/not/here")).is_empty());
    }
}
