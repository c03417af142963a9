#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dirwatch::fs::mock::MockFileSystem;
use tempfile::TempDir;

/// A temporary directory tree on the real filesystem.
///
/// Paths are returned in canonical form (on macOS the temp dir lives behind
/// the `/var` → `/private/var` symlink), so they compare equal to what
/// callbacks receive.
pub struct TempTree {
    // Deleted when the tree is dropped.
    dir: TempDir,
    root: PathBuf,
}

impl TempTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().canonicalize().expect("canonicalize temp dir");
        Self { dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Create a directory (and its parents) below the root.
    pub fn dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// Write a file below the root, creating parent directories.
    pub fn file(&self, relative: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn remove_dir(&self, relative: impl AsRef<Path>) {
        fs::remove_dir_all(self.path(relative)).expect("remove dir");
    }
}

impl Default for TempTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an in-memory directory tree.
pub struct MockTreeBuilder {
    fs: MockFileSystem,
}

impl MockTreeBuilder {
    pub fn new() -> Self {
        Self {
            fs: MockFileSystem::new(),
        }
    }

    pub fn dir(self, path: &str) -> Self {
        self.fs.add_dir(path);
        self
    }

    pub fn file(self, path: &str) -> Self {
        self.fs.add_file(path);
        self
    }

    pub fn symlink(self, path: &str, target: &str) -> Self {
        self.fs.add_symlink(path, target);
        self
    }

    pub fn unreadable(self, path: &str) -> Self {
        self.fs.set_unreadable(path);
        self
    }

    pub fn build(self) -> MockFileSystem {
        self.fs
    }
}

impl Default for MockTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
