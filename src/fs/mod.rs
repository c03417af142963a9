// src/fs/mod.rs

//! Filesystem access used by registration and dispatch.
//!
//! The core only needs three operations: resolve a directory to its canonical
//! identity, test whether a path is a directory, and list a directory's
//! immediate children.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// `true` if `path` exists and is (or points to) a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Absolute, symlink-free form of `path`. Fails if it does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return the immediate entries of a directory, as full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry.with_context(|| format!("reading entry of {:?}", path))?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
