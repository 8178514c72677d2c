//! Photo files stored beside the workbook, one per record.

use std::{
  ffi::OsStr,
  fs,
  path::{Path, PathBuf},
};

use ficha_core::id::RecordId;
use sha2::{Digest as _, Sha256};

use crate::{Error, Result};

/// Accepted image extensions, lower-case.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A photo copied into the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
  /// `<dir>/<id>.<ext>`; this is what goes in the `Foto` column.
  pub path:         PathBuf,
  /// SHA-256 hex digest of the file contents.
  pub content_hash: String,
}

/// The directory holding `<identifier>.<extension>` image files.
#[derive(Debug, Clone)]
pub struct PhotoLibrary {
  dir: PathBuf,
}

impl PhotoLibrary {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &Path { &self.dir }

  fn path_for(&self, id: &RecordId, ext: &str) -> PathBuf {
    self.dir.join(format!("{id}.{ext}"))
  }

  /// Copy `source` into the library as the photo of `id`, replacing any
  /// earlier photo of that record.
  pub fn store(&self, id: &RecordId, source: &Path) -> Result<StoredPhoto> {
    let ext = source
      .extension()
      .and_then(OsStr::to_str)
      .map(str::to_lowercase)
      .filter(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()))
      .ok_or_else(|| Error::UnsupportedPhoto(source.to_path_buf()))?;

    let bytes = fs::read(source).map_err(Error::io(source))?;
    fs::create_dir_all(&self.dir).map_err(Error::io(&self.dir))?;

    for other in PHOTO_EXTENSIONS.iter().filter(|e| **e != ext) {
      let stale = self.path_for(id, other);
      if stale.exists() {
        fs::remove_file(&stale).map_err(Error::io(&stale))?;
      }
    }

    let path = self.path_for(id, &ext);
    fs::write(&path, &bytes).map_err(Error::io(&path))?;
    let content_hash = hex::encode(Sha256::digest(&bytes));

    tracing::info!(%id, path = ?path, hash = %content_hash, "photo stored");
    Ok(StoredPhoto { path, content_hash })
  }

  /// The stored photo of `id`, if any.
  pub fn find(&self, id: &RecordId) -> Option<PathBuf> {
    PHOTO_EXTENSIONS
      .iter()
      .map(|ext| self.path_for(id, ext))
      .find(|p| p.exists())
  }

  /// Delete every stored photo of `id`; returns how many files were removed.
  pub fn remove(&self, id: &RecordId) -> Result<usize> {
    let mut removed = 0;
    for ext in PHOTO_EXTENSIONS {
      let path = self.path_for(id, ext);
      if path.exists() {
        fs::remove_file(&path).map_err(Error::io(&path))?;
        removed += 1;
      }
    }
    Ok(removed)
  }
}
