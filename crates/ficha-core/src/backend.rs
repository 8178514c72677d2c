//! The storage abstraction.
//!
//! Implemented by persistence crates (e.g. `ficha-store-xlsx`). The session
//! layer depends on this trait, not on any concrete file format.

use std::cell::RefCell;

use thiserror::Error;

use crate::table::TableSet;

/// Loads and saves the complete four-table set.
///
/// `save` replaces whatever was stored before; there is no partial write.
pub trait Backend {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read every table. Creates empty storage with the canonical schema when
  /// none exists yet.
  fn load(&self) -> Result<TableSet, Self::Error>;

  /// Overwrite storage with `tables`.
  fn save(&self, tables: &TableSet) -> Result<(), Self::Error>;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("writes are disabled on this backend")]
  ReadOnly,
}

/// Keeps the tables in memory — useful for testing.
#[derive(Debug, Default)]
pub struct MemoryBackend {
  tables:    RefCell<Option<TableSet>>,
  read_only: bool,
}

impl MemoryBackend {
  pub fn new() -> Self { Self::default() }

  /// A backend pre-populated with `tables`.
  pub fn with_tables(tables: TableSet) -> Self {
    Self { tables: RefCell::new(Some(tables)), read_only: false }
  }

  /// Reject every subsequent `save`.
  pub fn set_read_only(&mut self, read_only: bool) { self.read_only = read_only; }

  /// The last saved tables, if any.
  pub fn snapshot(&self) -> Option<TableSet> { self.tables.borrow().clone() }
}

impl Backend for MemoryBackend {
  type Error = MemoryError;

  fn load(&self) -> Result<TableSet, MemoryError> {
    Ok(
      self
        .tables
        .borrow_mut()
        .get_or_insert_with(TableSet::empty)
        .clone(),
    )
  }

  fn save(&self, tables: &TableSet) -> Result<(), MemoryError> {
    if self.read_only {
      return Err(MemoryError::ReadOnly);
    }
    *self.tables.borrow_mut() = Some(tables.clone());
    Ok(())
  }
}
