//! Error types for `ficha-core`.

use thiserror::Error;

use crate::{
  id::{IdPolicy, RecordId},
  schema::TableName,
};

#[derive(Debug, Error)]
pub enum Error {
  // ── Schema ────────────────────────────────────────────────────────────

  #[error("table {0} is missing from the workbook")]
  MissingTable(TableName),

  #[error("table {table} is missing column {column:?}")]
  MissingColumn { table: TableName, column: String },

  #[error("edited view has no column {column:?}, required by table {table}")]
  SchemaMismatch { table: TableName, column: String },

  #[error("table {table} has no column {column:?}")]
  UnknownColumn { table: TableName, column: String },

  #[error("identifier {0} appears more than once in the edited view")]
  DuplicateId(RecordId),

  // ── Identity ──────────────────────────────────────────────────────────

  #[error("invalid record identifier: {0:?}")]
  InvalidId(String),

  #[error("identifier {id} does not follow the {expected} identifier policy")]
  PolicyMismatch { id: RecordId, expected: IdPolicy },

  #[error("could not allocate a unique identifier after {0} attempts")]
  IdentityExhausted(usize),

  // ── Records ───────────────────────────────────────────────────────────

  #[error("record {0} not found")]
  RecordNotFound(RecordId),

  #[error("no record selected for the {0} section")]
  NoRecordSelected(TableName),

  #[error("invalid value for {field}: {reason}")]
  Validation { field: &'static str, reason: String },

  // ── Storage ───────────────────────────────────────────────────────────

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
