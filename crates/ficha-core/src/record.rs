//! [`RecordStore`] — the four in-memory tables and the operations that
//! create, update and delete records across them.
//!
//! Nothing here persists. Callers hand the resulting [`TableSet`] to a
//! [`Backend`](crate::backend::Backend).

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{
  Error, Result,
  id::{Allocator, RecordId},
  schema::{TableName, col},
  table::{Fields, Table, TableSet},
  value::Value,
};

/// Every row belonging to one identifier, grouped by table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
  pub id:   RecordId,
  /// Named cells of each row found, in column order. Tables with no row for
  /// the identifier are absent.
  pub rows: BTreeMap<TableName, Vec<Vec<(String, Value)>>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
  tables: TableSet,
}

impl RecordStore {
  pub fn new(tables: TableSet) -> Self { Self { tables } }

  pub fn tables(&self) -> &TableSet { &self.tables }

  pub fn table(&self, name: TableName) -> &Table { self.tables.get(name) }

  pub fn into_tables(self) -> TableSet { self.tables }

  /// Identifiers of the Basic table, in row order.
  pub fn ids(&self) -> Result<Vec<RecordId>> { self.tables.get(TableName::Basic).ids() }

  /// Identifiers present anywhere, including orphan rows. New identifiers
  /// are allocated against this set so an orphan is never adopted by a new
  /// record.
  pub fn known_ids(&self) -> Result<HashSet<RecordId>> { self.tables.all_ids() }

  pub fn contains(&self, id: &RecordId) -> bool {
    self.tables.get(TableName::Basic).position(id).is_some()
  }

  /// Allocate an identifier and append a Basic row with `fields` (blank
  /// where not supplied). Other tables are untouched.
  pub fn create_basic(
    &mut self,
    alloc: &mut dyn Allocator,
    fields: &Fields,
  ) -> Result<RecordId> {
    let existing = self.known_ids()?;
    let id = alloc.allocate(&existing)?;
    let basic = self.tables.get_mut(TableName::Basic);
    let row = basic.row_from_fields(&id, fields)?;
    basic.push_row(row);
    tracing::info!(%id, "record created");
    Ok(id)
  }

  /// Write one section of a record.
  ///
  /// Personality, Role and Notes use delete-then-insert: every existing row
  /// for `id` is removed and the new row appended at the end, so row order
  /// in those tables follows edit recency.
  ///
  /// Basic is updated in place when the row exists; columns not in `fields`
  /// are cleared, except `Foto`, which keeps its value unless supplied. A
  /// missing Basic row is appended.
  pub fn upsert_section(
    &mut self,
    table: TableName,
    id: &RecordId,
    fields: &Fields,
  ) -> Result<()> {
    let target = self.tables.get_mut(table);
    let mut row = target.row_from_fields(id, fields)?;

    if table == TableName::Basic
      && let Some(pos) = target.position(id)
    {
      if !fields.contains_key(col::PHOTO)
        && let Some(photo_idx) = target.column_index(col::PHOTO)
      {
        row[photo_idx] = target.rows()[pos][photo_idx].clone();
      }
      target.replace_row(pos, row);
    } else {
      if table != TableName::Basic {
        target.remove_id(id);
      }
      target.push_row(row);
    }

    tracing::info!(%id, %table, "section saved");
    Ok(())
  }

  /// Remove every row with `id` from every table, orphans included;
  /// returns the number of rows removed.
  pub fn delete_record(&mut self, id: &RecordId) -> Result<usize> {
    let removed: usize = TableName::all()
      .map(|name| self.tables.get_mut(name).remove_id(id))
      .sum();
    if removed == 0 {
      return Err(Error::RecordNotFound(id.clone()));
    }
    tracing::info!(%id, removed, "record deleted");
    Ok(removed)
  }

  /// Point the Basic row's photo at `path`.
  pub fn set_photo_path(&mut self, id: &RecordId, path: &str) -> Result<()> {
    let basic = self.tables.get_mut(TableName::Basic);
    let pos = basic.position(id).ok_or_else(|| Error::RecordNotFound(id.clone()))?;
    basic.set(pos, col::PHOTO, Value::from(path))
  }

  /// All rows of a record, or `None` if Basic has no such identifier.
  pub fn record(&self, id: &RecordId) -> Result<Option<Record>> {
    if !self.contains(id) {
      return Ok(None);
    }
    let mut rows = BTreeMap::new();
    for table in self.tables.iter() {
      let mut found = Vec::new();
      for row in table.rows() {
        if table.row_id(row)?.as_ref() == Some(id) {
          found.push(table.fields_of(row));
        }
      }
      if !found.is_empty() {
        rows.insert(table.name(), found);
      }
    }
    Ok(Some(Record { id: id.clone(), rows }))
  }
}
