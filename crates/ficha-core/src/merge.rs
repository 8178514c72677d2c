//! The merged view: every table left-joined onto Basic by identifier, and the
//! inverse that splits an edited view back into tables.
//!
//! The view is derived and never persisted. `Foto` is kept out of it; it is a
//! back-reference owned by the Basic table and is re-attached by identifier
//! when an edited view is reconciled.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::{Allocator, RecordId},
  schema::{TableName, col},
  table::{Fields, Row, Table, TableSet},
  value::Value,
};

// ─── View ────────────────────────────────────────────────────────────────────

/// A flat, editable table: one row per Basic row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedView {
  pub columns: Vec<String>,
  pub rows:    Vec<Row>,
}

impl MergedView {
  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == column)
  }

  pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
    let idx = self.column_index(column)?;
    self.rows.get(row).and_then(|r| r.get(idx))
  }

  /// Set a cell; returns `false` if the row or column does not exist.
  pub fn set(&mut self, row: usize, column: &str, value: Value) -> bool {
    let Some(idx) = self.column_index(column) else { return false };
    match self.rows.get_mut(row).and_then(|r| r.get_mut(idx)) {
      Some(cell) => {
        *cell = value;
        true
      }
      None => false,
    }
  }

  /// Append a row built from named cells; other cells (the identifier
  /// included, unless given) are blank. Unknown column names are ignored.
  pub fn push_row(&mut self, fields: &Fields) -> usize {
    let row = self
      .columns
      .iter()
      .map(|c| fields.get(c).cloned().unwrap_or_default())
      .collect();
    self.rows.push(row);
    self.rows.len() - 1
  }

  /// Remove the row whose identifier is `id`; returns whether one was found.
  pub fn remove_id(&mut self, id: &RecordId) -> bool {
    let Some(idx) = self.column_index(col::ID) else { return false };
    let before = self.rows.len();
    self.rows.retain(|row| {
      !matches!(row.get(idx).map(RecordId::from_value), Some(Ok(Some(ref have))) if have == id)
    });
    self.rows.len() != before
  }
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// Left-join every table onto Basic by identifier.
///
/// Columns are concatenated in table order with `ID` appearing once and
/// `Foto` omitted. For tables holding several rows with one identifier the
/// first row wins. Rows whose identifier has no Basic row are dropped and
/// logged.
pub fn build_merged_view(tables: &TableSet) -> Result<MergedView> {
  let basic = tables.get(TableName::Basic);

  let mut columns: Vec<String> = Vec::new();
  let mut sources: Vec<(TableName, usize)> = Vec::new();
  for table in tables.iter() {
    for (idx, column) in table.columns().iter().enumerate() {
      if table.name() == TableName::Basic && column == col::PHOTO {
        continue;
      }
      if columns.contains(column) {
        if column != col::ID {
          tracing::warn!(
            table = %table.name(),
            column = %column,
            "duplicate column left out of the merged view"
          );
        }
        continue;
      }
      columns.push(column.clone());
      sources.push((table.name(), idx));
    }
  }

  let basic_ids: HashSet<RecordId> = basic.ids()?.into_iter().collect();

  let mut lookup: HashMap<TableName, HashMap<RecordId, &Row>> = HashMap::new();
  for table in tables.iter().filter(|t| t.name() != TableName::Basic) {
    let mut by_id = HashMap::new();
    for row in table.rows() {
      let Some(id) = table.row_id(row)? else { continue };
      if !basic_ids.contains(&id) {
        tracing::warn!(%id, table = %table.name(), "orphan row ignored");
        continue;
      }
      by_id.entry(id).or_insert(row);
    }
    lookup.insert(table.name(), by_id);
  }

  let mut rows = Vec::with_capacity(basic.len());
  for basic_row in basic.rows() {
    let id = basic.row_id(basic_row)?;
    let row = sources
      .iter()
      .map(|(table, idx)| {
        if *table == TableName::Basic {
          return basic_row[*idx].clone();
        }
        id.as_ref()
          .and_then(|id| lookup.get(table).and_then(|m| m.get(id)))
          .map_or(Value::Empty, |r| r[*idx].clone())
      })
      .collect();
    rows.push(row);
  }

  Ok(MergedView { columns, rows })
}

// ─── Reconcile ───────────────────────────────────────────────────────────────

/// Split an edited merged view back into the four tables.
///
/// 1. Rows with a blank identifier get a fresh one from `alloc`.
/// 2. `Foto` is restored from `original` by identifier.
/// 3. Each table is replaced wholesale by the view projected onto its
///    columns. Personality, Role and Notes skip rows whose projected cells
///    are all blank unless the table already had a row for that
///    identifier. Orphan rows, which the view never showed, are kept.
///
/// Fails with [`Error::SchemaMismatch`] if the view lacks a column some table
/// needs, and with [`Error::DuplicateId`] if two rows share an identifier.
pub fn reconcile(
  edited: &MergedView,
  original: &TableSet,
  alloc: &mut dyn Allocator,
) -> Result<TableSet> {
  // Column mapping first: nothing is allocated for a view that cannot be
  // written back.
  let mut plans: Vec<(TableName, Vec<Option<usize>>)> = Vec::new();
  for table in original.iter() {
    let mut mapping = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
      if table.name() == TableName::Basic && column == col::PHOTO {
        mapping.push(None);
        continue;
      }
      let idx = edited.column_index(column).ok_or_else(|| Error::SchemaMismatch {
        table:  table.name(),
        column: column.clone(),
      })?;
      mapping.push(Some(idx));
    }
    plans.push((table.name(), mapping));
  }

  let id_idx = edited.column_index(col::ID).ok_or_else(|| Error::SchemaMismatch {
    table:  TableName::Basic,
    column: col::ID.to_owned(),
  })?;

  let mut rows: Vec<Row> = edited
    .rows
    .iter()
    .map(|r| {
      let mut r = r.clone();
      r.resize(edited.columns.len(), Value::Empty);
      r
    })
    .collect();

  let mut seen = HashSet::new();
  for row in &rows {
    if let Some(id) = RecordId::from_value(&row[id_idx])?
      && !seen.insert(id.clone())
    {
      return Err(Error::DuplicateId(id));
    }
  }

  let mut existing = original.all_ids()?;
  existing.extend(seen);

  let mut ids = Vec::with_capacity(rows.len());
  for row in &mut rows {
    let id = match RecordId::from_value(&row[id_idx])? {
      Some(id) => id,
      None => {
        let id = alloc.allocate(&existing)?;
        existing.insert(id.clone());
        row[id_idx] = id.to_value();
        tracing::info!(%id, "identifier assigned to new row");
        id
      }
    };
    ids.push(id);
  }

  let basic = original.get(TableName::Basic);
  let original_basic_ids: HashSet<RecordId> = basic.ids()?.into_iter().collect();
  let mut photos: HashMap<RecordId, Value> = HashMap::new();
  if let Some(photo_idx) = basic.column_index(col::PHOTO) {
    for row in basic.rows() {
      if let Some(id) = basic.row_id(row)? {
        photos.entry(id).or_insert_with(|| row[photo_idx].clone());
      }
    }
  }
  let view_ids: HashSet<&RecordId> = ids.iter().collect();

  let mut out = TableSet::empty();
  for (name, mapping) in plans {
    let source = original.get(name);
    let mut table = Table::with_columns(name, source.columns().to_vec())?;
    let had_row: HashSet<RecordId> = source.ids()?.into_iter().collect();
    let table_id_idx = source.column_index(col::ID);

    for (row, id) in rows.iter().zip(&ids) {
      let projected: Row = mapping
        .iter()
        .map(|m| match m {
          Some(i) => row[*i].clone(),
          None => photos.get(id).cloned().unwrap_or_default(),
        })
        .collect();

      let all_blank = projected
        .iter()
        .enumerate()
        .all(|(i, v)| Some(i) == table_id_idx || v.is_blank());
      if name != TableName::Basic && all_blank && !had_row.contains(id) {
        continue;
      }
      table.push_row(projected);
    }

    if name != TableName::Basic {
      for row in source.rows() {
        if let Some(id) = source.row_id(row)?
          && !original_basic_ids.contains(&id)
          && !view_ids.contains(&id)
        {
          table.push_row(row.clone());
        }
      }
    }

    out.replace(table);
  }

  Ok(out)
}
