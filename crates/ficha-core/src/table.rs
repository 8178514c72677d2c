//! In-memory tables and the four-table set.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::RecordId,
  schema::{TableName, col},
  value::Value,
};

/// One row: a value per column, in column order.
pub type Row = Vec<Value>;

/// Column name → value, as submitted by a form section.
pub type Fields = BTreeMap<String, Value>;

// ─── Table ───────────────────────────────────────────────────────────────────

/// A named table with an ordered column list and ordered rows.
///
/// Columns are fixed at construction. Every row has exactly one cell per
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
  name:    TableName,
  columns: Vec<String>,
  rows:    Vec<Row>,
}

impl Table {
  /// An empty table with the canonical columns for `name`.
  pub fn empty(name: TableName) -> Self {
    Self {
      name,
      columns: name.columns().iter().map(|c| (*c).to_owned()).collect(),
      rows: Vec::new(),
    }
  }

  /// A table with columns as found in a file.
  ///
  /// Every canonical column must be present; order and extra columns are
  /// kept as given.
  pub fn with_columns(name: TableName, columns: Vec<String>) -> Result<Self> {
    if let Some(missing) = name
      .columns()
      .iter()
      .find(|c| !columns.iter().any(|have| have == *c))
    {
      return Err(Error::MissingColumn {
        table:  name,
        column: (*missing).to_owned(),
      });
    }
    Ok(Self { name, columns, rows: Vec::new() })
  }

  pub fn name(&self) -> TableName { self.name }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Row] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == column)
  }

  fn id_index(&self) -> usize {
    // `with_columns` and `empty` both guarantee the ID column.
    self.column_index(col::ID).unwrap_or(0)
  }

  /// Append a row, padding or truncating it to the column count.
  pub fn push_row(&mut self, mut row: Row) {
    row.resize(self.columns.len(), Value::Empty);
    self.rows.push(row);
  }

  /// Overwrite the row at `index`, padding or truncating it to the column
  /// count. Out-of-range indices are ignored.
  pub fn replace_row(&mut self, index: usize, mut row: Row) {
    row.resize(self.columns.len(), Value::Empty);
    if let Some(slot) = self.rows.get_mut(index) {
      *slot = row;
    }
  }

  /// Build a row for `id` from named fields. Unnamed columns stay empty.
  pub fn row_from_fields(&self, id: &RecordId, fields: &Fields) -> Result<Row> {
    let mut row = vec![Value::Empty; self.columns.len()];
    row[self.id_index()] = id.to_value();
    for (column, value) in fields {
      if column == col::ID {
        continue;
      }
      let idx = self.column_index(column).ok_or_else(|| Error::UnknownColumn {
        table:  self.name,
        column: column.clone(),
      })?;
      row[idx] = value.clone();
    }
    Ok(row)
  }

  pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
    let idx = self.column_index(column)?;
    self.rows.get(row).map(|r| &r[idx])
  }

  pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
    let idx = self.column_index(column).ok_or_else(|| Error::UnknownColumn {
      table:  self.name,
      column: column.to_owned(),
    })?;
    if let Some(r) = self.rows.get_mut(row) {
      r[idx] = value;
    }
    Ok(())
  }

  /// The identifier of a row, or `None` if its ID cell is blank.
  pub fn row_id(&self, row: &Row) -> Result<Option<RecordId>> {
    RecordId::from_value(&row[self.id_index()])
  }

  /// Identifiers of all rows with a non-blank ID, in row order.
  pub fn ids(&self) -> Result<Vec<RecordId>> {
    let mut out = Vec::with_capacity(self.rows.len());
    for row in &self.rows {
      if let Some(id) = self.row_id(row)? {
        out.push(id);
      }
    }
    Ok(out)
  }

  /// Index of the first row with identifier `id`.
  pub fn position(&self, id: &RecordId) -> Option<usize> {
    self
      .rows
      .iter()
      .position(|row| matches!(self.row_id(row), Ok(Some(ref have)) if have == id))
  }

  /// Remove every row with identifier `id`; returns how many were removed.
  pub fn remove_id(&mut self, id: &RecordId) -> usize {
    let idx = self.id_index();
    let before = self.rows.len();
    self
      .rows
      .retain(|row| !matches!(RecordId::from_value(&row[idx]), Ok(Some(ref have)) if have == id));
    before - self.rows.len()
  }

  /// Named cells of a row, in column order.
  pub fn fields_of(&self, row: &Row) -> Vec<(String, Value)> {
    self.columns.iter().cloned().zip(row.iter().cloned()).collect()
  }
}

// ─── TableSet ────────────────────────────────────────────────────────────────

/// The four tables of a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
  basic:       Table,
  personality: Table,
  role:        Table,
  notes:       Table,
}

impl Default for TableSet {
  fn default() -> Self { Self::empty() }
}

impl TableSet {
  /// Four empty tables with canonical columns.
  pub fn empty() -> Self {
    Self {
      basic:       Table::empty(TableName::Basic),
      personality: Table::empty(TableName::Personality),
      role:        Table::empty(TableName::Role),
      notes:       Table::empty(TableName::Notes),
    }
  }

  /// Assemble a set from loaded tables. All four must be present; a later
  /// table with the same name replaces an earlier one.
  pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Result<Self> {
    let mut found: BTreeMap<TableName, Table> =
      tables.into_iter().map(|t| (t.name, t)).collect();
    let mut take = |name: TableName| found.remove(&name).ok_or(Error::MissingTable(name));
    Ok(Self {
      basic:       take(TableName::Basic)?,
      personality: take(TableName::Personality)?,
      role:        take(TableName::Role)?,
      notes:       take(TableName::Notes)?,
    })
  }

  pub fn get(&self, name: TableName) -> &Table {
    match name {
      TableName::Basic => &self.basic,
      TableName::Personality => &self.personality,
      TableName::Role => &self.role,
      TableName::Notes => &self.notes,
    }
  }

  pub fn get_mut(&mut self, name: TableName) -> &mut Table {
    match name {
      TableName::Basic => &mut self.basic,
      TableName::Personality => &mut self.personality,
      TableName::Role => &mut self.role,
      TableName::Notes => &mut self.notes,
    }
  }

  pub fn replace(&mut self, table: Table) {
    let name = table.name;
    *self.get_mut(name) = table;
  }

  /// Tables in sheet order.
  pub fn iter(&self) -> impl Iterator<Item = &Table> {
    TableName::all().map(|name| self.get(name))
  }

  /// Every non-blank identifier in any table, orphans included.
  pub fn all_ids(&self) -> Result<HashSet<RecordId>> {
    let mut out = HashSet::new();
    for table in self.iter() {
      out.extend(table.ids()?);
    }
    Ok(out)
  }
}
