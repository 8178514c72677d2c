//! Plain-text output for records and the merged view.

use std::io::{self, Write};

use ficha_core::{
  merge::MergedView,
  record::{Record, RecordStore},
  schema::{TableName, col},
  value::Value,
};

/// One line per character: identifier, name and nickname.
pub fn list(out: &mut impl Write, store: &RecordStore) -> anyhow::Result<()> {
  let basic = store.table(TableName::Basic);
  if basic.is_empty() {
    writeln!(out, "no characters yet")?;
    return Ok(());
  }
  for (i, row) in basic.rows().iter().enumerate() {
    let id = basic.row_id(row)?.map(|id| id.to_string()).unwrap_or_default();
    let name = basic.get(i, col::NAME).unwrap_or(&Value::Empty);
    let nickname = basic.get(i, col::NICKNAME).unwrap_or(&Value::Empty);
    writeln!(out, "{id}\t{name}\t{nickname}")?;
  }
  Ok(())
}

/// Every row of a record, grouped by sheet.
pub fn record(out: &mut impl Write, record: &Record) -> io::Result<()> {
  writeln!(out, "ID {}", record.id)?;
  for (table, rows) in &record.rows {
    for row in rows {
      writeln!(out, "[{}]", table.sheet_name())?;
      for (column, value) in row {
        if column != col::ID {
          writeln!(out, "  {column}: {value}")?;
        }
      }
    }
  }
  Ok(())
}

/// The merged view as tab-separated text with a header line.
pub fn view(out: &mut impl Write, view: &MergedView) -> io::Result<()> {
  writeln!(out, "{}", view.columns.join("\t"))?;
  for row in &view.rows {
    let cells: Vec<String> = row.iter().map(Value::to_string).collect();
    writeln!(out, "{}", cells.join("\t"))?;
  }
  Ok(())
}
