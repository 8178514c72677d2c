//! [`XlsxBackend`] — the workbook implementation of [`Backend`].

use std::{
  fs,
  path::{Path, PathBuf},
};

use calamine::{Reader as _, Xlsx, open_workbook};
use ficha_core::{
  backend::Backend,
  schema::TableName,
  table::{Table, TableSet},
  value::Value,
};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook};

use crate::{
  Error, Result,
  encode::{decode_cell, decode_header},
};

/// A character store backed by a single `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxBackend {
  path: PathBuf,
}

impl XlsxBackend {
  /// Open (or create) the workbook at `path`.
  ///
  /// A missing workbook is created with four empty sheets carrying the
  /// canonical headers.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let backend = Self { path: path.as_ref().to_path_buf() };
    backend.ensure_exists()?;
    Ok(backend)
  }

  pub fn path(&self) -> &Path { &self.path }

  fn ensure_exists(&self) -> Result<()> {
    if self.path.exists() {
      return Ok(());
    }
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(Error::io(parent))?;
    }
    tracing::info!(path = ?self.path, "creating empty workbook");
    self.write(&TableSet::empty())
  }

  fn read(&self) -> Result<TableSet> {
    let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|source| Error::Read {
      path: self.path.clone(),
      source,
    })?;

    let mut tables = Vec::new();
    for sheet in workbook.sheet_names() {
      let Some(name) = TableName::from_sheet_name(&sheet) else {
        tracing::warn!(sheet = %sheet, "ignoring unknown sheet");
        continue;
      };
      let range = workbook.worksheet_range(&sheet).map_err(|source| Error::Read {
        path: self.path.clone(),
        source,
      })?;

      let mut rows = range.rows();
      let columns: Vec<String> = rows
        .next()
        .map(|header| {
          header
            .iter()
            .enumerate()
            .map(|(idx, cell)| decode_header(cell, idx))
            .collect()
        })
        .unwrap_or_default();

      let mut table = Table::with_columns(name, columns)?;
      for row in rows {
        let row: Vec<Value> = row.iter().map(decode_cell).collect();
        if row.iter().all(|v| *v == Value::Empty) {
          continue;
        }
        table.push_row(row);
      }
      tables.push(table);
    }

    let tables = TableSet::from_tables(tables)?;
    tracing::debug!(
      path = ?self.path,
      records = tables.get(TableName::Basic).len(),
      "workbook loaded"
    );
    Ok(tables)
  }

  fn write(&self, tables: &TableSet) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in tables.iter() {
      let sheet_name = table.name().sheet_name();
      let too_large = || Error::TooLarge { sheet: sheet_name };
      let sheet = workbook.add_worksheet();
      sheet.set_name(sheet_name)?;

      for (c, column) in table.columns().iter().enumerate() {
        let c = ColNum::try_from(c).map_err(|_| too_large())?;
        sheet.write_string_with_format(0, c, column, &header_format)?;
      }

      for (r, row) in table.rows().iter().enumerate() {
        let r = RowNum::try_from(r + 1).map_err(|_| too_large())?;
        for (c, value) in row.iter().enumerate() {
          let c = ColNum::try_from(c).map_err(|_| too_large())?;
          match value {
            Value::Empty => {}
            Value::Number(n) => {
              sheet.write_number(r, c, *n)?;
            }
            Value::Text(s) if s.is_empty() => {}
            Value::Text(s) => {
              sheet.write_string(r, c, s)?;
            }
          }
        }
      }
    }

    let buffer = workbook.save_to_buffer()?;

    // Write beside the target and rename over it, so a failed write never
    // leaves a half-written workbook behind.
    let mut tmp = self.path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, &buffer).map_err(Error::io(&tmp))?;
    fs::rename(&tmp, &self.path).map_err(Error::io(&self.path))?;

    tracing::debug!(path = ?self.path, bytes = buffer.len(), "workbook saved");
    Ok(())
  }
}

impl Backend for XlsxBackend {
  type Error = Error;

  fn load(&self) -> Result<TableSet> {
    self.ensure_exists()?;
    self.read()
  }

  fn save(&self, tables: &TableSet) -> Result<()> { self.write(tables) }
}
