//! Integration tests for `XlsxBackend` and `PhotoLibrary` against a
//! temporary directory.

use std::fs;

use calamine::{Reader as _, Xlsx, open_workbook};
use ficha_core::{
  backend::Backend,
  id::{RecordId, SequentialAllocator},
  schema::{TableName, col},
  section::{NotesFields, Section},
  session::Session,
  table::{Table, TableSet},
  value::Value,
};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

use crate::{Error, PhotoLibrary, XlsxBackend};

fn workspace() -> (TempDir, XlsxBackend) {
  let dir = tempfile::tempdir().expect("temp dir");
  let backend = XlsxBackend::open(dir.path().join("datos_personajes.xlsx")).expect("open");
  (dir, backend)
}

fn sample() -> TableSet {
  let mut tables = TableSet::empty();
  let basic = tables.get_mut(TableName::Basic);
  let mut ana = vec![Value::Number(1.0), "Ana".into(), "Anita".into(), Value::Number(25.0)];
  ana.resize(basic.columns().len(), Value::Empty);
  let photo = basic.column_index(col::PHOTO).unwrap();
  ana[photo] = "images/1.png".into();
  basic.push_row(ana);
  basic.push_row(vec![Value::Number(2.0), "Beto".into(), Value::Empty, Value::Number(1.75)]);

  tables
    .get_mut(TableName::Personality)
    .push_row(vec![Value::Number(1.0), "hola".into(), "valiente".into()]);
  tables
    .get_mut(TableName::Notes)
    .push_row(vec![Value::Number(2.0), "Línea con acentos: ¿qué?".into()]);
  tables
}

/// Write a workbook by hand with the given sheets and header rows.
fn write_raw(path: &std::path::Path, sheets: &[(&str, &[&str])]) {
  let mut workbook = Workbook::new();
  for (name, headers) in sheets {
    let sheet = workbook.add_worksheet();
    sheet.set_name(*name).unwrap();
    for (c, h) in headers.iter().enumerate() {
      sheet.write_string(0, c as u16, *h).unwrap();
    }
  }
  workbook.save(path).unwrap();
}

// ─── Workbook ────────────────────────────────────────────────────────────────

#[test]
fn open_creates_workbook_with_canonical_sheets() {
  let (_dir, backend) = workspace();
  assert!(backend.path().exists());

  let raw: Xlsx<_> = open_workbook(backend.path()).unwrap();
  assert_eq!(raw.sheet_names(), vec!["Básico", "Personalidad", "Rol", "Notas"]);

  let tables = backend.load().unwrap();
  assert_eq!(tables, TableSet::empty());
}

#[test]
fn load_creates_missing_workbook() {
  let (_dir, backend) = workspace();
  fs::remove_file(backend.path()).unwrap();

  let tables = backend.load().unwrap();
  assert!(tables.iter().all(Table::is_empty));
  assert!(backend.path().exists());
}

#[test]
fn save_then_load_round_trips() {
  let (_dir, backend) = workspace();
  let tables = sample();
  backend.save(&tables).unwrap();

  let loaded = backend.load().unwrap();
  assert_eq!(loaded, tables);
}

#[test]
fn save_leaves_no_temporary_file() {
  let (dir, backend) = workspace();
  backend.save(&sample()).unwrap();

  let names: Vec<_> = fs::read_dir(dir.path())
    .unwrap()
    .map(|e| e.unwrap().file_name().into_string().unwrap())
    .collect();
  assert_eq!(names, vec!["datos_personajes.xlsx".to_owned()]);
}

#[test]
fn missing_sheet_is_a_configuration_error() {
  let (_dir, backend) = workspace();
  write_raw(backend.path(), &[
    ("Básico", TableName::Basic.columns()),
    ("Personalidad", TableName::Personality.columns()),
    ("Notas", TableName::Notes.columns()),
  ]);

  let err = backend.load().unwrap_err();
  assert!(matches!(err, Error::Core(ficha_core::Error::MissingTable(TableName::Role))));
}

#[test]
fn missing_column_is_a_configuration_error() {
  let (_dir, backend) = workspace();
  write_raw(backend.path(), &[
    ("Básico", TableName::Basic.columns()),
    ("Personalidad", TableName::Personality.columns()),
    ("Rol", TableName::Role.columns()),
    ("Notas", &["ID"][..]),
  ]);

  let err = backend.load().unwrap_err();
  assert!(matches!(
    err,
    Error::Core(ficha_core::Error::MissingColumn { table: TableName::Notes, .. })
  ));
}

#[test]
fn column_order_and_extra_columns_survive() {
  let (_dir, backend) = workspace();
  write_raw(backend.path(), &[
    ("Básico", TableName::Basic.columns()),
    ("Personalidad", TableName::Personality.columns()),
    ("Rol", TableName::Role.columns()),
    ("Notas", &["Notas adicionales", "Autor", "ID"][..]),
    ("Hoja1", &["cualquier cosa"][..]),
  ]);

  let loaded = backend.load().unwrap();
  assert_eq!(loaded.get(TableName::Notes).columns(), ["Notas adicionales", "Autor", "ID"]);

  backend.save(&loaded).unwrap();
  let again = backend.load().unwrap();
  assert_eq!(again, loaded);
}

#[test]
fn corrupt_workbook_is_reported() {
  let (_dir, backend) = workspace();
  fs::write(backend.path(), b"not a spreadsheet").unwrap();

  assert!(matches!(backend.load(), Err(Error::Read { .. })));
}

#[test]
fn session_changes_are_visible_to_a_fresh_backend() {
  let (_dir, backend) = workspace();
  let path = backend.path().to_path_buf();
  let mut session = Session::open(backend, Box::new(SequentialAllocator::default())).unwrap();

  let id = session.new_record().unwrap().id.unwrap();
  session
    .apply(Some(&id), Section::Notes(NotesFields { notes: "guardado".into() }))
    .unwrap();

  let reopened = XlsxBackend::open(&path).unwrap().load().unwrap();
  let notes = reopened.get(TableName::Notes);
  assert_eq!(notes.ids().unwrap(), vec![RecordId::Seq(1)]);
  assert_eq!(notes.get(0, col::NOTES), Some(&Value::from("guardado")));
}

#[test]
fn repeated_basic_identifier_refuses_to_open() {
  let (_dir, backend) = workspace();
  let mut tables = TableSet::empty();
  let basic = tables.get_mut(TableName::Basic);
  basic.push_row(vec![Value::Number(1.0), "Ana".into()]);
  basic.push_row(vec![Value::Number(1.0), "Otra".into()]);
  backend.save(&tables).unwrap();

  let result = Session::open(backend, Box::new(SequentialAllocator::default()));
  assert!(matches!(result, Err(ficha_core::Error::DuplicateId(RecordId::Seq(1)))));
}

// ─── Photos ──────────────────────────────────────────────────────────────────

#[test]
fn photo_is_stored_under_the_record_identifier() {
  let dir = tempfile::tempdir().unwrap();
  let source = dir.path().join("retrato.PNG");
  fs::write(&source, b"png bytes").unwrap();

  let library = PhotoLibrary::new(dir.path().join("images"));
  let stored = library.store(&RecordId::Seq(7), &source).unwrap();

  assert_eq!(stored.path, dir.path().join("images").join("7.png"));
  assert_eq!(fs::read(&stored.path).unwrap(), b"png bytes");
  assert_eq!(stored.content_hash.len(), 64);
  assert_eq!(library.find(&RecordId::Seq(7)), Some(stored.path));
}

#[test]
fn storing_again_replaces_the_previous_photo() {
  let dir = tempfile::tempdir().unwrap();
  let library = PhotoLibrary::new(dir.path().join("images"));
  let id = RecordId::Seq(1);

  let first = dir.path().join("a.jpg");
  fs::write(&first, b"first").unwrap();
  library.store(&id, &first).unwrap();

  let second = dir.path().join("b.png");
  fs::write(&second, b"second").unwrap();
  let stored = library.store(&id, &second).unwrap();

  assert!(!dir.path().join("images").join("1.jpg").exists());
  assert_eq!(fs::read(stored.path).unwrap(), b"second");
}

#[test]
fn unsupported_photo_types_are_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let source = dir.path().join("retrato.gif");
  fs::write(&source, b"gif").unwrap();

  let library = PhotoLibrary::new(dir.path().join("images"));
  assert!(matches!(
    library.store(&RecordId::Seq(1), &source),
    Err(Error::UnsupportedPhoto(_))
  ));
}

#[test]
fn remove_deletes_every_photo_of_a_record() {
  let dir = tempfile::tempdir().unwrap();
  let library = PhotoLibrary::new(dir.path().join("images"));
  let source = dir.path().join("x.jpeg");
  fs::write(&source, b"x").unwrap();
  library.store(&RecordId::Seq(3), &source).unwrap();

  assert_eq!(library.remove(&RecordId::Seq(3)).unwrap(), 1);
  assert_eq!(library.find(&RecordId::Seq(3)), None);
}
