//! [`Session`] — one user's working state, threaded explicitly through every
//! interaction.
//!
//! Every mutating call runs a full cycle: mutate a copy of the tables, save
//! the copy, then reload from storage. If any step fails the previous state
//! is kept and the error returned, so the session stays usable.

use std::collections::HashSet;

use crate::{
  Error, Result,
  backend::Backend,
  id::{Allocator, IdPolicy, RecordId},
  merge::{self, MergedView},
  record::RecordStore,
  schema::TableName,
  section::Section,
  table::{Fields, TableSet},
};

/// The answer to a form submission or button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
  pub success: bool,
  pub message: String,
  /// The record the interaction touched, when there is one.
  pub id:      Option<RecordId>,
}

impl Outcome {
  fn ok(id: Option<RecordId>, message: impl Into<String>) -> Self {
    Self { success: true, message: message.into(), id }
  }
}

pub struct Session<B: Backend> {
  backend: B,
  store:   RecordStore,
  alloc:   Box<dyn Allocator>,
}

impl<B: Backend> Session<B> {
  /// Load every table from `backend`.
  ///
  /// Fails if the stored identifiers do not follow `alloc`'s policy.
  pub fn open(backend: B, alloc: Box<dyn Allocator>) -> Result<Self> {
    let store = load(&backend, alloc.policy())?;
    tracing::debug!(
      records = store.tables().get(TableName::Basic).len(),
      policy = %alloc.policy(),
      "session opened"
    );
    Ok(Self { backend, store, alloc })
  }

  pub fn backend(&self) -> &B { &self.backend }

  pub fn backend_mut(&mut self) -> &mut B { &mut self.backend }

  pub fn store(&self) -> &RecordStore { &self.store }

  pub fn policy(&self) -> IdPolicy { self.alloc.policy() }

  /// Re-read every table from storage.
  pub fn reload(&mut self) -> Result<()> {
    self.store = load(&self.backend, self.alloc.policy())?;
    Ok(())
  }

  /// Save `next`, adopt it, then reload.
  fn commit(&mut self, next: RecordStore) -> Result<()> {
    self
      .backend
      .save(next.tables())
      .map_err(|e| Error::Storage(Box::new(e)))?;
    self.store = next;
    self.reload()
  }

  /// Create a record with blank fields.
  pub fn new_record(&mut self) -> Result<Outcome> {
    let mut next = self.store.clone();
    let id = next.create_basic(self.alloc.as_mut(), &Fields::new())?;
    self.commit(next)?;
    Ok(Outcome::ok(Some(id.clone()), format!("new character created with ID {id}")))
  }

  /// Apply one submitted section.
  ///
  /// With no `id`, a Basic section creates the record; the other sections
  /// need an existing record.
  pub fn apply(&mut self, id: Option<&RecordId>, section: Section) -> Result<Outcome> {
    let table = section.table();
    let mut next = self.store.clone();

    let id = match id {
      Some(id) => {
        if !next.contains(id) {
          return Err(Error::RecordNotFound(id.clone()));
        }
        next.upsert_section(table, id, &section.into_fields())?;
        id.clone()
      }
      None if table == TableName::Basic => {
        next.create_basic(self.alloc.as_mut(), &section.into_fields())?
      }
      None => return Err(Error::NoRecordSelected(table)),
    };

    self.commit(next)?;
    Ok(Outcome::ok(Some(id.clone()), format!("{table} data saved for ID {id}")))
  }

  /// Delete a record from every table.
  pub fn delete_record(&mut self, id: &RecordId) -> Result<Outcome> {
    let mut next = self.store.clone();
    next.delete_record(id)?;
    self.commit(next)?;
    Ok(Outcome::ok(Some(id.clone()), format!("record with ID {id} removed from every table")))
  }

  /// Point a record's photo at an already-stored file.
  pub fn attach_photo(&mut self, id: &RecordId, path: &str) -> Result<Outcome> {
    let mut next = self.store.clone();
    next.set_photo_path(id, path)?;
    self.commit(next)?;
    Ok(Outcome::ok(Some(id.clone()), format!("photo saved for ID {id}")))
  }

  pub fn merged_view(&self) -> Result<MergedView> {
    merge::build_merged_view(self.store.tables())
  }

  /// Write an edited merged view back to every table.
  pub fn apply_merged_edits(&mut self, edited: &MergedView) -> Result<Outcome> {
    let tables = merge::reconcile(edited, self.store.tables(), self.alloc.as_mut())?;
    check_policy(&tables, self.alloc.policy())?;
    self.commit(RecordStore::new(tables))?;
    Ok(Outcome::ok(None, "changes saved to every table"))
  }
}

fn load<B: Backend>(backend: &B, policy: IdPolicy) -> Result<RecordStore> {
  let tables = backend.load().map_err(|e| Error::Storage(Box::new(e)))?;
  check_policy(&tables, policy)?;
  check_unique_basic(&tables)?;
  Ok(RecordStore::new(tables))
}

/// Basic holds exactly one row per identifier.
fn check_unique_basic(tables: &TableSet) -> Result<()> {
  let mut seen = HashSet::new();
  for id in tables.get(TableName::Basic).ids()? {
    if !seen.insert(id.clone()) {
      return Err(Error::DuplicateId(id));
    }
  }
  Ok(())
}

fn check_policy(tables: &TableSet, policy: IdPolicy) -> Result<()> {
  policy.check(&tables.all_ids()?)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{
    backend::MemoryBackend,
    id::{SequentialAllocator, TokenAllocator},
    schema::col,
    section::{BasicFields, EyeColor, HairColor, NotesFields, PersonalityFields, Sex},
    value::Value,
  };

  fn session() -> Session<MemoryBackend> {
    Session::open(MemoryBackend::new(), Box::new(SequentialAllocator::default())).unwrap()
  }

  fn basic(name: &str) -> Section {
    Section::Basic(BasicFields {
      name:       name.into(),
      nickname:   String::new(),
      age:        30,
      sex:        Sex::Masculino,
      height:     1.80,
      weight:     80,
      hair_color: HairColor::Negro,
      eye_color:  EyeColor::Verde,
      build:      String::new(),
      occupation: String::new(),
      birthplace: String::new(),
      birth_date: NaiveDate::from_ymd_opt(1985, 7, 14).unwrap(),
      photo:      None,
    })
  }

  fn notes(text: &str) -> Section {
    Section::Notes(NotesFields { notes: text.into() })
  }

  #[test]
  fn new_record_persists_and_reports_the_id() {
    let mut s = session();
    let outcome = s.new_record().unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.id, Some(RecordId::Seq(1)));
    assert!(outcome.message.contains('1'));

    let saved = s.backend().snapshot().unwrap();
    assert_eq!(saved.get(TableName::Basic).len(), 1);
  }

  #[test]
  fn basic_section_without_id_creates_a_record() {
    let mut s = session();
    let outcome = s.apply(None, basic("Luis")).unwrap();
    let id = outcome.id.unwrap();
    let basic = s.store().tables().get(TableName::Basic);
    assert_eq!(basic.get(0, col::NAME), Some(&Value::from("Luis")));
    assert_eq!(basic.ids().unwrap(), vec![id]);
  }

  #[test]
  fn other_sections_need_a_selected_record() {
    let mut s = session();
    assert!(matches!(
      s.apply(None, notes("x")),
      Err(Error::NoRecordSelected(TableName::Notes))
    ));
    assert!(matches!(
      s.apply(Some(&RecordId::Seq(5)), notes("x")),
      Err(Error::RecordNotFound(RecordId::Seq(5)))
    ));
  }

  #[test]
  fn resubmitting_a_section_replaces_it() {
    let mut s = session();
    let a = s.new_record().unwrap().id.unwrap();
    let b = s.new_record().unwrap().id.unwrap();
    s.apply(Some(&a), notes("uno")).unwrap();
    s.apply(Some(&b), notes("dos")).unwrap();
    s.apply(Some(&a), notes("tres")).unwrap();

    let t = s.store().tables().get(TableName::Notes);
    assert_eq!(t.ids().unwrap(), vec![b, a]);
    assert_eq!(t.get(1, col::NOTES), Some(&Value::from("tres")));
  }

  #[test]
  fn delete_removes_everywhere_and_ids_are_not_reused() {
    let mut s = session();
    let a = s.new_record().unwrap().id.unwrap();
    s.apply(
      Some(&a),
      Section::Personality(PersonalityFields { catchphrase: "hey".into(), ..Default::default() }),
    )
    .unwrap();
    s.delete_record(&a).unwrap();

    for table in s.store().tables().iter() {
      assert!(table.is_empty(), "{}", table.name());
    }
    let b = s.new_record().unwrap().id.unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn failed_save_keeps_previous_state() {
    let mut s = session();
    let a = s.new_record().unwrap().id.unwrap();
    s.backend_mut().set_read_only(true);

    let err = s.apply(Some(&a), notes("no se guarda")).unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(s.store().tables().get(TableName::Notes).is_empty());
    assert_eq!(s.store().ids().unwrap(), vec![a]);
  }

  #[test]
  fn photo_survives_section_and_view_edits() {
    let mut s = session();
    let a = s.apply(None, basic("Luis")).unwrap().id.unwrap();
    s.attach_photo(&a, "images/1.png").unwrap();
    s.apply(Some(&a), basic("Luis Alberto")).unwrap();

    let mut view = s.merged_view().unwrap();
    view.set(0, col::NICKNAME, "Beto".into());
    s.apply_merged_edits(&view).unwrap();

    let basic = s.store().tables().get(TableName::Basic);
    assert_eq!(basic.get(0, col::NAME), Some(&Value::from("Luis Alberto")));
    assert_eq!(basic.get(0, col::NICKNAME), Some(&Value::from("Beto")));
    assert_eq!(basic.get(0, col::PHOTO), Some(&Value::from("images/1.png")));
  }

  #[test]
  fn opening_with_the_wrong_policy_fails() {
    let backend = MemoryBackend::new();
    let mut s = Session::open(backend, Box::new(SequentialAllocator::default())).unwrap();
    s.new_record().unwrap();
    let tables = s.backend().snapshot().unwrap();

    let result = Session::open(
      MemoryBackend::with_tables(tables),
      Box::new(TokenAllocator::default()),
    );
    assert!(matches!(result, Err(Error::PolicyMismatch { expected: IdPolicy::Token, .. })));
  }

  #[test]
  fn opening_with_repeated_basic_ids_fails() {
    let mut tables = TableSet::empty();
    let basic = tables.get_mut(TableName::Basic);
    basic.push_row(vec![Value::Number(1.0), "Ana".into()]);
    basic.push_row(vec![Value::Number(1.0), "Otra".into()]);

    let result = Session::open(
      MemoryBackend::with_tables(tables),
      Box::new(SequentialAllocator::default()),
    );
    assert!(matches!(result, Err(Error::DuplicateId(RecordId::Seq(1)))));
  }

  #[test]
  fn orphan_rows_can_be_deleted() {
    let mut tables = TableSet::empty();
    tables
      .get_mut(TableName::Notes)
      .push_row(vec![Value::Number(5.0), "huérfana".into()]);
    let mut s = Session::open(
      MemoryBackend::with_tables(tables),
      Box::new(SequentialAllocator::default()),
    )
    .unwrap();

    assert!(s.delete_record(&RecordId::Seq(5)).unwrap().success);
    assert!(s.backend().snapshot().unwrap().get(TableName::Notes).is_empty());
  }

  #[test]
  fn token_session_allocates_tokens() {
    let mut s =
      Session::open(MemoryBackend::new(), Box::new(TokenAllocator::default())).unwrap();
    let id = s.new_record().unwrap().id.unwrap();
    assert_eq!(id.policy(), IdPolicy::Token);
    assert!(s.store().contains(&id));
  }
}
