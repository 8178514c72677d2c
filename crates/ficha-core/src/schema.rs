//! The fixed four-table schema of a character workbook.
//!
//! Sheet and column names are the ones written to disk; they are Spanish
//! because that is what existing workbooks contain.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator as _};

/// Column names shared by the code that builds rows.
pub mod col {
  pub const ID: &str = "ID";

  // Básico
  pub const NAME: &str = "Nombre";
  pub const NICKNAME: &str = "Apodo";
  pub const AGE: &str = "Edad";
  pub const SEX: &str = "Sexo";
  pub const HEIGHT: &str = "Altura";
  pub const WEIGHT: &str = "Peso";
  pub const HAIR_COLOR: &str = "Color de cabello";
  pub const EYE_COLOR: &str = "Color de ojos";
  pub const BUILD: &str = "Complexión";
  pub const OCCUPATION: &str = "Ocupación";
  pub const BIRTHPLACE: &str = "Lugar de nacimiento";
  pub const BIRTH_DATE: &str = "Fecha de nacimiento";
  pub const PHOTO: &str = "Foto";

  // Personalidad
  pub const CATCHPHRASE: &str = "Frase";
  pub const TRAIT_1: &str = "Rasgo 1";
  pub const TRAIT_2: &str = "Rasgo 2";
  pub const TRAIT_3: &str = "Rasgo 3";
  pub const TRAIT_4: &str = "Rasgo 4";

  // Rol
  pub const ROLE: &str = "Rol en historia";
  pub const CHILDHOOD: &str = "Momento de la infancia";
  pub const WANT: &str = "¿Qué quiere?";
  pub const NEED: &str = "¿Qué necesita?";

  // Notas
  pub const NOTES: &str = "Notas adicionales";
}

const BASIC_COLUMNS: &[&str] = &[
  col::ID,
  col::NAME,
  col::NICKNAME,
  col::AGE,
  col::SEX,
  col::HEIGHT,
  col::WEIGHT,
  col::HAIR_COLOR,
  col::EYE_COLOR,
  col::BUILD,
  col::OCCUPATION,
  col::BIRTHPLACE,
  col::BIRTH_DATE,
  col::PHOTO,
];

const PERSONALITY_COLUMNS: &[&str] = &[
  col::ID,
  col::CATCHPHRASE,
  col::TRAIT_1,
  col::TRAIT_2,
  col::TRAIT_3,
  col::TRAIT_4,
];

const ROLE_COLUMNS: &[&str] =
  &[col::ID, col::ROLE, col::CHILDHOOD, col::WANT, col::NEED];

const NOTES_COLUMNS: &[&str] = &[col::ID, col::NOTES];

/// One of the four tables. Iteration order is the on-disk sheet order and
/// the column order of the merged view.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Display,
  EnumIter,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TableName {
  Basic,
  Personality,
  Role,
  Notes,
}

impl TableName {
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// The worksheet name in the workbook.
  pub fn sheet_name(self) -> &'static str {
    match self {
      Self::Basic => "Básico",
      Self::Personality => "Personalidad",
      Self::Role => "Rol",
      Self::Notes => "Notas",
    }
  }

  pub fn from_sheet_name(name: &str) -> Option<Self> {
    Self::iter().find(|t| t.sheet_name() == name)
  }

  /// Canonical column order, `ID` first.
  pub fn columns(self) -> &'static [&'static str] {
    match self {
      Self::Basic => BASIC_COLUMNS,
      Self::Personality => PERSONALITY_COLUMNS,
      Self::Role => ROLE_COLUMNS,
      Self::Notes => NOTES_COLUMNS,
    }
  }
}
