//! The four form sections and their typed field sets.
//!
//! A front end collects these, calls [`Section::validate`], and hands the
//! section to [`Session::apply`](crate::session::Session::apply). Text is
//! normalised when the section is turned into table cells.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{
  Error, Result,
  schema::{TableName, col},
  table::Fields,
  value::Value,
};

// ─── Choices ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Sex {
  Femenino,
  Masculino,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum HairColor {
  Negro,
  #[strum(serialize = "Castaño oscuro")]
  CastanoOscuro,
  #[strum(serialize = "Castaño")]
  Castano,
  #[strum(serialize = "Castaño claro")]
  CastanoClaro,
  Rubio,
  Plateado,
  Pelirrojo,
  Canoso,
  #[strum(serialize = "Pintado/Decolorado")]
  PintadoDecolorado,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum EyeColor {
  Negro,
  #[strum(serialize = "Café oscuro")]
  CafeOscuro,
  #[strum(serialize = "Café")]
  Cafe,
  Amielado,
  Avellana,
  Verde,
  Azul,
  Gris,
  Violeta,
}

/// Narrative archetypes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum NarrativeRole {
  Protagonista,
  #[strum(serialize = "Ayudante de protagonista")]
  AyudanteDeProtagonista,
  Escudero,
  Deuteragonista,
  #[strum(serialize = "Guardián")]
  Guardian,
  Mentor,
  #[strum(serialize = "Personaje de impacto")]
  PersonajeDeImpacto,
  Antagonista,
  #[strum(serialize = "Ayudante de antagonista")]
  AyudanteDeAntagonista,
  #[strum(serialize = "Escéptico")]
  Esceptico,
  #[strum(serialize = "Obstáculo")]
  Obstaculo,
  Meta,
}

// ─── Limits ──────────────────────────────────────────────────────────────────

pub const AGE_MAX: u8 = 120;
pub const HEIGHT_RANGE: (f64, f64) = (1.20, 2.20);
pub const WEIGHT_RANGE: (u16, u16) = (30, 150);

pub fn birth_date_range() -> (NaiveDate, NaiveDate) {
  (
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
    NaiveDate::from_ymd_opt(2050, 12, 31).unwrap_or(NaiveDate::MAX),
  )
}

const MONTHS: [&str; 12] = [
  "Enero",
  "Febrero",
  "Marzo",
  "Abril",
  "Mayo",
  "Junio",
  "Julio",
  "Agosto",
  "Septiembre",
  "Octubre",
  "Noviembre",
  "Diciembre",
];

/// `"5 de Marzo del 1990"`.
pub fn format_birth_date(date: NaiveDate) -> String {
  format!(
    "{} de {} del {}",
    date.day(),
    MONTHS[date.month0() as usize],
    date.year()
  )
}

// ─── Sections ────────────────────────────────────────────────────────────────

/// Section 1: basic data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicFields {
  pub name:       String,
  pub nickname:   String,
  pub age:        u8,
  pub sex:        Sex,
  /// Metres.
  pub height:     f64,
  /// Kilograms.
  pub weight:     u16,
  pub hair_color: HairColor,
  pub eye_color:  EyeColor,
  pub build:      String,
  pub occupation: String,
  pub birthplace: String,
  pub birth_date: NaiveDate,
  /// Stored photo path, when a photo accompanies the submission.
  pub photo:      Option<String>,
}

/// Section 2: personality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalityFields {
  pub catchphrase: String,
  pub traits:      [String; 4],
}

/// Section 3: role in the story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleFields {
  pub role:      Option<NarrativeRole>,
  pub childhood: String,
  pub want:      String,
  pub need:      String,
}

/// Section 4: free-form notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesFields {
  pub notes: String,
}

/// One submitted form section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "lowercase")]
pub enum Section {
  Basic(BasicFields),
  Personality(PersonalityFields),
  Role(RoleFields),
  Notes(NotesFields),
}

impl Section {
  pub fn table(&self) -> TableName {
    match self {
      Self::Basic(_) => TableName::Basic,
      Self::Personality(_) => TableName::Personality,
      Self::Role(_) => TableName::Role,
      Self::Notes(_) => TableName::Notes,
    }
  }

  /// Check ranges and date bounds.
  pub fn validate(&self) -> Result<()> {
    let Self::Basic(b) = self else { return Ok(()) };

    if b.age > AGE_MAX {
      return Err(Error::Validation {
        field:  col::AGE,
        reason: format!("{} is above {AGE_MAX}", b.age),
      });
    }
    let (lo, hi) = HEIGHT_RANGE;
    if !(lo..=hi).contains(&b.height) {
      return Err(Error::Validation {
        field:  col::HEIGHT,
        reason: format!("{} is outside {lo:.2}..={hi:.2}", b.height),
      });
    }
    let (lo, hi) = WEIGHT_RANGE;
    if !(lo..=hi).contains(&b.weight) {
      return Err(Error::Validation {
        field:  col::WEIGHT,
        reason: format!("{} is outside {lo}..={hi}", b.weight),
      });
    }
    let (lo, hi) = birth_date_range();
    if !(lo..=hi).contains(&b.birth_date) {
      return Err(Error::Validation {
        field:  col::BIRTH_DATE,
        reason: format!("{} is outside {lo}..={hi}", b.birth_date),
      });
    }
    Ok(())
  }

  /// Table cells for this section, keyed by column name.
  pub fn into_fields(self) -> Fields {
    let pairs: Vec<(&str, Value)> = match self {
      Self::Basic(b) => {
        let mut pairs = vec![
          (col::NAME, title_case(&b.name).into()),
          (col::NICKNAME, capitalize(&b.nickname).into()),
          (col::AGE, b.age.into()),
          (col::SEX, b.sex.to_string().into()),
          (col::HEIGHT, b.height.into()),
          (col::WEIGHT, b.weight.into()),
          (col::HAIR_COLOR, b.hair_color.to_string().to_lowercase().into()),
          (col::EYE_COLOR, b.eye_color.to_string().to_lowercase().into()),
          (col::BUILD, b.build.to_lowercase().into()),
          (col::OCCUPATION, title_case(&b.occupation).into()),
          (col::BIRTHPLACE, title_case(&b.birthplace).into()),
          (col::BIRTH_DATE, format_birth_date(b.birth_date).into()),
        ];
        if let Some(photo) = b.photo {
          pairs.push((col::PHOTO, photo.into()));
        }
        pairs
      }
      Self::Personality(p) => {
        let [t1, t2, t3, t4] = p.traits;
        vec![
          (col::CATCHPHRASE, p.catchphrase.to_lowercase().into()),
          (col::TRAIT_1, t1.to_lowercase().into()),
          (col::TRAIT_2, t2.to_lowercase().into()),
          (col::TRAIT_3, t3.to_lowercase().into()),
          (col::TRAIT_4, t4.to_lowercase().into()),
        ]
      }
      Self::Role(r) => vec![
        (col::ROLE, r.role.map_or_else(String::new, |r| r.to_string()).into()),
        (col::CHILDHOOD, r.childhood.to_lowercase().into()),
        (col::WANT, r.want.to_lowercase().into()),
        (col::NEED, r.need.to_lowercase().into()),
      ],
      Self::Notes(n) => vec![(col::NOTES, n.notes.into())],
    };
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
  }
}

// ─── Text normalisation ──────────────────────────────────────────────────────

/// Upper-case the first letter of every word, lower-case the rest.
fn title_case(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut at_word_start = true;
  for c in s.chars() {
    if c.is_alphabetic() {
      if at_word_start {
        out.extend(c.to_uppercase());
      } else {
        out.extend(c.to_lowercase());
      }
      at_word_start = false;
    } else {
      out.push(c);
      at_word_start = true;
    }
  }
  out
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  fn basic() -> BasicFields {
    BasicFields {
      name:       "ana maría LÓPEZ".into(),
      nickname:   "ANITA".into(),
      age:        25,
      sex:        Sex::Femenino,
      height:     1.70,
      weight:     60,
      hair_color: HairColor::CastanoOscuro,
      eye_color:  EyeColor::Cafe,
      build:      "Delgada".into(),
      occupation: "maestra de escuela".into(),
      birthplace: "ciudad de méxico".into(),
      birth_date: NaiveDate::from_ymd_opt(1990, 3, 5).unwrap(),
      photo:      None,
    }
  }

  #[test]
  fn birth_date_uses_spanish_month_names() {
    let d = NaiveDate::from_ymd_opt(1990, 3, 5).unwrap();
    assert_eq!(format_birth_date(d), "5 de Marzo del 1990");
    let d = NaiveDate::from_ymd_opt(2001, 12, 31).unwrap();
    assert_eq!(format_birth_date(d), "31 de Diciembre del 2001");
  }

  #[test]
  fn basic_fields_are_normalised() {
    let f = Section::Basic(basic()).into_fields();
    assert_eq!(f[col::NAME], Value::from("Ana María López"));
    assert_eq!(f[col::NICKNAME], Value::from("Anita"));
    assert_eq!(f[col::HAIR_COLOR], Value::from("castaño oscuro"));
    assert_eq!(f[col::EYE_COLOR], Value::from("café"));
    assert_eq!(f[col::BUILD], Value::from("delgada"));
    assert_eq!(f[col::OCCUPATION], Value::from("Maestra De Escuela"));
    assert_eq!(f[col::AGE], Value::Number(25.0));
    assert_eq!(f[col::SEX], Value::from("Femenino"));
    assert!(!f.contains_key(col::PHOTO));
  }

  #[test]
  fn photo_is_included_when_supplied() {
    let mut b = basic();
    b.photo = Some("images/1.png".into());
    let f = Section::Basic(b).into_fields();
    assert_eq!(f[col::PHOTO], Value::from("images/1.png"));
  }

  #[test]
  fn validation_rejects_out_of_range_values() {
    let mut b = basic();
    b.height = 2.5;
    assert!(matches!(
      Section::Basic(b).validate(),
      Err(Error::Validation { field: col::HEIGHT, .. })
    ));

    let mut b = basic();
    b.birth_date = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
    assert!(Section::Basic(b).validate().is_err());

    assert!(Section::Basic(basic()).validate().is_ok());
  }

  #[test]
  fn role_without_choice_is_blank() {
    let f = Section::Role(RoleFields::default()).into_fields();
    assert_eq!(f[col::ROLE], Value::from(""));
  }

  #[test]
  fn choices_parse_their_display_names() {
    assert_eq!(NarrativeRole::iter().count(), 12);
    assert_eq!(HairColor::iter().count(), 9);
    assert_eq!(EyeColor::iter().count(), 9);
    for role in NarrativeRole::iter() {
      assert_eq!(role.to_string().parse::<NarrativeRole>().unwrap(), role);
    }
    assert_eq!("rubio".parse::<HairColor>().unwrap(), HairColor::Rubio);
  }

  #[test]
  fn case_changes_keep_surrounding_whitespace() {
    assert_eq!(title_case(" ana maría-josé "), " Ana María-José ");
    assert_eq!(capitalize("ANITA "), "Anita ");
    assert_eq!(capitalize(" ANITA"), " anita");
  }

  #[test]
  fn notes_are_kept_verbatim() {
    let f = Section::Notes(NotesFields { notes: "Línea UNO".into() }).into_fields();
    assert_eq!(f[col::NOTES], Value::from("Línea UNO"));
  }
}
