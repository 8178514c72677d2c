//! The form controller: command-line flags for each section, checked and
//! turned into [`Section`]s.

use std::{fmt::Display, path::PathBuf, str::FromStr};

use chrono::NaiveDate;
use clap::Args;
use ficha_core::{
  id::RecordId,
  section::{
    BasicFields, EyeColor, HairColor, NarrativeRole, NotesFields, PersonalityFields,
    RoleFields, Section, Sex,
  },
};
use strum::IntoEnumIterator;

/// Parse one of a fixed set of choices, listing them on failure.
pub fn choice<T>(s: &str) -> Result<T, String>
where
  T: FromStr + IntoEnumIterator + Display,
{
  s.parse().map_err(|_| {
    let options: Vec<String> = T::iter().map(|c| c.to_string()).collect();
    format!("expected one of: {}", options.join(", "))
  })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

// ─── Section 1 ────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct BasicArgs {
  /// Record to update; omit to create a new one.
  #[arg(long)]
  pub id:         Option<RecordId>,
  #[arg(long, default_value = "")]
  pub name:       String,
  #[arg(long, default_value = "")]
  pub nickname:   String,
  #[arg(long, default_value_t = 25)]
  pub age:        u8,
  #[arg(long, default_value = "Femenino", value_parser = choice::<Sex>)]
  pub sex:        Sex,
  /// Height in metres.
  #[arg(long, default_value_t = 1.70)]
  pub height:     f64,
  /// Weight in kilograms.
  #[arg(long, default_value_t = 60)]
  pub weight:     u16,
  #[arg(long, default_value = "Negro", value_parser = choice::<HairColor>)]
  pub hair:       HairColor,
  #[arg(long, default_value = "Negro", value_parser = choice::<EyeColor>)]
  pub eyes:       EyeColor,
  #[arg(long, default_value = "")]
  pub build:      String,
  #[arg(long, default_value = "")]
  pub occupation: String,
  #[arg(long, default_value = "")]
  pub birthplace: String,
  /// YYYY-MM-DD; defaults to today.
  #[arg(long, value_parser = parse_date)]
  pub birth_date: Option<NaiveDate>,
  /// Image to store as the character's photo (png, jpg or jpeg).
  #[arg(long)]
  pub photo:      Option<PathBuf>,
}

impl BasicArgs {
  /// Build the section; `photo` is the already-stored photo path, if any.
  pub fn to_section(&self, photo: Option<String>) -> Section {
    Section::Basic(BasicFields {
      name: self.name.clone(),
      nickname: self.nickname.clone(),
      age: self.age,
      sex: self.sex,
      height: self.height,
      weight: self.weight,
      hair_color: self.hair,
      eye_color: self.eyes,
      build: self.build.clone(),
      occupation: self.occupation.clone(),
      birthplace: self.birthplace.clone(),
      birth_date: self
        .birth_date
        .unwrap_or_else(|| chrono::Local::now().date_naive()),
      photo,
    })
  }
}

// ─── Section 2 ────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct PersonalityArgs {
  #[arg(long)]
  pub id:     RecordId,
  /// The character's typical phrase.
  #[arg(long, default_value = "")]
  pub phrase: String,
  /// Up to four traits; repeat the flag.
  #[arg(long = "trait", value_name = "TRAIT")]
  pub traits: Vec<String>,
}

impl PersonalityArgs {
  pub fn to_section(&self) -> anyhow::Result<Section> {
    if self.traits.len() > 4 {
      anyhow::bail!("at most four traits, got {}", self.traits.len());
    }
    let mut traits: [String; 4] = Default::default();
    for (slot, value) in traits.iter_mut().zip(&self.traits) {
      slot.clone_from(value);
    }
    Ok(Section::Personality(PersonalityFields {
      catchphrase: self.phrase.clone(),
      traits,
    }))
  }
}

// ─── Section 3 ────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct RoleArgs {
  #[arg(long)]
  pub id:        RecordId,
  #[arg(long, value_parser = choice::<NarrativeRole>)]
  pub role:      Option<NarrativeRole>,
  /// A key moment from the character's childhood.
  #[arg(long, default_value = "")]
  pub childhood: String,
  /// What the character wants.
  #[arg(long, default_value = "")]
  pub want:      String,
  /// What the character really needs.
  #[arg(long, default_value = "")]
  pub need:      String,
}

impl RoleArgs {
  pub fn to_section(&self) -> Section {
    Section::Role(RoleFields {
      role:      self.role,
      childhood: self.childhood.clone(),
      want:      self.want.clone(),
      need:      self.need.clone(),
    })
  }
}

// ─── Section 4 ────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct NotesArgs {
  #[arg(long)]
  pub id:   RecordId,
  #[arg(long, default_value = "")]
  pub text: String,
}

impl NotesArgs {
  pub fn to_section(&self) -> Section {
    Section::Notes(NotesFields { notes: self.text.clone() })
  }
}
