//! Record identifiers and the identity allocator.
//!
//! A deployment uses exactly one [`IdPolicy`]. Sequential identifiers are
//! positive integers; token identifiers are random 128-bit values rendered as
//! 32 lowercase hex digits. The two are never mixed within one workbook.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, value::Value};

// ─── RecordId ────────────────────────────────────────────────────────────────

/// The identifier shared by every row of one record.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(untagged)]
pub enum RecordId {
  Seq(u64),
  Token(String),
}

impl RecordId {
  pub fn policy(&self) -> IdPolicy {
    match self {
      Self::Seq(_) => IdPolicy::Sequential,
      Self::Token(_) => IdPolicy::Token,
    }
  }

  /// Read an identifier cell. Blank cells yield `None`.
  ///
  /// Text holding only digits is read as a sequential identifier, so a
  /// workbook whose ID column was retyped by hand still loads.
  pub fn from_value(value: &Value) -> Result<Option<Self>> {
    match value {
      Value::Empty => Ok(None),
      Value::Number(n) => {
        if n.fract() == 0.0 && *n >= 1.0 && *n <= u64::MAX as f64 {
          Ok(Some(Self::Seq(*n as u64)))
        } else {
          Err(Error::InvalidId(n.to_string()))
        }
      }
      Value::Text(s) if s.trim().is_empty() => Ok(None),
      Value::Text(s) => s.parse().map(Some),
    }
  }

  pub fn to_value(&self) -> Value {
    match self {
      Self::Seq(n) => Value::Number(*n as f64),
      Self::Token(t) => Value::Text(t.clone()),
    }
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Seq(n) => write!(f, "{n}"),
      Self::Token(t) => f.write_str(t),
    }
  }
}

impl FromStr for RecordId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim();
    if s.is_empty() {
      return Err(Error::InvalidId(s.to_owned()));
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
      return match s.parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::InvalidId(s.to_owned())),
        Ok(n) => Ok(Self::Seq(n)),
      };
    }
    Ok(Self::Token(s.to_owned()))
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Which identifier scheme a deployment uses.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Display,
  EnumString,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IdPolicy {
  #[default]
  Sequential,
  Token,
}

impl IdPolicy {
  /// Build the allocator for this policy.
  pub fn allocator(self) -> Box<dyn Allocator> {
    match self {
      Self::Sequential => Box::new(SequentialAllocator::default()),
      Self::Token => Box::new(TokenAllocator::default()),
    }
  }

  /// Fail if any identifier in `ids` belongs to the other policy.
  pub fn check<'a>(
    self,
    ids: impl IntoIterator<Item = &'a RecordId>,
  ) -> Result<()> {
    match ids.into_iter().find(|id| id.policy() != self) {
      Some(id) => Err(Error::PolicyMismatch { id: id.clone(), expected: self }),
      None => Ok(()),
    }
  }
}

// ─── Allocators ──────────────────────────────────────────────────────────────

/// Produces identifiers for new records.
///
/// `allocate` never returns a member of `existing`.
pub trait Allocator {
  fn policy(&self) -> IdPolicy;

  fn allocate(&mut self, existing: &HashSet<RecordId>) -> Result<RecordId>;
}

/// `max(existing) + 1`, starting at 1.
///
/// The allocator also remembers the highest identifier it has handed out, so
/// deleting the newest record does not make its identifier available again
/// for the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct SequentialAllocator {
  issued: u64,
}

impl Allocator for SequentialAllocator {
  fn policy(&self) -> IdPolicy { IdPolicy::Sequential }

  fn allocate(&mut self, existing: &HashSet<RecordId>) -> Result<RecordId> {
    let max = existing
      .iter()
      .filter_map(|id| match id {
        RecordId::Seq(n) => Some(*n),
        RecordId::Token(_) => None,
      })
      .max()
      .unwrap_or(0);

    let next = max
      .max(self.issued)
      .checked_add(1)
      .ok_or(Error::IdentityExhausted(1))?;
    self.issued = next;
    Ok(RecordId::Seq(next))
  }
}

/// Number of candidates tried before giving up.
pub const DEFAULT_TOKEN_ATTEMPTS: usize = 8;

/// Random 128-bit tokens, checked against the existing set.
pub struct TokenAllocator {
  source:       Box<dyn FnMut() -> String>,
  max_attempts: usize,
}

impl TokenAllocator {
  /// Use a custom candidate source instead of UUID v4.
  pub fn with_source(
    source: impl FnMut() -> String + 'static,
    max_attempts: usize,
  ) -> Self {
    Self { source: Box::new(source), max_attempts }
  }
}

impl Default for TokenAllocator {
  fn default() -> Self {
    Self::with_source(
      || Uuid::new_v4().simple().to_string(),
      DEFAULT_TOKEN_ATTEMPTS,
    )
  }
}

impl fmt::Debug for TokenAllocator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TokenAllocator")
      .field("max_attempts", &self.max_attempts)
      .finish_non_exhaustive()
  }
}

impl Allocator for TokenAllocator {
  fn policy(&self) -> IdPolicy { IdPolicy::Token }

  fn allocate(&mut self, existing: &HashSet<RecordId>) -> Result<RecordId> {
    for attempt in 1..=self.max_attempts {
      let candidate = RecordId::Token((self.source)());
      if !existing.contains(&candidate) {
        return Ok(candidate);
      }
      tracing::warn!(%candidate, attempt, "identifier collision, retrying");
    }
    Err(Error::IdentityExhausted(self.max_attempts))
  }
}
