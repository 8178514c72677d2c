//! Scalar cell values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single spreadsheet cell.
///
/// Serialises untagged: `null`, a JSON number or a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Empty,
  Number(f64),
  Text(String),
}

impl Value {
  /// `true` for empty cells and whitespace-only text.
  pub fn is_blank(&self) -> bool {
    match self {
      Self::Empty => true,
      Self::Number(_) => false,
      Self::Text(s) => s.trim().is_empty(),
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => Ok(()),
      // Integral numbers print without a trailing ".0".
      Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
        write!(f, "{}", *n as i64)
      }
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<u8> for Value {
  fn from(n: u8) -> Self { Self::Number(f64::from(n)) }
}

impl From<u16> for Value {
  fn from(n: u16) -> Self { Self::Number(f64::from(n)) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Empty, Into::into) }
}
