//! Conversion between [`Value`] and worksheet cells.
//!
//! Numbers stay numbers and text stays text. Empty text is written as a
//! blank cell, so it reads back as [`Value::Empty`]. Spreadsheet dates read
//! as their serial number; booleans and error cells read as text.

use calamine::Data;
use ficha_core::value::Value;

pub fn decode_cell(cell: &Data) -> Value {
  match cell {
    Data::Empty => Value::Empty,
    Data::String(s) if s.is_empty() => Value::Empty,
    Data::String(s) => Value::Text(s.clone()),
    Data::Int(i) => Value::Number(*i as f64),
    Data::Float(f) => Value::Number(*f),
    Data::DateTime(dt) => Value::Number(dt.as_f64()),
    Data::Bool(b) => Value::Text(if *b { "TRUE" } else { "FALSE" }.to_owned()),
    Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
    Data::Error(e) => Value::Text(e.to_string()),
  }
}

/// Header text for column `idx`. Blank headers get a positional name.
pub fn decode_header(cell: &Data, idx: usize) -> String {
  match decode_cell(cell) {
    Value::Empty => format!("Unnamed: {idx}"),
    other => other.to_string(),
  }
}
