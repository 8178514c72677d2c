//! Spreadsheet backend for the Ficha character store.
//!
//! One `.xlsx` workbook holds the four tables as named sheets; uploaded
//! photos live in a sibling directory. Reading uses [`calamine`], writing
//! uses [`rust_xlsxwriter`].

mod encode;
mod photos;
mod workbook;

pub mod error;

pub use error::{Error, Result};
pub use photos::{PHOTO_EXTENSIONS, PhotoLibrary, StoredPhoto};
pub use workbook::XlsxBackend;

#[cfg(test)]
mod tests;
