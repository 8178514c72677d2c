//! Error type for `ficha-store-xlsx`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ficha_core::Error),

  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("could not read workbook {path:?}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: calamine::XlsxError,
  },

  #[error("could not write workbook: {0}")]
  Write(#[from] rust_xlsxwriter::XlsxError),

  #[error("sheet {sheet:?} exceeds the worksheet size limits")]
  TooLarge { sheet: &'static str },

  #[error("unsupported photo {0:?}; expected a png, jpg or jpeg file")]
  UnsupportedPhoto(PathBuf),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
