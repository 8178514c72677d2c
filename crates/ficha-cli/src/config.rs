//! Layered configuration: defaults, then an optional TOML file, then
//! `FICHA_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use ficha_core::id::IdPolicy;
use serde::Deserialize;

/// Runtime configuration, deserialised from `ficha.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
  /// The workbook holding the four sheets.
  #[serde(default = "default_workbook_path")]
  pub workbook_path: PathBuf,
  /// Directory for `<id>.<ext>` photo files.
  #[serde(default = "default_photo_dir")]
  pub photo_dir:     PathBuf,
  /// Identifier scheme; fixed for the lifetime of a workbook.
  #[serde(default)]
  pub id_policy:     IdPolicy,
}

fn default_workbook_path() -> PathBuf { PathBuf::from("datos_personajes.xlsx") }

fn default_photo_dir() -> PathBuf { PathBuf::from("images") }

impl AppConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FICHA"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise configuration")?;
    cfg.workbook_path = expand_tilde(&cfg.workbook_path);
    cfg.photo_dir = expand_tilde(&cfg.photo_dir);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load(&dir.path().join("ficha.toml")).unwrap();
    assert_eq!(cfg.photo_dir, PathBuf::from("images"));
    assert_eq!(cfg.id_policy, IdPolicy::Sequential);
  }

  #[test]
  fn file_values_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ficha.toml");
    std::fs::write(
      &path,
      "workbook_path = \"reparto.xlsx\"\nphoto_dir = \"fotos\"\nid_policy = \"token\"\n",
    )
    .unwrap();

    let cfg = AppConfig::load(&path).unwrap();
    assert_eq!(cfg.workbook_path, PathBuf::from("reparto.xlsx"));
    assert_eq!(cfg.photo_dir, PathBuf::from("fotos"));
    assert_eq!(cfg.id_policy, IdPolicy::Token);
  }

  #[test]
  fn unknown_policy_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ficha.toml");
    std::fs::write(&path, "id_policy = \"random\"\n").unwrap();
    assert!(AppConfig::load(&path).is_err());
  }
}
