//! `ficha` — command-line editor for a character-sheet workbook.
//!
//! # Usage
//!
//! ```text
//! ficha new
//! ficha basic --id 1 --name "ana lópez" --age 31 --birth-date 1993-04-02
//! ficha personality --id 1 --phrase "¡ya voy!" --trait leal --trait terca
//! ficha view --json > vista.json && ficha apply-view vista.json
//! ```

mod config;
mod form;
mod render;

use std::{
  io::{self, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use ficha_core::{
  backend::Backend,
  id::{IdPolicy, RecordId},
  merge::MergedView,
  section::{EyeColor, HairColor, NarrativeRole, Sex},
  session::{Outcome, Session},
};
use ficha_store_xlsx::{PhotoLibrary, XlsxBackend};
use form::{BasicArgs, NotesArgs, PersonalityArgs, RoleArgs};
use strum::IntoEnumIterator;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ficha", author, version, about = "Character-sheet workbook editor")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ficha.toml")]
  config: PathBuf,

  /// Workbook path (overrides the configuration).
  #[arg(long)]
  workbook: Option<PathBuf>,

  /// Photo directory (overrides the configuration).
  #[arg(long)]
  photo_dir: Option<PathBuf>,

  /// Identifier policy: `sequential` or `token` (overrides the configuration).
  #[arg(long)]
  id_policy: Option<IdPolicy>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create a character with a fresh identifier and blank fields.
  New,
  /// Save section 1: basic data.
  Basic(BasicArgs),
  /// Save section 2: personality.
  Personality(PersonalityArgs),
  /// Save section 3: role in the story.
  Role(RoleArgs),
  /// Save section 4: notes.
  Notes(NotesArgs),
  /// Store a photo for a character.
  Photo {
    #[arg(long)]
    id:   RecordId,
    file: PathBuf,
  },
  /// Delete a character from every sheet.
  Delete {
    #[arg(long)]
    id:          RecordId,
    /// Leave the character's photo files in place.
    #[arg(long)]
    keep_photos: bool,
  },
  /// Print every row of one character.
  Show { id: RecordId },
  /// List characters.
  List,
  /// Print the merged view of all sheets.
  View {
    /// Emit JSON suitable for `apply-view`.
    #[arg(long)]
    json: bool,
  },
  /// Write an edited merged view (JSON) back to every sheet.
  ApplyView { file: PathBuf },
  /// Print the accepted values of each choice field.
  Options,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if let Command::Options = cli.command {
    print_options();
    return Ok(());
  }

  // Flags override the config file, which overrides defaults.
  let mut cfg = AppConfig::load(&cli.config)?;
  if let Some(path) = cli.workbook {
    cfg.workbook_path = config::expand_tilde(&path);
  }
  if let Some(dir) = cli.photo_dir {
    cfg.photo_dir = config::expand_tilde(&dir);
  }
  if let Some(policy) = cli.id_policy {
    cfg.id_policy = policy;
  }

  let backend = XlsxBackend::open(&cfg.workbook_path)
    .with_context(|| format!("failed to open workbook {:?}", cfg.workbook_path))?;
  let mut session = Session::open(backend, cfg.id_policy.allocator())
    .with_context(|| format!("failed to load workbook {:?}", cfg.workbook_path))?;
  let photos = PhotoLibrary::new(&cfg.photo_dir);

  run(cli.command, &mut session, &photos)
}

fn run(command: Command, session: &mut Session<XlsxBackend>, photos: &PhotoLibrary) -> Result<()> {
  let mut stdout = io::stdout().lock();

  let outcome: Outcome = match command {
    Command::New => session.new_record()?,

    Command::Basic(args) => {
      let section = args.to_section(None);
      section.validate()?;
      // Section first: the photo file is only written once the record is saved.
      let outcome = session.apply(args.id.as_ref(), section)?;
      match (&args.photo, outcome.id.clone()) {
        (Some(file), Some(id)) => attach(session, photos, &id, file)?,
        _ => outcome,
      }
    }

    Command::Personality(args) => {
      let section = args.to_section()?;
      session.apply(Some(&args.id), section)?
    }
    Command::Role(args) => session.apply(Some(&args.id), args.to_section())?,
    Command::Notes(args) => session.apply(Some(&args.id), args.to_section())?,

    Command::Photo { id, file } => {
      if !session.store().contains(&id) {
        anyhow::bail!(ficha_core::Error::RecordNotFound(id));
      }
      attach(session, photos, &id, &file)?
    }

    Command::Delete { id, keep_photos } => {
      let outcome = session.delete_record(&id)?;
      if !keep_photos {
        let removed = photos.remove(&id)?;
        tracing::debug!(%id, removed, "photo files removed");
      }
      outcome
    }

    Command::Show { id } => {
      let record = session
        .store()
        .record(&id)?
        .ok_or(ficha_core::Error::RecordNotFound(id))?;
      render::record(&mut stdout, &record)?;
      return Ok(());
    }

    Command::List => {
      render::list(&mut stdout, session.store())?;
      return Ok(());
    }

    Command::View { json } => {
      let view = session.merged_view()?;
      if json {
        serde_json::to_writer_pretty(&mut stdout, &view)?;
        writeln!(stdout)?;
      } else {
        render::view(&mut stdout, &view)?;
      }
      return Ok(());
    }

    Command::ApplyView { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
      let edited: MergedView =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
      session.apply_merged_edits(&edited)?
    }

    Command::Options => unreachable!("handled before the session is opened"),
  };

  writeln!(stdout, "{}", outcome.message)?;
  Ok(())
}

/// Store a photo and point the record at it. The stored file is removed
/// again if the workbook cannot be saved.
fn attach<B: Backend>(
  session: &mut Session<B>,
  photos: &PhotoLibrary,
  id: &RecordId,
  file: &Path,
) -> Result<Outcome> {
  let stored = photos.store(id, file)?;
  match session.attach_photo(id, &stored.path.display().to_string()) {
    Ok(outcome) => Ok(outcome),
    Err(err) => {
      if let Err(cleanup) = photos.remove(id) {
        tracing::warn!(%id, error = %cleanup, "could not remove unsaved photo");
      }
      Err(err.into())
    }
  }
}

fn print_options() {
  fn line<T: IntoEnumIterator + std::fmt::Display>(label: &str) {
    let values: Vec<String> = T::iter().map(|v| v.to_string()).collect();
    println!("{label}: {}", values.join(", "));
  }
  line::<Sex>("sex");
  line::<HairColor>("hair");
  line::<EyeColor>("eyes");
  line::<NarrativeRole>("role");
  println!("id policy: {}, {}", IdPolicy::Sequential, IdPolicy::Token);
}
