//! Core types and operations for the Ficha character-sheet store.
//!
//! A character is a *record*: the rows sharing one identifier across four
//! tables (basic info, personality, narrative role, notes). This crate owns
//! the in-memory tables, identifier allocation, the merged editable view and
//! its reconciliation back into tables. It has no file-format dependencies;
//! persistence goes through the [`backend::Backend`] trait.

pub mod backend;
pub mod error;
pub mod id;
pub mod merge;
pub mod record;
pub mod schema;
pub mod section;
pub mod session;
pub mod table;
pub mod value;

pub use error::{Error, Result};
