//! The mutation engine: a transactional, invariant-preserving editing API
//! over the WordNet store.
//!
//! Every public mutation runs inside an implicit transaction unless a
//! batch is active; it records history atomically with the data change
//! and leaves the store untouched on error. Operations are grouped by
//! domain in the submodules of this directory.

mod compound;
mod definition;
mod entry;
mod frame;
mod ili;
mod lexicon;
mod metadata;
mod relation;
mod sense;
mod synset;

use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use log::debug;
use rusqlite::Connection;

pub use definition::DefinitionOptions;
pub use entry::{EntryFilter, EntryOptions, EntryUpdate, FormOptions, PronunciationOptions};
pub use lexicon::{LexiconOptions, LexiconUpdate};
pub use relation::RelationOptions;
pub use sense::{SenseFilter, SenseOptions};
pub use synset::{SynsetFilter, SynsetOptions, SynsetUpdate};

use crate::db;
use crate::error::{EditorError, Result};
use crate::exporter::{self, ExportOptions};
use crate::history::{self, HistoryFilter};
use crate::importer::{self, ImportOverrides};
use crate::lmf;
use crate::models::{EditRecord, Finding};
use crate::validator;

/// A complete programmatic API for editing WordNets.
///
/// The editor owns its store connection; it is not reentrant across
/// threads. A second editor on the same file store works because the
/// underlying engine supports multi-handle reads with one writer at a
/// time.
pub struct Editor {
    conn: Connection,
    batch_depth: u32,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("batch_depth", &self.batch_depth)
            .finish()
    }
}

impl Editor {
    /// Open (or create) a file-backed store, verify its schema version,
    /// and initialize the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = db::connect(path.as_ref())?;
        db::check_schema_version(&conn)?;
        db::init_db(&conn)?;
        debug!("opened editor store at {:?}", path.as_ref());
        Ok(Editor {
            conn,
            batch_depth: 0,
        })
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::connect_in_memory()?;
        db::init_db(&conn)?;
        Ok(Editor {
            conn,
            batch_depth: 0,
        })
    }

    /// Build an editor by importing a WN-LMF file into a fresh in-memory
    /// store.
    pub fn from_lmf(source: impl AsRef<Path>) -> Result<Self> {
        let mut editor = Editor::open_in_memory()?;
        editor.import_lmf(source)?;
        Ok(editor)
    }

    /// The default location for a persistent store, inside the user's
    /// data directory.
    pub fn default_db_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "WnEditor", "wn-editor").ok_or_else(|| {
            EditorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "user data directory could not be determined",
            ))
        })?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("wn-editor.db"))
    }

    /// Close the store connection, discarding the editor.
    pub fn close(self) {
        drop(self.conn);
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ------------------------------------------------------------------
    // Transaction / batch discipline
    // ------------------------------------------------------------------

    /// Group multiple mutations into a single transaction.
    ///
    /// Nested batches are counted; only the outermost scope commits on
    /// success. An error from the closure rolls the whole batch back and
    /// propagates, leaving no history rows behind.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.batch_depth += 1;
        if self.batch_depth == 1 {
            if let Err(e) = self.conn.execute_batch("BEGIN") {
                self.batch_depth -= 1;
                return Err(e.into());
            }
        }
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            match &result {
                Ok(_) => self.conn.execute_batch("COMMIT")?,
                Err(_) => {
                    let _ = self.conn.execute_batch("ROLLBACK");
                }
            }
        }
        result
    }

    /// Run a mutation inside its own transaction unless a batch is
    /// active on this editor.
    pub(crate) fn mutate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.batch_depth > 0 {
            return f(self);
        }
        self.conn.execute_batch("BEGIN")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------

    /// Query the edit history, ordered ascending by timestamp.
    pub fn history(&self, filter: &HistoryFilter) -> Result<Vec<EditRecord>> {
        history::query(&self.conn, filter)
    }

    /// All edits strictly after the given ISO-8601 timestamp.
    pub fn changes_since(&self, timestamp: &str) -> Result<Vec<EditRecord>> {
        self.history(&HistoryFilter {
            since: Some(timestamp.to_string()),
            ..Default::default()
        })
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Run the full validation rule battery, optionally limited to one
    /// lexicon (bare id or specifier).
    pub fn validate(&self, lexicon: Option<&str>) -> Result<Vec<Finding>> {
        validator::validate_all(&self.conn, lexicon)
    }

    /// Validate a single synset.
    pub fn validate_synset(&self, synset_id: &str) -> Result<Vec<Finding>> {
        validator::validate_synset(&self.conn, synset_id)
    }

    /// Validate a single entry.
    pub fn validate_entry(&self, entry_id: &str) -> Result<Vec<Finding>> {
        validator::validate_entry(&self.conn, entry_id)
    }

    /// Run the relation-focused subset of the rule battery.
    pub fn validate_relations(&self, lexicon: Option<&str>) -> Result<Vec<Finding>> {
        validator::validate_relations(&self.conn, lexicon)
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    /// Import a WN-LMF XML file, recording CREATE history rows.
    pub fn import_lmf(&mut self, source: impl AsRef<Path>) -> Result<()> {
        let source = source.as_ref();
        if !source.exists() {
            return Err(EditorError::Import(format!("file not found: {source:?}")));
        }
        let resource = lmf::load(source)?;
        self.mutate(|ed| importer::import_resource(&ed.conn, &resource, true))
    }

    /// Import an already-built intermediate resource.
    pub fn import_resource(
        &mut self,
        resource: &lmf::LexicalResource,
        record_history: bool,
    ) -> Result<()> {
        self.mutate(|ed| importer::import_resource(&ed.conn, resource, record_history))
    }

    /// Apply lexicon overrides (id, version, label, ...) after an import.
    pub fn apply_import_overrides(
        &mut self,
        specifier: &str,
        overrides: &ImportOverrides,
    ) -> Result<()> {
        self.mutate(|ed| importer::apply_overrides(&ed.conn, specifier, overrides))
    }

    /// Export the store (or a subset of lexicons) to a WN-LMF XML file.
    pub fn export_lmf(&self, destination: impl AsRef<Path>, options: &ExportOptions) -> Result<()> {
        exporter::export_to_lmf(&self.conn, destination.as_ref(), options)
    }

    /// Build the intermediate resource shape without writing a file.
    pub fn to_resource(&self, options: &ExportOptions) -> Result<lmf::LexicalResource> {
        exporter::build_resource(&self.conn, options)
    }
}
