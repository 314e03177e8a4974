//! Bidirectional bridge to an external WN-compatible SQLite store.
//!
//! The external store is expected to follow the same relational layout
//! as the editor's own schema (the table names are normative for
//! on-disk compatibility), which lets the bulk path read it directly
//! into the intermediate resource shape. When the bulk read fails (a
//! foreign schema revision, a missing table) and the caller supplied a
//! WN-LMF export produced by the external library, that file is
//! imported instead.
//!
//! Committing back goes through a temporary WN-LMF file: the selected
//! lexicons are exported, matching lexicon versions are removed from
//! the external store, and the file is imported into it.

use std::path::PathBuf;

use log::{info, warn};
use rusqlite::{Connection, OpenFlags, params};

use crate::db;
use crate::editor::Editor;
use crate::error::{EditorError, Result};
use crate::exporter::{self, ExportOptions};
use crate::importer::{self, ImportOverrides};
use crate::lmf;

/// Options for [`from_external`].
#[derive(Debug, Clone)]
pub struct ExternalImportOptions {
    /// Path to the external store's SQLite database.
    pub db_path: PathBuf,
    /// WN-LMF file to fall back on when the bulk path fails.
    pub xml_fallback: Option<PathBuf>,
    /// Record CREATE history rows for the imported entities.
    pub record_history: bool,
    /// Lexicon attribute overrides applied after the import.
    pub overrides: ImportOverrides,
}

impl ExternalImportOptions {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        ExternalImportOptions {
            db_path: db_path.into(),
            xml_fallback: None,
            record_history: true,
            overrides: ImportOverrides::default(),
        }
    }
}

/// Options for [`commit_to_external`].
#[derive(Debug, Clone)]
pub struct ExternalCommitOptions {
    /// Path to the external store's SQLite database.
    pub db_path: PathBuf,
    /// Lexicons (bare ids or specifiers) to commit; all when None.
    pub lexicons: Option<Vec<String>>,
}

impl ExternalCommitOptions {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        ExternalCommitOptions {
            db_path: db_path.into(),
            lexicons: None,
        }
    }
}

/// Import one lexicon (bare id or `"id:version"` specifier) from an
/// external store into the editor.
pub fn from_external(
    editor: &mut Editor,
    specifier: &str,
    options: &ExternalImportOptions,
) -> Result<()> {
    let resource = match read_external_store(&options.db_path, specifier) {
        Ok(resource) => resource,
        Err(bulk_error) => {
            let Some(fallback) = &options.xml_fallback else {
                return Err(bulk_error);
            };
            warn!(
                "bulk read of external store failed ({bulk_error}); \
                 falling back to XML export {fallback:?}"
            );
            let resource = lmf::load(fallback)?;
            select_lexicon(resource, specifier)?
        }
    };

    let imported = resource
        .lexicons
        .first()
        .ok_or_else(|| EditorError::not_found("lexicon", specifier))?;
    let imported_specifier = format!("{}:{}", imported.id, imported.version);
    editor.import_resource(&resource, options.record_history)?;
    editor.apply_import_overrides(&imported_specifier, &options.overrides)?;
    info!("imported {imported_specifier} from external store");
    Ok(())
}

/// Export the selected lexicons to a temporary WN-LMF file, remove any
/// matching lexicon versions from the external store, and import the
/// file into it.
pub fn commit_to_external(editor: &Editor, options: &ExternalCommitOptions) -> Result<()> {
    let scratch = tempfile::tempdir()?;
    let xml_path = scratch.path().join("export.xml");
    let export_options = ExportOptions {
        lexicons: options.lexicons.clone(),
        ..Default::default()
    };
    editor.export_lmf(&xml_path, &export_options)?;
    let resource = lmf::load(&xml_path)?;

    let external = db::connect(&options.db_path)?;
    db::check_schema_version(&external)?;
    db::init_db(&external)?;

    external.execute_batch("BEGIN")?;
    let outcome = commit_resource(&external, &resource);
    match outcome {
        Ok(()) => {
            external.execute_batch("COMMIT")?;
            info!(
                "committed {} lexicon(s) to external store {:?}",
                resource.lexicons.len(),
                options.db_path
            );
            Ok(())
        }
        Err(err) => {
            let _ = external.execute_batch("ROLLBACK");
            Err(err)
        }
    }
}

fn commit_resource(external: &Connection, resource: &lmf::LexicalResource) -> Result<()> {
    for lexicon in &resource.lexicons {
        // All versions of the bare id go; the store holds one version
        // per lexicon id.
        let removed = external.execute("DELETE FROM lexicons WHERE id = ?1", params![lexicon.id])?;
        if removed > 0 {
            info!(
                "replaced {}:{} in external store",
                lexicon.id, lexicon.version
            );
        }
    }
    importer::import_resource(external, resource, false)
}

/// Bulk path: open the external store read-only and build the resource
/// shape directly from its tables.
fn read_external_store(db_path: &std::path::Path, specifier: &str) -> Result<lmf::LexicalResource> {
    if !db_path.exists() {
        return Err(EditorError::Import(format!(
            "external store not found: {db_path:?}"
        )));
    }
    let external = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    if db::lexicon_rowid(&external, specifier)?.is_none() {
        return Err(EditorError::not_found("lexicon", specifier));
    }

    let lexicon_name = specifier.split(':').next().unwrap_or(specifier);
    let resource = exporter::build_resource(
        &external,
        &ExportOptions {
            lexicons: Some(vec![lexicon_name.to_string()]),
            ..Default::default()
        },
    )?;
    if resource.lexicons.is_empty() {
        return Err(EditorError::not_found("lexicon", specifier));
    }
    Ok(resource)
}

/// Narrow a parsed fallback document to the requested lexicon.
fn select_lexicon(resource: lmf::LexicalResource, specifier: &str) -> Result<lmf::LexicalResource> {
    let wanted = resource
        .lexicons
        .into_iter()
        .find(|l| l.id == specifier || format!("{}:{}", l.id, l.version) == specifier)
        .ok_or_else(|| EditorError::not_found("lexicon", specifier))?;
    Ok(lmf::LexicalResource {
        xmlns_dc: None,
        lexicons: vec![wanted],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::SynsetFilter;
    use crate::models::PartOfSpeech;

    fn populated_editor() -> Editor {
        let mut ed = Editor::open_in_memory().unwrap();
        ed.create_lexicon(
            "awn",
            "Arabic WordNet",
            "ar",
            "test@test.com",
            "MIT",
            "1.0",
            Default::default(),
        )
        .unwrap();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A large feline animal", Default::default())
            .unwrap();
        let entry = ed
            .create_entry("awn", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        ed.add_sense(&entry.id, &synset.id, Default::default()).unwrap();
        ed
    }

    #[test]
    fn test_commit_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let external_path = dir.path().join("external.db");

        let ed = populated_editor();
        commit_to_external(&ed, &ExternalCommitOptions::new(&external_path)).unwrap();

        // Round-trip into a fresh editor via the bulk path.
        let mut fresh = Editor::open_in_memory().unwrap();
        from_external(
            &mut fresh,
            "awn:1.0",
            &ExternalImportOptions::new(&external_path),
        )
        .unwrap();
        assert_eq!(fresh.get_lexicon("awn").unwrap().label, "Arabic WordNet");
        assert_eq!(
            fresh.find_synsets(&SynsetFilter::default()).unwrap().len(),
            1
        );
        assert_eq!(fresh.get_entry("awn-cat-n").unwrap().lemma, "cat");
    }

    #[test]
    fn test_commit_replaces_matching_version() {
        let dir = tempfile::tempdir().unwrap();
        let external_path = dir.path().join("external.db");

        let ed = populated_editor();
        commit_to_external(&ed, &ExternalCommitOptions::new(&external_path)).unwrap();
        // Second commit replaces rather than duplicates.
        commit_to_external(&ed, &ExternalCommitOptions::new(&external_path)).unwrap();

        let external = Connection::open(&external_path).unwrap();
        let count: i64 = external
            .query_row("SELECT COUNT(*) FROM lexicons", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_store_without_fallback_errors() {
        let mut ed = Editor::open_in_memory().unwrap();
        let err = from_external(
            &mut ed,
            "awn:1.0",
            &ExternalImportOptions::new("/nonexistent/wn.db"),
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::Import(_)));
    }

    #[test]
    fn test_xml_fallback_used_when_bulk_fails() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("fallback.xml");

        let ed = populated_editor();
        ed.export_lmf(&xml_path, &ExportOptions::default()).unwrap();

        let mut fresh = Editor::open_in_memory().unwrap();
        let mut options = ExternalImportOptions::new(dir.path().join("missing.db"));
        options.xml_fallback = Some(xml_path);
        from_external(&mut fresh, "awn:1.0", &options).unwrap();
        assert!(fresh.get_lexicon("awn").is_ok());
    }

    #[test]
    fn test_overrides_applied_after_import() {
        let dir = tempfile::tempdir().unwrap();
        let external_path = dir.path().join("external.db");
        let ed = populated_editor();
        commit_to_external(&ed, &ExternalCommitOptions::new(&external_path)).unwrap();

        let mut fresh = Editor::open_in_memory().unwrap();
        let mut options = ExternalImportOptions::new(&external_path);
        options.overrides.version = Some("2024".into());
        from_external(&mut fresh, "awn", &options).unwrap();
        assert_eq!(fresh.get_lexicon("awn").unwrap().version, "2024");
    }
}
