//! Lexicon management.

use rusqlite::params;
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{Lexicon, Metadata, Patch, metadata_to_json, parse_metadata};

/// Optional attributes for [`Editor::create_lexicon`].
#[derive(Debug, Clone, Default)]
pub struct LexiconOptions {
    pub url: Option<String>,
    pub citation: Option<String>,
    pub logo: Option<String>,
    pub metadata: Option<Metadata>,
}

/// Partial update for [`Editor::update_lexicon`]. `None` / `Patch::Keep`
/// fields leave the stored value unchanged; `Patch::Clear` nulls a
/// nullable field.
#[derive(Debug, Clone, Default)]
pub struct LexiconUpdate {
    pub label: Option<String>,
    pub email: Option<String>,
    pub license: Option<String>,
    pub url: Patch<String>,
    pub citation: Patch<String>,
    pub logo: Patch<String>,
    pub metadata: Patch<Metadata>,
}

impl Editor {
    /// Create a lexicon. Fails with [`EditorError::Duplicate`] when the
    /// `(id, version)` pair exists or when any lexicon already carries
    /// the same bare id; the editor forbids same-id multi-version
    /// coexistence.
    #[allow(clippy::too_many_arguments)]
    pub fn create_lexicon(
        &mut self,
        id: &str,
        label: &str,
        language: &str,
        email: &str,
        license: &str,
        version: &str,
        options: LexiconOptions,
    ) -> Result<Lexicon> {
        self.mutate(|ed| {
            let existing: Option<String> = {
                use rusqlite::OptionalExtension;
                ed.conn()
                    .query_row(
                        "SELECT version FROM lexicons WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?
            };
            if let Some(version_held) = existing {
                return Err(EditorError::Duplicate(format!(
                    "lexicon {id:?} already exists (version {version_held})"
                )));
            }

            let specifier = format!("{id}:{version}");
            ed.conn()
                .execute(
                    "INSERT INTO lexicons \
                     (specifier, id, label, language, email, license, version, \
                     url, citation, logo, metadata, modified) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
                    params![
                        specifier,
                        id,
                        label,
                        language,
                        email,
                        license,
                        version,
                        options.url,
                        options.citation,
                        options.logo,
                        metadata_to_json(options.metadata.as_ref()),
                    ],
                )
                .map_err(|e| {
                    if db::is_constraint_violation(&e) {
                        EditorError::Duplicate(format!(
                            "lexicon {id:?} version {version:?} already exists"
                        ))
                    } else {
                        e.into()
                    }
                })?;

            history::record_create(
                ed.conn(),
                "lexicon",
                id,
                Some(json!({"id": id, "label": label})),
            )?;
            ed.get_lexicon(id)
        })
    }

    /// Update mutable lexicon fields in place; any change sets the
    /// `modified` flag and records one history row per field.
    pub fn update_lexicon(&mut self, lexicon: &str, update: LexiconUpdate) -> Result<Lexicon> {
        self.mutate(|ed| {
            let row = db::lexicon_row(ed.conn(), lexicon)?
                .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;

            let mut changes: Vec<(&str, Value, Option<String>)> = Vec::new();
            if let Some(label) = update.label {
                changes.push(("label", Value::from(row.label.clone()), Some(label)));
            }
            if let Some(email) = update.email {
                changes.push(("email", Value::from(row.email.clone()), Some(email)));
            }
            if let Some(license) = update.license {
                changes.push(("license", Value::from(row.license.clone()), Some(license)));
            }
            push_patch(&mut changes, "url", &row.url, update.url);
            push_patch(&mut changes, "citation", &row.citation, update.citation);
            push_patch(&mut changes, "logo", &row.logo, update.logo);
            match update.metadata {
                Patch::Keep => {}
                Patch::Clear => changes.push((
                    "metadata",
                    row.metadata.clone().map(Value::from).unwrap_or(Value::Null),
                    None,
                )),
                Patch::Set(meta) => changes.push((
                    "metadata",
                    row.metadata.clone().map(Value::from).unwrap_or(Value::Null),
                    metadata_to_json(Some(&meta)),
                )),
            }

            let changed = !changes.is_empty();
            for (field, old_value, new_value) in changes {
                history::record_update(
                    ed.conn(),
                    "lexicon",
                    &row.id,
                    field,
                    old_value,
                    new_value.clone().map(Value::from).unwrap_or(Value::Null),
                )?;
                ed.conn().execute(
                    &format!("UPDATE lexicons SET {field} = ?1 WHERE rowid = ?2"),
                    params![new_value, row.rowid],
                )?;
            }
            if changed {
                ed.conn().execute(
                    "UPDATE lexicons SET modified = 1 WHERE rowid = ?1",
                    params![row.rowid],
                )?;
            }

            ed.get_lexicon(lexicon)
        })
    }

    /// Fetch a lexicon by bare id or `"id:version"` specifier.
    pub fn get_lexicon(&self, lexicon: &str) -> Result<Lexicon> {
        let row = db::lexicon_row(self.conn(), lexicon)?
            .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;
        Ok(row_to_lexicon(row))
    }

    /// All lexicons in the store.
    pub fn list_lexicons(&self) -> Result<Vec<Lexicon>> {
        let mut stmt = self.conn().prepare("SELECT rowid FROM lexicons")?;
        let rowids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        let mut lexicons = Vec::with_capacity(rowids.len());
        for rowid in rowids {
            if let Some(row) = db::lexicon_row_by_rowid(self.conn(), rowid)? {
                lexicons.push(row_to_lexicon(row));
            }
        }
        Ok(lexicons)
    }

    /// Delete a lexicon, cascading to every owned entity.
    pub fn delete_lexicon(&mut self, lexicon: &str) -> Result<()> {
        self.mutate(|ed| {
            let row = db::lexicon_row(ed.conn(), lexicon)?
                .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;
            history::record_delete(ed.conn(), "lexicon", &row.id, None)?;
            ed.conn()
                .execute("DELETE FROM lexicons WHERE rowid = ?1", params![row.rowid])?;
            Ok(())
        })
    }
}

fn push_patch(
    changes: &mut Vec<(&'static str, Value, Option<String>)>,
    field: &'static str,
    old: &Option<String>,
    patch: Patch<String>,
) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => changes.push((
            field,
            old.clone().map(Value::from).unwrap_or(Value::Null),
            None,
        )),
        Patch::Set(value) => changes.push((
            field,
            old.clone().map(Value::from).unwrap_or(Value::Null),
            Some(value),
        )),
    }
}

fn row_to_lexicon(row: db::LexiconRow) -> Lexicon {
    Lexicon {
        id: row.id,
        label: row.label,
        language: row.language,
        email: row.email,
        license: row.license,
        version: row.version,
        url: row.url,
        citation: row.citation,
        logo: row.logo,
        metadata: parse_metadata(row.metadata),
        modified: row.modified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryFilter;
    use crate::models::{EditOperation, PartOfSpeech};

    fn editor_with_lexicon() -> Editor {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon(
                "awn",
                "Arabic WordNet",
                "ar",
                "test@test.com",
                "https://opensource.org/licenses/MIT",
                "1.0",
                Default::default(),
            )
            .unwrap();
        editor
    }

    #[test]
    fn test_create_and_get() {
        let editor = editor_with_lexicon();
        let lexicon = editor.get_lexicon("awn").unwrap();
        assert_eq!(lexicon.label, "Arabic WordNet");
        assert_eq!(lexicon.specifier(), "awn:1.0");
        assert!(!lexicon.modified);
    }

    #[test]
    fn test_same_id_and_version_is_duplicate() {
        let mut editor = editor_with_lexicon();
        let err = editor
            .create_lexicon(
                "awn",
                "Duplicate",
                "ar",
                "a@b.c",
                "MIT",
                "1.0",
                Default::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EditorError::Duplicate(_)));
    }

    #[test]
    fn test_same_bare_id_other_version_is_blocked() {
        let mut editor = editor_with_lexicon();
        let err = editor
            .create_lexicon(
                "awn",
                "AWN v2",
                "ar",
                "a@b.c",
                "MIT",
                "2.0",
                Default::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EditorError::Duplicate(_)));
    }

    #[test]
    fn test_recreate_after_delete() {
        let mut editor = editor_with_lexicon();
        editor.delete_lexicon("awn").unwrap();
        let lexicon = editor
            .create_lexicon(
                "awn",
                "AWN v2",
                "ar",
                "a@b.c",
                "MIT",
                "2.0",
                Default::default(),
            )
            .unwrap();
        assert_eq!(lexicon.version, "2.0");
    }

    #[test]
    fn test_update_patch_semantics() {
        let mut editor = editor_with_lexicon();
        editor
            .update_lexicon(
                "awn",
                LexiconUpdate {
                    label: Some("Updated AWN".into()),
                    url: Patch::Set("https://example.com".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let lexicon = editor.get_lexicon("awn").unwrap();
        assert_eq!(lexicon.label, "Updated AWN");
        assert_eq!(lexicon.url.as_deref(), Some("https://example.com"));
        assert!(lexicon.modified);

        // Clear nulls the field; Keep leaves it alone.
        editor
            .update_lexicon(
                "awn",
                LexiconUpdate {
                    url: Patch::Clear,
                    ..Default::default()
                },
            )
            .unwrap();
        let lexicon = editor.get_lexicon("awn").unwrap();
        assert_eq!(lexicon.url, None);
        assert_eq!(lexicon.label, "Updated AWN");
    }

    #[test]
    fn test_update_records_per_field_history() {
        let mut editor = editor_with_lexicon();
        editor
            .update_lexicon(
                "awn",
                LexiconUpdate {
                    label: Some("X".into()),
                    email: Some("new@test.com".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let updates = editor
            .history(&HistoryFilter {
                entity_kind: Some("lexicon".into()),
                operation: Some(EditOperation::Update),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn test_specifier_access() {
        let mut editor = editor_with_lexicon();
        assert_eq!(editor.get_lexicon("awn:1.0").unwrap().id, "awn");
        assert!(matches!(
            editor.get_lexicon("awn:9.9").unwrap_err(),
            EditorError::NotFound { .. }
        ));
        editor.delete_lexicon("awn:1.0").unwrap();
        assert!(editor.list_lexicons().unwrap().is_empty());
    }

    #[test]
    fn test_delete_cascades_to_owned_entities() {
        let mut editor = editor_with_lexicon();
        let synset = editor
            .create_synset("awn", PartOfSpeech::N, "A test concept", Default::default())
            .unwrap();
        let entry = editor
            .create_entry("awn", "test", PartOfSpeech::N, Default::default())
            .unwrap();
        editor
            .add_sense(&entry.id, &synset.id, Default::default())
            .unwrap();

        editor.delete_lexicon("awn").unwrap();
        for table in ["synsets", "entries", "senses", "forms", "definitions"] {
            let count: i64 = editor
                .conn()
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} not empty after lexicon delete");
        }
    }
}
