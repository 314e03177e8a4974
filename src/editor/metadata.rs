//! The untyped metadata API, dispatching on entity kind.

use rusqlite::{OptionalExtension, params};
use serde_json::Value;

use super::Editor;
use crate::error::{EditorError, Result};
use crate::models::{EntityKind, Metadata, parse_metadata};

/// Map an entity kind to its table; all four use `id` as the business
/// key column.
fn resolve_entity_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Lexicon => "lexicons",
        EntityKind::Synset => "synsets",
        EntityKind::Entry => "entries",
        EntityKind::Sense => "senses",
    }
}

impl Editor {
    /// Set one metadata key on an entity. A `Value::Null` removes the
    /// key; removing the last key clears the column.
    pub fn set_metadata(
        &mut self,
        kind: EntityKind,
        entity_id: &str,
        key: &str,
        value: Value,
    ) -> Result<()> {
        self.mutate(|ed| {
            let table = resolve_entity_table(kind);
            let row: Option<(i64, Option<String>)> = ed
                .conn()
                .query_row(
                    &format!("SELECT rowid, metadata FROM {table} WHERE id = ?1"),
                    params![entity_id],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;
            let Some((rowid, raw)) = row else {
                return Err(EditorError::not_found(kind.as_str(), entity_id));
            };

            let mut meta = parse_metadata(raw).unwrap_or_default();
            if value.is_null() {
                meta.remove(key);
            } else {
                meta.insert(key.to_string(), value);
            }

            let serialized = if meta.is_empty() {
                None
            } else {
                serde_json::to_string(&meta).ok()
            };
            ed.conn().execute(
                &format!("UPDATE {table} SET metadata = ?1 WHERE rowid = ?2"),
                params![serialized, rowid],
            )?;
            Ok(())
        })
    }

    /// The full metadata dict of an entity; empty when none is stored.
    pub fn get_metadata(&self, kind: EntityKind, entity_id: &str) -> Result<Metadata> {
        let table = resolve_entity_table(kind);
        let raw: Option<Option<String>> = self
            .conn()
            .query_row(
                &format!("SELECT metadata FROM {table} WHERE id = ?1"),
                params![entity_id],
                |r| r.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(parse_metadata(raw).unwrap_or_default()),
            None => Err(EditorError::not_found(kind.as_str(), entity_id)),
        }
    }

    /// Set the reserved `confidenceScore` metadata key.
    pub fn set_confidence(&mut self, kind: EntityKind, entity_id: &str, score: f64) -> Result<()> {
        self.set_metadata(kind, entity_id, "confidenceScore", Value::from(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartOfSpeech;
    use serde_json::json;

    fn editor_with_synset() -> (Editor, String) {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon("t", "T", "en", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        let synset = editor
            .create_synset("t", PartOfSpeech::N, "A test concept", Default::default())
            .unwrap();
        (editor, synset.id)
    }

    #[test]
    fn test_set_get_and_remove() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.set_metadata(EntityKind::Synset, &synset_id, "note", json!("reviewed"))
            .unwrap();
        ed.set_metadata(EntityKind::Synset, &synset_id, "weight", json!(2))
            .unwrap();

        let meta = ed.get_metadata(EntityKind::Synset, &synset_id).unwrap();
        assert_eq!(meta.get("note"), Some(&json!("reviewed")));
        assert_eq!(meta.get("weight"), Some(&json!(2)));

        // Null removes the key; absent metadata reads as empty.
        ed.set_metadata(EntityKind::Synset, &synset_id, "note", Value::Null)
            .unwrap();
        ed.set_metadata(EntityKind::Synset, &synset_id, "weight", Value::Null)
            .unwrap();
        assert!(ed.get_metadata(EntityKind::Synset, &synset_id).unwrap().is_empty());
    }

    #[test]
    fn test_set_confidence_reserved_key() {
        let (mut ed, synset_id) = editor_with_synset();
        let entry = ed
            .create_entry("t", "word", PartOfSpeech::N, Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry.id, &synset_id, Default::default()).unwrap();
        ed.set_confidence(EntityKind::Sense, &sense.id, 0.25).unwrap();
        let meta = ed.get_metadata(EntityKind::Sense, &sense.id).unwrap();
        assert_eq!(meta.get("confidenceScore"), Some(&json!(0.25)));
    }

    #[test]
    fn test_missing_entity() {
        let (mut ed, _) = editor_with_synset();
        assert!(matches!(
            ed.get_metadata(EntityKind::Entry, "t-missing-n").unwrap_err(),
            EditorError::NotFound { .. }
        ));
        assert!(matches!(
            ed.set_metadata(EntityKind::Lexicon, "missing", "k", json!(1))
                .unwrap_err(),
            EditorError::NotFound { .. }
        ));
    }
}
