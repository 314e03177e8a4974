//! Definition and example operations.
//!
//! Definitions and examples are ordered per owner by insertion; the
//! positional operations address them by that order.

use rusqlite::params;
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{Definition, Example, Metadata, metadata_to_json, parse_metadata};

/// Optional attributes for [`Editor::add_definition`].
#[derive(Debug, Clone, Default)]
pub struct DefinitionOptions {
    pub language: Option<String>,
    /// Id of the sense the definition text was sourced from.
    pub source_sense: Option<String>,
    pub metadata: Option<Metadata>,
}

impl Editor {
    /// Append a definition to a synset.
    pub fn add_definition(
        &mut self,
        synset_id: &str,
        text: &str,
        options: DefinitionOptions,
    ) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            let sense_rowid = match options.source_sense.as_deref() {
                Some(source_sense) => Some(
                    db::sense_rowid(ed.conn(), source_sense)?
                        .ok_or_else(|| EditorError::not_found("sense", source_sense))?,
                ),
                None => None,
            };

            ed.conn().execute(
                "INSERT INTO definitions \
                 (lexicon_rowid, synset_rowid, definition, language, sense_rowid, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.lexicon_rowid,
                    row.rowid,
                    text,
                    options.language,
                    sense_rowid,
                    metadata_to_json(options.metadata.as_ref()),
                ],
            )?;
            history::record_create(
                ed.conn(),
                "definition",
                synset_id,
                Some(json!({"text": text})),
            )?;
            Ok(())
        })
    }

    /// Replace the text of the definition at `index` (insertion order).
    pub fn update_definition(&mut self, synset_id: &str, index: usize, text: &str) -> Result<()> {
        self.mutate(|ed| {
            let (rowid, old_text) = ed.definition_at(synset_id, index)?;
            history::record_update(
                ed.conn(),
                "definition",
                synset_id,
                "text",
                old_text.map(Value::from).unwrap_or(Value::Null),
                Value::from(text),
            )?;
            ed.conn().execute(
                "UPDATE definitions SET definition = ?1 WHERE rowid = ?2",
                params![text, rowid],
            )?;
            Ok(())
        })
    }

    /// Remove the definition at `index`.
    pub fn remove_definition(&mut self, synset_id: &str, index: usize) -> Result<()> {
        self.mutate(|ed| {
            let (rowid, old_text) = ed.definition_at(synset_id, index)?;
            history::record_delete(
                ed.conn(),
                "definition",
                synset_id,
                Some(json!({"text": old_text})),
            )?;
            ed.conn()
                .execute("DELETE FROM definitions WHERE rowid = ?1", params![rowid])?;
            Ok(())
        })
    }

    fn definition_at(&self, synset_id: &str, index: usize) -> Result<(i64, Option<String>)> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
        let mut stmt = self.conn().prepare(
            "SELECT rowid, definition FROM definitions \
             WHERE synset_rowid = ?1 ORDER BY rowid",
        )?;
        let definitions: Vec<(i64, Option<String>)> = stmt
            .query_map(params![row.rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        definitions
            .get(index)
            .cloned()
            .ok_or(EditorError::IndexOutOfRange {
                what: "definition",
                index,
                len: definitions.len(),
            })
    }

    /// All definitions of a synset in insertion order.
    pub fn get_definitions(&self, synset_id: &str) -> Result<Vec<Definition>> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
        let mut stmt = self.conn().prepare(
            "SELECT d.definition, d.language, s.id, d.metadata \
             FROM definitions d \
             LEFT JOIN senses s ON d.sense_rowid = s.rowid \
             WHERE d.synset_rowid = ?1 ORDER BY d.rowid",
        )?;
        let definitions = stmt
            .query_map(params![row.rowid], |r| {
                Ok(Definition {
                    text: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    language: r.get(1)?,
                    source_sense: r.get(2)?,
                    metadata: parse_metadata(r.get(3)?),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(definitions)
    }

    /// Append a usage example to a synset.
    pub fn add_synset_example(
        &mut self,
        synset_id: &str,
        text: &str,
        language: Option<&str>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
            ed.conn().execute(
                "INSERT INTO synset_examples \
                 (lexicon_rowid, synset_rowid, example, language, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.lexicon_rowid,
                    row.rowid,
                    text,
                    language,
                    metadata_to_json(metadata.as_ref()),
                ],
            )?;
            history::record_create(ed.conn(), "example", synset_id, Some(json!({"text": text})))?;
            Ok(())
        })
    }

    /// Remove the synset example at `index`.
    pub fn remove_synset_example(&mut self, synset_id: &str, index: usize) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
            let (rowid, old_text) = example_at(
                ed,
                "synset_examples",
                "synset_rowid",
                row.rowid,
                index,
            )?;
            history::record_delete(
                ed.conn(),
                "example",
                synset_id,
                Some(json!({"text": old_text})),
            )?;
            ed.conn().execute(
                "DELETE FROM synset_examples WHERE rowid = ?1",
                params![rowid],
            )?;
            Ok(())
        })
    }

    /// All examples of a synset in insertion order.
    pub fn get_synset_examples(&self, synset_id: &str) -> Result<Vec<Example>> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
        self.examples_of("synset_examples", "synset_rowid", row.rowid)
    }

    /// Append a usage example to a sense.
    pub fn add_sense_example(
        &mut self,
        sense_id: &str,
        text: &str,
        language: Option<&str>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.mutate(|ed| {
            let row = db::sense_row(ed.conn(), sense_id)?
                .ok_or_else(|| EditorError::not_found("sense", sense_id))?;
            ed.conn().execute(
                "INSERT INTO sense_examples \
                 (lexicon_rowid, sense_rowid, example, language, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.lexicon_rowid,
                    row.rowid,
                    text,
                    language,
                    metadata_to_json(metadata.as_ref()),
                ],
            )?;
            history::record_create(ed.conn(), "example", sense_id, Some(json!({"text": text})))?;
            Ok(())
        })
    }

    /// Remove the sense example at `index`.
    pub fn remove_sense_example(&mut self, sense_id: &str, index: usize) -> Result<()> {
        self.mutate(|ed| {
            let row = db::sense_row(ed.conn(), sense_id)?
                .ok_or_else(|| EditorError::not_found("sense", sense_id))?;
            let (rowid, old_text) =
                example_at(ed, "sense_examples", "sense_rowid", row.rowid, index)?;
            history::record_delete(
                ed.conn(),
                "example",
                sense_id,
                Some(json!({"text": old_text})),
            )?;
            ed.conn()
                .execute("DELETE FROM sense_examples WHERE rowid = ?1", params![rowid])?;
            Ok(())
        })
    }

    /// All examples of a sense in insertion order.
    pub fn get_sense_examples(&self, sense_id: &str) -> Result<Vec<Example>> {
        let row = db::sense_row(self.conn(), sense_id)?
            .ok_or_else(|| EditorError::not_found("sense", sense_id))?;
        self.examples_of("sense_examples", "sense_rowid", row.rowid)
    }

    fn examples_of(&self, table: &str, owner_column: &str, owner_rowid: i64) -> Result<Vec<Example>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT example, language, metadata FROM {table} \
             WHERE {owner_column} = ?1 ORDER BY rowid"
        ))?;
        let examples = stmt
            .query_map(params![owner_rowid], |r| {
                Ok(Example {
                    text: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    language: r.get(1)?,
                    metadata: parse_metadata(r.get(2)?),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(examples)
    }
}

fn example_at(
    editor: &Editor,
    table: &str,
    owner_column: &str,
    owner_rowid: i64,
    index: usize,
) -> Result<(i64, Option<String>)> {
    let mut stmt = editor.conn().prepare(&format!(
        "SELECT rowid, example FROM {table} WHERE {owner_column} = ?1 ORDER BY rowid"
    ))?;
    let examples: Vec<(i64, Option<String>)> = stmt
        .query_map(params![owner_rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;
    examples
        .get(index)
        .cloned()
        .ok_or(EditorError::IndexOutOfRange {
            what: "example",
            index,
            len: examples.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartOfSpeech;

    fn editor_with_synset() -> (Editor, String) {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon("t", "T", "en", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        let synset = editor
            .create_synset("t", PartOfSpeech::N, "The first definition", Default::default())
            .unwrap();
        (editor, synset.id)
    }

    #[test]
    fn test_definitions_are_ordered_by_insertion() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.add_definition(&synset_id, "The second definition", Default::default())
            .unwrap();
        let definitions = ed.get_definitions(&synset_id).unwrap();
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].text, "The first definition");
        assert_eq!(definitions[1].text, "The second definition");
    }

    #[test]
    fn test_update_and_remove_by_index() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.add_definition(&synset_id, "The second definition", Default::default())
            .unwrap();
        ed.update_definition(&synset_id, 1, "A replacement").unwrap();
        assert_eq!(ed.get_definitions(&synset_id).unwrap()[1].text, "A replacement");

        ed.remove_definition(&synset_id, 0).unwrap();
        let definitions = ed.get_definitions(&synset_id).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].text, "A replacement");
    }

    #[test]
    fn test_out_of_range_index_is_distinct_error() {
        let (mut ed, synset_id) = editor_with_synset();
        let err = ed.update_definition(&synset_id, 5, "nope").unwrap_err();
        assert!(matches!(
            err,
            EditorError::IndexOutOfRange {
                what: "definition",
                index: 5,
                len: 1
            }
        ));
        let err = ed.remove_synset_example(&synset_id, 0).unwrap_err();
        assert!(matches!(err, EditorError::IndexOutOfRange { .. }));
    }

    #[test]
    fn test_synset_and_sense_examples() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.add_synset_example(&synset_id, "Used in a sentence.", Some("en"), None)
            .unwrap();
        let examples = ed.get_synset_examples(&synset_id).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].language.as_deref(), Some("en"));

        let entry = ed
            .create_entry("t", "word", PartOfSpeech::N, Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry.id, &synset_id, Default::default()).unwrap();
        ed.add_sense_example(&sense.id, "A sense-level example.", None, None)
            .unwrap();
        assert_eq!(ed.get_sense_examples(&sense.id).unwrap().len(), 1);
        ed.remove_sense_example(&sense.id, 0).unwrap();
        assert!(ed.get_sense_examples(&sense.id).unwrap().is_empty());
    }

    #[test]
    fn test_definition_with_source_sense() {
        let (mut ed, synset_id) = editor_with_synset();
        let entry = ed
            .create_entry("t", "word", PartOfSpeech::N, Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry.id, &synset_id, Default::default()).unwrap();
        ed.add_definition(
            &synset_id,
            "Definition sourced from a sense",
            DefinitionOptions {
                source_sense: Some(sense.id.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        let definitions = ed.get_definitions(&synset_id).unwrap();
        assert_eq!(definitions[1].source_sense.as_deref(), Some(sense.id.as_str()));
    }
}
