//! Interlingual Index operations.
//!
//! A synset carries at most one real ILI binding or at most one proposed
//! ILI, never both. The operations here are exactly the transitions of
//! that state machine.

use rusqlite::{OptionalExtension, params};
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{Ili, Metadata, ProposedIli, metadata_to_json, parse_metadata};

impl Editor {
    /// Bind a synset to an ILI entry, creating the entry as
    /// `presupposed` when absent. Refuses when the synset already has a
    /// real or proposed binding.
    pub fn link_ili(&mut self, synset_id: &str, ili_id: &str) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            if row.ili_rowid.is_some() {
                return Err(EditorError::Validation(format!(
                    "synset {synset_id} already has an ILI mapping"
                )));
            }
            if ed.has_proposed_ili(row.rowid)? {
                return Err(EditorError::Validation(format!(
                    "synset {synset_id} already has a proposed ILI"
                )));
            }

            let ili_rowid = db::get_or_create_ili(ed.conn(), ili_id, "presupposed")?;
            ed.conn().execute(
                "UPDATE synsets SET ili_rowid = ?1 WHERE rowid = ?2",
                params![ili_rowid, row.rowid],
            )?;
            history::record_update(
                ed.conn(),
                "synset",
                synset_id,
                "ili",
                Value::Null,
                Value::from(ili_id),
            )?;
            Ok(())
        })
    }

    /// Clear both the real and the proposed ILI binding of a synset.
    pub fn unlink_ili(&mut self, synset_id: &str) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            history::record_update(
                ed.conn(),
                "synset",
                synset_id,
                "ili",
                row.ili_rowid.map(Value::from).unwrap_or(Value::Null),
                Value::Null,
            )?;
            ed.conn().execute(
                "UPDATE synsets SET ili_rowid = NULL WHERE rowid = ?1",
                params![row.rowid],
            )?;
            ed.conn().execute(
                "DELETE FROM proposed_ilis WHERE synset_rowid = ?1",
                params![row.rowid],
            )?;
            Ok(())
        })
    }

    /// Attach a proposed-ILI definition (at least 20 characters) to a
    /// synset with no existing binding. The synset then reports
    /// `ili = "in"`.
    pub fn propose_ili(
        &mut self,
        synset_id: &str,
        definition: &str,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            if row.ili_rowid.is_some() {
                return Err(EditorError::Validation(format!(
                    "synset {synset_id} already has an ILI mapping"
                )));
            }
            if definition.chars().count() < 20 {
                return Err(EditorError::Validation(
                    "ILI definition must be at least 20 characters".into(),
                ));
            }
            if ed.has_proposed_ili(row.rowid)? {
                return Err(EditorError::Validation(format!(
                    "synset {synset_id} already has a proposed ILI"
                )));
            }

            ed.conn().execute(
                "INSERT INTO proposed_ilis (synset_rowid, definition, metadata) \
                 VALUES (?1, ?2, ?3)",
                params![row.rowid, definition, metadata_to_json(metadata.as_ref())],
            )?;
            history::record_create(
                ed.conn(),
                "ili",
                synset_id,
                Some(json!({"definition": definition, "type": "proposed"})),
            )?;
            Ok(())
        })
    }

    /// The real ILI binding of a synset, if any.
    pub fn get_ili(&self, synset_id: &str) -> Result<Option<Ili>> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
        let Some(ili_rowid) = row.ili_rowid else {
            return Ok(None);
        };

        let ili = self
            .conn()
            .query_row(
                "SELECT i.id, s.status, i.definition, i.metadata \
                 FROM ilis i JOIN ili_statuses s ON i.status_rowid = s.rowid \
                 WHERE i.rowid = ?1",
                params![ili_rowid],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, Option<String>>(2)?,
                        r.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, status, definition, metadata)) = ili else {
            return Ok(None);
        };
        Ok(Some(Ili {
            id,
            status: status.parse()?,
            definition,
            metadata: parse_metadata(metadata),
        }))
    }

    /// The proposed ILI of a synset, if any.
    pub fn get_proposed_ili(&self, synset_id: &str) -> Result<Option<ProposedIli>> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
        let proposed = self
            .conn()
            .query_row(
                "SELECT definition, metadata FROM proposed_ilis WHERE synset_rowid = ?1",
                params![row.rowid],
                |r| {
                    Ok((
                        r.get::<_, Option<String>>(0)?,
                        r.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;
        Ok(proposed.map(|(definition, metadata)| ProposedIli {
            synset_id: synset_id.to_string(),
            definition: definition.unwrap_or_default(),
            metadata: parse_metadata(metadata),
        }))
    }

    fn has_proposed_ili(&self, synset_rowid: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM proposed_ilis WHERE synset_rowid = ?1",
                params![synset_rowid],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IliStatus, PartOfSpeech};

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
    fn test_link_creates_presupposed_ili() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.link_ili(&synset_id, "i90001").unwrap();
        let ili = ed.get_ili(&synset_id).unwrap().unwrap();
        assert_eq!(ili.id, "i90001");
        assert_eq!(ili.status, IliStatus::Presupposed);
        assert_eq!(ed.get_synset(&synset_id).unwrap().ili.as_deref(), Some("i90001"));
    }

    #[test]
    fn test_double_binding_refused() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.link_ili(&synset_id, "i90001").unwrap();
        assert!(matches!(
            ed.link_ili(&synset_id, "i90002").unwrap_err(),
            EditorError::Validation(_)
        ));
        assert!(matches!(
            ed.propose_ili(&synset_id, "A definition long enough to pass", None)
                .unwrap_err(),
            EditorError::Validation(_)
        ));
    }

    #[test]
    fn test_proposed_blocks_link() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.propose_ili(&synset_id, "A definition long enough to pass", None)
            .unwrap();
        assert!(matches!(
            ed.link_ili(&synset_id, "i90001").unwrap_err(),
            EditorError::Validation(_)
        ));
    }

    #[test]
    fn test_proposal_length_boundary() {
        let (mut ed, synset_id) = editor_with_synset();
        // 19 characters fails, 20 succeeds.
        let nineteen = "a".repeat(19);
        assert!(matches!(
            ed.propose_ili(&synset_id, &nineteen, None).unwrap_err(),
            EditorError::Validation(_)
        ));
        let twenty = "a".repeat(20);
        ed.propose_ili(&synset_id, &twenty, None).unwrap();
        assert_eq!(ed.get_synset(&synset_id).unwrap().ili.as_deref(), Some("in"));
        let proposed = ed.get_proposed_ili(&synset_id).unwrap().unwrap();
        assert_eq!(proposed.definition, twenty);
    }

    #[test]
    fn test_unlink_clears_both_bindings() {
        let (mut ed, synset_id) = editor_with_synset();
        ed.propose_ili(&synset_id, "A definition long enough to pass", None)
            .unwrap();
        ed.unlink_ili(&synset_id).unwrap();
        assert!(ed.get_proposed_ili(&synset_id).unwrap().is_none());
        assert_eq!(ed.get_synset(&synset_id).unwrap().ili, None);

        // After clearing, a real link works again.
        ed.link_ili(&synset_id, "i90001").unwrap();
        ed.unlink_ili(&synset_id).unwrap();
        assert!(ed.get_ili(&synset_id).unwrap().is_none());
    }
}
