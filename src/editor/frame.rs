//! Syntactic behaviour (subcategorization frame) operations.

use rusqlite::{OptionalExtension, params};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::models::SyntacticBehaviour;

impl Editor {
    /// Register a subcategorization frame in a lexicon and associate it
    /// with the given senses. Frames are unique per `(lexicon, frame)`;
    /// re-adding an existing frame extends its sense set.
    pub fn add_syntactic_behaviour(
        &mut self,
        lexicon: &str,
        frame: &str,
        id: Option<&str>,
        sense_ids: &[String],
    ) -> Result<()> {
        self.mutate(|ed| {
            let lex_rowid = db::lexicon_rowid(ed.conn(), lexicon)?
                .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;

            ed.conn().execute(
                "INSERT OR IGNORE INTO syntactic_behaviours (id, lexicon_rowid, frame) \
                 VALUES (?1, ?2, ?3)",
                params![id, lex_rowid, frame],
            )?;
            let sb_rowid: i64 = ed.conn().query_row(
                "SELECT rowid FROM syntactic_behaviours \
                 WHERE lexicon_rowid = ?1 AND frame = ?2",
                params![lex_rowid, frame],
                |r| r.get(0),
            )?;

            for sense_id in sense_ids {
                let sense_rowid = db::sense_rowid(ed.conn(), sense_id)?
                    .ok_or_else(|| EditorError::not_found("sense", sense_id))?;
                let exists: Option<i64> = ed
                    .conn()
                    .query_row(
                        "SELECT 1 FROM syntactic_behaviour_senses \
                         WHERE syntactic_behaviour_rowid = ?1 AND sense_rowid = ?2",
                        params![sb_rowid, sense_rowid],
                        |r| r.get(0),
                    )
                    .optional()?;
                if exists.is_none() {
                    ed.conn().execute(
                        "INSERT INTO syntactic_behaviour_senses \
                         (syntactic_behaviour_rowid, sense_rowid) VALUES (?1, ?2)",
                        params![sb_rowid, sense_rowid],
                    )?;
                }
            }
            Ok(())
        })
    }

    /// All frames of a lexicon with their associated sense ids.
    pub fn get_syntactic_behaviours(&self, lexicon: &str) -> Result<Vec<SyntacticBehaviour>> {
        let lex_rowid = db::lexicon_rowid(self.conn(), lexicon)?
            .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;

        let frames: Vec<(i64, Option<String>, String)> = {
            let mut stmt = self.conn().prepare(
                "SELECT rowid, id, frame FROM syntactic_behaviours \
                 WHERE lexicon_rowid = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map(params![lex_rowid], |r| {
                    Ok((r.get(0)?, r.get(1)?, r.get(2)?))
                })?
                .collect::<std::result::Result<_, _>>()?;
            rows
        };

        let mut result = Vec::with_capacity(frames.len());
        for (sb_rowid, id, frame) in frames {
            let mut stmt = self.conn().prepare(
                "SELECT s.id FROM syntactic_behaviour_senses sbs \
                 JOIN senses s ON sbs.sense_rowid = s.rowid \
                 WHERE sbs.syntactic_behaviour_rowid = ?1",
            )?;
            let senses: Vec<String> = stmt
                .query_map(params![sb_rowid], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            result.push(SyntacticBehaviour { id, frame, senses });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartOfSpeech;

    #[test]
    fn test_add_and_list_frames() {
        let mut ed = Editor::open_in_memory().unwrap();
        ed.create_lexicon("t", "T", "en", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        let synset = ed
            .create_synset("t", PartOfSpeech::V, "To consume food", Default::default())
            .unwrap();
        let entry = ed
            .create_entry("t", "eat", PartOfSpeech::V, Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry.id, &synset.id, Default::default()).unwrap();

        ed.add_syntactic_behaviour(
            "t",
            "Somebody %s something",
            Some("t-sb-1"),
            &[sense.id.clone()],
        )
        .unwrap();
        // Re-adding the same frame is idempotent for the sense set.
        ed.add_syntactic_behaviour("t", "Somebody %s something", None, &[sense.id.clone()])
            .unwrap();

        let frames = ed.get_syntactic_behaviours("t").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame, "Somebody %s something");
        assert_eq!(frames[0].id.as_deref(), Some("t-sb-1"));
        assert_eq!(frames[0].senses, vec![sense.id]);
    }

    #[test]
    fn test_unknown_sense_refused() {
        let mut ed = Editor::open_in_memory().unwrap();
        ed.create_lexicon("t", "T", "en", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        let err = ed
            .add_syntactic_behaviour("t", "Somebody %s", None, &["t-missing-01".to_string()])
            .unwrap_err();
        assert!(matches!(err, EditorError::NotFound { .. }));
    }
}
