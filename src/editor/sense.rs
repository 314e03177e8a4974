//! Sense operations.

use rusqlite::{OptionalExtension, params};
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{AdjPosition, Metadata, Sense, metadata_to_json, parse_metadata};

/// Optional attributes for [`Editor::add_sense`].
#[derive(Debug, Clone, Default)]
pub struct SenseOptions {
    /// Explicit id; must begin with the owning lexicon's prefix.
    pub id: Option<String>,
    /// `false` marks the sense unlexicalized.
    pub lexicalized: Option<bool>,
    pub adjposition: Option<AdjPosition>,
    pub metadata: Option<Metadata>,
}

/// Conjunctive filters for [`Editor::find_senses`].
#[derive(Debug, Clone, Default)]
pub struct SenseFilter {
    pub entry: Option<String>,
    pub synset: Option<String>,
    pub lexicon: Option<String>,
}

impl Editor {
    /// Bind an entry to a synset. Refuses when the `(entry, synset)`
    /// pair already has a sense. Ranks are assigned max+1 on both axes,
    /// and a previously unlexicalized target synset becomes lexicalized.
    pub fn add_sense(
        &mut self,
        entry_id: &str,
        synset_id: &str,
        options: SenseOptions,
    ) -> Result<Sense> {
        self.mutate(|ed| {
            let entry_row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;
            let synset_row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            let duplicate: Option<String> = ed
                .conn()
                .query_row(
                    "SELECT id FROM senses WHERE entry_rowid = ?1 AND synset_rowid = ?2",
                    params![entry_row.rowid, synset_row.rowid],
                    |r| r.get(0),
                )
                .optional()?;
            if duplicate.is_some() {
                return Err(EditorError::Duplicate(format!(
                    "entry {entry_id} already has a sense for synset {synset_id}"
                )));
            }

            let max_entry_rank: Option<i64> = ed.conn().query_row(
                "SELECT MAX(entry_rank) FROM senses WHERE entry_rowid = ?1",
                params![entry_row.rowid],
                |r| r.get(0),
            )?;
            let entry_rank = max_entry_rank.unwrap_or(0) + 1;

            let max_synset_rank: Option<i64> = ed.conn().query_row(
                "SELECT MAX(synset_rank) FROM senses WHERE synset_rowid = ?1",
                params![synset_row.rowid],
                |r| r.get(0),
            )?;
            let synset_rank = max_synset_rank.unwrap_or(0) + 1;

            let id = match options.id {
                Some(id) => {
                    let lexicon_id: String = ed.conn().query_row(
                        "SELECT id FROM lexicons WHERE rowid = ?1",
                        params![entry_row.lexicon_rowid],
                        |r| r.get(0),
                    )?;
                    if !id.starts_with(&format!("{lexicon_id}-")) {
                        return Err(EditorError::Validation(format!(
                            "ID must start with lexicon prefix: {lexicon_id}-"
                        )));
                    }
                    id
                }
                None => generate_sense_id(entry_id, synset_id, entry_rank),
            };

            if db::sense_rowid(ed.conn(), &id)?.is_some() {
                return Err(EditorError::Duplicate(format!(
                    "sense already exists: {id:?}"
                )));
            }

            ed.conn().execute(
                "INSERT INTO senses \
                 (id, lexicon_rowid, entry_rowid, entry_rank, synset_rowid, synset_rank, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    entry_row.lexicon_rowid,
                    entry_row.rowid,
                    entry_rank,
                    synset_row.rowid,
                    synset_rank,
                    metadata_to_json(options.metadata.as_ref()),
                ],
            )?;
            let sense_rowid = ed.conn().last_insert_rowid();

            if options.lexicalized == Some(false) {
                ed.conn().execute(
                    "INSERT INTO unlexicalized_senses (sense_rowid) VALUES (?1)",
                    params![sense_rowid],
                )?;
            }

            if let Some(adjposition) = options.adjposition {
                ed.conn().execute(
                    "INSERT INTO adjpositions (sense_rowid, adjposition) VALUES (?1, ?2)",
                    params![sense_rowid, adjposition.as_str()],
                )?;
            }

            // A synset with a sense is lexicalized by definition.
            ed.conn().execute(
                "DELETE FROM unlexicalized_synsets WHERE synset_rowid = ?1",
                params![synset_row.rowid],
            )?;

            history::record_create(
                ed.conn(),
                "sense",
                &id,
                Some(json!({"entry_id": entry_id, "synset_id": synset_id})),
            )?;

            ed.build_sense_model(&id)
        })
    }

    /// Remove a sense, cascading to its relations (with inverse cleanup)
    /// and sense→synset relations. An emptied parent synset becomes
    /// unlexicalized.
    pub fn remove_sense(&mut self, sense_id: &str) -> Result<()> {
        self.mutate(|ed| ed.remove_sense_internal(sense_id))
    }

    pub(crate) fn remove_sense_internal(&mut self, sense_id: &str) -> Result<()> {
        let row = db::sense_row(self.conn(), sense_id)?
            .ok_or_else(|| EditorError::not_found("sense", sense_id))?;

        self.cleanup_sense_relations(row.rowid)?;
        self.conn().execute(
            "DELETE FROM sense_synset_relations WHERE source_rowid = ?1",
            params![row.rowid],
        )?;

        history::record_delete(self.conn(), "sense", sense_id, None)?;
        // CASCADE covers examples, counts, adjpositions, frame links.
        self.conn()
            .execute("DELETE FROM senses WHERE rowid = ?1", params![row.rowid])?;

        let remaining: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM senses WHERE synset_rowid = ?1",
            params![row.synset_rowid],
            |r| r.get(0),
        )?;
        if remaining == 0 {
            self.conn().execute(
                "INSERT OR IGNORE INTO unlexicalized_synsets (synset_rowid) VALUES (?1)",
                params![row.synset_rowid],
            )?;
        }
        Ok(())
    }

    /// Reassign a sense to another synset, preserving its relations.
    /// Refuses when the entry already has a sense in the target. The
    /// target becomes lexicalized; the source becomes unlexicalized when
    /// emptied.
    pub fn move_sense(&mut self, sense_id: &str, target_synset_id: &str) -> Result<Sense> {
        self.mutate(|ed| {
            let sense_row = db::sense_row(ed.conn(), sense_id)?
                .ok_or_else(|| EditorError::not_found("sense", sense_id))?;
            let target_row = db::synset_row(ed.conn(), target_synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", target_synset_id))?;

            let duplicate: Option<String> = ed
                .conn()
                .query_row(
                    "SELECT id FROM senses WHERE entry_rowid = ?1 AND synset_rowid = ?2",
                    params![sense_row.entry_rowid, target_row.rowid],
                    |r| r.get(0),
                )
                .optional()?;
            if duplicate.is_some() {
                return Err(EditorError::Duplicate(
                    "entry already has a sense in target synset".into(),
                ));
            }

            ed.conn().execute(
                "UPDATE senses SET synset_rowid = ?1 WHERE rowid = ?2",
                params![target_row.rowid, sense_row.rowid],
            )?;
            ed.conn().execute(
                "DELETE FROM unlexicalized_synsets WHERE synset_rowid = ?1",
                params![target_row.rowid],
            )?;

            let remaining: i64 = ed.conn().query_row(
                "SELECT COUNT(*) FROM senses WHERE synset_rowid = ?1",
                params![sense_row.synset_rowid],
                |r| r.get(0),
            )?;
            if remaining == 0 {
                ed.conn().execute(
                    "INSERT OR IGNORE INTO unlexicalized_synsets (synset_rowid) VALUES (?1)",
                    params![sense_row.synset_rowid],
                )?;
            }

            history::record_update(
                ed.conn(),
                "sense",
                sense_id,
                "synset_rowid",
                Value::from(sense_row.synset_rowid),
                Value::from(target_row.rowid),
            )?;

            ed.build_sense_model(sense_id)
        })
    }

    /// Reassign entry ranks 1..n following the supplied order, which
    /// must contain exactly the entry's current sense ids.
    pub fn reorder_senses(&mut self, entry_id: &str, sense_id_order: &[String]) -> Result<()> {
        self.mutate(|ed| {
            let entry_row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

            let current: Vec<String> = {
                let mut stmt = ed.conn().prepare(
                    "SELECT id FROM senses WHERE entry_rowid = ?1 ORDER BY entry_rank",
                )?;
                let ids = stmt
                    .query_map(params![entry_row.rowid], |r| r.get(0))?
                    .collect::<std::result::Result<_, _>>()?;
                ids
            };

            let current_set: std::collections::HashSet<&str> =
                current.iter().map(String::as_str).collect();
            let supplied_set: std::collections::HashSet<&str> =
                sense_id_order.iter().map(String::as_str).collect();
            if current_set != supplied_set || current.len() != sense_id_order.len() {
                return Err(EditorError::Validation(
                    "sense order must contain exactly the entry's sense IDs".into(),
                ));
            }

            for (rank, sense_id) in sense_id_order.iter().enumerate() {
                ed.conn().execute(
                    "UPDATE senses SET entry_rank = ?1 WHERE id = ?2",
                    params![rank as i64 + 1, sense_id],
                )?;
            }
            Ok(())
        })
    }

    /// Fetch a sense by id.
    pub fn get_sense(&self, sense_id: &str) -> Result<Sense> {
        self.build_sense_model(sense_id)
    }

    /// Find senses matching every given filter, ordered by entry rank.
    pub fn find_senses(&self, filter: &SenseFilter) -> Result<Vec<Sense>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(entry) = &filter.entry {
            clauses.push("s.entry_rowid = (SELECT rowid FROM entries WHERE id = ?)".into());
            params_vec.push(entry.clone());
        }
        if let Some(synset) = &filter.synset {
            clauses.push("s.synset_rowid = (SELECT rowid FROM synsets WHERE id = ?)".into());
            params_vec.push(synset.clone());
        }
        if let Some(lexicon) = &filter.lexicon {
            let Some(lex_rowid) = db::lexicon_rowid(self.conn(), lexicon)? else {
                return Ok(Vec::new());
            };
            clauses.push("s.lexicon_rowid = ?".into());
            params_vec.push(lex_rowid.to_string());
        }

        let where_clause = if clauses.is_empty() {
            "1=1".to_string()
        } else {
            clauses.join(" AND ")
        };
        let sql =
            format!("SELECT s.id FROM senses s WHERE {where_clause} ORDER BY s.entry_rank, s.rowid");
        let mut stmt = self.conn().prepare(&sql)?;
        let ids: Vec<String> = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), |r| r.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        ids.iter().map(|id| self.build_sense_model(id)).collect()
    }

    pub(crate) fn build_sense_model(&self, sense_id: &str) -> Result<Sense> {
        let row = self
            .conn()
            .query_row(
                "SELECT s.rowid, s.id, s.entry_rank, s.synset_rank, s.metadata, \
                 e.id, syn.id, l.id \
                 FROM senses s \
                 JOIN entries e ON s.entry_rowid = e.rowid \
                 JOIN synsets syn ON s.synset_rowid = syn.rowid \
                 JOIN lexicons l ON s.lexicon_rowid = l.rowid \
                 WHERE s.id = ?1",
                params![sense_id],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, i64>(3)?,
                        r.get::<_, Option<String>>(4)?,
                        r.get::<_, String>(5)?,
                        r.get::<_, String>(6)?,
                        r.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;
        let Some((rowid, id, entry_rank, synset_rank, metadata, entry_id, synset_id, lexicon_id)) =
            row
        else {
            return Err(EditorError::not_found("sense", sense_id));
        };

        let unlexicalized: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM unlexicalized_senses WHERE sense_rowid = ?1",
                params![rowid],
                |r| r.get(0),
            )
            .optional()?;
        let adjposition: Option<String> = self
            .conn()
            .query_row(
                "SELECT adjposition FROM adjpositions WHERE sense_rowid = ?1",
                params![rowid],
                |r| r.get(0),
            )
            .optional()?;

        Ok(Sense {
            id,
            entry_id,
            synset_id,
            lexicon_id,
            entry_rank,
            synset_rank,
            lexicalized: unlexicalized.is_none(),
            adjposition: adjposition.as_deref().map(str::parse).transpose()?,
            metadata: parse_metadata(metadata),
        })
    }
}

/// `"{entry_id}-{synset local part}-{entry rank, two digits}"`.
fn generate_sense_id(entry_id: &str, synset_id: &str, position: i64) -> String {
    let local_part = synset_id
        .split_once('-')
        .map_or(synset_id, |(_, local)| local);
    format!("{entry_id}-{local_part}-{position:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartOfSpeech;

    fn editor_with_pair() -> (Editor, String, String) {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon("awn", "AWN", "ar", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        let synset = editor
            .create_synset("awn", PartOfSpeech::N, "A test concept", Default::default())
            .unwrap();
        let entry = editor
            .create_entry("awn", "test", PartOfSpeech::N, Default::default())
            .unwrap();
        (editor, entry.id, synset.id)
    }

    #[test]
    fn test_add_sense_generates_ranked_id() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let sense = ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        assert_eq!(sense.id, "awn-test-n-00000001-n-01");
        assert_eq!(sense.entry_rank, 1);
        assert_eq!(sense.synset_rank, 1);
        assert!(sense.lexicalized);
    }

    #[test]
    fn test_duplicate_pair_refused() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        let err = ed
            .add_sense(&entry_id, &synset_id, Default::default())
            .unwrap_err();
        assert!(matches!(err, EditorError::Duplicate(_)));
    }

    #[test]
    fn test_add_sense_lexicalizes_target() {
        let (mut ed, entry_id, _) = editor_with_pair();
        let gap = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A lexical gap",
                crate::editor::SynsetOptions {
                    lexicalized: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!gap.lexicalized);
        ed.add_sense(&entry_id, &gap.id, Default::default()).unwrap();
        assert!(ed.get_synset(&gap.id).unwrap().lexicalized);
    }

    #[test]
    fn test_remove_last_sense_unlexicalizes_synset() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let sense = ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        ed.remove_sense(&sense.id).unwrap();
        assert!(!ed.get_synset(&synset_id).unwrap().lexicalized);
        assert!(ed.get_sense(&sense.id).is_err());
    }

    #[test]
    fn test_move_sense() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let sense = ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        let target = ed
            .create_synset("awn", PartOfSpeech::N, "Another concept", Default::default())
            .unwrap();

        let moved = ed.move_sense(&sense.id, &target.id).unwrap();
        assert_eq!(moved.synset_id, target.id);
        assert!(!ed.get_synset(&synset_id).unwrap().lexicalized);
        assert!(ed.get_synset(&target.id).unwrap().lexicalized);
    }

    #[test]
    fn test_move_sense_duplicate_refused() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let target = ed
            .create_synset("awn", PartOfSpeech::N, "Another concept", Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        ed.add_sense(&entry_id, &target.id, Default::default()).unwrap();

        let err = ed.move_sense(&sense.id, &target.id).unwrap_err();
        assert!(matches!(err, EditorError::Duplicate(_)));
    }

    #[test]
    fn test_move_sense_preserves_relations() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let sense = ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        let other_entry = ed
            .create_entry("awn", "other", PartOfSpeech::N, Default::default())
            .unwrap();
        let other_synset = ed
            .create_synset("awn", PartOfSpeech::N, "Other concept", Default::default())
            .unwrap();
        let other_sense = ed
            .add_sense(&other_entry.id, &other_synset.id, Default::default())
            .unwrap();
        ed.add_sense_relation(&sense.id, "antonym", &other_sense.id, Default::default())
            .unwrap();

        let target = ed
            .create_synset("awn", PartOfSpeech::N, "Move target", Default::default())
            .unwrap();
        ed.move_sense(&sense.id, &target.id).unwrap();
        let relations = ed.get_sense_relations(&sense.id, None).unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].target_id, other_sense.id);
    }

    #[test]
    fn test_reorder_senses() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let s1 = ed.add_sense(&entry_id, &synset_id, Default::default()).unwrap();
        let s2_synset = ed
            .create_synset("awn", PartOfSpeech::N, "Second concept", Default::default())
            .unwrap();
        let s2 = ed.add_sense(&entry_id, &s2_synset.id, Default::default()).unwrap();
        let s3_synset = ed
            .create_synset("awn", PartOfSpeech::N, "Third concept", Default::default())
            .unwrap();
        let s3 = ed.add_sense(&entry_id, &s3_synset.id, Default::default()).unwrap();

        let order = vec![s3.id.clone(), s1.id.clone(), s2.id.clone()];
        ed.reorder_senses(&entry_id, &order).unwrap();

        let senses = ed
            .find_senses(&SenseFilter {
                entry: Some(entry_id.clone()),
                ..Default::default()
            })
            .unwrap();
        let ids: Vec<&str> = senses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![s3.id.as_str(), s1.id.as_str(), s2.id.as_str()]);
        let ranks: Vec<i64> = senses.iter().map(|s| s.entry_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        // A partial or foreign id set is refused.
        let err = ed
            .reorder_senses(&entry_id, &[s1.id.clone()])
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
    }

    #[test]
    fn test_adjposition_and_unlexicalized_sense() {
        let (mut ed, entry_id, synset_id) = editor_with_pair();
        let sense = ed
            .add_sense(
                &entry_id,
                &synset_id,
                SenseOptions {
                    lexicalized: Some(false),
                    adjposition: Some(AdjPosition::Predicative),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!sense.lexicalized);
        assert_eq!(sense.adjposition, Some(AdjPosition::Predicative));
    }
}
