//! Compound operations: merging and splitting synsets.

use rusqlite::{OptionalExtension, params};
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::Synset;

impl Editor {
    /// Merge `source_id` into `target_id` and delete the source.
    ///
    /// Refuses when both synsets carry any ILI binding (real or
    /// proposed). Senses, relations, definitions, and examples transfer
    /// to the target; rows that would become self-loops or duplicate an
    /// existing target row are dropped, as are definitions whose trimmed
    /// text already appears on the target.
    pub fn merge_synsets(&mut self, source_id: &str, target_id: &str) -> Result<Synset> {
        self.mutate(|ed| {
            let src = db::synset_row(ed.conn(), source_id)?
                .ok_or_else(|| EditorError::not_found("synset", source_id))?;
            let tgt = db::synset_row(ed.conn(), target_id)?
                .ok_or_else(|| EditorError::not_found("synset", target_id))?;

            let src_has_proposed = ed.proposed_ili_exists(src.rowid)?;
            let tgt_has_proposed = ed.proposed_ili_exists(tgt.rowid)?;
            let src_bound = src.ili_rowid.is_some() || src_has_proposed;
            let tgt_bound = tgt.ili_rowid.is_some() || tgt_has_proposed;
            if src_bound && tgt_bound {
                return Err(EditorError::Conflict(
                    "both synsets have ILI mappings".into(),
                ));
            }

            // Transfer the source's binding when the target has none.
            if src.ili_rowid.is_some() && tgt.ili_rowid.is_none() {
                ed.conn().execute(
                    "UPDATE synsets SET ili_rowid = ?1 WHERE rowid = ?2",
                    params![src.ili_rowid, tgt.rowid],
                )?;
            }
            if src_has_proposed && !tgt_has_proposed {
                ed.conn().execute(
                    "UPDATE proposed_ilis SET synset_rowid = ?1 WHERE synset_rowid = ?2",
                    params![tgt.rowid, src.rowid],
                )?;
            }

            // Sense transfer: redundant senses (entry already present on
            // the target) are deleted, the rest are reassigned. Synset
            // ranks are left as they are.
            let senses: Vec<(i64, i64)> = {
                let mut stmt = ed
                    .conn()
                    .prepare("SELECT rowid, entry_rowid FROM senses WHERE synset_rowid = ?1")?;
                let rows = stmt
                    .query_map(params![src.rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
                    .collect::<std::result::Result<_, _>>()?;
                rows
            };
            for (sense_rowid, entry_rowid) in senses {
                let duplicate: Option<i64> = ed
                    .conn()
                    .query_row(
                        "SELECT rowid FROM senses WHERE entry_rowid = ?1 AND synset_rowid = ?2",
                        params![entry_rowid, tgt.rowid],
                        |r| r.get(0),
                    )
                    .optional()?;
                if duplicate.is_some() {
                    ed.conn()
                        .execute("DELETE FROM senses WHERE rowid = ?1", params![sense_rowid])?;
                } else {
                    ed.conn().execute(
                        "UPDATE senses SET synset_rowid = ?1 WHERE rowid = ?2",
                        params![tgt.rowid, sense_rowid],
                    )?;
                }
            }

            // Redirect relations; self-loops and unique-constraint
            // collisions are dropped.
            ed.redirect_relations(src.rowid, tgt.rowid, "source_rowid", "target_rowid")?;
            ed.redirect_relations(src.rowid, tgt.rowid, "target_rowid", "source_rowid")?;

            // Definition merge: skip source definitions whose trimmed
            // text duplicates one already on the target.
            let target_texts: Vec<String> = {
                let mut stmt = ed
                    .conn()
                    .prepare("SELECT definition FROM definitions WHERE synset_rowid = ?1")?;
                let texts: Vec<Option<String>> = stmt
                    .query_map(params![tgt.rowid], |r| r.get(0))?
                    .collect::<std::result::Result<_, _>>()?;
                texts
                    .into_iter()
                    .flatten()
                    .map(|t| t.trim().to_string())
                    .collect()
            };
            let source_definitions: Vec<(i64, Option<String>)> = {
                let mut stmt = ed
                    .conn()
                    .prepare("SELECT rowid, definition FROM definitions WHERE synset_rowid = ?1")?;
                let rows = stmt
                    .query_map(params![src.rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
                    .collect::<std::result::Result<_, _>>()?;
                rows
            };
            for (def_rowid, text) in source_definitions {
                let keep = text
                    .as_deref()
                    .is_some_and(|t| !t.is_empty() && !target_texts.contains(&t.trim().to_string()));
                if keep {
                    ed.conn().execute(
                        "UPDATE definitions SET synset_rowid = ?1 WHERE rowid = ?2",
                        params![tgt.rowid, def_rowid],
                    )?;
                } else {
                    ed.conn().execute(
                        "DELETE FROM definitions WHERE rowid = ?1",
                        params![def_rowid],
                    )?;
                }
            }

            // All source examples carry over.
            ed.conn().execute(
                "UPDATE synset_examples SET synset_rowid = ?1 WHERE synset_rowid = ?2",
                params![tgt.rowid, src.rowid],
            )?;

            // The merged synset is lexicalized regardless of prior state.
            ed.conn().execute(
                "DELETE FROM unlexicalized_synsets WHERE synset_rowid = ?1",
                params![tgt.rowid],
            )?;

            ed.conn()
                .execute("DELETE FROM synsets WHERE rowid = ?1", params![src.rowid])?;

            history::record_update(
                ed.conn(),
                "synset",
                target_id,
                "merge_from",
                Value::Null,
                Value::from(source_id),
            )?;

            ed.build_synset_model(target_id)
        })
    }

    /// Split a synset's senses into ≥ 2 groups. The first group stays on
    /// the original synset; each further group moves onto a freshly
    /// created synset (same lexicon and POS, empty metadata) that also
    /// receives a copy of the original's outgoing relations. Incoming
    /// relations, definitions, and examples stay on the original.
    pub fn split_synset(
        &mut self,
        synset_id: &str,
        sense_groups: &[Vec<String>],
    ) -> Result<Vec<Synset>> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
            let lexicon_id: String = ed.conn().query_row(
                "SELECT id FROM lexicons WHERE rowid = ?1",
                params![row.lexicon_rowid],
                |r| r.get(0),
            )?;

            // The groups must partition the current senses exactly.
            let current: std::collections::HashSet<String> = {
                let mut stmt = ed
                    .conn()
                    .prepare("SELECT id FROM senses WHERE synset_rowid = ?1")?;
                let ids: Vec<String> = stmt
                    .query_map(params![row.rowid], |r| r.get(0))?
                    .collect::<std::result::Result<_, _>>()?;
                ids.into_iter().collect()
            };
            let mut provided = std::collections::HashSet::new();
            for group in sense_groups {
                for sense_id in group {
                    if !provided.insert(sense_id.clone()) {
                        return Err(EditorError::Validation(format!(
                            "duplicate sense in groups: {sense_id}"
                        )));
                    }
                }
            }
            if provided != current {
                return Err(EditorError::Validation(
                    "sense groups must partition the synset's senses exactly".into(),
                ));
            }
            if sense_groups.len() < 2 {
                return Err(EditorError::Validation(
                    "need at least 2 sense groups to split".into(),
                ));
            }

            let pos = row
                .pos
                .as_deref()
                .map(str::parse)
                .transpose()?
                .ok_or_else(|| {
                    EditorError::Validation(format!("synset {synset_id} has no POS to inherit"))
                })?;

            let outgoing: Vec<(i64, i64, Option<String>)> = {
                let mut stmt = ed.conn().prepare(
                    "SELECT type_rowid, target_rowid, metadata \
                     FROM synset_relations WHERE source_rowid = ?1",
                )?;
                let rows = stmt
                    .query_map(params![row.rowid], |r| {
                        Ok((r.get(0)?, r.get(1)?, r.get(2)?))
                    })?
                    .collect::<std::result::Result<_, _>>()?;
                rows
            };

            let mut result = Vec::with_capacity(sense_groups.len());
            result.push(ed.build_synset_model(synset_id)?);

            for group in &sense_groups[1..] {
                let new_id = ed.generate_synset_id(&lexicon_id, row.lexicon_rowid, pos)?;
                ed.conn().execute(
                    "INSERT INTO synsets (id, lexicon_rowid, pos, metadata) \
                     VALUES (?1, ?2, ?3, NULL)",
                    params![new_id, row.lexicon_rowid, pos.as_str()],
                )?;
                let new_rowid = ed.conn().last_insert_rowid();

                for sense_id in group {
                    ed.conn().execute(
                        "UPDATE senses SET synset_rowid = ?1 WHERE id = ?2",
                        params![new_rowid, sense_id],
                    )?;
                }

                for (type_rowid, target_rowid, metadata) in &outgoing {
                    ed.conn().execute(
                        "INSERT OR IGNORE INTO synset_relations \
                         (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![row.lexicon_rowid, new_rowid, target_rowid, type_rowid, metadata],
                    )?;
                }

                history::record_create(
                    ed.conn(),
                    "synset",
                    &new_id,
                    Some(json!({"split_from": synset_id})),
                )?;
                result.push(ed.build_synset_model(&new_id)?);
            }

            Ok(result)
        })
    }

    /// Rewrite every relation row whose `{column}` is the source synset
    /// to reference the target instead. Rows that would become
    /// self-loops or collide with an existing target triple are deleted.
    fn redirect_relations(
        &mut self,
        source_rowid: i64,
        target_rowid: i64,
        column: &str,
        other_column: &str,
    ) -> Result<()> {
        let rows: Vec<(i64, i64)> = {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT rowid, {other_column} FROM synset_relations WHERE {column} = ?1"
            ))?;
            let rows = stmt
                .query_map(params![source_rowid], |r| Ok((r.get(0)?, r.get(1)?)))?
                .collect::<std::result::Result<_, _>>()?;
            rows
        };

        for (rel_rowid, other_rowid) in rows {
            if other_rowid == target_rowid {
                self.conn().execute(
                    "DELETE FROM synset_relations WHERE rowid = ?1",
                    params![rel_rowid],
                )?;
                continue;
            }
            let updated = self.conn().execute(
                &format!("UPDATE synset_relations SET {column} = ?1 WHERE rowid = ?2"),
                params![target_rowid, rel_rowid],
            );
            match updated {
                Ok(_) => {}
                Err(e) if db::is_constraint_violation(&e) => {
                    self.conn().execute(
                        "DELETE FROM synset_relations WHERE rowid = ?1",
                        params![rel_rowid],
                    )?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn proposed_ili_exists(&self, synset_rowid: i64) -> Result<bool> {
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
    use crate::editor::{SenseFilter, SynsetOptions};
    use crate::models::PartOfSpeech;

    fn editor() -> Editor {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon("t", "T", "en", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        editor
    }

    fn synset(ed: &mut Editor, definition: &str) -> String {
        ed.create_synset("t", PartOfSpeech::N, definition, Default::default())
            .unwrap()
            .id
    }

    fn sense_for(ed: &mut Editor, lemma: &str, synset_id: &str) -> String {
        let entry = ed
            .create_entry("t", lemma, PartOfSpeech::N, Default::default())
            .unwrap();
        ed.add_sense(&entry.id, synset_id, Default::default())
            .unwrap()
            .id
    }

    #[test]
    fn test_merge_conflicting_ilis_refused() {
        let mut ed = editor();
        let a = synset(&mut ed, "Concept number one");
        let b = synset(&mut ed, "Concept number two");
        ed.link_ili(&a, "i00001").unwrap();
        ed.link_ili(&b, "i00002").unwrap();
        let err = ed.merge_synsets(&a, &b).unwrap_err();
        assert!(matches!(err, EditorError::Conflict(_)));
    }

    #[test]
    fn test_merge_transfers_ili_and_senses() {
        let mut ed = editor();
        let a = synset(&mut ed, "Concept number one");
        let b = synset(&mut ed, "Concept number two");
        ed.link_ili(&a, "i00001").unwrap();
        sense_for(&mut ed, "alpha", &a);
        let shared_sense = sense_for(&mut ed, "beta", &b);
        // "beta" also has a sense on the source; that one is redundant.
        let beta_entry = ed.get_sense(&shared_sense).unwrap().entry_id;
        ed.add_sense(&beta_entry, &a, Default::default()).unwrap();

        let merged = ed.merge_synsets(&a, &b).unwrap();
        assert_eq!(merged.id, b);
        assert_eq!(merged.ili.as_deref(), Some("i00001"));
        assert!(merged.lexicalized);
        assert!(ed.get_synset(&a).is_err());

        let members = ed
            .find_senses(&SenseFilter {
                synset: Some(b.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(members.len(), 2); // alpha moved over, one beta kept
    }

    #[test]
    fn test_merge_redirects_relations_in_chain() {
        let mut ed = editor();
        let a = synset(&mut ed, "Concept a in the chain");
        let b = synset(&mut ed, "Concept b in the chain");
        let c = synset(&mut ed, "Concept c in the chain");
        ed.add_synset_relation(&a, "hypernym", &b, Default::default())
            .unwrap();
        ed.add_synset_relation(&b, "hypernym", &c, Default::default())
            .unwrap();

        // Merge b into a: a inherits hypernym->c; the a<->b edges vanish
        // instead of becoming self-loops; no duplicates appear.
        ed.merge_synsets(&b, &a).unwrap();
        let outgoing = ed.get_synset_relations(&a, None).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].kind, "hypernym");
        assert_eq!(outgoing[0].target_id, c);

        let loops: i64 = ed
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM synset_relations WHERE source_rowid = target_rowid",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(loops, 0);
    }

    #[test]
    fn test_merge_deduplicates_definitions_and_keeps_examples() {
        let mut ed = editor();
        let a = synset(&mut ed, "A shared definition");
        let b = synset(&mut ed, "A shared definition");
        ed.add_definition(&a, "A unique definition", Default::default())
            .unwrap();
        ed.add_synset_example(&a, "An example sentence.", None, None)
            .unwrap();

        ed.merge_synsets(&a, &b).unwrap();
        let definitions = ed.get_definitions(&b).unwrap();
        let texts: Vec<&str> = definitions.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["A shared definition", "A unique definition"]);
        assert_eq!(ed.get_synset_examples(&b).unwrap().len(), 1);
    }

    #[test]
    fn test_merge_records_history() {
        let mut ed = editor();
        let a = synset(&mut ed, "Concept number one");
        let b = synset(&mut ed, "Concept number two");
        ed.merge_synsets(&a, &b).unwrap();
        let records = ed
            .history(&crate::history::HistoryFilter {
                entity_id: Some(b.clone()),
                ..Default::default()
            })
            .unwrap();
        assert!(
            records
                .iter()
                .any(|r| r.field.as_deref() == Some("merge_from"))
        );
    }

    #[test]
    fn test_split_partition_validation() {
        let mut ed = editor();
        let s = synset(&mut ed, "A polysemous concept");
        let sense1 = sense_for(&mut ed, "one", &s);
        let sense2 = sense_for(&mut ed, "two", &s);

        // One group is not a split.
        let err = ed
            .split_synset(&s, &[vec![sense1.clone(), sense2.clone()]])
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
        // Missing a sense is not a partition.
        let err = ed
            .split_synset(&s, &[vec![sense1.clone()], vec![]])
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
        // Overlap is not a partition.
        let err = ed
            .split_synset(&s, &[vec![sense1.clone()], vec![sense1.clone(), sense2.clone()]])
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
    }

    #[test]
    fn test_split_moves_groups_and_copies_outgoing_relations() {
        let mut ed = editor();
        let s = synset(&mut ed, "A polysemous concept");
        let hyper = synset(&mut ed, "A hypernym concept");
        ed.add_synset_relation(&s, "hypernym", &hyper, Default::default())
            .unwrap();
        let sense1 = sense_for(&mut ed, "one", &s);
        let sense2 = sense_for(&mut ed, "two", &s);

        let result = ed
            .split_synset(&s, &[vec![sense1.clone()], vec![sense2.clone()]])
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, s);
        let new_synset = &result[1];
        assert_ne!(new_synset.id, s);
        assert_eq!(new_synset.pos, Some(PartOfSpeech::N));
        assert_eq!(new_synset.metadata, None);

        assert_eq!(ed.get_sense(&sense2).unwrap().synset_id, new_synset.id);
        assert_eq!(ed.get_sense(&sense1).unwrap().synset_id, s);

        // Outgoing relations are copied; definitions stay behind.
        let copied = ed.get_synset_relations(&new_synset.id, None).unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].target_id, hyper);
        assert!(ed.get_definitions(&new_synset.id).unwrap().is_empty());
        assert!(!ed.get_definitions(&s).unwrap().is_empty());
    }

    #[test]
    fn test_split_keeps_proposed_ili_on_original() {
        let mut ed = editor();
        let s = synset(&mut ed, "A polysemous concept");
        ed.propose_ili(&s, "A definition long enough to pass", None)
            .unwrap();
        let sense1 = sense_for(&mut ed, "one", &s);
        let sense2 = sense_for(&mut ed, "two", &s);

        let result = ed
            .split_synset(&s, &[vec![sense1], vec![sense2]])
            .unwrap();
        assert_eq!(ed.get_synset(&s).unwrap().ili.as_deref(), Some("in"));
        assert_eq!(ed.get_synset(&result[1].id).unwrap().ili, None);
    }

    #[test]
    fn test_merge_target_unlexicalized_becomes_lexicalized() {
        let mut ed = editor();
        let a = synset(&mut ed, "Concept number one");
        let b = ed
            .create_synset(
                "t",
                PartOfSpeech::N,
                "An unlexicalized target",
                SynsetOptions {
                    lexicalized: Some(false),
                    ..Default::default()
                },
            )
            .unwrap()
            .id;
        ed.merge_synsets(&a, &b).unwrap();
        assert!(ed.get_synset(&b).unwrap().lexicalized);
    }
}
