//! Synset operations.

use rusqlite::{OptionalExtension, params};
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{Metadata, Patch, PartOfSpeech, Synset, metadata_to_json, parse_metadata};

/// Optional attributes for [`Editor::create_synset`].
#[derive(Debug, Clone, Default)]
pub struct SynsetOptions {
    /// Explicit id; must begin with `"{lexicon_id}-"`. Auto-generated
    /// when absent.
    pub id: Option<String>,
    /// A concrete ILI id, or `"in"` to propose one (requires
    /// `ili_definition`).
    pub ili: Option<String>,
    pub ili_definition: Option<String>,
    /// `false` marks the synset unlexicalized at creation.
    pub lexicalized: Option<bool>,
    pub metadata: Option<Metadata>,
}

/// Partial update for [`Editor::update_synset`].
#[derive(Debug, Clone, Default)]
pub struct SynsetUpdate {
    pub pos: Option<PartOfSpeech>,
    pub metadata: Patch<Metadata>,
}

/// Conjunctive filters for [`Editor::find_synsets`].
#[derive(Debug, Clone, Default)]
pub struct SynsetFilter {
    pub lexicon: Option<String>,
    pub pos: Option<PartOfSpeech>,
    pub ili: Option<String>,
    pub definition_contains: Option<String>,
}

impl Editor {
    /// Create a synset with an initial definition.
    pub fn create_synset(
        &mut self,
        lexicon: &str,
        pos: PartOfSpeech,
        definition: &str,
        options: SynsetOptions,
    ) -> Result<Synset> {
        self.mutate(|ed| {
            let lex_row = db::lexicon_row(ed.conn(), lexicon)?
                .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;

            let id = match options.id {
                Some(id) => {
                    if !id.starts_with(&format!("{}-", lex_row.id)) {
                        return Err(EditorError::Validation(format!(
                            "ID must start with lexicon prefix: {}-",
                            lex_row.id
                        )));
                    }
                    id
                }
                None => ed.generate_synset_id(&lex_row.id, lex_row.rowid, pos)?,
            };

            if db::synset_rowid(ed.conn(), &id)?.is_some() {
                return Err(EditorError::Duplicate(format!(
                    "synset already exists: {id:?}"
                )));
            }

            let ili = options.ili.as_deref();
            let mut ili_rowid = None;
            if let Some(ili_id) = ili.filter(|v| *v != "in") {
                ili_rowid = Some(db::get_or_create_ili(ed.conn(), ili_id, "presupposed")?);
            }
            if ili == Some("in") {
                let ili_definition = options.ili_definition.as_deref().ok_or_else(|| {
                    EditorError::Validation("ili_definition is required when ili=\"in\"".into())
                })?;
                if ili_definition.chars().count() < 20 {
                    return Err(EditorError::Validation(
                        "ILI definition must be at least 20 characters".into(),
                    ));
                }
            }

            ed.conn().execute(
                "INSERT INTO synsets (id, lexicon_rowid, ili_rowid, pos, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    lex_row.rowid,
                    ili_rowid,
                    pos.as_str(),
                    metadata_to_json(options.metadata.as_ref()),
                ],
            )?;
            let synset_rowid = ed.conn().last_insert_rowid();

            if ili == Some("in") {
                ed.conn().execute(
                    "INSERT INTO proposed_ilis (synset_rowid, definition) VALUES (?1, ?2)",
                    params![synset_rowid, options.ili_definition],
                )?;
            }

            if options.lexicalized == Some(false) {
                ed.conn().execute(
                    "INSERT INTO unlexicalized_synsets (synset_rowid) VALUES (?1)",
                    params![synset_rowid],
                )?;
            }

            ed.conn().execute(
                "INSERT INTO definitions (lexicon_rowid, synset_rowid, definition) \
                 VALUES (?1, ?2, ?3)",
                params![lex_row.rowid, synset_rowid, definition],
            )?;

            history::record_create(
                ed.conn(),
                "synset",
                &id,
                Some(json!({
                    "pos": pos.as_str(),
                    "definition": definition,
                    "lexicon_id": lex_row.id,
                })),
            )?;

            ed.build_synset_model(&id)
        })
    }

    /// Update synset fields in place.
    pub fn update_synset(&mut self, synset_id: &str, update: SynsetUpdate) -> Result<Synset> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            if let Some(pos) = update.pos {
                history::record_update(
                    ed.conn(),
                    "synset",
                    synset_id,
                    "pos",
                    row.pos.clone().map(Value::from).unwrap_or(Value::Null),
                    Value::from(pos.as_str()),
                )?;
                ed.conn().execute(
                    "UPDATE synsets SET pos = ?1 WHERE rowid = ?2",
                    params![pos.as_str(), row.rowid],
                )?;
            }

            match update.metadata {
                Patch::Keep => {}
                Patch::Clear | Patch::Set(_) => {
                    let new_json = match &update.metadata {
                        Patch::Set(meta) => metadata_to_json(Some(meta)),
                        _ => None,
                    };
                    history::record_update(
                        ed.conn(),
                        "synset",
                        synset_id,
                        "metadata",
                        row.metadata.clone().map(Value::from).unwrap_or(Value::Null),
                        new_json.clone().map(Value::from).unwrap_or(Value::Null),
                    )?;
                    ed.conn().execute(
                        "UPDATE synsets SET metadata = ?1 WHERE rowid = ?2",
                        params![new_json, row.rowid],
                    )?;
                }
            }

            ed.build_synset_model(synset_id)
        })
    }

    /// Delete a synset. Refuses while senses remain unless `cascade` is
    /// set; cascading removes the senses first (which re-check their
    /// entries) and cleans up all relations involving the synset along
    /// with their inverses.
    pub fn delete_synset(&mut self, synset_id: &str, cascade: bool) -> Result<()> {
        self.mutate(|ed| {
            let row = db::synset_row(ed.conn(), synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

            let sense_count: i64 = ed.conn().query_row(
                "SELECT COUNT(*) FROM senses WHERE synset_rowid = ?1",
                params![row.rowid],
                |r| r.get(0),
            )?;
            if sense_count > 0 && !cascade {
                return Err(EditorError::Relation(format!(
                    "synset {synset_id} has {sense_count} senses; \
                     pass cascade = true to force deletion"
                )));
            }

            if cascade {
                let sense_ids: Vec<String> = {
                    let mut stmt = ed
                        .conn()
                        .prepare("SELECT id FROM senses WHERE synset_rowid = ?1")?;
                    let ids = stmt
                        .query_map(params![row.rowid], |r| r.get(0))?
                        .collect::<std::result::Result<_, _>>()?;
                    ids
                };
                for sense_id in sense_ids {
                    ed.remove_sense_internal(&sense_id)?;
                }
            }

            ed.cleanup_synset_relations(row.rowid)?;

            history::record_delete(
                ed.conn(),
                "synset",
                synset_id,
                Some(json!({"pos": row.pos})),
            )?;
            ed.conn()
                .execute("DELETE FROM synsets WHERE rowid = ?1", params![row.rowid])?;
            Ok(())
        })
    }

    /// Fetch a synset by id.
    pub fn get_synset(&self, synset_id: &str) -> Result<Synset> {
        self.build_synset_model(synset_id)
    }

    /// Find synsets matching every given filter.
    pub fn find_synsets(&self, filter: &SynsetFilter) -> Result<Vec<Synset>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(lexicon) = &filter.lexicon {
            let Some(lex_rowid) = db::lexicon_rowid(self.conn(), lexicon)? else {
                return Ok(Vec::new());
            };
            clauses.push("s.lexicon_rowid = ?".into());
            params_vec.push(lex_rowid.to_string());
        }
        if let Some(pos) = filter.pos {
            clauses.push("s.pos = ?".into());
            params_vec.push(pos.as_str().to_string());
        }
        if let Some(ili) = &filter.ili {
            clauses.push("s.ili_rowid = (SELECT rowid FROM ilis WHERE id = ?)".into());
            params_vec.push(ili.clone());
        }
        if let Some(fragment) = &filter.definition_contains {
            clauses.push(
                "s.rowid IN (SELECT synset_rowid FROM definitions \
                 WHERE definition LIKE ? ESCAPE '\\')"
                    .into(),
            );
            params_vec.push(format!("%{}%", db::escape_like(fragment)));
        }

        let where_clause = if clauses.is_empty() {
            "1=1".to_string()
        } else {
            clauses.join(" AND ")
        };
        let sql = format!("SELECT s.id FROM synsets s WHERE {where_clause} ORDER BY s.rowid");
        let mut stmt = self.conn().prepare(&sql)?;
        let ids: Vec<String> = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), |r| r.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        ids.iter().map(|id| self.build_synset_model(id)).collect()
    }

    /// Assemble the synset value object: ILI binding (proposed shows as
    /// `"in"`), lexfile name, lexicalization state, metadata.
    pub(crate) fn build_synset_model(&self, synset_id: &str) -> Result<Synset> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;

        let lexicon_id: String = self.conn().query_row(
            "SELECT id FROM lexicons WHERE rowid = ?1",
            params![row.lexicon_rowid],
            |r| r.get(0),
        )?;

        let mut ili: Option<String> = None;
        if let Some(ili_rowid) = row.ili_rowid {
            ili = self
                .conn()
                .query_row(
                    "SELECT id FROM ilis WHERE rowid = ?1",
                    params![ili_rowid],
                    |r| r.get(0),
                )
                .optional()?;
        }
        let proposed: Option<i64> = self
            .conn()
            .query_row(
                "SELECT rowid FROM proposed_ilis WHERE synset_rowid = ?1",
                params![row.rowid],
                |r| r.get(0),
            )
            .optional()?;
        if proposed.is_some() {
            ili = Some("in".to_string());
        }

        let lexfile: Option<String> = match row.lexfile_rowid {
            Some(lexfile_rowid) => self
                .conn()
                .query_row(
                    "SELECT name FROM lexfiles WHERE rowid = ?1",
                    params![lexfile_rowid],
                    |r| r.get(0),
                )
                .optional()?,
            None => None,
        };

        let unlexicalized: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM unlexicalized_synsets WHERE synset_rowid = ?1",
                params![row.rowid],
                |r| r.get(0),
            )
            .optional()?;

        Ok(Synset {
            id: row.id,
            lexicon_id,
            pos: row.pos.as_deref().map(str::parse).transpose()?,
            ili,
            lexicalized: unlexicalized.is_none(),
            lexfile,
            metadata: parse_metadata(row.metadata),
        })
    }

    /// Generate `"{lexicon}-{NNNNNNNN}-{pos}"` with the smallest 8-digit
    /// counter greater than any existing counter for the lexicon.
    pub(crate) fn generate_synset_id(
        &self,
        lexicon_id: &str,
        lexicon_rowid: i64,
        pos: PartOfSpeech,
    ) -> Result<String> {
        let prefix = format!("{lexicon_id}-");
        // The eight `_` wildcards are intentional: they match exactly the
        // counter digits. Only the prefix itself needs escaping.
        let pattern = format!("{}________-%", db::escape_like(&prefix));
        let max_counter: Option<i64> = self.conn().query_row(
            "SELECT MAX(CAST(substr(id, ?1, 8) AS INTEGER)) \
             FROM synsets WHERE lexicon_rowid = ?2 AND id LIKE ?3 ESCAPE '\\'",
            params![prefix.chars().count() as i64 + 1, lexicon_rowid, pattern],
            |r| r.get(0),
        )?;
        let counter = max_counter.unwrap_or(0) + 1;
        Ok(format!("{prefix}{counter:08}-{pos}"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::SenseFilter;
    use super::*;

    fn editor() -> Editor {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon(
                "awn",
                "Arabic WordNet",
                "ar",
                "test@test.com",
                "MIT",
                "1.0",
                Default::default(),
            )
            .unwrap();
        editor
    }

    #[test]
    fn test_create_with_generated_id() {
        let mut ed = editor();
        let first = ed
            .create_synset("awn", PartOfSpeech::N, "A large feline animal", Default::default())
            .unwrap();
        assert_eq!(first.id, "awn-00000001-n");
        let second = ed
            .create_synset("awn", PartOfSpeech::V, "To move quickly", Default::default())
            .unwrap();
        assert_eq!(second.id, "awn-00000002-v");
        assert!(first.lexicalized);
        assert_eq!(first.pos, Some(PartOfSpeech::N));
    }

    #[test]
    fn test_explicit_id_must_carry_lexicon_prefix() {
        let mut ed = editor();
        let err = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A concept",
                SynsetOptions {
                    id: Some("other-00000001-n".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
    }

    #[test]
    fn test_duplicate_id_refused() {
        let mut ed = editor();
        let opts = SynsetOptions {
            id: Some("awn-10000000-n".into()),
            ..Default::default()
        };
        ed.create_synset("awn", PartOfSpeech::N, "First", opts.clone())
            .unwrap();
        let err = ed
            .create_synset("awn", PartOfSpeech::N, "Second", opts)
            .unwrap_err();
        assert!(matches!(err, EditorError::Duplicate(_)));
    }

    #[test]
    fn test_create_with_linked_ili_presupposes() {
        let mut ed = editor();
        let synset = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A concept",
                SynsetOptions {
                    ili: Some("i12345".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(synset.ili.as_deref(), Some("i12345"));
        let ili = ed.get_ili(&synset.id).unwrap().unwrap();
        assert_eq!(ili.status, crate::models::IliStatus::Presupposed);
    }

    #[test]
    fn test_create_with_proposed_ili_requires_long_definition() {
        let mut ed = editor();
        let err = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A concept",
                SynsetOptions {
                    ili: Some("in".into()),
                    ili_definition: Some("exactly 19 chars!!!".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));

        let synset = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A concept",
                SynsetOptions {
                    ili: Some("in".into()),
                    ili_definition: Some("exactly 20 chars !!!".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(synset.ili.as_deref(), Some("in"));
    }

    #[test]
    fn test_create_unlexicalized() {
        let mut ed = editor();
        let synset = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A lexical gap",
                SynsetOptions {
                    lexicalized: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!synset.lexicalized);
    }

    #[test]
    fn test_update_pos_and_metadata() {
        let mut ed = editor();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A concept", Default::default())
            .unwrap();
        let mut meta = Metadata::new();
        meta.insert("note".into(), serde_json::json!("edited"));
        let updated = ed
            .update_synset(
                &synset.id,
                SynsetUpdate {
                    pos: Some(PartOfSpeech::V),
                    metadata: Patch::Set(meta.clone()),
                },
            )
            .unwrap();
        assert_eq!(updated.pos, Some(PartOfSpeech::V));
        assert_eq!(updated.metadata, Some(meta));
    }

    #[test]
    fn test_delete_refuses_with_senses_then_cascades() {
        let mut ed = editor();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A concept", Default::default())
            .unwrap();
        let entry = ed
            .create_entry("awn", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        ed.add_sense(&entry.id, &synset.id, Default::default())
            .unwrap();

        let err = ed.delete_synset(&synset.id, false).unwrap_err();
        assert!(matches!(err, EditorError::Relation(_)));

        ed.delete_synset(&synset.id, true).unwrap();
        assert!(ed.get_synset(&synset.id).is_err());
        // The entry survives; only its sense is gone.
        assert!(ed.get_entry(&entry.id).is_ok());
        assert!(ed.find_senses(&SenseFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_find_synsets_filters() {
        let mut ed = editor();
        ed.create_synset("awn", PartOfSpeech::N, "A large feline animal", Default::default())
            .unwrap();
        ed.create_synset("awn", PartOfSpeech::V, "To move quickly", Default::default())
            .unwrap();

        assert_eq!(ed.find_synsets(&SynsetFilter::default()).unwrap().len(), 2);
        assert_eq!(
            ed.find_synsets(&SynsetFilter {
                pos: Some(PartOfSpeech::V),
                ..Default::default()
            })
            .unwrap()
            .len(),
            1
        );
        assert_eq!(
            ed.find_synsets(&SynsetFilter {
                definition_contains: Some("feline".into()),
                ..Default::default()
            })
            .unwrap()
            .len(),
            1
        );
        assert!(
            ed.find_synsets(&SynsetFilter {
                lexicon: Some("missing".into()),
                ..Default::default()
            })
            .unwrap()
            .is_empty()
        );
    }
}
