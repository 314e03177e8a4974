//! Lexical entry and form operations.

use std::collections::HashSet;

use rusqlite::{OptionalExtension, params};
use serde_json::{Value, json};

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{
    Entry, Form, Metadata, Patch, PartOfSpeech, Pronunciation, Tag, metadata_to_json,
    parse_metadata,
};

/// Optional attributes for [`Editor::create_entry`].
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    /// Explicit id; must begin with `"{lexicon_id}-"`.
    pub id: Option<String>,
    /// Additional written forms inserted at ranks 1..
    pub forms: Vec<String>,
    pub metadata: Option<Metadata>,
}

/// Partial update for [`Editor::update_entry`].
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub pos: Option<PartOfSpeech>,
    pub metadata: Patch<Metadata>,
}

/// Conjunctive filters for [`Editor::find_entries`].
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub lexicon: Option<String>,
    pub lemma: Option<String>,
    pub pos: Option<PartOfSpeech>,
}

/// Optional attributes for [`Editor::add_form`].
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    pub id: Option<String>,
    pub script: Option<String>,
    /// `(tag, category)` pairs attached to the new form.
    pub tags: Vec<(String, String)>,
}

/// Optional attributes for [`Editor::add_pronunciation`].
#[derive(Debug, Clone)]
pub struct PronunciationOptions {
    pub variety: Option<String>,
    pub notation: Option<String>,
    pub phonemic: bool,
    pub audio: Option<String>,
}

impl Default for PronunciationOptions {
    fn default() -> Self {
        PronunciationOptions {
            variety: None,
            notation: None,
            phonemic: true,
            audio: None,
        }
    }
}

/// Lowercase, spaces to underscores, strip everything that is not a
/// word character or hyphen. Falls back to `"entry"` when nothing
/// survives.
fn normalize_lemma(lemma: &str) -> String {
    let normalized: String = lemma
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if normalized.is_empty() {
        "entry".to_string()
    } else {
        normalized
    }
}

/// The normalized (casefolded) variant of a written form, stored only
/// when it differs from the original.
fn normalized_form_of(written_form: &str) -> Option<String> {
    let lowered = written_form.to_lowercase();
    if lowered == written_form {
        None
    } else {
        Some(lowered)
    }
}

impl Editor {
    /// Create a lexical entry; its lemma becomes the rank-0 form and the
    /// entry-index row.
    pub fn create_entry(
        &mut self,
        lexicon: &str,
        lemma: &str,
        pos: PartOfSpeech,
        options: EntryOptions,
    ) -> Result<Entry> {
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
                None => ed.generate_entry_id(&lex_row.id, lemma, pos)?,
            };

            if db::entry_rowid(ed.conn(), &id)?.is_some() {
                return Err(EditorError::Duplicate(format!(
                    "entry already exists: {id:?}"
                )));
            }

            ed.conn().execute(
                "INSERT INTO entries (id, lexicon_rowid, pos, metadata) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id,
                    lex_row.rowid,
                    pos.as_str(),
                    metadata_to_json(options.metadata.as_ref()),
                ],
            )?;
            let entry_rowid = ed.conn().last_insert_rowid();

            // Lemma is the rank-0 form.
            ed.conn().execute(
                "INSERT INTO forms \
                 (lexicon_rowid, entry_rowid, form, normalized_form, rank) \
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![lex_row.rowid, entry_rowid, lemma, normalized_form_of(lemma)],
            )?;

            ed.conn().execute(
                "INSERT INTO entry_index (entry_rowid, lemma) VALUES (?1, ?2)",
                params![entry_rowid, lemma],
            )?;

            for (rank, form_text) in options.forms.iter().enumerate() {
                ed.conn().execute(
                    "INSERT INTO forms \
                     (lexicon_rowid, entry_rowid, form, normalized_form, rank) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        lex_row.rowid,
                        entry_rowid,
                        form_text,
                        normalized_form_of(form_text),
                        rank as i64 + 1,
                    ],
                )?;
            }

            history::record_create(
                ed.conn(),
                "entry",
                &id,
                Some(json!({
                    "lemma": lemma,
                    "pos": pos.as_str(),
                    "lexicon_id": lex_row.id,
                })),
            )?;

            ed.build_entry_model(&id)
        })
    }

    /// Update entry fields in place.
    pub fn update_entry(&mut self, entry_id: &str, update: EntryUpdate) -> Result<Entry> {
        self.mutate(|ed| {
            let row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

            if let Some(pos) = update.pos {
                history::record_update(
                    ed.conn(),
                    "entry",
                    entry_id,
                    "pos",
                    Value::from(row.pos.clone()),
                    Value::from(pos.as_str()),
                )?;
                ed.conn().execute(
                    "UPDATE entries SET pos = ?1 WHERE rowid = ?2",
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
                    ed.conn().execute(
                        "UPDATE entries SET metadata = ?1 WHERE rowid = ?2",
                        params![new_json, row.rowid],
                    )?;
                }
            }

            ed.build_entry_model(entry_id)
        })
    }

    /// Delete an entry. Refuses while senses remain unless `cascade` is
    /// set.
    pub fn delete_entry(&mut self, entry_id: &str, cascade: bool) -> Result<()> {
        self.mutate(|ed| {
            let row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

            let sense_count: i64 = ed.conn().query_row(
                "SELECT COUNT(*) FROM senses WHERE entry_rowid = ?1",
                params![row.rowid],
                |r| r.get(0),
            )?;
            if sense_count > 0 && !cascade {
                return Err(EditorError::Relation(format!(
                    "entry {entry_id} has {sense_count} senses; \
                     pass cascade = true to force deletion"
                )));
            }

            if cascade {
                let sense_ids: Vec<String> = {
                    let mut stmt = ed
                        .conn()
                        .prepare("SELECT id FROM senses WHERE entry_rowid = ?1")?;
                    let ids = stmt
                        .query_map(params![row.rowid], |r| r.get(0))?
                        .collect::<std::result::Result<_, _>>()?;
                    ids
                };
                for sense_id in sense_ids {
                    ed.remove_sense_internal(&sense_id)?;
                }
            }

            history::record_delete(ed.conn(), "entry", entry_id, Some(json!({"pos": row.pos})))?;
            ed.conn()
                .execute("DELETE FROM entries WHERE rowid = ?1", params![row.rowid])?;
            Ok(())
        })
    }

    /// Fetch an entry by id.
    pub fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        self.build_entry_model(entry_id)
    }

    /// Find entries matching every given filter.
    pub fn find_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(lexicon) = &filter.lexicon {
            let Some(lex_rowid) = db::lexicon_rowid(self.conn(), lexicon)? else {
                return Ok(Vec::new());
            };
            clauses.push("e.lexicon_rowid = ?".into());
            params_vec.push(lex_rowid.to_string());
        }
        if let Some(lemma) = &filter.lemma {
            clauses.push("e.rowid IN (SELECT entry_rowid FROM forms WHERE form = ? AND rank = 0)".into());
            params_vec.push(lemma.clone());
        }
        if let Some(pos) = filter.pos {
            clauses.push("e.pos = ?".into());
            params_vec.push(pos.as_str().to_string());
        }

        let where_clause = if clauses.is_empty() {
            "1=1".to_string()
        } else {
            clauses.join(" AND ")
        };
        let sql = format!("SELECT e.id FROM entries e WHERE {where_clause} ORDER BY e.rowid");
        let mut stmt = self.conn().prepare(&sql)?;
        let ids: Vec<String> = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), |r| r.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        ids.iter().map(|id| self.build_entry_model(id)).collect()
    }

    /// Add a written form at rank max+1. Uniqueness is per
    /// `(entry, written form, script)`.
    pub fn add_form(&mut self, entry_id: &str, written_form: &str, options: FormOptions) -> Result<()> {
        self.mutate(|ed| {
            let row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

            // The unique index does not catch NULL scripts; check here so
            // (entry, form, script) stays unique either way.
            let existing: Option<i64> = ed
                .conn()
                .query_row(
                    "SELECT rowid FROM forms \
                     WHERE entry_rowid = ?1 AND form = ?2 AND script IS ?3",
                    params![row.rowid, written_form, options.script],
                    |r| r.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(EditorError::Duplicate(format!(
                    "form {written_form:?} already exists for entry {entry_id:?}"
                )));
            }

            let max_rank: Option<i64> = ed.conn().query_row(
                "SELECT MAX(rank) FROM forms WHERE entry_rowid = ?1",
                params![row.rowid],
                |r| r.get(0),
            )?;
            let rank = max_rank.unwrap_or(0) + 1;

            ed.conn()
                .execute(
                    "INSERT INTO forms \
                     (id, lexicon_rowid, entry_rowid, form, normalized_form, script, rank) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        options.id,
                        row.lexicon_rowid,
                        row.rowid,
                        written_form,
                        normalized_form_of(written_form),
                        options.script,
                        rank,
                    ],
                )
                .map_err(|e| {
                    if db::is_constraint_violation(&e) {
                        EditorError::Duplicate(format!(
                            "form {written_form:?} already exists for entry {entry_id:?}"
                        ))
                    } else {
                        e.into()
                    }
                })?;
            let form_rowid = ed.conn().last_insert_rowid();

            for (tag, category) in &options.tags {
                ed.conn().execute(
                    "INSERT INTO tags (form_rowid, lexicon_rowid, tag, category) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![form_rowid, row.lexicon_rowid, tag, category],
                )?;
            }

            history::record_create(
                ed.conn(),
                "form",
                &format!("{entry_id}:{written_form}"),
                Some(json!({"written_form": written_form})),
            )?;
            Ok(())
        })
    }

    /// Remove a form by its written text. The lemma (rank 0) cannot be
    /// removed.
    pub fn remove_form(&mut self, entry_id: &str, written_form: &str) -> Result<()> {
        self.mutate(|ed| {
            let row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

            let form: Option<(i64, i64)> = ed
                .conn()
                .query_row(
                    "SELECT rowid, rank FROM forms WHERE entry_rowid = ?1 AND form = ?2",
                    params![row.rowid, written_form],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;
            let Some((form_rowid, rank)) = form else {
                return Err(EditorError::not_found("form", written_form));
            };
            if rank == 0 {
                return Err(EditorError::Validation(
                    "cannot remove the lemma form".into(),
                ));
            }

            ed.conn()
                .execute("DELETE FROM forms WHERE rowid = ?1", params![form_rowid])?;
            history::record_delete(
                ed.conn(),
                "form",
                &format!("{entry_id}:{written_form}"),
                None,
            )?;
            Ok(())
        })
    }

    /// Attach a pronunciation to an existing form.
    pub fn add_pronunciation(
        &mut self,
        entry_id: &str,
        written_form: &str,
        value: &str,
        options: PronunciationOptions,
    ) -> Result<()> {
        self.mutate(|ed| {
            let (form_rowid, lexicon_rowid) = ed.form_rowid(entry_id, written_form)?;
            ed.conn().execute(
                "INSERT INTO pronunciations \
                 (form_rowid, lexicon_rowid, value, variety, notation, phonemic, audio) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    form_rowid,
                    lexicon_rowid,
                    value,
                    options.variety,
                    options.notation,
                    options.phonemic,
                    options.audio,
                ],
            )?;
            history::record_update(
                ed.conn(),
                "form",
                &format!("{entry_id}:{written_form}"),
                "pronunciation",
                Value::Null,
                Value::from(value),
            )?;
            Ok(())
        })
    }

    /// Attach a tag to an existing form.
    pub fn add_tag(
        &mut self,
        entry_id: &str,
        written_form: &str,
        tag: &str,
        category: &str,
    ) -> Result<()> {
        self.mutate(|ed| {
            let (form_rowid, lexicon_rowid) = ed.form_rowid(entry_id, written_form)?;
            ed.conn().execute(
                "INSERT INTO tags (form_rowid, lexicon_rowid, tag, category) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![form_rowid, lexicon_rowid, tag, category],
            )?;
            history::record_update(
                ed.conn(),
                "form",
                &format!("{entry_id}:{written_form}"),
                "tag",
                Value::Null,
                Value::from(tag),
            )?;
            Ok(())
        })
    }

    fn form_rowid(&self, entry_id: &str, written_form: &str) -> Result<(i64, i64)> {
        let row = db::entry_row(self.conn(), entry_id)?
            .ok_or_else(|| EditorError::not_found("entry", entry_id))?;
        let form_rowid: Option<i64> = self
            .conn()
            .query_row(
                "SELECT rowid FROM forms WHERE entry_rowid = ?1 AND form = ?2",
                params![row.rowid, written_form],
                |r| r.get(0),
            )
            .optional()?;
        match form_rowid {
            Some(form_rowid) => Ok((form_rowid, row.lexicon_rowid)),
            None => Err(EditorError::not_found("form", written_form)),
        }
    }

    /// All forms of an entry ordered by rank, with pronunciations and
    /// tags.
    pub fn get_forms(&self, entry_id: &str) -> Result<Vec<Form>> {
        let row = db::entry_row(self.conn(), entry_id)?
            .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

        let mut stmt = self.conn().prepare(
            "SELECT rowid, id, form, script, rank FROM forms \
             WHERE entry_rowid = ?1 ORDER BY rank",
        )?;
        let form_rows: Vec<(i64, Option<String>, String, Option<String>, i64)> = stmt
            .query_map(params![row.rowid], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        let mut forms = Vec::with_capacity(form_rows.len());
        for (form_rowid, id, written_form, script, rank) in form_rows {
            let mut pron_stmt = self.conn().prepare(
                "SELECT value, variety, notation, phonemic, audio \
                 FROM pronunciations WHERE form_rowid = ?1",
            )?;
            let pronunciations: Vec<Pronunciation> = pron_stmt
                .query_map(params![form_rowid], |r| {
                    Ok(Pronunciation {
                        value: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        variety: r.get(1)?,
                        notation: r.get(2)?,
                        phonemic: r.get(3)?,
                        audio: r.get(4)?,
                    })
                })?
                .collect::<std::result::Result<_, _>>()?;

            let mut tag_stmt = self
                .conn()
                .prepare("SELECT tag, category FROM tags WHERE form_rowid = ?1")?;
            let tags: Vec<Tag> = tag_stmt
                .query_map(params![form_rowid], |r| {
                    Ok(Tag {
                        tag: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        category: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    })
                })?
                .collect::<std::result::Result<_, _>>()?;

            forms.push(Form {
                written_form,
                id,
                script,
                rank,
                pronunciations,
                tags,
            });
        }
        Ok(forms)
    }

    /// Replace the lemma text. Edits the rank-0 form and the entry-index
    /// row; the entry id does not change.
    pub fn update_lemma(&mut self, entry_id: &str, new_lemma: &str) -> Result<()> {
        self.mutate(|ed| {
            let row = db::entry_row(ed.conn(), entry_id)?
                .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

            let old_lemma: Option<String> = ed
                .conn()
                .query_row(
                    "SELECT form FROM forms WHERE entry_rowid = ?1 AND rank = 0",
                    params![row.rowid],
                    |r| r.get(0),
                )
                .optional()?;

            ed.conn().execute(
                "UPDATE forms SET form = ?1, normalized_form = ?2 \
                 WHERE entry_rowid = ?3 AND rank = 0",
                params![new_lemma, normalized_form_of(new_lemma), row.rowid],
            )?;
            ed.conn().execute(
                "UPDATE entry_index SET lemma = ?1 WHERE entry_rowid = ?2",
                params![new_lemma, row.rowid],
            )?;
            history::record_update(
                ed.conn(),
                "entry",
                entry_id,
                "lemma",
                old_lemma.map(Value::from).unwrap_or(Value::Null),
                Value::from(new_lemma),
            )?;
            Ok(())
        })
    }

    pub(crate) fn build_entry_model(&self, entry_id: &str) -> Result<Entry> {
        let row = db::entry_row(self.conn(), entry_id)?
            .ok_or_else(|| EditorError::not_found("entry", entry_id))?;

        let lexicon_id: String = self.conn().query_row(
            "SELECT id FROM lexicons WHERE rowid = ?1",
            params![row.lexicon_rowid],
            |r| r.get(0),
        )?;
        let lemma: Option<String> = self
            .conn()
            .query_row(
                "SELECT form FROM forms WHERE entry_rowid = ?1 AND rank = 0",
                params![row.rowid],
                |r| r.get(0),
            )
            .optional()?;
        let index: Option<String> = self
            .conn()
            .query_row(
                "SELECT lemma FROM entry_index WHERE entry_rowid = ?1",
                params![row.rowid],
                |r| r.get(0),
            )
            .optional()?;

        Ok(Entry {
            id: row.id,
            lexicon_id,
            lemma: lemma.unwrap_or_default(),
            pos: row.pos.parse()?,
            index,
            metadata: parse_metadata(row.metadata),
        })
    }

    /// Generate `"{lexicon}-{normalized}-{pos}"`, suffixing with the
    /// smallest unused integer ≥ 2 on collision. Suffixes freed by
    /// deletions are reused, and the sibling scan escapes LIKE wildcards
    /// so `foo_bar` and `foo-bar` never cross-match.
    pub(crate) fn generate_entry_id(
        &self,
        lexicon_id: &str,
        lemma: &str,
        pos: PartOfSpeech,
    ) -> Result<String> {
        let normalized = normalize_lemma(lemma);
        let base = format!("{lexicon_id}-{normalized}-{pos}");
        if db::entry_rowid(self.conn(), &base)?.is_none() {
            return Ok(base);
        }

        let pattern = format!("{}-%", db::escape_like(&base));
        let mut stmt = self
            .conn()
            .prepare("SELECT id FROM entries WHERE id LIKE ?1 ESCAPE '\\'")?;
        let sibling_ids: Vec<String> = stmt
            .query_map(params![pattern], |r| r.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        let taken: HashSet<u64> = sibling_ids
            .iter()
            .filter_map(|id| id.strip_prefix(&format!("{base}-")))
            .filter_map(|suffix| suffix.parse().ok())
            .collect();

        let mut n = 2;
        while taken.contains(&n) {
            n += 1;
        }
        Ok(format!("{base}-{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon("test", "Test", "en", "a@b.c", "MIT", "1.0", Default::default())
            .unwrap();
        editor
    }

    #[test]
    fn test_create_entry_with_generated_id() {
        let mut ed = editor();
        let entry = ed
            .create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(entry.id, "test-cat-n");
        assert_eq!(entry.lemma, "cat");
        assert_eq!(entry.index.as_deref(), Some("cat"));
    }

    #[test]
    fn test_entry_id_gap_filling() {
        let mut ed = editor();
        let e1 = ed
            .create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e1.id, "test-cat-n");
        let e2 = ed
            .create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e2.id, "test-cat-n-2");
        let e3 = ed
            .create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e3.id, "test-cat-n-3");

        // Deleting the middle entry frees its suffix for reuse.
        ed.delete_entry(&e2.id, false).unwrap();
        let e4 = ed
            .create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e4.id, "test-cat-n-2");
        let e5 = ed
            .create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e5.id, "test-cat-n-4");
    }

    #[test]
    fn test_entry_id_wildcards_do_not_cross_match() {
        let mut ed = editor();
        // "foo bar" normalizes to foo_bar; "foo-bar" stays foo-bar. With
        // an unescaped LIKE the `_` would match `-` and the suffix scans
        // would see each other's ids.
        let e1 = ed
            .create_entry("test", "foo bar", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e1.id, "test-foo_bar-n");
        let e2 = ed
            .create_entry("test", "foo-bar", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e2.id, "test-foo-bar-n");
        let e3 = ed
            .create_entry("test", "foo-bar", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e3.id, "test-foo-bar-n-2");
        let e4 = ed
            .create_entry("test", "foo bar", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(e4.id, "test-foo_bar-n-2");
    }

    #[test]
    fn test_normalization_fallback() {
        let mut ed = editor();
        let entry = ed
            .create_entry("test", "!!!", PartOfSpeech::N, Default::default())
            .unwrap();
        assert_eq!(entry.id, "test-entry-n");
    }

    #[test]
    fn test_forms_lifecycle() {
        let mut ed = editor();
        let entry = ed
            .create_entry(
                "test",
                "colour",
                PartOfSpeech::N,
                EntryOptions {
                    forms: vec!["color".into()],
                    ..Default::default()
                },
            )
            .unwrap();

        ed.add_form(&entry.id, "colours", Default::default()).unwrap();
        let forms = ed.get_forms(&entry.id).unwrap();
        assert_eq!(forms.len(), 3);
        assert_eq!(forms[0].rank, 0);
        assert_eq!(forms[0].written_form, "colour");
        assert_eq!(forms[2].written_form, "colours");
        assert_eq!(forms[2].rank, 2);

        // Duplicate form refused; lemma undeletable.
        assert!(matches!(
            ed.add_form(&entry.id, "color", Default::default()).unwrap_err(),
            EditorError::Duplicate(_)
        ));
        assert!(matches!(
            ed.remove_form(&entry.id, "colour").unwrap_err(),
            EditorError::Validation(_)
        ));

        ed.remove_form(&entry.id, "color").unwrap();
        assert_eq!(ed.get_forms(&entry.id).unwrap().len(), 2);
    }

    #[test]
    fn test_pronunciations_and_tags() {
        let mut ed = editor();
        let entry = ed
            .create_entry("test", "rabbit", PartOfSpeech::N, Default::default())
            .unwrap();
        ed.add_pronunciation(
            &entry.id,
            "rabbit",
            "'ræbɪt",
            PronunciationOptions {
                variety: Some("en-GB-fonipa".into()),
                ..Default::default()
            },
        )
        .unwrap();
        ed.add_tag(&entry.id, "rabbit", "NN", "penn").unwrap();

        let forms = ed.get_forms(&entry.id).unwrap();
        assert_eq!(forms[0].pronunciations.len(), 1);
        assert_eq!(forms[0].pronunciations[0].value, "'ræbɪt");
        assert!(forms[0].pronunciations[0].phonemic);
        assert_eq!(forms[0].tags[0].tag, "NN");
        assert_eq!(forms[0].tags[0].category, "penn");
    }

    #[test]
    fn test_update_lemma_keeps_id() {
        let mut ed = editor();
        let entry = ed
            .create_entry("test", "gray", PartOfSpeech::A, Default::default())
            .unwrap();
        ed.update_lemma(&entry.id, "grey").unwrap();
        let updated = ed.get_entry(&entry.id).unwrap();
        assert_eq!(updated.id, "test-gray-a");
        assert_eq!(updated.lemma, "grey");
        assert_eq!(updated.index.as_deref(), Some("grey"));
    }

    #[test]
    fn test_find_entries() {
        let mut ed = editor();
        ed.create_entry("test", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        ed.create_entry("test", "dog", PartOfSpeech::N, Default::default())
            .unwrap();
        let found = ed
            .find_entries(&EntryFilter {
                lemma: Some("cat".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "test-cat-n");
        assert_eq!(
            ed.find_entries(&EntryFilter {
                lexicon: Some("test:1.0".into()),
                ..Default::default()
            })
            .unwrap()
            .len(),
            2
        );
    }
}
