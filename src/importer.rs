//! Bulk import of the intermediate resource shape into the store.
//!
//! The importer populates the store in dependency order: lexicon row,
//! relation-kind and lexfile pre-seeding, synsets in bulk (keeping an
//! id→rowid map for later cross-references), entries with their forms
//! and senses, then relations, definitions, and examples once every
//! entity exists. Sense targets are resolved within the current lexicon
//! first and globally second; orphaned senses are skipped silently.

use std::collections::HashMap;

use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, params};

use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::lmf;
use crate::models::metadata_to_json;

/// Lexicon attribute overrides applied after an import.
#[derive(Debug, Clone, Default)]
pub struct ImportOverrides {
    pub lexicon_id: Option<String>,
    pub version: Option<String>,
    pub label: Option<String>,
    pub email: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub citation: Option<String>,
}

impl ImportOverrides {
    pub fn is_empty(&self) -> bool {
        self.lexicon_id.is_none()
            && self.version.is_none()
            && self.label.is_none()
            && self.email.is_none()
            && self.license.is_none()
            && self.url.is_none()
            && self.citation.is_none()
    }
}

/// Import every lexicon of a resource. The caller supplies the
/// transaction scope.
pub(crate) fn import_resource(
    conn: &Connection,
    resource: &lmf::LexicalResource,
    record_history: bool,
) -> Result<()> {
    for lexicon in &resource.lexicons {
        import_lexicon(conn, lexicon, record_history)?;
    }
    Ok(())
}

fn import_lexicon(conn: &Connection, lexicon: &lmf::Lexicon, record_history: bool) -> Result<()> {
    let specifier = format!("{}:{}", lexicon.id, lexicon.version);
    info!("importing lexicon {specifier}");

    // One bare id per store, regardless of version.
    let clash: Option<String> = conn
        .query_row(
            "SELECT version FROM lexicons WHERE id = ?1",
            params![lexicon.id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(version_held) = clash {
        return Err(EditorError::Duplicate(format!(
            "lexicon {} already exists (version {version_held})",
            lexicon.id
        )));
    }

    let meta = lmf::MetaFields {
        dc_source: lexicon.dc_source.clone(),
        status: lexicon.status.clone(),
        note: lexicon.note.clone(),
        confidence_score: lexicon.confidence_score,
    }
    .into_metadata();
    conn.execute(
        "INSERT INTO lexicons \
         (specifier, id, label, language, email, license, version, \
         url, citation, logo, metadata, modified) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
        params![
            specifier,
            lexicon.id,
            lexicon.label,
            lexicon.language,
            lexicon.email,
            lexicon.license,
            lexicon.version,
            none_if_empty(&lexicon.url),
            none_if_empty(&lexicon.citation),
            none_if_empty(&lexicon.logo),
            metadata_to_json(meta.as_ref()),
        ],
    )?;
    let lex_rowid = conn.last_insert_rowid();

    if record_history {
        history::record_create(conn, "lexicon", &lexicon.id, None)?;
    }

    for dep in &lexicon.requires {
        let provider_rowid: Option<i64> = conn
            .query_row(
                "SELECT rowid FROM lexicons WHERE id = ?1 AND version = ?2",
                params![dep.id, dep.version],
                |r| r.get(0),
            )
            .optional()?;
        conn.execute(
            "INSERT INTO lexicon_dependencies \
             (dependent_rowid, provider_id, provider_version, provider_url, provider_rowid) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![lex_rowid, dep.id, dep.version, dep.url, provider_rowid],
        )?;
    }

    // Pre-seed relation kinds and lexfiles referenced anywhere in the
    // input.
    let mut kinds: Vec<&str> = Vec::new();
    let mut lexfiles: Vec<&str> = Vec::new();
    for synset in &lexicon.synsets {
        for relation in &synset.relations {
            kinds.push(&relation.rel_type);
        }
        if let Some(lexfile) = synset.lexfile.as_deref().filter(|l| !l.is_empty()) {
            lexfiles.push(lexfile);
        }
    }
    for entry in &lexicon.entries {
        for sense in &entry.senses {
            for relation in &sense.relations {
                kinds.push(&relation.rel_type);
            }
        }
    }
    kinds.sort_unstable();
    kinds.dedup();
    lexfiles.sort_unstable();
    lexfiles.dedup();
    for kind in kinds {
        db::get_or_create_relation_type(conn, kind)?;
    }
    for lexfile in &lexfiles {
        db::get_or_create_lexfile(conn, lexfile)?;
    }

    let synset_rowids = insert_synsets(conn, lexicon, lex_rowid, record_history)?;
    let sense_rowids = insert_entries(conn, lexicon, lex_rowid, &synset_rowids, record_history)?;
    insert_frames(conn, lexicon, lex_rowid, &sense_rowids)?;
    insert_relations(conn, lexicon, lex_rowid, &synset_rowids, &sense_rowids)?;
    insert_definitions_and_examples(conn, lexicon, lex_rowid, &synset_rowids, &sense_rowids)?;

    info!(
        "imported lexicon {specifier}: {} synsets, {} entries",
        lexicon.synsets.len(),
        lexicon.entries.len()
    );
    Ok(())
}

fn insert_synsets(
    conn: &Connection,
    lexicon: &lmf::Lexicon,
    lex_rowid: i64,
    record_history: bool,
) -> Result<HashMap<String, i64>> {
    let mut synset_rowids = HashMap::with_capacity(lexicon.synsets.len());

    let lexfile_map: HashMap<String, i64> = {
        let mut stmt = conn.prepare("SELECT name, rowid FROM lexfiles")?;
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        rows
    };

    let mut synset_stmt = conn.prepare(
        "INSERT INTO synsets (id, lexicon_rowid, ili_rowid, pos, lexfile_rowid, metadata) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut proposed_stmt = conn.prepare(
        "INSERT INTO proposed_ilis (synset_rowid, definition, metadata) VALUES (?1, ?2, ?3)",
    )?;
    let mut unlex_stmt =
        conn.prepare("INSERT INTO unlexicalized_synsets (synset_rowid) VALUES (?1)")?;

    for synset in &lexicon.synsets {
        let ili = synset.ili.as_deref().filter(|v| !v.is_empty());
        let ili_rowid = match ili {
            Some(ili_id) if ili_id != "in" => {
                Some(db::get_or_create_ili(conn, ili_id, "presupposed")?)
            }
            _ => None,
        };
        let lexfile_rowid = synset
            .lexfile
            .as_deref()
            .and_then(|l| lexfile_map.get(l))
            .copied();

        let meta = lmf::MetaFields {
            dc_source: synset.dc_source.clone(),
            status: synset.status.clone(),
            note: synset.note.clone(),
            confidence_score: synset.confidence_score,
        }
        .into_metadata();
        synset_stmt.execute(params![
            synset.id,
            lex_rowid,
            ili_rowid,
            synset.part_of_speech.map(|p| p.as_str()),
            lexfile_rowid,
            metadata_to_json(meta.as_ref()),
        ])?;
        let synset_rowid = conn.last_insert_rowid();
        synset_rowids.insert(synset.id.clone(), synset_rowid);

        if ili == Some("in") {
            let (text, meta) = match &synset.ili_definition {
                Some(ili_definition) => (
                    ili_definition.text.clone(),
                    lmf::MetaFields {
                        dc_source: ili_definition.dc_source.clone(),
                        ..Default::default()
                    }
                    .into_metadata(),
                ),
                None => (String::new(), None),
            };
            proposed_stmt.execute(params![synset_rowid, text, metadata_to_json(meta.as_ref())])?;
        }

        if !synset.lexicalized {
            unlex_stmt.execute(params![synset_rowid])?;
        }

        if record_history {
            history::record_create(conn, "synset", &synset.id, None)?;
        }
    }
    Ok(synset_rowids)
}

fn insert_entries(
    conn: &Connection,
    lexicon: &lmf::Lexicon,
    lex_rowid: i64,
    synset_rowids: &HashMap<String, i64>,
    record_history: bool,
) -> Result<HashMap<String, i64>> {
    let mut sense_rowids = HashMap::new();

    for entry in &lexicon.entries {
        let meta = lmf::MetaFields {
            dc_source: entry.dc_source.clone(),
            status: entry.status.clone(),
            note: entry.note.clone(),
            confidence_score: entry.confidence_score,
        }
        .into_metadata();
        conn.execute(
            "INSERT INTO entries (id, lexicon_rowid, pos, metadata) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                lex_rowid,
                entry.lemma.part_of_speech.as_str(),
                metadata_to_json(meta.as_ref()),
            ],
        )?;
        let entry_rowid = conn.last_insert_rowid();

        let index = entry
            .index
            .clone()
            .unwrap_or_else(|| entry.lemma.written_form.clone());
        conn.execute(
            "INSERT INTO entry_index (entry_rowid, lemma) VALUES (?1, ?2)",
            params![entry_rowid, index],
        )?;

        insert_form(
            conn,
            lex_rowid,
            entry_rowid,
            None,
            &entry.lemma.written_form,
            entry.lemma.script.as_deref(),
            0,
            &entry.lemma.pronunciations,
            &entry.lemma.tags,
        )?;

        for (rank, form) in entry.forms.iter().enumerate() {
            insert_form(
                conn,
                lex_rowid,
                entry_rowid,
                form.id.as_deref(),
                &form.written_form,
                form.script.as_deref(),
                rank as i64 + 1,
                &form.pronunciations,
                &form.tags,
            )?;
        }

        for (position, sense) in entry.senses.iter().enumerate() {
            let rank = position as i64 + 1;
            // Resolve the target synset locally first, then globally.
            let synset_rowid = match synset_rowids.get(&sense.synset) {
                Some(rowid) => Some(*rowid),
                None => db::synset_rowid(conn, &sense.synset)?,
            };
            let Some(synset_rowid) = synset_rowid else {
                debug!(
                    "skipping sense {} with unresolved synset {}",
                    sense.id, sense.synset
                );
                continue;
            };

            let entry_rank = sense.n.filter(|n| *n > 0).unwrap_or(rank);
            let meta = lmf::MetaFields {
                dc_source: sense.dc_source.clone(),
                status: sense.status.clone(),
                note: sense.note.clone(),
                confidence_score: sense.confidence_score,
            }
            .into_metadata();
            conn.execute(
                "INSERT INTO senses \
                 (id, lexicon_rowid, entry_rowid, entry_rank, synset_rowid, synset_rank, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    sense.id,
                    lex_rowid,
                    entry_rowid,
                    entry_rank,
                    synset_rowid,
                    rank,
                    metadata_to_json(meta.as_ref()),
                ],
            )?;
            let sense_rowid = conn.last_insert_rowid();
            sense_rowids.insert(sense.id.clone(), sense_rowid);

            if !sense.lexicalized {
                conn.execute(
                    "INSERT INTO unlexicalized_senses (sense_rowid) VALUES (?1)",
                    params![sense_rowid],
                )?;
            }
            if let Some(adjposition) = sense.adjposition.as_deref().filter(|a| !a.is_empty()) {
                conn.execute(
                    "INSERT INTO adjpositions (sense_rowid, adjposition) VALUES (?1, ?2)",
                    params![sense_rowid, adjposition],
                )?;
            }
            for count in &sense.counts {
                let meta = lmf::MetaFields {
                    dc_source: count.dc_source.clone(),
                    ..Default::default()
                }
                .into_metadata();
                conn.execute(
                    "INSERT INTO counts (lexicon_rowid, sense_rowid, count, metadata) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![lex_rowid, sense_rowid, count.value, metadata_to_json(meta.as_ref())],
                )?;
            }
            for example in &sense.examples {
                let meta = lmf::MetaFields {
                    dc_source: example.dc_source.clone(),
                    ..Default::default()
                }
                .into_metadata();
                conn.execute(
                    "INSERT INTO sense_examples \
                     (lexicon_rowid, sense_rowid, example, language, metadata) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        lex_rowid,
                        sense_rowid,
                        example.text,
                        example.language,
                        metadata_to_json(meta.as_ref()),
                    ],
                )?;
            }

            if record_history {
                history::record_create(conn, "sense", &sense.id, None)?;
            }
        }

        if record_history {
            history::record_create(conn, "entry", &entry.id, None)?;
        }
    }
    Ok(sense_rowids)
}

#[allow(clippy::too_many_arguments)]
fn insert_form(
    conn: &Connection,
    lex_rowid: i64,
    entry_rowid: i64,
    form_id: Option<&str>,
    written_form: &str,
    script: Option<&str>,
    rank: i64,
    pronunciations: &[lmf::Pronunciation],
    tags: &[lmf::Tag],
) -> Result<()> {
    let lowered = written_form.to_lowercase();
    let normalized = (lowered != written_form).then_some(lowered);
    conn.execute(
        "INSERT INTO forms \
         (id, lexicon_rowid, entry_rowid, form, normalized_form, script, rank) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            form_id,
            lex_rowid,
            entry_rowid,
            written_form,
            normalized,
            script.filter(|s| !s.is_empty()),
            rank
        ],
    )?;
    let form_rowid = conn.last_insert_rowid();

    for pronunciation in pronunciations {
        conn.execute(
            "INSERT INTO pronunciations \
             (form_rowid, lexicon_rowid, value, variety, notation, phonemic, audio) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form_rowid,
                lex_rowid,
                pronunciation.value,
                pronunciation.variety,
                pronunciation.notation,
                pronunciation.phonemic,
                pronunciation.audio,
            ],
        )?;
    }
    for tag in tags {
        conn.execute(
            "INSERT INTO tags (form_rowid, lexicon_rowid, tag, category) \
             VALUES (?1, ?2, ?3, ?4)",
            params![form_rowid, lex_rowid, tag.tag, tag.category],
        )?;
    }
    Ok(())
}

fn insert_frames(
    conn: &Connection,
    lexicon: &lmf::Lexicon,
    lex_rowid: i64,
    sense_rowids: &HashMap<String, i64>,
) -> Result<()> {
    // Frames can be referenced from two directions: the frame's own
    // legacy `senses` attribute and each sense's `subcat` list.
    for frame in &lexicon.frames {
        conn.execute(
            "INSERT OR IGNORE INTO syntactic_behaviours (id, lexicon_rowid, frame) \
             VALUES (?1, ?2, ?3)",
            params![
                frame.id.as_deref().filter(|i| !i.is_empty()),
                lex_rowid,
                frame.frame
            ],
        )?;
        let sb_rowid: i64 = conn.query_row(
            "SELECT rowid FROM syntactic_behaviours WHERE lexicon_rowid = ?1 AND frame = ?2",
            params![lex_rowid, frame.frame],
            |r| r.get(0),
        )?;

        if let Some(senses) = &frame.senses {
            for sense_id in lmf::parse_id_list(senses) {
                if let Some(sense_rowid) = sense_rowids.get(&sense_id) {
                    link_frame_sense(conn, sb_rowid, *sense_rowid)?;
                }
            }
        }
    }

    for entry in &lexicon.entries {
        for sense in &entry.senses {
            let Some(subcat) = &sense.subcat else {
                continue;
            };
            let Some(sense_rowid) = sense_rowids.get(&sense.id) else {
                continue;
            };
            for frame_id in lmf::parse_id_list(subcat) {
                let sb_rowid: Option<i64> = conn
                    .query_row(
                        "SELECT rowid FROM syntactic_behaviours \
                         WHERE lexicon_rowid = ?1 AND id = ?2",
                        params![lex_rowid, frame_id],
                        |r| r.get(0),
                    )
                    .optional()?;
                if let Some(sb_rowid) = sb_rowid {
                    link_frame_sense(conn, sb_rowid, *sense_rowid)?;
                }
            }
        }
    }
    Ok(())
}

fn link_frame_sense(conn: &Connection, sb_rowid: i64, sense_rowid: i64) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM syntactic_behaviour_senses \
             WHERE syntactic_behaviour_rowid = ?1 AND sense_rowid = ?2",
            params![sb_rowid, sense_rowid],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        conn.execute(
            "INSERT INTO syntactic_behaviour_senses \
             (syntactic_behaviour_rowid, sense_rowid) VALUES (?1, ?2)",
            params![sb_rowid, sense_rowid],
        )?;
    }
    Ok(())
}

fn insert_relations(
    conn: &Connection,
    lexicon: &lmf::Lexicon,
    lex_rowid: i64,
    synset_rowids: &HashMap<String, i64>,
    sense_rowids: &HashMap<String, i64>,
) -> Result<()> {
    for synset in &lexicon.synsets {
        let Some(source_rowid) = synset_rowids.get(&synset.id) else {
            continue;
        };
        for relation in &synset.relations {
            let target_rowid = match synset_rowids.get(&relation.target) {
                Some(rowid) => Some(*rowid),
                None => db::synset_rowid(conn, &relation.target)?,
            };
            let Some(target_rowid) = target_rowid else {
                warn!(
                    "dropping synset relation {} -{}-> {}: target not found",
                    synset.id, relation.rel_type, relation.target
                );
                continue;
            };
            let type_rowid = db::get_or_create_relation_type(conn, &relation.rel_type)?;
            let meta = lmf::MetaFields {
                dc_source: relation.dc_source.clone(),
                status: relation.status.clone(),
                note: relation.note.clone(),
                confidence_score: relation.confidence_score,
            }
            .into_metadata();
            conn.execute(
                "INSERT OR IGNORE INTO synset_relations \
                 (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    lex_rowid,
                    source_rowid,
                    target_rowid,
                    type_rowid,
                    metadata_to_json(meta.as_ref()),
                ],
            )?;
        }
    }

    for entry in &lexicon.entries {
        for sense in &entry.senses {
            let Some(source_rowid) = sense_rowids.get(&sense.id) else {
                continue;
            };
            for relation in &sense.relations {
                let type_rowid = db::get_or_create_relation_type(conn, &relation.rel_type)?;
                let meta = lmf::MetaFields {
                    dc_source: relation.dc_source.clone(),
                    status: relation.status.clone(),
                    note: relation.note.clone(),
                    confidence_score: relation.confidence_score,
                }
                .into_metadata();
                let meta_json = metadata_to_json(meta.as_ref());

                // Sense targets take precedence over synset targets when
                // an id resolves to both.
                let target_sense = match sense_rowids.get(&relation.target) {
                    Some(rowid) => Some(*rowid),
                    None => db::sense_rowid(conn, &relation.target)?,
                };
                if let Some(target_rowid) = target_sense {
                    conn.execute(
                        "INSERT OR IGNORE INTO sense_relations \
                         (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![lex_rowid, source_rowid, target_rowid, type_rowid, meta_json],
                    )?;
                    continue;
                }

                let target_synset = match synset_rowids.get(&relation.target) {
                    Some(rowid) => Some(*rowid),
                    None => db::synset_rowid(conn, &relation.target)?,
                };
                if let Some(target_rowid) = target_synset {
                    conn.execute(
                        "INSERT OR IGNORE INTO sense_synset_relations \
                         (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![lex_rowid, source_rowid, target_rowid, type_rowid, meta_json],
                    )?;
                } else {
                    warn!(
                        "dropping sense relation {} -{}-> {}: target not found",
                        sense.id, relation.rel_type, relation.target
                    );
                }
            }
        }
    }
    Ok(())
}

fn insert_definitions_and_examples(
    conn: &Connection,
    lexicon: &lmf::Lexicon,
    lex_rowid: i64,
    synset_rowids: &HashMap<String, i64>,
    sense_rowids: &HashMap<String, i64>,
) -> Result<()> {
    for synset in &lexicon.synsets {
        let Some(synset_rowid) = synset_rowids.get(&synset.id) else {
            continue;
        };
        for definition in &synset.definitions {
            let sense_rowid = match definition.source_sense.as_deref() {
                Some(source_sense) => match sense_rowids.get(source_sense) {
                    Some(rowid) => Some(*rowid),
                    None => db::sense_rowid(conn, source_sense)?,
                },
                None => None,
            };
            let meta = lmf::MetaFields {
                dc_source: definition.dc_source.clone(),
                ..Default::default()
            }
            .into_metadata();
            conn.execute(
                "INSERT INTO definitions \
                 (lexicon_rowid, synset_rowid, definition, language, sense_rowid, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    lex_rowid,
                    synset_rowid,
                    definition.text,
                    definition.language,
                    sense_rowid,
                    metadata_to_json(meta.as_ref()),
                ],
            )?;
        }
        for example in &synset.examples {
            let meta = lmf::MetaFields {
                dc_source: example.dc_source.clone(),
                ..Default::default()
            }
            .into_metadata();
            conn.execute(
                "INSERT INTO synset_examples \
                 (lexicon_rowid, synset_rowid, example, language, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    lex_rowid,
                    synset_rowid,
                    example.text,
                    example.language,
                    metadata_to_json(meta.as_ref()),
                ],
            )?;
        }
    }
    Ok(())
}

/// Apply lexicon overrides after an import, rebuilding the specifier
/// when the id or the version changed.
pub(crate) fn apply_overrides(
    conn: &Connection,
    specifier: &str,
    overrides: &ImportOverrides,
) -> Result<()> {
    if overrides.is_empty() {
        return Ok(());
    }
    let row: Option<(i64, String, String)> = conn
        .query_row(
            "SELECT rowid, id, version FROM lexicons WHERE specifier = ?1",
            params![specifier],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((lex_rowid, current_id, current_version)) = row else {
        return Ok(());
    };

    let mut assignments: Vec<(&str, String)> = Vec::new();
    if let Some(id) = &overrides.lexicon_id {
        assignments.push(("id", id.clone()));
    }
    if let Some(version) = &overrides.version {
        assignments.push(("version", version.clone()));
    }
    if let Some(label) = &overrides.label {
        assignments.push(("label", label.clone()));
    }
    if let Some(email) = &overrides.email {
        assignments.push(("email", email.clone()));
    }
    if let Some(license) = &overrides.license {
        assignments.push(("license", license.clone()));
    }
    if let Some(url) = &overrides.url {
        assignments.push(("url", url.clone()));
    }
    if let Some(citation) = &overrides.citation {
        assignments.push(("citation", citation.clone()));
    }

    let new_id = overrides.lexicon_id.as_deref().unwrap_or(&current_id);
    let new_version = overrides.version.as_deref().unwrap_or(&current_version);
    assignments.push(("specifier", format!("{new_id}:{new_version}")));

    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut values: Vec<String> = assignments.into_iter().map(|(_, value)| value).collect();
    values.push(lex_rowid.to_string());
    conn.execute(
        &format!("UPDATE lexicons SET {set_clause} WHERE rowid = ?"),
        rusqlite::params_from_iter(values.iter()),
    )?;
    Ok(())
}

fn none_if_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Editor, SenseFilter};
    use crate::history::HistoryFilter;
    use crate::models::{EditOperation, PartOfSpeech};

    const SAMPLE_LMF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LexicalResource xmlns:dc="http://purl.org/dc/elements/1.1/">
  <Lexicon id="ewn" label="Test English WordNet" language="en"
           email="test@example.com" license="MIT" version="1.0">
    <LexicalEntry id="ewn-cat-n">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Form writtenForm="cats"/>
      <Sense id="ewn-cat-n-00000001-01" synset="ewn-00000001-n">
        <SenseRelation relType="derivation" target="ewn-feline-a-00000002-01"/>
      </Sense>
    </LexicalEntry>
    <LexicalEntry id="ewn-feline-a">
      <Lemma writtenForm="feline" partOfSpeech="a"/>
      <Sense id="ewn-feline-a-00000002-01" synset="ewn-00000002-a"/>
    </LexicalEntry>
    <LexicalEntry id="ewn-orphan-n">
      <Lemma writtenForm="orphan" partOfSpeech="n"/>
      <Sense id="ewn-orphan-n-1" synset="ewn-99999999-n"/>
    </LexicalEntry>
    <Synset id="ewn-00000001-n" partOfSpeech="n" ili="i46593">
      <Definition>A small domesticated carnivorous mammal.</Definition>
      <Example>The cat sat on the mat.</Example>
      <SynsetRelation relType="hypernym" target="ewn-00000002-a"/>
    </Synset>
    <Synset id="ewn-00000002-a" partOfSpeech="a" ili="in" lexicalized="false">
      <Definition>Of or relating to cats generally.</Definition>
      <ILIDefinition>Of or relating to cats as a family.</ILIDefinition>
    </Synset>
  </Lexicon>
</LexicalResource>
"#;

    fn import_sample() -> Editor {
        let mut editor = Editor::open_in_memory().unwrap();
        let resource = crate::lmf::from_xml(SAMPLE_LMF).unwrap();
        editor.import_resource(&resource, true).unwrap();
        editor
    }

    #[test]
    fn test_import_populates_entities() {
        let ed = import_sample();
        let lexicon = ed.get_lexicon("ewn").unwrap();
        assert_eq!(lexicon.label, "Test English WordNet");

        let synset = ed.get_synset("ewn-00000001-n").unwrap();
        assert_eq!(synset.ili.as_deref(), Some("i46593"));
        assert_eq!(synset.pos, Some(PartOfSpeech::N));
        assert_eq!(ed.get_definitions("ewn-00000001-n").unwrap().len(), 1);
        assert_eq!(ed.get_synset_examples("ewn-00000001-n").unwrap().len(), 1);

        let entry = ed.get_entry("ewn-cat-n").unwrap();
        assert_eq!(entry.lemma, "cat");
        assert_eq!(ed.get_forms("ewn-cat-n").unwrap().len(), 2);
    }

    #[test]
    fn test_import_proposed_ili_and_unlexicalized() {
        let ed = import_sample();
        let synset = ed.get_synset("ewn-00000002-a").unwrap();
        assert_eq!(synset.ili.as_deref(), Some("in"));
        assert!(!synset.lexicalized);
        let proposed = ed.get_proposed_ili("ewn-00000002-a").unwrap().unwrap();
        assert_eq!(proposed.definition, "Of or relating to cats as a family.");
    }

    #[test]
    fn test_import_resolves_relations() {
        let ed = import_sample();
        let relations = ed.get_synset_relations("ewn-00000001-n", None).unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].kind, "hypernym");

        let sense_relations = ed
            .get_sense_relations("ewn-cat-n-00000001-01", None)
            .unwrap();
        assert_eq!(sense_relations.len(), 1);
        assert_eq!(sense_relations[0].kind, "derivation");
    }

    #[test]
    fn test_orphan_sense_skipped_silently() {
        let ed = import_sample();
        assert!(ed.get_sense("ewn-orphan-n-1").is_err());
        // The entry itself still imports.
        assert!(ed.get_entry("ewn-orphan-n").is_ok());
        let senses = ed
            .find_senses(&SenseFilter {
                entry: Some("ewn-orphan-n".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(senses.is_empty());
    }

    #[test]
    fn test_reimport_same_lexicon_is_duplicate() {
        let mut ed = import_sample();
        let resource = crate::lmf::from_xml(SAMPLE_LMF).unwrap();
        let err = ed.import_resource(&resource, true).unwrap_err();
        assert!(matches!(err, EditorError::Duplicate(_)));
    }

    #[test]
    fn test_import_history_recording_toggle() {
        let ed = import_sample();
        let creates = ed
            .history(&HistoryFilter {
                operation: Some(EditOperation::Create),
                ..Default::default()
            })
            .unwrap();
        assert!(!creates.is_empty());

        let mut quiet = Editor::open_in_memory().unwrap();
        let resource = crate::lmf::from_xml(SAMPLE_LMF).unwrap();
        quiet.import_resource(&resource, false).unwrap();
        assert!(quiet.history(&HistoryFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_apply_overrides_rebuilds_specifier() {
        let mut ed = import_sample();
        ed.apply_import_overrides(
            "ewn:1.0",
            &ImportOverrides {
                version: Some("2.0".into()),
                label: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let lexicon = ed.get_lexicon("ewn").unwrap();
        assert_eq!(lexicon.version, "2.0");
        assert_eq!(lexicon.label, "Renamed");
        assert_eq!(lexicon.specifier(), "ewn:2.0");
        assert!(ed.get_lexicon("ewn:2.0").is_ok());
    }
}
