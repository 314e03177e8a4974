//! Export of the store to the intermediate resource shape and WN-LMF
//! XML.
//!
//! Synset children (definitions, examples, relations, proposed ILIs,
//! unlexicalized marks, member senses) are prefetched in one query per
//! kind so export cost stays linear in the store size. After writing,
//! the document is re-parsed and structurally checked; any mismatch
//! raises an export error.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{info, warn};
use rusqlite::{Connection, params};

use crate::db;
use crate::error::{EditorError, Result};
use crate::lmf;
use crate::models::parse_metadata;

const SUPPORTED_LMF_VERSIONS: &[&str] = &["1.0", "1.1", "1.3", "1.4"];

/// Options for [`crate::editor::Editor::export_lmf`].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Lexicons (bare ids or specifiers) to export; all when empty.
    pub lexicons: Option<Vec<String>>,
    /// Target WN-LMF schema version.
    pub lmf_version: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            lexicons: None,
            lmf_version: "1.4".to_string(),
        }
    }
}

/// Export to a WN-LMF XML file, then re-parse and structurally check
/// the output.
pub(crate) fn export_to_lmf(
    conn: &Connection,
    destination: &Path,
    options: &ExportOptions,
) -> Result<()> {
    let resource = build_resource(conn, options)?;
    lmf::dump(&resource, destination, &options.lmf_version)?;

    let reloaded = lmf::load(destination).map_err(|e| match e {
        EditorError::Import(message) => {
            EditorError::Export(format!("written document does not parse: {message}"))
        }
        other => other,
    })?;
    verify_export(&resource, &reloaded)?;
    info!(
        "exported {} lexicon(s) to {destination:?}",
        resource.lexicons.len()
    );
    Ok(())
}

fn verify_export(expected: &lmf::LexicalResource, actual: &lmf::LexicalResource) -> Result<()> {
    if expected.lexicons.len() != actual.lexicons.len() {
        return Err(EditorError::Export(format!(
            "lexicon count mismatch after write: expected {}, found {}",
            expected.lexicons.len(),
            actual.lexicons.len()
        )));
    }
    for (want, got) in expected.lexicons.iter().zip(&actual.lexicons) {
        if want.id != got.id
            || want.entries.len() != got.entries.len()
            || want.synsets.len() != got.synsets.len()
        {
            return Err(EditorError::Export(format!(
                "lexicon {} changed shape after write",
                want.id
            )));
        }
    }
    Ok(())
}

/// Build the intermediate resource shape for the selected lexicons.
pub(crate) fn build_resource(
    conn: &Connection,
    options: &ExportOptions,
) -> Result<lmf::LexicalResource> {
    if !SUPPORTED_LMF_VERSIONS.contains(&options.lmf_version.as_str()) {
        return Err(EditorError::Export(format!(
            "unsupported LMF version: {}",
            options.lmf_version
        )));
    }

    let lexicon_rowids: Vec<i64> = match &options.lexicons {
        Some(selected) => {
            let mut rowids = Vec::with_capacity(selected.len());
            for lexicon in selected {
                let rowid = db::lexicon_rowid(conn, lexicon)?
                    .ok_or_else(|| EditorError::not_found("lexicon", lexicon))?;
                rowids.push(rowid);
            }
            rowids
        }
        None => {
            let mut stmt = conn.prepare("SELECT rowid FROM lexicons ORDER BY rowid")?;
            let rowids = stmt
                .query_map([], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            rowids
        }
    };

    // Of the supported versions, only 1.0 predates lexfile and count
    // support.
    if matches!(options.lmf_version.as_str(), "1.0") {
        warn_data_loss(conn, &lexicon_rowids, &options.lmf_version)?;
    }

    let mut lexicons = Vec::with_capacity(lexicon_rowids.len());
    for lex_rowid in lexicon_rowids {
        lexicons.push(build_lexicon(conn, lex_rowid)?);
    }
    Ok(lmf::LexicalResource {
        xmlns_dc: None,
        lexicons,
    })
}

fn warn_data_loss(conn: &Connection, lexicon_rowids: &[i64], lmf_version: &str) -> Result<()> {
    for lex_rowid in lexicon_rowids {
        let lexicon_id: String = conn.query_row(
            "SELECT id FROM lexicons WHERE rowid = ?1",
            params![lex_rowid],
            |r| r.get(0),
        )?;
        let has_lexfiles: i64 = conn.query_row(
            "SELECT COUNT(*) FROM synsets \
             WHERE lexicon_rowid = ?1 AND lexfile_rowid IS NOT NULL",
            params![lex_rowid],
            |r| r.get(0),
        )?;
        if has_lexfiles > 0 {
            warn!("exporting at LMF {lmf_version} will drop lexfile data for {lexicon_id}");
        }
        let has_counts: i64 = conn.query_row(
            "SELECT COUNT(*) FROM counts WHERE lexicon_rowid = ?1",
            params![lex_rowid],
            |r| r.get(0),
        )?;
        if has_counts > 0 {
            warn!("exporting at LMF {lmf_version} will drop count data for {lexicon_id}");
        }
    }
    Ok(())
}

fn build_lexicon(conn: &Connection, lex_rowid: i64) -> Result<lmf::Lexicon> {
    let row = db::lexicon_row_by_rowid(conn, lex_rowid)?
        .ok_or_else(|| EditorError::not_found("lexicon", &lex_rowid.to_string()))?;
    let meta = parse_metadata(row.metadata);
    let meta_fields = lmf::MetaFields::from_metadata(meta.as_ref());

    let mut lexicon = lmf::Lexicon {
        id: row.id,
        label: row.label,
        language: row.language,
        email: row.email,
        license: row.license,
        version: row.version,
        url: row.url,
        citation: row.citation,
        logo: row.logo,
        status: meta_fields.status,
        note: meta_fields.note,
        confidence_score: meta_fields.confidence_score,
        dc_source: meta_fields.dc_source,
        dc_publisher: None,
        dc_contributor: None,
        requires: Vec::new(),
        entries: Vec::new(),
        synsets: Vec::new(),
        frames: Vec::new(),
    };

    // Dependencies.
    {
        let mut stmt = conn.prepare(
            "SELECT provider_id, provider_version, provider_url \
             FROM lexicon_dependencies WHERE dependent_rowid = ?1",
        )?;
        let requires: Vec<lmf::Requires> = stmt
            .query_map(params![lex_rowid], |r| {
                Ok(lmf::Requires {
                    id: r.get(0)?,
                    version: r.get(1)?,
                    url: r.get(2)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        lexicon.requires = requires;
    }

    // Prefetch synset children, one query per kind.
    let definitions = prefetch_definitions(conn, lex_rowid)?;
    let examples = prefetch_examples(conn, lex_rowid)?;
    let relations = prefetch_synset_relations(conn, lex_rowid)?;
    let proposed = prefetch_proposed_ilis(conn, lex_rowid)?;
    let unlexicalized = prefetch_unlexicalized(conn, lex_rowid)?;
    let members = prefetch_members(conn, lex_rowid)?;

    // Entries (with forms and senses).
    let entry_rows: Vec<(i64, String, String, Option<String>)> = {
        let mut stmt = conn.prepare(
            "SELECT rowid, id, pos, metadata FROM entries \
             WHERE lexicon_rowid = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![lex_rowid], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
            })?
            .collect::<std::result::Result<_, _>>()?;
        rows
    };
    for (entry_rowid, entry_id, pos, metadata) in entry_rows {
        lexicon
            .entries
            .push(build_entry(conn, entry_rowid, entry_id, &pos, metadata)?);
    }

    // Synsets.
    let synset_rows: Vec<SynsetRowData> = {
        let mut stmt = conn.prepare(
            "SELECT s.rowid, s.id, s.pos, s.metadata, i.id, lf.name \
             FROM synsets s \
             LEFT JOIN ilis i ON s.ili_rowid = i.rowid \
             LEFT JOIN lexfiles lf ON s.lexfile_rowid = lf.rowid \
             WHERE s.lexicon_rowid = ?1 ORDER BY s.rowid",
        )?;
        let rows = stmt
            .query_map(params![lex_rowid], |r| {
                Ok(SynsetRowData {
                    rowid: r.get(0)?,
                    id: r.get(1)?,
                    pos: r.get(2)?,
                    metadata: r.get(3)?,
                    ili_id: r.get(4)?,
                    lexfile: r.get(5)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        rows
    };
    for synset_row in synset_rows {
        let rowid = synset_row.rowid;
        lexicon.synsets.push(build_synset(
            synset_row,
            definitions.get(&rowid).map(Vec::as_slice).unwrap_or(&[]),
            examples.get(&rowid).map(Vec::as_slice).unwrap_or(&[]),
            relations.get(&rowid).map(Vec::as_slice).unwrap_or(&[]),
            proposed.get(&rowid),
            unlexicalized.contains(&rowid),
            members.get(&rowid).map(Vec::as_slice).unwrap_or(&[]),
        )?);
    }

    // Syntactic behaviours.
    let frame_rows: Vec<(i64, Option<String>, String)> = {
        let mut stmt = conn.prepare(
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
    for (sb_rowid, id, frame) in frame_rows {
        // Frames without an id cannot be referenced from Sense/@subcat;
        // those carry the legacy senses attribute instead.
        let senses = if id.is_none() {
            let mut stmt = conn.prepare(
                "SELECT s.id FROM syntactic_behaviour_senses sbs \
                 JOIN senses s ON sbs.sense_rowid = s.rowid \
                 WHERE sbs.syntactic_behaviour_rowid = ?1",
            )?;
            let ids: Vec<String> = stmt
                .query_map(params![sb_rowid], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            if ids.is_empty() {
                None
            } else {
                Some(ids.join(" "))
            }
        } else {
            None
        };
        lexicon.frames.push(lmf::SyntacticBehaviour {
            id,
            frame,
            senses,
        });
    }

    Ok(lexicon)
}

struct SynsetRowData {
    rowid: i64,
    id: String,
    pos: Option<String>,
    metadata: Option<String>,
    ili_id: Option<String>,
    lexfile: Option<String>,
}

struct DefinitionRowData {
    text: Option<String>,
    language: Option<String>,
    source_sense: Option<String>,
    metadata: Option<String>,
}

struct ExampleRowData {
    text: Option<String>,
    language: Option<String>,
    metadata: Option<String>,
}

struct RelationRowData {
    target_id: String,
    kind: String,
    metadata: Option<String>,
}

struct ProposedRowData {
    definition: Option<String>,
    metadata: Option<String>,
}

fn prefetch_definitions(
    conn: &Connection,
    lex_rowid: i64,
) -> Result<HashMap<i64, Vec<DefinitionRowData>>> {
    let mut map: HashMap<i64, Vec<DefinitionRowData>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT d.synset_rowid, d.definition, d.language, s.id, d.metadata \
         FROM definitions d \
         LEFT JOIN senses s ON d.sense_rowid = s.rowid \
         WHERE d.lexicon_rowid = ?1 ORDER BY d.rowid",
    )?;
    let rows = stmt.query_map(params![lex_rowid], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            DefinitionRowData {
                text: r.get(1)?,
                language: r.get(2)?,
                source_sense: r.get(3)?,
                metadata: r.get(4)?,
            },
        ))
    })?;
    for row in rows {
        let (synset_rowid, data) = row?;
        map.entry(synset_rowid).or_default().push(data);
    }
    Ok(map)
}

fn prefetch_examples(
    conn: &Connection,
    lex_rowid: i64,
) -> Result<HashMap<i64, Vec<ExampleRowData>>> {
    let mut map: HashMap<i64, Vec<ExampleRowData>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT synset_rowid, example, language, metadata \
         FROM synset_examples WHERE lexicon_rowid = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![lex_rowid], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            ExampleRowData {
                text: r.get(1)?,
                language: r.get(2)?,
                metadata: r.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (synset_rowid, data) = row?;
        map.entry(synset_rowid).or_default().push(data);
    }
    Ok(map)
}

fn prefetch_synset_relations(
    conn: &Connection,
    lex_rowid: i64,
) -> Result<HashMap<i64, Vec<RelationRowData>>> {
    let mut map: HashMap<i64, Vec<RelationRowData>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT sr.source_rowid, tgt.id, rt.type, sr.metadata \
         FROM synset_relations sr \
         JOIN synsets tgt ON sr.target_rowid = tgt.rowid \
         JOIN relation_types rt ON sr.type_rowid = rt.rowid \
         WHERE sr.lexicon_rowid = ?1 ORDER BY sr.rowid",
    )?;
    let rows = stmt.query_map(params![lex_rowid], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            RelationRowData {
                target_id: r.get(1)?,
                kind: r.get(2)?,
                metadata: r.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (source_rowid, data) = row?;
        map.entry(source_rowid).or_default().push(data);
    }
    Ok(map)
}

fn prefetch_proposed_ilis(
    conn: &Connection,
    lex_rowid: i64,
) -> Result<HashMap<i64, ProposedRowData>> {
    let mut map = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT p.synset_rowid, p.definition, p.metadata FROM proposed_ilis p \
         JOIN synsets s ON p.synset_rowid = s.rowid \
         WHERE s.lexicon_rowid = ?1",
    )?;
    let rows = stmt.query_map(params![lex_rowid], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            ProposedRowData {
                definition: r.get(1)?,
                metadata: r.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (synset_rowid, data) = row?;
        map.insert(synset_rowid, data);
    }
    Ok(map)
}

fn prefetch_unlexicalized(conn: &Connection, lex_rowid: i64) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare(
        "SELECT u.synset_rowid FROM unlexicalized_synsets u \
         JOIN synsets s ON u.synset_rowid = s.rowid \
         WHERE s.lexicon_rowid = ?1",
    )?;
    let set = stmt
        .query_map(params![lex_rowid], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(set)
}

fn prefetch_members(conn: &Connection, lex_rowid: i64) -> Result<HashMap<i64, Vec<String>>> {
    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT s.synset_rowid, s.id FROM senses s \
         JOIN synsets syn ON s.synset_rowid = syn.rowid \
         WHERE syn.lexicon_rowid = ?1 ORDER BY s.synset_rank, s.rowid",
    )?;
    let rows = stmt.query_map(params![lex_rowid], |r| {
        Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (synset_rowid, sense_id) = row?;
        map.entry(synset_rowid).or_default().push(sense_id);
    }
    Ok(map)
}

fn build_entry(
    conn: &Connection,
    entry_rowid: i64,
    entry_id: String,
    pos: &str,
    metadata: Option<String>,
) -> Result<lmf::LexicalEntry> {
    let meta_fields = lmf::MetaFields::from_metadata(parse_metadata(metadata).as_ref());
    let part_of_speech = pos.parse()?;

    let mut lemma = lmf::Lemma {
        written_form: String::new(),
        part_of_speech,
        script: None,
        pronunciations: Vec::new(),
        tags: Vec::new(),
    };
    let mut forms = Vec::new();

    let form_rows: Vec<(i64, Option<String>, String, Option<String>, i64)> = {
        let mut stmt = conn.prepare(
            "SELECT rowid, id, form, script, rank FROM forms \
             WHERE entry_rowid = ?1 ORDER BY rank",
        )?;
        let rows = stmt
            .query_map(params![entry_rowid], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })?
            .collect::<std::result::Result<_, _>>()?;
        rows
    };
    for (form_rowid, form_id, written_form, script, rank) in form_rows {
        let pronunciations = build_pronunciations(conn, form_rowid)?;
        let tags = build_tags(conn, form_rowid)?;
        if rank == 0 {
            lemma.written_form = written_form;
            lemma.script = script;
            lemma.pronunciations = pronunciations;
            lemma.tags = tags;
        } else {
            forms.push(lmf::Form {
                written_form,
                id: form_id,
                script,
                pronunciations,
                tags,
            });
        }
    }

    let index: Option<String> = {
        use rusqlite::OptionalExtension;
        conn.query_row(
            "SELECT lemma FROM entry_index WHERE entry_rowid = ?1",
            params![entry_rowid],
            |r| r.get(0),
        )
        .optional()?
    };
    // The index attribute is only written when it diverges from the
    // lemma itself.
    let index = index.filter(|i| *i != lemma.written_form);

    let sense_rows: Vec<(i64, String, i64, i64, Option<String>)> = {
        let mut stmt = conn.prepare(
            "SELECT rowid, id, entry_rank, synset_rowid, metadata FROM senses \
             WHERE entry_rowid = ?1 ORDER BY entry_rank, rowid",
        )?;
        let rows = stmt
            .query_map(params![entry_rowid], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })?
            .collect::<std::result::Result<_, _>>()?;
        rows
    };
    let mut senses = Vec::with_capacity(sense_rows.len());
    for (sense_rowid, sense_id, entry_rank, synset_rowid, sense_metadata) in sense_rows {
        senses.push(build_sense(
            conn,
            sense_rowid,
            sense_id,
            entry_rank,
            synset_rowid,
            sense_metadata,
        )?);
    }

    Ok(lmf::LexicalEntry {
        id: entry_id,
        index,
        dc_source: meta_fields.dc_source,
        status: meta_fields.status,
        note: meta_fields.note,
        confidence_score: meta_fields.confidence_score,
        lemma,
        forms,
        senses,
    })
}

fn build_pronunciations(conn: &Connection, form_rowid: i64) -> Result<Vec<lmf::Pronunciation>> {
    let mut stmt = conn.prepare(
        "SELECT value, variety, notation, phonemic, audio \
         FROM pronunciations WHERE form_rowid = ?1 ORDER BY rowid",
    )?;
    let pronunciations = stmt
        .query_map(params![form_rowid], |r| {
            Ok(lmf::Pronunciation {
                value: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                variety: r.get(1)?,
                notation: r.get(2)?,
                phonemic: r.get(3)?,
                audio: r.get(4)?,
            })
        })?
        .collect::<std::result::Result<_, _>>()?;
    Ok(pronunciations)
}

fn build_tags(conn: &Connection, form_rowid: i64) -> Result<Vec<lmf::Tag>> {
    let mut stmt =
        conn.prepare("SELECT tag, category FROM tags WHERE form_rowid = ?1 ORDER BY rowid")?;
    let tags = stmt
        .query_map(params![form_rowid], |r| {
            Ok(lmf::Tag {
                tag: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                category: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<_, _>>()?;
    Ok(tags)
}

fn build_sense(
    conn: &Connection,
    sense_rowid: i64,
    sense_id: String,
    entry_rank: i64,
    synset_rowid: i64,
    metadata: Option<String>,
) -> Result<lmf::Sense> {
    use rusqlite::OptionalExtension;

    let meta_fields = lmf::MetaFields::from_metadata(parse_metadata(metadata).as_ref());

    let synset_id: String = conn.query_row(
        "SELECT id FROM synsets WHERE rowid = ?1",
        params![synset_rowid],
        |r| r.get(0),
    )?;

    let mut relations = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT tgt.id, rt.type, sr.metadata FROM sense_relations sr \
             JOIN senses tgt ON sr.target_rowid = tgt.rowid \
             JOIN relation_types rt ON sr.type_rowid = rt.rowid \
             WHERE sr.source_rowid = ?1 ORDER BY sr.rowid",
        )?;
        let rows = stmt.query_map(params![sense_rowid], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (target, rel_type, rel_metadata) = row?;
            let fields = lmf::MetaFields::from_metadata(parse_metadata(rel_metadata).as_ref());
            relations.push(lmf::SenseRelation {
                rel_type,
                target,
                dc_source: fields.dc_source,
                status: fields.status,
                note: fields.note,
                confidence_score: fields.confidence_score,
            });
        }
    }
    {
        let mut stmt = conn.prepare(
            "SELECT tgt.id, rt.type, sr.metadata FROM sense_synset_relations sr \
             JOIN synsets tgt ON sr.target_rowid = tgt.rowid \
             JOIN relation_types rt ON sr.type_rowid = rt.rowid \
             WHERE sr.source_rowid = ?1 ORDER BY sr.rowid",
        )?;
        let rows = stmt.query_map(params![sense_rowid], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (target, rel_type, rel_metadata) = row?;
            let fields = lmf::MetaFields::from_metadata(parse_metadata(rel_metadata).as_ref());
            relations.push(lmf::SenseRelation {
                rel_type,
                target,
                dc_source: fields.dc_source,
                status: fields.status,
                note: fields.note,
                confidence_score: fields.confidence_score,
            });
        }
    }

    let mut examples = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT example, language, metadata FROM sense_examples \
             WHERE sense_rowid = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![sense_rowid], |r| {
            Ok((
                r.get::<_, Option<String>>(0)?,
                r.get::<_, Option<String>>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (text, language, example_metadata) = row?;
            let fields = lmf::MetaFields::from_metadata(parse_metadata(example_metadata).as_ref());
            examples.push(lmf::Example {
                language,
                dc_source: fields.dc_source,
                text: text.unwrap_or_default(),
            });
        }
    }

    let mut counts = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT count, metadata FROM counts WHERE sense_rowid = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![sense_rowid], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, Option<String>>(1)?))
        })?;
        for row in rows {
            let (value, count_metadata) = row?;
            let fields = lmf::MetaFields::from_metadata(parse_metadata(count_metadata).as_ref());
            counts.push(lmf::Count {
                dc_source: fields.dc_source,
                value,
            });
        }
    }

    let adjposition: Option<String> = conn
        .query_row(
            "SELECT adjposition FROM adjpositions WHERE sense_rowid = ?1",
            params![sense_rowid],
            |r| r.get(0),
        )
        .optional()?;
    let unlexicalized: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM unlexicalized_senses WHERE sense_rowid = ?1",
            params![sense_rowid],
            |r| r.get(0),
        )
        .optional()?;

    let subcat: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT sb.id FROM syntactic_behaviour_senses sbs \
             JOIN syntactic_behaviours sb ON sbs.syntactic_behaviour_rowid = sb.rowid \
             WHERE sbs.sense_rowid = ?1 AND sb.id IS NOT NULL",
        )?;
        let ids = stmt
            .query_map(params![sense_rowid], |r| r.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        ids
    };

    Ok(lmf::Sense {
        id: sense_id,
        synset: synset_id,
        n: Some(entry_rank),
        lexicalized: unlexicalized.is_none(),
        adjposition,
        subcat: if subcat.is_empty() {
            None
        } else {
            Some(subcat.join(" "))
        },
        dc_source: meta_fields.dc_source,
        status: meta_fields.status,
        note: meta_fields.note,
        confidence_score: meta_fields.confidence_score,
        relations,
        examples,
        counts,
    })
}

fn build_synset(
    row: SynsetRowData,
    definitions: &[DefinitionRowData],
    examples: &[ExampleRowData],
    relations: &[RelationRowData],
    proposed: Option<&ProposedRowData>,
    unlexicalized: bool,
    members: &[String],
) -> Result<lmf::Synset> {
    let meta_fields = lmf::MetaFields::from_metadata(parse_metadata(row.metadata).as_ref());

    let ili = if proposed.is_some() {
        Some("in".to_string())
    } else {
        row.ili_id
    };

    let definitions = definitions
        .iter()
        .map(|d| {
            let fields = lmf::MetaFields::from_metadata(parse_metadata(d.metadata.clone()).as_ref());
            lmf::Definition {
                language: d.language.clone(),
                source_sense: d.source_sense.clone(),
                dc_source: fields.dc_source,
                text: d.text.clone().unwrap_or_default(),
            }
        })
        .collect();

    let examples = examples
        .iter()
        .map(|e| {
            let fields = lmf::MetaFields::from_metadata(parse_metadata(e.metadata.clone()).as_ref());
            lmf::Example {
                language: e.language.clone(),
                dc_source: fields.dc_source,
                text: e.text.clone().unwrap_or_default(),
            }
        })
        .collect();

    let relations = relations
        .iter()
        .map(|r| {
            let fields = lmf::MetaFields::from_metadata(parse_metadata(r.metadata.clone()).as_ref());
            lmf::SynsetRelation {
                rel_type: r.kind.clone(),
                target: r.target_id.clone(),
                dc_source: fields.dc_source,
                status: fields.status,
                note: fields.note,
                confidence_score: fields.confidence_score,
            }
        })
        .collect();

    let ili_definition = proposed.map(|p| {
        let fields = lmf::MetaFields::from_metadata(parse_metadata(p.metadata.clone()).as_ref());
        lmf::IliDefinition {
            dc_source: fields.dc_source,
            text: p.definition.clone().unwrap_or_default(),
        }
    });

    Ok(lmf::Synset {
        id: row.id,
        ili,
        part_of_speech: row.pos.as_deref().map(str::parse).transpose()?,
        lexicalized: !unlexicalized,
        members: if members.is_empty() {
            None
        } else {
            Some(members.join(" "))
        },
        lexfile: row.lexfile,
        dc_source: meta_fields.dc_source,
        status: meta_fields.status,
        note: meta_fields.note,
        confidence_score: meta_fields.confidence_score,
        definitions,
        ili_definition,
        relations,
        examples,
    })
}
