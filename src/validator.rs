//! Validation engine: a stateless rule battery over the store.
//!
//! Each rule inspects the current store state and emits findings with a
//! fixed rule identifier and severity. Rules never mutate anything; the
//! optional lexicon filter (bare id or specifier) restricts every rule
//! to entities of one lexicon.

use rusqlite::{Connection, params};
use serde_json::json;

use crate::db;
use crate::error::Result;
use crate::models::{Finding, Metadata, Severity, parse_metadata};
use crate::relations::{
    is_valid_sense_relation, is_valid_sense_synset_relation, is_valid_synset_relation,
    synset_inverse,
};

/// Run every rule. The filter, when present but unresolvable, yields no
/// findings (there is nothing in that lexicon to validate).
pub(crate) fn validate_all(conn: &Connection, lexicon: Option<&str>) -> Result<Vec<Finding>> {
    let Some(lex) = resolve_filter(conn, lexicon)? else {
        return Ok(Vec::new());
    };
    let mut findings = Vec::new();
    findings.extend(val_gen_001(conn, lex)?);
    findings.extend(val_ent_001(conn, lex)?);
    findings.extend(val_ent_002(conn, lex)?);
    findings.extend(val_ent_003(conn, lex)?);
    findings.extend(val_ent_004(conn, lex)?);
    findings.extend(val_syn_001(conn, lex)?);
    findings.extend(val_syn_002(conn, lex)?);
    findings.extend(val_syn_003(conn, lex)?);
    findings.extend(val_syn_004(conn, lex)?);
    findings.extend(val_syn_005(conn, lex)?);
    findings.extend(val_syn_006(conn, lex)?);
    findings.extend(val_syn_007(conn, lex)?);
    findings.extend(val_syn_008(conn, lex)?);
    findings.extend(val_rel_001(conn, lex)?);
    findings.extend(val_rel_002(conn, lex)?);
    findings.extend(val_rel_003(conn, lex)?);
    findings.extend(val_rel_004(conn, lex)?);
    findings.extend(val_rel_005(conn, lex)?);
    findings.extend(val_tax_001(conn, lex)?);
    findings.extend(val_edt_001(conn, lex)?);
    findings.extend(val_edt_002(conn, lex)?);
    findings.extend(val_edt_003(conn, lex)?);
    Ok(findings)
}

/// Validate one synset: lexicalization, definitions, id prefix.
pub(crate) fn validate_synset(conn: &Connection, synset_id: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let Some(row) = db::synset_row(conn, synset_id)? else {
        return Ok(findings);
    };
    let lexicon_id: String = conn.query_row(
        "SELECT id FROM lexicons WHERE rowid = ?1",
        params![row.lexicon_rowid],
        |r| r.get(0),
    )?;

    let unlexicalized: i64 = conn.query_row(
        "SELECT COUNT(*) FROM unlexicalized_synsets WHERE synset_rowid = ?1",
        params![row.rowid],
        |r| r.get(0),
    )?;
    if unlexicalized > 0 {
        findings.push(finding(
            "VAL-SYN-001",
            Severity::Warning,
            "synset",
            synset_id,
            "Synset is empty (unlexicalized)",
            None,
        ));
    }

    let definition_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM definitions WHERE synset_rowid = ?1",
        params![row.rowid],
        |r| r.get(0),
    )?;
    if definition_count == 0 {
        findings.push(finding(
            "VAL-EDT-002",
            Severity::Warning,
            "synset",
            synset_id,
            "Synset has no definitions",
            None,
        ));
    }

    let blank_definitions: i64 = conn.query_row(
        "SELECT COUNT(*) FROM definitions WHERE synset_rowid = ?1 \
         AND (definition IS NULL OR TRIM(definition) = '')",
        params![row.rowid],
        |r| r.get(0),
    )?;
    for _ in 0..blank_definitions {
        findings.push(finding(
            "VAL-SYN-005",
            Severity::Warning,
            "synset",
            synset_id,
            "Synset has a blank definition",
            None,
        ));
    }

    if !synset_id.starts_with(&format!("{lexicon_id}-")) {
        findings.push(finding(
            "VAL-EDT-001",
            Severity::Error,
            "synset",
            synset_id,
            &format!("ID does not start with lexicon prefix: {lexicon_id}-"),
            None,
        ));
    }

    Ok(findings)
}

/// Validate one entry: sense coverage and id prefix.
pub(crate) fn validate_entry(conn: &Connection, entry_id: &str) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let Some(row) = db::entry_row(conn, entry_id)? else {
        return Ok(findings);
    };
    let lexicon_id: String = conn.query_row(
        "SELECT id FROM lexicons WHERE rowid = ?1",
        params![row.lexicon_rowid],
        |r| r.get(0),
    )?;

    let sense_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM senses WHERE entry_rowid = ?1",
        params![row.rowid],
        |r| r.get(0),
    )?;
    if sense_count == 0 {
        findings.push(finding(
            "VAL-ENT-001",
            Severity::Warning,
            "entry",
            entry_id,
            "Entry has no senses",
            None,
        ));
    }

    if !entry_id.starts_with(&format!("{lexicon_id}-")) {
        findings.push(finding(
            "VAL-EDT-001",
            Severity::Error,
            "entry",
            entry_id,
            &format!("ID does not start with lexicon prefix: {lexicon_id}-"),
            None,
        ));
    }

    Ok(findings)
}

/// The relation-focused subset: dangling targets, missing inverses,
/// self-loops.
pub(crate) fn validate_relations(conn: &Connection, lexicon: Option<&str>) -> Result<Vec<Finding>> {
    let Some(lex) = resolve_filter(conn, lexicon)? else {
        return Ok(Vec::new());
    };
    let mut findings = Vec::new();
    findings.extend(val_rel_001(conn, lex)?);
    findings.extend(val_rel_004(conn, lex)?);
    findings.extend(val_rel_005(conn, lex)?);
    Ok(findings)
}

/// None = no filter given; Some(None) would be unresolvable, which the
/// callers map to "validate nothing".
fn resolve_filter(conn: &Connection, lexicon: Option<&str>) -> Result<Option<Option<i64>>> {
    match lexicon {
        None => Ok(Some(None)),
        Some(lexicon) => match db::lexicon_rowid(conn, lexicon)? {
            Some(rowid) => Ok(Some(Some(rowid))),
            None => Ok(None),
        },
    }
}

fn finding(
    rule_id: &'static str,
    severity: Severity,
    entity_kind: &'static str,
    entity_id: &str,
    message: &str,
    details: Option<Metadata>,
) -> Finding {
    Finding {
        rule_id,
        severity,
        entity_kind,
        entity_id: entity_id.to_string(),
        message: message.to_string(),
        details,
    }
}

fn details_of(value: serde_json::Value) -> Option<Metadata> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Individual rules
// ---------------------------------------------------------------------------

/// VAL-GEN-001: duplicate business ids within a lexicon.
fn val_gen_001(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for (table, kind) in [
        ("synsets", "synset"),
        ("entries", "entry"),
        ("senses", "sense"),
    ] {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, COUNT(*) FROM {table} \
             WHERE (?1 IS NULL OR lexicon_rowid = ?1) \
             GROUP BY id, lexicon_rowid HAVING COUNT(*) > 1"
        ))?;
        let rows: Vec<(String, i64)> = stmt
            .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (id, count) in rows {
            findings.push(finding(
                "VAL-GEN-001",
                Severity::Error,
                kind,
                &id,
                &format!("Duplicate {kind} ID: {id}"),
                details_of(json!({"count": count})),
            ));
        }
    }
    Ok(findings)
}

/// VAL-ENT-001: entries with no senses.
fn val_ent_001(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT e.id FROM entries e \
         WHERE NOT EXISTS (SELECT 1 FROM senses s WHERE s.entry_rowid = e.rowid) \
         AND (?1 IS NULL OR e.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-ENT-001",
                Severity::Warning,
                "entry",
                &id,
                "Entry has no senses",
                None,
            )
        })
        .collect())
}

/// VAL-ENT-002: entry with multiple senses for the same synset.
fn val_ent_002(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, syn.id, COUNT(*) FROM senses s \
         JOIN entries e ON s.entry_rowid = e.rowid \
         JOIN synsets syn ON s.synset_rowid = syn.rowid \
         WHERE (?1 IS NULL OR s.lexicon_rowid = ?1) \
         GROUP BY s.entry_rowid, s.synset_rowid HAVING COUNT(*) > 1",
    )?;
    let rows: Vec<(String, String, i64)> = stmt
        .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(entry_id, synset_id, count)| {
            finding(
                "VAL-ENT-002",
                Severity::Warning,
                "sense",
                &entry_id,
                &format!("Entry {entry_id} has {count} senses for synset {synset_id}"),
                None,
            )
        })
        .collect())
}

/// VAL-ENT-003: multiple entries with the same lemma referencing the
/// same synset.
fn val_ent_003(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT f.form, COUNT(DISTINCT e.rowid) FROM entries e \
         JOIN forms f ON f.entry_rowid = e.rowid AND f.rank = 0 \
         JOIN senses s ON s.entry_rowid = e.rowid \
         WHERE (?1 IS NULL OR e.lexicon_rowid = ?1) \
         GROUP BY f.form, s.synset_rowid HAVING COUNT(DISTINCT e.rowid) > 1",
    )?;
    let rows: Vec<(String, i64)> = stmt
        .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(lemma, _)| {
            finding(
                "VAL-ENT-003",
                Severity::Warning,
                "entry",
                &lemma,
                &format!("Multiple entries with lemma '{lemma}' reference the same synset"),
                None,
            )
        })
        .collect())
}

/// VAL-ENT-004: sense references a missing synset.
fn val_ent_004(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM senses s \
         WHERE NOT EXISTS (SELECT 1 FROM synsets syn WHERE syn.rowid = s.synset_rowid) \
         AND (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-ENT-004",
                Severity::Error,
                "sense",
                &id,
                "Sense references missing synset",
                None,
            )
        })
        .collect())
}

/// VAL-SYN-001: unlexicalized synsets.
fn val_syn_001(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM synsets s \
         JOIN unlexicalized_synsets u ON u.synset_rowid = s.rowid \
         WHERE (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-SYN-001",
                Severity::Warning,
                "synset",
                &id,
                "Synset is empty (unlexicalized)",
                None,
            )
        })
        .collect())
}

/// VAL-SYN-002: one ILI used by multiple synsets within a lexicon.
fn val_syn_002(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, COUNT(*) FROM synsets s \
         JOIN ilis i ON s.ili_rowid = i.rowid \
         WHERE s.ili_rowid IS NOT NULL AND (?1 IS NULL OR s.lexicon_rowid = ?1) \
         GROUP BY s.ili_rowid, s.lexicon_rowid HAVING COUNT(*) > 1",
    )?;
    let rows: Vec<(String, i64)> = stmt
        .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(ili_id, count)| {
            finding(
                "VAL-SYN-002",
                Severity::Warning,
                "synset",
                &ili_id,
                &format!("ILI {ili_id} used by {count} synsets"),
                None,
            )
        })
        .collect())
}

/// VAL-SYN-003: proposed ILI with an empty definition.
fn val_syn_003(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM synsets s \
         JOIN proposed_ilis p ON p.synset_rowid = s.rowid \
         WHERE (p.definition IS NULL OR TRIM(p.definition) = '') \
         AND (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-SYN-003",
                Severity::Warning,
                "synset",
                &id,
                "Proposed ILI is missing a definition",
                None,
            )
        })
        .collect())
}

/// VAL-SYN-004: a synset bound to a real ILI also carries a proposed
/// one.
fn val_syn_004(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM synsets s \
         JOIN proposed_ilis p ON p.synset_rowid = s.rowid \
         WHERE s.ili_rowid IS NOT NULL AND (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-SYN-004",
                Severity::Warning,
                "synset",
                &id,
                "Existing ILI has a spurious ILI definition",
                None,
            )
        })
        .collect())
}

/// VAL-SYN-005: blank definitions.
fn val_syn_005(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM definitions d \
         JOIN synsets s ON d.synset_rowid = s.rowid \
         WHERE (d.definition IS NULL OR TRIM(d.definition) = '') \
         AND (?1 IS NULL OR d.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-SYN-005",
                Severity::Warning,
                "synset",
                &id,
                "Synset has a blank definition",
                None,
            )
        })
        .collect())
}

/// VAL-SYN-006: blank synset examples.
fn val_syn_006(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM synset_examples e \
         JOIN synsets s ON e.synset_rowid = s.rowid \
         WHERE (e.example IS NULL OR TRIM(e.example) = '') \
         AND (?1 IS NULL OR e.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-SYN-006",
                Severity::Warning,
                "synset",
                &id,
                "Synset has a blank example",
                None,
            )
        })
        .collect())
}

/// VAL-SYN-007: the same non-empty definition appears on two or more
/// synsets.
fn val_syn_007(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT d.definition, COUNT(DISTINCT d.synset_rowid) FROM definitions d \
         WHERE d.definition IS NOT NULL AND TRIM(d.definition) != '' \
         AND (?1 IS NULL OR d.lexicon_rowid = ?1) \
         GROUP BY d.definition HAVING COUNT(DISTINCT d.synset_rowid) > 1",
    )?;
    let rows: Vec<(String, i64)> = stmt
        .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(definition, count)| {
            let snippet: String = definition.chars().take(50).collect();
            finding(
                "VAL-SYN-007",
                Severity::Warning,
                "synset",
                "",
                &format!("Definition duplicated across {count} synsets"),
                details_of(json!({"definition": snippet})),
            )
        })
        .collect())
}

/// VAL-SYN-008: proposed ILI definition shorter than 20 characters.
fn val_syn_008(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM proposed_ilis p \
         JOIN synsets s ON p.synset_rowid = s.rowid \
         WHERE LENGTH(p.definition) < 20 AND (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-SYN-008",
                Severity::Error,
                "synset",
                &id,
                "Proposed ILI definition is less than 20 characters",
                None,
            )
        })
        .collect())
}

/// VAL-REL-001: relation target missing.
fn val_rel_001(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT src.id FROM synset_relations sr \
         JOIN synsets src ON sr.source_rowid = src.rowid \
         WHERE NOT EXISTS (SELECT 1 FROM synsets t WHERE t.rowid = sr.target_rowid) \
         AND (?1 IS NULL OR sr.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-REL-001",
                Severity::Error,
                "relation",
                &id,
                "Relation target synset is missing",
                None,
            )
        })
        .collect())
}

/// VAL-REL-002: relation kind not in the catalog for its domain.
fn val_rel_002(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    let checks: [(&str, &str, &str, fn(&str) -> bool); 3] = [
        ("synset_relations", "synsets", "synset", is_valid_synset_relation),
        ("sense_relations", "senses", "sense", is_valid_sense_relation),
        (
            "sense_synset_relations",
            "senses",
            "sense-synset",
            is_valid_sense_synset_relation,
        ),
    ];
    for (table, source_table, domain, is_valid) in checks {
        let mut stmt = conn.prepare(&format!(
            "SELECT src.id, rt.type FROM {table} sr \
             JOIN {source_table} src ON sr.source_rowid = src.rowid \
             JOIN relation_types rt ON sr.type_rowid = rt.rowid \
             WHERE (?1 IS NULL OR sr.lexicon_rowid = ?1)"
        ))?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (source_id, kind) in rows {
            if !is_valid(&kind) {
                findings.push(finding(
                    "VAL-REL-002",
                    Severity::Warning,
                    "relation",
                    &source_id,
                    &format!("Invalid {domain} relation kind: {kind}"),
                    details_of(json!({"relation_type": kind})),
                ));
            }
        }
    }
    Ok(findings)
}

/// VAL-REL-003: redundant relation rows.
fn val_rel_003(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for (table, source_table, kind) in [
        ("synset_relations", "synsets", "synset"),
        ("sense_relations", "senses", "sense"),
    ] {
        let mut stmt = conn.prepare(&format!(
            "SELECT src.id, rt.type, COUNT(*) FROM {table} r \
             JOIN {source_table} src ON r.source_rowid = src.rowid \
             JOIN relation_types rt ON r.type_rowid = rt.rowid \
             WHERE (?1 IS NULL OR r.lexicon_rowid = ?1) \
             GROUP BY r.source_rowid, r.target_rowid, r.type_rowid \
             HAVING COUNT(*) > 1"
        ))?;
        let rows: Vec<(String, String, i64)> = stmt
            .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (source_id, rel_kind, count) in rows {
            findings.push(finding(
                "VAL-REL-003",
                Severity::Warning,
                "relation",
                &source_id,
                &format!("Redundant {kind} relation: {rel_kind} appears {count} times"),
                details_of(json!({"count": count})),
            ));
        }
    }
    Ok(findings)
}

/// VAL-REL-004: asymmetric synset relation missing its inverse row.
fn val_rel_004(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT sr.source_rowid, sr.target_rowid, src.id, tgt.id, rt.type \
         FROM synset_relations sr \
         JOIN synsets src ON sr.source_rowid = src.rowid \
         JOIN synsets tgt ON sr.target_rowid = tgt.rowid \
         JOIN relation_types rt ON sr.type_rowid = rt.rowid \
         WHERE (?1 IS NULL OR sr.lexicon_rowid = ?1)",
    )?;
    let rows: Vec<(i64, i64, String, String, String)> = stmt
        .query_map(params![lex], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
        })?
        .collect::<std::result::Result<_, _>>()?;

    for (source_rowid, target_rowid, source_id, target_id, kind) in rows {
        let Some(inverse) = synset_inverse(&kind) else {
            continue;
        };
        let missing = match db::relation_type_rowid(conn, inverse)? {
            None => true,
            Some(inverse_type_rowid) => {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM synset_relations \
                     WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3",
                    params![target_rowid, source_rowid, inverse_type_rowid],
                    |r| r.get(0),
                )?;
                count == 0
            }
        };
        if missing {
            findings.push(finding(
                "VAL-REL-004",
                Severity::Warning,
                "relation",
                &format!("{source_id}->{kind}->{target_id}"),
                &format!("Missing inverse relation: {inverse}"),
                None,
            ));
        }
    }
    Ok(findings)
}

/// VAL-REL-005: self-loop relations.
fn val_rel_005(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT src.id, rt.type FROM synset_relations sr \
         JOIN synsets src ON sr.source_rowid = src.rowid \
         JOIN relation_types rt ON sr.type_rowid = rt.rowid \
         WHERE sr.source_rowid = sr.target_rowid \
         AND (?1 IS NULL OR sr.lexicon_rowid = ?1)",
    )?;
    let rows: Vec<(String, String)> = stmt
        .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(source_id, kind)| {
            finding(
                "VAL-REL-005",
                Severity::Error,
                "relation",
                &source_id,
                &format!("Self-loop: {kind}"),
                None,
            )
        })
        .collect())
}

/// VAL-TAX-001: hypernym relation between synsets of different POS.
fn val_tax_001(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let Some(hypernym_rowid) = db::relation_type_rowid(conn, "hypernym")? else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(
        "SELECT src.id, src.pos, tgt.id, tgt.pos FROM synset_relations sr \
         JOIN synsets src ON sr.source_rowid = src.rowid \
         JOIN synsets tgt ON sr.target_rowid = tgt.rowid \
         WHERE sr.type_rowid = ?1 AND src.pos IS NOT NULL AND tgt.pos IS NOT NULL \
         AND src.pos != tgt.pos AND (?2 IS NULL OR sr.lexicon_rowid = ?2)",
    )?;
    let rows: Vec<(String, String, String, String)> = stmt
        .query_map(params![hypernym_rowid, lex], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
        })?
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(source_id, source_pos, target_id, target_pos)| {
            finding(
                "VAL-TAX-001",
                Severity::Warning,
                "synset",
                &source_id,
                &format!(
                    "POS mismatch: {source_id} ({source_pos}) has hypernym \
                     {target_id} ({target_pos})"
                ),
                None,
            )
        })
        .collect())
}

/// VAL-EDT-001: entity id does not begin with the lexicon prefix.
fn val_edt_001(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for (table, kind) in [
        ("synsets", "synset"),
        ("entries", "entry"),
        ("senses", "sense"),
    ] {
        let mut stmt = conn.prepare(&format!(
            "SELECT t.id, l.id FROM {table} t \
             JOIN lexicons l ON t.lexicon_rowid = l.rowid \
             WHERE (?1 IS NULL OR t.lexicon_rowid = ?1)"
        ))?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (id, lexicon_id) in rows {
            if !id.starts_with(&format!("{lexicon_id}-")) {
                findings.push(finding(
                    "VAL-EDT-001",
                    Severity::Error,
                    kind,
                    &id,
                    &format!("ID does not start with lexicon prefix: {lexicon_id}-"),
                    None,
                ));
            }
        }
    }
    Ok(findings)
}

/// VAL-EDT-002: synsets with no definitions.
fn val_edt_002(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM synsets s \
         WHERE NOT EXISTS (SELECT 1 FROM definitions d WHERE d.synset_rowid = s.rowid) \
         AND (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![lex], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids
        .into_iter()
        .map(|id| {
            finding(
                "VAL-EDT-002",
                Severity::Warning,
                "synset",
                &id,
                "Synset has no definitions",
                None,
            )
        })
        .collect())
}

/// VAL-EDT-003: sense with `confidenceScore < 0.5` in its metadata.
fn val_edt_003(conn: &Connection, lex: Option<i64>) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.metadata FROM senses s \
         WHERE s.metadata IS NOT NULL AND (?1 IS NULL OR s.lexicon_rowid = ?1)",
    )?;
    let rows: Vec<(String, Option<String>)> = stmt
        .query_map(params![lex], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;

    let mut findings = Vec::new();
    for (id, raw) in rows {
        let Some(meta) = parse_metadata(raw) else {
            continue;
        };
        let Some(score) = meta.get("confidenceScore").and_then(|v| v.as_f64()) else {
            continue;
        };
        if score < 0.5 {
            findings.push(finding(
                "VAL-EDT-003",
                Severity::Warning,
                "sense",
                &id,
                &format!("Sense has low confidence: {score}"),
                None,
            ));
        }
    }
    Ok(findings)
}
