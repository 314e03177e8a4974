//! Relation operations for the three domains (synset↔synset,
//! sense↔sense, sense→synset), including the automatic inverse
//! machinery.

use rusqlite::params;

use super::Editor;
use crate::db;
use crate::error::{EditorError, Result};
use crate::history;
use crate::models::{Metadata, Relation, metadata_to_json, parse_metadata};
use crate::relations;

/// Options for relation insertion. `auto_inverse` defaults to true: when
/// the catalog defines an inverse for the kind, the reverse row is
/// inserted alongside (with no metadata).
#[derive(Debug, Clone)]
pub struct RelationOptions {
    pub auto_inverse: bool,
    pub metadata: Option<Metadata>,
}

impl Default for RelationOptions {
    fn default() -> Self {
        RelationOptions {
            auto_inverse: true,
            metadata: None,
        }
    }
}

impl Editor {
    /// Add a synset→synset relation. Duplicate triples are silently
    /// ignored; symmetric kinds are stored in both directions.
    pub fn add_synset_relation(
        &mut self,
        source_id: &str,
        kind: &str,
        target_id: &str,
        options: RelationOptions,
    ) -> Result<()> {
        self.mutate(|ed| {
            if !relations::is_valid_synset_relation(kind) {
                return Err(EditorError::Validation(format!(
                    "invalid synset relation kind: {kind:?}"
                )));
            }
            if source_id == target_id {
                return Err(EditorError::Validation(format!(
                    "self-referential relations are not allowed: {source_id}"
                )));
            }

            let src = db::synset_row(ed.conn(), source_id)?
                .ok_or_else(|| EditorError::not_found("synset", source_id))?;
            let tgt = db::synset_row(ed.conn(), target_id)?
                .ok_or_else(|| EditorError::not_found("synset", target_id))?;

            let type_rowid = db::get_or_create_relation_type(ed.conn(), kind)?;
            ed.conn().execute(
                "INSERT OR IGNORE INTO synset_relations \
                 (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    src.lexicon_rowid,
                    src.rowid,
                    tgt.rowid,
                    type_rowid,
                    metadata_to_json(options.metadata.as_ref()),
                ],
            )?;

            history::record_create(
                ed.conn(),
                "relation",
                &format!("{source_id}->{kind}->{target_id}"),
                None,
            )?;

            if options.auto_inverse {
                if let Some(inverse) = relations::synset_inverse(kind) {
                    let inverse_rowid = db::get_or_create_relation_type(ed.conn(), inverse)?;
                    ed.conn().execute(
                        "INSERT OR IGNORE INTO synset_relations \
                         (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                         VALUES (?1, ?2, ?3, ?4, NULL)",
                        params![tgt.lexicon_rowid, tgt.rowid, src.rowid, inverse_rowid],
                    )?;
                }
            }
            Ok(())
        })
    }

    /// Remove a synset→synset relation; a no-op when it does not exist.
    /// When `auto_inverse` is set the catalog inverse row is removed too.
    pub fn remove_synset_relation(
        &mut self,
        source_id: &str,
        kind: &str,
        target_id: &str,
        auto_inverse: bool,
    ) -> Result<()> {
        self.mutate(|ed| {
            let (Some(src), Some(tgt)) = (
                db::synset_row(ed.conn(), source_id)?,
                db::synset_row(ed.conn(), target_id)?,
            ) else {
                return Ok(());
            };
            let Some(type_rowid) = db::relation_type_rowid(ed.conn(), kind)? else {
                return Ok(());
            };

            ed.conn().execute(
                "DELETE FROM synset_relations \
                 WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3",
                params![src.rowid, tgt.rowid, type_rowid],
            )?;
            history::record_delete(
                ed.conn(),
                "relation",
                &format!("{source_id}->{kind}->{target_id}"),
                None,
            )?;

            if auto_inverse {
                if let Some(inverse) = relations::synset_inverse(kind) {
                    if let Some(inverse_rowid) = db::relation_type_rowid(ed.conn(), inverse)? {
                        ed.conn().execute(
                            "DELETE FROM synset_relations \
                             WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3",
                            params![tgt.rowid, src.rowid, inverse_rowid],
                        )?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Add a sense→sense relation.
    pub fn add_sense_relation(
        &mut self,
        source_id: &str,
        kind: &str,
        target_id: &str,
        options: RelationOptions,
    ) -> Result<()> {
        self.mutate(|ed| {
            if !relations::is_valid_sense_relation(kind) {
                return Err(EditorError::Validation(format!(
                    "invalid sense relation kind: {kind:?}"
                )));
            }
            if source_id == target_id {
                return Err(EditorError::Validation(format!(
                    "self-referential relations are not allowed: {source_id}"
                )));
            }

            let src = db::sense_row(ed.conn(), source_id)?
                .ok_or_else(|| EditorError::not_found("sense", source_id))?;
            let tgt = db::sense_row(ed.conn(), target_id)?
                .ok_or_else(|| EditorError::not_found("sense", target_id))?;

            let type_rowid = db::get_or_create_relation_type(ed.conn(), kind)?;
            ed.conn().execute(
                "INSERT OR IGNORE INTO sense_relations \
                 (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    src.lexicon_rowid,
                    src.rowid,
                    tgt.rowid,
                    type_rowid,
                    metadata_to_json(options.metadata.as_ref()),
                ],
            )?;

            history::record_create(
                ed.conn(),
                "relation",
                &format!("{source_id}->{kind}->{target_id}"),
                None,
            )?;

            if options.auto_inverse {
                if let Some(inverse) = relations::sense_inverse(kind) {
                    let inverse_rowid = db::get_or_create_relation_type(ed.conn(), inverse)?;
                    ed.conn().execute(
                        "INSERT OR IGNORE INTO sense_relations \
                         (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                         VALUES (?1, ?2, ?3, ?4, NULL)",
                        params![tgt.lexicon_rowid, tgt.rowid, src.rowid, inverse_rowid],
                    )?;
                }
            }
            Ok(())
        })
    }

    /// Remove a sense→sense relation; a no-op when it does not exist.
    pub fn remove_sense_relation(
        &mut self,
        source_id: &str,
        kind: &str,
        target_id: &str,
        auto_inverse: bool,
    ) -> Result<()> {
        self.mutate(|ed| {
            let (Some(src), Some(tgt)) = (
                db::sense_row(ed.conn(), source_id)?,
                db::sense_row(ed.conn(), target_id)?,
            ) else {
                return Ok(());
            };
            let Some(type_rowid) = db::relation_type_rowid(ed.conn(), kind)? else {
                return Ok(());
            };

            ed.conn().execute(
                "DELETE FROM sense_relations \
                 WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3",
                params![src.rowid, tgt.rowid, type_rowid],
            )?;

            if auto_inverse {
                if let Some(inverse) = relations::sense_inverse(kind) {
                    if let Some(inverse_rowid) = db::relation_type_rowid(ed.conn(), inverse)? {
                        ed.conn().execute(
                            "DELETE FROM sense_relations \
                             WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3",
                            params![tgt.rowid, src.rowid, inverse_rowid],
                        )?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Add a sense→synset relation. This domain has no automatic
    /// inverse.
    pub fn add_sense_synset_relation(
        &mut self,
        source_sense_id: &str,
        kind: &str,
        target_synset_id: &str,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.mutate(|ed| {
            if !relations::is_valid_sense_synset_relation(kind) {
                return Err(EditorError::Validation(format!(
                    "invalid sense-synset relation kind: {kind:?}"
                )));
            }

            let src = db::sense_row(ed.conn(), source_sense_id)?
                .ok_or_else(|| EditorError::not_found("sense", source_sense_id))?;
            let tgt = db::synset_row(ed.conn(), target_synset_id)?
                .ok_or_else(|| EditorError::not_found("synset", target_synset_id))?;

            let type_rowid = db::get_or_create_relation_type(ed.conn(), kind)?;
            ed.conn().execute(
                "INSERT OR IGNORE INTO sense_synset_relations \
                 (lexicon_rowid, source_rowid, target_rowid, type_rowid, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    src.lexicon_rowid,
                    src.rowid,
                    tgt.rowid,
                    type_rowid,
                    metadata_to_json(metadata.as_ref()),
                ],
            )?;
            history::record_create(
                ed.conn(),
                "relation",
                &format!("{source_sense_id}->{kind}->{target_synset_id}"),
                None,
            )?;
            Ok(())
        })
    }

    /// Remove a sense→synset relation; a no-op when it does not exist.
    pub fn remove_sense_synset_relation(
        &mut self,
        source_sense_id: &str,
        kind: &str,
        target_synset_id: &str,
    ) -> Result<()> {
        self.mutate(|ed| {
            let (Some(src), Some(tgt)) = (
                db::sense_row(ed.conn(), source_sense_id)?,
                db::synset_row(ed.conn(), target_synset_id)?,
            ) else {
                return Ok(());
            };
            let Some(type_rowid) = db::relation_type_rowid(ed.conn(), kind)? else {
                return Ok(());
            };
            ed.conn().execute(
                "DELETE FROM sense_synset_relations \
                 WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3",
                params![src.rowid, tgt.rowid, type_rowid],
            )?;
            Ok(())
        })
    }

    /// Outgoing synset relations from a source, optionally filtered by
    /// kind.
    pub fn get_synset_relations(
        &self,
        synset_id: &str,
        kind: Option<&str>,
    ) -> Result<Vec<Relation>> {
        let row = db::synset_row(self.conn(), synset_id)?
            .ok_or_else(|| EditorError::not_found("synset", synset_id))?;
        self.outgoing_relations("synset_relations", "synsets", row.rowid, kind)
    }

    /// Outgoing sense relations from a source, optionally filtered by
    /// kind.
    pub fn get_sense_relations(&self, sense_id: &str, kind: Option<&str>) -> Result<Vec<Relation>> {
        let row = db::sense_row(self.conn(), sense_id)?
            .ok_or_else(|| EditorError::not_found("sense", sense_id))?;
        self.outgoing_relations("sense_relations", "senses", row.rowid, kind)
    }

    /// Outgoing sense→synset relations from a source sense.
    pub fn get_sense_synset_relations(
        &self,
        sense_id: &str,
        kind: Option<&str>,
    ) -> Result<Vec<Relation>> {
        let row = db::sense_row(self.conn(), sense_id)?
            .ok_or_else(|| EditorError::not_found("sense", sense_id))?;

        let mut sql = String::from(
            "SELECT src.id, tgt.id, rt.type, sr.metadata \
             FROM sense_synset_relations sr \
             JOIN senses src ON sr.source_rowid = src.rowid \
             JOIN synsets tgt ON sr.target_rowid = tgt.rowid \
             JOIN relation_types rt ON sr.type_rowid = rt.rowid \
             WHERE sr.source_rowid = ?1",
        );
        let mut params_vec: Vec<String> = vec![row.rowid.to_string()];
        if let Some(kind) = kind {
            sql.push_str(" AND rt.type = ?2");
            params_vec.push(kind.to_string());
        }
        self.collect_relations(&sql, &params_vec)
    }

    fn outgoing_relations(
        &self,
        table: &str,
        entity_table: &str,
        source_rowid: i64,
        kind: Option<&str>,
    ) -> Result<Vec<Relation>> {
        let mut sql = format!(
            "SELECT src.id, tgt.id, rt.type, sr.metadata \
             FROM {table} sr \
             JOIN {entity_table} src ON sr.source_rowid = src.rowid \
             JOIN {entity_table} tgt ON sr.target_rowid = tgt.rowid \
             JOIN relation_types rt ON sr.type_rowid = rt.rowid \
             WHERE sr.source_rowid = ?1"
        );
        let mut params_vec: Vec<String> = vec![source_rowid.to_string()];
        if let Some(kind) = kind {
            sql.push_str(" AND rt.type = ?2");
            params_vec.push(kind.to_string());
        }
        self.collect_relations(&sql, &params_vec)
    }

    fn collect_relations(&self, sql: &str, params_vec: &[String]) -> Result<Vec<Relation>> {
        let mut stmt = self.conn().prepare(sql)?;
        let relations = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), |r| {
                Ok(Relation {
                    source_id: r.get(0)?,
                    target_id: r.get(1)?,
                    kind: r.get(2)?,
                    metadata: parse_metadata(r.get(3)?),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(relations)
    }

    /// Remove every synset relation involving the given synset together
    /// with the catalog inverse of each outgoing/incoming row. Called
    /// ahead of synset deletion so no dangling inverse survives.
    pub(crate) fn cleanup_synset_relations(&mut self, synset_rowid: i64) -> Result<()> {
        self.cleanup_relations("synset_relations", synset_rowid, relations::synset_inverse)
    }

    /// Sense-domain counterpart of [`Editor::cleanup_synset_relations`].
    pub(crate) fn cleanup_sense_relations(&mut self, sense_rowid: i64) -> Result<()> {
        self.cleanup_relations("sense_relations", sense_rowid, relations::sense_inverse)
    }

    fn cleanup_relations(
        &mut self,
        table: &str,
        entity_rowid: i64,
        inverse_of: fn(&str) -> Option<&'static str>,
    ) -> Result<()> {
        let rows: Vec<(i64, i64, i64, String)> = {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT sr.rowid, sr.source_rowid, sr.target_rowid, rt.type \
                 FROM {table} sr \
                 JOIN relation_types rt ON sr.type_rowid = rt.rowid \
                 WHERE sr.source_rowid = ?1 OR sr.target_rowid = ?1"
            ))?;
            let rows = stmt
                .query_map(params![entity_rowid], |r| {
                    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
                })?
                .collect::<std::result::Result<_, _>>()?;
            rows
        };

        for (rel_rowid, source_rowid, target_rowid, kind) in rows {
            if let Some(inverse) = inverse_of(&kind) {
                if let Some(inverse_rowid) = db::relation_type_rowid(self.conn(), inverse)? {
                    self.conn().execute(
                        &format!(
                            "DELETE FROM {table} \
                             WHERE source_rowid = ?1 AND target_rowid = ?2 AND type_rowid = ?3"
                        ),
                        params![target_rowid, source_rowid, inverse_rowid],
                    )?;
                }
            }
            self.conn().execute(
                &format!("DELETE FROM {table} WHERE rowid = ?1"),
                params![rel_rowid],
            )?;
        }
        Ok(())
    }
}
