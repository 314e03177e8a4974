//! Database connection, DDL, and low-level row access for wn-editor.
//!
//! The store is a single embedded SQLite database. Business keys are
//! unique-indexed per entity; stable integer rowids key every table and
//! foreign keys cascade on delete as mandated by the lifecycle rules.
//! Metadata columns hold JSON text. Timestamps come from SQLite's
//! `strftime` in ISO-8601 UTC with millisecond precision.

use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::error::{EditorError, Result};

/// Schema version token; a store carrying a different token is refused.
pub const SCHEMA_VERSION: &str = "1.0";

const DDL: &str = "
-- Meta table
CREATE TABLE IF NOT EXISTS meta (
    key TEXT NOT NULL,
    value TEXT,
    UNIQUE (key)
);

-- Lookup tables
CREATE TABLE IF NOT EXISTS relation_types (
    rowid INTEGER PRIMARY KEY,
    type TEXT NOT NULL,
    UNIQUE (type)
);
CREATE INDEX IF NOT EXISTS relation_type_index ON relation_types (type);

CREATE TABLE IF NOT EXISTS ili_statuses (
    rowid INTEGER PRIMARY KEY,
    status TEXT NOT NULL,
    UNIQUE (status)
);
CREATE INDEX IF NOT EXISTS ili_status_index ON ili_statuses (status);

CREATE TABLE IF NOT EXISTS lexfiles (
    rowid INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    UNIQUE (name)
);
CREATE INDEX IF NOT EXISTS lexfile_index ON lexfiles (name);

-- ILI tables
CREATE TABLE IF NOT EXISTS ilis (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    status_rowid INTEGER NOT NULL REFERENCES ili_statuses (rowid),
    definition TEXT,
    metadata TEXT,
    UNIQUE (id)
);
CREATE INDEX IF NOT EXISTS ili_id_index ON ilis (id);

CREATE TABLE IF NOT EXISTS proposed_ilis (
    rowid INTEGER PRIMARY KEY,
    synset_rowid INTEGER REFERENCES synsets (rowid) ON DELETE CASCADE,
    definition TEXT,
    metadata TEXT,
    UNIQUE (synset_rowid)
);
CREATE INDEX IF NOT EXISTS proposed_ili_synset_rowid_index ON proposed_ilis (synset_rowid);

-- Lexicon tables
CREATE TABLE IF NOT EXISTS lexicons (
    rowid INTEGER PRIMARY KEY,
    specifier TEXT NOT NULL,
    id TEXT NOT NULL,
    label TEXT NOT NULL,
    language TEXT NOT NULL,
    email TEXT NOT NULL,
    license TEXT NOT NULL,
    version TEXT NOT NULL,
    url TEXT,
    citation TEXT,
    logo TEXT,
    metadata TEXT,
    modified BOOLEAN CHECK( modified IN (0, 1) ) DEFAULT 0 NOT NULL,
    UNIQUE (id, version),
    UNIQUE (specifier)
);
CREATE INDEX IF NOT EXISTS lexicon_specifier_index ON lexicons (specifier);

CREATE TABLE IF NOT EXISTS lexicon_dependencies (
    dependent_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    provider_id TEXT NOT NULL,
    provider_version TEXT NOT NULL,
    provider_url TEXT,
    provider_rowid INTEGER REFERENCES lexicons (rowid) ON DELETE SET NULL
);
CREATE INDEX IF NOT EXISTS lexicon_dependent_index ON lexicon_dependencies(dependent_rowid);

CREATE TABLE IF NOT EXISTS lexicon_extensions (
    extension_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    base_id TEXT NOT NULL,
    base_version TEXT NOT NULL,
    base_url TEXT,
    base_rowid INTEGER REFERENCES lexicons (rowid),
    UNIQUE (extension_rowid, base_rowid)
);
CREATE INDEX IF NOT EXISTS lexicon_extension_index ON lexicon_extensions(extension_rowid);

-- Entry tables
CREATE TABLE IF NOT EXISTS entries (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    pos TEXT NOT NULL,
    metadata TEXT,
    UNIQUE (id, lexicon_rowid)
);
CREATE INDEX IF NOT EXISTS entry_id_index ON entries (id);

CREATE TABLE IF NOT EXISTS entry_index (
    entry_rowid INTEGER NOT NULL REFERENCES entries (rowid) ON DELETE CASCADE,
    lemma TEXT NOT NULL,
    UNIQUE (entry_rowid)
);
CREATE INDEX IF NOT EXISTS entry_index_entry_index ON entry_index(entry_rowid);
CREATE INDEX IF NOT EXISTS entry_index_lemma_index ON entry_index(lemma);

CREATE TABLE IF NOT EXISTS forms (
    rowid INTEGER PRIMARY KEY,
    id TEXT,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    entry_rowid INTEGER NOT NULL REFERENCES entries(rowid) ON DELETE CASCADE,
    form TEXT NOT NULL,
    normalized_form TEXT,
    script TEXT,
    rank INTEGER DEFAULT 1,
    UNIQUE (entry_rowid, form, script)
);
CREATE INDEX IF NOT EXISTS form_entry_index ON forms (entry_rowid);
CREATE INDEX IF NOT EXISTS form_index ON forms (form);
CREATE INDEX IF NOT EXISTS form_norm_index ON forms (normalized_form);

CREATE TABLE IF NOT EXISTS pronunciations (
    form_rowid INTEGER NOT NULL REFERENCES forms (rowid) ON DELETE CASCADE,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    value TEXT,
    variety TEXT,
    notation TEXT,
    phonemic BOOLEAN CHECK( phonemic IN (0, 1) ) DEFAULT 1 NOT NULL,
    audio TEXT
);
CREATE INDEX IF NOT EXISTS pronunciation_form_index ON pronunciations (form_rowid);

CREATE TABLE IF NOT EXISTS tags (
    form_rowid INTEGER NOT NULL REFERENCES forms (rowid) ON DELETE CASCADE,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    tag TEXT,
    category TEXT
);
CREATE INDEX IF NOT EXISTS tag_form_index ON tags (form_rowid);

-- Synset tables
CREATE TABLE IF NOT EXISTS synsets (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    ili_rowid INTEGER REFERENCES ilis (rowid),
    pos TEXT,
    lexfile_rowid INTEGER REFERENCES lexfiles (rowid),
    metadata TEXT,
    UNIQUE (id, lexicon_rowid)
);
CREATE INDEX IF NOT EXISTS synset_id_index ON synsets (id);
CREATE INDEX IF NOT EXISTS synset_ili_rowid_index ON synsets (ili_rowid);

CREATE TABLE IF NOT EXISTS unlexicalized_synsets (
    synset_rowid INTEGER NOT NULL REFERENCES synsets (rowid) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS unlexicalized_synsets_index ON unlexicalized_synsets (synset_rowid);

CREATE TABLE IF NOT EXISTS synset_relations (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    source_rowid INTEGER NOT NULL REFERENCES synsets(rowid) ON DELETE CASCADE,
    target_rowid INTEGER NOT NULL REFERENCES synsets(rowid) ON DELETE CASCADE,
    type_rowid INTEGER NOT NULL REFERENCES relation_types(rowid),
    metadata TEXT,
    UNIQUE (source_rowid, target_rowid, type_rowid)
);
CREATE INDEX IF NOT EXISTS synset_relation_source_index ON synset_relations (source_rowid);
CREATE INDEX IF NOT EXISTS synset_relation_target_index ON synset_relations (target_rowid);

CREATE TABLE IF NOT EXISTS definitions (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    synset_rowid INTEGER NOT NULL REFERENCES synsets(rowid) ON DELETE CASCADE,
    definition TEXT,
    language TEXT,
    sense_rowid INTEGER REFERENCES senses(rowid) ON DELETE SET NULL,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS definition_rowid_index ON definitions (synset_rowid);
CREATE INDEX IF NOT EXISTS definition_sense_index ON definitions (sense_rowid);

CREATE TABLE IF NOT EXISTS synset_examples (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    synset_rowid INTEGER NOT NULL REFERENCES synsets(rowid) ON DELETE CASCADE,
    example TEXT,
    language TEXT,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS synset_example_rowid_index ON synset_examples(synset_rowid);

-- Sense tables
CREATE TABLE IF NOT EXISTS senses (
    rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    entry_rowid INTEGER NOT NULL REFERENCES entries(rowid) ON DELETE CASCADE,
    entry_rank INTEGER DEFAULT 1,
    synset_rowid INTEGER NOT NULL REFERENCES synsets(rowid) ON DELETE CASCADE,
    synset_rank INTEGER DEFAULT 1,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS sense_id_index ON senses(id);
CREATE INDEX IF NOT EXISTS sense_entry_rowid_index ON senses (entry_rowid);
CREATE INDEX IF NOT EXISTS sense_synset_rowid_index ON senses (synset_rowid);

CREATE TABLE IF NOT EXISTS unlexicalized_senses (
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS unlexicalized_senses_index ON unlexicalized_senses (sense_rowid);

CREATE TABLE IF NOT EXISTS sense_relations (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    source_rowid INTEGER NOT NULL REFERENCES senses(rowid) ON DELETE CASCADE,
    target_rowid INTEGER NOT NULL REFERENCES senses(rowid) ON DELETE CASCADE,
    type_rowid INTEGER NOT NULL REFERENCES relation_types(rowid),
    metadata TEXT,
    UNIQUE (source_rowid, target_rowid, type_rowid)
);
CREATE INDEX IF NOT EXISTS sense_relation_source_index ON sense_relations (source_rowid);
CREATE INDEX IF NOT EXISTS sense_relation_target_index ON sense_relations (target_rowid);

CREATE TABLE IF NOT EXISTS sense_synset_relations (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    source_rowid INTEGER NOT NULL REFERENCES senses(rowid) ON DELETE CASCADE,
    target_rowid INTEGER NOT NULL REFERENCES synsets(rowid) ON DELETE CASCADE,
    type_rowid INTEGER NOT NULL REFERENCES relation_types(rowid),
    metadata TEXT,
    UNIQUE (source_rowid, target_rowid, type_rowid)
);
CREATE INDEX IF NOT EXISTS sense_synset_relation_source_index ON sense_synset_relations (source_rowid);
CREATE INDEX IF NOT EXISTS sense_synset_relation_target_index ON sense_synset_relations (target_rowid);

CREATE TABLE IF NOT EXISTS adjpositions (
    sense_rowid INTEGER NOT NULL REFERENCES senses(rowid) ON DELETE CASCADE,
    adjposition TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS adjposition_sense_index ON adjpositions (sense_rowid);

CREATE TABLE IF NOT EXISTS sense_examples (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    sense_rowid INTEGER NOT NULL REFERENCES senses(rowid) ON DELETE CASCADE,
    example TEXT,
    language TEXT,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS sense_example_index ON sense_examples (sense_rowid);

CREATE TABLE IF NOT EXISTS counts (
    rowid INTEGER PRIMARY KEY,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons(rowid) ON DELETE CASCADE,
    sense_rowid INTEGER NOT NULL REFERENCES senses(rowid) ON DELETE CASCADE,
    count INTEGER NOT NULL,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS count_index ON counts(sense_rowid);

-- Syntactic behaviour tables
CREATE TABLE IF NOT EXISTS syntactic_behaviours (
    rowid INTEGER PRIMARY KEY,
    id TEXT,
    lexicon_rowid INTEGER NOT NULL REFERENCES lexicons (rowid) ON DELETE CASCADE,
    frame TEXT NOT NULL,
    UNIQUE (lexicon_rowid, id),
    UNIQUE (lexicon_rowid, frame)
);
CREATE INDEX IF NOT EXISTS syntactic_behaviour_id_index ON syntactic_behaviours (id);

CREATE TABLE IF NOT EXISTS syntactic_behaviour_senses (
    syntactic_behaviour_rowid INTEGER NOT NULL REFERENCES syntactic_behaviours (rowid) ON DELETE CASCADE,
    sense_rowid INTEGER NOT NULL REFERENCES senses (rowid) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS syntactic_behaviour_sense_sb_index
    ON syntactic_behaviour_senses (syntactic_behaviour_rowid);
CREATE INDEX IF NOT EXISTS syntactic_behaviour_sense_sense_index
    ON syntactic_behaviour_senses (sense_rowid);

-- Edit history
CREATE TABLE IF NOT EXISTS edit_history (
    rowid INTEGER PRIMARY KEY,
    entity_type TEXT NOT NULL CHECK( entity_type IN ('lexicon','synset','entry','sense','relation','definition','example','form','ili') ),
    entity_id TEXT NOT NULL,
    field_name TEXT,
    operation TEXT NOT NULL CHECK( operation IN ('CREATE', 'UPDATE', 'DELETE') ),
    old_value TEXT,
    new_value TEXT,
    timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
);
CREATE INDEX IF NOT EXISTS edit_history_entity_index ON edit_history (entity_type, entity_id);
CREATE INDEX IF NOT EXISTS edit_history_timestamp_index ON edit_history (timestamp);
";

/// Open a file-backed database connection with editor PRAGMA settings.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )?;
    conn.pragma_update(None, "foreign_keys", 1)?;
    // WAL lets a second handle read while this one writes.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Open an in-memory database connection with editor PRAGMA settings.
pub fn connect_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", 1)?;
    Ok(conn)
}

/// Initialize all tables if they don't exist, set the schema version
/// marker and creation timestamp, and seed the ILI statuses. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(DDL)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
        params![SCHEMA_VERSION],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta (key, value) \
         VALUES ('created_at', strftime('%Y-%m-%dT%H:%M:%f', 'now'))",
        [],
    )?;
    for status in ["active", "presupposed", "deprecated"] {
        conn.execute(
            "INSERT OR IGNORE INTO ili_statuses (status) VALUES (?1)",
            params![status],
        )?;
    }
    debug!("database schema initialized (version {SCHEMA_VERSION})");
    Ok(())
}

/// Verify the database schema version is compatible.
///
/// An uninitialized database (no meta table or no version row) passes;
/// `init_db` will stamp it.
pub fn check_schema_version(conn: &Connection) -> Result<()> {
    let found: Option<String> = match conn.query_row(
        "SELECT value FROM meta WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    ) {
        Ok(v) => Some(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(rusqlite::Error::SqliteFailure(_, _)) => None, // meta table missing
        Err(e) => return Err(e.into()),
    };
    match found {
        Some(version) if version != SCHEMA_VERSION => {
            info!("refusing store with schema version {version}");
            Err(EditorError::SchemaMismatch {
                found: version,
                expected: SCHEMA_VERSION,
            })
        }
        _ => Ok(()),
    }
}

/// Escape SQL LIKE wildcards (`%`, `_`) and the escape character itself
/// so identifier scans never cross-match (`foo_bar` vs `foo-bar`).
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Whether a rusqlite error is a uniqueness/constraint violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---------------------------------------------------------------------------
// Lookup table helpers
// ---------------------------------------------------------------------------

/// Get the rowid for a relation kind, inserting it if needed.
pub(crate) fn get_or_create_relation_type(conn: &Connection, kind: &str) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO relation_types (type) VALUES (?1)",
        params![kind],
    )?;
    let rowid = conn.query_row(
        "SELECT rowid FROM relation_types WHERE type = ?1",
        params![kind],
        |row| row.get(0),
    )?;
    Ok(rowid)
}

pub(crate) fn relation_type_rowid(conn: &Connection, kind: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT rowid FROM relation_types WHERE type = ?1",
            params![kind],
            |row| row.get(0),
        )
        .optional()?)
}

/// Get the rowid for a lexfile, inserting it if needed.
pub(crate) fn get_or_create_lexfile(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO lexfiles (name) VALUES (?1)",
        params![name],
    )?;
    let rowid = conn.query_row(
        "SELECT rowid FROM lexfiles WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(rowid)
}

/// Get or create an ILI entry, returning its rowid. Newly created entries
/// default to the `presupposed` status.
pub(crate) fn get_or_create_ili(conn: &Connection, ili_id: &str, status: &str) -> Result<i64> {
    let status_rowid: i64 = conn.query_row(
        "SELECT rowid FROM ili_statuses WHERE status = ?1",
        params![status],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO ilis (id, status_rowid) VALUES (?1, ?2)",
        params![ili_id, status_rowid],
    )?;
    let rowid = conn.query_row(
        "SELECT rowid FROM ilis WHERE id = ?1",
        params![ili_id],
        |row| row.get(0),
    )?;
    Ok(rowid)
}

// ---------------------------------------------------------------------------
// Row access by business key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct LexiconRow {
    pub rowid: i64,
    pub id: String,
    pub label: String,
    pub language: String,
    pub email: String,
    pub license: String,
    pub version: String,
    pub url: Option<String>,
    pub citation: Option<String>,
    pub logo: Option<String>,
    pub metadata: Option<String>,
    pub modified: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct SynsetRow {
    pub rowid: i64,
    pub id: String,
    pub lexicon_rowid: i64,
    pub ili_rowid: Option<i64>,
    pub pos: Option<String>,
    pub lexfile_rowid: Option<i64>,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct EntryRow {
    pub rowid: i64,
    pub id: String,
    pub lexicon_rowid: i64,
    pub pos: String,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct SenseRow {
    pub rowid: i64,
    pub id: String,
    pub lexicon_rowid: i64,
    pub entry_rowid: i64,
    pub entry_rank: i64,
    pub synset_rowid: i64,
    pub synset_rank: i64,
    pub metadata: Option<String>,
}

/// Resolve a lexicon reference to its rowid, or None.
///
/// Accepts a bare ID (`"awn"`) or a specifier (`"awn:1.0"`). The
/// specifier form is tried first; because the editor prevents same-ID
/// multi-version coexistence, the bare-ID path matches at most one row.
pub(crate) fn lexicon_rowid(conn: &Connection, lexicon: &str) -> Result<Option<i64>> {
    let by_spec: Option<i64> = conn
        .query_row(
            "SELECT rowid FROM lexicons WHERE specifier = ?1",
            params![lexicon],
            |row| row.get(0),
        )
        .optional()?;
    if by_spec.is_some() {
        return Ok(by_spec);
    }
    Ok(conn
        .query_row(
            "SELECT rowid FROM lexicons WHERE id = ?1",
            params![lexicon],
            |row| row.get(0),
        )
        .optional()?)
}

/// Get a full lexicon row by ID or specifier.
pub(crate) fn lexicon_row(conn: &Connection, lexicon: &str) -> Result<Option<LexiconRow>> {
    let Some(rowid) = lexicon_rowid(conn, lexicon)? else {
        return Ok(None);
    };
    lexicon_row_by_rowid(conn, rowid)
}

pub(crate) fn lexicon_row_by_rowid(conn: &Connection, rowid: i64) -> Result<Option<LexiconRow>> {
    Ok(conn
        .query_row(
            "SELECT rowid, id, label, language, email, license, version, \
             url, citation, logo, metadata, modified \
             FROM lexicons WHERE rowid = ?1",
            params![rowid],
            |row| {
                Ok(LexiconRow {
                    rowid: row.get(0)?,
                    id: row.get(1)?,
                    label: row.get(2)?,
                    language: row.get(3)?,
                    email: row.get(4)?,
                    license: row.get(5)?,
                    version: row.get(6)?,
                    url: row.get(7)?,
                    citation: row.get(8)?,
                    logo: row.get(9)?,
                    metadata: row.get(10)?,
                    modified: row.get(11)?,
                })
            },
        )
        .optional()?)
}

pub(crate) fn synset_rowid(conn: &Connection, synset_id: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT rowid FROM synsets WHERE id = ?1",
            params![synset_id],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn synset_row(conn: &Connection, synset_id: &str) -> Result<Option<SynsetRow>> {
    Ok(conn
        .query_row(
            "SELECT rowid, id, lexicon_rowid, ili_rowid, pos, lexfile_rowid, metadata \
             FROM synsets WHERE id = ?1",
            params![synset_id],
            |row| {
                Ok(SynsetRow {
                    rowid: row.get(0)?,
                    id: row.get(1)?,
                    lexicon_rowid: row.get(2)?,
                    ili_rowid: row.get(3)?,
                    pos: row.get(4)?,
                    lexfile_rowid: row.get(5)?,
                    metadata: row.get(6)?,
                })
            },
        )
        .optional()?)
}

pub(crate) fn entry_rowid(conn: &Connection, entry_id: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT rowid FROM entries WHERE id = ?1",
            params![entry_id],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn entry_row(conn: &Connection, entry_id: &str) -> Result<Option<EntryRow>> {
    Ok(conn
        .query_row(
            "SELECT rowid, id, lexicon_rowid, pos, metadata FROM entries WHERE id = ?1",
            params![entry_id],
            |row| {
                Ok(EntryRow {
                    rowid: row.get(0)?,
                    id: row.get(1)?,
                    lexicon_rowid: row.get(2)?,
                    pos: row.get(3)?,
                    metadata: row.get(4)?,
                })
            },
        )
        .optional()?)
}

pub(crate) fn sense_rowid(conn: &Connection, sense_id: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT rowid FROM senses WHERE id = ?1",
            params![sense_id],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn sense_row(conn: &Connection, sense_id: &str) -> Result<Option<SenseRow>> {
    Ok(conn
        .query_row(
            "SELECT rowid, id, lexicon_rowid, entry_rowid, entry_rank, \
             synset_rowid, synset_rank, metadata \
             FROM senses WHERE id = ?1",
            params![sense_id],
            |row| {
                Ok(SenseRow {
                    rowid: row.get(0)?,
                    id: row.get(1)?,
                    lexicon_rowid: row.get(2)?,
                    entry_rowid: row.get(3)?,
                    entry_rank: row.get(4)?,
                    synset_rowid: row.get(5)?,
                    synset_rank: row.get(6)?,
                    metadata: row.get(7)?,
                })
            },
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_and_seeds_statuses() {
        let conn = connect_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ili_statuses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);
        let version: String = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        let created: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'created_at'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert!(created.contains('T'));
    }

    #[test]
    fn test_schema_version_gate() {
        let conn = connect_in_memory().unwrap();
        init_db(&conn).unwrap();
        check_schema_version(&conn).unwrap();
        conn.execute(
            "UPDATE meta SET value = '0.9' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();
        let err = check_schema_version(&conn).unwrap_err();
        assert!(matches!(err, EditorError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_uninitialized_store_passes_version_check() {
        let conn = connect_in_memory().unwrap();
        check_schema_version(&conn).unwrap();
    }

    #[test]
    fn test_get_or_create_relation_type_is_stable() {
        let conn = connect_in_memory().unwrap();
        init_db(&conn).unwrap();
        let a = get_or_create_relation_type(&conn, "hypernym").unwrap();
        let b = get_or_create_relation_type(&conn, "hypernym").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_get_or_create_ili_defaults_presupposed() {
        let conn = connect_in_memory().unwrap();
        init_db(&conn).unwrap();
        get_or_create_ili(&conn, "i12345", "presupposed").unwrap();
        let status: String = conn
            .query_row(
                "SELECT s.status FROM ilis i \
                 JOIN ili_statuses s ON i.status_rowid = s.rowid \
                 WHERE i.id = 'i12345'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(status, "presupposed");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("foo_bar"), "foo\\_bar");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
