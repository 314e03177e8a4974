//! wn-editor: a programmatic editor for WN-LMF WordNets.
//!
//! The crate maintains a local SQLite store of lexical-semantic data
//! (lexicons, synsets, lexical entries, senses, relations, Interlingual
//! Index mappings) that can be populated from WN-LMF 1.4 XML or from a
//! WN-compatible external store, mutated through a transactional API
//! with strong invariants, validated against a fixed ruleset, and
//! exported back to WN-LMF.
//!
//! ## Usage
//!
//! ```rust
//! use wn_editor::{Editor, PartOfSpeech};
//!
//! let mut editor = Editor::open_in_memory()?;
//! editor.create_lexicon(
//!     "ewn", "Example WordNet", "en",
//!     "maintainer@example.com", "MIT", "1.0",
//!     Default::default(),
//! )?;
//! let synset = editor.create_synset(
//!     "ewn", PartOfSpeech::N, "A small domesticated feline", Default::default(),
//! )?;
//! let entry = editor.create_entry("ewn", "cat", PartOfSpeech::N, Default::default())?;
//! editor.add_sense(&entry.id, &synset.id, Default::default())?;
//! assert!(editor.get_synset(&synset.id)?.lexicalized);
//! # Ok::<(), wn_editor::EditorError>(())
//! ```
//!
//! Mutations run in implicit transactions; `Editor::batch` groups many
//! into one. Every change lands in the in-store edit history, and
//! `Editor::validate` runs the rule battery over the current state.

pub mod db;
pub mod editor;
pub mod error;
pub mod exporter;
pub mod external;
pub mod history;
pub mod importer;
pub mod lmf;
pub mod models;
pub mod relations;
mod validator;

pub use editor::{
    DefinitionOptions, Editor, EntryFilter, EntryOptions, EntryUpdate, FormOptions,
    LexiconOptions, LexiconUpdate, PronunciationOptions, RelationOptions, SenseFilter,
    SenseOptions, SynsetFilter, SynsetOptions, SynsetUpdate,
};
pub use error::{EditorError, Result};
pub use exporter::ExportOptions;
pub use external::{
    ExternalCommitOptions, ExternalImportOptions, commit_to_external, from_external,
};
pub use history::HistoryFilter;
pub use importer::ImportOverrides;
pub use models::{
    AdjPosition, Definition, EditOperation, EditRecord, EntityKind, Entry, Example, Finding, Form,
    Ili, IliStatus, Lexicon, Metadata, PartOfSpeech, Patch, Pronunciation, ProposedIli, Relation,
    Sense, Severity, Synset, SyntacticBehaviour, Tag,
};

#[cfg(test)]
mod tests {
    //! End-to-end scenarios across the whole API surface.

    use super::*;

    fn editor_with_lexicon() -> Editor {
        let mut editor = Editor::open_in_memory().unwrap();
        editor
            .create_lexicon(
                "awn",
                "Arabic WordNet",
                "ar",
                "test@test.com",
                "https://opensource.org/licenses/MIT",
                "1.0",
                Default::default(),
            )
            .unwrap();
        editor
    }

    #[test]
    fn test_create_synset_entry_sense_lifecycle() {
        let mut ed = editor_with_lexicon();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A large feline animal", Default::default())
            .unwrap();
        let entry = ed
            .create_entry("awn", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry.id, &synset.id, Default::default()).unwrap();

        assert!(ed.get_synset(&synset.id).unwrap().lexicalized);
        assert!(sense.id.starts_with("awn-"));
        assert_eq!(sense.entry_id, entry.id);
        assert_eq!(sense.synset_id, synset.id);
    }

    #[test]
    fn test_cascade_delete_leaves_entry_without_senses() {
        let mut ed = editor_with_lexicon();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A large feline animal", Default::default())
            .unwrap();
        let entry = ed
            .create_entry("awn", "cat", PartOfSpeech::N, Default::default())
            .unwrap();
        ed.add_sense(&entry.id, &synset.id, Default::default()).unwrap();

        ed.delete_synset(&synset.id, true).unwrap();
        assert!(ed.get_entry(&entry.id).is_ok());
        let findings = ed.validate_entry(&entry.id).unwrap();
        assert!(findings.iter().any(|f| f.rule_id == "VAL-ENT-001"));
    }

    #[test]
    fn test_inverse_relation_lifecycle() {
        let mut ed = editor_with_lexicon();
        let a = ed
            .create_synset("awn", PartOfSpeech::N, "A specific concept", Default::default())
            .unwrap();
        let b = ed
            .create_synset("awn", PartOfSpeech::N, "A general concept", Default::default())
            .unwrap();
        ed.add_synset_relation(&a.id, "hypernym", &b.id, Default::default())
            .unwrap();

        let outgoing_b = ed.get_synset_relations(&b.id, None).unwrap();
        assert!(
            outgoing_b
                .iter()
                .any(|r| r.kind == "hyponym" && r.target_id == a.id)
        );

        ed.remove_synset_relation(&a.id, "hypernym", &b.id, true)
            .unwrap();
        assert!(ed.get_synset_relations(&a.id, None).unwrap().is_empty());
        assert!(ed.get_synset_relations(&b.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_merge_with_two_ilis_conflicts() {
        let mut ed = editor_with_lexicon();
        let a = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "Concept bound to one ILI",
                SynsetOptions {
                    ili: Some("i00001".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let b = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "Concept bound to another",
                SynsetOptions {
                    ili: Some("i00002".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let err = ed.merge_synsets(&a.id, &b.id).unwrap_err();
        assert!(matches!(err, EditorError::Conflict(_)));
    }

    #[test]
    fn test_merge_chain_transfers_relations_cleanly() {
        let mut ed = editor_with_lexicon();
        let a = ed
            .create_synset("awn", PartOfSpeech::N, "Chain member a", Default::default())
            .unwrap();
        let b = ed
            .create_synset("awn", PartOfSpeech::N, "Chain member b", Default::default())
            .unwrap();
        let c = ed
            .create_synset("awn", PartOfSpeech::N, "Chain member c", Default::default())
            .unwrap();
        ed.add_synset_relation(&a.id, "hypernym", &b.id, Default::default())
            .unwrap();
        ed.add_synset_relation(&b.id, "hypernym", &c.id, Default::default())
            .unwrap();

        ed.merge_synsets(&b.id, &a.id).unwrap();

        let outgoing = ed.get_synset_relations(&a.id, Some("hypernym")).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].target_id, c.id);
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
    fn test_proposed_ili_boundary_and_accessor() {
        let mut ed = editor_with_lexicon();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A novel concept", Default::default())
            .unwrap();

        let err = ed
            .propose_ili(&synset.id, &"x".repeat(19), None)
            .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));

        ed.propose_ili(&synset.id, &"x".repeat(20), None).unwrap();
        assert_eq!(ed.get_synset(&synset.id).unwrap().ili.as_deref(), Some("in"));
    }

    #[test]
    fn test_reorder_senses_scenario() {
        let mut ed = editor_with_lexicon();
        let entry = ed
            .create_entry("awn", "bank", PartOfSpeech::N, Default::default())
            .unwrap();
        let mut sense_ids = Vec::new();
        for definition in [
            "A financial institution",
            "The side of a river",
            "A row of similar things",
        ] {
            let synset = ed
                .create_synset("awn", PartOfSpeech::N, definition, Default::default())
                .unwrap();
            sense_ids.push(
                ed.add_sense(&entry.id, &synset.id, Default::default())
                    .unwrap()
                    .id,
            );
        }

        let permuted = vec![
            sense_ids[2].clone(),
            sense_ids[0].clone(),
            sense_ids[1].clone(),
        ];
        ed.reorder_senses(&entry.id, &permuted).unwrap();
        let senses = ed
            .find_senses(&SenseFilter {
                entry: Some(entry.id.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            senses.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            permuted.iter().map(String::as_str).collect::<Vec<_>>()
        );
        assert_eq!(
            senses.iter().map(|s| s.entry_rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_lmf_round_trip_is_stable() {
        // Exporting and re-importing reproduces equivalent store
        // contents, so a second export equals the first.
        let mut ed = editor_with_lexicon();
        let cat = ed
            .create_synset(
                "awn",
                PartOfSpeech::N,
                "A large feline animal",
                SynsetOptions {
                    ili: Some("i46593".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let animal = ed
            .create_synset("awn", PartOfSpeech::N, "A living creature", Default::default())
            .unwrap();
        ed.add_synset_relation(&cat.id, "hypernym", &animal.id, Default::default())
            .unwrap();
        ed.add_synset_example(&cat.id, "The cat purred.", Some("en"), None)
            .unwrap();
        let entry = ed
            .create_entry(
                "awn",
                "cat",
                PartOfSpeech::N,
                EntryOptions {
                    forms: vec!["cats".into()],
                    ..Default::default()
                },
            )
            .unwrap();
        let sense = ed.add_sense(&entry.id, &cat.id, Default::default()).unwrap();
        ed.add_sense_example(&sense.id, "A cat example.", None, None)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.xml");
        ed.export_lmf(&first, &ExportOptions::default()).unwrap();

        let mut re_imported = Editor::from_lmf(&first).unwrap();
        let second = dir.path().join("second.xml");
        re_imported
            .export_lmf(&second, &ExportOptions::default())
            .unwrap();

        let resource_a = lmf::load(&first).unwrap();
        let resource_b = lmf::load(&second).unwrap();
        assert_eq!(resource_a.lexicons, resource_b.lexicons);
    }

    #[test]
    fn test_create_delete_returns_to_prior_state() {
        // Create followed by cascading delete restores every table.
        let mut ed = editor_with_lexicon();
        let table_counts = |ed: &Editor| -> Vec<(String, i64)> {
            [
                "synsets",
                "entries",
                "senses",
                "forms",
                "definitions",
                "synset_examples",
                "synset_relations",
                "unlexicalized_synsets",
                "proposed_ilis",
            ]
            .iter()
            .map(|table| {
                let count: i64 = ed
                    .conn()
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                    .unwrap();
                (table.to_string(), count)
            })
            .collect()
        };
        let before = table_counts(&ed);

        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A transient concept", Default::default())
            .unwrap();
        let entry = ed
            .create_entry("awn", "fleeting", PartOfSpeech::N, Default::default())
            .unwrap();
        ed.add_sense(&entry.id, &synset.id, Default::default()).unwrap();

        ed.delete_synset(&synset.id, true).unwrap();
        ed.delete_entry(&entry.id, false).unwrap();
        assert_eq!(table_counts(&ed), before);
    }

    #[test]
    fn test_universal_invariants_after_editing_session() {
        let mut ed = editor_with_lexicon();
        // An editing session touching most operations.
        let a = ed
            .create_synset("awn", PartOfSpeech::N, "Session concept a", Default::default())
            .unwrap();
        let b = ed
            .create_synset("awn", PartOfSpeech::N, "Session concept b", Default::default())
            .unwrap();
        ed.add_synset_relation(&a.id, "hypernym", &b.id, Default::default())
            .unwrap();
        let entry = ed
            .create_entry("awn", "word", PartOfSpeech::N, Default::default())
            .unwrap();
        let sense = ed.add_sense(&entry.id, &a.id, Default::default()).unwrap();
        ed.move_sense(&sense.id, &b.id).unwrap();

        // No self-loops survive.
        let loops: i64 = ed
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM synset_relations WHERE source_rowid = target_rowid",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(loops, 0);

        // Every id carries the lexicon prefix.
        let findings = ed.validate(None).unwrap();
        assert!(!findings.iter().any(|f| f.rule_id == "VAL-EDT-001"));

        // Lexicalization tracks sense counts.
        assert!(!ed.get_synset(&a.id).unwrap().lexicalized);
        assert!(ed.get_synset(&b.id).unwrap().lexicalized);

        // Exactly one rank-0 form per entry.
        let lemma_forms: i64 = ed
            .conn()
            .query_row("SELECT COUNT(*) FROM forms WHERE rank = 0", [], |r| r.get(0))
            .unwrap();
        let entries: i64 = ed
            .conn()
            .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lemma_forms, entries);
    }

    #[test]
    fn test_history_reflects_session() {
        let mut ed = editor_with_lexicon();
        let synset = ed
            .create_synset("awn", PartOfSpeech::N, "A tracked concept", Default::default())
            .unwrap();
        ed.update_synset(
            &synset.id,
            SynsetUpdate {
                pos: Some(PartOfSpeech::V),
                ..Default::default()
            },
        )
        .unwrap();
        ed.delete_synset(&synset.id, false).unwrap();

        let records = ed
            .history(&HistoryFilter {
                entity_id: Some(synset.id.clone()),
                ..Default::default()
            })
            .unwrap();
        let operations: Vec<EditOperation> = records.iter().map(|r| r.operation).collect();
        assert_eq!(
            operations,
            vec![
                EditOperation::Create,
                EditOperation::Update,
                EditOperation::Delete
            ]
        );
    }
}
