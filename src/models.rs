//! Domain model types for wn-editor.
//!
//! This module defines the immutable value objects returned by the editor
//! API along with the closed enumerations they use (part of speech,
//! adjective position, ILI status, edit operations, validation severity).
//! Value objects are snapshots; they hold no references into the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Untyped per-entity metadata: string keys to JSON values, stored
/// serialized in the database.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Three-state field update for partial-update operations.
///
/// `Keep` leaves the stored value untouched, `Clear` nulls it out, and
/// `Set` replaces it. This distinguishes "absent argument" from an
/// explicit null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

/// Part-of-speech enumeration following WordNet conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    N, // Noun (e.g., "dog")
    V, // Verb (e.g., "run")
    A, // Adjective (e.g., "big")
    R, // Adverb (e.g., "quickly")
    S, // Adjective satellite
    T, // Phrase
    C, // Conjunction
    P, // Adposition
    X, // Other (interjections, particles)
    U, // Unknown
}

impl PartOfSpeech {
    pub fn as_str(self) -> &'static str {
        match self {
            PartOfSpeech::N => "n",
            PartOfSpeech::V => "v",
            PartOfSpeech::A => "a",
            PartOfSpeech::R => "r",
            PartOfSpeech::S => "s",
            PartOfSpeech::T => "t",
            PartOfSpeech::C => "c",
            PartOfSpeech::P => "p",
            PartOfSpeech::X => "x",
            PartOfSpeech::U => "u",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOfSpeech {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(PartOfSpeech::N),
            "v" => Ok(PartOfSpeech::V),
            "a" => Ok(PartOfSpeech::A),
            "r" => Ok(PartOfSpeech::R),
            "s" => Ok(PartOfSpeech::S),
            "t" => Ok(PartOfSpeech::T),
            "c" => Ok(PartOfSpeech::C),
            "p" => Ok(PartOfSpeech::P),
            "x" => Ok(PartOfSpeech::X),
            "u" => Ok(PartOfSpeech::U),
            _ => Err(EditorError::Validation(format!("invalid POS: {s:?}"))),
        }
    }
}

/// Position of an adjective sense relative to its head noun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjPosition {
    #[serde(rename = "a")]
    Attributive,
    #[serde(rename = "ip")]
    ImmediatePostnominal,
    #[serde(rename = "p")]
    Predicative,
}

impl AdjPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            AdjPosition::Attributive => "a",
            AdjPosition::ImmediatePostnominal => "ip",
            AdjPosition::Predicative => "p",
        }
    }
}

impl FromStr for AdjPosition {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(AdjPosition::Attributive),
            "ip" => Ok(AdjPosition::ImmediatePostnominal),
            "p" => Ok(AdjPosition::Predicative),
            _ => Err(EditorError::Validation(format!(
                "invalid adjposition: {s:?}"
            ))),
        }
    }
}

/// Lifecycle status of an Interlingual Index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IliStatus {
    Active,
    Presupposed,
    Deprecated,
}

impl IliStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IliStatus::Active => "active",
            IliStatus::Presupposed => "presupposed",
            IliStatus::Deprecated => "deprecated",
        }
    }
}

impl FromStr for IliStatus {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(IliStatus::Active),
            "presupposed" => Ok(IliStatus::Presupposed),
            "deprecated" => Ok(IliStatus::Deprecated),
            _ => Err(EditorError::Validation(format!(
                "invalid ILI status: {s:?}"
            ))),
        }
    }
}

/// Operation recorded in the edit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOperation {
    Create,
    Update,
    Delete,
}

impl EditOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            EditOperation::Create => "CREATE",
            EditOperation::Update => "UPDATE",
            EditOperation::Delete => "DELETE",
        }
    }
}

impl FromStr for EditOperation {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(EditOperation::Create),
            "UPDATE" => Ok(EditOperation::Update),
            "DELETE" => Ok(EditOperation::Delete),
            _ => Err(EditorError::Validation(format!(
                "invalid edit operation: {s:?}"
            ))),
        }
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

/// Entity kinds the metadata API and the ID-prefix rule dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Lexicon,
    Synset,
    Entry,
    Sense,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Lexicon => "lexicon",
            EntityKind::Synset => "synset",
            EntityKind::Entry => "entry",
            EntityKind::Sense => "sense",
        }
    }
}

// ---------------------------------------------------------------------------
// Value objects
// ---------------------------------------------------------------------------

/// A language-and-version-scoped collection of WordNet data.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexicon {
    pub id: String,
    pub label: String,
    pub language: String,
    pub email: String,
    pub license: String,
    pub version: String,
    pub url: Option<String>,
    pub citation: Option<String>,
    pub logo: Option<String>,
    pub metadata: Option<Metadata>,
    pub modified: bool,
}

impl Lexicon {
    /// The `"id:version"` form accepted wherever a lexicon is referenced.
    pub fn specifier(&self) -> String {
        format!("{}:{}", self.id, self.version)
    }
}

/// A set of synonyms expressing one concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Synset {
    pub id: String,
    pub lexicon_id: String,
    pub pos: Option<PartOfSpeech>,
    /// A concrete ILI id, or `"in"` when an ILI is proposed for this synset.
    pub ili: Option<String>,
    pub lexicalized: bool,
    pub lexfile: Option<String>,
    pub metadata: Option<Metadata>,
}

/// A lemma plus part of speech.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub lexicon_id: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub index: Option<String>,
    pub metadata: Option<Metadata>,
}

/// A binding between a lexical entry and a synset.
#[derive(Debug, Clone, PartialEq)]
pub struct Sense {
    pub id: String,
    pub entry_id: String,
    pub synset_id: String,
    pub lexicon_id: String,
    pub entry_rank: i64,
    pub synset_rank: i64,
    pub lexicalized: bool,
    pub adjposition: Option<AdjPosition>,
    pub metadata: Option<Metadata>,
}

/// A written rendering of an entry; the lemma is the rank-0 form.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub written_form: String,
    pub id: Option<String>,
    pub script: Option<String>,
    pub rank: i64,
    pub pronunciations: Vec<Pronunciation>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pronunciation {
    pub value: String,
    pub variety: Option<String>,
    pub notation: Option<String>,
    pub phonemic: bool,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub tag: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub text: String,
    pub language: Option<String>,
    pub source_sense: Option<String>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub text: String,
    pub language: Option<String>,
    pub metadata: Option<Metadata>,
}

/// A typed, directed edge between two entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub source_id: String,
    pub target_id: String,
    pub kind: String,
    pub metadata: Option<Metadata>,
}

/// An Interlingual Index entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Ili {
    pub id: String,
    pub status: IliStatus,
    pub definition: Option<String>,
    pub metadata: Option<Metadata>,
}

/// A not-yet-allocated ILI placeholder awaiting standardization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedIli {
    pub synset_id: String,
    pub definition: String,
    pub metadata: Option<Metadata>,
}

/// A subcategorization frame shared by a set of senses.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntacticBehaviour {
    pub id: Option<String>,
    pub frame: String,
    pub senses: Vec<String>,
}

/// One row of the append-only edit history.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub id: i64,
    pub entity_kind: String,
    pub entity_id: String,
    pub field: Option<String>,
    pub operation: EditOperation,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub timestamp: String,
}

/// One finding produced by the validation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub entity_kind: &'static str,
    pub entity_id: String,
    pub message: String,
    pub details: Option<Metadata>,
}

// ---------------------------------------------------------------------------
// Metadata column helpers
// ---------------------------------------------------------------------------

/// Decode a metadata column; malformed JSON is treated as absent.
pub(crate) fn parse_metadata(raw: Option<String>) -> Option<Metadata> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

/// Encode metadata for storage; empty maps are stored as NULL.
pub(crate) fn metadata_to_json(meta: Option<&Metadata>) -> Option<String> {
    meta.filter(|m| !m.is_empty())
        .and_then(|m| serde_json::to_string(m).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_round_trip() {
        for s in ["n", "v", "a", "r", "s", "t", "c", "p", "x", "u"] {
            let pos: PartOfSpeech = s.parse().unwrap();
            assert_eq!(pos.as_str(), s);
        }
    }

    #[test]
    fn test_pos_outside_closed_set_is_invalid() {
        let err = "z".parse::<PartOfSpeech>().unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
    }

    #[test]
    fn test_patch_default_is_keep() {
        let patch: Patch<String> = Patch::default();
        assert!(patch.is_keep());
    }

    #[test]
    fn test_lexicon_specifier() {
        let lex = Lexicon {
            id: "awn".into(),
            label: "Arabic WordNet".into(),
            language: "ar".into(),
            email: "a@b.c".into(),
            license: "MIT".into(),
            version: "1.0".into(),
            url: None,
            citation: None,
            logo: None,
            metadata: None,
            modified: false,
        };
        assert_eq!(lex.specifier(), "awn:1.0");
    }

    #[test]
    fn test_metadata_round_trip() {
        let mut meta = Metadata::new();
        meta.insert("confidenceScore".into(), serde_json::json!(0.9));
        let json = metadata_to_json(Some(&meta)).unwrap();
        assert_eq!(parse_metadata(Some(json)), Some(meta));
        assert_eq!(metadata_to_json(Some(&Metadata::new())), None);
    }
}
