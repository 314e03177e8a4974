//! WN-LMF 1.4 wire model, parsing, and serialization.
//!
//! These structs mirror the WN-LMF document structure one element per
//! type and double as the intermediate shape shared by the importer, the
//! exporter, and the external-store adapter: the exporter builds a
//! [`LexicalResource`] from the store, the importer consumes one, and
//! XML is just the serialized form of the same value.
//!
//! Relation kinds are carried as plain strings so no kind found in input
//! data is ever lost. Metadata attributes (`dc:source`, `status`, `note`,
//! `confidenceScore`) map to and from the JSON metadata dicts stored in
//! the database.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::models::{Metadata, PartOfSpeech};

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

fn default_true() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

/// Root structure of a WN-LMF document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LexicalResource {
    #[serde(
        rename = "@xmlns:dc",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub xmlns_dc: Option<String>,
    #[serde(rename = "Lexicon", default)]
    pub lexicons: Vec<Lexicon>,
}

/// A lexicon containing lexical entries and synsets for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@language")]
    pub language: String,
    #[serde(rename = "@email")]
    pub email: String,
    #[serde(rename = "@license")]
    pub license: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@url", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "@citation", default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(rename = "@logo", default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "@confidenceScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(
        rename = "@dc:publisher",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_publisher: Option<String>,
    #[serde(
        rename = "@dc:contributor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_contributor: Option<String>,

    /// Dependencies required by this lexicon.
    #[serde(rename = "Requires", default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requires>,
    #[serde(
        rename = "LexicalEntry",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entries: Vec<LexicalEntry>,
    #[serde(rename = "Synset", default, skip_serializing_if = "Vec::is_empty")]
    pub synsets: Vec<Synset>,
    #[serde(
        rename = "SyntacticBehaviour",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub frames: Vec<SyntacticBehaviour>,
}

/// Dependency requirement of a lexicon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requires {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@url", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A lexical entry: a lemma, alternative forms, and senses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "@confidenceScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,

    #[serde(rename = "Lemma")]
    pub lemma: Lemma,
    #[serde(rename = "Form", default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<Form>,
    #[serde(rename = "Sense", default, skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<Sense>,
}

/// The canonical written form of a lexical entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lemma {
    #[serde(rename = "@writtenForm")]
    pub written_form: String,
    #[serde(rename = "@partOfSpeech")]
    pub part_of_speech: PartOfSpeech,
    #[serde(rename = "@script", default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(
        rename = "Pronunciation",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(rename = "Tag", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// An additional written rendering of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "@writtenForm")]
    pub written_form: String,
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@script", default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(
        rename = "Pronunciation",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(rename = "Tag", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Pronunciation information for a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pronunciation {
    #[serde(rename = "@variety", default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(rename = "@notation", default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
    #[serde(
        rename = "@phonemic",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub phonemic: bool,
    #[serde(rename = "@audio", default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// A grammatical tag on a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "@category")]
    pub category: String,
    #[serde(rename = "$text", default)]
    pub tag: String,
}

/// A sense connecting a lexical entry to a synset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@synset")]
    pub synset: String,
    #[serde(rename = "@n", default, skip_serializing_if = "Option::is_none")]
    pub n: Option<i64>,
    #[serde(
        rename = "@lexicalized",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub lexicalized: bool,
    #[serde(
        rename = "@adjposition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub adjposition: Option<String>,
    /// Space-separated syntactic behaviour ids.
    #[serde(rename = "@subcat", default, skip_serializing_if = "Option::is_none")]
    pub subcat: Option<String>,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "@confidenceScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,

    #[serde(
        rename = "SenseRelation",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub relations: Vec<SenseRelation>,
    #[serde(rename = "Example", default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(rename = "Count", default, skip_serializing_if = "Vec::is_empty")]
    pub counts: Vec<Count>,
}

/// A relation from a sense to another sense or to a synset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenseRelation {
    #[serde(rename = "@relType")]
    pub rel_type: String,
    #[serde(rename = "@target")]
    pub target: String,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "@confidenceScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,
}

/// A corpus frequency count for a sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Count {
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "$text")]
    pub value: i64,
}

/// A synset: a concept expressed by a set of member senses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synset {
    #[serde(rename = "@id")]
    pub id: String,
    /// A concrete ILI id, `"in"` for a proposed ILI, or absent.
    #[serde(rename = "@ili", default, skip_serializing_if = "Option::is_none")]
    pub ili: Option<String>,
    #[serde(
        rename = "@partOfSpeech",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub part_of_speech: Option<PartOfSpeech>,
    #[serde(
        rename = "@lexicalized",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub lexicalized: bool,
    /// Space-separated member sense ids, ordered by synset rank.
    #[serde(rename = "@members", default, skip_serializing_if = "Option::is_none")]
    pub members: Option<String>,
    #[serde(rename = "@lexfile", default, skip_serializing_if = "Option::is_none")]
    pub lexfile: Option<String>,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "@confidenceScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,

    #[serde(rename = "Definition", default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<Definition>,
    #[serde(
        rename = "ILIDefinition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ili_definition: Option<IliDefinition>,
    #[serde(
        rename = "SynsetRelation",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub relations: Vec<SynsetRelation>,
    #[serde(rename = "Example", default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
}

/// A textual definition of a synset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(
        rename = "@sourceSense",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_sense: Option<String>,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// The definition proposed for a new Interlingual Index entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IliDefinition {
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// A relation between synsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynsetRelation {
    #[serde(rename = "@relType")]
    pub rel_type: String,
    #[serde(rename = "@target")]
    pub target: String,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "@confidenceScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,
}

/// A usage example on a synset or a sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(
        rename = "@dc:source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dc_source: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// A subcategorization frame. Senses reference frames through their
/// `subcat` attribute; the `senses` attribute is the legacy LMF-1.0
/// spelling and is still read on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntacticBehaviour {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@subcategorizationFrame")]
    pub frame: String,
    #[serde(rename = "@senses", default, skip_serializing_if = "Option::is_none")]
    pub senses: Option<String>,
}

/// Split a space-separated id list attribute.
pub fn parse_id_list(list: &str) -> Vec<String> {
    list.split_whitespace().map(String::from).collect()
}

// ---------------------------------------------------------------------------
// Metadata attribute mapping
// ---------------------------------------------------------------------------

/// Metadata attributes common to WN-LMF elements, extracted from or
/// destined for a JSON metadata dict.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MetaFields {
    pub dc_source: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
    pub confidence_score: Option<f64>,
}

impl MetaFields {
    /// Build the JSON metadata dict, or None when every field is empty.
    pub fn into_metadata(self) -> Option<Metadata> {
        let mut meta = Metadata::new();
        if let Some(v) = self.dc_source {
            meta.insert("dc:source".into(), v.into());
        }
        if let Some(v) = self.status {
            meta.insert("status".into(), v.into());
        }
        if let Some(v) = self.note {
            meta.insert("note".into(), v.into());
        }
        if let Some(v) = self.confidence_score {
            meta.insert("confidenceScore".into(), v.into());
        }
        if meta.is_empty() { None } else { Some(meta) }
    }

    /// Extract the known attribute keys from a stored metadata dict.
    pub fn from_metadata(meta: Option<&Metadata>) -> Self {
        let Some(meta) = meta else {
            return MetaFields::default();
        };
        MetaFields {
            dc_source: meta
                .get("dc:source")
                .and_then(|v| v.as_str())
                .map(String::from),
            status: meta.get("status").and_then(|v| v.as_str()).map(String::from),
            note: meta.get("note").and_then(|v| v.as_str()).map(String::from),
            confidence_score: meta.get("confidenceScore").and_then(|v| v.as_f64()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse and serialize
// ---------------------------------------------------------------------------

/// Parse WN-LMF XML content into a [`LexicalResource`].
pub fn from_xml(xml: &str) -> Result<LexicalResource> {
    quick_xml::de::from_str(xml)
        .map_err(|e| EditorError::Import(format!("failed to parse WN-LMF XML: {e}")))
}

/// Read and parse a WN-LMF XML file.
pub fn load(path: &Path) -> Result<LexicalResource> {
    let xml = fs::read_to_string(path)?;
    from_xml(&xml)
}

/// Serialize a [`LexicalResource`] to a WN-LMF document string, with XML
/// declaration and the DTD doctype for the requested LMF version.
pub fn to_xml(resource: &LexicalResource, lmf_version: &str) -> Result<String> {
    let mut resource = resource.clone();
    resource.xmlns_dc = Some(DC_NAMESPACE.to_string());

    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    resource
        .serialize(serializer)
        .map_err(|e| EditorError::Export(format!("failed to serialize WN-LMF XML: {e}")))?;

    let mut document = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    document.push_str(&format!(
        "<!DOCTYPE LexicalResource SYSTEM \
         \"http://globalwordnet.github.io/schemas/WN-LMF-{lmf_version}.dtd\">\n"
    ));
    document.push_str(&body);
    document.push('\n');
    Ok(document)
}

/// Serialize and write a WN-LMF document to a file.
pub fn dump(resource: &LexicalResource, path: &Path, lmf_version: &str) -> Result<()> {
    let document = to_xml(resource, lmf_version)?;
    fs::write(path, document)?;
    Ok(())
}
