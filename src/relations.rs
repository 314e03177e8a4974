//! Static relation catalog: recognized relation kinds per domain and the
//! inverse mapping used by the auto-inverse machinery.
//!
//! Relation kinds are plain strings in the store; the catalog only gates
//! the mutation-engine entry points and informs the validator. A kind is
//! *symmetric* iff its inverse equals itself.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Inverse pairs for the synset↔synset domain. Symmetric kinds map to
/// themselves.
pub const SYNSET_RELATION_INVERSES: &[(&str, &str)] = &[
    // Asymmetric pairs
    ("hypernym", "hyponym"),
    ("hyponym", "hypernym"),
    ("instance_hypernym", "instance_hyponym"),
    ("instance_hyponym", "instance_hypernym"),
    ("meronym", "holonym"),
    ("holonym", "meronym"),
    ("mero_location", "holo_location"),
    ("holo_location", "mero_location"),
    ("mero_member", "holo_member"),
    ("holo_member", "mero_member"),
    ("mero_part", "holo_part"),
    ("holo_part", "mero_part"),
    ("mero_portion", "holo_portion"),
    ("holo_portion", "mero_portion"),
    ("mero_substance", "holo_substance"),
    ("holo_substance", "mero_substance"),
    ("state_of", "be_in_state"),
    ("be_in_state", "state_of"),
    ("causes", "is_caused_by"),
    ("is_caused_by", "causes"),
    ("subevent", "is_subevent_of"),
    ("is_subevent_of", "subevent"),
    ("manner_of", "in_manner"),
    ("in_manner", "manner_of"),
    ("restricts", "restricted_by"),
    ("restricted_by", "restricts"),
    ("classifies", "classified_by"),
    ("classified_by", "classifies"),
    ("entails", "is_entailed_by"),
    ("is_entailed_by", "entails"),
    ("domain_topic", "has_domain_topic"),
    ("has_domain_topic", "domain_topic"),
    ("domain_region", "has_domain_region"),
    ("has_domain_region", "domain_region"),
    ("exemplifies", "is_exemplified_by"),
    ("is_exemplified_by", "exemplifies"),
    ("role", "involved"),
    ("involved", "role"),
    ("agent", "involved_agent"),
    ("involved_agent", "agent"),
    ("patient", "involved_patient"),
    ("involved_patient", "patient"),
    ("result", "involved_result"),
    ("involved_result", "result"),
    ("instrument", "involved_instrument"),
    ("involved_instrument", "instrument"),
    ("location", "involved_location"),
    ("involved_location", "location"),
    ("direction", "involved_direction"),
    ("involved_direction", "direction"),
    ("target_direction", "involved_target_direction"),
    ("involved_target_direction", "target_direction"),
    ("source_direction", "involved_source_direction"),
    ("involved_source_direction", "source_direction"),
    ("co_agent_patient", "co_patient_agent"),
    ("co_patient_agent", "co_agent_patient"),
    ("co_agent_instrument", "co_instrument_agent"),
    ("co_instrument_agent", "co_agent_instrument"),
    ("co_agent_result", "co_result_agent"),
    ("co_result_agent", "co_agent_result"),
    ("co_patient_instrument", "co_instrument_patient"),
    ("co_instrument_patient", "co_patient_instrument"),
    ("co_result_instrument", "co_instrument_result"),
    ("co_instrument_result", "co_result_instrument"),
    ("feminine", "has_feminine"),
    ("has_feminine", "feminine"),
    ("masculine", "has_masculine"),
    ("has_masculine", "masculine"),
    ("young", "has_young"),
    ("has_young", "young"),
    ("diminutive", "has_diminutive"),
    ("has_diminutive", "diminutive"),
    ("augmentative", "has_augmentative"),
    ("has_augmentative", "augmentative"),
    // Symmetric (map to themselves)
    ("antonym", "antonym"),
    ("eq_synonym", "eq_synonym"),
    ("similar", "similar"),
    ("attribute", "attribute"),
    ("co_role", "co_role"),
    ("ir_synonym", "ir_synonym"),
    ("anto_gradable", "anto_gradable"),
    ("anto_simple", "anto_simple"),
    ("anto_converse", "anto_converse"),
];

/// Inverse pairs for the sense↔sense domain.
pub const SENSE_RELATION_INVERSES: &[(&str, &str)] = &[
    // Asymmetric pairs (subset relevant to sense relations)
    ("agent", "involved_agent"),
    ("involved_agent", "agent"),
    ("patient", "involved_patient"),
    ("involved_patient", "patient"),
    ("result", "involved_result"),
    ("involved_result", "result"),
    ("instrument", "involved_instrument"),
    ("involved_instrument", "instrument"),
    ("location", "involved_location"),
    ("involved_location", "location"),
    ("direction", "involved_direction"),
    ("involved_direction", "direction"),
    ("target_direction", "involved_target_direction"),
    ("involved_target_direction", "target_direction"),
    ("source_direction", "involved_source_direction"),
    ("involved_source_direction", "source_direction"),
    ("domain_topic", "has_domain_topic"),
    ("has_domain_topic", "domain_topic"),
    ("domain_region", "has_domain_region"),
    ("has_domain_region", "domain_region"),
    ("exemplifies", "is_exemplified_by"),
    ("is_exemplified_by", "exemplifies"),
    ("feminine", "has_feminine"),
    ("has_feminine", "feminine"),
    ("masculine", "has_masculine"),
    ("has_masculine", "masculine"),
    ("young", "has_young"),
    ("has_young", "young"),
    ("diminutive", "has_diminutive"),
    ("has_diminutive", "diminutive"),
    ("augmentative", "has_augmentative"),
    ("has_augmentative", "augmentative"),
    ("metaphor", "has_metaphor"),
    ("has_metaphor", "metaphor"),
    ("metonym", "has_metonym"),
    ("has_metonym", "metonym"),
    ("simple_aspect_ip", "simple_aspect_pi"),
    ("simple_aspect_pi", "simple_aspect_ip"),
    ("secondary_aspect_ip", "secondary_aspect_pi"),
    ("secondary_aspect_pi", "secondary_aspect_ip"),
    ("co_agent_patient", "co_patient_agent"),
    ("co_patient_agent", "co_agent_patient"),
    ("co_agent_instrument", "co_instrument_agent"),
    ("co_instrument_agent", "co_agent_instrument"),
    ("co_agent_result", "co_result_agent"),
    ("co_result_agent", "co_agent_result"),
    ("co_patient_instrument", "co_instrument_patient"),
    ("co_instrument_patient", "co_patient_instrument"),
    ("co_result_instrument", "co_instrument_result"),
    ("co_instrument_result", "co_result_instrument"),
    // Symmetric
    ("antonym", "antonym"),
    ("similar", "similar"),
    ("derivation", "derivation"),
    ("anto_gradable", "anto_gradable"),
    ("anto_simple", "anto_simple"),
    ("anto_converse", "anto_converse"),
];

/// Valid kinds for the synset↔synset domain.
pub const SYNSET_RELATIONS: &[&str] = &[
    "agent",
    "also",
    "antonym",
    "anto_converse",
    "anto_gradable",
    "anto_simple",
    "attribute",
    "augmentative",
    "be_in_state",
    "causes",
    "classified_by",
    "classifies",
    "co_agent_instrument",
    "co_agent_patient",
    "co_agent_result",
    "co_instrument_agent",
    "co_instrument_patient",
    "co_instrument_result",
    "co_patient_agent",
    "co_patient_instrument",
    "co_result_agent",
    "co_result_instrument",
    "co_role",
    "diminutive",
    "direction",
    "domain_region",
    "domain_topic",
    "entails",
    "eq_synonym",
    "exemplifies",
    "feminine",
    "has_augmentative",
    "has_diminutive",
    "has_domain_region",
    "has_domain_topic",
    "has_feminine",
    "has_masculine",
    "has_young",
    "holo_location",
    "holo_member",
    "holo_part",
    "holo_portion",
    "holo_substance",
    "holonym",
    "hypernym",
    "hyponym",
    "in_manner",
    "instance_hypernym",
    "instance_hyponym",
    "instrument",
    "involved",
    "involved_agent",
    "involved_direction",
    "involved_instrument",
    "involved_location",
    "involved_patient",
    "involved_result",
    "involved_source_direction",
    "involved_target_direction",
    "ir_synonym",
    "is_caused_by",
    "is_entailed_by",
    "is_exemplified_by",
    "is_subevent_of",
    "location",
    "manner_of",
    "masculine",
    "mero_location",
    "mero_member",
    "mero_part",
    "mero_portion",
    "mero_substance",
    "meronym",
    "other",
    "patient",
    "restricted_by",
    "restricts",
    "result",
    "role",
    "similar",
    "source_direction",
    "state_of",
    "subevent",
    "target_direction",
    "young",
];

/// Valid kinds for the sense↔sense domain.
pub const SENSE_RELATIONS: &[&str] = &[
    "agent",
    "also",
    "antonym",
    "anto_converse",
    "anto_gradable",
    "anto_simple",
    "augmentative",
    "body_part",
    "by_means_of",
    "derivation",
    "destination",
    "diminutive",
    "domain_region",
    "domain_topic",
    "event",
    "exemplifies",
    "feminine",
    "has_augmentative",
    "has_diminutive",
    "has_domain_region",
    "has_domain_topic",
    "has_feminine",
    "has_masculine",
    "has_metaphor",
    "has_metonym",
    "has_young",
    "instrument",
    "is_exemplified_by",
    "location",
    "masculine",
    "material",
    "metaphor",
    "metonym",
    "other",
    "participle",
    "pertainym",
    "property",
    "result",
    "secondary_aspect_ip",
    "secondary_aspect_pi",
    "similar",
    "simple_aspect_ip",
    "simple_aspect_pi",
    "state",
    "undergoer",
    "uses",
    "vehicle",
    "young",
];

/// Valid kinds for the sense→synset domain. These have no automatic
/// inverse.
pub const SENSE_SYNSET_RELATIONS: &[&str] =
    &["other", "domain_topic", "domain_region", "exemplifies"];

static SYNSET_INVERSE_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SYNSET_RELATION_INVERSES.iter().copied().collect());

static SENSE_INVERSE_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SENSE_RELATION_INVERSES.iter().copied().collect());

static SYNSET_RELATION_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SYNSET_RELATIONS.iter().copied().collect());

static SENSE_RELATION_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SENSE_RELATIONS.iter().copied().collect());

static SENSE_SYNSET_RELATION_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SENSE_SYNSET_RELATIONS.iter().copied().collect());

/// The inverse of a synset relation kind, or None if it has no inverse.
pub fn synset_inverse(kind: &str) -> Option<&'static str> {
    SYNSET_INVERSE_MAP.get(kind).copied()
}

/// The inverse of a sense relation kind, or None if it has no inverse.
pub fn sense_inverse(kind: &str) -> Option<&'static str> {
    SENSE_INVERSE_MAP.get(kind).copied()
}

/// Whether a relation kind is symmetric (its inverse is itself) in either
/// relation domain.
pub fn is_symmetric(kind: &str) -> bool {
    SYNSET_INVERSE_MAP.get(kind).copied() == Some(kind)
        || SENSE_INVERSE_MAP.get(kind).copied() == Some(kind)
}

pub fn is_valid_synset_relation(kind: &str) -> bool {
    SYNSET_RELATION_SET.contains(kind)
}

pub fn is_valid_sense_relation(kind: &str) -> bool {
    SENSE_RELATION_SET.contains(kind)
}

pub fn is_valid_sense_synset_relation(kind: &str) -> bool {
    SENSE_SYNSET_RELATION_SET.contains(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asymmetric_inverses() {
        assert_eq!(synset_inverse("hypernym"), Some("hyponym"));
        assert_eq!(synset_inverse("hyponym"), Some("hypernym"));
        assert_eq!(sense_inverse("metaphor"), Some("has_metaphor"));
    }

    #[test]
    fn test_symmetric_kinds() {
        assert!(is_symmetric("antonym"));
        assert!(is_symmetric("similar"));
        assert!(is_symmetric("derivation"));
        assert!(!is_symmetric("hypernym"));
        assert!(!is_symmetric("no_such_kind"));
    }

    #[test]
    fn test_validity_predicates() {
        assert!(is_valid_synset_relation("hypernym"));
        assert!(!is_valid_synset_relation("pertainym"));
        assert!(is_valid_sense_relation("pertainym"));
        assert!(is_valid_sense_synset_relation("domain_topic"));
        assert!(!is_valid_sense_synset_relation("hypernym"));
    }

    #[test]
    fn test_inverse_pairs_are_consistent() {
        for (kind, inverse) in SYNSET_RELATION_INVERSES {
            assert_eq!(synset_inverse(inverse), Some(*kind));
        }
        for (kind, inverse) in SENSE_RELATION_INVERSES {
            assert_eq!(sense_inverse(inverse), Some(*kind));
        }
    }

    #[test]
    fn test_also_has_no_inverse() {
        assert_eq!(synset_inverse("also"), None);
        assert_eq!(sense_inverse("also"), None);
    }
}
