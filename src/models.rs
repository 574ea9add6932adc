use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatabaseCategory {
    Interactions,
    #[serde(rename = "Enzyme-Substrate")]
    EnzymeSubstrate,
    Complexes,
    Annotations,
    Intercellular,
}

impl DatabaseCategory {
    pub const ALL: [Self; 5] = [
        Self::Interactions,
        Self::EnzymeSubstrate,
        Self::Complexes,
        Self::Annotations,
        Self::Intercellular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interactions => "Interactions",
            Self::EnzymeSubstrate => "Enzyme-Substrate",
            Self::Complexes => "Complexes",
            Self::Annotations => "Annotations",
            Self::Intercellular => "Intercellular",
        }
    }

    /// Entry type used by the overlap and literature statistics.
    pub fn entry_type(&self) -> &'static str {
        match self {
            Self::Interactions => "interaction",
            Self::EnzymeSubstrate => "enzyme-substrate",
            Self::Complexes => "complex",
            Self::Annotations => "annotation",
            Self::Intercellular => "intercellular",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Transcriptional,
    PostTranslational,
    MirnaTranscriptional,
    PostTranscriptional,
    SmallMoleculeProtein,
}

impl InteractionType {
    pub const ALL: [Self; 5] = [
        Self::Transcriptional,
        Self::PostTranslational,
        Self::MirnaTranscriptional,
        Self::PostTranscriptional,
        Self::SmallMoleculeProtein,
    ];

    /// Parses the raw `type` column; the lncRNA subtype folds into
    /// `post_transcriptional`.
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim() {
            "transcriptional" => Some(Self::Transcriptional),
            "post_translational" => Some(Self::PostTranslational),
            "mirna_transcriptional" => Some(Self::MirnaTranscriptional),
            "post_transcriptional" | "lncrna_post_transcriptional" => {
                Some(Self::PostTranscriptional)
            }
            "small_molecule_protein" => Some(Self::SmallMoleculeProtein),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Transcriptional => "transcriptional",
            Self::PostTranslational => "post_translational",
            Self::MirnaTranscriptional => "mirna_transcriptional",
            Self::PostTranscriptional => "post_transcriptional",
            Self::SmallMoleculeProtein => "small_molecule_protein",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Transcriptional => "Transcriptional",
            Self::PostTranslational => "Post Translational",
            Self::MirnaTranscriptional => "miRNA Transcriptional",
            Self::PostTranscriptional => "Post Transcriptional",
            Self::SmallMoleculeProtein => "Small Molecule Protein",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

/// Display label for a raw interaction type; unknown types are title-cased.
pub fn interaction_subcategory(raw: &str) -> String {
    if let Some(kind) = InteractionType::from_key(raw) {
        return kind.label().to_string();
    }
    let spaced = raw.trim().replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_boundary = true;
    for c in spaced.chars() {
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = !c.is_alphanumeric();
    }
    out
}

/// Entry type key for literature statistics of one interaction row.
pub fn interaction_entry_type(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => InteractionType::from_key(raw)
            .map(|t| t.key().to_string())
            .unwrap_or_else(|| raw.trim().to_string()),
        None => "unknown".to_string(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceCategory {
    Frequent,
    Infrequent,
    OneTimePaper,
    Discontinued,
    Unknown,
}

impl MaintenanceCategory {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "frequent" => Some(Self::Frequent),
            "infrequent" => Some(Self::Infrequent),
            "one_time_paper" => Some(Self::OneTimePaper),
            "discontinued" => Some(Self::Discontinued),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LicenseCategory {
    AcademicNonprofit,
    Commercial,
    Unknown,
}

impl LicenseCategory {
    pub const LOOKUP_ORDER: [Self; 2] = [Self::AcademicNonprofit, Self::Commercial];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "academic_nonprofit" => Some(Self::AcademicNonprofit),
            "commercial" => Some(Self::Commercial),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAssignment {
    pub maintenance: MaintenanceCategory,
    pub license: LicenseCategory,
    pub annotation_subcategory: Option<String>,
}

/// One aggregated row per (raw resource, category, subcategory) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceRecord {
    pub source: String,
    pub record_count: u64,
    pub unique_entries: u64,
    pub unique_references: BTreeSet<String>,
    pub database_category: DatabaseCategory,
    pub subcategory: Option<String>,
}

/// Deduplicated resource, unique per (family name, category, subcategory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResource {
    pub resource: String,
    pub original_name: String,
    pub aliases: Vec<String>,
    pub database_category: DatabaseCategory,
    pub subcategory: Option<String>,
    pub record_count: u64,
    pub unique_entries: u64,
    pub unique_references: BTreeSet<String>,
    pub maintenance_category: MaintenanceCategory,
    pub license_category: LicenseCategory,
}
