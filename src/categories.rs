use std::{collections::HashMap, path::Path};

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    error::{StatsError, StatsResult},
    models::{
        CategoryAssignment, DatabaseCategory, LicenseCategory, MaintenanceCategory,
        RawSourceRecord,
    },
    normalize::lookup_key,
};

pub const OTHER_SUBCATEGORY: &str = "Other";

/// Category name followed by the resource names filed under it, in document order.
pub type SourceTable = Vec<(String, Vec<String>)>;

const DEFAULT_ANNOTATION_GROUPS: &[(&str, &[&str])] = &[
    (
        "Cell-cell communication",
        &[
            "Baccin2019", "CellCall", "CellCellInteractions", "CellChatDB", "CellChatDB_complex",
            "Cellinker", "Cellinker_complex", "CellPhoneDB", "CellPhoneDB_complex", "CellTalkDB",
            "connectomeDB2020", "EMBRACE", "Guide2Pharma", "iTALK", "HPMR", "ICELLNET",
            "ICELLNET_complex", "Kirouac2010", "LRdb", "Ramilowski2015", "scConnect",
            "scConnect_complex", "SignaLink_function", "Surfaceome", "talklr",
        ],
    ),
    (
        "Localization (subcellular)",
        &[
            "ComPPI", "Exocarta", "HPA_subcellular", "HPA_secretome", "HumanCellMap", "LOCATE",
            "Ramilowski_location", "UniProt_location", "Vesiclepedia", "Wang",
        ],
    ),
    (
        "Membrane localization & topology",
        &[
            "Almen2009", "CellPhoneDB", "CSPA", "LOCATE", "Membranome", "OPM", "Phobius",
            "Ramilowski_location", "TopDB", "UniProt_topology",
        ],
    ),
    (
        "Extracellular matrix, adhesion",
        &["Matrisome", "MatrixDB", "Integrins", "MCAM", "Zhong2015"],
    ),
    ("Vesicles, secretome", &["Almen2009", "Exocarta", "Vesiclepedia"]),
    (
        "Function, pathway",
        &[
            "CellChatDB", "GO_Intercell", "KEGG", "KEGG-PC", "NetPath", "SignaLink_pathway",
            "SignaLink_function", "CORUM_Funcat", "CORUM_GO", "SIGNOR", "PROGENy", "MSigDB",
            "UniProt_keyword", "Wang",
        ],
    ),
    ("Signatures", &["CytoSig", "PanglaoDB", "PROGENy"]),
    (
        "Disease, cancer",
        &[
            "DisGeNet", "CancerGeneCensus", "IntOGen", "CancerSEA", "CancerDrugsDB", "DGIdb",
            "CPAD",
        ],
    ),
    (
        "Protein classes & families",
        &[
            "Adhesome", "DGIdb", "UniProt_family", "GPCRdb", "HPMR", "kinase.com", "Phosphatome",
            "TFcensus", "TCDB", "InterPro", "HGNC", "OPM",
        ],
    ),
    (
        "Cell type, tissue",
        &["HPA_tissue", "CSPA_celltype", "CellTypist", "UniProt_tissue", "EMBRACE"],
    ),
    ("Transcription factors", &["Lambert2018", "TFcensus"]),
];

/// The three static reference documents, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub maintenance: SourceTable,
    pub license: SourceTable,
    pub annotation_groups: SourceTable,
}

impl ReferenceTables {
    pub async fn load(
        maintenance_path: &Path,
        license_path: &Path,
        annotation_groups_path: Option<&Path>,
    ) -> StatsResult<Self> {
        let annotation_groups = match annotation_groups_path {
            Some(path) => read_table(path).await?,
            None => default_annotation_groups(),
        };
        Ok(Self {
            maintenance: read_table(maintenance_path).await?,
            license: read_table(license_path).await?,
            annotation_groups,
        })
    }
}

pub fn default_annotation_groups() -> SourceTable {
    DEFAULT_ANNOTATION_GROUPS
        .iter()
        .map(|(category, sources)| {
            (
                category.to_string(),
                sources.iter().map(ToString::to_string).collect(),
            )
        })
        .collect()
}

async fn read_table(path: &Path) -> StatsResult<SourceTable> {
    let raw = fs::read_to_string(path).await.map_err(|source| StatsError::ReferenceData {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&raw).map_err(|source| StatsError::ReferenceFormat {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_table(raw: &str) -> Result<SourceTable, serde_json::Error> {
    let document: Map<String, Value> = serde_json::from_str(raw)?;
    document
        .into_iter()
        .map(|(category, names)| Ok((category, serde_json::from_value(names)?)))
        .collect()
}

/// Resolves maintenance, license and annotation buckets for resource names.
///
/// Table entries are indexed by their family name, lower-cased, so any alias
/// of a resource matches any alias listed in a table. The first entry
/// indexed under a key wins.
#[derive(Debug, Clone, Default)]
pub struct CategoryLookup {
    maintenance: HashMap<String, MaintenanceCategory>,
    license: HashMap<String, LicenseCategory>,
    annotation: HashMap<String, String>,
    annotation_categories: Vec<String>,
}

impl CategoryLookup {
    pub fn new(tables: &ReferenceTables) -> Self {
        // Maintenance buckets are consulted in document order.
        let mut maintenance = HashMap::new();
        for (key, names) in &tables.maintenance {
            let category = match MaintenanceCategory::from_key(key) {
                Some(category) if category != MaintenanceCategory::Unknown => category,
                _ => {
                    warn!(category = %key, "Ignoring unrecognized maintenance category");
                    continue;
                }
            };
            debug!(category = %key, entries = names.len(), "Maintenance table entry");
            for name in names {
                maintenance.entry(lookup_key(name)).or_insert(category);
            }
        }

        let mut license = HashMap::new();
        for (key, _) in &tables.license {
            if matches!(LicenseCategory::from_key(key), None | Some(LicenseCategory::Unknown)) {
                warn!(category = %key, "Ignoring unrecognized license category");
            }
        }
        for category in LicenseCategory::LOOKUP_ORDER {
            for (key, names) in &tables.license {
                if LicenseCategory::from_key(key) != Some(category) {
                    continue;
                }
                for name in names {
                    license.entry(lookup_key(name)).or_insert(category);
                }
            }
        }

        let mut annotation = HashMap::new();
        let mut annotation_categories = Vec::new();
        for (category, names) in &tables.annotation_groups {
            annotation_categories.push(category.clone());
            for name in names {
                annotation
                    .entry(lookup_key(name))
                    .or_insert_with(|| category.clone());
            }
        }

        Self {
            maintenance,
            license,
            annotation,
            annotation_categories,
        }
    }

    pub fn maintenance(&self, name: &str) -> MaintenanceCategory {
        self.maintenance
            .get(&lookup_key(name))
            .copied()
            .unwrap_or(MaintenanceCategory::Unknown)
    }

    pub fn license(&self, name: &str) -> LicenseCategory {
        self.license
            .get(&lookup_key(name))
            .copied()
            .unwrap_or(LicenseCategory::Unknown)
    }

    pub fn annotation_subcategory(&self, name: &str) -> String {
        self.annotation
            .get(&lookup_key(name))
            .cloned()
            .unwrap_or_else(|| OTHER_SUBCATEGORY.to_string())
    }

    /// Annotation categories in table order, without the `Other` bucket.
    pub fn annotation_categories(&self) -> &[String] {
        &self.annotation_categories
    }

    pub fn lookup(&self, name: &str, category: DatabaseCategory) -> CategoryAssignment {
        CategoryAssignment {
            maintenance: self.maintenance(name),
            license: self.license(name),
            annotation_subcategory: (category == DatabaseCategory::Annotations)
                .then(|| self.annotation_subcategory(name)),
        }
    }

    /// Files annotation records under their annotation category; other
    /// records pass through unchanged.
    pub fn classify(&self, record: RawSourceRecord) -> RawSourceRecord {
        match self
            .lookup(&record.source, record.database_category)
            .annotation_subcategory
        {
            Some(subcategory) => RawSourceRecord {
                subcategory: Some(subcategory),
                ..record
            },
            None => record,
        }
    }
}
