use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    categories::OTHER_SUBCATEGORY,
    models::{AggregatedResource, DatabaseCategory, InteractionType},
};

pub const ROOT_NAME: &str = "OmniPath";
pub const NEUTRAL_GRAY: &str = "#999999";

const CODE_MAX_CHARS: usize = 10;
const CODE_PREFIX_CHARS: usize = 8;

/// How a leaf's record count becomes its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    /// `log10(records + 1)`, for proportional-area treemaps.
    #[default]
    Log,
    /// Raw record count.
    Linear,
}

impl WeightMode {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "log" | "log10" => Some(Self::Log),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }

    pub fn weight(&self, record_count: u64) -> f64 {
        match self {
            Self::Log => (record_count as f64 + 1.0).log10(),
            Self::Linear => record_count as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub name: String,
    /// Set on leaves only; groups derive their size from their leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,
}

impl HierarchyNode {
    fn group(name: impl Into<String>, color: Option<&str>, children: Vec<HierarchyNode>) -> Self {
        Self {
            name: name.into(),
            weight: None,
            color: color.map(ToString::to_string),
            children,
            code: None,
            original_name: None,
            record_count: None,
        }
    }

    fn leaf(resource: &AggregatedResource, mode: WeightMode) -> Self {
        Self {
            name: resource.resource.clone(),
            weight: Some(mode.weight(resource.record_count)),
            color: None,
            children: Vec::new(),
            code: Some(short_code(&resource.resource)),
            original_name: Some(resource.original_name.clone()),
            record_count: Some(resource.record_count),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.weight.is_some()
    }

    pub fn total_weight(&self) -> f64 {
        match self.weight {
            Some(weight) => weight,
            None => self.children.iter().map(HierarchyNode::total_weight).sum(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(HierarchyNode::leaf_count).sum()
        }
    }

    #[cfg(test)]
    pub fn child(&self, name: &str) -> Option<&HierarchyNode> {
        self.children.iter().find(|child| child.name == name)
    }
}

pub fn database_color(category: DatabaseCategory) -> &'static str {
    match category {
        DatabaseCategory::Interactions => "#176fc1",
        DatabaseCategory::EnzymeSubstrate => "#d22027",
        DatabaseCategory::Complexes => "#4cbd38",
        DatabaseCategory::Annotations => "#f89d0e",
        DatabaseCategory::Intercellular => "#5b205f",
    }
}

pub fn interaction_type_color(kind: InteractionType) -> &'static str {
    match kind {
        InteractionType::Transcriptional => "#176fc1",
        InteractionType::PostTranslational => "#00acc1",
        InteractionType::MirnaTranscriptional => "#5e35b1",
        InteractionType::PostTranscriptional => "#1e88e5",
        InteractionType::SmallMoleculeProtein => "#00897b",
    }
}

pub fn annotation_category_color(category: &str) -> &'static str {
    match category {
        "Cell-cell communication" => "#f89d0e",
        "Localization (subcellular)" => "#ef5350",
        "Membrane localization & topology" => "#ab47bc",
        "Extracellular matrix, adhesion" => "#42a5f5",
        "Vesicles, secretome" => "#66bb6a",
        "Function, pathway" => "#ffa726",
        "Signatures" => "#8d6e63",
        "Disease, cancer" => "#ec407a",
        "Protein classes & families" => "#5c6bc0",
        "Cell type, tissue" => "#26a69a",
        "Transcription factors" => "#d4e157",
        _ => NEUTRAL_GRAY,
    }
}

fn short_code(name: &str) -> String {
    if name.chars().count() > CODE_MAX_CHARS {
        name.chars().take(CODE_PREFIX_CHARS).collect::<String>() + ".."
    } else {
        name.to_string()
    }
}

/// Leaves sorted by descending record count, then by name.
fn leaves<'a>(
    resources: impl IntoIterator<Item = &'a AggregatedResource>,
    mode: WeightMode,
) -> Vec<HierarchyNode> {
    let mut sorted: Vec<&AggregatedResource> = resources.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.record_count
            .cmp(&a.record_count)
            .then_with(|| a.resource.cmp(&b.resource))
    });
    sorted
        .into_iter()
        .map(|resource| HierarchyNode::leaf(resource, mode))
        .collect()
}

/// Builds the category → subcategory → resource tree.
///
/// Interactions group under the five interaction types in fixed order,
/// annotations under their annotation category (largest first), and the
/// remaining categories hold their resources directly.
pub fn build_tree(resources: &[AggregatedResource], mode: WeightMode) -> HierarchyNode {
    let mut by_category: BTreeMap<DatabaseCategory, Vec<&AggregatedResource>> = BTreeMap::new();
    for resource in resources {
        by_category
            .entry(resource.database_category)
            .or_default()
            .push(resource);
    }

    let children = DatabaseCategory::ALL
        .into_iter()
        .map(|category| {
            let members = by_category.remove(&category).unwrap_or_default();
            let children = match category {
                DatabaseCategory::Interactions => interaction_groups(members, mode),
                DatabaseCategory::Annotations => annotation_groups(members, mode),
                _ => leaves(members, mode),
            };
            HierarchyNode::group(category.as_str(), Some(database_color(category)), children)
        })
        .collect();

    HierarchyNode::group(ROOT_NAME, None, children)
}

fn interaction_groups(members: Vec<&AggregatedResource>, mode: WeightMode) -> Vec<HierarchyNode> {
    let mut by_type: BTreeMap<&'static str, Vec<&AggregatedResource>> = BTreeMap::new();
    let mut untyped = 0usize;
    for resource in members {
        match resource
            .subcategory
            .as_deref()
            .and_then(InteractionType::from_label)
        {
            Some(kind) => by_type.entry(kind.key()).or_default().push(resource),
            None => untyped += 1,
        }
    }
    if untyped > 0 {
        debug!(untyped, "Interaction resources outside the fixed types left out of the tree");
    }

    InteractionType::ALL
        .into_iter()
        .filter_map(|kind| {
            let members = by_type.remove(kind.key())?;
            Some(HierarchyNode::group(
                kind.label(),
                Some(interaction_type_color(kind)),
                leaves(members, mode),
            ))
        })
        .collect()
}

fn annotation_groups(members: Vec<&AggregatedResource>, mode: WeightMode) -> Vec<HierarchyNode> {
    let mut by_subcategory: BTreeMap<&str, Vec<&AggregatedResource>> = BTreeMap::new();
    for resource in members {
        let subcategory = resource.subcategory.as_deref().unwrap_or(OTHER_SUBCATEGORY);
        by_subcategory.entry(subcategory).or_default().push(resource);
    }

    let mut groups: Vec<HierarchyNode> = by_subcategory
        .into_iter()
        .map(|(subcategory, members)| {
            HierarchyNode::group(
                subcategory,
                Some(annotation_category_color(subcategory)),
                leaves(members, mode),
            )
        })
        .collect();
    groups.sort_by(|a, b| {
        b.total_weight()
            .total_cmp(&a.total_weight())
            .then_with(|| a.name.cmp(&b.name))
    });
    groups
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{annotation_category_color, build_tree, short_code, WeightMode, NEUTRAL_GRAY};
    use crate::models::{
        AggregatedResource, DatabaseCategory, LicenseCategory, MaintenanceCategory,
    };

    fn resource(
        name: &str,
        count: u64,
        category: DatabaseCategory,
        subcategory: Option<&str>,
    ) -> AggregatedResource {
        AggregatedResource {
            resource: name.to_string(),
            original_name: name.to_string(),
            aliases: vec![name.to_string()],
            database_category: category,
            subcategory: subcategory.map(ToString::to_string),
            record_count: count,
            unique_entries: count,
            unique_references: BTreeSet::new(),
            maintenance_category: MaintenanceCategory::Unknown,
            license_category: LicenseCategory::Unknown,
        }
    }

    fn sample() -> Vec<AggregatedResource> {
        vec![
            resource("SIGNOR", 99, DatabaseCategory::Interactions, Some("Post Translational")),
            resource("KEGG", 999, DatabaseCategory::Interactions, Some("Post Translational")),
            resource("ABC", 99, DatabaseCategory::Interactions, Some("Post Translational")),
            resource("TRRUST", 9, DatabaseCategory::Interactions, Some("Transcriptional")),
            resource("Odd", 9, DatabaseCategory::Interactions, Some("Weird Type")),
            resource("PhosphoSite", 9, DatabaseCategory::EnzymeSubstrate, Some("Enzyme-Substrate")),
            resource("CellPhoneDB", 9, DatabaseCategory::Annotations, Some("Cell-cell communication")),
            resource("Mystery", 99999, DatabaseCategory::Annotations, Some("Other")),
            resource("Ramilowski2015", 3, DatabaseCategory::Intercellular, Some("Intercellular")),
        ]
    }

    #[test]
    fn tree_has_expected_layers() {
        let tree = build_tree(&sample(), WeightMode::Log);
        assert_eq!(tree.name, "OmniPath");
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Interactions", "Enzyme-Substrate", "Complexes", "Annotations", "Intercellular"]
        );

        let interactions = tree.child("Interactions").expect("interactions");
        let types: Vec<_> = interactions.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(types, vec!["Transcriptional", "Post Translational"]);

        let enz = tree.child("Enzyme-Substrate").expect("enz");
        assert!(enz.children[0].is_leaf());
        assert_eq!(tree.child("Complexes").expect("complexes").children.len(), 0);
        assert_eq!(tree.leaf_count(), 8);
    }

    #[test]
    fn leaves_sort_by_count_then_name() {
        let tree = build_tree(&sample(), WeightMode::Linear);
        let post = tree
            .child("Interactions")
            .and_then(|n| n.child("Post Translational"))
            .expect("post translational");
        let order: Vec<_> = post.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["KEGG", "ABC", "SIGNOR"]);
        assert_eq!(post.children[0].weight, Some(999.0));
        assert_eq!(post.weight, None);
        assert_eq!(post.total_weight(), 999.0 + 99.0 + 99.0);
    }

    #[test]
    fn log_mode_weights_leaves() {
        let tree = build_tree(&sample(), WeightMode::Log);
        let kegg = tree
            .child("Interactions")
            .and_then(|n| n.child("Post Translational"))
            .and_then(|n| n.child("KEGG"))
            .expect("kegg");
        assert!((kegg.weight.expect("weight") - 3.0).abs() < 1e-12);
        assert_eq!(kegg.record_count, Some(999));
    }

    #[test]
    fn annotation_groups_largest_first_with_other_bucket() {
        let tree = build_tree(&sample(), WeightMode::Log);
        let annotations = tree.child("Annotations").expect("annotations");
        assert_eq!(annotations.children[0].name, "Other");
        assert_eq!(annotations.children[0].color.as_deref(), Some(NEUTRAL_GRAY));
        assert_eq!(annotations.children[1].color.as_deref(), Some("#f89d0e"));
    }

    #[test]
    fn build_is_deterministic() {
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(
            build_tree(&sample(), WeightMode::Log),
            build_tree(&reversed, WeightMode::Log)
        );
    }

    #[test]
    fn palette_and_codes() {
        assert_eq!(annotation_category_color("Nope"), NEUTRAL_GRAY);
        assert_eq!(short_code("Ramilowski2015"), "Ramilows..");
        assert_eq!(short_code("CellPhoneDB"), "CellPhon..");
        assert_eq!(short_code("KEGG"), "KEGG");
        assert_eq!(WeightMode::from_key("LINEAR"), Some(WeightMode::Linear));
        assert_eq!(WeightMode::from_key("cubic"), None);
    }
}
