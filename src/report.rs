use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    aggregate::{
        bin_overlap, literature_refs_by_database_and_type, resource_overlap, LiteratureRefCount,
        OverlapBins, OverlapCount, TableSnapshot,
    },
    hierarchy::{build_tree, HierarchyNode, WeightMode},
    models::{AggregatedResource, DatabaseCategory, LicenseCategory, MaintenanceCategory},
};

pub const STATS_SCHEMA_VERSION: &str = "omnipath.db-stats.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedStats {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub resources: Vec<AggregatedResource>,
    pub resource_overlap: Vec<OverlapCount>,
    pub plot_data: PlotData,
    pub metadata: StatsMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotData {
    pub literature_refs_by_database_and_type: Vec<LiteratureRefCount>,
    pub resource_overlap_binned: Vec<OverlapBins>,
    pub database_breakdown: Vec<DatabaseBreakdown>,
    pub weight_mode: WeightMode,
    pub treemap: HierarchyNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsMetadata {
    pub total_resources: usize,
    pub total_records: u64,
    pub total_references: usize,
    pub category_counts: CategoryCounts,
    pub unmapped_maintenance: Vec<String>,
    pub unmapped_license: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub interactions: usize,
    pub annotations: usize,
    pub intercellular: usize,
    pub complexes: usize,
    pub enzyme_substrate: usize,
}

impl CategoryCounts {
    fn bump(&mut self, category: DatabaseCategory) {
        let slot = match category {
            DatabaseCategory::Interactions => &mut self.interactions,
            DatabaseCategory::Annotations => &mut self.annotations,
            DatabaseCategory::Intercellular => &mut self.intercellular,
            DatabaseCategory::Complexes => &mut self.complexes,
            DatabaseCategory::EnzymeSubstrate => &mut self.enzyme_substrate,
        };
        *slot += 1;
    }
}

/// Resources or records of one database, split by maintenance and license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketTally {
    pub frequent: u64,
    pub infrequent: u64,
    pub one_time_paper: u64,
    pub discontinued: u64,
    pub maintenance_unknown: u64,
    pub academic_nonprofit: u64,
    pub commercial: u64,
    pub license_unknown: u64,
    pub total: u64,
}

impl BucketTally {
    fn add(&mut self, maintenance: MaintenanceCategory, license: LicenseCategory, amount: u64) {
        let maintenance_slot = match maintenance {
            MaintenanceCategory::Frequent => &mut self.frequent,
            MaintenanceCategory::Infrequent => &mut self.infrequent,
            MaintenanceCategory::OneTimePaper => &mut self.one_time_paper,
            MaintenanceCategory::Discontinued => &mut self.discontinued,
            MaintenanceCategory::Unknown => &mut self.maintenance_unknown,
        };
        *maintenance_slot += amount;
        let license_slot = match license {
            LicenseCategory::AcademicNonprofit => &mut self.academic_nonprofit,
            LicenseCategory::Commercial => &mut self.commercial,
            LicenseCategory::Unknown => &mut self.license_unknown,
        };
        *license_slot += amount;
        self.total += amount;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseBreakdown {
    pub category: DatabaseCategory,
    pub resources: BucketTally,
    pub records: BucketTally,
}

pub fn database_breakdown(resources: &[AggregatedResource]) -> Vec<DatabaseBreakdown> {
    DatabaseCategory::ALL
        .into_iter()
        .map(|category| {
            // One resource can sit under several subcategories; its
            // assignment is per name, so fold those rows first.
            let mut per_name: BTreeMap<&str, (MaintenanceCategory, LicenseCategory, u64)> =
                BTreeMap::new();
            for resource in resources.iter().filter(|r| r.database_category == category) {
                per_name
                    .entry(resource.resource.as_str())
                    .or_insert((resource.maintenance_category, resource.license_category, 0))
                    .2 += resource.record_count;
            }

            let mut breakdown = DatabaseBreakdown {
                category,
                resources: BucketTally::default(),
                records: BucketTally::default(),
            };
            for (maintenance, license, records) in per_name.into_values() {
                breakdown.resources.add(maintenance, license, 1);
                breakdown.records.add(maintenance, license, records);
            }
            breakdown
        })
        .collect()
}

pub fn build_metadata(resources: &[AggregatedResource]) -> StatsMetadata {
    let mut names = BTreeSet::new();
    let mut references = BTreeSet::new();
    let mut unmapped_maintenance = BTreeSet::new();
    let mut unmapped_license = BTreeSet::new();
    let mut category_counts = CategoryCounts::default();
    let mut total_records = 0u64;

    for resource in resources {
        names.insert(resource.resource.as_str());
        references.extend(resource.unique_references.iter().map(String::as_str));
        total_records += resource.record_count;
        category_counts.bump(resource.database_category);
        if resource.maintenance_category == MaintenanceCategory::Unknown {
            unmapped_maintenance.insert(resource.resource.clone());
        }
        if resource.license_category == LicenseCategory::Unknown {
            unmapped_license.insert(resource.resource.clone());
        }
    }

    StatsMetadata {
        total_resources: names.len(),
        total_records,
        total_references: references.len(),
        category_counts,
        unmapped_maintenance: unmapped_maintenance.into_iter().collect(),
        unmapped_license: unmapped_license.into_iter().collect(),
    }
}

pub fn build_report(
    snapshot: &TableSnapshot,
    resources: Vec<AggregatedResource>,
    weight_mode: WeightMode,
    run_id: &str,
) -> UnifiedStats {
    let overlap = resource_overlap(snapshot);
    let plot_data = PlotData {
        literature_refs_by_database_and_type: literature_refs_by_database_and_type(snapshot),
        resource_overlap_binned: bin_overlap(&overlap),
        database_breakdown: database_breakdown(&resources),
        weight_mode,
        treemap: build_tree(&resources, weight_mode),
    };
    let metadata = build_metadata(&resources);

    UnifiedStats {
        schema_version: STATS_SCHEMA_VERSION.to_string(),
        run_id: run_id.to_string(),
        generated_at: Utc::now(),
        resources,
        resource_overlap: overlap,
        plot_data,
        metadata,
    }
}

pub fn log_summary(stats: &UnifiedStats) {
    let meta = &stats.metadata;
    info!(
        run_id = %stats.run_id,
        total_resources = meta.total_resources,
        total_records = meta.total_records,
        total_references = meta.total_references,
        "Summary"
    );
    info!(
        run_id = %stats.run_id,
        interactions = meta.category_counts.interactions,
        annotations = meta.category_counts.annotations,
        intercellular = meta.category_counts.intercellular,
        complexes = meta.category_counts.complexes,
        enzyme_substrate = meta.category_counts.enzyme_substrate,
        "Category breakdown"
    );
    if !meta.unmapped_maintenance.is_empty() {
        info!(
            run_id = %stats.run_id,
            count = meta.unmapped_maintenance.len(),
            resources = %meta.unmapped_maintenance.join(", "),
            "Resources without a maintenance category"
        );
    }
    if !meta.unmapped_license.is_empty() {
        info!(
            run_id = %stats.run_id,
            count = meta.unmapped_license.len(),
            resources = %meta.unmapped_license.join(", "),
            "Resources without a license category"
        );
    }
}
