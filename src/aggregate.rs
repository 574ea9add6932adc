use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    dedupe::is_excluded,
    delimited::DelimitedList,
    error::{StatsError, StatsResult},
    models::{interaction_entry_type, interaction_subcategory, DatabaseCategory, RawSourceRecord},
    normalize::normalize,
    store::{
        AnnotationRow, ComplexRow, EnzSubRow, InteractionRow, IntercellRow, RecordStore,
        ANNOTATIONS_TABLE, COMPLEXES_TABLE, ENZ_SUB_TABLE, INTERACTIONS_TABLE, INTERCELL_TABLE,
    },
};

/// Rows of all five tables, read from one store snapshot.
#[derive(Debug, Clone, Default)]
pub struct TableSnapshot {
    pub interactions: Vec<InteractionRow>,
    pub enz_sub: Vec<EnzSubRow>,
    pub complexes: Vec<ComplexRow>,
    pub annotations: Vec<AnnotationRow>,
    pub intercell: Vec<IntercellRow>,
}

impl TableSnapshot {
    pub fn row_count(&self) -> usize {
        self.interactions.len()
            + self.enz_sub.len()
            + self.complexes.len()
            + self.annotations.len()
            + self.intercell.len()
    }
}

/// Scans the five tables concurrently and waits for all of them. The first
/// failing scan fails the whole snapshot.
pub async fn scan_all<S: RecordStore>(store: Arc<S>) -> StatsResult<TableSnapshot> {
    let (interactions, enz_sub, complexes, annotations, intercell) = tokio::try_join!(
        spawn_scan(store.clone(), INTERACTIONS_TABLE, |s: &S| s.interactions()),
        spawn_scan(store.clone(), ENZ_SUB_TABLE, |s: &S| s.enzyme_substrate()),
        spawn_scan(store.clone(), COMPLEXES_TABLE, |s: &S| s.complexes()),
        spawn_scan(store.clone(), ANNOTATIONS_TABLE, |s: &S| s.annotations()),
        spawn_scan(store, INTERCELL_TABLE, |s: &S| s.intercell()),
    )?;

    Ok(TableSnapshot {
        interactions,
        enz_sub,
        complexes,
        annotations,
        intercell,
    })
}

async fn spawn_scan<S, T, F>(store: Arc<S>, table: &'static str, scan: F) -> StatsResult<Vec<T>>
where
    S: RecordStore,
    T: Send + 'static,
    F: FnOnce(&S) -> StatsResult<Vec<T>> + Send + 'static,
{
    let started = Instant::now();
    let rows = tokio::task::spawn_blocking(move || scan(&store))
        .await
        .map_err(|source| StatsError::ScanAborted { table, source })??;
    info!(
        table,
        rows = rows.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Table scan finished"
    );
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountMode {
    /// Every (row, listed resource) pair counts once.
    Contributions,
    /// Only distinct entries count.
    DistinctEntries,
}

#[derive(Debug, Default)]
struct Tally {
    contributions: u64,
    entries: HashSet<String>,
    references: BTreeSet<String>,
}

impl Tally {
    fn record<'a>(&mut self, entry: String, references: impl Iterator<Item = &'a str>) {
        self.contributions += 1;
        self.entries.insert(entry);
        self.references.extend(references.map(ToString::to_string));
    }
}

#[derive(Debug, Default)]
struct Tallies(BTreeMap<(String, Option<String>), Tally>);

impl Tallies {
    fn credit_packed(
        &mut self,
        id: i64,
        subcategory: Option<&str>,
        sources: &DelimitedList,
        references: &DelimitedList,
    ) {
        for source in sources.iter() {
            self.0
                .entry((source.to_string(), subcategory.map(ToString::to_string)))
                .or_default()
                .record(id.to_string(), references.iter());
        }
    }

    fn credit_scalar(&mut self, source: &str, subcategory: Option<&str>, entry: String) {
        self.0
            .entry((source.to_string(), subcategory.map(ToString::to_string)))
            .or_default()
            .record(entry, std::iter::empty());
    }

    fn into_records(self, category: DatabaseCategory, mode: CountMode) -> Vec<RawSourceRecord> {
        self.0
            .into_iter()
            .map(|((source, subcategory), tally)| {
                let unique_entries = tally.entries.len() as u64;
                RawSourceRecord {
                    source,
                    record_count: match mode {
                        CountMode::Contributions => tally.contributions,
                        CountMode::DistinctEntries => unique_entries,
                    },
                    unique_entries,
                    unique_references: tally.references,
                    database_category: category,
                    subcategory,
                }
            })
            .collect()
    }
}

fn scalar_source(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub fn aggregate_interactions(rows: &[InteractionRow]) -> Vec<RawSourceRecord> {
    let mut tallies = Tallies::default();
    let mut skipped = 0usize;
    for row in rows {
        if row.sources.is_empty() {
            skipped += 1;
            continue;
        }
        let subcategory = scalar_source(row.interaction_type.as_deref()).map(interaction_subcategory);
        tallies.credit_packed(row.id, subcategory.as_deref(), &row.sources, &row.references);
    }
    debug!(table = INTERACTIONS_TABLE, skipped, "Rows without sources skipped");
    tallies.into_records(DatabaseCategory::Interactions, CountMode::Contributions)
}

pub fn aggregate_enzyme_substrate(rows: &[EnzSubRow]) -> Vec<RawSourceRecord> {
    let mut tallies = Tallies::default();
    let subcategory = Some(DatabaseCategory::EnzymeSubstrate.as_str());
    for row in rows {
        tallies.credit_packed(row.id, subcategory, &row.sources, &row.references);
    }
    tallies.into_records(DatabaseCategory::EnzymeSubstrate, CountMode::Contributions)
}

pub fn aggregate_complexes(rows: &[ComplexRow]) -> Vec<RawSourceRecord> {
    let mut tallies = Tallies::default();
    let subcategory = Some(DatabaseCategory::Complexes.as_str());
    for row in rows {
        tallies.credit_packed(row.id, subcategory, &row.sources, &row.references);
    }
    tallies.into_records(DatabaseCategory::Complexes, CountMode::Contributions)
}

/// Annotation sources are scalar; both counts are distinct record ids. The
/// subcategory is filled in later from the annotation source groups.
pub fn aggregate_annotations(rows: &[AnnotationRow]) -> Vec<RawSourceRecord> {
    let mut tallies = Tallies::default();
    for row in rows {
        let Some(source) = scalar_source(row.source.as_deref()) else {
            continue;
        };
        let entry = match row.record_id {
            Some(record_id) => record_id.to_string(),
            None => format!("row-{}", row.id),
        };
        tallies.credit_scalar(source, None, entry);
    }
    tallies.into_records(DatabaseCategory::Annotations, CountMode::DistinctEntries)
}

/// One row per (entity, database); rows are counted, entities deduplicated.
pub fn aggregate_intercell(rows: &[IntercellRow]) -> Vec<RawSourceRecord> {
    let mut tallies = Tallies::default();
    let subcategory = Some(DatabaseCategory::Intercellular.as_str());
    for row in rows {
        let Some(database) = scalar_source(row.database.as_deref()) else {
            continue;
        };
        let entity = match scalar_source(row.uniprot.as_deref()) {
            Some(uniprot) => uniprot.to_string(),
            None => format!("row-{}", row.id),
        };
        tallies.credit_scalar(database, subcategory, entity);
    }
    tallies.into_records(DatabaseCategory::Intercellular, CountMode::Contributions)
}

/// Union of the per-table statistics, in table order.
pub fn aggregate_all(snapshot: &TableSnapshot) -> Vec<RawSourceRecord> {
    let mut records = aggregate_interactions(&snapshot.interactions);
    records.extend(aggregate_enzyme_substrate(&snapshot.enz_sub));
    records.extend(aggregate_complexes(&snapshot.complexes));
    records.extend(aggregate_annotations(&snapshot.annotations));
    records.extend(aggregate_intercell(&snapshot.intercell));
    records
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteratureRefCount {
    pub database: String,
    pub interaction_type: String,
    pub unique_reference_count: u64,
}

/// Distinct references per resource family and entry type.
pub fn literature_refs_by_database_and_type(snapshot: &TableSnapshot) -> Vec<LiteratureRefCount> {
    let mut refs: BTreeMap<(String, String), BTreeSet<&str>> = BTreeMap::new();
    for row in &snapshot.interactions {
        let entry_type = interaction_entry_type(row.interaction_type.as_deref());
        credit_references(&mut refs, &entry_type, &row.sources, &row.references);
    }
    for row in &snapshot.enz_sub {
        let entry_type = DatabaseCategory::EnzymeSubstrate.entry_type();
        credit_references(&mut refs, entry_type, &row.sources, &row.references);
    }
    for row in &snapshot.complexes {
        let entry_type = DatabaseCategory::Complexes.entry_type();
        credit_references(&mut refs, entry_type, &row.sources, &row.references);
    }

    refs.into_iter()
        .map(|((database, interaction_type), references)| LiteratureRefCount {
            database,
            interaction_type,
            unique_reference_count: references.len() as u64,
        })
        .collect()
}

fn credit_references<'a>(
    refs: &mut BTreeMap<(String, String), BTreeSet<&'a str>>,
    entry_type: &str,
    sources: &DelimitedList,
    references: &'a DelimitedList,
) {
    if references.is_empty() {
        return;
    }
    for source in sources.iter() {
        let family = normalize(source);
        if is_excluded(&family) {
            continue;
        }
        refs.entry((family, entry_type.to_string()))
            .or_default()
            .extend(references.iter());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapCount {
    pub number_of_resources: u64,
    pub entry_type: String,
    pub number_of_entries: u64,
}

/// Counts entries by how many distinct resource families cite them.
pub fn resource_overlap(snapshot: &TableSnapshot) -> Vec<OverlapCount> {
    let mut entries: HashMap<(&'static str, String), BTreeSet<String>> = HashMap::new();
    let mut cite = |entry_type: &'static str, entry_id: String, sources: &DelimitedList| {
        let families: BTreeSet<String> = sources
            .iter()
            .map(normalize)
            .filter(|family| !is_excluded(family))
            .collect();
        if families.is_empty() {
            return;
        }
        entries.entry((entry_type, entry_id)).or_default().extend(families);
    };

    for row in &snapshot.interactions {
        let entry_id = format!(
            "{}-{}",
            row.source.as_deref().unwrap_or_default(),
            row.target.as_deref().unwrap_or_default()
        );
        cite(DatabaseCategory::Interactions.entry_type(), entry_id, &row.sources);
    }
    for row in &snapshot.enz_sub {
        let entry_id = format!(
            "{}-{}-{}",
            row.enzyme.as_deref().unwrap_or_default(),
            row.substrate.as_deref().unwrap_or_default(),
            row.modification.as_deref().unwrap_or("none")
        );
        cite(DatabaseCategory::EnzymeSubstrate.entry_type(), entry_id, &row.sources);
    }
    for row in &snapshot.complexes {
        let Some(name) = scalar_source(row.name.as_deref()) else {
            continue;
        };
        cite(DatabaseCategory::Complexes.entry_type(), name.to_string(), &row.sources);
    }

    let mut counts: BTreeMap<(&'static str, u64), u64> = BTreeMap::new();
    for ((entry_type, _), families) in entries {
        *counts.entry((entry_type, families.len() as u64)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((entry_type, number_of_resources), number_of_entries)| OverlapCount {
            number_of_resources,
            entry_type: entry_type.to_string(),
            number_of_entries,
        })
        .collect()
}

/// Share of entries cited by 1, 2, 3, 4 and 5+ resources, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapBins {
    #[serde(rename = "entryType")]
    pub entry_type: String,
    #[serde(rename = "1 resource")]
    pub one: f64,
    #[serde(rename = "2 resources")]
    pub two: f64,
    #[serde(rename = "3 resources")]
    pub three: f64,
    #[serde(rename = "4 resources")]
    pub four: f64,
    #[serde(rename = "5+ resources")]
    pub five_plus: f64,
    #[serde(rename = "totalEntries")]
    pub total_entries: u64,
}

pub fn bin_overlap(overlap: &[OverlapCount]) -> Vec<OverlapBins> {
    [
        DatabaseCategory::Interactions,
        DatabaseCategory::EnzymeSubstrate,
        DatabaseCategory::Complexes,
    ]
    .into_iter()
    .map(|category| {
        let entry_type = category.entry_type();
        let mut bins = [0u64; 5];
        for row in overlap.iter().filter(|row| row.entry_type == entry_type) {
            let idx = (row.number_of_resources.clamp(1, 5) - 1) as usize;
            bins[idx] += row.number_of_entries;
        }
        let total: u64 = bins.iter().sum();
        let pct = |n: u64| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };
        OverlapBins {
            entry_type: overlap_label(entry_type),
            one: pct(bins[0]),
            two: pct(bins[1]),
            three: pct(bins[2]),
            four: pct(bins[3]),
            five_plus: pct(bins[4]),
            total_entries: total,
        }
    })
    .collect()
}

fn overlap_label(entry_type: &str) -> String {
    let mut chars = entry_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replacen('-', " ", 1),
        None => String::new(),
    }
}
