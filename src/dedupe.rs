use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{
    categories::CategoryLookup,
    models::{AggregatedResource, DatabaseCategory, RawSourceRecord},
    normalize::{is_canonical, normalize},
};

/// Composite resources and resources without a license; never reported.
pub const EXCLUDED_RESOURCES: [&str; 4] = ["CPAD", "CollecTRI", "DoRothEA", "cellsignal.com"];

/// Whether a resource's family name is on the denylist.
pub fn is_excluded(name: &str) -> bool {
    let family = normalize(name);
    EXCLUDED_RESOURCES.contains(&family.as_str())
}

type GroupKey = (DatabaseCategory, Option<String>, String);

#[derive(Debug, Default)]
struct Group {
    record_count: u64,
    unique_entries: u64,
    unique_references: BTreeSet<String>,
    /// Raw spelling and its own record count, per alias.
    aliases: BTreeMap<String, u64>,
}

impl Group {
    fn absorb(&mut self, record: RawSourceRecord) {
        self.record_count += record.record_count;
        self.unique_entries += record.unique_entries;
        self.unique_references.extend(record.unique_references);
        *self.aliases.entry(record.source).or_insert(0) += record.record_count;
    }

    /// The canonical spelling wins; otherwise the alias with the most
    /// records, ties going to the smaller name.
    fn representative(&self, family: &str) -> String {
        if let Some(canonical) = self.aliases.keys().find(|alias| is_canonical(alias)) {
            return canonical.clone();
        }
        self.aliases
            .iter()
            .max_by(|(a_name, a_count), (b_name, b_count)| {
                a_count.cmp(b_count).then_with(|| b_name.cmp(a_name))
            })
            .map(|(alias, _)| alias.clone())
            .unwrap_or_else(|| family.to_string())
    }
}

/// Merges raw records whose names share a family within the same category
/// and subcategory.
///
/// Counts are summed over every alias in a group and references are
/// unioned, so a reference cited under two aliases is counted once.
/// Denylisted families are dropped before grouping. Output is ordered by
/// category, subcategory and name.
pub fn dedupe(records: Vec<RawSourceRecord>, lookup: &CategoryLookup) -> Vec<AggregatedResource> {
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
    let mut excluded = 0usize;

    for record in records {
        let family = normalize(&record.source);
        if EXCLUDED_RESOURCES.contains(&family.as_str()) {
            excluded += 1;
            continue;
        }
        groups
            .entry((record.database_category, record.subcategory.clone(), family))
            .or_default()
            .absorb(record);
    }

    debug!(groups = groups.len(), excluded, "Deduplicated resource records");

    groups
        .into_iter()
        .map(|((database_category, subcategory, family), group)| {
            let assignment = lookup.lookup(&family, database_category);
            AggregatedResource {
                original_name: group.representative(&family),
                aliases: group.aliases.keys().cloned().collect(),
                resource: family,
                database_category,
                subcategory,
                record_count: group.record_count,
                unique_entries: group.unique_entries,
                unique_references: group.unique_references,
                maintenance_category: assignment.maintenance,
                license_category: assignment.license,
            }
        })
        .collect()
}
