use std::{env, path::PathBuf, time::Duration};

use tracing::warn;

use crate::hierarchy::WeightMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub output_path: PathBuf,
    pub maintenance_table: PathBuf,
    pub license_table: PathBuf,
    /// Falls back to the built-in annotation groups when unset.
    pub annotation_groups: Option<PathBuf>,
    pub job_timeout: Duration,
    pub weight_mode: WeightMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("omnipath.db"),
            output_path: PathBuf::from("data/unified-db-stats.json"),
            maintenance_table: PathBuf::from("data/resources_by_maintenance_category.json"),
            license_table: PathBuf::from("data/resources_by_license.json"),
            annotation_groups: None,
            job_timeout: Duration::from_secs(900),
            weight_mode: WeightMode::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |key: &str| {
            lookup(key)
                .map(|v| v.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let job_timeout = lookup("OMNIPATH_STATS_TIMEOUT_SECONDS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.job_timeout);

        let weight_mode = match lookup("OMNIPATH_STATS_WEIGHT_MODE") {
            Some(raw) => WeightMode::from_key(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unknown OMNIPATH_STATS_WEIGHT_MODE, using default");
                defaults.weight_mode
            }),
            None => defaults.weight_mode,
        };

        Self {
            db_path: path("OMNIPATH_STATS_DB_PATH").unwrap_or(defaults.db_path),
            output_path: path("OMNIPATH_STATS_OUTPUT").unwrap_or(defaults.output_path),
            maintenance_table: path("OMNIPATH_STATS_MAINTENANCE_TABLE")
                .unwrap_or(defaults.maintenance_table),
            license_table: path("OMNIPATH_STATS_LICENSE_TABLE").unwrap_or(defaults.license_table),
            annotation_groups: path("OMNIPATH_STATS_ANNOTATION_GROUPS"),
            job_timeout,
            weight_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::PathBuf, time::Duration};

    use super::Config;
    use crate::hierarchy::WeightMode;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.db_path, PathBuf::from("omnipath.db"));
        assert_eq!(config.output_path, PathBuf::from("data/unified-db-stats.json"));
        assert_eq!(config.annotation_groups, None);
        assert_eq!(config.job_timeout, Duration::from_secs(900));
        assert_eq!(config.weight_mode, WeightMode::Log);
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("OMNIPATH_STATS_DB_PATH", " \"/srv/omnipath.db\" "),
            ("OMNIPATH_STATS_ANNOTATION_GROUPS", "groups.json"),
            ("OMNIPATH_STATS_TIMEOUT_SECONDS", "30"),
            ("OMNIPATH_STATS_WEIGHT_MODE", "LINEAR"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/srv/omnipath.db"));
        assert_eq!(config.annotation_groups, Some(PathBuf::from("groups.json")));
        assert_eq!(config.job_timeout, Duration::from_secs(30));
        assert_eq!(config.weight_mode, WeightMode::Linear);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = config_from(&[
            ("OMNIPATH_STATS_TIMEOUT_SECONDS", "soon"),
            ("OMNIPATH_STATS_WEIGHT_MODE", "cubic"),
            ("OMNIPATH_STATS_OUTPUT", "  "),
        ]);
        assert_eq!(config.job_timeout, Duration::from_secs(900));
        assert_eq!(config.weight_mode, WeightMode::Log);
        assert_eq!(config.output_path, PathBuf::from("data/unified-db-stats.json"));
    }
}
