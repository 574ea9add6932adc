use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags, Row};

use crate::{
    delimited::DelimitedList,
    error::{StatsError, StatsResult},
};

pub const INTERACTIONS_TABLE: &str = "interactions";
pub const ENZ_SUB_TABLE: &str = "enz_sub";
pub const COMPLEXES_TABLE: &str = "complexes";
pub const ANNOTATIONS_TABLE: &str = "annotations";
pub const INTERCELL_TABLE: &str = "intercell";

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRow {
    pub id: i64,
    pub source: Option<String>,
    pub target: Option<String>,
    pub interaction_type: Option<String>,
    pub sources: DelimitedList,
    pub references: DelimitedList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnzSubRow {
    pub id: i64,
    pub enzyme: Option<String>,
    pub substrate: Option<String>,
    pub modification: Option<String>,
    pub sources: DelimitedList,
    pub references: DelimitedList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexRow {
    pub id: i64,
    pub name: Option<String>,
    pub sources: DelimitedList,
    pub references: DelimitedList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRow {
    pub id: i64,
    pub source: Option<String>,
    pub record_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntercellRow {
    pub id: i64,
    pub database: Option<String>,
    pub uniprot: Option<String>,
}

/// Read-only access to the five record tables.
pub trait RecordStore: Send + Sync + 'static {
    fn interactions(&self) -> StatsResult<Vec<InteractionRow>>;
    fn enzyme_substrate(&self) -> StatsResult<Vec<EnzSubRow>>;
    fn complexes(&self) -> StatsResult<Vec<ComplexRow>>;
    fn annotations(&self) -> StatsResult<Vec<AnnotationRow>>;
    fn intercell(&self) -> StatsResult<Vec<IntercellRow>>;
}

/// SQLite-backed store; every scan opens its own read-only connection so
/// scans can run in parallel.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self, table: &'static str) -> StatsResult<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StatsError::source_unavailable(table))
    }

    fn scan<T, F>(&self, table: &'static str, sql: &str, map: F) -> StatsResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.open(table)?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(StatsError::source_unavailable(table))?;
        let rows = stmt
            .query_map([], map)
            .map_err(StatsError::source_unavailable(table))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(StatsError::source_unavailable(table))?);
        }
        Ok(out)
    }
}

impl RecordStore for SqliteStore {
    fn interactions(&self) -> StatsResult<Vec<InteractionRow>> {
        self.scan(
            INTERACTIONS_TABLE,
            r#"SELECT id, source, target, type, sources, "references" FROM interactions"#,
            |row| {
                Ok(InteractionRow {
                    id: row.get(0)?,
                    source: row.get(1)?,
                    target: row.get(2)?,
                    interaction_type: row.get(3)?,
                    sources: row.get(4)?,
                    references: row.get(5)?,
                })
            },
        )
    }

    fn enzyme_substrate(&self) -> StatsResult<Vec<EnzSubRow>> {
        self.scan(
            ENZ_SUB_TABLE,
            r#"SELECT id, enzyme, substrate, modification, sources, "references" FROM enz_sub"#,
            |row| {
                Ok(EnzSubRow {
                    id: row.get(0)?,
                    enzyme: row.get(1)?,
                    substrate: row.get(2)?,
                    modification: row.get(3)?,
                    sources: row.get(4)?,
                    references: row.get(5)?,
                })
            },
        )
    }

    fn complexes(&self) -> StatsResult<Vec<ComplexRow>> {
        self.scan(
            COMPLEXES_TABLE,
            r#"SELECT id, name, sources, "references" FROM complexes"#,
            |row| {
                Ok(ComplexRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    sources: row.get(2)?,
                    references: row.get(3)?,
                })
            },
        )
    }

    fn annotations(&self) -> StatsResult<Vec<AnnotationRow>> {
        self.scan(
            ANNOTATIONS_TABLE,
            "SELECT id, source, record_id FROM annotations",
            |row| {
                Ok(AnnotationRow {
                    id: row.get(0)?,
                    source: row.get(1)?,
                    record_id: row.get(2)?,
                })
            },
        )
    }

    fn intercell(&self) -> StatsResult<Vec<IntercellRow>> {
        self.scan(
            INTERCELL_TABLE,
            "SELECT id, database, uniprot FROM intercell",
            |row| {
                Ok(IntercellRow {
                    id: row.get(0)?,
                    database: row.get(1)?,
                    uniprot: row.get(2)?,
                })
            },
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    use rusqlite::{params, Connection};

    pub const SCHEMA_SQL: &str = r#"
        CREATE TABLE interactions (
            id INTEGER PRIMARY KEY,
            source TEXT,
            target TEXT,
            type TEXT,
            sources TEXT,
            "references" TEXT
        );
        CREATE TABLE enz_sub (
            id INTEGER PRIMARY KEY,
            enzyme TEXT,
            substrate TEXT,
            modification TEXT,
            sources TEXT,
            "references" TEXT
        );
        CREATE TABLE complexes (
            id INTEGER PRIMARY KEY,
            name TEXT,
            sources TEXT,
            "references" TEXT
        );
        CREATE TABLE annotations (
            id INTEGER PRIMARY KEY,
            source TEXT,
            label TEXT,
            record_id INTEGER
        );
        CREATE TABLE intercell (
            id INTEGER PRIMARY KEY,
            database TEXT,
            uniprot TEXT
        );
    "#;

    /// Small database covering every table, including aliased, denylisted and
    /// malformed rows.
    pub fn seed_database(dir: &Path) -> PathBuf {
        let path = dir.join("omnipath.db");
        let conn = Connection::open(&path).expect("create fixture db");
        conn.execute_batch(SCHEMA_SQL).expect("create schema");

        let interactions: &[(&str, &str, Option<&str>, Option<&str>, Option<&str>)] = &[
            ("P1", "P2", Some("post_translational"), Some("KEGG;SIGNOR"), Some("111;222")),
            ("P1", "P3", Some("post_translational"), Some("SIGNOR_ProtMapper"), Some("222;333")),
            ("P2", "P3", Some("transcriptional"), Some("CollecTRI;DoRothEA_A"), Some("444")),
            ("P3", "P4", Some("lncrna_post_transcriptional"), Some("lncRNome"), None),
            ("P4", "P5", Some("post_transcriptional"), Some("miRTarBase"), Some("555")),
            ("P5", "P6", Some("post_translational"), None, Some("666")),
            ("P6", "P7", Some("post_translational"), Some(" ; "), None),
        ];
        for (source, target, kind, sources, refs) in interactions {
            conn.execute(
                r#"INSERT INTO interactions (source, target, type, sources, "references") VALUES (?1, ?2, ?3, ?4, ?5)"#,
                params![source, target, kind, sources, refs],
            )
            .expect("insert interaction");
        }

        conn.execute(
            r#"INSERT INTO enz_sub (enzyme, substrate, modification, sources, "references") VALUES ('E1', 'S1', 'phosphorylation', 'PhosphoSite;SIGNOR', '10;11')"#,
            [],
        )
        .expect("insert enz_sub");
        conn.execute(
            r#"INSERT INTO enz_sub (enzyme, substrate, modification, sources, "references") VALUES ('E1', 'S2', NULL, 'PhosphoSite_MIMP', '12')"#,
            [],
        )
        .expect("insert enz_sub");

        conn.execute(
            r#"INSERT INTO complexes (name, sources, "references") VALUES ('C1', 'CORUM;CellPhoneDB', '20')"#,
            [],
        )
        .expect("insert complex");
        conn.execute(
            r#"INSERT INTO complexes (name, sources, "references") VALUES ('C2', 'CellPhoneDB_complex', NULL)"#,
            [],
        )
        .expect("insert complex");

        let annotations: &[(&str, i64)] = &[
            ("CellPhoneDB", 1),
            ("CellPhoneDB", 1),
            ("CellPhoneDB", 2),
            ("CellPhoneDB_complex", 3),
            ("CPAD", 4),
            ("HPA_tissue", 5),
            ("MysteryDB", 6),
        ];
        for (source, record_id) in annotations {
            conn.execute(
                "INSERT INTO annotations (source, label, record_id) VALUES (?1, 'label', ?2)",
                params![source, record_id],
            )
            .expect("insert annotation");
        }

        let intercell: &[(&str, &str)] = &[
            ("CellPhoneDB", "Q1"),
            ("CellPhoneDB", "Q1"),
            ("CellPhoneDB", "Q2"),
            ("Ramilowski2015", "Q3"),
        ];
        for (database, uniprot) in intercell {
            conn.execute(
                "INSERT INTO intercell (database, uniprot) VALUES (?1, ?2)",
                params![database, uniprot],
            )
            .expect("insert intercell");
        }

        path
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::seed_database, RecordStore, SqliteStore};
    use crate::error::StatsError;

    #[test]
    fn reads_typed_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteStore::new(seed_database(dir.path()));

        let interactions = store.interactions().expect("interactions");
        assert_eq!(interactions.len(), 7);
        assert_eq!(
            interactions[0].sources.iter().collect::<Vec<_>>(),
            vec!["KEGG", "SIGNOR"]
        );
        assert!(interactions[5].sources.is_empty());
        assert!(interactions[6].sources.is_empty());

        assert_eq!(store.enzyme_substrate().expect("enz_sub").len(), 2);
        assert_eq!(store.complexes().expect("complexes").len(), 2);
        assert_eq!(store.annotations().expect("annotations").len(), 7);
        assert_eq!(store.intercell().expect("intercell").len(), 4);
    }

    #[test]
    fn missing_database_is_source_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteStore::new(dir.path().join("absent.db"));
        let err = store.interactions().expect_err("must fail");
        assert!(matches!(
            err,
            StatsError::SourceUnavailable { table: "interactions", .. }
        ));
    }

    #[test]
    fn missing_table_is_source_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.db");
        rusqlite::Connection::open(&path)
            .expect("create")
            .execute_batch("CREATE TABLE unrelated (id INTEGER)")
            .expect("schema");
        let err = SqliteStore::new(path).complexes().expect_err("must fail");
        assert!(matches!(
            err,
            StatsError::SourceUnavailable { table: "complexes", .. }
        ));
    }
}
