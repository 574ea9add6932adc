use rusqlite::types::{FromSql, FromSqlResult, ValueRef};

/// Separator for both the `sources` and `references` columns.
pub const FIELD_DELIMITER: char = ';';

/// A packed multi-value column such as `"KEGG;SIGNOR"`.
///
/// Tokens are trimmed and empty tokens dropped, so a NULL, empty or
/// delimiter-only column decodes to an empty list and the row simply
/// contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelimitedList(Vec<String>);

impl DelimitedList {
    pub fn parse(raw: &str, delimiter: char) -> Self {
        Self(
            raw.split(delimiter)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for DelimitedList {
    fn from(raw: &str) -> Self {
        Self::parse(raw, FIELD_DELIMITER)
    }
}

impl FromSql for DelimitedList {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::default()),
            other => other.as_str().map(Self::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::DelimitedList;

    #[test]
    fn splits_and_trims() {
        let list = DelimitedList::from(" KEGG ; SIGNOR;;");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["KEGG", "SIGNOR"]);
    }

    #[test]
    fn blank_input_is_empty() {
        assert!(DelimitedList::from("").is_empty());
        assert!(DelimitedList::from(" ; ;").is_empty());
    }

    #[test]
    fn decodes_sql_null_as_empty() {
        let conn = Connection::open_in_memory().expect("open");
        let list: DelimitedList = conn
            .query_row("SELECT NULL", [], |row| row.get(0))
            .expect("query");
        assert!(list.is_empty());

        let list: DelimitedList = conn
            .query_row("SELECT 'a;b'", [], |row| row.get(0))
            .expect("query");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
