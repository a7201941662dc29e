use crate::core::Row;

/// How the natural key of a table is found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentifierColumn {
    /// First column whose name contains both "project" and "id".
    #[default]
    Detect,
    /// A fixed, already sanitized column name.
    Named(String),
}

/// Target table plus its identifier rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub identifier: IdentifierColumn,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: IdentifierColumn::Detect,
        }
    }

    pub fn with_identifier(mut self, column: impl Into<String>) -> Self {
        self.identifier = IdentifierColumn::Named(column.into());
        self
    }

    /// The identifier column and its value for `row`, if the row has one.
    pub fn identifier_of<'r>(&self, row: &'r Row) -> Option<(&'r str, &'r str)> {
        match &self.identifier {
            IdentifierColumn::Named(column) => row
                .get_key_value(column.as_str())
                .map(|(k, v)| (k.as_str(), v.as_str())),
            IdentifierColumn::Detect => row
                .iter()
                .find(|(key, _)| looks_like_identifier(key))
                .map(|(k, v)| (k.as_str(), v.as_str())),
        }
    }

    /// The identifier column among `columns`, used when reading.
    pub fn identifier_in<'c, I>(&self, columns: I) -> Option<&'c str>
    where
        I: IntoIterator<Item = &'c str>,
    {
        let mut columns = columns.into_iter();
        match &self.identifier {
            IdentifierColumn::Named(column) => columns.find(|c| *c == column.as_str()),
            IdentifierColumn::Detect => columns.find(|c| looks_like_identifier(c)),
        }
    }
}

impl From<&str> for TableSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&TableSpec> for TableSpec {
    fn from(spec: &TableSpec) -> Self {
        spec.clone()
    }
}

fn looks_like_identifier(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    lower.contains("project") && lower.contains("id")
}
