//! Field schema for context-aware suggestions
//!
//! A schema lists the fields of the time-series source being queried.
//! Numeric fields are offered as metrics; string-typed fields (keywords)
//! are offered as labels in label maps and groupings.

use serde::{Deserialize, Serialize};

/// Fields available to the query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Index or data stream name (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Fields in the schema
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Schema {
    /// Create a new empty schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema for a named index
    #[must_use]
    pub fn with_index(index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            ..Self::default()
        }
    }

    /// Builder method to add a column
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Builder method to add a column with name and type
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    /// Get a column by name
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns usable as label names
    pub fn label_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_string())
    }

    /// Columns usable as metrics
    pub fn metric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }
}

/// Column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Field type (keyword, long, double, counter_long, gauge_double, ...)
    pub data_type: String,

    /// Optional column description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

const STRING_TYPES: &[&str] = &["keyword", "text", "string", "ip", "version"];

const NUMERIC_TYPES: &[&str] = &[
    "long",
    "integer",
    "short",
    "byte",
    "double",
    "float",
    "half_float",
    "scaled_float",
    "unsigned_long",
];

impl Column {
    /// Create a new column
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: None,
        }
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Create a keyword column
    #[must_use]
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, "keyword")
    }

    /// Create a counter column
    #[must_use]
    pub fn counter(name: impl Into<String>) -> Self {
        Self::new(name, "counter_double")
    }

    /// Create a gauge column
    #[must_use]
    pub fn gauge(name: impl Into<String>) -> Self {
        Self::new(name, "gauge_double")
    }

    /// Whether the column holds strings
    #[must_use]
    pub fn is_string(&self) -> bool {
        STRING_TYPES.contains(&self.data_type.to_ascii_lowercase().as_str())
    }

    /// Whether the column holds numbers, including counter and gauge variants
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        let ty = self.data_type.to_ascii_lowercase();
        let base = ty
            .strip_prefix("counter_")
            .or_else(|| ty.strip_prefix("gauge_"))
            .unwrap_or(&ty);
        NUMERIC_TYPES.contains(&base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder() {
        let schema = Schema::with_index("metrics-*")
            .column(Column::counter("http_requests_total"))
            .column(Column::gauge("memory_bytes"))
            .column(Column::keyword("job"))
            .with_column("instance", "keyword")
            .with_column("@timestamp", "date");

        assert_eq!(schema.index, Some("metrics-*".to_string()));
        assert_eq!(schema.columns.len(), 5);
        let labels: Vec<_> = schema.label_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(labels, vec!["job", "instance"]);
        let metrics: Vec<_> = schema.metric_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(metrics, vec!["http_requests_total", "memory_bytes"]);
    }

    #[test]
    fn test_schema_serialization() {
        let schema = Schema::new()
            .with_column("up", "long")
            .with_column("job", "keyword");

        let json = serde_json::to_string(&schema).unwrap();
        let parsed: Schema = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.columns.len(), 2);
        assert!(parsed.get_column("up").is_some_and(Column::is_numeric));
        assert!(json.find("index").is_none());
    }
}
