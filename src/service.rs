//! High-level API for PromQL editor support
//!
//! This module ties the parser, the position classifier and the suggestion
//! dispatcher together behind one handle.

use crate::classification::{self, ClassificationResult};
use crate::classifier::{self, text};
use crate::completion::CompletionResult;
use crate::error::Error;
use crate::parser;
use crate::position::DetailedPosition;
use crate::registry::Registry;
use crate::schema::Schema;
use crate::suggestions::{self, SuggestionContext};
use crate::types::ValidationResult;

/// PromQL language service
///
/// This is the main entry point for editor integrations. It holds a
/// reference to the definitions registry and offers completions, cursor
/// positions, syntax validation and highlighting on top of it.
///
/// # Example
///
/// ```no_run
/// use promql_language_tools::{Column, PromqlLanguageService, Schema};
///
/// fn main() -> Result<(), promql_language_tools::Error> {
///     let service = PromqlLanguageService::new()?;
///
///     // Syntax-only validation
///     let result = service.validate_syntax("rate(http_requests_total[5m])");
///     assert!(result.is_valid());
///
///     // Completions with schema
///     let schema = Schema::new()
///         .column(Column::counter("http_requests_total"))
///         .column(Column::keyword("job"));
///     let query = "sum(rate(http_requests_total[5m])) by (";
///     let completions = service.get_completions(query, query.len(), Some(&schema));
///     assert!(completions.contains("job"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PromqlLanguageService<'r> {
    registry: &'r Registry,
}

impl PromqlLanguageService<'static> {
    /// Create a new service over the default registry
    ///
    /// The registry comes from the file named by
    /// `PROMQL_LANGUAGE_TOOLS_DEFINITIONS` when set, and from the built-in
    /// PromQL tables otherwise. It is loaded once per process.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The definitions file cannot be read
    /// - The file is not valid definitions JSON
    /// - The tables contain duplicate or unusable definitions
    pub fn new() -> Result<Self, Error> {
        let registry = Registry::default_registry()?;
        Ok(Self { registry })
    }
}

impl<'r> PromqlLanguageService<'r> {
    /// Create a service over a caller-provided registry
    #[must_use]
    pub fn with_registry(registry: &'r Registry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Classify the cursor position within `query`
    ///
    /// # Arguments
    ///
    /// * `query` - The PromQL query text
    /// * `cursor_position` - Cursor position (0-based byte offset, clamped to the text)
    #[must_use]
    pub fn get_query_position(&self, query: &str, cursor_position: usize) -> DetailedPosition {
        let parsed = parser::parse(query);
        classifier::get_query_position(self.registry, &parsed.query, cursor_position, query)
    }

    /// Get completion suggestions at a cursor position
    ///
    /// Returns completion items (functions, operators, labels, fields,
    /// durations, ...) that fit the position of the cursor.
    ///
    /// # Arguments
    ///
    /// * `query` - The PromQL query text
    /// * `cursor_position` - Cursor position (0-based byte offset)
    /// * `schema` - Optional schema for field and label suggestions
    ///
    /// # Returns
    ///
    /// A `CompletionResult` whose items carry `edit_start`: the start of
    /// the word being typed for items that replace it, the cursor for
    /// punctuation and operators.
    #[must_use]
    pub fn get_completions(
        &self,
        query: &str,
        cursor_position: usize,
        schema: Option<&Schema>,
    ) -> CompletionResult {
        let cursor = text::clamp_cursor(query, cursor_position);
        let position = self.get_query_position(query, cursor);
        let ctx = SuggestionContext {
            registry: self.registry,
            schema,
        };

        let edit_start = text::word_start(query, cursor);
        let mut items = suggestions::suggest(&ctx, &position);
        for item in &mut items {
            item.edit_start = if item.kind.replaces_word() {
                edit_start
            } else {
                cursor
            };
        }

        log::trace!(
            "Completions at {cursor} in {query:?}: {} items ({})",
            items.len(),
            position.kind().as_str()
        );
        CompletionResult { items }
    }

    /// Validate a PromQL query for syntax errors
    ///
    /// # Returns
    ///
    /// A `ValidationResult` containing the parser's diagnostics.
    #[must_use]
    pub fn validate_syntax(&self, query: &str) -> ValidationResult {
        ValidationResult::from_diagnostics(parser::parse(query).diagnostics)
    }

    /// Get syntax classifications for a PromQL query (for syntax highlighting)
    #[must_use]
    pub fn get_classifications(&self, query: &str) -> ClassificationResult {
        classification::classify(self.registry, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ClassificationKind;
    use crate::position::PositionKind;
    use crate::schema::Column;

    fn service() -> PromqlLanguageService<'static> {
        let _ = env_logger::builder().is_test(true).try_init();
        PromqlLanguageService::with_registry(Registry::builtin().expect("builtin registry"))
    }

    fn schema() -> Schema {
        Schema::with_index("metrics-*")
            .column(Column::counter("http_requests_total"))
            .column(Column::gauge("memory_bytes"))
            .column(Column::keyword("job"))
            .column(Column::keyword("instance"))
    }

    #[test]
    fn test_validate_syntax_valid() {
        let result = service().validate_syntax(r#"sum by (job) (rate(http_requests_total{code=~"5.."}[5m]))"#);
        assert!(result.is_valid());
        assert!(result.diagnostics().is_empty());
    }

    #[test]
    fn test_validate_syntax_invalid() {
        let result = service().validate_syntax("rate(x[5m]");
        assert!(!result.is_valid());
        assert!(result.has_errors());
        let error = result.errors().next().expect("error");
        assert_eq!(error.line, 1);
    }

    #[test]
    fn test_get_classifications() {
        let result = service().get_classifications("rate(up[5m])");
        assert!(!result.spans.is_empty(), "Expected classification spans");
        assert_eq!(result.spans[0].kind, ClassificationKind::Function);
    }

    #[test]
    fn test_get_completions_in_grouping() {
        let schema = schema();
        let query = "sum(rate(http_requests_total[5m])) by (";
        let result = service().get_completions(query, query.len(), Some(&schema));
        assert_eq!(result.labels(), vec!["job", "instance"]);
        assert!(result.items.iter().all(|i| i.edit_start == query.len()));
    }

    #[test]
    fn test_get_completions_replaces_current_word() {
        let schema = schema();
        let query = "sum";
        let result = service().get_completions(query, query.len(), Some(&schema));
        assert!(result.contains("sum"));
        assert!(result.contains("http_requests_total"));
        assert!(result.items.iter().all(|i| i.edit_start == 0));

        // appended after the metric, not replacing it
        let query = "rate(http_requests_total";
        let result = service().get_completions(query, query.len(), Some(&schema));
        let bracket = result.items.iter().find(|i| i.label == "[").expect("range");
        assert_eq!(bracket.edit_start, query.len());
    }

    #[test]
    fn test_get_completions_after_operator() {
        let schema = schema();
        let query = "http_requests_total / ";
        let result = service().get_completions(query, query.len(), Some(&schema));
        assert!(result.contains("memory_bytes"));
        assert!(result.contains("0"));
        assert!(!result.contains("job"));
    }

    #[test]
    fn test_get_completions_after_range_argument() {
        let schema = schema();
        for query in ["rate(up[5m] ", r#"rate(up{a="b"}[5m] "#] {
            let result = service().get_completions(query, query.len(), Some(&schema));
            assert!(result.contains("+"), "{query:?}");
            assert!(!result.contains("[5m]"), "{query:?}");
        }
    }

    #[test]
    fn test_get_completions_past_last_parameter() {
        let schema = schema();
        for query in ["abs(x, ", "clamp(up, 1, 2, "] {
            let result = service().get_completions(query, query.len(), Some(&schema));
            assert!(!result.contains("rate"), "{query:?}");
            assert!(!result.contains("http_requests_total"), "{query:?}");
        }
    }

    #[test]
    fn test_get_completions_for_partial_function_name() {
        let query = "sum(ra";
        let result = service().get_completions(query, query.len(), None);
        let rate = result.items.iter().find(|i| i.label == "rate").expect("rate");
        assert_eq!(rate.edit_start, 4);
    }

    #[test]
    fn test_get_completions_in_label_value_is_empty() {
        let query = r#"up{job="a"#;
        let result = service().get_completions(query, query.len(), None);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_query_position_through_service() {
        let service = service();
        assert_eq!(
            service.get_query_position("rate(up[", 8).kind(),
            PositionKind::InsideRangeSelector
        );
        // past the end is clamped
        assert_eq!(
            service.get_query_position("rate(", 99).kind(),
            PositionKind::InsideFunctionArgs
        );
    }
}
