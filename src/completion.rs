//! Completion types for PromQL intellisense

use serde::{Deserialize, Serialize};

/// A completion item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// Display label
    pub label: String,
    /// Kind of completion
    pub kind: CompletionKind,
    /// Optional detail text (signature, field type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Optional markdown documentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Text to insert (if different from label); `$0` marks the final cursor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    /// Sort order (lower = higher priority)
    #[serde(default)]
    pub sort_order: i32,
    /// Byte position where replacement should start
    #[serde(default)]
    pub edit_start: usize,
    /// Ask the editor to open completions again after inserting
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trigger_suggest: bool,
}

impl CompletionItem {
    #[must_use]
    pub fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            sort_order: 0,
            edit_start: 0,
            trigger_suggest: false,
        }
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    #[must_use]
    pub fn insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn sort_order(mut self, order: i32) -> Self {
        self.sort_order = order;
        self
    }

    #[must_use]
    pub fn trigger_suggest(mut self) -> Self {
        self.trigger_suggest = true;
        self
    }

    /// Text the editor should insert
    #[must_use]
    pub fn text_to_insert(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.label)
    }
}

/// Kind of completion item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CompletionKind {
    /// A keyword (`by`, `without`)
    Keyword,
    /// A function
    Function,
    /// An aggregation function
    AggregateFunction,
    /// A metric field
    Field,
    /// A label name
    Label,
    /// A binary operator or label matcher
    Operator,
    /// A placeholder value (number, string)
    Value,
    /// A range duration (`[5m]`)
    Duration,
    /// Punctuation (brackets, commas, pipe)
    Punctuation,
}

impl CompletionKind {
    /// Whether inserting the item replaces the word being typed
    ///
    /// Punctuation and operators are appended at the cursor instead.
    #[must_use]
    pub fn replaces_word(self) -> bool {
        !matches!(self, Self::Operator | Self::Punctuation)
    }
}

/// Result of completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Completion items
    pub items: Vec<CompletionItem>,
}

impl CompletionResult {
    /// Labels of all items, in order
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.label.as_str()).collect()
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.items.iter().any(|i| i.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder_and_serialization() {
        let item = CompletionItem::new("rate", CompletionKind::Function)
            .insert_text("rate($0)")
            .trigger_suggest();
        assert_eq!(item.text_to_insert(), "rate($0)");

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "Function");
        assert_eq!(json["trigger_suggest"], true);
        assert!(json.get("detail").is_none());

        let plain = serde_json::to_value(CompletionItem::new(",", CompletionKind::Punctuation)).unwrap();
        assert!(plain.get("trigger_suggest").is_none());
        assert!(!CompletionKind::Punctuation.replaces_word());
        assert!(CompletionKind::Field.replaces_word());
    }
}
