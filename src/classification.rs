//! Classification types and services for PromQL syntax highlighting
//!
//! Classification works on the token stream rather than the tree, so it
//! highlights half-typed and invalid queries just as well as complete ones.

use crate::lexer::{self, TokenKind};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};

/// Classification kind for syntax highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ClassificationKind {
    /// Plain text (no special highlighting)
    PlainText,
    /// Punctuation characters: (), {}, [], `,` and `:`
    Punctuation,
    /// A metric name
    Metric,
    /// A label name in a matcher or grouping list
    Label,
    /// A function
    Function,
    /// An aggregation
    AggregateFunction,
    /// A keyword (`by`, `without`, `bool`, `offset`, `on`, ...)
    Keyword,
    /// A binary operator or label matcher
    Operator,
    /// A numeric literal
    Number,
    /// A string literal
    StringLiteral,
    /// A duration literal (`5m`)
    Duration,
}

/// A classified span for syntax highlighting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSpan {
    /// Start offset (0-based, bytes)
    pub start: usize,
    /// Length of the span in bytes
    pub length: usize,
    /// Classification kind
    pub kind: ClassificationKind,
}

/// Result of syntax classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Classified spans
    pub spans: Vec<ClassifiedSpan>,
}

impl ClassificationResult {
    /// Kind of the span starting at `start`, if any
    #[must_use]
    pub fn kind_at(&self, start: usize) -> Option<ClassificationKind> {
        self.spans
            .iter()
            .find(|span| span.start == start)
            .map(|span| span.kind)
    }
}

const KEYWORDS: &[&str] = &[
    "by",
    "without",
    "bool",
    "offset",
    "on",
    "ignoring",
    "group_left",
    "group_right",
];

const WORD_OPERATORS: &[&str] = &["and", "or", "unless", "atan2"];

/// Keywords whose parenthesised list holds label names
const LABEL_LIST_KEYWORDS: &[&str] = &[
    "by",
    "without",
    "on",
    "ignoring",
    "group_left",
    "group_right",
];

/// Classify every token of `text`
#[must_use]
pub fn classify(registry: &Registry, text: &str) -> ClassificationResult {
    let tokens = lexer::tokenize(text);
    let mut spans = Vec::with_capacity(tokens.len());
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;
    // paren depth at which a label list was opened
    let mut label_list: Option<usize> = None;

    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).map(|t| &t.kind);
        let kind = match &token.kind {
            TokenKind::Ident(_) if brace_depth > 0 || label_list.is_some() => {
                ClassificationKind::Label
            }
            TokenKind::Ident(word) => classify_word(registry, word, next),
            TokenKind::Number(_) => ClassificationKind::Number,
            TokenKind::Duration(_) => ClassificationKind::Duration,
            TokenKind::Str { .. } => ClassificationKind::StringLiteral,
            TokenKind::Op(_) => ClassificationKind::Operator,
            TokenKind::LBrace => {
                brace_depth += 1;
                ClassificationKind::Punctuation
            }
            TokenKind::RBrace => {
                brace_depth = brace_depth.saturating_sub(1);
                ClassificationKind::Punctuation
            }
            TokenKind::LParen => {
                let opens_list = i > 0
                    && matches!(&tokens[i - 1].kind, TokenKind::Ident(word)
                        if LABEL_LIST_KEYWORDS.contains(&word.to_ascii_lowercase().as_str()));
                paren_depth += 1;
                if opens_list && label_list.is_none() {
                    label_list = Some(paren_depth);
                }
                ClassificationKind::Punctuation
            }
            TokenKind::RParen => {
                if label_list == Some(paren_depth) {
                    label_list = None;
                }
                paren_depth = paren_depth.saturating_sub(1);
                ClassificationKind::Punctuation
            }
            TokenKind::LBracket
            | TokenKind::RBracket
            | TokenKind::Comma
            | TokenKind::Colon => ClassificationKind::Punctuation,
            TokenKind::Unknown(_) | TokenKind::Eof => ClassificationKind::PlainText,
        };
        spans.push(ClassifiedSpan {
            start: token.start,
            length: token.end - token.start,
            kind,
        });
    }

    ClassificationResult { spans }
}

fn classify_word(registry: &Registry, word: &str, next: Option<&TokenKind>) -> ClassificationKind {
    let lower = word.to_ascii_lowercase();
    if WORD_OPERATORS.contains(&lower.as_str()) {
        return ClassificationKind::Operator;
    }
    if KEYWORDS.contains(&lower.as_str()) {
        return ClassificationKind::Keyword;
    }
    let grouping_follows = matches!(next, Some(TokenKind::Ident(w))
        if w.eq_ignore_ascii_case("by") || w.eq_ignore_ascii_case("without"));
    let call_follows = matches!(next, Some(TokenKind::LParen));
    if registry.is_aggregation(word) && (call_follows || grouping_follows) {
        return ClassificationKind::AggregateFunction;
    }
    if call_follows {
        return ClassificationKind::Function;
    }
    ClassificationKind::Metric
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<ClassificationKind> {
        classify(Registry::builtin().unwrap(), text)
            .spans
            .into_iter()
            .map(|span| span.kind)
            .collect()
    }

    #[test]
    fn test_selector_classification() {
        use ClassificationKind::{Duration, Label, Metric, Operator, Punctuation, StringLiteral};
        assert_eq!(
            kinds(r#"http_requests{job="api"}[5m]"#),
            vec![
                Metric,
                Punctuation,
                Label,
                Operator,
                StringLiteral,
                Punctuation,
                Punctuation,
                Duration,
                Punctuation
            ]
        );
    }

    #[test]
    fn test_aggregation_with_grouping() {
        let result = classify(
            Registry::builtin().unwrap(),
            "sum by (job) (rate(x[5m])) > bool 0",
        );
        assert_eq!(result.kind_at(0), Some(ClassificationKind::AggregateFunction));
        assert_eq!(result.kind_at(4), Some(ClassificationKind::Keyword));
        assert_eq!(result.kind_at(8), Some(ClassificationKind::Label));
        assert_eq!(result.kind_at(14), Some(ClassificationKind::Function));
        assert_eq!(result.kind_at(19), Some(ClassificationKind::Metric));
        assert_eq!(result.kind_at(27), Some(ClassificationKind::Operator));
        assert_eq!(result.kind_at(29), Some(ClassificationKind::Keyword));
        assert_eq!(result.kind_at(34), Some(ClassificationKind::Number));
    }

    #[test]
    fn test_word_operators_and_unknown_input() {
        use ClassificationKind::{Metric, Operator, PlainText};
        assert_eq!(kinds("a and b"), vec![Metric, Operator, Metric]);
        assert_eq!(kinds("a @ b"), vec![Metric, PlainText, Metric]);
    }

    #[test]
    fn test_span_serialization() {
        let result = classify(Registry::builtin().unwrap(), "up");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["spans"][0]["kind"], "Metric");
        assert_eq!(json["spans"][0]["length"], 2);
    }
}
