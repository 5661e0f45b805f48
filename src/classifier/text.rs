//! Raw-text fast paths
//!
//! These helpers look at the text before the cursor directly. They cover
//! input the parser has not turned into nodes yet, and they stay in step
//! with the AST-based checks by sharing the registry's operator pattern.

use once_cell::sync::Lazy;
use regex::Regex;

/// `sum ` at the end of the text: an identifier, whitespace, nothing else
static AGGREGATION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s(,])([A-Za-z_][A-Za-z0-9_]*)\s+$").expect("valid regex"));

static TRAILING_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)$").expect("valid regex"));

/// A complete label name followed by whitespace
static COMPLETE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*\s+$").expect("valid regex"));

/// `label op` at the end of a label map's content
static TRAILING_MATCHER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*(=~|!~|!=|=)\s*$").expect("valid regex")
});

/// Metric name directly before a `{`
static METRIC_BEFORE_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_:][A-Za-z0-9_:]*)\s*$").expect("valid regex"));

/// Clamp `cursor` into `text` and onto a char boundary
#[must_use]
pub fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

pub fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == ':'
}

/// Start of the identifier the cursor is touching (or `cursor` itself)
#[must_use]
pub fn word_start(text: &str, cursor: usize) -> usize {
    let before = &text[..cursor];
    before
        .char_indices()
        .rev()
        .take_while(|&(_, ch)| is_ident_char(ch))
        .last()
        .map_or(cursor, |(i, _)| i)
}

/// Unclosed constructs in the text before the cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenConstructs {
    /// Offset of the innermost unclosed `{`
    pub brace: Option<usize>,
    /// Offset of the innermost unclosed `[`
    pub bracket: Option<usize>,
    /// Offset of the opening quote of an unterminated string
    pub string: Option<usize>,
}

impl OpenConstructs {
    #[must_use]
    pub fn any(&self) -> bool {
        self.brace.is_some() || self.bracket.is_some() || self.string.is_some()
    }
}

/// Find `{`, `[` and quotes that are still open at the end of `before`
#[must_use]
pub fn scan_open(before: &str) -> OpenConstructs {
    let mut braces = Vec::new();
    let mut brackets = Vec::new();
    let mut string: Option<(char, usize)> = None;
    let mut escaped = false;

    for (i, ch) in before.char_indices() {
        if let Some((quote, _)) = string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => string = Some((ch, i)),
            '{' => braces.push(i),
            '}' => {
                braces.pop();
            }
            '[' => brackets.push(i),
            ']' => {
                brackets.pop();
            }
            _ => {}
        }
    }

    OpenConstructs {
        brace: braces.last().copied(),
        bracket: brackets.last().copied(),
        string: string.map(|(_, i)| i),
    }
}

/// Position of the cursor within a function's argument list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgScan {
    /// Top-level commas before the cursor, i.e. the argument index
    pub commas: usize,
    /// Offset (relative to the scanned slice) where the current slot begins
    pub slot_start: usize,
}

/// Count top-level commas in `args`, the text between `(` and the cursor
#[must_use]
pub fn scan_args(args: &str) -> ArgScan {
    let mut depth = 0usize;
    let mut commas = 0;
    let mut slot_start = 0;
    let mut string: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in args.char_indices() {
        if let Some(quote) = string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => string = Some(ch),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                commas += 1;
                slot_start = i + 1;
            }
            _ => {}
        }
    }

    ArgScan { commas, slot_start }
}

/// The identifier in `sum ` style trailing text
#[must_use]
pub fn trailing_aggregation_word(before: &str) -> Option<&str> {
    AGGREGATION_NAME
        .captures(before)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[must_use]
pub fn trailing_identifier(text: &str) -> Option<&str> {
    TRAILING_IDENTIFIER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Whether `content` ends with a finished label name and whitespace
#[must_use]
pub fn ends_with_complete_label(content: &str) -> bool {
    COMPLETE_LABEL.is_match(content)
}

/// `(label, operator)` when `content` ends with a label matcher operator
#[must_use]
pub fn trailing_matcher(content: &str) -> Option<(&str, &str)> {
    let captures = TRAILING_MATCHER.captures(content)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// Metric name written immediately before the `{` at `brace`
#[must_use]
pub fn metric_before_brace(text: &str, brace: usize) -> Option<String> {
    METRIC_BEFORE_BRACE
        .captures(&text[..brace])
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether the last non-whitespace character is `(` or `=`
#[must_use]
pub fn ends_with_open_paren_or_equals(before: &str) -> bool {
    before.trim_end().ends_with(['(', '='])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_cursor_handles_multibyte() {
        let text = "up{job=\"é\"}";
        // 'é' occupies bytes 8..10
        assert_eq!(clamp_cursor(text, 9), 8);
        assert_eq!(clamp_cursor(text, 100), text.len());
    }

    #[test]
    fn test_word_start() {
        assert_eq!(word_start("rate(http_req", 13), 5);
        assert_eq!(word_start("rate(", 5), 5);
        assert_eq!(word_start("abc", 3), 0);
    }

    #[test]
    fn test_scan_open_ignores_closed_and_quoted() {
        let open = scan_open(r#"up{job="a{"}[5m] + x{"#);
        assert_eq!(open.brace, Some(20));
        assert_eq!(open.bracket, None);
        assert_eq!(open.string, None);

        let open = scan_open(r#"up{job="ap"#);
        assert_eq!(open.brace, Some(2));
        assert_eq!(open.string, Some(7));
        assert!(open.any());
    }

    #[test]
    fn test_scan_args_counts_top_level_commas() {
        let scan = scan_args(r#"0.9, sum by (le, job) (rate(x{a="1,2"}[5m])), "#);
        assert_eq!(scan.commas, 2);
        assert_eq!(scan.slot_start, 45);
        assert_eq!(scan_args("").commas, 0);
    }

    #[test]
    fn test_aggregation_word_requires_trailing_space() {
        assert_eq!(trailing_aggregation_word("sum "), Some("sum"));
        assert_eq!(trailing_aggregation_word("foo / sum  "), Some("sum"));
        assert_eq!(trailing_aggregation_word("sum"), None);
        assert_eq!(trailing_aggregation_word("sum(x) "), None);
    }

    #[test]
    fn test_label_helpers() {
        assert!(ends_with_complete_label("job "));
        assert!(!ends_with_complete_label("job"));
        assert!(!ends_with_complete_label("job, "));
        assert_eq!(trailing_matcher("job=~"), Some(("job", "=~")));
        assert_eq!(trailing_matcher(r#"a="b", job != "#), Some(("job", "!=")));
        assert_eq!(trailing_matcher("job"), None);
        assert_eq!(metric_before_brace("rate(http_requests{", 18), Some("http_requests".into()));
        assert_eq!(metric_before_brace("{", 0), None);
    }
}
