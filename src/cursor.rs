//! Cursor-context locator
//!
//! A single fold over [`walker::nodes`] finds the narrowest node around the
//! cursor, the innermost function call containing it, and the outermost
//! binary expression still waiting for its right operand.

use crate::ast::{Node, NodeKind, Query};
use crate::walker;

/// The narrowest node at the cursor and its direct parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorMatch<'a> {
    pub node: &'a Node,
    pub parent: Option<&'a Node>,
}

/// Everything the classifier needs to know about the tree around the cursor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorContext<'a> {
    pub matched: Option<CursorMatch<'a>>,
    pub innermost_func: Option<&'a Node>,
    pub outermost_incomplete_binary: Option<&'a Node>,
}

/// A node contains the cursor when the cursor lies within its range, or when
/// it is incomplete and the cursor is past its end.
#[must_use]
pub fn node_contains(node: &Node, cursor: usize) -> bool {
    node.location.contains(cursor) || (node.incomplete && cursor > node.location.max)
}

/// Locate the cursor context for `cursor` in `query`
#[must_use]
pub fn find_cursor_context(query: &Query, cursor: usize) -> CursorContext<'_> {
    walker::nodes(query)
        .filter(|(node, _)| node_contains(node, cursor))
        .fold(CursorContext::default(), |ctx, (node, parent)| {
            ctx.consider(node, parent)
        })
}

impl<'a> CursorContext<'a> {
    fn consider(self, node: &'a Node, parent: Option<&'a Node>) -> Self {
        // last smallest wins: `<=` lets a later node of equal span replace an earlier one
        let matched = match self.matched {
            Some(best) if node.span() > best.node.span() => Some(best),
            _ => Some(CursorMatch { node, parent }),
        };

        let innermost_func = match (self.innermost_func, &node.kind) {
            (Some(best), NodeKind::Function(_)) if node.span() > best.span() => Some(best),
            (_, NodeKind::Function(_)) => Some(node),
            (best, _) => best,
        };

        let waiting_binary = matches!(&node.kind, NodeKind::Binary(binary)
            if node.incomplete && binary.right.is_unknown());
        let outermost_incomplete_binary = match self.outermost_incomplete_binary {
            Some(best) if waiting_binary && node.span() > best.span() => Some(node),
            None if waiting_binary => Some(node),
            best => best,
        };

        Self {
            matched,
            innermost_func,
            outermost_incomplete_binary,
        }
    }

    /// The matched node, if any
    #[must_use]
    pub fn node(&self) -> Option<&'a Node> {
        self.matched.map(|m| m.node)
    }

    /// The matched node's parent, if any
    #[must_use]
    pub fn parent(&self) -> Option<&'a Node> {
        self.matched.and_then(|m| m.parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn context_kinds(text: &str, cursor: usize) -> (Option<&'static str>, Option<&'static str>) {
        let query = parse(text).query;
        let ctx = find_cursor_context(&query, cursor);
        (ctx.node().map(Node::kind_name), ctx.parent().map(Node::kind_name))
    }

    #[test]
    fn test_empty_query_gives_empty_context() {
        let query = parse("").query;
        assert_eq!(find_cursor_context(&query, 0), CursorContext::default());
    }

    #[test]
    fn test_incomplete_function_contains_trailing_cursor() {
        let query = parse("rate(").query;
        let ctx = find_cursor_context(&query, 5);
        assert_eq!(ctx.node().map(Node::kind_name), Some("function"));
        assert!(ctx.parent().is_none());
        assert_eq!(
            ctx.innermost_func.and_then(Node::as_function).map(|f| f.name.as_str()),
            Some("rate")
        );
    }

    #[test]
    fn test_complete_node_does_not_contain_cursor_past_end() {
        let query = parse("up").query;
        assert!(find_cursor_context(&query, 2).matched.is_none());
        assert!(find_cursor_context(&query, 1).matched.is_some());
    }

    #[test]
    fn test_equal_span_child_beats_container() {
        // a bare selector has the same span as its metric identifier
        assert_eq!(context_kinds("up", 0), (Some("identifier"), Some("selector")));
    }

    #[test]
    fn test_innermost_function_is_narrowest() {
        let query = parse("sum(rate(up[5m]").query;
        let ctx = find_cursor_context(&query, 15);
        let func = ctx.innermost_func.and_then(Node::as_function).unwrap();
        assert_eq!(func.name, "rate");
    }

    #[test]
    fn test_outermost_incomplete_binary_across_chain() {
        let query = parse("a + b * ").query;
        let ctx = find_cursor_context(&query, 8);
        let binary = ctx.outermost_incomplete_binary.and_then(Node::as_binary).unwrap();
        // only the innermost binary has an unknown right operand
        assert_eq!(binary.operator, "*");

        let query = parse("(a + ").query;
        let ctx = find_cursor_context(&query, 5);
        assert_eq!(
            ctx.outermost_incomplete_binary.and_then(Node::as_binary).map(|b| b.operator.as_str()),
            Some("+")
        );
    }

    #[test]
    fn test_narrowest_match_invariant() {
        let text = r#"sum by (job) (rate(http_requests_total{code=~"5..", job="api"}[5m])) / 2"#;
        let query = parse(text).query;
        for cursor in 0..=text.len() + 1 {
            let ctx = find_cursor_context(&query, cursor);
            let Some(matched) = ctx.matched else { continue };
            let narrower = walker::nodes(&query)
                .filter(|(node, _)| node_contains(node, cursor))
                .any(|(node, _)| node.span() < matched.node.span());
            assert!(!narrower, "cursor {cursor} matched a non-narrowest node");
        }
    }
}
