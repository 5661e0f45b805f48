//! Cursor position classifier
//!
//! [`get_query_position`] turns a parsed query, its text and a cursor offset
//! into one [`DetailedPosition`]. Checks run in a fixed order and the first
//! one that applies decides the result:
//!
//! 1. a binary operator ends the text before the cursor
//! 2. the cursor is in an unclosed `{` the tree has no label nodes for
//! 3. an incomplete binary expression is waiting for its right operand
//! 4. no node contains the cursor
//! 5. label maps, labels and label values
//! 6. `by (...)` / `without (...)` groupings
//! 7. selectors: metric names, closed label maps, range selectors
//! 8. a selector argument of the innermost function touches the cursor
//! 9. top-level query context
//! 10. function argument slots
//! 11. a range vector is expected right after a `}`
//! 12. fallbacks
//!
//! Positions are a pure function of the inputs; classifying the same query
//! twice gives the same answer.

mod args;
mod labels;
mod selector;
pub mod text;

use crate::ast::{Node, Query};
use crate::cursor::{find_cursor_context, CursorContext};
use crate::position::DetailedPosition;
use crate::registry::Registry;
use crate::walker;

/// Classify `cursor` within `text`, which `query` was parsed from
///
/// A cursor past the end of the text is clamped to its length.
#[must_use]
pub fn get_query_position(
    registry: &Registry,
    query: &Query,
    cursor: usize,
    text: &str,
) -> DetailedPosition {
    let cursor = text::clamp_cursor(text, cursor);
    let classifier = Classifier {
        registry,
        query,
        text,
        before: &text[..cursor],
        cursor,
        ctx: find_cursor_context(query, cursor),
    };
    let position = classifier.classify();
    log::trace!("position at {cursor}: {position:?}");
    position
}

struct Classifier<'a> {
    registry: &'a Registry,
    query: &'a Query,
    text: &'a str,
    before: &'a str,
    cursor: usize,
    ctx: CursorContext<'a>,
}

/// Outcome of the function-argument check
enum ArgsResolution {
    Position(DetailedPosition),
    /// Past the last declared parameter; nothing new may start
    Suppressed,
    Continue,
}

impl<'a> Classifier<'a> {
    fn classify(&self) -> DetailedPosition {
        let open = text::scan_open(self.before);

        if let Some(position) = self.trailing_operator_position(&open) {
            return position;
        }
        if let Some(position) = self.open_brace_position(&open) {
            return position;
        }
        if let Some(position) = self.incomplete_binary_position() {
            return position;
        }
        let Some(matched) = self.ctx.matched else {
            return self.unmatched_position();
        };
        if let Some(position) = self.label_position(matched.node, matched.parent) {
            return position;
        }
        if let Some(position) = self.grouping_position(matched.node, matched.parent) {
            return position;
        }
        if let Some(position) = self.selector_position(matched.node, matched.parent) {
            return position;
        }
        if let Some(func) = self.ctx.innermost_func {
            if let Some(position) = self.argument_selector_position(func) {
                return position;
            }
            match self.function_args_position(func) {
                ArgsResolution::Position(position) => return position,
                ArgsResolution::Suppressed => return Self::suppressed_position(),
                ArgsResolution::Continue => {}
            }
        }
        if let Some(position) = self.range_fallback_position(&self.current_arg_types()) {
            return position;
        }
        self.fallback_position()
    }

    fn trailing_operator_position(&self, open: &text::OpenConstructs) -> Option<DetailedPosition> {
        if open.any() {
            return None;
        }
        let op = self.registry.trailing_operator(self.before)?;
        let signature_types = self.registry.binary_operator_param_types(&op.operator, 1);
        if signature_types.is_empty() {
            return None;
        }
        Some(DetailedPosition::AfterOperator { signature_types })
    }

    fn incomplete_binary_position(&self) -> Option<DetailedPosition> {
        let binary = self.ctx.outermost_incomplete_binary?.as_binary()?;
        if self.cursor <= binary.left.location.max {
            return None;
        }
        let signature_types = self
            .registry
            .binary_operator_param_types(&binary.operator, 1);
        if signature_types.is_empty() {
            return None;
        }
        Some(DetailedPosition::AfterOperator { signature_types })
    }

    fn unmatched_position(&self) -> DetailedPosition {
        if let Some(position) = self.touching_selector_position() {
            return position;
        }
        if text::ends_with_open_paren_or_equals(self.before) {
            return DetailedPosition::unconstrained_args();
        }
        self.top_level_position()
    }

    fn fallback_position(&self) -> DetailedPosition {
        if text::ends_with_open_paren_or_equals(self.before) {
            DetailedPosition::unconstrained_args()
        } else {
            self.top_level_position()
        }
    }

    /// Past the last parameter nothing may start, so no expression is expected
    fn suppressed_position() -> DetailedPosition {
        DetailedPosition::InsideQuery {
            can_add_grouping: false,
            is_after_aggregation_name: false,
            expects_expression: false,
        }
    }

    fn top_level_position(&self) -> DetailedPosition {
        let is_after_aggregation_name = text::trailing_aggregation_word(self.before)
            .is_some_and(|word| self.registry.is_aggregation(word));
        DetailedPosition::InsideQuery {
            can_add_grouping: is_after_aggregation_name || self.after_ungrouped_aggregation(),
            is_after_aggregation_name,
            expects_expression: self.expects_expression(),
        }
    }

    /// `sum(x) ` with nothing but whitespace after the closing paren
    fn after_ungrouped_aggregation(&self) -> bool {
        walker::nodes(self.query).any(|(node, _)| {
            let Some(func) = node.as_function() else {
                return false;
            };
            let Some(close) = func.close_paren else {
                return false;
            };
            func.grouping.is_none()
                && self.registry.is_aggregation(&func.name)
                && close < self.cursor
                && self.text[close + 1..self.cursor].trim().is_empty()
        })
    }

    fn expects_expression(&self) -> bool {
        let word = text::word_start(self.text, self.cursor);
        let rest = self.text[..word].trim_end();
        if rest.is_empty() || rest.ends_with(['(', ',', '+', '-', '*', '/', '%', '^', '=', '<', '>'])
        {
            return true;
        }
        self.registry.trailing_operator(&format!("{rest} ")).is_some()
    }

    /// Parent of `target`, found by identity
    fn parent_of(&self, target: &Node) -> Option<&'a Node> {
        walker::nodes(self.query)
            .find(|(node, _)| std::ptr::eq(*node, target))
            .and_then(|(_, parent)| parent)
    }
}

#[cfg(test)]
mod tests;
