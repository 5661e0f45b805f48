//! Function argument slots

use super::{text, ArgsResolution, Classifier};
use crate::ast::{Literal, Node, NodeKind};
use crate::definitions::{FunctionDefinition, ParamType};
use crate::position::DetailedPosition;

impl<'a> Classifier<'a> {
    pub(super) fn function_args_position(&self, func_node: &'a Node) -> ArgsResolution {
        let Some(func) = func_node.as_function() else {
            return ArgsResolution::Continue;
        };
        let Some(open) = func.open_paren else {
            return ArgsResolution::Continue;
        };
        if self.cursor <= open || func.close_paren.is_some_and(|close| self.cursor > close) {
            return ArgsResolution::Continue;
        }

        let scan = text::scan_args(&self.text[open + 1..self.cursor]);
        let index = scan.commas;
        let slot_start = open + 1 + scan.slot_start;
        let max_params = self
            .registry
            .function_definition(&func.name)
            .map(FunctionDefinition::max_params);
        let has_next = max_params.is_some_and(|max| index + 1 < max);
        let signature_types = self.registry.function_param_types(&func.name, index);

        if self.text[slot_start..self.cursor].trim().is_empty() {
            let arg_follows = func.args.iter().any(|arg| arg.location.min >= self.cursor);
            if max_params.is_some_and(|max| index >= max) && !arg_follows {
                return ArgsResolution::Suppressed;
            }
            return ArgsResolution::Position(DetailedPosition::InsideFunctionArgs {
                function: Some(func.name.clone()),
                signature_types,
                can_suggest_comma_in_function_args: false,
            });
        }

        let Some(arg) = func
            .args
            .iter()
            .rev()
            .find(|arg| arg.location.min >= slot_start && arg.location.min < self.cursor)
        else {
            return ArgsResolution::Continue;
        };
        if arg.incomplete {
            return ArgsResolution::Continue;
        }
        if self.cursor <= arg.location.max {
            return ArgsResolution::Position(DetailedPosition::InsideFunctionArgs {
                function: Some(func.name.clone()),
                signature_types,
                can_suggest_comma_in_function_args: false,
            });
        }

        // a number or a function name may still be growing
        let still_typing = self.cursor == arg.location.end()
            && (matches!(arg.kind, NodeKind::Literal(Literal::Number(_)))
                || self.is_function_name(arg));
        if still_typing {
            return ArgsResolution::Position(DetailedPosition::InsideFunctionArgs {
                function: Some(func.name.clone()),
                signature_types,
                can_suggest_comma_in_function_args: has_next,
            });
        }

        if let Some(position) = continuation_position(arg, &signature_types) {
            return ArgsResolution::Position(position);
        }
        let current_types = if has_range(arg) {
            signature_types
                .into_iter()
                .filter(|ty| *ty != ParamType::RangeVector)
                .collect()
        } else {
            signature_types
        };
        if let Some(position) = self.range_fallback_position(&current_types) {
            return ArgsResolution::Position(position);
        }
        ArgsResolution::Position(DetailedPosition::AfterCompleteArg {
            function: func.name.clone(),
            param_index: index + 1,
            signature_types: self.registry.function_param_types(&func.name, index + 1),
            current_types,
            can_add_comma: has_next,
        })
    }

    /// A label map closed in a slot that still wants a range
    pub(super) fn range_fallback_position(&self, expected: &[ParamType]) -> Option<DetailedPosition> {
        (expected.contains(&ParamType::RangeVector) && self.before.trim_end().ends_with('}')).then(
            || DetailedPosition::AfterLabelSelector {
                can_suggest_range_selector: true,
                metric: None,
            },
        )
    }

    /// Expected types of the argument slot holding the cursor
    pub(super) fn current_arg_types(&self) -> Vec<ParamType> {
        let Some(func) = self.ctx.innermost_func.and_then(Node::as_function) else {
            return Vec::new();
        };
        let Some(open) = func.open_paren.filter(|&open| open < self.cursor) else {
            return Vec::new();
        };
        if func.close_paren.is_some_and(|close| close < self.cursor) {
            return Vec::new();
        }
        let index = text::scan_args(&self.text[open + 1..self.cursor]).commas;
        self.registry.function_param_types(&func.name, index)
    }
}

/// Whether `arg` already carries its `[duration]`
fn has_range(arg: &Node) -> bool {
    match &arg.kind {
        NodeKind::Selector(selector) => selector.duration.is_some(),
        NodeKind::Parens(parens) => has_range(&parens.child),
        _ => false,
    }
}

/// A selector argument that still lacks the range its slot expects
fn continuation_position(arg: &Node, expected: &[ParamType]) -> Option<DetailedPosition> {
    let selector = arg.as_selector()?;
    if selector.duration.is_some() || !expected.contains(&ParamType::RangeVector) {
        return None;
    }
    let metric = selector.metric_name().map(str::to_string);
    match selector.label_map.as_deref().and_then(Node::as_label_map) {
        Some(map) if map.close.is_some() => Some(DetailedPosition::AfterLabelSelector {
            can_suggest_range_selector: true,
            metric,
        }),
        Some(_) => None,
        None => Some(DetailedPosition::AfterMetric {
            metric: metric?,
            can_suggest_range_selector: true,
        }),
    }
}
