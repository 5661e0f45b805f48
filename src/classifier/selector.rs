//! Metric selectors and range selectors

use super::Classifier;
use crate::ast::Node;
use crate::definitions::ParamType;
use crate::position::DetailedPosition;
use crate::walker;

impl<'a> Classifier<'a> {
    /// The matched node is a selector or one of its parts
    pub(super) fn selector_position(
        &self,
        node: &'a Node,
        parent: Option<&'a Node>,
    ) -> Option<DetailedPosition> {
        let selector = if node.as_selector().is_some() {
            node
        } else {
            parent.filter(|p| p.as_selector().is_some())?
        };
        if self.is_function_name(selector) {
            return None;
        }
        self.resolve_selector(selector, &self.expected_types_for(selector))
    }

    /// A complete selector ending right before the cursor
    pub(super) fn touching_selector_position(&self) -> Option<DetailedPosition> {
        let selector = walker::nodes(self.query)
            .map(|(node, _)| node)
            .filter(|node| node.as_selector().is_some() && node.location.end() == self.cursor)
            .last()?;
        if self.is_function_name(selector) {
            return None;
        }
        self.resolve_selector(selector, &self.expected_types_for(selector))
    }

    /// A selector argument of `func_node` ending right before the cursor
    pub(super) fn argument_selector_position(&self, func_node: &'a Node) -> Option<DetailedPosition> {
        let func = func_node.as_function()?;
        let (index, arg) = func.args.iter().enumerate().find(|(_, arg)| {
            arg.as_selector().is_some() && arg.location.end() == self.cursor
        })?;
        if self.is_function_name(arg) {
            return None;
        }
        self.resolve_selector(arg, &self.registry.function_param_types(&func.name, index))
    }

    pub(super) fn resolve_selector(
        &self,
        node: &'a Node,
        expected: &[ParamType],
    ) -> Option<DetailedPosition> {
        let selector = node.as_selector()?;
        if let Some(range) = &selector.duration {
            let inside = self.cursor > range.open
                && range.close.map_or(true, |close| self.cursor <= close);
            return inside.then_some(DetailedPosition::InsideRangeSelector);
        }

        let can_suggest_range_selector = expected.contains(&ParamType::RangeVector);
        if let Some(map_node) = selector.label_map.as_deref() {
            let map = map_node.as_label_map()?;
            return match map.close {
                Some(close) if self.cursor == close + 1 => Some(DetailedPosition::AfterLabelSelector {
                    can_suggest_range_selector,
                    metric: selector.metric_name().map(str::to_string),
                }),
                Some(close) if self.cursor > close => None,
                _ if self.cursor > map_node.location.min => self.label_map_position(map_node),
                _ => None,
            };
        }

        let metric = selector.metric.as_deref()?;
        (self.cursor == metric.location.end()).then(|| DetailedPosition::AfterMetric {
            metric: selector.metric_name().unwrap_or_default().to_string(),
            can_suggest_range_selector,
        })
    }

    /// Expected types of `selector` when it is a direct function argument
    fn expected_types_for(&self, selector: &Node) -> Vec<ParamType> {
        let Some(func) = self.parent_of(selector).and_then(Node::as_function) else {
            return Vec::new();
        };
        func.args
            .iter()
            .position(|arg| std::ptr::eq(arg, selector))
            .map_or_else(Vec::new, |index| {
                self.registry.function_param_types(&func.name, index)
            })
    }

    /// A bare identifier naming a known function, still being typed
    pub(super) fn is_function_name(&self, node: &Node) -> bool {
        node.as_selector().is_some_and(|selector| {
            selector.label_map.is_none()
                && selector.duration.is_none()
                && selector
                    .metric_name()
                    .is_some_and(|name| self.registry.function_definition(name).is_some())
        })
    }
}
