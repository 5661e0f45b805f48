//! Label maps, label matchers and grouping label lists

use super::{text, Classifier};
use crate::ast::{Label, Literal, Node, NodeKind};
use crate::position::DetailedPosition;

impl<'a> Classifier<'a> {
    /// Unclosed `{` in the text with no label nodes at the cursor
    pub(super) fn open_brace_position(
        &self,
        open: &text::OpenConstructs,
    ) -> Option<DetailedPosition> {
        let brace = open.brace?;
        if self.in_label_tree() {
            return None;
        }
        let metric = text::metric_before_brace(self.text, brace);

        if let Some(quote) = open.string.filter(|&quote| quote > brace) {
            let label = text::trailing_matcher(&self.before[brace + 1..quote])
                .map(|(label, _)| label.to_string())
                .unwrap_or_default();
            return Some(DetailedPosition::InsideLabelValue { label, metric });
        }

        let content = &self.before[brace + 1..];
        let trimmed = content.trim_end();
        if trimmed.is_empty() || trimmed.ends_with(',') {
            return Some(DetailedPosition::label_brace(false, metric));
        }
        if let Some((label, operator)) = text::trailing_matcher(content) {
            return Some(DetailedPosition::AfterLabelOperator {
                label: label.to_string(),
                operator: operator.to_string(),
                metric,
            });
        }
        if trimmed.ends_with(['"', '\'', '`']) {
            return Some(DetailedPosition::label_brace(true, metric));
        }
        text::trailing_identifier(trimmed).map(|label| DetailedPosition::AfterLabelName {
            label: label.to_string(),
            metric,
        })
    }

    fn in_label_tree(&self) -> bool {
        let is_label = |node: &Node| matches!(node.kind, NodeKind::Label(_) | NodeKind::LabelMap(_));
        self.ctx.node().is_some_and(is_label) || self.ctx.parent().is_some_and(is_label)
    }

    pub(super) fn label_position(
        &self,
        node: &'a Node,
        parent: Option<&'a Node>,
    ) -> Option<DetailedPosition> {
        match &node.kind {
            NodeKind::LabelMap(_) => self.label_map_position(node),
            NodeKind::Label(label) => {
                Some(self.resolve_label(label, self.metric_for_label(node)))
            }
            NodeKind::Identifier(ident) => {
                let parent = parent.filter(|p| p.as_label().is_some())?;
                Some(DetailedPosition::AfterLabelName {
                    label: ident.name.clone(),
                    metric: self.metric_for_label(parent),
                })
            }
            NodeKind::Literal(Literal::String { .. }) => {
                let parent = parent?;
                let label = parent.as_label()?;
                let metric = self.metric_for_label(parent);
                if self.cursor > node.location.min {
                    Some(DetailedPosition::InsideLabelValue {
                        label: label.name().to_string(),
                        metric,
                    })
                } else {
                    Some(DetailedPosition::AfterLabelOperator {
                        label: label.name().to_string(),
                        operator: label.operator.clone().unwrap_or_default(),
                        metric,
                    })
                }
            }
            _ => None,
        }
    }

    /// Cursor between the braces of a label map
    pub(super) fn label_map_position(&self, map_node: &'a Node) -> Option<DetailedPosition> {
        let map = map_node.as_label_map()?;
        let open = map_node.location.min;
        if self.cursor <= open || map.close.is_some_and(|close| self.cursor > close) {
            return None;
        }
        let metric = self.metric_for_map(map_node);
        let trimmed = self.text[open + 1..self.cursor].trim_end();
        if trimmed.is_empty() || trimmed.ends_with(',') {
            return Some(DetailedPosition::label_brace(false, metric));
        }
        let label = map
            .args
            .iter()
            .rev()
            .find(|label| label.location.min < self.cursor)?
            .as_label()?;
        Some(self.resolve_label(label, metric))
    }

    fn resolve_label(&self, label: &Label, metric: Option<String>) -> DetailedPosition {
        let name = label.name().to_string();
        let before_operator = label
            .operator_location
            .map_or(true, |location| self.cursor <= location.min);
        let Some(operator) = label.operator.clone().filter(|_| !before_operator) else {
            return DetailedPosition::AfterLabelName { label: name, metric };
        };
        match label.value.as_deref() {
            Some(value) if self.cursor > value.location.min => match &value.kind {
                NodeKind::Literal(Literal::String {
                    terminated: false, ..
                }) => DetailedPosition::InsideLabelValue { label: name, metric },
                _ => DetailedPosition::label_brace(true, metric),
            },
            _ => DetailedPosition::AfterLabelOperator {
                label: name,
                operator,
                metric,
            },
        }
    }

    fn metric_for_label(&self, label_node: &Node) -> Option<String> {
        self.parent_of(label_node)
            .and_then(|map_node| self.metric_for_map(map_node))
    }

    fn metric_for_map(&self, map_node: &Node) -> Option<String> {
        self.parent_of(map_node)?
            .as_selector()?
            .metric_name()
            .map(str::to_string)
    }

    /// Cursor inside the parentheses of `by (...)` / `without (...)`
    pub(super) fn grouping_position(
        &self,
        node: &'a Node,
        parent: Option<&'a Node>,
    ) -> Option<DetailedPosition> {
        let grouping = node
            .as_grouping()
            .or_else(|| parent.and_then(Node::as_grouping))?;
        let open = grouping.open_paren?;
        if self.cursor <= open || grouping.close_paren.is_some_and(|close| self.cursor > close) {
            return None;
        }
        Some(DetailedPosition::InsideGrouping {
            is_complete_label: text::ends_with_complete_label(&self.text[open + 1..self.cursor]),
        })
    }
}
