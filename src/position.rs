//! Detailed cursor positions
//!
//! The classifier reduces a cursor to exactly one [`DetailedPosition`]. Each
//! variant carries only the fields its suggestion handler needs.

use crate::definitions::ParamType;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetailedPosition {
    /// Top level of the query, outside any more specific construct
    InsideQuery {
        /// `by (...)` / `without (...)` may follow here
        can_add_grouping: bool,
        /// The text ends with an aggregation name and whitespace (`sum `)
        is_after_aggregation_name: bool,
        /// A new expression may start here (empty query, after `(` or an operator)
        expects_expression: bool,
    },
    /// Right after a binary operator
    AfterOperator { signature_types: Vec<ParamType> },
    /// Inside the parentheses of `by (...)` / `without (...)`
    InsideGrouping { is_complete_label: bool },
    /// After `{`, after a `,` in a label map, or after a complete matcher
    AfterLabelBrace {
        is_complete_label: bool,
        metric: Option<String>,
    },
    /// After a label name, before its matcher operator
    AfterLabelName {
        label: String,
        metric: Option<String>,
    },
    /// After a label matcher operator, before its value
    AfterLabelOperator {
        label: String,
        operator: String,
        metric: Option<String>,
    },
    /// Inside an unterminated label value string
    InsideLabelValue {
        label: String,
        metric: Option<String>,
    },
    /// Right after the closing `}` of a label map
    AfterLabelSelector {
        can_suggest_range_selector: bool,
        metric: Option<String>,
    },
    /// Right after a bare metric name
    AfterMetric {
        metric: String,
        can_suggest_range_selector: bool,
    },
    /// Inside `[` of a range selector
    InsideRangeSelector,
    /// At an argument slot of a function call
    InsideFunctionArgs {
        function: Option<String>,
        signature_types: Vec<ParamType>,
        can_suggest_comma_in_function_args: bool,
    },
    /// After a complete argument with whitespace, before `,` or `)`
    AfterCompleteArg {
        function: String,
        /// Index of the next parameter
        param_index: usize,
        /// Expected types of the next parameter
        signature_types: Vec<ParamType>,
        /// Expected types of the argument just completed
        current_types: Vec<ParamType>,
        can_add_comma: bool,
    },
}

/// Fieldless discriminant of [`DetailedPosition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKind {
    InsideQuery,
    AfterOperator,
    InsideGrouping,
    AfterLabelBrace,
    AfterLabelName,
    AfterLabelOperator,
    InsideLabelValue,
    AfterLabelSelector,
    AfterMetric,
    InsideRangeSelector,
    InsideFunctionArgs,
    AfterCompleteArg,
}

impl PositionKind {
    pub const ALL: [PositionKind; 12] = [
        Self::InsideQuery,
        Self::AfterOperator,
        Self::InsideGrouping,
        Self::AfterLabelBrace,
        Self::AfterLabelName,
        Self::AfterLabelOperator,
        Self::InsideLabelValue,
        Self::AfterLabelSelector,
        Self::AfterMetric,
        Self::InsideRangeSelector,
        Self::InsideFunctionArgs,
        Self::AfterCompleteArg,
    ];

    /// The serialized `type` tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsideQuery => "inside_query",
            Self::AfterOperator => "after_operator",
            Self::InsideGrouping => "inside_grouping",
            Self::AfterLabelBrace => "after_label_brace",
            Self::AfterLabelName => "after_label_name",
            Self::AfterLabelOperator => "after_label_operator",
            Self::InsideLabelValue => "inside_label_value",
            Self::AfterLabelSelector => "after_label_selector",
            Self::AfterMetric => "after_metric",
            Self::InsideRangeSelector => "inside_range_selector",
            Self::InsideFunctionArgs => "inside_function_args",
            Self::AfterCompleteArg => "after_complete_arg",
        }
    }
}

impl DetailedPosition {
    #[must_use]
    pub fn kind(&self) -> PositionKind {
        match self {
            Self::InsideQuery { .. } => PositionKind::InsideQuery,
            Self::AfterOperator { .. } => PositionKind::AfterOperator,
            Self::InsideGrouping { .. } => PositionKind::InsideGrouping,
            Self::AfterLabelBrace { .. } => PositionKind::AfterLabelBrace,
            Self::AfterLabelName { .. } => PositionKind::AfterLabelName,
            Self::AfterLabelOperator { .. } => PositionKind::AfterLabelOperator,
            Self::InsideLabelValue { .. } => PositionKind::InsideLabelValue,
            Self::AfterLabelSelector { .. } => PositionKind::AfterLabelSelector,
            Self::AfterMetric { .. } => PositionKind::AfterMetric,
            Self::InsideRangeSelector => PositionKind::InsideRangeSelector,
            Self::InsideFunctionArgs { .. } => PositionKind::InsideFunctionArgs,
            Self::AfterCompleteArg { .. } => PositionKind::AfterCompleteArg,
        }
    }

    /// Shorthand for a label-brace position
    #[must_use]
    pub fn label_brace(is_complete_label: bool, metric: Option<String>) -> Self {
        Self::AfterLabelBrace {
            is_complete_label,
            metric,
        }
    }

    /// Function-argument slot with no type constraint
    #[must_use]
    pub fn unconstrained_args() -> Self {
        Self::InsideFunctionArgs {
            function: None,
            signature_types: Vec::new(),
            can_suggest_comma_in_function_args: false,
        }
    }
}
