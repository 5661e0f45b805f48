//! Suggestion dispatcher
//!
//! Every [`PositionKind`] maps to one handler through an exhaustive match,
//! so adding a position without a handler does not compile. Handlers are
//! pure functions of the registry, the optional schema and the position.

use crate::completion::{CompletionItem, CompletionKind};
use crate::definitions::{FunctionDefinition, ParamType};
use crate::position::{DetailedPosition, PositionKind};
use crate::registry::Registry;
use crate::schema::Schema;

/// Durations offered in range selectors
const RANGE_DURATIONS: &[&str] = &["1m", "5m", "15m", "30m", "1h", "6h", "1d"];

mod sort {
    pub const PUNCTUATION: i32 = 0;
    pub const KEYWORD: i32 = 1;
    pub const FIELD: i32 = 2;
    pub const FUNCTION: i32 = 3;
    pub const OPERATOR: i32 = 4;
    pub const VALUE: i32 = 5;
}

/// What the handlers may consult
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    pub registry: &'a Registry,
    pub schema: Option<&'a Schema>,
}

impl<'a> SuggestionContext<'a> {
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            schema: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &'a Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

pub type Handler = fn(&SuggestionContext<'_>, &DetailedPosition) -> Vec<CompletionItem>;

/// The handler responsible for `kind`
#[must_use]
pub fn position_handler(kind: PositionKind) -> Handler {
    match kind {
        PositionKind::InsideQuery => inside_query,
        PositionKind::AfterOperator => after_operator,
        PositionKind::InsideGrouping | PositionKind::AfterLabelBrace => label_list,
        PositionKind::AfterLabelName => after_label_name,
        PositionKind::AfterLabelOperator => after_label_operator,
        PositionKind::InsideLabelValue => inside_label_value,
        PositionKind::AfterLabelSelector => after_label_selector,
        PositionKind::AfterMetric => after_metric,
        PositionKind::InsideRangeSelector => inside_range_selector,
        PositionKind::InsideFunctionArgs => inside_function_args,
        PositionKind::AfterCompleteArg => after_complete_arg,
    }
}

/// Suggestions for `position`
#[must_use]
pub fn suggest(ctx: &SuggestionContext<'_>, position: &DetailedPosition) -> Vec<CompletionItem> {
    let items = position_handler(position.kind())(ctx, position);
    log::trace!(
        "{} suggestions for {}",
        items.len(),
        position.kind().as_str()
    );
    items
}

fn inside_query(ctx: &SuggestionContext<'_>, position: &DetailedPosition) -> Vec<CompletionItem> {
    let DetailedPosition::InsideQuery {
        can_add_grouping,
        is_after_aggregation_name,
        expects_expression,
    } = *position
    else {
        return Vec::new();
    };

    if is_after_aggregation_name {
        let mut items = grouping_keywords();
        items.push(
            CompletionItem::new("(", CompletionKind::Punctuation)
                .insert_text("($0)")
                .sort_order(sort::PUNCTUATION)
                .trigger_suggest(),
        );
        return items;
    }
    if expects_expression {
        let mut items = metric_fields(ctx);
        items.extend(functions(ctx, |_| true));
        return items;
    }

    let mut items = operators(ctx);
    items.push(
        CompletionItem::new("|", CompletionKind::Punctuation)
            .detail("Pipe to the next command")
            .insert_text("| ")
            .sort_order(sort::PUNCTUATION)
            .trigger_suggest(),
    );
    if can_add_grouping {
        items.extend(grouping_keywords());
    }
    items
}

fn after_operator(ctx: &SuggestionContext<'_>, position: &DetailedPosition) -> Vec<CompletionItem> {
    let DetailedPosition::AfterOperator { signature_types } = position else {
        return Vec::new();
    };
    let mut items = Vec::new();
    if signature_types.iter().any(|t| t.accepts_field()) {
        items.extend(metric_fields(ctx));
    }
    items.extend(functions(ctx, |func| returns_any(func, signature_types)));
    if signature_types.contains(&ParamType::Scalar) {
        items.push(number_placeholder());
    }
    items
}

/// Label names in groupings and label maps
fn label_list(ctx: &SuggestionContext<'_>, position: &DetailedPosition) -> Vec<CompletionItem> {
    let is_complete_label = match position {
        DetailedPosition::InsideGrouping { is_complete_label }
        | DetailedPosition::AfterLabelBrace {
            is_complete_label, ..
        } => *is_complete_label,
        _ => return Vec::new(),
    };
    if is_complete_label {
        vec![comma()]
    } else {
        label_fields(ctx)
    }
}

fn after_label_name(ctx: &SuggestionContext<'_>, _: &DetailedPosition) -> Vec<CompletionItem> {
    ctx.registry
        .label_matchers()
        .iter()
        .map(|matcher| {
            let mut item = CompletionItem::new(&matcher.operator, CompletionKind::Operator)
                .detail(&matcher.name)
                .sort_order(sort::OPERATOR)
                .trigger_suggest();
            if !matcher.description.is_empty() {
                item = item.documentation(&matcher.description);
            }
            item
        })
        .collect()
}

fn after_label_operator(_: &SuggestionContext<'_>, _: &DetailedPosition) -> Vec<CompletionItem> {
    vec![string_placeholder()]
}

/// Label values come from the data source, not from here
fn inside_label_value(_: &SuggestionContext<'_>, _: &DetailedPosition) -> Vec<CompletionItem> {
    Vec::new()
}

fn after_label_selector(
    ctx: &SuggestionContext<'_>,
    position: &DetailedPosition,
) -> Vec<CompletionItem> {
    match position {
        DetailedPosition::AfterLabelSelector {
            can_suggest_range_selector: true,
            ..
        } => range_selectors(),
        _ => operators(ctx),
    }
}

fn after_metric(ctx: &SuggestionContext<'_>, position: &DetailedPosition) -> Vec<CompletionItem> {
    let DetailedPosition::AfterMetric {
        metric,
        can_suggest_range_selector,
    } = position
    else {
        return Vec::new();
    };
    let mut items = vec![CompletionItem::new("{}", CompletionKind::Punctuation)
        .detail("Label matchers")
        .insert_text("{$0}")
        .sort_order(sort::PUNCTUATION)
        .trigger_suggest()];
    if *can_suggest_range_selector {
        items.push(
            CompletionItem::new("[", CompletionKind::Punctuation)
                .detail("Range selector")
                .insert_text("[$0]")
                .sort_order(sort::PUNCTUATION)
                .trigger_suggest(),
        );
    }
    items.extend(operators(ctx));
    // the metric may be the start of a function name
    let prefix = metric.to_ascii_lowercase();
    items.extend(functions(ctx, |func| {
        func.name.len() > prefix.len() && func.name.to_ascii_lowercase().starts_with(&prefix)
    }));
    items
}

fn inside_range_selector(_: &SuggestionContext<'_>, _: &DetailedPosition) -> Vec<CompletionItem> {
    RANGE_DURATIONS
        .iter()
        .enumerate()
        .map(|(i, duration)| {
            CompletionItem::new(*duration, CompletionKind::Duration).sort_order(order(i))
        })
        .collect()
}

fn inside_function_args(
    ctx: &SuggestionContext<'_>,
    position: &DetailedPosition,
) -> Vec<CompletionItem> {
    let DetailedPosition::InsideFunctionArgs {
        signature_types,
        can_suggest_comma_in_function_args,
        ..
    } = position
    else {
        return Vec::new();
    };
    if *can_suggest_comma_in_function_args {
        return vec![comma()];
    }

    let all = |ty: ParamType| !signature_types.is_empty() && signature_types.iter().all(|t| *t == ty);
    if all(ParamType::Scalar) {
        return vec![number_placeholder()];
    }
    if all(ParamType::String) {
        return vec![string_placeholder()];
    }

    let mut items = Vec::new();
    if signature_types.is_empty() || signature_types.iter().any(|t| t.accepts_field()) {
        items.extend(metric_fields(ctx));
    }
    items.extend(functions(ctx, |func| {
        signature_types.is_empty() || returns_any(func, signature_types)
    }));
    items
}

fn after_complete_arg(
    ctx: &SuggestionContext<'_>,
    position: &DetailedPosition,
) -> Vec<CompletionItem> {
    let DetailedPosition::AfterCompleteArg {
        current_types,
        can_add_comma,
        ..
    } = position
    else {
        return Vec::new();
    };
    let mut items = if current_types.contains(&ParamType::RangeVector) {
        range_selectors()
    } else {
        operators(ctx)
    };
    if *can_add_comma {
        items.push(comma());
    }
    items
}

fn functions(
    ctx: &SuggestionContext<'_>,
    filter: impl Fn(&FunctionDefinition) -> bool,
) -> Vec<CompletionItem> {
    ctx.registry
        .functions()
        .iter()
        .filter(|func| !func.ignore_as_suggestion && filter(func))
        .map(function_item)
        .collect()
}

fn function_item(func: &FunctionDefinition) -> CompletionItem {
    let kind = if func.is_aggregation() {
        CompletionKind::AggregateFunction
    } else {
        CompletionKind::Function
    };
    let detail = func
        .signatures
        .iter()
        .map(|sig| sig.render(&func.name))
        .collect::<Vec<_>>()
        .join("\n");

    let mut documentation = func.description.clone();
    if func.preview {
        documentation.push_str("\n\n*Preview*");
    }
    for example in &func.examples {
        documentation.push_str(&format!("\n\n```promql\n{example}\n```"));
    }

    CompletionItem::new(&func.name, kind)
        .detail(detail)
        .documentation(documentation.trim_start().to_string())
        .insert_text(format!("{}($0)", func.name))
        .sort_order(sort::FUNCTION)
        .trigger_suggest()
}

fn returns_any(func: &FunctionDefinition, types: &[ParamType]) -> bool {
    func.return_types().iter().any(|ty| types.contains(ty))
}

fn operators(ctx: &SuggestionContext<'_>) -> Vec<CompletionItem> {
    ctx.registry
        .operators()
        .iter()
        .filter(|op| !op.ignore_as_suggestion && op.is_binary())
        .map(|op| {
            let mut item = CompletionItem::new(&op.operator, CompletionKind::Operator)
                .detail(&op.name)
                .insert_text(format!("{} ", op.operator))
                .sort_order(sort::OPERATOR)
                .trigger_suggest();
            if !op.description.is_empty() {
                item = item.documentation(&op.description);
            }
            item
        })
        .collect()
}

fn grouping_keywords() -> Vec<CompletionItem> {
    ["by", "without"]
        .into_iter()
        .map(|keyword| {
            CompletionItem::new(keyword, CompletionKind::Keyword)
                .insert_text(format!("{keyword} ($0)"))
                .sort_order(sort::KEYWORD)
                .trigger_suggest()
        })
        .collect()
}

fn metric_fields(ctx: &SuggestionContext<'_>) -> Vec<CompletionItem> {
    ctx.schema.map_or_else(Vec::new, |schema| {
        schema
            .metric_columns()
            .map(|column| {
                let mut item = CompletionItem::new(&column.name, CompletionKind::Field)
                    .detail(&column.data_type)
                    .sort_order(sort::FIELD);
                if let Some(description) = &column.description {
                    item = item.documentation(description);
                }
                item
            })
            .collect()
    })
}

fn label_fields(ctx: &SuggestionContext<'_>) -> Vec<CompletionItem> {
    ctx.schema.map_or_else(Vec::new, |schema| {
        schema
            .label_columns()
            .map(|column| {
                CompletionItem::new(&column.name, CompletionKind::Label)
                    .detail(&column.data_type)
                    .sort_order(sort::FIELD)
            })
            .collect()
    })
}

fn range_selectors() -> Vec<CompletionItem> {
    RANGE_DURATIONS
        .iter()
        .enumerate()
        .map(|(i, duration)| {
            CompletionItem::new(format!("[{duration}]"), CompletionKind::Duration)
                .sort_order(order(i))
        })
        .collect()
}

fn comma() -> CompletionItem {
    CompletionItem::new(",", CompletionKind::Punctuation)
        .insert_text(", ")
        .sort_order(sort::PUNCTUATION)
        .trigger_suggest()
}

fn number_placeholder() -> CompletionItem {
    CompletionItem::new("0", CompletionKind::Value)
        .detail("Number literal")
        .sort_order(sort::VALUE)
}

fn string_placeholder() -> CompletionItem {
    CompletionItem::new("\"\"", CompletionKind::Value)
        .detail("String literal")
        .insert_text("\"$0\"")
        .sort_order(sort::VALUE)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn order(index: usize) -> i32 {
    index as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::schema::Column;

    fn schema() -> Schema {
        Schema::new()
            .column(Column::counter("http_requests_total"))
            .column(Column::gauge("memory_bytes"))
            .column(Column::keyword("job"))
            .column(Column::keyword("instance"))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    fn sample(kind: PositionKind) -> DetailedPosition {
        match kind {
            PositionKind::InsideQuery => DetailedPosition::InsideQuery {
                can_add_grouping: false,
                is_after_aggregation_name: false,
                expects_expression: true,
            },
            PositionKind::AfterOperator => DetailedPosition::AfterOperator {
                signature_types: vec![ParamType::InstantVector],
            },
            PositionKind::InsideGrouping => DetailedPosition::InsideGrouping {
                is_complete_label: false,
            },
            PositionKind::AfterLabelBrace => DetailedPosition::label_brace(false, None),
            PositionKind::AfterLabelName => DetailedPosition::AfterLabelName {
                label: "job".into(),
                metric: None,
            },
            PositionKind::AfterLabelOperator => DetailedPosition::AfterLabelOperator {
                label: "job".into(),
                operator: "=".into(),
                metric: None,
            },
            PositionKind::InsideLabelValue => DetailedPosition::InsideLabelValue {
                label: "job".into(),
                metric: None,
            },
            PositionKind::AfterLabelSelector => DetailedPosition::AfterLabelSelector {
                can_suggest_range_selector: false,
                metric: None,
            },
            PositionKind::AfterMetric => DetailedPosition::AfterMetric {
                metric: "up".into(),
                can_suggest_range_selector: false,
            },
            PositionKind::InsideRangeSelector => DetailedPosition::InsideRangeSelector,
            PositionKind::InsideFunctionArgs => DetailedPosition::unconstrained_args(),
            PositionKind::AfterCompleteArg => DetailedPosition::AfterCompleteArg {
                function: "topk".into(),
                param_index: 1,
                signature_types: vec![ParamType::InstantVector],
                current_types: vec![ParamType::Scalar],
                can_add_comma: true,
            },
        }
    }

    #[test]
    fn test_every_position_has_a_handler() {
        let schema = schema();
        let ctx = SuggestionContext::new(Registry::builtin().unwrap()).with_schema(&schema);
        for kind in PositionKind::ALL {
            let position = sample(kind);
            assert_eq!(position.kind(), kind);
            let items = suggest(&ctx, &position);
            if kind == PositionKind::InsideLabelValue {
                assert!(items.is_empty());
            } else {
                assert!(!items.is_empty(), "no suggestions for {}", kind.as_str());
            }
        }
    }

    #[test]
    fn test_leading_expression_offers_fields_and_functions() {
        let schema = schema();
        let ctx = SuggestionContext::new(Registry::builtin().unwrap()).with_schema(&schema);
        let items = suggest(&ctx, &sample(PositionKind::InsideQuery));
        let names = labels(&items);
        assert!(names.contains(&"http_requests_total"));
        assert!(names.contains(&"rate"));
        assert!(!names.contains(&"job"));

        let rate = items.iter().find(|i| i.label == "rate").unwrap();
        assert_eq!(rate.text_to_insert(), "rate($0)");
        assert!(rate.trigger_suggest);
        assert!(rate.documentation.as_deref().unwrap().contains("rate(http_requests_total[5m])"));

        let sum = items.iter().find(|i| i.label == "sum").unwrap();
        assert_eq!(sum.kind, CompletionKind::AggregateFunction);
    }

    #[test]
    fn test_after_aggregation_name() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let items = suggest(
            &ctx,
            &DetailedPosition::InsideQuery {
                can_add_grouping: true,
                is_after_aggregation_name: true,
                expects_expression: false,
            },
        );
        assert_eq!(labels(&items), vec!["by", "without", "("]);
    }

    #[test]
    fn test_grouping_keywords_only_when_allowed() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let position = |can_add_grouping| DetailedPosition::InsideQuery {
            can_add_grouping,
            is_after_aggregation_name: false,
            expects_expression: false,
        };
        let with = suggest(&ctx, &position(true));
        let without = suggest(&ctx, &position(false));
        assert!(labels(&with).contains(&"by"));
        assert!(!labels(&without).contains(&"by"));
        assert!(labels(&without).contains(&"|"));
        assert!(labels(&without).contains(&"+"));
    }

    #[test]
    fn test_scalar_operand_gets_number_and_scalar_functions() {
        let schema = schema();
        let ctx = SuggestionContext::new(Registry::builtin().unwrap()).with_schema(&schema);
        let items = suggest(
            &ctx,
            &DetailedPosition::AfterOperator {
                signature_types: vec![ParamType::Scalar],
            },
        );
        let names = labels(&items);
        assert!(names.contains(&"0"));
        assert!(names.contains(&"time"));
        assert!(!names.contains(&"rate"));
        assert!(!names.contains(&"http_requests_total"));
    }

    #[test]
    fn test_function_argument_placeholders() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let args = |types: Vec<ParamType>, comma| DetailedPosition::InsideFunctionArgs {
            function: None,
            signature_types: types,
            can_suggest_comma_in_function_args: comma,
        };
        assert_eq!(labels(&suggest(&ctx, &args(vec![ParamType::Scalar], false))), vec!["0"]);
        assert_eq!(labels(&suggest(&ctx, &args(vec![ParamType::String], false))), vec!["\"\""]);
        assert_eq!(labels(&suggest(&ctx, &args(vec![ParamType::Scalar], true))), vec![","]);
    }

    #[test]
    fn test_labels_come_from_string_columns() {
        let schema = schema();
        let ctx = SuggestionContext::new(Registry::builtin().unwrap()).with_schema(&schema);
        let items = suggest(&ctx, &DetailedPosition::label_brace(false, Some("up".into())));
        assert_eq!(labels(&items), vec!["job", "instance"]);
        assert!(items.iter().all(|i| i.kind == CompletionKind::Label));

        let items = suggest(&ctx, &DetailedPosition::InsideGrouping { is_complete_label: true });
        assert_eq!(labels(&items), vec![","]);
    }

    #[test]
    fn test_label_matchers_and_values() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let items = suggest(&ctx, &sample(PositionKind::AfterLabelName));
        assert_eq!(labels(&items), vec!["=", "!=", "=~", "!~"]);

        let items = suggest(&ctx, &sample(PositionKind::AfterLabelOperator));
        assert_eq!(items[0].text_to_insert(), "\"$0\"");
    }

    #[test]
    fn test_range_suggestions() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let items = suggest(
            &ctx,
            &DetailedPosition::AfterMetric {
                metric: "up".into(),
                can_suggest_range_selector: true,
            },
        );
        let names = labels(&items);
        assert_eq!(&names[..2], &["{}", "["]);
        assert!(names.contains(&"+"));

        let items = suggest(
            &ctx,
            &DetailedPosition::AfterLabelSelector {
                can_suggest_range_selector: true,
                metric: None,
            },
        );
        assert!(labels(&items).contains(&"[5m]"));

        let items = suggest(&ctx, &DetailedPosition::InsideRangeSelector);
        assert!(labels(&items).contains(&"5m"));
    }

    #[test]
    fn test_partial_metric_offers_matching_functions() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let items = suggest(
            &ctx,
            &DetailedPosition::AfterMetric {
                metric: "ra".into(),
                can_suggest_range_selector: false,
            },
        );
        let names = labels(&items);
        assert!(names.contains(&"rate"));
        assert!(!names.contains(&"irate"));
        assert!(!names.contains(&"sum"));

        let items = suggest(&ctx, &sample(PositionKind::AfterMetric));
        assert!(items.iter().all(|i| i.kind != CompletionKind::Function));
    }

    #[test]
    fn test_after_complete_arg() {
        let ctx = SuggestionContext::new(Registry::builtin().unwrap());
        let items = suggest(&ctx, &sample(PositionKind::AfterCompleteArg));
        let names = labels(&items);
        assert!(names.contains(&"+"));
        assert_eq!(names.last(), Some(&","));

        let items = suggest(
            &ctx,
            &DetailedPosition::AfterCompleteArg {
                function: "rate".into(),
                param_index: 1,
                signature_types: Vec::new(),
                current_types: vec![ParamType::RangeVector],
                can_add_comma: false,
            },
        );
        let names = labels(&items);
        assert!(names.contains(&"[5m]"));
        assert!(!names.contains(&"+"));
    }
}
