use super::*;
use crate::definitions::{DefinitionTables, OperatorDefinition, Param, ParamType, Signature};
use crate::parser::parse;
use crate::position::PositionKind;

use ParamType::{InstantVector, RangeVector, Scalar};

fn position_at(text: &str, cursor: usize) -> DetailedPosition {
    let registry = Registry::builtin().unwrap();
    let query = parse(text).query;
    get_query_position(registry, &query, cursor, text)
}

fn position(text: &str) -> DetailedPosition {
    position_at(text, text.len())
}

fn args(function: &str, types: Vec<ParamType>, comma: bool) -> DetailedPosition {
    DetailedPosition::InsideFunctionArgs {
        function: Some(function.to_string()),
        signature_types: types,
        can_suggest_comma_in_function_args: comma,
    }
}

#[test]
fn test_empty_query_expects_expression() {
    assert_eq!(
        position(""),
        DetailedPosition::InsideQuery {
            can_add_grouping: false,
            is_after_aggregation_name: false,
            expects_expression: true,
        }
    );
}

#[test]
fn test_grouping_after_aggregation() {
    assert_eq!(
        position("sum(rate(http_requests[5m])) by ("),
        DetailedPosition::InsideGrouping {
            is_complete_label: false
        }
    );
    assert_eq!(
        position("sum(rate(http_requests[5m])) by (job "),
        DetailedPosition::InsideGrouping {
            is_complete_label: true
        }
    );
    assert_eq!(
        position("sum(rate(http_requests[5m])) by (job, "),
        DetailedPosition::InsideGrouping {
            is_complete_label: false
        }
    );
    assert_eq!(
        position("sum by ("),
        DetailedPosition::InsideGrouping {
            is_complete_label: false
        }
    );
}

#[test]
fn test_operator_types_come_from_registry() {
    let registry = Registry::new(DefinitionTables {
        operators: vec![OperatorDefinition {
            name: "addition".into(),
            operator: "+".into(),
            signatures: vec![Signature::new(
                vec![
                    Param::new("left", InstantVector),
                    Param::new("right", Scalar),
                ],
                InstantVector,
            )],
            description: String::new(),
            examples: Vec::new(),
            ignore_as_suggestion: false,
        }],
        ..DefinitionTables::default()
    })
    .unwrap();

    let text = "a + ";
    let query = parse(text).query;
    assert_eq!(
        get_query_position(&registry, &query, text.len(), text),
        DetailedPosition::AfterOperator {
            signature_types: vec![Scalar]
        }
    );
}

#[test]
fn test_builtin_operators() {
    assert_eq!(
        position("a + b * "),
        DetailedPosition::AfterOperator {
            signature_types: vec![InstantVector, Scalar]
        }
    );
    assert_eq!(
        position("up and "),
        DetailedPosition::AfterOperator {
            signature_types: vec![InstantVector]
        }
    );
    // modifier words after the operator leave only the tree to go by
    assert_eq!(position("up > bool ").kind(), PositionKind::AfterOperator);
}

#[test]
fn test_label_map_positions() {
    let metric = Some("http_requests".to_string());
    assert_eq!(
        position(r#"http_requests{job="api", "#),
        DetailedPosition::label_brace(false, metric.clone())
    );
    assert_eq!(
        position("http_requests{"),
        DetailedPosition::label_brace(false, metric.clone())
    );
    assert_eq!(
        position("http_requests{job"),
        DetailedPosition::AfterLabelName {
            label: "job".into(),
            metric: metric.clone()
        }
    );
    assert_eq!(
        position("http_requests{job=~"),
        DetailedPosition::AfterLabelOperator {
            label: "job".into(),
            operator: "=~".into(),
            metric: metric.clone()
        }
    );
    assert_eq!(
        position(r#"http_requests{job="ap"#),
        DetailedPosition::InsideLabelValue {
            label: "job".into(),
            metric: metric.clone()
        }
    );
    assert_eq!(
        position(r#"http_requests{job="api" "#),
        DetailedPosition::label_brace(true, metric)
    );
}

#[test]
fn test_label_name_inside_closed_map() {
    let text = r#"up{job="api"}"#;
    assert_eq!(
        position_at(text, 4),
        DetailedPosition::AfterLabelName {
            label: "job".into(),
            metric: Some("up".into())
        }
    );
}

#[test]
fn test_selector_inside_range_function() {
    assert_eq!(
        position("rate(metric{}"),
        DetailedPosition::AfterLabelSelector {
            can_suggest_range_selector: true,
            metric: Some("metric".into())
        }
    );
    assert_eq!(
        position("rate(up"),
        DetailedPosition::AfterMetric {
            metric: "up".into(),
            can_suggest_range_selector: true
        }
    );
    assert_eq!(
        position("rate(up "),
        DetailedPosition::AfterMetric {
            metric: "up".into(),
            can_suggest_range_selector: true
        }
    );
    assert_eq!(position("rate(up["), DetailedPosition::InsideRangeSelector);
    assert_eq!(position("rate(up[5m"), DetailedPosition::InsideRangeSelector);
}

#[test]
fn test_top_level_selectors() {
    assert_eq!(
        position("up"),
        DetailedPosition::AfterMetric {
            metric: "up".into(),
            can_suggest_range_selector: false
        }
    );
    assert_eq!(
        position(r#"up{job="api"}"#),
        DetailedPosition::AfterLabelSelector {
            can_suggest_range_selector: false,
            metric: Some("up".into())
        }
    );
}

#[test]
fn test_function_argument_slots() {
    assert_eq!(position("rate("), args("rate", vec![RangeVector], false));
    assert_eq!(position("topk(5, "), args("topk", vec![InstantVector], false));
    assert_eq!(position("sum by (job) ("), args("sum", vec![InstantVector], false));
    assert_eq!(
        position("histogram_quantile(0.9"),
        args("histogram_quantile", vec![Scalar], true)
    );
}

#[test]
fn test_after_complete_argument() {
    assert_eq!(
        position("histogram_quantile(0.9 "),
        DetailedPosition::AfterCompleteArg {
            function: "histogram_quantile".into(),
            param_index: 1,
            signature_types: vec![InstantVector],
            current_types: vec![Scalar],
            can_add_comma: true,
        }
    );
    assert_eq!(
        position(r#"sum(http_requests{job="a"} "#),
        DetailedPosition::AfterCompleteArg {
            function: "sum".into(),
            param_index: 1,
            signature_types: Vec::new(),
            current_types: vec![InstantVector],
            can_add_comma: false,
        }
    );
}

#[test]
fn test_extra_argument_is_suppressed() {
    let suppressed = DetailedPosition::InsideQuery {
        can_add_grouping: false,
        is_after_aggregation_name: false,
        expects_expression: false,
    };
    assert_eq!(position("abs(x, "), suppressed);
    assert_eq!(position("clamp(up, 1, 2, "), suppressed);
}

#[test]
fn test_argument_with_range_wants_no_second_range() {
    let after_range = |function: &str| DetailedPosition::AfterCompleteArg {
        function: function.into(),
        param_index: 1,
        signature_types: Vec::new(),
        current_types: Vec::new(),
        can_add_comma: false,
    };
    assert_eq!(position("rate(up[5m] "), after_range("rate"));
    assert_eq!(position(r#"rate(up{a="b"}[5m] "#), after_range("rate"));
    assert_eq!(position("rate((up[5m]) "), after_range("rate"));
}

#[test]
fn test_label_map_closed_inside_range_argument() {
    let expected = DetailedPosition::AfterLabelSelector {
        can_suggest_range_selector: true,
        metric: None,
    };
    assert_eq!(position("rate(-up{}"), expected);
    assert_eq!(position("rate(x + up{}"), expected);
    assert_eq!(position(r#"rate({a="b"}"#), expected);
}

#[test]
fn test_aggregation_context() {
    assert_eq!(
        position("sum "),
        DetailedPosition::InsideQuery {
            can_add_grouping: true,
            is_after_aggregation_name: true,
            expects_expression: false,
        }
    );
    assert_eq!(
        position("sum(up) "),
        DetailedPosition::InsideQuery {
            can_add_grouping: true,
            is_after_aggregation_name: false,
            expects_expression: false,
        }
    );
    assert_eq!(
        position("rate(up[5m]) "),
        DetailedPosition::InsideQuery {
            can_add_grouping: false,
            is_after_aggregation_name: false,
            expects_expression: false,
        }
    );
}

#[test]
fn test_function_name_being_typed_is_not_a_metric() {
    assert_eq!(
        position("sum"),
        DetailedPosition::InsideQuery {
            can_add_grouping: false,
            is_after_aggregation_name: false,
            expects_expression: true,
        }
    );
    assert_eq!(position("-").kind(), PositionKind::InsideQuery);
}

#[test]
fn test_cursor_is_clamped() {
    assert_eq!(position_at("rate(", 100), position("rate("));
}

#[test]
fn test_classification_is_idempotent() {
    let registry = Registry::builtin().unwrap();
    for text in [
        "",
        "rate(",
        "a + ",
        r#"http_requests{job="api", "#,
        "sum(rate(http_requests[5m])) by (",
        "histogram_quantile(0.9, sum by (le) (rate(x[5m]",
    ] {
        let query = parse(text).query;
        let first = get_query_position(registry, &query, text.len(), text);
        let second = get_query_position(registry, &query, text.len(), text);
        assert_eq!(first, second, "{text:?}");
    }
}
