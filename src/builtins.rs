//! Built-in PromQL function, operator and label-matcher tables

use crate::definitions::{
    DefinitionTables, FunctionDefinition, FunctionKind, LabelMatcherDefinition,
    OperatorDefinition, Param, ParamType, Signature,
};

use crate::definitions::ParamType::{
    InstantVector as Instant, RangeVector as Range, Scalar, String as Str,
};

fn param(name: &str, ty: ParamType) -> Param {
    Param::new(name, ty)
}

fn function(name: &str, params: Vec<Param>, ret: ParamType, description: &str) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_string(),
        kind: FunctionKind::Function,
        signatures: vec![Signature::new(params, ret)],
        description: description.to_string(),
        examples: Vec::new(),
        preview: false,
        ignore_as_suggestion: false,
    }
}

fn aggregation(name: &str, params: Vec<Param>, description: &str) -> FunctionDefinition {
    FunctionDefinition {
        kind: FunctionKind::Aggregation,
        ..function(name, params, Instant, description)
    }
}

fn example(mut def: FunctionDefinition, example: &str) -> FunctionDefinition {
    def.examples.push(example.to_string());
    def
}

/// `fn(v range_vector) instant_vector` helpers for the `*_over_time` family
fn over_time(name: &str, description: &str) -> FunctionDefinition {
    example(
        function(name, vec![param("v", Range)], Instant, description),
        &format!("{name}(http_requests_total[5m])"),
    )
}

/// Date helpers take an optional instant vector, defaulting to `vector(time())`
fn date_part(name: &str, description: &str) -> FunctionDefinition {
    function(
        name,
        vec![param("v", Instant).optional()],
        Instant,
        description,
    )
}

fn instant_math(name: &str, description: &str) -> FunctionDefinition {
    function(name, vec![param("v", Instant)], Instant, description)
}

#[allow(clippy::too_many_lines)]
pub(crate) fn functions() -> Vec<FunctionDefinition> {
    vec![
        example(
            function("rate", vec![param("v", Range)], Instant, "Per-second average rate of increase of a counter over the range."),
            "rate(http_requests_total[5m])",
        ),
        function("irate", vec![param("v", Range)], Instant, "Per-second instant rate of increase based on the last two samples."),
        function("increase", vec![param("v", Range)], Instant, "Increase of a counter over the range."),
        function("delta", vec![param("v", Range)], Instant, "Difference between the first and last value of a gauge over the range."),
        function("idelta", vec![param("v", Range)], Instant, "Difference between the last two samples of a gauge."),
        function("deriv", vec![param("v", Range)], Instant, "Per-second derivative of a gauge using simple linear regression."),
        function("changes", vec![param("v", Range)], Instant, "Number of times the value changed within the range."),
        function("resets", vec![param("v", Range)], Instant, "Number of counter resets within the range."),
        function("predict_linear", vec![param("v", Range), param("t", Scalar)], Instant, "Predicted value `t` seconds from now using linear regression."),
        function("absent_over_time", vec![param("v", Range)], Instant, "1-element vector if the range vector has no elements."),
        over_time("avg_over_time", "Average value of all points in the range."),
        over_time("min_over_time", "Minimum value of all points in the range."),
        over_time("max_over_time", "Maximum value of all points in the range."),
        over_time("sum_over_time", "Sum of all values in the range."),
        over_time("count_over_time", "Count of all values in the range."),
        over_time("stddev_over_time", "Population standard deviation of the values in the range."),
        over_time("stdvar_over_time", "Population standard variance of the values in the range."),
        over_time("last_over_time", "Most recent point value in the range."),
        over_time("present_over_time", "Value 1 for any series in the range."),
        function("quantile_over_time", vec![param("phi", Scalar), param("v", Range)], Instant, "φ-quantile (0 ≤ φ ≤ 1) of the values in the range."),
        instant_math("abs", "Absolute value of all sample values."),
        instant_math("ceil", "Rounds sample values up to the nearest integer."),
        instant_math("floor", "Rounds sample values down to the nearest integer."),
        instant_math("exp", "Exponential function of all sample values."),
        instant_math("ln", "Natural logarithm of all sample values."),
        instant_math("log2", "Binary logarithm of all sample values."),
        instant_math("log10", "Decimal logarithm of all sample values."),
        instant_math("sqrt", "Square root of all sample values."),
        instant_math("sgn", "Sign of all sample values: 1, 0 or -1."),
        instant_math("absent", "1-element vector if the input vector has no elements."),
        instant_math("timestamp", "Timestamp of each sample as seconds since epoch."),
        instant_math("sort", "Sorts samples ascending by value."),
        instant_math("sort_desc", "Sorts samples descending by value."),
        function("round", vec![param("v", Instant), param("to_nearest", Scalar).optional()], Instant, "Rounds sample values to the nearest integer or multiple of `to_nearest`."),
        function("clamp", vec![param("v", Instant), param("min", Scalar), param("max", Scalar)], Instant, "Clamps sample values to [min, max]."),
        function("clamp_min", vec![param("v", Instant), param("min", Scalar)], Instant, "Clamps sample values to a lower bound."),
        function("clamp_max", vec![param("v", Instant), param("max", Scalar)], Instant, "Clamps sample values to an upper bound."),
        example(
            function("histogram_quantile", vec![param("phi", Scalar), param("b", Instant)], Instant, "φ-quantile from the buckets of a classic histogram."),
            "histogram_quantile(0.9, sum by (le) (rate(http_request_duration_seconds_bucket[5m])))",
        ),
        function("label_replace", vec![param("v", Instant), param("dst_label", Str), param("replacement", Str), param("src_label", Str), param("regex", Str)], Instant, "Writes a regex replacement of `src_label` into `dst_label`."),
        function("label_join", vec![param("v", Instant), param("dst_label", Str), param("separator", Str), param("src_label", Str)], Instant, "Joins the values of source labels into `dst_label`."),
        function("scalar", vec![param("v", Instant)], Scalar, "Sample value of a single-element vector as a scalar."),
        function("vector", vec![param("s", Scalar)], Instant, "Scalar as a vector without labels."),
        function("time", vec![], Scalar, "Seconds since epoch at evaluation time."),
        date_part("minute", "Minute of the hour (UTC) for each sample."),
        date_part("hour", "Hour of the day (UTC) for each sample."),
        date_part("day_of_week", "Day of the week (UTC) for each sample."),
        date_part("day_of_month", "Day of the month (UTC) for each sample."),
        date_part("days_in_month", "Number of days in the month (UTC) for each sample."),
        date_part("month", "Month of the year (UTC) for each sample."),
        date_part("year", "Year (UTC) for each sample."),
        FunctionDefinition {
            preview: true,
            ..function("mad_over_time", vec![param("v", Range)], Instant, "Median absolute deviation of the values in the range.")
        },
        example(
            aggregation("sum", vec![param("v", Instant)], "Sum over dimensions."),
            "sum by (job) (rate(http_requests_total[5m]))",
        ),
        aggregation("avg", vec![param("v", Instant)], "Average over dimensions."),
        aggregation("min", vec![param("v", Instant)], "Minimum over dimensions."),
        aggregation("max", vec![param("v", Instant)], "Maximum over dimensions."),
        aggregation("count", vec![param("v", Instant)], "Count of elements in the vector."),
        aggregation("group", vec![param("v", Instant)], "All values in the resulting vector are 1."),
        aggregation("stddev", vec![param("v", Instant)], "Population standard deviation over dimensions."),
        aggregation("stdvar", vec![param("v", Instant)], "Population standard variance over dimensions."),
        aggregation("topk", vec![param("k", Scalar), param("v", Instant)], "Largest k elements by sample value."),
        aggregation("bottomk", vec![param("k", Scalar), param("v", Instant)], "Smallest k elements by sample value."),
        aggregation("quantile", vec![param("phi", Scalar), param("v", Instant)], "φ-quantile over dimensions."),
        aggregation("count_values", vec![param("label", Str), param("v", Instant)], "Count of elements with the same value."),
    ]
}

fn operator(name: &str, symbol: &str, signatures: Vec<Signature>, description: &str) -> OperatorDefinition {
    OperatorDefinition {
        name: name.to_string(),
        operator: symbol.to_string(),
        signatures,
        description: description.to_string(),
        examples: Vec::new(),
        ignore_as_suggestion: false,
    }
}

/// Arithmetic and comparison operators accept vectors and scalars on both sides
fn vector_or_scalar() -> Vec<Signature> {
    vec![
        Signature::new(vec![param("left", Instant), param("right", Instant)], Instant),
        Signature::new(vec![param("left", Instant), param("right", Scalar)], Instant),
        Signature::new(vec![param("left", Scalar), param("right", Instant)], Instant),
        Signature::new(vec![param("left", Scalar), param("right", Scalar)], Scalar),
    ]
}

fn vector_only() -> Vec<Signature> {
    vec![Signature::new(
        vec![param("left", Instant), param("right", Instant)],
        Instant,
    )]
}

pub(crate) fn operators() -> Vec<OperatorDefinition> {
    vec![
        operator("add", "+", vector_or_scalar(), "Addition"),
        operator("subtract", "-", vector_or_scalar(), "Subtraction"),
        operator("multiply", "*", vector_or_scalar(), "Multiplication"),
        operator("divide", "/", vector_or_scalar(), "Division"),
        operator("modulo", "%", vector_or_scalar(), "Modulo"),
        operator("power", "^", vector_or_scalar(), "Power/exponentiation"),
        operator("atan2", "atan2", vector_or_scalar(), "Arc tangent of left/right"),
        operator("equals", "==", vector_or_scalar(), "Equal (filter, or 0/1 with `bool`)"),
        operator("not_equals", "!=", vector_or_scalar(), "Not equal"),
        operator("greater_than", ">", vector_or_scalar(), "Greater than"),
        operator("less_than", "<", vector_or_scalar(), "Less than"),
        operator("greater_or_equal", ">=", vector_or_scalar(), "Greater than or equal"),
        operator("less_or_equal", "<=", vector_or_scalar(), "Less than or equal"),
        operator("and", "and", vector_only(), "Intersection: left series with a match on the right"),
        operator("or", "or", vector_only(), "Union: left series plus unmatched right series"),
        operator("unless", "unless", vector_only(), "Complement: left series without a match on the right"),
    ]
}

fn matcher(name: &str, symbol: &str, description: &str, example: &str) -> LabelMatcherDefinition {
    LabelMatcherDefinition {
        name: name.to_string(),
        operator: symbol.to_string(),
        description: description.to_string(),
        examples: vec![example.to_string()],
    }
}

pub(crate) fn label_matchers() -> Vec<LabelMatcherDefinition> {
    vec![
        matcher("equals", "=", "Label value equals the string", r#"job="api""#),
        matcher("not_equals", "!=", "Label value differs from the string", r#"job!="api""#),
        matcher("regex", "=~", "Label value matches the regular expression", r#"job=~"api|web""#),
        matcher("not_regex", "!~", "Label value does not match the regular expression", r#"code!~"2..""#),
    ]
}

pub(crate) fn tables() -> DefinitionTables {
    DefinitionTables {
        functions: functions(),
        operators: operators(),
        label_matchers: label_matchers(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let mut names: Vec<_> = functions().into_iter().map(|f| f.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_every_operator_is_binary() {
        assert!(operators().iter().all(OperatorDefinition::is_binary));
    }

    #[test]
    fn test_tables_serialize_round_trip() {
        let json = serde_json::to_string(&tables()).unwrap();
        let parsed: DefinitionTables = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tables());
    }
}
