//! Metadata records for functions, operators and label matchers
//!
//! These are the static tables the classifier and the suggestion dispatcher
//! consult for parameter arity and value types. They deserialize from the
//! same JSON layout they serialize to, so substitute tables can be supplied
//! as data (see [`Registry::from_json`](crate::Registry::from_json)).

use serde::{Deserialize, Serialize};

/// PromQL value type of a parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    InstantVector,
    RangeVector,
    Scalar,
    String,
}

impl ParamType {
    /// Whether a metric field can be used where this type is expected
    #[must_use]
    pub fn accepts_field(self) -> bool {
        matches!(self, Self::InstantVector | Self::RangeVector)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InstantVector => "instant_vector",
            Self::RangeVector => "range_vector",
            Self::Scalar => "scalar",
            Self::String => "string",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            optional: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// An ordered parameter list and the resulting value type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: ParamType,
}

impl Signature {
    #[must_use]
    pub fn new(params: Vec<Param>, return_type: ParamType) -> Self {
        Self {
            params,
            return_type,
        }
    }

    /// Number of parameters without a default
    #[must_use]
    pub fn min_params(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// Render as `name(param type, ...) -> return`
    #[must_use]
    pub fn render(&self, name: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let marker = if p.optional { "?" } else { "" };
                format!("{}{marker} {}", p.name, p.param_type)
            })
            .collect();
        format!("{name}({}) -> {}", params.join(", "), self.return_type)
    }
}

/// Whether a function groups series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    #[default]
    Function,
    /// Accepts `by (...)` / `without (...)`
    Aggregation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: FunctionKind,
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// Experimental in Prometheus; still suggested but flagged
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preview: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_as_suggestion: bool,
}

impl FunctionDefinition {
    #[must_use]
    pub fn is_aggregation(&self) -> bool {
        self.kind == FunctionKind::Aggregation
    }

    /// Largest parameter count over all signatures
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.signatures
            .iter()
            .map(|s| s.params.len())
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn return_types(&self) -> Vec<ParamType> {
        dedup_types(self.signatures.iter().map(|s| s.return_type))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDefinition {
    pub name: String,
    /// Symbol or keyword as typed (`+`, `==`, `and`)
    pub operator: String,
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_as_suggestion: bool,
}

impl OperatorDefinition {
    /// Whether the operator is written as a word (`and`, `atan2`)
    #[must_use]
    pub fn is_keyword(&self) -> bool {
        self.operator
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.signatures.iter().any(|s| s.params.len() >= 2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMatcherDefinition {
    pub name: String,
    pub operator: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// The three definition tables as one serde document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionTables {
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
    #[serde(default)]
    pub operators: Vec<OperatorDefinition>,
    #[serde(default)]
    pub label_matchers: Vec<LabelMatcherDefinition>,
}

/// Collect types in first-seen order without duplicates
pub(crate) fn dedup_types(types: impl IntoIterator<Item = ParamType>) -> Vec<ParamType> {
    let mut out = Vec::new();
    for ty in types {
        if !out.contains(&ty) {
            out.push(ty);
        }
    }
    out
}
