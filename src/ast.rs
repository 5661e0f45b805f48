//! Syntax tree for PromQL queries
//!
//! Every node carries a [`Location`] of byte offsets and an `incomplete`
//! flag that is set when parsing stopped because the input ran out (for
//! example `rate(` or `a + `). Containers of an incomplete node are
//! incomplete as well.

use serde::Serialize;

/// Byte range covered by a node; `max` is the offset of the last byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub min: usize,
    pub max: usize,
}

impl Location {
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Zero-width location used for input that is missing
    #[must_use]
    pub fn point(offset: usize) -> Self {
        Self {
            min: offset,
            max: offset,
        }
    }

    #[must_use]
    pub fn span(&self) -> usize {
        self.max - self.min
    }

    /// Inclusive containment on both ends
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.min <= offset && offset <= self.max
    }

    /// Offset just past the last byte
    #[must_use]
    pub fn end(&self) -> usize {
        self.max + 1
    }
}

/// A node of the query tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Location,
    pub incomplete: bool,
}

/// Node payloads
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeKind {
    Selector(Selector),
    Function(FunctionCall),
    #[serde(rename = "binary-expression")]
    Binary(BinaryExpression),
    #[serde(rename = "unary-expression")]
    Unary(UnaryExpression),
    Label(Label),
    LabelMap(LabelMap),
    Grouping(Grouping),
    Identifier(Identifier),
    Literal(Literal),
    Parens(Parens),
    /// Placeholder for input the parser expected but did not find
    Unknown,
}

/// `metric{labels}[duration]`; every part is optional but at least one exists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selector {
    /// [`NodeKind::Identifier`]
    pub metric: Option<Box<Node>>,
    /// [`NodeKind::LabelMap`]
    pub label_map: Option<Box<Node>>,
    /// Range selector; present once `[` has been typed
    pub duration: Option<RangeSelector>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSelector {
    /// Offset of the `[`
    pub open: usize,
    /// Offset of the `]`, if typed
    pub close: Option<usize>,
    /// [`NodeKind::Literal`] holding a duration
    pub value: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub name_location: Location,
    /// Offset of the `(` opening the argument list
    pub open_paren: Option<usize>,
    /// Offset of the `)` closing the argument list
    pub close_paren: Option<usize>,
    pub args: Vec<Node>,
    /// [`NodeKind::Grouping`], either before or after the arguments
    pub grouping: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpression {
    pub operator: String,
    pub operator_location: Location,
    pub left: Box<Node>,
    /// [`NodeKind::Unknown`] when nothing was typed after the operator
    pub right: Box<Node>,
}

/// Sign applied to an operand (`-rate(x[5m])`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryExpression {
    pub operator: String,
    pub operand: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    /// [`NodeKind::Identifier`]
    pub name: Box<Node>,
    pub operator: Option<String>,
    pub operator_location: Option<Location>,
    /// [`NodeKind::Literal`] holding a string
    pub value: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelMap {
    /// [`NodeKind::Label`] entries
    pub args: Vec<Node>,
    /// Offset of the `}`, if typed
    pub close: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouping {
    /// `by` or `without`
    pub name: String,
    /// Offset of the `(`, if typed
    pub open_paren: Option<usize>,
    pub close_paren: Option<usize>,
    /// [`NodeKind::Identifier`] entries
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "literal_type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Number(f64),
    /// `terminated` is false while the closing quote is missing
    String { value: String, terminated: bool },
    Duration(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parens {
    pub child: Box<Node>,
}

/// Parsed query root
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    /// `None` for empty or whitespace-only input
    pub expression: Option<Node>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind, location: Location, incomplete: bool) -> Self {
        Self {
            kind,
            location,
            incomplete,
        }
    }

    #[must_use]
    pub fn unknown(offset: usize) -> Self {
        Self::new(NodeKind::Unknown, Location::point(offset), true)
    }

    #[must_use]
    pub fn identifier(name: impl Into<String>, location: Location) -> Self {
        Self::new(
            NodeKind::Identifier(Identifier { name: name.into() }),
            location,
            false,
        )
    }

    #[must_use]
    pub fn span(&self) -> usize {
        self.location.span()
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, NodeKind::Unknown)
    }

    /// Short kind name, matching the serialized `type` tag
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Selector(_) => "selector",
            NodeKind::Function(_) => "function",
            NodeKind::Binary(_) => "binary-expression",
            NodeKind::Unary(_) => "unary-expression",
            NodeKind::Label(_) => "label",
            NodeKind::LabelMap(_) => "label-map",
            NodeKind::Grouping(_) => "grouping",
            NodeKind::Identifier(_) => "identifier",
            NodeKind::Literal(_) => "literal",
            NodeKind::Parens(_) => "parens",
            NodeKind::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn as_selector(&self) -> Option<&Selector> {
        match &self.kind {
            NodeKind::Selector(selector) => Some(selector),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionCall> {
        match &self.kind {
            NodeKind::Function(func) => Some(func),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&BinaryExpression> {
        match &self.kind {
            NodeKind::Binary(binary) => Some(binary),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_label(&self) -> Option<&Label> {
        match &self.kind {
            NodeKind::Label(label) => Some(label),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_label_map(&self) -> Option<&LabelMap> {
        match &self.kind {
            NodeKind::LabelMap(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_grouping(&self) -> Option<&Grouping> {
        match &self.kind {
            NodeKind::Grouping(grouping) => Some(grouping),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(ident) => Some(&ident.name),
            _ => None,
        }
    }

    /// Direct children in source order (ascending `location.min`)
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        let mut children: Vec<&Node> = match &self.kind {
            NodeKind::Selector(selector) => {
                let mut out = Vec::with_capacity(3);
                out.extend(selector.metric.as_deref());
                out.extend(selector.label_map.as_deref());
                out.extend(selector.duration.as_ref().and_then(|d| d.value.as_deref()));
                out
            }
            NodeKind::Function(func) => {
                let mut out: Vec<&Node> = func.args.iter().collect();
                out.extend(func.grouping.as_deref());
                out
            }
            NodeKind::Binary(binary) => vec![&*binary.left, &*binary.right],
            NodeKind::Unary(unary) => vec![&*unary.operand],
            NodeKind::Label(label) => {
                let mut out = vec![&*label.name];
                out.extend(label.value.as_deref());
                out
            }
            NodeKind::LabelMap(map) => map.args.iter().collect(),
            NodeKind::Grouping(grouping) => grouping.args.iter().collect(),
            NodeKind::Parens(parens) => vec![&*parens.child],
            NodeKind::Identifier(_) | NodeKind::Literal(_) | NodeKind::Unknown => Vec::new(),
        };
        // stable, so equal offsets keep their structural order
        children.sort_by_key(|child| child.location.min);
        children
    }
}

impl Selector {
    #[must_use]
    pub fn metric_name(&self) -> Option<&str> {
        self.metric.as_deref().and_then(Node::as_identifier)
    }
}

impl Label {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_identifier().unwrap_or_default()
    }
}
