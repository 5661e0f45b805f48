//! Read-only registry over the definition tables
//!
//! A [`Registry`] is built once and passed by reference into the classifier
//! and the suggestion dispatcher. Tests and embedders can construct their own
//! from fixture tables instead of the built-in PromQL definitions.

use crate::builtins;
use crate::definitions::{
    dedup_types, DefinitionTables, FunctionDefinition, LabelMatcherDefinition,
    OperatorDefinition, ParamType,
};
use crate::error::Error;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Environment variable pointing at a JSON definitions file
pub const DEFINITIONS_PATH_ENV: &str = "PROMQL_LANGUAGE_TOOLS_DEFINITIONS";

/// Registry built from the built-in tables (singleton)
static BUILTIN: OnceCell<Registry> = OnceCell::new();

/// Registry selected by [`Registry::from_env`] for the default service (singleton)
static DEFAULT: OnceCell<Registry> = OnceCell::new();

/// Function, operator and label-matcher tables with lookup indexes
#[derive(Debug)]
pub struct Registry {
    tables: DefinitionTables,
    /// Lowercased function name -> index into `tables.functions`
    functions_by_name: HashMap<String, usize>,
    /// Lowercased operator symbol -> index into `tables.operators`
    operators_by_symbol: HashMap<String, usize>,
    /// Matches a binary operator at the end of the text before the cursor
    trailing_operator: Regex,
}

impl Registry {
    /// Build a registry, validating the tables and compiling the operator pattern
    pub fn new(tables: DefinitionTables) -> Result<Self, Error> {
        let mut functions_by_name = HashMap::new();
        for (i, func) in tables.functions.iter().enumerate() {
            if func.signatures.is_empty() {
                return Err(Error::invalid_definition(&func.name, "no signatures"));
            }
            if functions_by_name
                .insert(func.name.to_ascii_lowercase(), i)
                .is_some()
            {
                return Err(Error::DuplicateDefinition {
                    table: "function",
                    name: func.name.clone(),
                });
            }
        }

        let mut operators_by_symbol = HashMap::new();
        for (i, op) in tables.operators.iter().enumerate() {
            if op.operator.trim().is_empty() {
                return Err(Error::invalid_definition(&op.name, "empty operator symbol"));
            }
            if operators_by_symbol
                .insert(op.operator.to_ascii_lowercase(), i)
                .is_some()
            {
                return Err(Error::DuplicateDefinition {
                    table: "operator",
                    name: op.operator.clone(),
                });
            }
        }

        let mut matchers: Vec<&str> = Vec::new();
        for matcher in &tables.label_matchers {
            if matchers.contains(&matcher.operator.as_str()) {
                return Err(Error::DuplicateDefinition {
                    table: "label matcher",
                    name: matcher.operator.clone(),
                });
            }
            matchers.push(&matcher.operator);
        }

        let trailing_operator = compile_trailing_operator(&tables.operators)?;

        Ok(Self {
            tables,
            functions_by_name,
            operators_by_symbol,
            trailing_operator,
        })
    }

    /// Build a registry from a JSON document shaped like [`DefinitionTables`]
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let tables: DefinitionTables = serde_json::from_str(json)?;
        Self::new(tables)
    }

    /// Build a registry from a JSON definitions file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json =
            std::fs::read_to_string(path).map_err(|e| Error::definitions_read(path, e))?;
        Self::from_json(&json)
    }

    /// The registry over the built-in PromQL definitions
    pub fn builtin() -> Result<&'static Self, Error> {
        BUILTIN.get_or_try_init(|| Self::new(builtins::tables()))
    }

    /// Load from `PROMQL_LANGUAGE_TOOLS_DEFINITIONS` if set, else the built-in tables
    pub fn from_env() -> Result<Self, Error> {
        if let Ok(path) = std::env::var(DEFINITIONS_PATH_ENV) {
            log::debug!("Loading definitions via {DEFINITIONS_PATH_ENV}: {path}");
            return Self::from_path(path);
        }
        log::debug!("Using built-in PromQL definitions");
        Self::new(builtins::tables())
    }

    /// The process-wide registry chosen by [`Registry::from_env`]
    pub fn default_registry() -> Result<&'static Self, Error> {
        DEFAULT.get_or_try_init(Self::from_env)
    }

    #[must_use]
    pub fn tables(&self) -> &DefinitionTables {
        &self.tables
    }

    #[must_use]
    pub fn functions(&self) -> &[FunctionDefinition] {
        &self.tables.functions
    }

    #[must_use]
    pub fn operators(&self) -> &[OperatorDefinition] {
        &self.tables.operators
    }

    #[must_use]
    pub fn label_matchers(&self) -> &[LabelMatcherDefinition] {
        &self.tables.label_matchers
    }

    /// Look up a function by name (case-insensitive)
    #[must_use]
    pub fn function_definition(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions_by_name
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.tables.functions[i])
    }

    /// Look up an operator by symbol (case-insensitive for keyword operators)
    #[must_use]
    pub fn operator_definition(&self, operator: &str) -> Option<&OperatorDefinition> {
        self.operators_by_symbol
            .get(&operator.to_ascii_lowercase())
            .map(|&i| &self.tables.operators[i])
    }

    #[must_use]
    pub fn is_aggregation(&self, name: &str) -> bool {
        self.function_definition(name)
            .is_some_and(FunctionDefinition::is_aggregation)
    }

    /// Expected types of parameter `index` of function `name`, over all signatures
    ///
    /// Unknown functions and out-of-range indexes give an empty list, which
    /// callers treat as "no constraint".
    #[must_use]
    pub fn function_param_types(&self, name: &str, index: usize) -> Vec<ParamType> {
        self.function_definition(name).map_or_else(Vec::new, |func| {
            dedup_types(
                func.signatures
                    .iter()
                    .filter_map(|s| s.params.get(index).map(|p| p.param_type)),
            )
        })
    }

    /// Expected types of operand `index` of a binary operator
    ///
    /// Only signatures with more than `index` parameters count, so index 1
    /// (the right-hand side) is empty for operators without a binary form.
    #[must_use]
    pub fn binary_operator_param_types(&self, operator: &str, index: usize) -> Vec<ParamType> {
        self.operator_definition(operator)
            .map_or_else(Vec::new, |op| {
                dedup_types(
                    op.signatures
                        .iter()
                        .filter(|s| s.params.len() >= 2)
                        .filter_map(|s| s.params.get(index).map(|p| p.param_type)),
                )
            })
    }

    /// The binary operator that ends `text`, ignoring trailing whitespace
    ///
    /// An operator only counts when an operand precedes it, so a leading
    /// sign (`rate(-`) is not reported. Keyword operators (`and`) must be
    /// followed by whitespace, since `or` may still be the prefix of a name.
    #[must_use]
    pub fn trailing_operator(&self, text: &str) -> Option<&OperatorDefinition> {
        let captures = self.trailing_operator.captures(text)?;
        let symbol = captures
            .name("symbol")
            .or_else(|| captures.name("word"))?
            .as_str();
        self.operator_definition(symbol)
    }
}

fn compile_trailing_operator(operators: &[OperatorDefinition]) -> Result<Regex, Error> {
    let mut symbols: Vec<&str> = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    for op in operators.iter().filter(|op| op.is_binary()) {
        if op.is_keyword() {
            words.push(&op.operator);
        } else {
            symbols.push(&op.operator);
        }
    }
    // longest first so `>=` wins over `>`
    symbols.sort_by_key(|s| std::cmp::Reverse(s.len()));
    words.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let operand_end = r#"[\w)\]}"'.]"#;
    let mut branches = Vec::new();
    if !symbols.is_empty() {
        let alternation: Vec<String> = symbols.iter().map(|s| regex::escape(s)).collect();
        branches.push(format!(
            r"{operand_end}\s*(?P<symbol>{})\s*$",
            alternation.join("|")
        ));
    }
    if !words.is_empty() {
        let alternation: Vec<String> = words.iter().map(|s| regex::escape(s)).collect();
        branches.push(format!(
            r"{operand_end}\s+(?i:(?P<word>{}))\s+$",
            alternation.join("|")
        ));
    }
    if branches.is_empty() {
        // matches nothing
        return Ok(Regex::new(r"[^\s\S]")?);
    }
    Ok(Regex::new(&branches.join("|"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{FunctionKind, Param, Signature};

    fn fixture_operator(symbol: &str, params: usize) -> OperatorDefinition {
        let params = (0..params)
            .map(|i| Param::new(format!("p{i}"), ParamType::Scalar))
            .collect();
        OperatorDefinition {
            name: symbol.to_string(),
            operator: symbol.to_string(),
            signatures: vec![Signature::new(params, ParamType::Scalar)],
            description: String::new(),
            examples: Vec::new(),
            ignore_as_suggestion: false,
        }
    }

    #[test]
    fn test_builtin_rate_expects_range_vector() {
        let registry = Registry::builtin().unwrap();
        let rate = registry.function_definition("rate").expect("rate");
        assert_eq!(
            rate.signatures[0].params[0].param_type,
            ParamType::RangeVector
        );
        // case-insensitive
        assert!(registry.function_definition("RATE").is_some());
    }

    #[test]
    fn test_unknown_names_give_empty_types() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.function_param_types("nope", 0).is_empty());
        assert!(registry.binary_operator_param_types("<>", 1).is_empty());
        assert!(registry.function_param_types("rate", 3).is_empty());
    }

    #[test]
    fn test_binary_operator_right_types() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(
            registry.binary_operator_param_types("+", 1),
            vec![ParamType::InstantVector, ParamType::Scalar]
        );
        assert_eq!(
            registry.binary_operator_param_types("and", 1),
            vec![ParamType::InstantVector]
        );
    }

    #[test]
    fn test_trailing_operator_detection() {
        let registry = Registry::builtin().unwrap();
        let op = |text: &str| registry.trailing_operator(text).map(|o| o.operator.as_str());
        assert_eq!(op("a + "), Some("+"));
        assert_eq!(op("rate(x[5m]) >="), Some(">="));
        assert_eq!(op("sum(a) / "), Some("/"));
        assert_eq!(op("up and "), Some("and"));
        assert_eq!(op("up AND "), Some("and"));
        assert_eq!(op("up or"), None);
        assert_eq!(op("rate(-"), None);
        assert_eq!(op("-"), None);
        assert_eq!(op("up"), None);
        assert_eq!(op("foo_or "), None);
    }

    #[test]
    fn test_operator_regex_round_trip() {
        let mut tables = builtins::tables();
        tables.operators.push(fixture_operator("~~", 1));
        let registry = Registry::new(tables).unwrap();

        for op in registry.operators() {
            let text = format!("a {} ", op.operator);
            let recognised = registry
                .trailing_operator(&text)
                .is_some_and(|found| found.operator == op.operator);
            let right_types = registry.binary_operator_param_types(&op.operator, 1);
            if op.is_binary() {
                assert!(recognised, "{} not recognised", op.operator);
            }
            assert_eq!(
                recognised,
                !right_types.is_empty(),
                "round trip broken for {}",
                op.operator
            );
        }
    }

    #[test]
    fn test_duplicate_function_rejected() {
        let mut tables = builtins::tables();
        let mut dup = tables.functions[0].clone();
        dup.name = dup.name.to_uppercase();
        tables.functions.push(dup);
        assert!(matches!(
            Registry::new(tables),
            Err(Error::DuplicateDefinition { table: "function", .. })
        ));
    }

    #[test]
    fn test_function_without_signature_rejected() {
        let tables = DefinitionTables {
            functions: vec![FunctionDefinition {
                name: "broken".into(),
                kind: FunctionKind::Function,
                signatures: vec![],
                description: String::new(),
                examples: vec![],
                preview: false,
                ignore_as_suggestion: false,
            }],
            ..DefinitionTables::default()
        };
        assert!(matches!(
            Registry::new(tables),
            Err(Error::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_from_json_fixture() {
        let json = r#"{
            "functions": [{
                "name": "my_sum",
                "kind": "aggregation",
                "signatures": [{"params": [{"name": "v", "type": "instant_vector"}], "return_type": "instant_vector"}]
            }],
            "operators": [{
                "name": "add",
                "operator": "+",
                "signatures": [{"params": [
                    {"name": "l", "type": "instant_vector"},
                    {"name": "r", "type": "scalar"}
                ], "return_type": "instant_vector"}]
            }]
        }"#;
        let registry = Registry::from_json(json).unwrap();
        assert!(registry.is_aggregation("my_sum"));
        assert!(registry.function_definition("rate").is_none());
        assert_eq!(
            registry.binary_operator_param_types("+", 1),
            vec![ParamType::Scalar]
        );
        assert!(registry.trailing_operator("a - ").is_none());
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let err = Registry::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::DefinitionsRead { .. }));
    }

    #[test]
    fn test_empty_tables_compile() {
        let registry = Registry::new(DefinitionTables::default()).unwrap();
        assert!(registry.trailing_operator("a + ").is_none());
    }
}
