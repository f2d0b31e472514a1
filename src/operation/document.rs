//! Parsed form of an operation document.
use serde_json::{Map, Value};

use crate::operation::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// Root type name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variable_defaults: Vec<(String, InputValue)>,
    pub selection: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub selection: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    Variable(String),
    List(Vec<InputValue>),
    Object(Vec<(String, InputValue)>),
}

impl Document {
    /// Pick the operation to run: the named one, or the only one.
    pub fn select(&self, operation_name: Option<&str>) -> Result<&Operation, ParseError> {
        match operation_name {
            Some(name) => self
                .operations
                .iter()
                .find(|op| op.name.as_deref() == Some(name))
                .ok_or_else(|| ParseError::new(format!("unknown operation named \"{name}\""))),
            None => match self.operations.as_slice() {
                [only] => Ok(only),
                _ => Err(ParseError::new(
                    "operationName is required when the document has several operations",
                )),
            },
        }
    }
}

impl Operation {
    /// Effective variables: supplied values first, then declared defaults.
    pub fn variables(&self, supplied: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut vars = supplied.cloned().unwrap_or_default();
        for (name, default) in &self.variable_defaults {
            if !vars.contains_key(name) {
                let value = default.resolve(&Map::new());
                vars.insert(name.clone(), value);
            }
        }
        vars
    }
}

impl Field {
    /// Key under which this field's result is returned.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Arguments as a JSON object, with variables substituted.
    pub fn argument_object(&self, variables: &Map<String, Value>) -> Value {
        Value::Object(
            self.arguments
                .iter()
                .map(|(name, value)| (name.clone(), value.resolve(variables)))
                .collect(),
        )
    }
}

impl InputValue {
    /// Substitute variables; an unset variable reads as null.
    pub fn resolve(&self, variables: &Map<String, Value>) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::String(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
            Self::List(items) => Value::Array(items.iter().map(|v| v.resolve(variables)).collect()),
            Self::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve(variables)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn op(name: Option<&str>) -> Operation {
        Operation {
            kind: OperationKind::Query,
            name: name.map(str::to_string),
            variable_defaults: vec![("limit".into(), InputValue::Int(10))],
            selection: vec![],
        }
    }

    #[test]
    fn select_requires_name_for_multi_operation_documents() {
        let doc = Document {
            operations: vec![op(Some("A")), op(Some("B"))],
        };

        assert!(doc.select(None).is_err());
        assert_eq!(doc.select(Some("B")).unwrap().name.as_deref(), Some("B"));
        assert!(doc.select(Some("C")).is_err());
    }

    #[test]
    fn supplied_variables_win_over_defaults() {
        let operation = op(None);

        let defaults = operation.variables(None);
        assert_eq!(defaults.get("limit"), Some(&json!(10)));

        let supplied = json!({ "limit": 3 });
        let vars = operation.variables(supplied.as_object());
        assert_eq!(vars.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn nested_values_resolve_variables() {
        let value = InputValue::Object(vec![
            ("id".into(), InputValue::Variable("id".into())),
            ("tags".into(), InputValue::List(vec![InputValue::Enum("FOOD".into())])),
            ("missing".into(), InputValue::Variable("nope".into())),
        ]);
        let vars = json!({ "id": "e-1" });

        assert_eq!(
            value.resolve(vars.as_object().unwrap()),
            json!({ "id": "e-1", "tags": ["FOOD"], "missing": null })
        );
    }
}
