use serde_json::{Map, Value};

use crate::operation::Field;

/// Shape a resolved value to a selection set.
///
/// Objects keep only selected fields, keyed by alias when one is given; lists are
/// projected element-wise. Selected fields missing from the value come back as null.
/// An empty selection returns the value unchanged.
pub fn project(value: Value, selection: &[Field]) -> Value {
    if selection.is_empty() {
        return value;
    }

    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| project(item, selection))
                .collect(),
        ),
        Value::Object(object) => {
            let mut out = Map::new();
            for field in selection {
                // cloned, not removed: one field may be selected under several aliases
                let inner = object.get(&field.name).cloned().unwrap_or(Value::Null);
                out.insert(
                    field.response_key().to_string(),
                    project(inner, &field.selection),
                );
            }
            Value::Object(out)
        }
        other => other,
    }
}
