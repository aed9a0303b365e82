use serde_json::{Map, Value};

/// Copy of `value` with every `null` object member dropped, at any depth.
///
/// Array slots are kept as they are, nulls included, so positions never shift.
pub fn without_null_fields(value: &Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (key.clone(), without_null_fields(member)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_null_fields).collect()),
        scalar => scalar.clone(),
    }
}
