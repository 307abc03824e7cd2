//! JSON field assertions
//!
//! Helpers for checking API payloads field by field instead of comparing
//! whole documents, so tests keep passing when unrelated fields are added.

use std::fmt;

use serde_json::{Map, Value};

/// The JSON type of a value, as far as field assertions care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    /// Any number
    Number,
    /// A number without a fractional part
    Integer,
    /// A number stored as floating point
    Float,
    String,
    Array,
    Object,
}

impl JsonType {
    /// The most specific type of `value`
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Check if `value` is an instance of this type
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            other => other == Self::of(value),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One or more acceptable types for a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedTypes(Vec<JsonType>);

impl ExpectedTypes {
    pub fn matches(&self, value: &Value) -> bool {
        self.0.iter().any(|t| t.matches(value))
    }
}

impl fmt::Display for ExpectedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            many => {
                let names: Vec<_> = many.iter().map(|t| t.name()).collect();
                write!(f, "one of {}", names.join(", "))
            }
        }
    }
}

impl From<JsonType> for ExpectedTypes {
    fn from(t: JsonType) -> Self {
        Self(vec![t])
    }
}

impl<const N: usize> From<[JsonType; N]> for ExpectedTypes {
    fn from(types: [JsonType; N]) -> Self {
        Self(types.to_vec())
    }
}

impl From<&[JsonType]> for ExpectedTypes {
    fn from(types: &[JsonType]) -> Self {
        Self(types.to_vec())
    }
}

#[track_caller]
fn as_object(json: &Value) -> &Map<String, Value> {
    match json.as_object() {
        Some(object) => object,
        None => panic!("Expected a JSON object, got {}\nJSON: {json}", JsonType::of(json)),
    }
}

#[track_caller]
fn check_type(json: &Value, field: &str, value: &Value, expected: &ExpectedTypes) {
    if !expected.matches(value) {
        panic!(
            "Field \"{field}\" is {}, but should be {expected}\nJSON: {json}",
            JsonType::of(value)
        );
    }
}

/// Assert that `json` has `field` and that it is of an expected type.
///
/// Returns the field value on success.
///
/// ```
/// use miia_test_utils::{assert_field, JsonType};
/// use serde_json::json;
///
/// let body = json!({"score": 2.5, "label": null});
/// assert_field(&body, "score", JsonType::Number);
/// assert_field(&body, "label", [JsonType::String, JsonType::Null]);
/// ```
#[track_caller]
pub fn assert_field<'a>(
    json: &'a Value,
    field: &str,
    expected: impl Into<ExpectedTypes>,
) -> &'a Value {
    let expected = expected.into();
    let Some(value) = as_object(json).get(field) else {
        panic!("JSON object missing field \"{field}\"\nJSON: {json}");
    };

    check_type(json, field, value, &expected);
    value
}

/// Assert the type of an optional field, falling back to `default` when it
/// is missing.
///
/// The default goes through the same type check as a present value.
#[track_caller]
pub fn assert_field_or(
    json: &Value,
    field: &str,
    expected: impl Into<ExpectedTypes>,
    default: impl Into<Value>,
) -> Value {
    let expected = expected.into();
    let value = as_object(json)
        .get(field)
        .cloned()
        .unwrap_or_else(|| default.into());

    check_type(json, field, &value, &expected);
    value
}

/// Keep only the requested fields of `json`.
///
/// Fields missing from `json` are skipped, so the result can be compared
/// against an expected subset of a response:
///
/// ```
/// use miia_test_utils::filter_fields;
/// use serde_json::json;
///
/// let data = json!({"score": 2.5, "max_score": 5.0, "updated_at": "2024-01-01"});
/// let expected = json!({"score": 2.5, "max_score": 5.0});
///
/// assert_eq!(filter_fields(&data, ["score", "max_score"]), expected);
/// ```
#[track_caller]
pub fn filter_fields<I, S>(json: &Value, fields: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let object = as_object(json);
    let filtered: Map<String, Value> = fields
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            object.get(name).map(|v| (name.to_string(), v.clone()))
        })
        .collect();

    Value::Object(filtered)
}

/// [`filter_fields`] using the keys of `expected` as the field list
#[track_caller]
pub fn filter_fields_like(json: &Value, expected: &Value) -> Value {
    filter_fields(json, as_object(expected).keys())
}
