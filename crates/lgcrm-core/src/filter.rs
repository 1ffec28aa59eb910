// ABOUTME: Filter predicates for record queries: equality and negated set membership.
// ABOUTME: Includes the lenient parser for tuple literals such as ("Perdido","Cierre").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parse a parenthesized, comma-separated tuple literal into its elements.
///
/// Strips one leading `(` and one trailing `)`, splits on `,`, trims
/// whitespace and one layer of `"` or `'` quotes from each element, and
/// drops elements left empty. Malformed input never fails; whatever remains
/// after trimming is returned.
pub fn parse_tuple_literal(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('(').unwrap_or(trimmed);
    let inner = inner.strip_suffix(')').unwrap_or(inner);

    inner
        .split(',')
        .map(|element| strip_quotes(element.trim()))
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect()
}

const QUOTES: [char; 2] = ['"', '\''];

fn strip_quotes(element: &str) -> &str {
    let out = element.strip_prefix(QUOTES).unwrap_or(element);
    out.strip_suffix(QUOTES).unwrap_or(out)
}

/// Textual rendering of a field value for set-membership comparison.
/// Strings render bare and null as `null`. Arrays join their elements with
/// `,` (null elements render empty), so `["Piscina","Bar"]` reads as
/// `Piscina,Bar`. Everything else renders as its JSON text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Strict equality between two field values. Numbers compare by numeric
/// value so that `2000` and `2000.0` are equal; null only equals null.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

/// The value list of a `not_in` filter, given either as a list or as a
/// tuple literal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotInValues(Vec<String>);

impl NotInValues {
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for NotInValues {
    fn from(raw: &str) -> Self {
        Self(parse_tuple_literal(raw))
    }
}

impl From<String> for NotInValues {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Vec<String>> for NotInValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for NotInValues {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for NotInValues {
    fn from(values: [&str; N]) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

/// One predicate accumulated on a query builder. Filters on the same
/// builder combine with logical AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { field: String, value: Value },
    NotIn { field: String, values: Vec<String> },
}

impl Filter {
    /// Evaluate against a record's field map. Absent fields read as null.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Filter::Eq { field, value } => {
                values_equal(fields.get(field).unwrap_or(&Value::Null), value)
            }
            Filter::NotIn { field, values } => {
                let text = value_text(fields.get(field).unwrap_or(&Value::Null));
                !values.iter().any(|v| *v == text)
            }
        }
    }
}

/// True when every filter matches (vacuously true for no filters).
pub fn matches_all(filters: &[Filter], fields: &Map<String, Value>) -> bool {
    filters.iter().all(|f| f.matches(fields))
}
