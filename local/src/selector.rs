//! `where` clauses compiled into document predicates.
//!
//! A clause is a JSON object. Each key is either a combinator (`and`, `or`,
//! with or without a `$` prefix) holding a list of clauses, or a field path
//! holding a plain value (equality) or an operator object:
//!
//! ```json
//! {"role": "admin", "age": {"gte": 18, "$lt": 65}, "or": [{"team": "a"}, {"team": "b"}]}
//! ```
//!
//! Field paths may reach into nested objects with dots (`"address.city"`).

use crate::database::Document;
use crate::error::LocalError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

const OPERATORS: [&str; 10] = ["eq", "neq", "ne", "gt", "gte", "lt", "lte", "inq", "in", "nin"];

/// A compiled `where` clause
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    /// Every selector must match
    All(Vec<Selector>),
    /// At least one selector must match
    Any(Vec<Selector>),
    /// A condition on one field
    Field {
        /// Dotted path to the field
        path: String,
        /// What the field value must satisfy
        condition: Condition,
    },
}

/// A condition on a single field value
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Equal to
    Eq(Value),
    /// Not equal to (a missing field counts as not equal)
    Neq(Value),
    /// Greater than
    Gt(Value),
    /// Greater than or equal to
    Gte(Value),
    /// Less than
    Lt(Value),
    /// Less than or equal to
    Lte(Value),
    /// Equal to one of
    Inq(Vec<Value>),
    /// Equal to none of
    Nin(Vec<Value>),
}

impl Selector {
    /// Compile a `where` clause.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::InvalidSelector`] if the clause is not an
    /// object, a combinator does not hold a list, or an operator is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_store_local::selector::Selector;
    /// use serde_json::{Value, json};
    ///
    /// let adults = Selector::parse(&json!({"age": {"$gte": 18}})).unwrap();
    /// let Value::Object(person) = json!({"age": 30}) else { unreachable!() };
    ///
    /// assert!(adults.matches(&person));
    /// ```
    pub fn parse(clause: &Value) -> Result<Self, LocalError> {
        let Value::Object(map) = clause else {
            return Err(LocalError::InvalidSelector(format!(
                "expected an object, got {clause}"
            )));
        };

        let mut parts = Vec::with_capacity(map.len());
        for (key, value) in map {
            match key.strip_prefix('$').unwrap_or(key) {
                "and" => parts.push(Self::All(parse_list(key, value)?)),
                "or" => parts.push(Self::Any(parse_list(key, value)?)),
                _ => parts.extend(parse_field(key, value)?),
            }
        }

        if parts.len() == 1 {
            if let Some(only) = parts.pop() {
                return Ok(only);
            }
        }
        Ok(Self::All(parts))
    }

    /// Whether `document` satisfies this selector
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All(selectors) => selectors.iter().all(|s| s.matches(document)),
            Self::Any(selectors) => selectors.iter().any(|s| s.matches(document)),
            Self::Field { path, condition } => condition.holds(lookup(document, path)),
        }
    }
}

impl Condition {
    fn parse(operator: &str, operand: &Value) -> Result<Self, LocalError> {
        Ok(match operator.strip_prefix('$').unwrap_or(operator) {
            "eq" => Self::Eq(operand.clone()),
            "neq" | "ne" => Self::Neq(operand.clone()),
            "gt" => Self::Gt(operand.clone()),
            "gte" => Self::Gte(operand.clone()),
            "lt" => Self::Lt(operand.clone()),
            "lte" => Self::Lte(operand.clone()),
            "inq" | "in" => Self::Inq(operand_list(operator, operand)?),
            "nin" => Self::Nin(operand_list(operator, operand)?),
            _ => {
                return Err(LocalError::InvalidSelector(format!(
                    "unknown operator {operator:?}"
                )));
            },
        })
    }

    fn holds(&self, actual: Option<&Value>) -> bool {
        match self {
            Self::Eq(expected) => is_equal(actual, expected),
            Self::Neq(expected) => !is_equal(actual, expected),
            Self::Gt(bound) => matches!(compare_to(actual, bound), Some(Ordering::Greater)),
            Self::Gte(bound) => matches!(
                compare_to(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt(bound) => matches!(compare_to(actual, bound), Some(Ordering::Less)),
            Self::Lte(bound) => matches!(
                compare_to(actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Inq(options) => options.iter().any(|option| is_equal(actual, option)),
            Self::Nin(options) => !options.iter().any(|option| is_equal(actual, option)),
        }
    }
}

fn parse_list(key: &str, value: &Value) -> Result<Vec<Selector>, LocalError> {
    let Value::Array(clauses) = value else {
        return Err(LocalError::InvalidSelector(format!(
            "{key:?} expects a list of clauses"
        )));
    };
    clauses.iter().map(Selector::parse).collect()
}

fn parse_field(path: &str, value: &Value) -> Result<Vec<Selector>, LocalError> {
    let conditions = match value {
        Value::Object(operators) if is_operator_object(operators) => operators
            .iter()
            .map(|(operator, operand)| Condition::parse(operator, operand))
            .collect::<Result<Vec<_>, _>>()?,
        other => vec![Condition::Eq(other.clone())],
    };

    Ok(conditions
        .into_iter()
        .map(|condition| Selector::Field {
            path: path.to_string(),
            condition,
        })
        .collect())
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map
            .keys()
            .all(|key| key.starts_with('$') || OPERATORS.contains(&key.as_str()))
}

fn operand_list(operator: &str, operand: &Value) -> Result<Vec<Value>, LocalError> {
    match operand {
        Value::Array(values) => Ok(values.clone()),
        _ => Err(LocalError::InvalidSelector(format!(
            "{operator:?} expects a list of values"
        ))),
    }
}

/// Resolve a dotted field path.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = document.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| value.get(segment))
}

fn is_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        Some(Value::Number(a)) => match expected {
            Value::Number(b) => a.as_f64() == b.as_f64(),
            _ => false,
        },
        Some(value) => value == expected,
        None => expected.is_null(),
    }
}

fn compare_to(actual: Option<&Value>, bound: &Value) -> Option<Ordering> {
    compare_values(actual?, bound)
}

/// Order two values of the same JSON type; `None` across types.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
