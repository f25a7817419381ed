//! Rich query selectors
//!
//! A query is a JSON object `{"selector": {...}, "limit": n}` in the style of
//! CouchDB Mango queries. Supported selector forms:
//!
//! - `{"field": value}` implicit equality
//! - `{"field": {"$op": operand, ...}}` with `$eq $ne $gt $gte $lt $lte
//!   $in $nin $exists`
//! - `{"$and": [...]}`, `{"$or": [...]}`, `{"$not": {...}}`
//! - dotted paths (`"a.b"`) address nested fields
//!
//! Every operator except `$exists` requires the field to be present. Ordered
//! comparisons only match operands of the same JSON type.

use crate::{Error, Result};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Parsed rich query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Document predicate
    pub selector: Selector,
    /// Maximum number of results, if any
    pub limit: Option<usize>,
}

impl Query {
    /// Parse a query string
    pub fn parse(query: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(query)
            .map_err(|e| Error::InvalidQuery(format!("query is not valid JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidQuery("query must be a JSON object".to_string()))?;

        let selector = object
            .get("selector")
            .ok_or_else(|| Error::InvalidQuery("query has no selector".to_string()))
            .and_then(Selector::parse)?;

        let limit = match object.get("limit") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .ok_or_else(|| Error::InvalidQuery("limit must be a non-negative integer".to_string()))?
                    as usize,
            ),
        };

        Ok(Self { selector, limit })
    }
}

/// Document predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// All sub-selectors match (`$and`, or several keys in one object)
    And(Vec<Selector>),
    /// At least one sub-selector matches
    Or(Vec<Selector>),
    /// Sub-selector does not match
    Not(Box<Selector>),
    /// Condition on a single field
    Field {
        /// Dotted path split into segments
        path: Vec<String>,
        /// Condition on the field value
        condition: Condition,
    },
}

/// Condition on one field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equal to
    Eq(Value),
    /// Not equal to
    Ne(Value),
    /// Greater than
    Gt(Value),
    /// Greater than or equal
    Gte(Value),
    /// Less than
    Lt(Value),
    /// Less than or equal
    Lte(Value),
    /// One of
    In(Vec<Value>),
    /// None of
    Nin(Vec<Value>),
    /// Field presence
    Exists(bool),
    /// Conjunction of conditions on the same field
    All(Vec<Condition>),
}

impl Selector {
    /// Parse a selector object
    pub fn parse(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidQuery("selector must be a JSON object".to_string()))?;

        let mut clauses = Vec::with_capacity(object.len());
        for (key, operand) in object {
            clauses.push(match key.as_str() {
                "$and" => Selector::And(Self::parse_list(key, operand)?),
                "$or" => Selector::Or(Self::parse_list(key, operand)?),
                "$not" => Selector::Not(Box::new(Self::parse(operand)?)),
                op if op.starts_with('$') => {
                    return Err(Error::InvalidQuery(format!("unsupported combinator {}", op)))
                }
                field => Selector::Field {
                    path: field.split('.').map(str::to_string).collect(),
                    condition: Condition::parse(operand)?,
                },
            });
        }

        Ok(match clauses.len() {
            1 => clauses.remove(0),
            _ => Selector::And(clauses),
        })
    }

    fn parse_list(op: &str, operand: &Value) -> Result<Vec<Selector>> {
        operand
            .as_array()
            .ok_or_else(|| Error::InvalidQuery(format!("{} expects an array", op)))?
            .iter()
            .map(Self::parse)
            .collect()
    }

    /// Evaluate against a document
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Selector::And(all) => all.iter().all(|s| s.matches(document)),
            Selector::Or(any) => any.iter().any(|s| s.matches(document)),
            Selector::Not(inner) => !inner.matches(document),
            Selector::Field { path, condition } => condition.matches(lookup(document, path)),
        }
    }
}

impl Condition {
    fn parse(operand: &Value) -> Result<Self> {
        let operators = match operand {
            Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => map,
            literal => return Ok(Condition::Eq(literal.clone())),
        };

        let mut conditions = operators
            .iter()
            .map(|(op, arg)| Self::parse_operator(op, arg))
            .collect::<Result<Vec<_>>>()?;

        Ok(match conditions.len() {
            1 => conditions.remove(0),
            _ => Condition::All(conditions),
        })
    }

    fn parse_operator(op: &str, arg: &Value) -> Result<Self> {
        let list = |arg: &Value| -> Result<Vec<Value>> {
            arg.as_array()
                .cloned()
                .ok_or_else(|| Error::InvalidQuery(format!("{} expects an array", op)))
        };

        Ok(match op {
            "$eq" => Condition::Eq(arg.clone()),
            "$ne" => Condition::Ne(arg.clone()),
            "$gt" => Condition::Gt(arg.clone()),
            "$gte" => Condition::Gte(arg.clone()),
            "$lt" => Condition::Lt(arg.clone()),
            "$lte" => Condition::Lte(arg.clone()),
            "$in" => Condition::In(list(arg)?),
            "$nin" => Condition::Nin(list(arg)?),
            "$exists" => Condition::Exists(
                arg.as_bool()
                    .ok_or_else(|| Error::InvalidQuery("$exists expects a boolean".to_string()))?,
            ),
            other => return Err(Error::InvalidQuery(format!("unsupported operator {}", other))),
        })
    }

    fn matches(&self, field: Option<&Value>) -> bool {
        if let Condition::Exists(expected) = self {
            return field.is_some() == *expected;
        }
        if let Condition::All(all) = self {
            return all.iter().all(|c| c.matches(field));
        }

        let Some(value) = field else {
            return false;
        };

        match self {
            Condition::Eq(expected) => json_eq(value, expected),
            Condition::Ne(expected) => !json_eq(value, expected),
            Condition::Gt(bound) => compare(value, bound) == Some(Ordering::Greater),
            Condition::Gte(bound) => matches!(
                compare(value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lt(bound) => compare(value, bound) == Some(Ordering::Less),
            Condition::Lte(bound) => {
                matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
            }
            Condition::In(options) => options.iter().any(|o| json_eq(value, o)),
            Condition::Nin(options) => !options.iter().any(|o| json_eq(value, o)),
            Condition::Exists(_) | Condition::All(_) => unreachable!("handled above"),
        }
    }
}

fn lookup<'v>(document: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter()
        .try_fold(document, |node, segment| node.as_object()?.get(segment))
}

/// JSON equality with numbers compared by value (`1 == 1.0`)
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => objects_eq(x, y),
        _ => a == b,
    }
}

fn objects_eq(x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
    x.len() == y.len()
        && x.iter()
            .all(|(k, v)| y.get(k).map_or(false, |other| json_eq(v, other)))
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
