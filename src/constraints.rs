//! Maps field validation expressions onto schema constraints.
//!
//! A validation expression is a comma-separated list of clauses such as
//! `required,min=2,max=10`. `min`/`max` mean a length for strings, an item
//! count for arrays and a numeric bound for everything else.
//!
//! | clause | string | array | numeric / other |
//! |---|---|---|---|
//! | `required` | required | required | required |
//! | `min=N` | `minLength` | `minItems` | `minimum` |
//! | `max=N` | `maxLength` | `maxItems` | `maximum` |
//! | `len=N` | both lengths | both counts | both bounds |
//! | `oneof=a b` | `enum` | `enum` | `enum` |
//! | `email`, `uuid`, `url`, `uri`, `datetime` | `format` | - | - |

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::error::{Error, Result};
use crate::schema_generator::Schema;
use log::debug;
use serde_json::Value;

/// How `min`/`max` clauses are interpreted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    String,
    Sequence,
    Numeric,
    Other,
}

impl From<&FieldKind> for ConstraintKind {
    fn from(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::String => ConstraintKind::String,
            FieldKind::Array(_) => ConstraintKind::Sequence,
            FieldKind::Integer | FieldKind::Number => ConstraintKind::Numeric,
            FieldKind::Boolean | FieldKind::Object(_) => ConstraintKind::Other,
        }
    }
}

/// A single schema refinement produced by a validation clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaConstraint {
    Required,
    MinLength(u64),
    MaxLength(u64),
    MinItems(u64),
    MaxItems(u64),
    Minimum(f64),
    Maximum(f64),
    Enum(Vec<Value>),
    Format(&'static str),
}

#[derive(Clone, Copy)]
enum Direction {
    Min,
    Max,
}

/// Parse a validation expression for a field of the given kind.
///
/// # Errors
///
/// Returns [`Error::SchemaConstraint`] naming the field and clause when a
/// bound is not a valid integer (lengths, counts) or number (numeric bounds),
/// or when `oneof` lists no values.
pub fn parse_validation(
    field: &str,
    kind: ConstraintKind,
    expression: &str,
) -> Result<Vec<SchemaConstraint>> {
    let mut constraints = Vec::new();

    for clause in expression.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (name, value) = match clause.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (clause, None),
        };

        match (name, value) {
            ("required", None) => constraints.push(SchemaConstraint::Required),
            ("min", Some(value)) => {
                constraints.push(bound(field, clause, kind, Direction::Min, value)?)
            }
            ("max", Some(value)) => {
                constraints.push(bound(field, clause, kind, Direction::Max, value)?)
            }
            ("len", Some(value)) => {
                constraints.push(bound(field, clause, kind, Direction::Min, value)?);
                constraints.push(bound(field, clause, kind, Direction::Max, value)?);
            }
            ("oneof", Some(value)) => {
                let values: Vec<_> = value
                    .split_whitespace()
                    .map(|v| enum_value(kind, v))
                    .collect();
                if values.is_empty() {
                    return Err(malformed(field, clause, "missing value"));
                }
                constraints.push(SchemaConstraint::Enum(values));
            }
            ("email", None) if kind == ConstraintKind::String => {
                constraints.push(SchemaConstraint::Format("email"))
            }
            ("uuid", None) if kind == ConstraintKind::String => {
                constraints.push(SchemaConstraint::Format("uuid"))
            }
            ("url" | "uri", None) if kind == ConstraintKind::String => {
                constraints.push(SchemaConstraint::Format("uri"))
            }
            ("datetime", _) if kind == ConstraintKind::String => {
                constraints.push(SchemaConstraint::Format("date-time"))
            }
            ("min" | "max" | "len" | "oneof", None) => {
                return Err(malformed(field, clause, "missing value"));
            }
            _ => debug!("Ignoring validation clause `{}` on {}", clause, field),
        }
    }

    Ok(constraints)
}

fn bound(
    field: &str,
    clause: &str,
    kind: ConstraintKind,
    direction: Direction,
    value: &str,
) -> Result<SchemaConstraint> {
    match kind {
        ConstraintKind::String | ConstraintKind::Sequence => {
            let n = value
                .parse::<u64>()
                .map_err(|_| malformed(field, clause, "expected a non-negative integer"))?;
            Ok(match (kind, direction) {
                (ConstraintKind::String, Direction::Min) => SchemaConstraint::MinLength(n),
                (ConstraintKind::String, Direction::Max) => SchemaConstraint::MaxLength(n),
                (_, Direction::Min) => SchemaConstraint::MinItems(n),
                (_, Direction::Max) => SchemaConstraint::MaxItems(n),
            })
        }
        ConstraintKind::Numeric | ConstraintKind::Other => {
            let n = value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| malformed(field, clause, "expected a number"))?;
            Ok(match direction {
                Direction::Min => SchemaConstraint::Minimum(n),
                Direction::Max => SchemaConstraint::Maximum(n),
            })
        }
    }
}

fn enum_value(kind: ConstraintKind, raw: &str) -> Value {
    if kind == ConstraintKind::Numeric {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::from(n);
        }
        if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

fn malformed(field: &str, clause: &str, reason: &str) -> Error {
    Error::SchemaConstraint {
        field: field.to_string(),
        clause: clause.to_string(),
        reason: reason.to_string(),
    }
}

/// Apply a field's validation expression to its schema node.
///
/// `required` clauses add the field name to `required`, the enclosing
/// schema's required-field list. Returns whether the field is required.
pub fn apply_constraints(
    field: &FieldDescriptor,
    schema: &mut Schema,
    required: &mut Vec<String>,
) -> Result<bool> {
    let constraints = parse_validation(&field.name, ConstraintKind::from(&field.kind), &field.validate)?;
    let mut is_required = false;

    for constraint in constraints {
        match constraint {
            SchemaConstraint::Required => {
                is_required = true;
                if !required.contains(&field.name) {
                    required.push(field.name.clone());
                }
            }
            SchemaConstraint::MinLength(n) => schema.min_length = Some(n),
            SchemaConstraint::MaxLength(n) => schema.max_length = Some(n),
            SchemaConstraint::MinItems(n) => schema.min_items = Some(n),
            SchemaConstraint::MaxItems(n) => schema.max_items = Some(n),
            SchemaConstraint::Minimum(n) => schema.minimum = Some(n),
            SchemaConstraint::Maximum(n) => schema.maximum = Some(n),
            SchemaConstraint::Enum(values) => schema.enum_values = Some(values),
            SchemaConstraint::Format(format) => schema.format = Some(format.to_string()),
        }
    }

    Ok(is_required)
}
