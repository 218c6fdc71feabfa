// src/schema/mod.rs

//! Declarative shape checks for output artifacts.
//!
//! A [`Shape`] describes what a JSON value must look like. [`validate`] walks
//! the value and collects every mismatch instead of stopping at the first.

pub mod catalog;

use std::fmt;

use serde_json::Value;

/// Expected structure of a JSON value.
#[derive(Debug, Clone)]
pub enum Shape {
    Str,
    /// Any JSON number
    Number,
    /// A number with no fractional part
    Integer,
    Bool,
    /// Anything, including null
    Any,
    /// A string drawn from a fixed set
    OneOf(&'static [&'static str]),
    Nullable(Box<Shape>),
    List(Box<Shape>),
    /// Object with arbitrary keys and uniform values
    Map(Box<Shape>),
    Record(Vec<Field>),
    /// Resolved lazily, for recursive shapes
    Deferred(fn() -> Shape),
}

impl Shape {
    pub fn nullable(inner: Shape) -> Self {
        Shape::Nullable(Box::new(inner))
    }

    pub fn list(inner: Shape) -> Self {
        Shape::List(Box::new(inner))
    }

    pub fn map(inner: Shape) -> Self {
        Shape::Map(Box::new(inner))
    }

    pub fn record(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Record(fields.into_iter().collect())
    }

    fn describe(&self) -> String {
        match self {
            Shape::Str => "a string".into(),
            Shape::Number => "a number".into(),
            Shape::Integer => "an integer".into(),
            Shape::Bool => "a boolean".into(),
            Shape::Any => "any value".into(),
            Shape::OneOf(options) => format!("one of {}", options.join(", ")),
            Shape::Nullable(inner) => format!("{} or null", inner.describe()),
            Shape::List(_) => "an array".into(),
            Shape::Map(_) | Shape::Record(_) => "an object".into(),
            Shape::Deferred(resolve) => resolve().describe(),
        }
    }
}

/// One named member of a [`Shape::Record`].
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: true,
        }
    }

    /// May be absent; when present it must match `shape`.
    pub fn optional(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
        }
    }
}

/// A single field that does not match its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub artifact: String,
    /// Location such as `root.children[3].value`
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.artifact, self.path, self.message)
    }
}

/// Check `value` against `shape`, returning every violation found.
pub fn validate(artifact: &str, shape: &Shape, value: &Value) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    walk(shape, value, "root", &mut |path, message| {
        violations.push(SchemaViolation {
            artifact: artifact.to_string(),
            path: path.to_string(),
            message,
        });
    });
    violations
}

fn walk(shape: &Shape, value: &Value, path: &str, report: &mut dyn FnMut(&str, String)) {
    let mismatch = || format!("expected {}, found {}", shape.describe(), kind(value));

    match shape {
        Shape::Any => {}
        Shape::Str => {
            if !value.is_string() {
                report(path, mismatch());
            }
        }
        Shape::Number => {
            if !value.is_number() {
                report(path, mismatch());
            }
        }
        Shape::Integer => {
            let integral = value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|n| n.fract() == 0.0);
            if !integral {
                report(path, mismatch());
            }
        }
        Shape::Bool => {
            if !value.is_boolean() {
                report(path, mismatch());
            }
        }
        Shape::OneOf(options) => match value.as_str() {
            Some(s) if options.contains(&s) => {}
            _ => report(path, mismatch()),
        },
        Shape::Nullable(inner) => {
            if !value.is_null() {
                walk(inner, value, path, report);
            }
        }
        Shape::List(item) => match value.as_array() {
            Some(items) => {
                for (i, element) in items.iter().enumerate() {
                    walk(item, element, &format!("{path}[{i}]"), report);
                }
            }
            None => report(path, mismatch()),
        },
        Shape::Map(item) => match value.as_object() {
            Some(entries) => {
                for (key, element) in entries {
                    walk(item, element, &format!("{path}.{key}"), report);
                }
            }
            None => report(path, mismatch()),
        },
        Shape::Record(fields) => match value.as_object() {
            Some(object) => {
                for field in fields {
                    let field_path = format!("{path}.{}", field.name);
                    match object.get(field.name) {
                        Some(member) => walk(&field.shape, member, &field_path, report),
                        None if field.required => {
                            report(&field_path, "required field is missing".into())
                        }
                        None => {}
                    }
                }
            }
            None => report(path, mismatch()),
        },
        Shape::Deferred(resolve) => walk(&resolve(), value, path, report),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
