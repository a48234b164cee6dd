use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::FieldMap;

/// What to do with fields that are neither expected nor ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Report them under `unexpected_parameter`.
    #[default]
    Strict,
    /// Drop them silently.
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingParameter,
    UnexpectedParameter,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingParameter => "missing_parameter",
            Self::UnexpectedParameter => "unexpected_parameter",
        }
    }
}

/// Field names grouped by error category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<ErrorKind, Vec<String>>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, kind: ErrorKind, field: impl Into<String>) {
        self.0.entry(kind).or_default().push(field.into());
    }

    pub fn get(&self, kind: ErrorKind) -> &[String] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// `{"missing_parameter": [...], "unexpected_parameter": [...]}`, only
    /// categories with at least one field appear.
    pub fn to_json(&self) -> Value {
        let map = self
            .0
            .iter()
            .map(|(kind, fields)| (kind.as_str().to_string(), Value::from(fields.clone())))
            .collect();
        Value::Object(map)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(kind, fields)| format!("{}: {}", kind.as_str(), fields.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub values: FieldMap,
    pub errors: ValidationErrors,
}

impl Validation {
    pub fn into_result(self) -> Result<FieldMap, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(self.values)
        } else {
            Err(self.errors)
        }
    }
}

/// Check decoded fields against the expected and ignored field sets.
///
/// Fields in `expected` or `ignored` are kept. Anything else is reported as
/// `unexpected_parameter` in [`ValidationMode::Strict`] and dropped otherwise.
/// Expected fields that are absent are reported as `missing_parameter`, in the
/// order `expected` lists them. All problems are collected before returning.
pub fn validate(
    fields: FieldMap,
    expected: &[&str],
    ignored: &[&str],
    mode: ValidationMode,
) -> Validation {
    let mut values = FieldMap::new();
    let mut errors = ValidationErrors::default();

    for (name, value) in fields {
        if expected.contains(&name.as_str()) || ignored.contains(&name.as_str()) {
            values.insert(name, value);
        } else if mode == ValidationMode::Strict {
            errors.push(ErrorKind::UnexpectedParameter, name);
        }
    }

    for name in expected {
        if !values.contains_key(*name) {
            errors.push(ErrorKind::MissingParameter, *name);
        }
    }

    Validation { values, errors }
}
