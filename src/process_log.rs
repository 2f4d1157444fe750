//! Structured per-iteration solver records.
//!
//! Every solver owns a [`ProcessLog`]: an append-only sequence of uniform
//! [`Record`]s. The first appended record fixes the schema (field names and
//! their order); every later append must match it exactly. Column order for
//! tabular export is the insertion order of the first record's fields.

use nalgebra::DVector;
use thiserror::Error;

/// A single logged value: a number or a small numeric vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(DVector<f64>),
}

impl Value {
    /// Returns the scalar value, if this is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Vector(_) => None,
        }
    }

    /// Returns the vector value, if this is one.
    #[must_use]
    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(v) => Some(v),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Scalar(value as f64)
    }
}

impl From<DVector<f64>> for Value {
    fn from(value: DVector<f64>) -> Self {
        Self::Vector(value)
    }
}

/// One iteration's worth of named values, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named field, preserving insertion order.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns the field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns all fields as ordered `(name, value)` pairs.
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

/// Errors from appending to a [`ProcessLog`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Logging was not enabled when the solver was constructed.
    #[error("logging is disabled for this solver")]
    Disabled,

    /// The record's field names do not match the established schema.
    #[error("record fields {found:?} do not match the log schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// An append-only, schema-enforced iteration log owned by one solver.
#[derive(Debug, Clone, Default)]
pub struct ProcessLog {
    enabled: bool,
    schema: Option<Vec<String>>,
    rows: Vec<Record>,
}

impl ProcessLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            schema: None,
            rows: Vec::new(),
        }
    }

    /// Returns whether appends are accepted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends a record, fixing the schema on the first successful append.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Disabled`] if logging was not enabled, or
    /// [`LogError::SchemaMismatch`] if the record's field names (or their
    /// order) differ from the schema established by the first record.
    pub fn append(&mut self, record: Record) -> Result<(), LogError> {
        if !self.enabled {
            return Err(LogError::Disabled);
        }

        let names: Vec<String> = record.field_names().map(str::to_owned).collect();
        match &self.schema {
            None => self.schema = Some(names),
            Some(schema) => {
                if *schema != names {
                    return Err(LogError::SchemaMismatch {
                        expected: schema.clone(),
                        found: names,
                    });
                }
            }
        }

        self.rows.push(record);
        Ok(())
    }

    /// Returns the schema fixed by the first record, if any record was logged.
    #[must_use]
    pub fn schema(&self) -> Option<&[String]> {
        self.schema.as_deref()
    }

    /// Returns the accumulated records in append order.
    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
