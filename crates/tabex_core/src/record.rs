use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::projection::{self, TabularProjection};

/// Scalar type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Integer,
    Decimal,
    Text,
}

impl ScalarType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }
}

/// Name and type of one exported column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ScalarType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Decimal)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Text)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Null,
}

impl Value {
    /// Scalar type of the value, `None` for `Null`.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Self::Integer(_) => Some(ScalarType::Integer),
            Self::Decimal(_) => Some(ScalarType::Decimal),
            Self::Text(_) => Some(ScalarType::Text),
            Self::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Null displays as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Null => Ok(()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A type whose values can be exported as table rows.
///
/// `columns` lists the fields in declaration order and `values` must return
/// one value per column in that same order.
pub trait Record {
    /// Used for archive entry names and sheet names.
    const TYPE_NAME: &'static str;

    fn columns() -> Vec<ColumnDescriptor>;

    fn values(&self) -> Vec<Value>;
}

/// Type-erased, shareable collection of records of a single type.
pub trait RecordSet {
    fn type_name(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Projects the records into columns and rows.
    fn project(&self) -> Result<TabularProjection>;
}

impl<R: Record> RecordSet for Vec<R> {
    fn type_name(&self) -> &str {
        R::TYPE_NAME
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn project(&self) -> Result<TabularProjection> {
        projection::project_records(self)
    }
}
