//! Value Box
//!
//! Every variable's value is stored as a [`Value`]: a closed set of variants,
//! each holding exactly one concrete value. Reading it back as a Rust type
//! goes through [`FromValue`], which checks the variant and reports a
//! [`ValueError::TypeMismatch`] instead of reinterpreting anything.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

/// The variant tag of a [`Value`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Float,
    Text,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::List => "list",
        };
        f.write_str(name)
    }
}

/// Errors from reading a [`Value`] as a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The stored variant is not the one the caller asked for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },
}

impl Value {
    /// The variant tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::List(_) => ValueKind::List,
        }
    }

    /// Convert to `T`, failing if the stored variant does not match.
    pub fn get<T: FromValue>(&self) -> Result<T, ValueError> {
        T::from_value(self)
    }

    /// Borrow the text, if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Types that can be read out of a [`Value`].
pub trait FromValue: Sized {
    /// The variant this type is stored as.
    const KIND: ValueKind;

    /// Extract `Self`, or report which variant was found instead.
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

fn mismatch<T: FromValue>(value: &Value) -> ValueError {
    ValueError::TypeMismatch {
        expected: T::KIND,
        found: value.kind(),
    }
}

macro_rules! impl_value_conversions {
    ($ty:ty, $variant:ident) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: &Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v.clone()),
                    other => Err(mismatch::<Self>(other)),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_value_conversions!(bool, Bool);
impl_value_conversions!(i64, Int);
impl_value_conversions!(u64, UInt);
impl_value_conversions!(f64, Float);
impl_value_conversions!(String, Text);
impl_value_conversions!(Vec<Value>, List);

// Widening conversions into the box. Reading back uses the stored width.

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(u64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}
