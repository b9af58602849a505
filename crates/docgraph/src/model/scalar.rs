//! Scalar conversion rules.
//!
//! Scalars are stored by value under their field name. Identifiers and
//! timestamps are converted explicitly (hyphenated string and RFC 3339
//! string); every other type passes through as its natural JSON value.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Semantic type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Boolean.
    Bool,
    /// Signed or unsigned integer.
    Int,
    /// Floating point number.
    Float,
    /// UTF-8 string.
    String,
    /// Unique identifier.
    Uuid,
    /// Timestamp.
    Timestamp,
    /// Arbitrary JSON value.
    Json,
    /// Nullable value of the inner type.
    Optional(&'static ScalarType),
    /// Array of the inner type.
    Array(&'static ScalarType),
}

/// A value stored by value in a document.
pub trait Scalar: Sized + Send + Sync + 'static {
    /// Semantic type, reported in field descriptors.
    const TYPE: ScalarType;

    /// Encode as a wire value. Fails for values JSON cannot represent.
    fn to_wire(&self) -> Result<Value, String>;

    /// Decode a wire value. Absent keys are decoded from `null`.
    fn from_wire(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {}, found {}", expected, value)
}

impl Scalar for bool {
    const TYPE: ScalarType = ScalarType::Bool;

    fn to_wire(&self) -> Result<Value, String> {
        Ok(Value::Bool(*self))
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        value.as_bool().ok_or_else(|| mismatch("a boolean", value))
    }
}

macro_rules! signed_scalar {
    ($($ty:ty),*) => {$(
        impl Scalar for $ty {
            const TYPE: ScalarType = ScalarType::Int;

            fn to_wire(&self) -> Result<Value, String> {
                Ok(Value::from(*self))
            }

            fn from_wire(value: &Value) -> Result<Self, String> {
                value
                    .as_i64()
                    .and_then(|n| <$ty>::try_from(n).ok())
                    .ok_or_else(|| mismatch(stringify!($ty), value))
            }
        }
    )*};
}

macro_rules! unsigned_scalar {
    ($($ty:ty),*) => {$(
        impl Scalar for $ty {
            const TYPE: ScalarType = ScalarType::Int;

            fn to_wire(&self) -> Result<Value, String> {
                Ok(Value::from(*self))
            }

            fn from_wire(value: &Value) -> Result<Self, String> {
                value
                    .as_u64()
                    .and_then(|n| <$ty>::try_from(n).ok())
                    .ok_or_else(|| mismatch(stringify!($ty), value))
            }
        }
    )*};
}

signed_scalar!(i8, i16, i32, i64);
unsigned_scalar!(u8, u16, u32, u64);

/// Finite floats only: JSON has no encoding for NaN or the infinities.
fn float_to_wire(value: f64) -> Result<Value, String> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| format!("{} has no JSON representation", value))
}

impl Scalar for f64 {
    const TYPE: ScalarType = ScalarType::Float;

    fn to_wire(&self) -> Result<Value, String> {
        float_to_wire(*self)
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        value.as_f64().ok_or_else(|| mismatch("a number", value))
    }
}

impl Scalar for f32 {
    const TYPE: ScalarType = ScalarType::Float;

    fn to_wire(&self) -> Result<Value, String> {
        float_to_wire(f64::from(*self))
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        value
            .as_f64()
            .map(|n| n as f32)
            .ok_or_else(|| mismatch("a number", value))
    }
}

impl Scalar for String {
    const TYPE: ScalarType = ScalarType::String;

    fn to_wire(&self) -> Result<Value, String> {
        Ok(Value::String(self.clone()))
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("a string", value))
    }
}

impl Scalar for Uuid {
    const TYPE: ScalarType = ScalarType::Uuid;

    fn to_wire(&self) -> Result<Value, String> {
        Ok(Value::String(self.hyphenated().to_string()))
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        let text = value
            .as_str()
            .ok_or_else(|| mismatch("an identifier string", value))?;
        Uuid::parse_str(text).map_err(|e| format!("invalid identifier `{}`: {}", text, e))
    }
}

impl Scalar for DateTime<Utc> {
    const TYPE: ScalarType = ScalarType::Timestamp;

    fn to_wire(&self) -> Result<Value, String> {
        Ok(Value::String(self.to_rfc3339()))
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        let text = value
            .as_str()
            .ok_or_else(|| mismatch("a timestamp string", value))?;
        DateTime::parse_from_rfc3339(text)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| format!("invalid timestamp `{}`: {}", text, e))
    }
}

impl Scalar for Value {
    const TYPE: ScalarType = ScalarType::Json;

    fn to_wire(&self) -> Result<Value, String> {
        Ok(self.clone())
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl<T: Scalar> Scalar for Option<T> {
    const TYPE: ScalarType = ScalarType::Optional(&T::TYPE);

    fn to_wire(&self) -> Result<Value, String> {
        match self {
            Some(value) => value.to_wire(),
            None => Ok(Value::Null),
        }
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            value => T::from_wire(value).map(Some),
        }
    }
}

impl<T: Scalar> Scalar for Vec<T> {
    const TYPE: ScalarType = ScalarType::Array(&T::TYPE);

    fn to_wire(&self) -> Result<Value, String> {
        self.iter()
            .map(Scalar::to_wire)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn from_wire(value: &Value) -> Result<Self, String> {
        value
            .as_array()
            .ok_or_else(|| mismatch("an array", value))?
            .iter()
            .map(T::from_wire)
            .collect()
    }
}
