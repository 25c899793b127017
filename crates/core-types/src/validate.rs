//! Normalization and type-checking of incoming submissions.
//!
//! Numeric fields may arrive either as JSON numbers or as strings holding a
//! number, eg. `"12.5"`. Validation is a pure function of its input.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Measurements, Submission, TreeName, TreeType};

/// A submission as received, before any field has been checked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub name: Option<Value>,

    #[serde(default, rename = "type")]
    pub tree_type: Option<Value>,

    #[serde(default)]
    pub height: Option<Value>,

    #[serde(default)]
    pub age: Option<Value>,

    #[serde(default)]
    pub latitude: Option<Value>,

    #[serde(default)]
    pub longitude: Option<Value>,
}

/// The fields of a submission, in the order they are validated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    Type,
    Height,
    Age,
    Latitude,
    Longitude,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Type => "type",
            Field::Height => "height",
            Field::Age => "age",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing field `{0}`")]
    MissingField(Field),

    #[error("field `{field}` must be {expected}")]
    TypeMismatch {
        field: Field,
        expected: &'static str,
    },

    #[error("field `{field}` is out of range: {reason}")]
    OutOfRange { field: Field, reason: &'static str },
}

impl ValidationError {
    /// The field which failed validation.
    pub fn field(&self) -> Field {
        match self {
            Self::MissingField(field) => *field,
            Self::TypeMismatch { field, .. } => *field,
            Self::OutOfRange { field, .. } => *field,
        }
    }
}

/// Check every field of `raw`, reporting the first failure.
pub fn validate(raw: &RawSubmission) -> Result<Submission, ValidationError> {
    let name = text(Field::Name, raw.name.as_ref())?;
    let tree_type = text(Field::Type, raw.tree_type.as_ref())?;

    let height = real(Field::Height, raw.height.as_ref())?;
    if height <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field: Field::Height,
            reason: "must be positive",
        });
    }

    let age = integer(Field::Age, raw.age.as_ref())?;

    let latitude = real(Field::Latitude, raw.latitude.as_ref())?;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::OutOfRange {
            field: Field::Latitude,
            reason: "must be within [-90, 90]",
        });
    }

    let longitude = real(Field::Longitude, raw.longitude.as_ref())?;
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::OutOfRange {
            field: Field::Longitude,
            reason: "must be within [-180, 180]",
        });
    }

    Ok(Submission {
        name: TreeName::new(name),
        tree_type: TreeType::new(tree_type),
        measurements: Measurements {
            height,
            age,
            latitude,
            longitude,
        },
    })
}

fn present(field: Field, value: Option<&Value>) -> Result<&Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn text(field: Field, value: Option<&Value>) -> Result<String, ValidationError> {
    match present(field, value)? {
        Value::String(s) if s.trim().is_empty() => Err(ValidationError::MissingField(field)),
        Value::String(s) => Ok(s.trim().to_string()),
        _ => Err(ValidationError::TypeMismatch {
            field,
            expected: "a string",
        }),
    }
}

fn real(field: Field, value: Option<&Value>) -> Result<f64, ValidationError> {
    let mismatch = ValidationError::TypeMismatch {
        field,
        expected: "a real number",
    };

    let real = match present(field, value)? {
        Value::Number(n) => n.as_f64().ok_or(mismatch)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| mismatch)?,
        _ => return Err(mismatch),
    };

    if !real.is_finite() {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must be finite",
        });
    }

    Ok(real)
}

fn integer(field: Field, value: Option<&Value>) -> Result<u32, ValidationError> {
    let mismatch = ValidationError::TypeMismatch {
        field,
        expected: "an integer",
    };

    let integer: i128 = match present(field, value)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i128::from(i)
            } else if let Some(u) = n.as_u64() {
                i128::from(u)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e18 => f as i128,
                    _ => return Err(mismatch),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| mismatch)?,
        _ => return Err(mismatch),
    };

    if integer < 0 {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must not be negative",
        });
    }

    u32::try_from(integer).map_err(|_| ValidationError::OutOfRange {
        field,
        reason: "is too large",
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let submission = validate(&raw(json!({
            "name": " OakA ",
            "type": "Oak",
            "height": "12.5",
            "age": 40,
            "latitude": 45.5,
            "longitude": "-73.6",
        })))
        .unwrap();

        assert_eq!(submission.name.as_str(), "OakA");
        assert_eq!(submission.tree_type.as_str(), "Oak");
        assert_eq!(submission.measurements.height, 12.5);
        assert_eq!(submission.measurements.age, 40);
        assert_eq!(submission.measurements.longitude, -73.6);
    }

    #[test]
    fn whole_float_is_an_integer() {
        assert_eq!(integer(Field::Age, Some(&json!(12.0))), Ok(12));
        assert_eq!(
            integer(Field::Age, Some(&json!(3.5))),
            Err(ValidationError::TypeMismatch {
                field: Field::Age,
                expected: "an integer"
            })
        );
    }

    #[test]
    fn null_is_missing() {
        assert_eq!(
            text(Field::Name, Some(&Value::Null)),
            Err(ValidationError::MissingField(Field::Name))
        );
    }

    #[test]
    fn non_finite_is_out_of_range() {
        let err = real(Field::Height, Some(&json!("NaN"))).unwrap_err();
        assert_eq!(err.field(), Field::Height);
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }
}
