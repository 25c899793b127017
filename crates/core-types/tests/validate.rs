use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use canopy_core_types::{validate, Field, Measurements, RawSubmission, ValidationError};

fn raw(value: Value) -> RawSubmission {
    serde_json::from_value(value).unwrap()
}

fn complete() -> Value {
    json!({
        "name": "OakA",
        "type": "Oak",
        "height": 12.5,
        "age": 40,
        "latitude": 45.5,
        "longitude": -73.6,
    })
}

fn without(field: &str) -> Value {
    let mut value = complete();
    value.as_object_mut().unwrap().remove(field);
    value
}

fn with(field: &str, replacement: Value) -> Value {
    let mut value = complete();
    value[field] = replacement;
    value
}

#[test]
fn complete_submission_is_normalized() {
    let submission = validate(&raw(complete())).unwrap();

    assert_eq!(submission.name.as_str(), "OakA");
    assert_eq!(submission.tree_type.as_str(), "Oak");
    assert_eq!(
        submission.measurements,
        Measurements {
            height: 12.5,
            age: 40,
            latitude: 45.5,
            longitude: -73.6,
        }
    );
}

#[test]
fn every_absent_field_is_reported() {
    let cases = [
        ("name", Field::Name),
        ("type", Field::Type),
        ("height", Field::Height),
        ("age", Field::Age),
        ("latitude", Field::Latitude),
        ("longitude", Field::Longitude),
    ];

    for (key, field) in cases {
        assert_eq!(
            validate(&raw(without(key))),
            Err(ValidationError::MissingField(field)),
            "field {key}"
        );
    }
}

#[test]
fn blank_name_is_missing() {
    assert_eq!(
        validate(&raw(with("name", json!("   ")))),
        Err(ValidationError::MissingField(Field::Name))
    );
}

#[test]
fn unparseable_numbers_are_type_mismatches() {
    let err = validate(&raw(with("height", json!("tall")))).unwrap_err();
    assert_eq!(
        err,
        ValidationError::TypeMismatch {
            field: Field::Height,
            expected: "a real number"
        }
    );

    let err = validate(&raw(with("age", json!("old")))).unwrap_err();
    assert_eq!(
        err,
        ValidationError::TypeMismatch {
            field: Field::Age,
            expected: "an integer"
        }
    );

    let err = validate(&raw(with("latitude", json!(true)))).unwrap_err();
    assert_eq!(err.field(), Field::Latitude);
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));

    let err = validate(&raw(with("type", json!(7)))).unwrap_err();
    assert_eq!(
        err,
        ValidationError::TypeMismatch {
            field: Field::Type,
            expected: "a string"
        }
    );
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases = [
        ("height", json!(0), Field::Height),
        ("height", json!(-2.0), Field::Height),
        ("age", json!(-1), Field::Age),
        ("latitude", json!(90.5), Field::Latitude),
        ("longitude", json!("-181"), Field::Longitude),
    ];

    for (key, value, field) in cases {
        let err = validate(&raw(with(key, value))).unwrap_err();
        assert!(
            matches!(err, ValidationError::OutOfRange { field: f, .. } if f == field),
            "field {key}: {err}"
        );
    }
}

#[test]
fn first_failing_field_wins() {
    let value = json!({ "type": "Oak", "height": "tall" });
    assert_eq!(
        validate(&raw(value)),
        Err(ValidationError::MissingField(Field::Name))
    );
}

#[test]
fn error_messages_name_the_field() {
    let err = validate(&raw(without("latitude"))).unwrap_err();
    assert_eq!(err.to_string(), "missing field `latitude`");
}
