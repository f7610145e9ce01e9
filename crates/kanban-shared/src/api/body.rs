//! Field-by-field decoding of JSON request bodies.
//!
//! Each field is decoded on its own, so a value of the wrong type is reported
//! under that field's key instead of rejecting the payload as a whole. Keys a
//! shape does not know are ignored.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{Priority, TaskStatus};
use crate::validation::{self, ValidationErrors, NON_FIELD_ERRORS};

/// A request shape that can be read from a JSON body.
pub trait FromJson: Sized {
    fn from_json(body: Value) -> Result<Self, ValidationErrors>;
}

/// A type a single body field decodes into.
pub trait FieldValue: DeserializeOwned {
    /// The message recorded when `value` does not decode.
    fn invalid(value: &Value) -> String;
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Takes fields out of a JSON object, collecting an error per bad field.
#[derive(Debug)]
pub struct FieldReader {
    fields: Map<String, Value>,
    errors: ValidationErrors,
}

impl FieldReader {
    /// Fails unless `body` is a JSON object.
    pub fn new(body: Value) -> Result<Self, ValidationErrors> {
        match body {
            Value::Object(fields) => Ok(Self {
                fields,
                errors: ValidationErrors::new(),
            }),
            other => Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                validation::not_an_object(type_name(&other)),
            )),
        }
    }

    /// A field that may be left out but not set to `null`.
    pub fn optional<T: FieldValue>(&mut self, field: &str) -> Option<T> {
        match self.fields.remove(field)? {
            Value::Null => {
                self.errors.add(field, validation::NULL);
                None
            }
            value => self.decode(field, &value),
        }
    }

    /// A field where `null` is a value of its own: absent is `None`, `null`
    /// is `Some(None)`.
    pub fn nullable<T: FieldValue>(&mut self, field: &str) -> Option<Option<T>> {
        match self.fields.remove(field)? {
            Value::Null => Some(None),
            value => self.decode(field, &value).map(Some),
        }
    }

    fn decode<T: FieldValue>(&mut self, field: &str, value: &Value) -> Option<T> {
        match T::deserialize(value) {
            Ok(decoded) => Some(decoded),
            Err(_) => {
                self.errors.add(field, T::invalid(value));
                None
            }
        }
    }

    /// `shape` when every field decoded, otherwise the collected errors.
    pub fn finish<T>(self, shape: T) -> Result<T, ValidationErrors> {
        self.errors.into_result().map(|()| shape)
    }
}

impl FieldValue for String {
    fn invalid(_: &Value) -> String {
        validation::NOT_A_STRING.to_string()
    }
}

impl FieldValue for Uuid {
    fn invalid(value: &Value) -> String {
        match value {
            Value::String(text) => validation::invalid_pk(text),
            other => validation::incorrect_pk_type(type_name(other)),
        }
    }
}

impl FieldValue for NaiveDate {
    fn invalid(_: &Value) -> String {
        validation::INVALID_DATE.to_string()
    }
}

impl FieldValue for TaskStatus {
    fn invalid(value: &Value) -> String {
        validation::invalid_choice(value)
    }
}

impl FieldValue for Priority {
    fn invalid(value: &Value) -> String {
        validation::invalid_choice(value)
    }
}

impl FieldValue for Vec<Uuid> {
    fn invalid(value: &Value) -> String {
        let Value::Array(items) = value else {
            return validation::not_a_list(type_name(value));
        };
        // Report the first id that fails.
        items
            .iter()
            .find(|item| Uuid::deserialize(*item).is_err())
            .map_or_else(
                || validation::not_a_list(type_name(value)),
                <Uuid as FieldValue>::invalid,
            )
    }
}
