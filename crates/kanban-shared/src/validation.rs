//! Field-level and cross-field validation.
//!
//! Errors are collected per field into [`ValidationErrors`] so a client sees
//! every problem with a payload at once. Nothing here touches storage; checks
//! that need a lookup (duplicate email, unknown user ids) are performed by the
//! caller, which then adds to the same error map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::{EmailCheckQuery, LoginRequest, RegistrationRequest};
use crate::models::{split_full_name, Board};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";
pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const INVALID_DATE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const EMAIL_MISSING: &str = "Email address is missing.";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const EMAIL_TAKEN: &str = "Email already exists.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const MISSING_CREDENTIALS: &str = "Both \"email\" and \"password\" fields are required.";
pub const BOARD_CHANGE: &str = "Changing board is not allowed.";
pub const NOT_A_PARTICIPANT: &str = "User is not a member of this board.";

pub const TITLE_MAX_CHARS: usize = 100;

/// Field name to messages. Serializes as a plain JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn invalid_pk(id: impl fmt::Display) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

pub fn incorrect_pk_type(received: &str) -> String {
    format!("Incorrect type. Expected pk value, received {received}.")
}

pub fn invalid_choice(value: &Value) -> String {
    match value {
        Value::String(text) => format!("\"{text}\" is not a valid choice."),
        other => format!("\"{other}\" is not a valid choice."),
    }
}

pub fn not_a_list(received: &str) -> String {
    format!("Expected a list of items but got type \"{received}\".")
}

pub fn not_an_object(received: &str) -> String {
    format!("Invalid data. Expected a dictionary, but got {received}.")
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Required, non-blank text. Records an error and returns `None` otherwise.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(text) if text.trim().is_empty() => {
            errors.add(field, BLANK);
            None
        }
        Some(text) => Some(text),
    }
}

/// Board and task titles: non-blank and at most [`TITLE_MAX_CHARS`] characters.
/// `None` is accepted when the title is not required (partial updates).
pub fn title(
    errors: &mut ValidationErrors,
    value: Option<String>,
    required: bool,
) -> Option<String> {
    if value.is_none() && !required {
        return None;
    }
    let title = required_text(errors, "title", value)?;
    if title.chars().count() > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
        );
        return None;
    }
    Some(title)
}

/// A registration payload that passed every check that needs no lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub fn registration(req: RegistrationRequest) -> Result<NewAccount, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let fullname = required_text(&mut errors, "fullname", req.fullname);
    let email = required_text(&mut errors, "email", req.email).map(|e| e.trim().to_string());
    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.add("email", INVALID_EMAIL);
        }
    }
    let password = required_text(&mut errors, "password", req.password);
    let repeated = required_text(&mut errors, "repeated_password", req.repeated_password);

    if let (Some(password), Some(repeated)) = (&password, &repeated) {
        if password != repeated {
            errors.add("repeated_password", PASSWORD_MISMATCH);
        }
    }

    match (fullname, email, password) {
        (Some(fullname), Some(email), Some(password)) if errors.is_empty() => {
            let (first_name, last_name) = split_full_name(&fullname);
            Ok(NewAccount {
                email,
                first_name,
                last_name,
                password,
            })
        }
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login only checks presence. Every failure, here or later during the
/// credential check, lands under `non_field_errors`.
pub fn login(req: LoginRequest) -> Result<Credentials, ValidationErrors> {
    match (req.email, req.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            Ok(Credentials {
                email: email.trim().to_string(),
                password,
            })
        }
        _ => Err(ValidationErrors::single(NON_FIELD_ERRORS, MISSING_CREDENTIALS)),
    }
}

/// The address to look up for an email check: present, non-blank and well formed.
pub fn email_check(query: EmailCheckQuery) -> Result<String, ValidationErrors> {
    let email = query.email.map(|e| e.trim().to_string()).unwrap_or_default();
    if email.is_empty() {
        return Err(ValidationErrors::single("email", EMAIL_MISSING));
    }
    if !is_valid_email(&email) {
        return Err(ValidationErrors::single("email", INVALID_EMAIL));
    }
    Ok(email)
}

/// Rejects any attempt to point a task at a different board.
pub fn board_unchanged(current: Uuid, incoming: Option<Uuid>) -> Result<(), ValidationErrors> {
    match incoming {
        Some(board_id) if board_id != current => {
            Err(ValidationErrors::single("board", BOARD_CHANGE))
        }
        _ => Ok(()),
    }
}

/// Same as [`board_unchanged`], for a raw `board` value taken from a payload
/// whose shape has no board field. `null` and absence both mean "unchanged".
pub fn raw_board_unchanged(current: Uuid, raw: Option<&Value>) -> Result<(), ValidationErrors> {
    match raw {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(text)) => match Uuid::parse_str(text) {
            Ok(board_id) => board_unchanged(current, Some(board_id)),
            Err(_) => Err(ValidationErrors::single("board", invalid_pk(text))),
        },
        Some(other) => Err(ValidationErrors::single("board", invalid_pk(other))),
    }
}

/// Records an error under `field` unless `user_id` is the board's owner or a member.
pub fn participant(errors: &mut ValidationErrors, board: &Board, field: &str, user_id: Uuid) {
    if !board.is_participant(user_id) {
        errors.add(field, NOT_A_PARTICIPANT);
    }
}
