//! Request validation for `POST /api/notify/`.
//!
//! Works on a raw `serde_json::Value` so every failing field can be reported
//! at once as a field → messages map.

use serde_json::{Map, Value};

use herald_common::error::{AppError, FieldErrors};
use herald_common::types::{DEFAULT_SUBJECT, UrgencyTier};

pub const SUBJECT_MAX_CHARS: usize = 255;
pub const MESSAGE_MAX_CHARS: usize = 1024;
pub const RECIPIENT_MAX_CHARS: usize = 150;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";

/// A notification request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    pub subject: String,
    pub message: String,
    /// Always a list; a bare string recipient becomes a one-element list.
    pub recipients: Vec<String>,
    pub delay: UrgencyTier,
}

/// Validate a request body, collecting every field error.
pub fn validate(payload: &Value) -> Result<NotifyRequest, AppError> {
    let Some(object) = payload.as_object() else {
        return Err(AppError::field(
            "non_field_errors",
            "Invalid data. Expected a dictionary.",
        ));
    };

    let mut errors = FieldErrors::new();

    let subject = capture(
        &mut errors,
        "subject",
        optional_text(object, "subject", SUBJECT_MAX_CHARS),
    )
    .map(|s| s.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()));
    let message = capture(
        &mut errors,
        "message",
        required_text(object, "message", MESSAGE_MAX_CHARS),
    );
    let recipients = capture(&mut errors, "recipient", recipients(object));
    let delay = capture(&mut errors, "delay", delay(object));

    match (subject, message, recipients, delay) {
        (Some(subject), Some(message), Some(recipients), Some(delay)) if errors.is_empty() => {
            Ok(NotifyRequest {
                subject,
                message,
                recipients,
                delay,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

fn capture<T>(errors: &mut FieldErrors, field: &str, result: Result<T, Vec<String>>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(messages) => {
            errors.insert(field.to_string(), messages);
            None
        }
    }
}

fn optional_text(
    object: &Map<String, Value>,
    field: &str,
    max_chars: usize,
) -> Result<Option<String>, Vec<String>> {
    match object.get(field) {
        None => Ok(None),
        Some(value) => text(value, max_chars).map(Some),
    }
}

fn required_text(
    object: &Map<String, Value>,
    field: &str,
    max_chars: usize,
) -> Result<String, Vec<String>> {
    match object.get(field) {
        None => Err(vec![REQUIRED.to_string()]),
        Some(value) => text(value, max_chars),
    }
}

fn text(value: &Value, max_chars: usize) -> Result<String, Vec<String>> {
    let s = match value {
        Value::Null => return Err(vec![NOT_NULL.to_string()]),
        Value::String(s) => s,
        _ => return Err(vec![NOT_A_STRING.to_string()]),
    };

    // Surrounding whitespace is dropped before any other check
    let s = s.trim();
    if s.is_empty() {
        return Err(vec![NOT_BLANK.to_string()]);
    }
    if s.chars().count() > max_chars {
        return Err(vec![format!(
            "Ensure this field has no more than {} characters.",
            max_chars
        )]);
    }

    Ok(s.to_string())
}

fn recipients(object: &Map<String, Value>) -> Result<Vec<String>, Vec<String>> {
    let items = match object.get("recipient") {
        None => return Err(vec![REQUIRED.to_string()]),
        Some(Value::Null) => return Err(vec![NOT_NULL.to_string()]),
        Some(value @ Value::String(_)) => std::slice::from_ref(value),
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            return Err(vec![
                "Expected a string or a list of strings.".to_string(),
            ]);
        }
    };

    let mut recipients = Vec::with_capacity(items.len());
    let mut messages = Vec::new();
    for item in items {
        match item {
            Value::String(s) if s.chars().count() <= RECIPIENT_MAX_CHARS => {
                recipients.push(s.clone())
            }
            Value::String(s) => messages.push(format!("Invalid recipient: {}", s)),
            other => messages.push(format!("Invalid recipient: {}", other)),
        }
    }

    if messages.is_empty() {
        Ok(recipients)
    } else {
        Err(messages)
    }
}

fn delay(object: &Map<String, Value>) -> Result<UrgencyTier, Vec<String>> {
    match object.get("delay") {
        None => Err(vec![REQUIRED.to_string()]),
        Some(Value::Null) => Err(vec![NOT_NULL.to_string()]),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", display(value)))
            .and_then(UrgencyTier::try_from)
            .map_err(|msg| vec![msg]),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
