use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// MongoDB server code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every field violation found while validating one document.
///
/// Violations are kept sorted by field name so reports are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
        self.violations.sort_by(|a, b| a.field.cmp(&b.field));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns true if at least one violation names `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.violations.iter().map(|v| v.field.as_str()).collect();
        fields.dedup();
        fields
    }

    /// Turns the report into `Ok(())` when empty, or a validation error otherwise.
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for ValidationReport {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut report = ValidationReport::new();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                report.add(camel_case(&field.to_string()), message);
            }
        }
        report
    }
}

// validator reports the rust field name, documents use camelCase
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Duplicate value for unique field `{field}`: {message}")]
    Conflict { field: String, message: String },

    #[error("Database error: {source}")]
    Database {
        source: mongodb::error::Error,
        collection: Option<String>,
        operation: Option<String>,
    },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        context: Option<String>,
    },
}

impl ServiceError {
    /// Creates a new Database error with context.
    ///
    /// Duplicate key failures are turned into `Conflict` so callers can tell
    /// a uniqueness clash apart from a driver or connectivity failure.
    pub fn database(
        error: mongodb::error::Error,
        collection: Option<String>,
        operation: Option<String>,
    ) -> Self {
        if let Some(message) = duplicate_key_message(&error) {
            return Self::Conflict {
                field: duplicate_key_field(&message),
                message,
            };
        }
        Self::Database {
            source: error,
            collection,
            operation,
        }
    }

    /// Creates a new Internal error with optional context
    pub fn internal(message: impl Into<String>, context: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database { .. })
    }

    /// Returns the validation report if this is a validation error
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}

impl From<ValidationReport> for ServiceError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(error: mongodb::error::Error) -> Self {
        Self::database(error, None, None)
    }
}

impl From<bson::de::Error> for ServiceError {
    fn from(error: bson::de::Error) -> Self {
        Self::internal(error.to_string(), Some("bson decode".to_string()))
    }
}

impl From<bson::ser::Error> for ServiceError {
    fn from(error: bson::ser::Error) -> Self {
        Self::internal(error.to_string(), Some("bson encode".to_string()))
    }
}

fn duplicate_key_message(error: &mongodb::error::Error) -> Option<String> {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE => {
            Some(e.message.clone())
        }
        ErrorKind::Command(e) if e.code == DUPLICATE_KEY_CODE => Some(e.message.clone()),
        _ => None,
    }
}

// E11000 messages name the violated index, eg. "index: name_unique dup key: { name: .. }"
fn duplicate_key_field(message: &str) -> String {
    let index = message
        .split("index: ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or_default();
    if index.starts_with("slug") {
        "slug".to_string()
    } else if index.starts_with("name") {
        "name".to_string()
    } else {
        "_id".to_string()
    }
}
