use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("Attendance record {0} not found")]
    RecordNotFound(i64),

    #[error("Invalid check-in token")]
    TokenInvalid,

    #[error("Check-in token has expired")]
    TokenExpired,

    #[error("{0}")]
    Validation(String),

    #[error("Student {student_id} is not enrolled in class {class_id}")]
    StudentNotEnrolled { class_id: i64, student_id: String },

    #[error("Check-in is disabled for session {0}")]
    CheckInDisabled(i64),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(format_validation_errors(&errors))
    }
}

/// Joins every field message into one `; ` separated line, sorted by field.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rejects empty or whitespace-only identifiers.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
