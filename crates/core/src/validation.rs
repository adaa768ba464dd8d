//! Input validation on top of the `validator` derive.
//!
//! DTOs derive [`Validate`]; handlers call [`validate_input`] and get a
//! [`CoreError::Validation`] with a stable, human-readable message.

use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

/// Validate a DTO, mapping failures to [`CoreError::Validation`].
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(describe(&errors)))
}

/// Render field errors as `field: message; field: message`, sorted by field.
///
/// Uses the custom message when the rule provides one, otherwise the rule code.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let detail = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {detail}")
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
