//! Country reference data.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use workshop_core::error::CoreError;

/// A row from the `countries` table, keyed by ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

/// DTO for creating or replacing a country under a given code.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertCountry {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
}

/// Normalize a country code to two uppercase ASCII letters.
pub fn normalize_country_code(raw: &str) -> Result<String, CoreError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid country code '{raw}': expected two letters"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_country_code(" kr ").unwrap(), "KR");
        assert_eq!(normalize_country_code("US").unwrap(), "US");
    }

    #[test]
    fn rejects_wrong_length_or_non_letters() {
        assert!(normalize_country_code("USA").is_err());
        assert!(normalize_country_code("K").is_err());
        assert!(normalize_country_code("1A").is_err());
        assert!(normalize_country_code("").is_err());
    }
}
