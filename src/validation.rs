// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

const PROPERTY_TYPES: [&str; 2] = ["sale", "rent"];

/// Validates that a property type is one of the accepted values
/// Valid values: "sale", "rent"
pub fn validate_property_type(property_type: &str) -> Result<(), ValidationError> {
    if PROPERTY_TYPES.contains(&property_type) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_property_type");
        err.message = Some("Property type must be one of: sale, rent".into());
        Err(err)
    }
}

/// Validates that a username contains only alphanumeric characters
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = USERNAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
    if re.is_match(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_username");
        err.message = Some("Username must be alphanumeric".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_accepts_known_values() {
        assert!(validate_property_type("sale").is_ok());
        assert!(validate_property_type("rent").is_ok());
    }

    #[test]
    fn test_property_type_rejects_unknown_values() {
        assert!(validate_property_type("lease").is_err());
        assert!(validate_property_type("SALE").is_err());
        assert!(validate_property_type("").is_err());
    }

    #[test]
    fn test_username_alphanumeric_only() {
        assert!(validate_username("alice42").is_ok());
        assert!(validate_username("Bob").is_ok());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("dash-ed").is_err());
        assert!(validate_username("").is_err());
    }
}
