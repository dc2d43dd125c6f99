use serde::{Deserialize, Serialize};
use std::fmt;

/// A single rule violation, tied to the property that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub property_name: String,
}

impl ValidationError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        property_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            property_name: property_name.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property_name, self.message)
    }
}

/// What a validator returns: valid, or a list of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn with_errors(errors: impl IntoIterator<Item = ValidationError>) -> Self {
        Self {
            errors: errors.into_iter().collect(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends `other`'s errors after ours, keeping order.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_concatenates_in_order() {
        let a = ValidationResult::with_errors([ValidationError::new("NotEmpty", "a", "name")]);
        let b = ValidationResult::with_errors([ValidationError::new("MaximumLength", "b", "sku")]);

        let merged = a.merge(ValidationResult::success()).merge(b);

        assert!(!merged.is_valid());
        let props: Vec<_> = merged.errors().iter().map(|e| e.property_name.as_str()).collect();
        assert_eq!(props, vec!["name", "sku"]);
    }

    #[test]
    fn success_is_valid() {
        assert!(ValidationResult::success().is_valid());
    }
}
