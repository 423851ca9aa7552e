#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
}

/// The backend sent something that could not be understood at all. Fields
/// that are merely missing are tolerated by the adapters instead
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum WireError {
    #[error("expected a JSON object but found {found}")]
    NotAnObject { found: &'static str },
    #[error("response has no recognizable list of records")]
    NoCollection,
    #[error("backend reported failure: {0}")]
    NotOk(String),
}

impl WireError {
    pub fn not_an_object(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        Self::NotAnObject { found }
    }
}

/// Problems found in a form before anything is sent to the backend
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} is invalid: {source}")]
    Invalid {
        field: &'static str,
        source: ConversionError,
    },
}

impl ValidationError {
    pub fn required(field: &'static str) -> Self {
        Self::Required { field }
    }

    /// Maps a failed newtype conversion onto the form field it came from
    pub fn from_conversion(field: &'static str, err: ConversionError) -> Self {
        match err {
            ConversionError::Empty => Self::Required { field },
            source => Self::Invalid { field, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_conversion_reads_as_required() {
        let err = ValidationError::from_conversion("Email", ConversionError::Empty);
        assert_eq!(err.to_string(), "Email is required");
    }
}
