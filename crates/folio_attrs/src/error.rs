//! Error types for attribute construction and validation.

/// Errors raised when building attribute values or tuples.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttrError {
    /// A format name is empty or contains characters outside `[a-z0-9_-]`.
    #[error("invalid format name '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidFormat(String),

    /// An attribute tuple combines tags that cannot occur together.
    #[error("malformed attribute tuple ({tuple}): {reason}")]
    Malformed {
        /// Rendered form of the offending tuple.
        tuple: String,
        /// Why the combination is rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_format() {
        let err = AttrError::InvalidFormat("HTML!".to_string());
        assert!(err.to_string().contains("invalid format name 'HTML!'"));
    }

    #[test]
    fn display_malformed() {
        let err = AttrError::Malformed {
            tuple: "format=html".to_string(),
            reason: "missing component".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed attribute tuple (format=html): missing component"
        );
    }
}
