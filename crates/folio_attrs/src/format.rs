//! Output format tags.

use crate::error::AttrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque tag naming an output flavor such as `html` or `javadoc`.
///
/// Formats are compared by exact name equality only; there is no notion of a
/// format family at the protocol level.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Format(String);

impl Format {
    /// Validates and wraps a format name.
    pub fn new(name: &str) -> Result<Self, AttrError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(AttrError::InvalidFormat(name.to_string()))
        }
    }

    /// The HTML site format.
    pub fn html() -> Self {
        Self("html".to_string())
    }

    /// The Javadoc-style site format.
    pub fn javadoc() -> Self {
        Self("javadoc".to_string())
    }

    /// GitHub-flavored Markdown.
    pub fn gfm() -> Self {
        Self("gfm".to_string())
    }

    /// Jekyll-flavored Markdown.
    pub fn jekyll() -> Self {
        Self("jekyll".to_string())
    }

    /// Returns the format name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Format {
    type Error = AttrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Format> for String {
    fn from(value: Format) -> Self {
        value.0
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format({})", self.0)
    }
}
