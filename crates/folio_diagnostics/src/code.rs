//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Configuration problems, prefixed with `C`.
    Config,
    /// Artifact resolution problems, prefixed with `R`.
    Resolution,
    /// Aggregation problems, prefixed with `A`.
    Aggregation,
    /// Generation engine problems, prefixed with `G`.
    Engine,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Config => 'C',
            Category::Resolution => 'R',
            Category::Aggregation => 'A',
            Category::Engine => 'G',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g. `R101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// A consumer channel resolved no producers although some were expected.
    pub const EMPTY_RESOLUTION: Self = Self::new(Category::Resolution, 101);
    /// A resolved artifact carried attributes other than the requested ones.
    pub const ATTRIBUTE_MISMATCH: Self = Self::new(Category::Resolution, 102);
    /// A component bundle is missing a path its descriptor references.
    pub const STALE_BUNDLE: Self = Self::new(Category::Resolution, 103);
    /// Multiple modules are aggregated without the aggregation plugin.
    pub const MISSING_AGGREGATION_PLUGIN: Self = Self::new(Category::Aggregation, 201);
    /// A source set was suppressed and left out of the manifest.
    pub const SUPPRESSED_SOURCE_SET: Self = Self::new(Category::Config, 301);
    /// The generation engine exited with a failure.
    pub const ENGINE_FAILED: Self = Self::new(Category::Engine, 401);
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
