//! Channel and artifact types.

use folio_attrs::{AttributeSet, ProducerScope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifies a build unit, e.g. `hello` or `libs/core`.
///
/// The root unit of a workspace uses `.`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl UnitId {
    /// Creates a unit id from its workspace-relative path.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a channel offers artifacts to other units or pulls them in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// Publishes artifacts for other units.
    Producer,
    /// Resolves artifacts from this unit's declarations and dependencies.
    Consumer,
}

/// One file or directory flowing through a channel.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Artifact {
    /// Location of the artifact. It may not exist until `built_by` has run.
    pub path: PathBuf,
    /// The artifact's own tags. Usually equal to its channel's attributes.
    pub attributes: AttributeSet,
    /// The step that produces the artifact, if any.
    pub built_by: Option<String>,
}

impl Artifact {
    /// Creates an artifact tagged with the given attributes.
    pub fn new(path: impl Into<PathBuf>, attributes: AttributeSet) -> Self {
        Self {
            path: path.into(),
            attributes,
            built_by: None,
        }
    }

    /// Records the step that must run before the artifact can be read.
    pub fn built_by(mut self, step: impl Into<String>) -> Self {
        self.built_by = Some(step.into());
        self
    }
}

/// A named, directional, attribute-tagged endpoint owned by one unit.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Channel name, unique within the unit.
    pub name: String,
    /// Producer or consumer.
    pub direction: Direction,
    /// Tags matched against requests (producers) or sent as requests (consumers).
    pub attributes: AttributeSet,
    /// Format scope of a producer.
    pub scope: ProducerScope,
    /// Consumer channels whose contents this consumer also includes.
    pub extends: Vec<String>,
    /// Published artifacts (producers) or directly declared files (consumers).
    pub artifacts: Vec<Artifact>,
}
