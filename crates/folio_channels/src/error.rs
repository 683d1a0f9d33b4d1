//! Error types for channel registration and resolution.

use folio_attrs::{AttrError, ComponentKind, Format};

/// Errors raised by the channel registry.
///
/// Missing producers are never errors; they surface as empty resolutions.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The build unit was never registered.
    #[error("unknown build unit '{0}'")]
    UnknownUnit(String),

    /// The build unit was registered twice.
    #[error("build unit '{0}' is already registered")]
    DuplicateUnit(String),

    /// A channel with this name already exists in the unit.
    #[error("build unit '{unit}' already has a channel named '{name}'")]
    DuplicateChannel {
        /// The owning unit.
        unit: String,
        /// The clashing channel name.
        name: String,
    },

    /// A referenced channel does not exist in the unit.
    #[error("build unit '{unit}' has no channel named '{name}'")]
    UnknownChannel {
        /// The owning unit.
        unit: String,
        /// The missing channel name.
        name: String,
    },

    /// A channel was used against its direction (e.g. publishing into a consumer).
    #[error("channel '{name}' of build unit '{unit}' is not a {expected} channel")]
    WrongDirection {
        /// The owning unit.
        unit: String,
        /// The channel name.
        name: String,
        /// The direction the operation needed.
        expected: &'static str,
    },

    /// The requesting unit has no consumer channel for the requested kind and format.
    #[error("build unit '{unit}' has no {kind} consumer for format '{format}'")]
    NoConsumer {
        /// The requesting unit.
        unit: String,
        /// The requested component kind.
        kind: ComponentKind,
        /// The requested format.
        format: Format,
    },

    /// A unit declared a dependency on itself.
    #[error("build unit '{0}' cannot depend on itself")]
    SelfDependency(String),

    /// A channel or artifact carries a contradictory attribute tuple.
    #[error(transparent)]
    Malformed(#[from] AttrError),
}
