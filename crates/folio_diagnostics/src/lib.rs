//! User-facing diagnostics for configuration, resolution, and aggregation problems.
//!
//! Hard failures travel as each crate's error enum. Everything the user should
//! see without the build stopping (an unresolvable channel, a missing
//! aggregation plugin, a discarded artifact) is a [`Diagnostic`] emitted into a
//! thread-safe [`DiagnosticSink`] and rendered at the end of a command.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
