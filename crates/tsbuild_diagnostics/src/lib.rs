//! Compiler diagnostics: collection and rendering.
//!
//! The external compiler reports problems as text; the compiler adapter turns
//! them into structured [`Diagnostic`] values, pushes them into a thread-safe
//! [`DiagnosticSink`] and prints them through a [`DiagnosticRenderer`] as they
//! arrive. The build pipeline itself only cares whether compilation failed.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::DiagnosticCode;
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
