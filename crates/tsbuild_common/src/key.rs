//! Build targets, module formats, and the task key that pairs them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error produced when a target or format name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKeyError {
    /// The target name was empty.
    #[error("target name must not be empty")]
    EmptyTarget,

    /// The target name contained a character outside `[A-Za-z0-9._-]`.
    #[error("invalid character {ch:?} in target name '{input}'")]
    InvalidTarget {
        /// The rejected input.
        input: String,
        /// The first offending character.
        ch: char,
    },

    /// The module format was not one of the known formats.
    #[error("unknown module format '{0}' (expected 'cjs' or 'esm')")]
    UnknownFormat(String),
}

/// A logical build destination such as `node`, `es2015` or `bin`.
///
/// Targets are opaque to the pipeline; they only name directories and
/// configuration files. The name is restricted to characters that are safe in
/// a single path segment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Target(String);

impl Target {
    /// Creates a target after validating its name.
    pub fn new(name: impl Into<String>) -> Result<Self, ParseKeyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseKeyError::EmptyTarget);
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ParseKeyError::InvalidTarget { input: name, ch });
        }
        Ok(Self(name))
    }

    /// Returns the target name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.0)
    }
}

impl FromStr for Target {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for Target {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.0
    }
}

/// The module system requested for a build.
///
/// This is the caller-facing name used for directory and config naming. The
/// module kind the compiler actually emits is read from the resolved compiler
/// configuration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// CommonJS-style modules.
    Cjs,
    /// ECMAScript modules.
    Esm,
}

impl ModuleFormat {
    /// All known formats, in declaration order.
    pub const ALL: [ModuleFormat; 2] = [ModuleFormat::Cjs, ModuleFormat::Esm];

    /// Returns the short lowercase name (`cjs` or `esm`).
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleFormat::Cjs => "cjs",
            ModuleFormat::Esm => "esm",
        }
    }

    /// Returns `true` for [`ModuleFormat::Esm`].
    pub fn is_esm(self) -> bool {
        self == ModuleFormat::Esm
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleFormat {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cjs" => Ok(ModuleFormat::Cjs),
            "esm" => Ok(ModuleFormat::Esm),
            _ => Err(ParseKeyError::UnknownFormat(s.to_string())),
        }
    }
}

/// Identity of one compile task: which target, in which format.
///
/// Memoization, build stamps and delegation decisions are all keyed on this.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TaskKey {
    /// The build target.
    pub target: Target,
    /// The requested module format.
    pub format: ModuleFormat,
}

impl TaskKey {
    /// Creates a task key.
    pub fn new(target: Target, format: ModuleFormat) -> Self {
        Self { target, format }
    }

    /// Parses both halves of a key from strings.
    pub fn parse(target: &str, format: &str) -> Result<Self, ParseKeyError> {
        Ok(Self::new(target.parse()?, format.parse()?))
    }

    /// A file-name-safe rendering, `target-format`.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.target, self.format)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target, self.format)
    }
}
