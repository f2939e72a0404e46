//! The compiler abstraction the build pipeline drives.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::emit::CompilationOutputSet;
use crate::tsconfig::Project;

/// Compiler options applied on top of a loaded `tsconfig.json`.
///
/// Ordered by name so command lines and fingerprints are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOverrides(BTreeMap<String, Value>);

impl CompilerOverrides {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one option.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// The value set for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Iterates options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if no option is overridden.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the overrides as `--name value` command-line pairs.
    ///
    /// Lists are comma-joined, as `tsc` expects for list options.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for (name, value) in &self.0 {
            args.push(format!("--{name}"));
            args.push(value_arg(value));
        }
        args
    }
}

fn value_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_arg).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Something that turns a loaded project into emitted files.
///
/// `compile` returns immediately; the work happens while the returned streams
/// are consumed. Each call is one compiler invocation.
pub trait Compiler: Send + Sync {
    /// Compiles `project`.
    fn compile(&self, project: &Project) -> CompilationOutputSet;

    /// A stable description of the compiler (program and version), mixed into
    /// build fingerprints.
    fn identity(&self) -> String;
}
