//! Configuration types deserialized from `tsbuild.toml`.
//!
//! Every section is optional; an absent file is equivalent to an empty one.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use tsbuild_common::{ModuleFormat, Target, TaskKey};

use crate::error::ConfigError;

/// The top-level project configuration parsed from `tsbuild.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Directory naming convention for outputs and compiler configs.
    pub layout: LayoutConfig,
    /// How to run the external compiler.
    pub compiler: CompilerConfig,
    /// The nested compilation of script entry points.
    pub bin: BinConfig,
    /// When to hand a task to a child process.
    pub delegation: DelegationConfig,
    /// Persistent build stamps.
    pub cache: CacheConfig,
}

/// Project metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    /// The project name, used in status output only.
    pub name: String,
}

/// Where outputs and compiler configuration files live, relative to the
/// project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Root of all build outputs; each task writes `<targets_dir>/<target>/<format>`.
    pub targets_dir: PathBuf,
    /// Directory holding `tsconfig.<target>-<format>.json` files.
    pub tsconfig_dir: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            targets_dir: PathBuf::from("targets"),
            tsconfig_dir: PathBuf::from("tsconfig"),
        }
    }
}

/// External compiler invocation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Program and leading arguments (e.g. `["npx", "tsc"]`).
    ///
    /// Accepts either a single whitespace-separated string or a list.
    #[serde(deserialize_with = "deserialize_command")]
    pub command: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string(), "tsc".to_string()],
        }
    }
}

/// Deserializes a command that can be either a single string or a list of strings.
///
/// `command = "npx tsc"` is split on whitespace; `command = ["npx", "tsc"]`
/// is taken as-is.
fn deserialize_command<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// The bin sub-task: script entry points compiled with a fixed configuration
/// into `<primary output>/<dir>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BinConfig {
    /// Whether the bin sub-task runs at all.
    pub enabled: bool,
    /// Whether a missing bin compiler config fails the task. When `false`,
    /// a missing config silently skips the sub-task.
    pub required: bool,
    /// Logical target the bin config is named after.
    pub target: String,
    /// Module format the bin config is named after.
    pub format: ModuleFormat,
    /// Subdirectory of the primary output that receives bin output.
    pub dir: PathBuf,
}

impl BinConfig {
    /// The key the bin compiler config is resolved for.
    pub fn key(&self) -> Result<TaskKey, ConfigError> {
        let target = Target::new(self.target.clone())
            .map_err(|e| ConfigError::ValidationError(format!("bin.target: {e}")))?;
        Ok(TaskKey::new(target, self.format))
    }
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required: true,
            target: "bin".to_string(),
            format: ModuleFormat::Cjs,
            dir: PathBuf::from("bin"),
        }
    }
}

/// Child-process delegation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    /// Delegation mode.
    pub mode: DelegationMode,
}

/// When a task is run in a child process instead of in-process.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DelegationMode {
    /// Delegate whenever this process was asked for more than one pair, or
    /// for a pair other than the one being run (default).
    #[default]
    Auto,
    /// Always compile in-process.
    Never,
}

/// Persistent build stamp settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for stamp files, relative to the project root.
    pub dir: PathBuf,
    /// Whether stamps are consulted and written.
    pub persistent: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".tsbuild"),
            persistent: true,
        }
    }
}
