//! The TypeScript compile task.
//!
//! A [`TypescriptTask`] turns a `(target, format)` key into a settled-once
//! outcome: it resolves the key to a compiler configuration and an output
//! directory, runs the compiler, fans the emitted files out into three write
//! pipelines (sources, declarations, code) and compiles the bin entry points
//! alongside. Identical keys share one outcome through a
//! [`TaskCache`](tsbuild_cache::TaskCache) passed in by the caller.

#![warn(missing_docs)]

pub mod bin;
pub mod delegate;
pub mod dest;
pub mod error;
pub mod fanout;
pub mod mapfile;
pub mod sourcemap_stage;
pub mod task;

pub use bin::{bin_overrides, plan_bin, BinPlan};
pub use delegate::{ChildProcessPolicy, DelegationPolicy, NeverDelegate};
pub use dest::{write_output, OutputFile};
pub use error::{BuildError, TaskOutcome};
pub use fanout::{compile_into, fan_out, FanOutStats, WRITE_CONCURRENCY};
pub use mapfile::MapFileTransform;
pub use sourcemap_stage::SourceMapStage;
pub use task::{SettledTask, TaskEnv, TypescriptTask, TOOL_VERSION};
