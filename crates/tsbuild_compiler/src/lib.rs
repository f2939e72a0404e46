//! TypeScript project loading and compiler invocation.
//!
//! [`Project::load`] reads a `tsconfig.json` (following `extends`), applies
//! [`CompilerOverrides`] and selects the source files. A [`Compiler`] turns a
//! project into a [`CompilationOutputSet`]: two single-pass streams of emitted
//! code and declaration files plus the diagnostics its reporter collected.
//! [`TscCompiler`] is the implementation that shells out to `tsc`.

#![warn(missing_docs)]

pub mod compiler;
pub mod emit;
pub mod error;
pub mod jsonc;
pub mod module_kind;
pub mod paths;
pub mod sourcemap;
pub mod tsc;
pub mod tsc_output;
pub mod tsconfig;
pub mod wildcard;

pub use compiler::{Compiler, CompilerOverrides};
pub use emit::{classify, CompilationOutputSet, EmitSender, EmitStream, EmittedFile, OutputKind};
pub use error::CompileError;
pub use module_kind::ModuleKind;
pub use sourcemap::SourceMap;
pub use tsc::TscCompiler;
pub use tsconfig::Project;
