//! Emitted artifacts and the streams that carry them out of the compiler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use tsbuild_diagnostics::DiagnosticSink;

use crate::error::CompileError;
use crate::sourcemap::SourceMap;

/// One file produced by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// Path relative to the output root (e.g. `util/int.js`).
    pub path: PathBuf,
    /// File contents.
    pub contents: String,
    /// The compiler's source map for this file, if one was produced.
    pub source_map: Option<SourceMap>,
}

impl EmittedFile {
    /// Creates an emitted file without a source map.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            source_map: None,
        }
    }

    /// Attaches a source map.
    pub fn with_source_map(mut self, map: SourceMap) -> Self {
        self.source_map = Some(map);
        self
    }
}

/// A single-pass stream of emitted files; an `Err` item ends it.
pub type EmitStream = BoxStream<'static, Result<EmittedFile, CompileError>>;

/// What a compiler output file is, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Generated JavaScript.
    Code,
    /// Generated declaration file.
    Declaration,
    /// A source map for one of the above.
    SourceMap,
    /// Anything else (build info, copied JSON).
    Other,
}

/// Classifies a compiler output file by its name.
pub fn classify(path: &Path) -> OutputKind {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.ends_with(".map") {
        OutputKind::SourceMap
    } else if [".d.ts", ".d.mts", ".d.cts"].iter().any(|ext| name.ends_with(ext)) {
        OutputKind::Declaration
    } else if [".js", ".mjs", ".cjs", ".jsx"].iter().any(|ext| name.ends_with(ext)) {
        OutputKind::Code
    } else {
        OutputKind::Other
    }
}

/// The result of one compiler invocation.
///
/// `code` and `declarations` are independent single-subscriber streams; each
/// must be consumed by exactly one pipeline. Diagnostics are collected into
/// `diagnostics` by the compiler's reporter while the streams are produced.
pub struct CompilationOutputSet {
    /// Emitted JavaScript files.
    pub code: EmitStream,
    /// Emitted declaration files.
    pub declarations: EmitStream,
    /// Diagnostics reported during compilation.
    pub diagnostics: Arc<DiagnosticSink>,
}

impl CompilationOutputSet {
    /// Creates an output set together with the sender a compiler feeds.
    pub fn channel() -> (EmitSender, CompilationOutputSet) {
        let (code_tx, code_rx) = mpsc::unbounded();
        let (dts_tx, dts_rx) = mpsc::unbounded();
        let diagnostics = Arc::new(DiagnosticSink::new());
        let sender = EmitSender {
            code: code_tx,
            declarations: dts_tx,
            diagnostics: Arc::clone(&diagnostics),
        };
        let output = CompilationOutputSet {
            code: code_rx.boxed(),
            declarations: dts_rx.boxed(),
            diagnostics,
        };
        (sender, output)
    }

    /// An output set whose streams both fail immediately.
    pub fn failed(make_error: impl Fn() -> CompileError) -> CompilationOutputSet {
        let (sender, output) = Self::channel();
        sender.fail(make_error);
        output
    }
}

/// The producing half of a [`CompilationOutputSet`].
///
/// Dropping the sender ends both streams.
pub struct EmitSender {
    code: mpsc::UnboundedSender<Result<EmittedFile, CompileError>>,
    declarations: mpsc::UnboundedSender<Result<EmittedFile, CompileError>>,
    diagnostics: Arc<DiagnosticSink>,
}

impl EmitSender {
    /// Routes a file to the code or declaration stream by its name.
    ///
    /// Returns the kind it was classified as; maps and other files are dropped.
    pub fn emit(&self, file: EmittedFile) -> OutputKind {
        let kind = classify(&file.path);
        let tx = match kind {
            OutputKind::Code => &self.code,
            OutputKind::Declaration => &self.declarations,
            OutputKind::SourceMap | OutputKind::Other => return kind,
        };
        // A closed receiver means the pipeline already failed; nothing to do.
        let _ = tx.unbounded_send(Ok(file));
        kind
    }

    /// The sink the compiler's reporter writes into.
    pub fn diagnostics(&self) -> &Arc<DiagnosticSink> {
        &self.diagnostics
    }

    /// Ends both streams with an error.
    pub fn fail(self, make_error: impl Fn() -> CompileError) {
        let _ = self.code.unbounded_send(Err(make_error()));
        let _ = self.declarations.unbounded_send(Err(make_error()));
    }

    /// Ends both streams successfully.
    pub fn finish(self) {}
}
