//! Line-oriented parser for the compiler's diagnostic output.

use std::path::{Path, PathBuf};

use tsbuild_diagnostics::{Diagnostic, DiagnosticCode, Location, Severity};

/// Turns compiler output lines into [`Diagnostic`]s.
///
/// Understands the plain form `file(line,col): error TS1234: message`, the
/// pretty form `file:line:col - error TS1234: message` and global diagnostics
/// `error TS1234: message`. Indented lines following a diagnostic are
/// attached to it as notes, so a diagnostic is only returned once the next
/// non-continuation line (or [`finish`](TscOutputParser::finish)) arrives.
pub struct TscOutputParser {
    base_dir: PathBuf,
    pending: Option<Diagnostic>,
}

impl TscOutputParser {
    /// Creates a parser resolving relative file names against `base_dir`,
    /// the compiler's working directory.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            pending: None,
        }
    }

    /// Feeds one output line; returns a diagnostic that is now complete.
    pub fn push_line(&mut self, line: &str) -> Option<Diagnostic> {
        let line = line.trim_end();
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(pending) = self.pending.as_mut() {
                let note = line.trim();
                if !note.is_empty() {
                    pending.notes.push(note.to_string());
                }
                return None;
            }
        }
        let next = parse_header(line, &self.base_dir);
        std::mem::replace(&mut self.pending, next)
    }

    /// Returns the last diagnostic, if one is still open.
    pub fn finish(&mut self) -> Option<Diagnostic> {
        self.pending.take()
    }
}

fn parse_header(line: &str, base_dir: &Path) -> Option<Diagnostic> {
    if let Some(diag) = parse_body(line) {
        return Some(diag);
    }
    if let Some(idx) = line.find("): ") {
        let location = parse_paren_location(&line[..=idx], base_dir)?;
        return parse_body(&line[idx + 3..]).map(|d| d.with_location(location));
    }
    if let Some(idx) = line.find(" - ") {
        let location = parse_colon_location(&line[..idx], base_dir)?;
        return parse_body(&line[idx + 3..]).map(|d| d.with_location(location));
    }
    None
}

/// Parses `error TS1234: message`.
fn parse_body(text: &str) -> Option<Diagnostic> {
    let (word, rest) = text.split_once(' ')?;
    let severity = Severity::from_word(word)?;
    let (code, message) = rest.split_once(": ")?;
    let code = DiagnosticCode::parse(code)?;
    Some(Diagnostic::new(severity, message.trim()).with_code(code))
}

/// Parses `file(line,col)`.
fn parse_paren_location(text: &str, base_dir: &Path) -> Option<Location> {
    let open = text.rfind('(')?;
    let inner = text[open + 1..].strip_suffix(')')?;
    let (line, column) = inner.split_once(',')?;
    Some(Location::new(
        base_dir.join(&text[..open]),
        line.trim().parse().ok()?,
        column.trim().parse().ok()?,
    ))
}

/// Parses `file:line:col`.
fn parse_colon_location(text: &str, base_dir: &Path) -> Option<Location> {
    let mut parts = text.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some(Location::new(base_dir.join(file), line, column))
}
