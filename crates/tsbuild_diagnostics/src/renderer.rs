//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer: Send + Sync {
    /// Renders a single diagnostic. The result ends with a newline.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics the way the compiler's own reporter does.
///
/// Produces output like:
/// ```text
/// src/table.ts:12:5 - error TS2322: Type 'string' is not assignable to type 'number'.
///     Types of property 'x' are incompatible.
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Suggestion => "32",
            Severity::Message => "34",
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        if let Some(location) = &diag.location {
            out.push_str(&format!("{location} - "));
        }
        out.push_str(&self.paint(diag.severity, &diag.severity.to_string()));
        if let Some(code) = diag.code {
            out.push_str(&format!(" {code}"));
        }
        out.push_str(&format!(": {}\n", diag.message));

        for note in &diag.notes {
            out.push_str(&format!("    {note}\n"));
        }

        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        match serde_json::to_string(diag) {
            Ok(json) => format!("{json}\n"),
            Err(e) => format!("{{\"severity\":\"error\",\"message\":\"unrenderable diagnostic: {e}\"}}\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use crate::location::Location;

    #[test]
    fn render_error_with_location() {
        let diag = Diagnostic::error("Type 'string' is not assignable to type 'number'.")
            .with_code(DiagnosticCode(2322))
            .with_location(Location::new("src/table.ts", 12, 5));
        let out = TerminalRenderer::new(false).render(&diag);
        assert_eq!(
            out,
            "src/table.ts:12:5 - error TS2322: Type 'string' is not assignable to type 'number'.\n"
        );
    }

    #[test]
    fn render_global_with_notes() {
        let diag = Diagnostic::warning("something odd").with_note("more detail");
        let out = TerminalRenderer::new(false).render(&diag);
        assert_eq!(out, "warning: something odd\n    more detail\n");
    }

    #[test]
    fn render_with_color_wraps_severity() {
        let diag = Diagnostic::error("x");
        let out = TerminalRenderer::new(true).render(&diag);
        assert!(out.contains("\x1b[31merror\x1b[0m"));
    }

    #[test]
    fn json_is_single_line() {
        let diag = Diagnostic::error("bad")
            .with_code(DiagnosticCode(1005))
            .with_location(Location::new("a.ts", 1, 2));
        let out = JsonRenderer.render(&diag);
        assert_eq!(out.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["code"], 1005);
        assert_eq!(value["severity"], "error");
    }
}
