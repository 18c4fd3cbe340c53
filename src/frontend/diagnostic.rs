use super::ast::Span;

/// A syntax problem in one Go source file. Only the front end produces
/// these; findings of the check itself are reported through the driver's
/// `Report` records, which carry a suggested fix.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    /// Renders as `file:line:col: syntax error: message` with the offending
    /// source line and a caret, the same position shape the driver uses for
    /// findings.
    pub fn render(&self, file: &str, source: &str) -> String {
        match &self.span {
            Some(span) => {
                let line_text = source.lines().nth(span.line.saturating_sub(1)).unwrap_or("");
                format!(
                    "{}:{}:{}: syntax error: {}\n  {}\n  {}^",
                    file,
                    span.line,
                    span.column,
                    self.message,
                    line_text,
                    " ".repeat(span.column.saturating_sub(1))
                )
            }
            None => format!("{}: syntax error: {}", file, self.message),
        }
    }
}

/// Accumulator the parser pushes into; the file is rejected as a whole when
/// any entry is present.
#[derive(Default)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.items.push(Diagnostic {
            message: message.into(),
            span,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn render_all(&self, file: &str, source: &str) -> String {
        self.items
            .iter()
            .map(|diag| diag.render(file, source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_at_the_offending_column() {
        let mut diags = Diagnostics::default();
        diags.push(
            "expected expression",
            Some(Span {
                start: 10,
                end: 11,
                line: 2,
                column: 7,
            }),
        );
        let out = diags.render_all("pkg/main.go", "package p\nfunc f(\n");
        assert!(out.starts_with("pkg/main.go:2:7: syntax error: expected expression"));
        assert!(out.contains("func f("));
        assert!(out.ends_with("      ^"));
    }

    #[test]
    fn render_without_span_still_names_the_file() {
        let mut diags = Diagnostics::default();
        diags.push("file must start with `package`", None);
        assert_eq!(
            diags.render_all("x.go", ""),
            "x.go: syntax error: file must start with `package`"
        );
    }
}
