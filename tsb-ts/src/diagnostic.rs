use std::fmt::Write;

use colored::Colorize;

use crate::source::{SourceMap, Span};

/// An error message anchored to a span of a declaration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            span,
            message: message.into(),
        }
    }

    /// Render the header, the message and an underlined snippet of the offending source.
    ///
    /// Spans covering more than five lines have their middle elided. Colour codes are only emitted when `color`
    /// is set, which callers decide based on whether they write to a terminal.
    pub fn render(&self, sources: &SourceMap, color: bool) -> String {
        let file = sources.get(self.span.file);
        let (line, col) = file.line_col(self.span.start);
        let (line2, col2) = file.line_col(self.span.end);

        let path = file.path().display().to_string();
        let header = format!(
            "==> {}: {}:{}-{}:{}",
            if color {
                path.bold().to_string()
            } else {
                path.clone()
            },
            line + 1,
            col + 1,
            line2 + 1,
            col2 + 1
        );

        let mut out = String::new();
        let _ = write!(
            out,
            "{}\n\n{}\n\n",
            paint(color, &header, |s| s.red()),
            self.message
        );

        let basename = file
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        out.push_str(&paint(color, &basename, |s| s.dimmed()));

        let last = line2.min(file.line_count().saturating_sub(1));
        for i in line..=last {
            if i > line + 2 && i + 2 < line2 {
                if i == line + 3 {
                    out.push('\n');
                    out.push_str(&paint(color, "             ... ... ...", |s| s.dimmed()));
                }
                continue;
            }

            let text = file.line(i);
            let number = format!("{:>6}", i + 1);
            let _ = write!(
                out,
                "\n{}  {}",
                paint(color, &number, |s| s.dimmed()),
                paint(color, text, |s| s.cyan())
            );

            let start = if i == line { col } else { 0 };
            let end = if i == line2 { col2 } else { text.chars().count() };
            let carets = "^".repeat(end.saturating_sub(start));
            let _ = write!(
                out,
                "\n{}{}",
                " ".repeat(start + 8),
                paint(color, &carets, |s| s.yellow())
            );
        }

        out
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn paint<F>(color: bool, s: &str, f: F) -> String
where
    F: FnOnce(&str) -> colored::ColoredString,
{
    if color {
        f(s).to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn render_single_line() {
        let mut sources = SourceMap::default();
        let text = "declare class A {\n    x: Nope;\n}\n".to_string();
        let id = sources.add("src/a.d.ts".into(), text);
        let diag = Diagnostic::new(Span::new(id, 25, 29), "type resolution failed for \"Nope\"");

        assert_eq!(
            diag.render(&sources, false),
            indoc!(
                r#"
                ==> src/a.d.ts: 2:8-2:12

                type resolution failed for "Nope"

                a.d.ts
                     2      x: Nope;
                               ^^^^"#
            )
        );
    }

    #[test]
    fn render_elides_long_spans() {
        let mut sources = SourceMap::default();
        let text = (1..=9).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let end = text.len() as u32;
        let id = sources.add("b.d.ts".into(), text);
        let rendered = Diagnostic::new(Span::new(id, 0, end), "too long").render(&sources, false);

        assert!(rendered.contains("     3  l3"));
        assert!(rendered.contains("... ... ..."));
        assert!(!rendered.contains("     5  l5"));
        assert!(rendered.contains("     7  l7"));
        assert!(rendered.contains("     9  l9"));
    }
}
