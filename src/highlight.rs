//! A minimal C highlighter for `@Code` blocks. [`Runs`] splits code into
//! classified runs in one left-to-right pass and [`highlight`] writes them as
//! HTML, wrapping every non-default run in a colored span.
//!
//! Block comments have no recognized terminator: once `/*` is seen the
//! comment runs to the end of the block.

use std::fmt::{self, Write};

const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while",
];

/// The class of a [`Run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Default,
    LineComment,
    BlockComment,
    Keyword,
    Constant,
    Tag,
}

impl RunKind {
    /// The span color for this class, if it gets one.
    pub fn color(self) -> Option<&'static str> {
        match self {
            RunKind::Default => None,
            RunKind::LineComment | RunKind::BlockComment => Some("#8cba53"),
            RunKind::Keyword => Some("#f4b642"),
            RunKind::Constant => Some("#82c4e5"),
            RunKind::Tag => Some("#d82312"),
        }
    }
}

/// A classified slice of code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run<'a> {
    pub kind: RunKind,
    pub text: &'a str,
}

/// Iterator over the [`Run`]s of a code block.
pub struct Runs<'a> {
    code: &'a str,
    at: usize,
}

impl<'a> Runs<'a> {
    pub fn new(code: &'a str) -> Runs<'a> {
        Runs { code, at: 0 }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Run<'a>> {
        let rest = &self.code[self.at..];
        let bytes = rest.as_bytes();
        let first = *bytes.first()?;
        let scan = |from: usize, pred: &dyn Fn(u8) -> bool| {
            from + bytes[from..].iter().take_while(|b| pred(**b)).count()
        };

        let (kind, length) = match (first, bytes.get(1)) {
            (b'/', Some(b'/')) => (RunKind::LineComment, scan(1, &|b| b != b'\n')),
            (b'/', Some(b'*')) => (RunKind::BlockComment, bytes.len()),
            (c, _) if c.is_ascii_alphabetic() || c == b'_' => {
                let length = scan(1, &|b| b == b'_' || b.is_ascii_alphanumeric());
                let word = &rest[..length];
                match KEYWORDS.iter().any(|keyword| *keyword == word) {
                    true => (RunKind::Keyword, length),
                    false => (RunKind::Default, length),
                }
            }
            (c, _) if c.is_ascii_digit() => (
                RunKind::Constant,
                scan(1, &|b| b == b'.' || b.is_ascii_alphanumeric()),
            ),
            (quote @ (b'"' | b'\''), _) => (
                RunKind::Constant,
                (scan(1, &|b| b != quote) + 1).min(bytes.len()),
            ),
            // Tags take the whitespace character that ends them.
            (b'@', _) => (RunKind::Tag, (scan(1, &|b| b > b' ') + 1).min(bytes.len())),
            _ => (
                RunKind::Default,
                rest.chars().next().map_or(1, char::len_utf8),
            ),
        };

        self.at += length;
        Some(Run {
            kind,
            text: &rest[..length],
        })
    }
}

/// Writes `code` as highlighted HTML. `<`, `>` and `&` are escaped; every
/// other character passes through.
pub fn highlight<W: Write>(w: &mut W, code: &str) -> fmt::Result {
    for run in Runs::new(code) {
        if let Some(color) = run.kind.color() {
            write!(w, r#"<span class="code_text" style="color: {};">"#, color)?;
        }
        escape(w, run.text)?;
        if run.kind.color().is_some() {
            w.write_str("</span>")?;
        }
    }
    Ok(())
}

fn escape<W: Write>(w: &mut W, text: &str) -> fmt::Result {
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let entity = match c {
            '<' => "&lt;",
            '>' => "&gt;",
            '&' => "&amp;",
            _ => continue,
        };
        w.write_str(&text[last..i])?;
        w.write_str(entity)?;
        last = i + 1;
    }
    w.write_str(&text[last..])
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn runs(code: &str) -> Vec<(RunKind, &str)> {
        Runs::new(code).map(|run| (run.kind, run.text)).collect()
    }

    fn html(code: &str) -> String {
        let mut out = String::new();
        highlight(&mut out, code).unwrap();
        out
    }

    #[test]
    fn test_keyword_and_line_comment() {
        assert_eq!(
            vec![
                (RunKind::Keyword, "int"),
                (RunKind::Default, " "),
                (RunKind::Default, "x"),
                (RunKind::Default, " "),
                (RunKind::Default, "="),
                (RunKind::Default, " "),
                (RunKind::Constant, "1"),
                (RunKind::Default, ";"),
                (RunKind::Default, " "),
                (RunKind::LineComment, "// note"),
                (RunKind::Default, "\n"),
            ],
            runs("int x = 1; // note\n"),
        );
        assert_eq!(
            concat!(
                r#"<span class="code_text" style="color: #f4b642;">int</span> x = "#,
                r#"<span class="code_text" style="color: #82c4e5;">1</span>; "#,
                r#"<span class="code_text" style="color: #8cba53;">// note</span>"#,
                "\n",
            ),
            html("int x = 1; // note\n"),
        );
    }

    #[test]
    fn test_line_comment_without_newline_runs_to_end() {
        assert_eq!(vec![(RunKind::LineComment, "// tail")], runs("// tail"));
    }

    #[test]
    fn test_block_comment_runs_to_end_of_block() {
        assert_eq!(
            vec![
                (RunKind::Default, "a"),
                (RunKind::Default, " "),
                (RunKind::BlockComment, "/* c */ int b;\nreturn 0;"),
            ],
            runs("a /* c */ int b;\nreturn 0;"),
        );
    }

    #[test]
    fn test_keywords_are_exact_and_case_sensitive() {
        assert_eq!(
            vec![
                (RunKind::Default, "integer"),
                (RunKind::Default, " "),
                (RunKind::Default, "Int"),
                (RunKind::Default, " "),
                (RunKind::Keyword, "while"),
                (RunKind::Default, "("),
                (RunKind::Default, "_x1"),
                (RunKind::Default, ")"),
            ],
            runs("integer Int while(_x1)"),
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            vec![
                (RunKind::Constant, "0x1Fu"),
                (RunKind::Default, " "),
                (RunKind::Constant, "3.14f"),
                (RunKind::Default, " "),
                (RunKind::Constant, r#""a<b""#),
                (RunKind::Constant, "'c'"),
                (RunKind::Constant, "\"open"),
            ],
            runs("0x1Fu 3.14f \"a<b\"'c'\"open"),
        );
    }

    #[test]
    fn test_tag_includes_trailing_whitespace() {
        assert_eq!(
            vec![
                (RunKind::Tag, "@Title{x} "),
                (RunKind::Default, "y"),
                (RunKind::Tag, "@end"),
            ],
            runs("@Title{x} y@end"),
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!("a &lt;&gt; &amp;", html("a <> &"));
        assert_eq!(
            r#"<span class="code_text" style="color: #82c4e5;">"&lt;é&gt;"</span>"#,
            html(r#""<é>""#),
        );
        assert_eq!("é→", html("é→"));
    }
}
