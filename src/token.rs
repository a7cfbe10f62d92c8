//! The markup lexer. A [`Tokenizer`] is a cursor into one source buffer; it
//! computes tokens on demand and never buffers more than the one token it is
//! asked about, so [`Tokenizer::peek`] and [`Tokenizer::advance`] both redo
//! the classification from the cursor.
//!
//! Classification, starting at the cursor:
//!
//! 1. `\n\n` is a [`TokenKind::DoubleNewline`], wherever it appears.
//! 2. `"` starts a [`TokenKind::StringConstant`] that runs to the next
//!    unescaped `"` (inclusive).
//! 3. Whitespace is skipped, then `@` starts a [`TokenKind::Tag`], one of
//!    `{ } * | `` ` `` starts a [`TokenKind::Symbol`], and anything else starts
//!    a [`TokenKind::Text`] run. Text runs pull in the whitespace directly in
//!    front of them.

/// The kind of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    DoubleNewline,
    Symbol,
    Tag,
    StringConstant,
}

/// A token borrowed from the source buffer. Tokens are ephemeral; the parser
/// keeps only the `text` slices it turns into nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,

    /// The token's text, a slice of the source buffer.
    pub text: &'a str,

    /// Byte offset of `text` in the source buffer.
    pub start: usize,

    /// Newlines between the cursor and the end of the token.
    pub lines: u32,
}

impl<'a> Token<'a> {
    /// Byte offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Returns true if the token's text is exactly `text`.
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

/// Symbols that always form a one-character token, even when followed by
/// other symbol characters.
const SINGLE_SYMBOLS: &[u8] = b"*_`{}";

fn is_space(c: u8) -> bool {
    c <= b' '
}

fn is_symbol(c: u8) -> bool {
    matches!(c, b'{' | b'}' | b'*' | b'|' | b'`')
}

fn is_text(c: u8) -> bool {
    !is_symbol(c) && c != b'@'
}

/// A cursor over one markup source buffer.
pub struct Tokenizer<'a> {
    source: &'a str,
    file: &'a str,
    at: usize,
    line: u32,
    break_on_commas: bool,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer at the start of `source`. `file` is only used to
    /// attribute errors.
    pub fn new(source: &'a str, file: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            source,
            file,
            at: 0,
            line: 1,
            break_on_commas: false,
        }
    }

    pub fn file(&self) -> &'a str {
        self.file
    }

    /// The current (1-indexed) line of the cursor.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.at
    }

    /// The unconsumed remainder of the buffer.
    pub fn rest(&self) -> &'a str {
        &self.source[self.at..]
    }

    /// When set, text runs also stop in front of `,`. Multi-argument tags turn
    /// this on while reading their arguments.
    pub fn set_break_on_commas(&mut self, on: bool) {
        self.break_on_commas = on;
    }

    /// Returns the next token without consuming it.
    pub fn peek(&self) -> Option<Token<'a>> {
        let buf = &self.source.as_bytes()[self.at..];
        let len = buf.len();

        let mut i = 0;
        while i < len {
            let c = buf[i];
            if c == b'\n' && buf.get(i + 1) == Some(&b'\n') {
                return Some(self.token(TokenKind::DoubleNewline, i, i + 2));
            }

            if c == b'"' {
                let mut j = i + 1;
                let mut escaped = false;
                while j < len {
                    if escaped {
                        escaped = false;
                    } else if buf[j] == b'\\' {
                        escaped = true;
                    } else if buf[j] == b'"' {
                        break;
                    }
                    j += 1;
                }
                // Unterminated constants run to the end of the buffer.
                let end = (j + 1).min(len);
                return Some(self.token(TokenKind::StringConstant, i, end));
            }

            if !is_space(c) {
                let mut j = i + 1;
                if c == b'@' {
                    while j < len && buf[j].is_ascii_alphabetic() {
                        j += 1;
                    }
                    return Some(self.token(TokenKind::Tag, i, j));
                }

                if is_symbol(c) {
                    if !SINGLE_SYMBOLS.contains(&c) {
                        while j < len && is_symbol(buf[j]) {
                            j += 1;
                        }
                    }
                    return Some(self.token(TokenKind::Symbol, i, j));
                }

                while j < len
                    && is_text(buf[j])
                    && buf[j] != b'\n'
                    && !(self.break_on_commas && buf[j] == b',')
                {
                    j += 1;
                }
                let mut start = i;
                while start > 0 && is_space(buf[start - 1]) {
                    start -= 1;
                }
                return Some(self.token(TokenKind::Text, start, j));
            }

            i += 1;
        }

        None
    }

    /// Returns the next token and moves the cursor past it.
    pub fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.peek()?;
        self.line += token.lines;
        self.at = token.end();
        Some(token)
    }

    /// Consumes and returns the next token if it has the given kind.
    pub fn require_kind(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        match self.peek() {
            Some(token) if token.kind == kind => self.advance(),
            _ => None,
        }
    }

    /// Consumes and returns the next token if its text is exactly `text`.
    pub fn require(&mut self, text: &str) -> Option<Token<'a>> {
        match self.peek() {
            Some(token) if token.is(text) => self.advance(),
            _ => None,
        }
    }

    /// Moves the cursor forward to byte offset `position`, counting the lines
    /// it crosses. Positions behind the cursor are ignored.
    pub fn seek(&mut self, position: usize) {
        let position = position.min(self.source.len());
        if position > self.at {
            self.line += count_newlines(&self.source[self.at..position]);
            self.at = position;
        }
    }

    /// Moves the cursor just past the next `,`. Does nothing if there is no
    /// comma left in the buffer.
    pub fn skip_past_comma(&mut self) {
        if let Some(offset) = self.rest().find(',') {
            self.seek(self.at + offset + 1);
        }
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        let (start, end) = (self.at + start, self.at + end);
        Token {
            kind,
            text: &self.source[start..end],
            start,
            lines: count_newlines(&self.source[self.at..end]),
        }
    }
}

fn count_newlines(s: &str) -> u32 {
    s.bytes().filter(|b| *b == b'\n').count() as u32
}
