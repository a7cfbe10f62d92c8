//! Defines [`parse`], which turns one markup source buffer into a
//! [`Document`], and the [`ParseError`]/[`ErrorLog`] types that collect
//! problems found along the way.
//!
//! The parser is recursive descent driven by tags: text and paragraph breaks
//! become nodes directly, style symbols flip a running [`Style`] accumulator,
//! and each recognized `@Tag` runs its own small grammar. Malformed input
//! never fails the parse; it records a [`ParseError`] and the parser stops at
//! the end of the construct that produced the first one, keeping the nodes
//! built so far.
//!
//! The style accumulator is unscoped: a `*` flips italics for
//! every node created after it, across paragraphs and tags, until another
//! `*` flips it back.

use std::fmt;

use tracing::{debug, warn};

use crate::arena::Arena;
use crate::node::{Date, Document, Language, Node, NodeKind, Style};
use crate::token::{TokenKind, Tokenizer};

/// The maximum number of errors kept per run.
pub const ERROR_CAPACITY: usize = 32;

/// A problem found while parsing a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl fmt::Display for ParseError {
    /// Formats the error as `file:line: message`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// A bounded list of [`ParseError`]s shared by every file in a run. Errors
/// past the capacity are dropped with a warning.
#[derive(Debug)]
pub struct ErrorLog {
    errors: Vec<ParseError>,
    capacity: usize,
    dropped: usize,
}

impl ErrorLog {
    pub fn new() -> ErrorLog {
        ErrorLog::with_capacity(ERROR_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> ErrorLog {
        ErrorLog {
            errors: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Records `error`, returning false if the log was already full.
    pub fn push(&mut self, error: ParseError) -> bool {
        if self.errors.len() < self.capacity {
            self.errors.push(error);
            true
        } else {
            self.dropped += 1;
            warn!(error = %error, "Error log is full, dropping parse error");
            false
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The number of errors that did not fit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

/// The closed set of recognized tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TagKind {
    PageTitle,
    Title,
    SubTitle,
    Description,
    YouTube,
    Image,
    ThumbnailImage,
    Code,
    Link,
    FeatureButton,
    Lister,
    Date,
}

impl TagKind {
    /// Looks up a tag by its exact, case-sensitive name (including the `@`).
    fn from_name(name: &str) -> Option<TagKind> {
        Some(match name {
            "@PageTitle" => TagKind::PageTitle,
            "@Title" => TagKind::Title,
            "@SubTitle" => TagKind::SubTitle,
            "@Description" => TagKind::Description,
            "@YouTube" => TagKind::YouTube,
            "@Image" => TagKind::Image,
            "@ThumbnailImage" => TagKind::ThumbnailImage,
            "@Code" => TagKind::Code,
            "@Link" => TagKind::Link,
            "@FeatureButton" => TagKind::FeatureButton,
            "@Lister" => TagKind::Lister,
            "@Date" => TagKind::Date,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Scanning,
    Erroring,
    Done,
}

const EXPECTED_OPEN: &str = "Expected '{'.";
const MISSING_CLOSE: &str = "Missing '}'.";

/// Parses `source` into a [`Document`] allocated in `arena`. `file` names the
/// source in recorded errors. An empty document means nothing was parsed
/// before the input ran out or the first error was hit.
pub fn parse<'a>(
    arena: &'a Arena,
    source: &'a str,
    file: &'a str,
    errors: &mut ErrorLog,
) -> Document<'a> {
    Parser {
        arena,
        tokenizer: Tokenizer::new(source, file),
        errors,
        style: Style::NONE,
        nodes: Vec::new(),
        state: State::Scanning,
    }
    .run()
}

struct Parser<'a, 'e> {
    arena: &'a Arena,
    tokenizer: Tokenizer<'a>,
    errors: &'e mut ErrorLog,
    style: Style,
    nodes: Vec<Node<'a>>,
    state: State,
}

impl<'a, 'e> Parser<'a, 'e> {
    fn run(mut self) -> Document<'a> {
        loop {
            match self.state {
                State::Scanning => self.step(),
                State::Erroring => {
                    debug!(
                        file = self.tokenizer.file(),
                        line = self.tokenizer.line(),
                        "Stopping at first parse error"
                    );
                    self.state = State::Done;
                }
                State::Done => break,
            }
        }
        self.arena.alloc_slice_copy(&self.nodes)
    }

    fn step(&mut self) {
        let token = match self.tokenizer.advance() {
            Some(token) => token,
            None => {
                self.state = State::Done;
                return;
            }
        };

        match token.kind {
            TokenKind::Tag => match TagKind::from_name(token.text) {
                Some(tag) => self.parse_tag(tag),
                None => self.error("Malformed tag."),
            },
            // A string constant outside a tag is ordinary prose.
            TokenKind::Text | TokenKind::StringConstant => self.push(NodeKind::Text(token.text)),
            TokenKind::Symbol => match token.text {
                "*" => self.style.toggle(Style::ITALIC),
                "|" => self.style.toggle(Style::UNDERLINE),
                "`" => self.style.toggle(Style::MONOSPACE),
                other => self.error(format!("Unexpected symbol '{}'", other)),
            },
            TokenKind::DoubleNewline => self.push(NodeKind::ParagraphBreak),
        }
    }

    fn parse_tag(&mut self, tag: TagKind) {
        match tag {
            TagKind::PageTitle => self.parse_heading(
                NodeKind::PageTitle,
                "A page title tag expects {<title text>} to follow.",
            ),
            TagKind::Title => self.parse_heading(
                NodeKind::Title,
                "A title tag expects {<title text>} to follow.",
            ),
            TagKind::SubTitle => self.parse_heading(
                NodeKind::SubTitle,
                "A sub-title tag expects {<sub-title text>} to follow.",
            ),
            TagKind::Description => self.parse_heading(
                NodeKind::Description,
                "A description tag expects {<description text>} to follow.",
            ),
            TagKind::YouTube => self.parse_media(
                NodeKind::YouTube,
                "A YouTube tag expects {<youtube link>} to follow.",
            ),
            TagKind::Image => self.parse_media(
                NodeKind::Image,
                "An image tag expects {<image link>} to follow.",
            ),
            TagKind::ThumbnailImage => self.parse_media(
                NodeKind::ThumbnailImage,
                "An image tag expects {<image link>} to follow.",
            ),
            TagKind::Code => self.parse_code(),
            TagKind::Link => self.parse_link(),
            TagKind::FeatureButton => self.parse_feature_button(),
            TagKind::Lister => self.parse_lister(),
            TagKind::Date => self.parse_date(),
        }
    }

    /// `{<text>}` where the argument is one text run or string constant.
    fn parse_heading(&mut self, kind: fn(&'a str) -> NodeKind<'a>, usage: &str) {
        if self.tokenizer.require("{").is_none() {
            return self.error(EXPECTED_OPEN);
        }

        let argument = self
            .tokenizer
            .require_kind(TokenKind::Text)
            .or_else(|| self.tokenizer.require_kind(TokenKind::StringConstant));
        match argument {
            Some(token) => self.push(kind(trim_quotes(token.text))),
            None => self.error(usage),
        }

        if self.tokenizer.require("}").is_none() {
            self.error(MISSING_CLOSE);
        }
    }

    /// `{<link>}`. The node is kept even if the link is missing.
    fn parse_media(&mut self, kind: fn(&'a str) -> NodeKind<'a>, usage: &str) {
        if self.tokenizer.require("{").is_none() {
            return self.error(EXPECTED_OPEN);
        }

        match self.text_argument() {
            Some(link) => {
                self.push(kind(link));
                if self.tokenizer.require("}").is_none() {
                    self.error(MISSING_CLOSE);
                }
            }
            None => {
                self.push(kind(""));
                self.error(usage);
            }
        }
    }

    /// `{<raw code>}`. The body is not tokenized; braces inside it nest.
    fn parse_code(&mut self) {
        if self.tokenizer.require("{").is_none() {
            return self.error("A code tag expects {<code>} to follow.");
        }

        let body = self.tokenizer.rest();
        let mut depth = 1usize;
        let mut length = body.len();
        for (i, c) in body.bytes().enumerate() {
            match c {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                length = i;
                break;
            }
        }

        self.push(NodeKind::Code {
            language: Language::None,
            code: &body[..length],
        });

        self.tokenizer.seek(self.tokenizer.position() + length);
        if self.tokenizer.require("}").is_none() {
            self.error("Expected } to follow code block.");
        }
    }

    /// `{<text>, <link>}`.
    fn parse_link(&mut self) {
        if self.tokenizer.require("{").is_none() {
            return self.error(EXPECTED_OPEN);
        }

        const USAGE: &str = "A link tag expects {<text>, <link>} to follow.";
        self.tokenizer.set_break_on_commas(true);
        let mut arguments = [""; 2];
        let parsed = self.comma_arguments(&mut arguments);
        self.tokenizer.set_break_on_commas(false);

        let [text, url] = arguments;
        self.push(NodeKind::Link { text, url });
        if !parsed {
            return self.error(USAGE);
        }
        if self.tokenizer.require("}").is_none() {
            self.error(MISSING_CLOSE);
        }
    }

    /// `{<image>, <text>, <link>}`.
    fn parse_feature_button(&mut self) {
        if self.tokenizer.require("{").is_none() {
            return self.error(EXPECTED_OPEN);
        }

        const USAGE: &str = "A feature button tag expects {<image>, <text>, <link>} to follow.";
        self.tokenizer.set_break_on_commas(true);
        let mut arguments = [""; 3];
        let parsed = self.comma_arguments(&mut arguments);
        self.tokenizer.set_break_on_commas(false);

        let [image_path, text, link] = arguments;
        self.push(NodeKind::FeatureButton {
            image_path,
            text,
            link,
        });
        if !parsed {
            return self.error(USAGE);
        }
        if self.tokenizer.require("}").is_none() {
            self.error(MISSING_CLOSE);
        }
    }

    /// `{"<prefix>"}`. The prefix is whatever sits between the first two
    /// quotes after the brace.
    fn parse_lister(&mut self) {
        if self.tokenizer.require("{").is_none() {
            return self.error(EXPECTED_OPEN);
        }

        let rest = self.tokenizer.rest();
        let start = rest.find('"').map_or(0, |i| i + 1);
        let length = rest[start..].find('"').unwrap_or(rest.len() - start);
        self.push(NodeKind::Lister(&rest[start..start + length]));

        // Skip the closing quote too.
        self.tokenizer
            .seek(self.tokenizer.position() + start + length + 1);
        if self.tokenizer.require("}").is_none() {
            self.error("Expected } to follow lister data.");
        }
    }

    /// `{<free-form date>}`. The first three digit runs in the body are the
    /// year, month and day, in that order, whatever separates them.
    fn parse_date(&mut self) {
        if self.tokenizer.require("{").is_none() {
            return self.error(EXPECTED_OPEN);
        }

        let rest = self.tokenizer.rest();
        let body = &rest[..rest.find('}').unwrap_or(rest.len())];
        let mut numbers = body
            .split(|c: char| !c.is_ascii_digit())
            .filter(|run| !run.is_empty())
            .map(|run| run.parse::<i32>().unwrap_or(0));
        let year = numbers.next().unwrap_or(0);
        let month = numbers.next().unwrap_or(0);
        let day = numbers.next().unwrap_or(0);
        self.push(NodeKind::Date(Date::new(year, month, day)));

        self.tokenizer.seek(self.tokenizer.position() + body.len());
        if self.tokenizer.require("}").is_none() {
            self.error("Expected '}' to follow date data.");
        }
    }

    /// Reads one argument per slot, skipping past a comma between each.
    /// Returns false as soon as an argument is missing.
    fn comma_arguments(&mut self, arguments: &mut [&'a str]) -> bool {
        for (i, slot) in arguments.iter_mut().enumerate() {
            if i > 0 {
                self.tokenizer.skip_past_comma();
            }
            match self.text_argument() {
                Some(argument) => *slot = argument,
                None => return false,
            }
        }
        true
    }

    /// One string constant or text run, with surrounding quotes trimmed.
    fn text_argument(&mut self) -> Option<&'a str> {
        self.tokenizer
            .require_kind(TokenKind::StringConstant)
            .or_else(|| self.tokenizer.require_kind(TokenKind::Text))
            .map(|token| trim_quotes(token.text))
    }

    fn push(&mut self, kind: NodeKind<'a>) {
        self.nodes
            .push(Node::new(kind, self.style, self.tokenizer.line()));
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(ParseError {
            file: self.tokenizer.file().to_owned(),
            line: self.tokenizer.line(),
            message: message.into(),
        });
        self.state = State::Erroring;
    }
}

/// Strips one leading `"` and, if present, one trailing `"`. Interior
/// escapes are left alone.
fn trim_quotes(text: &str) -> &str {
    match text.strip_prefix('"') {
        Some(inner) => inner.strip_suffix('"').unwrap_or(inner),
        None => text,
    }
}
