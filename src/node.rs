//! Defines the document tree produced by [`crate::parser`] and consumed by
//! [`crate::htmlrenderer`]. A [`Document`] is an ordered slice of sibling
//! [`Node`]s allocated in an [`crate::arena::Arena`]; container kinds own their
//! children as a separate slice. Node text borrows either the source buffer
//! or the arena, so the `'a` lifetime ties a tree to both.

use std::fmt;

/// The sibling sequence of one parsed file (or one list item).
pub type Document<'a> = &'a [Node<'a>];

/// Inline text styles. This is a snapshot of the parser's running toggle
/// state at the moment a node was created.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style(u8);

impl Style {
    pub const NONE: Style = Style(0);
    pub const BOLD: Style = Style(1 << 0);
    pub const ITALIC: Style = Style(1 << 1);
    pub const UNDERLINE: Style = Style(1 << 2);
    pub const MONOSPACE: Style = Style(1 << 3);

    /// Returns true if every style set in `other` is also set in `self`.
    pub fn contains(self, other: Style) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flips the styles set in `other`.
    pub fn toggle(&mut self, other: Style) {
        self.0 ^= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Style {
    type Output = Style;

    fn bitor(self, rhs: Style) -> Style {
        Style(self.0 | rhs.0)
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (Style::BOLD, "BOLD"),
            (Style::ITALIC, "ITALIC"),
            (Style::UNDERLINE, "UNDERLINE"),
            (Style::MONOSPACE, "MONOSPACE"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(style, _)| self.contains(*style))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Style({})", set.join(" | "))
    }
}

/// A calendar-ish date. Fields are whatever numbers the `@Date` tag held; no
/// validation is performed. Ordering is by year, then month, then day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl Date {
    pub const fn new(year: i32, month: i32, day: i32) -> Date {
        Date { year, month, day }
    }
}

/// The embedded language of a code block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    None,
    C,
}

/// Numbering style carried by ordered lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderStyle {
    #[default]
    Numeric,
    Alphabetic,
    RomanNumeral,
}

/// What a node is, along with its kind-specific payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind<'a> {
    PageTitle(&'a str),
    Title(&'a str),
    SubTitle(&'a str),
    Description(&'a str),
    Text(&'a str),
    ParagraphBreak,
    UnorderedList(Document<'a>),
    OrderedList {
        order: OrderStyle,
        items: Document<'a>,
    },
    Code {
        language: Language,
        code: &'a str,
    },
    YouTube(&'a str),
    Image(&'a str),
    ThumbnailImage(&'a str),
    Link {
        text: &'a str,
        url: &'a str,
    },
    FeatureButton {
        image_path: &'a str,
        text: &'a str,
        link: &'a str,
    },
    /// Replaced at render time by links to every file whose name starts
    /// with the prefix.
    Lister(&'a str),
    Date(Date),
}

/// One element of a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node<'a> {
    pub kind: NodeKind<'a>,
    pub style: Style,

    /// Source line the tokenizer was on when the node was built.
    pub line: u32,
}

impl<'a> Node<'a> {
    pub fn new(kind: NodeKind<'a>, style: Style, line: u32) -> Node<'a> {
        Node { kind, style, line }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, NodeKind::Link { .. })
    }
}

/// Returns the first [`Date`] in `document`, if any.
pub fn first_date(document: Document) -> Option<Date> {
    document.iter().find_map(|node| match node.kind {
        NodeKind::Date(date) => Some(date),
        _ => None,
    })
}
