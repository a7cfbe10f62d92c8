//! The library code for the `quill` static site generator, which compiles a
//! small tag-based markup language into HTML pages. A run is a single batch
//! pass:
//!
//! 1. Parsing every input file into a document tree ([`crate::parser`])
//! 2. Deriving a post from each tree and sorting the posts newest first
//!    ([`crate::post`])
//! 3. Rendering and writing one HTML page per post ([`crate::write`])
//!
//! Every tree lives in one [`arena::Arena`] and borrows its source buffer, so
//! both are held until the last page is written. Rendering has to wait for
//! all files to be parsed because `@Lister` tags link to other files'
//! pages, in date order.
//!
//! Markup errors are collected rather than raised: a file stops parsing at
//! its first error, keeps what it parsed so far, and the errors are reported
//! together once the run is over.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod arena;
pub mod build;
pub mod config;
pub mod highlight;
pub mod htmlrenderer;
pub mod node;
pub mod parser;
pub mod post;
pub mod token;
pub mod trie;
pub mod write;
