//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a run: loading every input file, parsing each one into the shared
//! [`Arena`] ([`crate::parser`]), deriving [`Post`]s ([`crate::post`]),
//! sorting them, and writing the HTML pages ([`crate::write`]).
//!
//! Markup errors never stop a run. They are collected in an [`ErrorLog`] and
//! handed back in the [`Report`] once every file has been processed.

use crate::arena::Arena;
use crate::config::Config;
use crate::parser::{parse, ErrorLog, ParseError};
use crate::post::{sort_posts, Post};
use crate::write::{page_template, Error as WriteError, Writer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a run did.
#[derive(Debug, Default)]
pub struct Report {
    /// Posts that made it into the run (files that produced at least one
    /// node), in sorted order.
    pub posts: Vec<String>,

    pub pages_written: usize,

    /// Markup errors, in the order they were found.
    pub errors: Vec<ParseError>,

    /// Errors that did not fit in the error log.
    pub dropped_errors: usize,
}

/// An input file held in memory for the whole run.
struct Source {
    path: String,
    contents: String,
}

/// Builds the site from a [`Config`] object. Unreadable inputs are skipped
/// with a warning; unreadable header or footer files, template problems and
/// output failures abort the run.
pub fn build_site(config: &Config) -> Result<Report> {
    let header = load_fragment(config.html_header.as_deref())?;
    let footer = load_fragment(config.html_footer.as_deref())?;

    let formats = config.formats;
    if formats.is_empty() {
        warn!("No output format requested; pass --html to write pages");
    }
    if formats.html {
        info!("Outputting to HTML.");
    }
    if formats.markdown || formats.bbcode {
        warn!(
            markdown = formats.markdown,
            bbcode = formats.bbcode,
            "Markdown and BBCode output are not implemented; no such files will be written"
        );
    }

    let sources = load_sources(&config.inputs);
    let arena = Arena::new();
    let mut errors = ErrorLog::new();
    let mut posts: Vec<Post> = Vec::new();

    for source in &sources {
        info!(file = %source.path, "Processing file");
        let document = parse(&arena, &source.contents, &source.path, &mut errors);
        if document.is_empty() {
            debug!(file = %source.path, "no nodes; skipping");
            continue;
        }
        if posts.len() >= config.file_capacity {
            warn!(
                file = %source.path,
                capacity = config.file_capacity,
                "Too many input files; skipping"
            );
            continue;
        }

        let post = Post::new(
            &arena,
            document,
            &source.path,
            &config.output_directory,
            formats,
        );
        debug!(
            file = %source.path,
            nodes = document.len(),
            title = post.title,
            "parsed"
        );
        posts.push(post);
    }
    debug!(bytes = arena.allocated_bytes(), "arena usage");

    sort_posts(&mut posts);

    let template = page_template()?;
    let writer = Writer {
        template: &template,
        site: &config.site,
        header: &header,
        footer: &footer,
    };
    let pages_written = writer.write_posts(&posts)?;

    let dropped_errors = errors.dropped();
    Ok(Report {
        posts: posts.iter().map(|post| post.source.to_owned()).collect(),
        pages_written,
        errors: errors.into_errors(),
        dropped_errors,
    })
}

fn load_sources(inputs: &[String]) -> Vec<Source> {
    inputs
        .iter()
        .filter_map(|path| match std::fs::read(path) {
            Ok(bytes) => Some(Source {
                path: path.clone(),
                contents: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(err) => {
                warn!(file = %path, error = %err, "Could not read input file; skipping");
                None
            }
        })
        .collect()
}

// Reads an optional header/footer file. A missing option is an empty
// fragment.
fn load_fragment(path: Option<&Path>) -> Result<String> {
    match path {
        None => Ok(String::new()),
        Some(path) => std::fs::read_to_string(path).map_err(|err| Error::OpenFragment {
            path: path.to_owned(),
            err,
        }),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be while reading the
/// header or footer fragments or while writing pages.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors writing [`crate::post::Post`]s to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while reading header or footer files.
    OpenFragment { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Write(err) => err.fmt(f),
            Error::OpenFragment { path, err } => {
                write!(f, "Opening HTML fragment '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Write(err) => Some(err),
            Error::OpenFragment { path: _, err } => Some(err),
        }
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
