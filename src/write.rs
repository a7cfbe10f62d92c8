//! Turns [`Post`]s into complete HTML pages on disk. The page body comes from
//! [`crate::htmlrenderer`]; the document around it (head metadata, the
//! injected header and footer) comes from a built-in [`gtmpl`] template.

use crate::config::Site;
use crate::htmlrenderer;
use crate::post::Post;
use gtmpl::{Context, Template, Value};
use pulldown_cmark::escape::{escape_html, StrWrite};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::debug;

const PAGE_TEMPLATE: &str = include_str!("page-template.html");

/// Parses the built-in page template.
pub fn page_template() -> Result<Template> {
    let mut template = Template::default();
    template.parse(PAGE_TEMPLATE)?;
    Ok(template)
}

/// Renders and writes the HTML pages for a run.
pub struct Writer<'a> {
    /// The page document template, usually from [`page_template`].
    pub template: &'a Template,

    /// Metadata shared by every page's `<head>`.
    pub site: &'a Site,

    /// Raw HTML placed before each page's content.
    pub header: &'a str,

    /// Raw HTML placed after each page's content.
    pub footer: &'a str,
}

impl Writer<'_> {
    /// Renders `post` as a full page into `w`. `posts` is the sorted list of
    /// every post in the run, for resolving listers.
    pub fn write_page<W: io::Write>(&self, w: &mut W, post: &Post, posts: &[Post]) -> Result<()> {
        let mut content = String::new();
        htmlrenderer::render(&mut content, post.document, posts, post.source)?;

        let page = Page {
            post,
            site: self.site,
            header: self.header,
            footer: self.footer,
            content,
        };
        self.template.execute(w, &Context::from(page.to_value())?)?;
        Ok(())
    }

    /// Writes an HTML file for every post that asked for one, creating
    /// directories as needed. Returns the number of pages written.
    pub fn write_posts(&self, posts: &[Post]) -> Result<usize> {
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut written = 0;
        for post in posts.iter().filter(|post| post.formats.html) {
            let path = &post.paths.html;
            if let Some(dir) = path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir).map_err(|err| Error::Create {
                        path: dir.to_owned(),
                        err,
                    })?;
                }
            }

            let mut file = File::create(path).map_err(|err| Error::Create {
                path: path.clone(),
                err,
            })?;
            self.write_page(&mut file, post, posts)?;
            debug!(path = %path.display(), "wrote page");
            written += 1;
        }
        Ok(written)
    }
}

/// The values one page's template sees. Everything that lands in an
/// attribute or the `<title>` is escaped; the header, footer and content are
/// raw HTML.
struct Page<'p> {
    post: &'p Post<'p>,
    site: &'p Site,
    header: &'p str,
    footer: &'p str,
    content: String,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value::Object`]. Absent values become
    /// empty strings so the template never prints a placeholder.
    fn to_value(&self) -> Value {
        let escaped = |s: &str| Value::String(EscapeHtml(s).to_string());
        let optional = |s: &Option<String>| escaped(s.as_deref().unwrap_or_default());

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), escaped(self.post.title));
        m.insert(
            "description".to_owned(),
            escaped(self.post.description.unwrap_or_default()),
        );
        m.insert(
            "canonical".to_owned(),
            escaped(&self.site.canonical(&self.post.paths.url)),
        );
        m.insert("site_title".to_owned(), optional(&self.site.main_title));
        m.insert("author".to_owned(), optional(&self.site.author));
        m.insert("twitter_site".to_owned(), optional(&self.site.twitter_handle));
        m.insert("header".to_owned(), Value::String(self.header.to_owned()));
        m.insert("footer".to_owned(), Value::String(self.footer.to_owned()));
        m.insert("content".to_owned(), Value::String(self.content.clone()));
        Value::Object(m)
    }
}

struct Adaptor<'a, T> {
    formatter: &'a mut T,
    result: fmt::Result,
}

impl<T> Adaptor<'_, T> {
    fn handle_result(&mut self, result: fmt::Result) -> io::Result<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.result = result;
                Err(io::Error::new(io::ErrorKind::Other, e))
            }
        }
    }
}

impl<T: fmt::Write> StrWrite for Adaptor<'_, T> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        let result = self.formatter.write_str(s);
        self.handle_result(result)
    }

    fn write_fmt(&mut self, args: fmt::Arguments) -> io::Result<()> {
        let result = self.formatter.write_fmt(args);
        self.handle_result(result)
    }
}

/// Displays a string with `&`, `<`, `>` and `"` escaped.
struct EscapeHtml<'a>(&'a str);

impl Display for EscapeHtml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adaptor = Adaptor {
            formatter: f,
            result: Ok(()),
        };
        let _ = escape_html(&mut adaptor, self.0);
        adaptor.result
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error parsing or executing the page template.
    Template(String),

    /// An error rendering a page body.
    Render(fmt::Error),

    /// An output file or directory could not be created.
    Create { path: PathBuf, err: io::Error },

    /// An error writing an output file.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<fmt::Error> for Error {
    fn from(err: fmt::Error) -> Error {
        Error::Render(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Render(err) => write!(f, "Rendering page: {}", err),
            Error::Create { path, err } => {
                write!(f, "Creating '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Render(err) => Some(err),
            Error::Create { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
