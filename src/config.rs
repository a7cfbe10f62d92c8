//! Builds a [`Config`] from the command line and an optional YAML site file.
//! Values given on the command line win over the site file.
//!
//! A site file looks like this (every key is optional):
//!
//! ```yaml
//! main_title: My Blog
//! author: Jane Doe
//! twitter_handle: "@jane"
//! canonical_url: https://example.com
//! html_header: header.html
//! html_footer: footer.html
//! ```
//!
//! Relative `html_header`/`html_footer` paths are resolved against the
//! directory holding the site file.

use anyhow::{anyhow, Result};
use clap::{App, Arg, ArgMatches};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The directory pages are written under unless a caller overrides it.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "generated";

/// The most files a single run will process. Further files are skipped.
pub const FILE_CAPACITY: usize = 1024;

/// Which output formats were requested. Only HTML is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputFormats {
    pub html: bool,
    pub markdown: bool,
    pub bbcode: bool,
}

impl OutputFormats {
    pub fn is_empty(&self) -> bool {
        !(self.html || self.markdown || self.bbcode)
    }
}

/// Site-wide metadata that goes into every page's `<head>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Site {
    pub main_title: Option<String>,
    pub author: Option<String>,
    pub twitter_handle: Option<String>,
    pub canonical_url: Option<Url>,
}

impl Site {
    /// The canonical URL for the page at `url`, relative to the site root.
    pub fn canonical(&self, url: &str) -> String {
        let base = self
            .canonical_url
            .as_ref()
            .map_or("", |base| base.as_str().trim_end_matches('/'));
        format!("{}/{}", base, url)
    }
}

/// The on-disk shape of a site file.
#[derive(Deserialize, Default)]
struct SiteFile {
    main_title: Option<String>,
    author: Option<String>,
    twitter_handle: Option<String>,
    canonical_url: Option<String>,
    html_header: Option<PathBuf>,
    html_footer: Option<PathBuf>,
}

/// Everything a build needs.
#[derive(Clone, Debug)]
pub struct Config {
    /// Input files, in the order they were given.
    pub inputs: Vec<String>,
    pub formats: OutputFormats,
    pub site: Site,

    /// Raw HTML injected before the rendered content of every page.
    pub html_header: Option<PathBuf>,

    /// Raw HTML injected after the rendered content of every page.
    pub html_footer: Option<PathBuf>,

    pub output_directory: PathBuf,

    /// How many files a run keeps before it starts skipping them.
    pub file_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            inputs: Vec::new(),
            formats: OutputFormats::default(),
            site: Site::default(),
            html_header: None,
            html_footer: None,
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            file_capacity: FILE_CAPACITY,
        }
    }
}

/// The command line interface.
pub fn app() -> App<'static, 'static> {
    App::new("quill")
        .about("Compiles tag-based markup files into a blog")
        .arg(
            Arg::with_name("html")
                .long("html")
                .help("Write an HTML page for every input"),
        )
        .arg(
            Arg::with_name("markdown")
                .long("markdown")
                .help("Request Markdown output (not implemented)"),
        )
        .arg(
            Arg::with_name("bbcode")
                .long("bbcode")
                .help("Request BBCode output (not implemented)"),
        )
        .arg(
            Arg::with_name("html_header")
                .long("html_header")
                .takes_value(true)
                .value_name("PATH")
                .help("File whose contents are injected before each page's content"),
        )
        .arg(
            Arg::with_name("html_footer")
                .long("html_footer")
                .takes_value(true)
                .value_name("PATH")
                .help("File whose contents are injected after each page's content"),
        )
        .arg(
            Arg::with_name("main_title")
                .long("main_title")
                .takes_value(true)
                .help("The site's title"),
        )
        .arg(
            Arg::with_name("author")
                .long("author")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("twitter_handle")
                .long("twitter_handle")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("canonical_url")
                .long("canonical_url")
                .takes_value(true)
                .value_name("URL")
                .help("Absolute URL the site is served from"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .value_name("PATH")
                .help("YAML site file"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Log per-file details"),
        )
        .arg(
            Arg::with_name("inputs")
                .multiple(true)
                .value_name("FILE")
                .help("Markup files to compile"),
        )
}

impl Config {
    /// Builds a [`Config`] from parsed command line arguments, loading the
    /// site file first if `--config` was given.
    pub fn from_matches(matches: &ArgMatches) -> Result<Config> {
        let (site_file, site_root) = match matches.value_of("config") {
            Some(path) => {
                let path = Path::new(path);
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (Config::load_site_file(path)?, root)
            }
            None => (SiteFile::default(), PathBuf::new()),
        };

        let value = |name: &str, fallback: Option<String>| {
            matches.value_of(name).map(str::to_owned).or(fallback)
        };
        let path = |name: &str, fallback: Option<PathBuf>| match matches.value_of(name) {
            Some(path) => Some(PathBuf::from(path)),
            None => fallback.map(|path| site_root.join(path)),
        };

        let canonical_url = match value("canonical_url", site_file.canonical_url) {
            Some(url) => Some(
                Url::parse(&url).map_err(|e| anyhow!("Invalid canonical URL `{}`: {}", url, e))?,
            ),
            None => None,
        };

        Ok(Config {
            inputs: matches
                .values_of("inputs")
                .map(|inputs| inputs.map(str::to_owned).collect())
                .unwrap_or_default(),
            formats: OutputFormats {
                html: matches.is_present("html"),
                markdown: matches.is_present("markdown"),
                bbcode: matches.is_present("bbcode"),
            },
            site: Site {
                main_title: value("main_title", site_file.main_title),
                author: value("author", site_file.author),
                twitter_handle: value("twitter_handle", site_file.twitter_handle),
                canonical_url,
            },
            html_header: path("html_header", site_file.html_header),
            html_footer: path("html_footer", site_file.html_footer),
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            file_capacity: FILE_CAPACITY,
        })
    }

    fn load_site_file(path: &Path) -> Result<SiteFile> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Opening site file `{}`: {}", path.display(), e))?;
        serde_yaml::from_reader(file)
            .map_err(|e| anyhow!("Loading site file `{}`: {}", path.display(), e))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn config(args: &[&str]) -> Result<Config> {
        let matches = app().get_matches_from_safe(args.iter())?;
        Config::from_matches(&matches)
    }

    #[test]
    fn test_flags_and_inputs() -> Result<()> {
        let config = config(&[
            "quill",
            "--html",
            "--bbcode",
            "--main_title",
            "My Blog",
            "--canonical_url",
            "https://example.com/",
            "b.txt",
            "a.txt",
        ])?;
        assert_eq!(vec!["b.txt", "a.txt"], config.inputs);
        assert_eq!(
            OutputFormats {
                html: true,
                markdown: false,
                bbcode: true
            },
            config.formats
        );
        assert_eq!(Some("My Blog".to_owned()), config.site.main_title);
        assert_eq!(None, config.site.author);
        assert_eq!("https://example.com/post", config.site.canonical("post"));
        assert_eq!(PathBuf::from("generated"), config.output_directory);
        assert_eq!(FILE_CAPACITY, config.file_capacity);
        Ok(())
    }

    #[test]
    fn test_invalid_canonical_url() {
        assert!(config(&["quill", "--canonical_url", "not a url"]).is_err());
    }

    #[test]
    fn test_canonical_without_base() {
        assert_eq!("/post", Site::default().canonical("post"));
    }

    #[test]
    fn test_site_file_with_overrides() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let site_path = dir.path().join("site.yaml");
        let mut file = File::create(&site_path)?;
        writeln!(file, "main_title: From File")?;
        writeln!(file, "author: Jane")?;
        writeln!(file, "html_header: header.html")?;
        drop(file);

        let site_path = site_path.to_string_lossy().into_owned();
        let config = config(&[
            "quill",
            "--config",
            &site_path,
            "--main_title",
            "From Flag",
        ])?;
        assert_eq!(Some("From Flag".to_owned()), config.site.main_title);
        assert_eq!(Some("Jane".to_owned()), config.site.author);
        assert_eq!(Some(dir.path().join("header.html")), config.html_header);
        assert_eq!(None, config.html_footer);
        Ok(())
    }

    #[test]
    fn test_missing_site_file() {
        assert!(config(&["quill", "--config", "/nonexistent/site.yaml"]).is_err());
    }
}
