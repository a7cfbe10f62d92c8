//! Defines [`Post`], the per-file record built once a source file has been
//! parsed, and [`sort_posts`], which puts the whole run's posts in reverse
//! chronological order before anything is rendered.

use crate::arena::Arena;
use crate::config::OutputFormats;
use crate::node::{first_date, Date, Document, NodeKind};
use std::path::{Component, Path, PathBuf};

/// One parsed input file and everything derived from it.
#[derive(Clone, Debug)]
pub struct Post<'a> {
    /// The file's top-level nodes.
    pub document: Document<'a>,

    /// The input path exactly as it was given. Listers match against this.
    pub source: &'a str,

    /// The `@PageTitle`, else the first `@Title`, else empty. Copied into the
    /// arena.
    pub title: &'a str,

    /// The first `@Description`, copied into the arena.
    pub description: Option<&'a str>,

    /// The first `@Date`, else `0/0/0`.
    pub date: Date,

    pub paths: OutputPaths,
    pub formats: OutputFormats,
}

impl<'a> Post<'a> {
    /// Derives a [`Post`] from a parsed `document`. Output paths are rooted
    /// at `output_directory`.
    pub fn new(
        arena: &'a Arena,
        document: Document<'a>,
        source: &'a str,
        output_directory: &Path,
        formats: OutputFormats,
    ) -> Post<'a> {
        let page_title = document.iter().find_map(|node| match node.kind {
            NodeKind::PageTitle(text) => Some(text),
            _ => None,
        });
        let title = page_title.or_else(|| {
            document.iter().find_map(|node| match node.kind {
                NodeKind::Title(text) => Some(text),
                _ => None,
            })
        });
        let description = document.iter().find_map(|node| match node.kind {
            NodeKind::Description(text) => Some(text),
            _ => None,
        });

        Post {
            document,
            source,
            title: arena.alloc_str(title.unwrap_or_default()),
            description: description.map(|text| arena.alloc_str(text)),
            date: first_date(document).unwrap_or_default(),
            paths: OutputPaths::new(output_directory, source),
            formats,
        }
    }
}

/// Sorts `posts` by date, newest first. Posts with equal dates keep their
/// relative order.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Where a [`Post`]'s pages go. For an input `dir/name.ext` and the output
/// directory `generated`, the page URL is `dir/name` and the HTML file is
/// `generated/dir/name.html`. Only the normal components of the input path
/// are kept, so the pages always land inside the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    /// The page's URL relative to the site root, without an extension.
    pub url: String,

    /// The HTML page's path relative to the output directory. Listers link
    /// here.
    pub link: String,

    pub html: PathBuf,
    pub markdown: PathBuf,
    pub bbcode: PathBuf,
}

impl OutputPaths {
    pub fn new(output_directory: &Path, source: &str) -> OutputPaths {
        let mut parts: Vec<String> = Path::new(source)
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if let Some(name) = parts.last_mut() {
            if let Some(period) = name.rfind('.') {
                name.truncate(period);
            }
        }

        let url = parts.join("/");
        let with_extension = |extension: &str| {
            let mut path = output_directory.to_path_buf();
            path.extend(&parts);
            let mut path = path.into_os_string();
            path.push(".");
            path.push(extension);
            PathBuf::from(path)
        };

        OutputPaths {
            link: format!("{}.html", url),
            html: with_extension("html"),
            markdown: with_extension("md"),
            bbcode: with_extension("bbcode"),
            url,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::{parse, ErrorLog};
    use pretty_assertions::assert_eq;

    fn post<'a>(arena: &'a Arena, source: &'a str, file: &'a str) -> Post<'a> {
        let mut errors = ErrorLog::new();
        let document = parse(arena, source, file, &mut errors);
        assert!(errors.is_empty(), "{:?}", errors.errors());
        Post::new(
            arena,
            document,
            file,
            Path::new("generated"),
            OutputFormats::default(),
        )
    }

    #[test]
    fn test_title_prefers_page_title() {
        let arena = Arena::new();
        let with_page_title = post(&arena, "@Title{Shown}@PageTitle{Head}", "a.txt");
        assert_eq!("Head", with_page_title.title);

        let with_titles = post(&arena, "@Title{First}@Title{Second}", "b.txt");
        assert_eq!("First", with_titles.title);

        let untitled = post(&arena, "just text", "c.txt");
        assert_eq!("", untitled.title);
        assert_eq!(None, untitled.description);
    }

    #[test]
    fn test_description_and_date() {
        let arena = Arena::new();
        let p = post(
            &arena,
            "@Description{\"About things\"}@Date{2021-02-03}@Date{1999-01-01}",
            "d.txt",
        );
        assert_eq!(Some("About things"), p.description);
        assert_eq!(Date::new(2021, 2, 3), p.date);
    }

    #[test]
    fn test_missing_date_sorts_as_zero() {
        let arena = Arena::new();
        assert_eq!(Date::new(0, 0, 0), post(&arena, "x", "e.txt").date);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let arena = Arena::new();
        let mut posts = vec![
            post(&arena, "@Title{a}@Date{2023-01-01}", "a.txt"),
            post(&arena, "@Title{b}@Date{2024-06-15}", "b.txt"),
            post(&arena, "@Title{c}@Date{2023-01-01}", "c.txt"),
        ];
        sort_posts(&mut posts);
        let order: Vec<&str> = posts.iter().map(|p| p.source).collect();
        assert_eq!(vec!["b.txt", "a.txt", "c.txt"], order);
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::new(Path::new("generated"), "blog/first.post.txt");
        assert_eq!("blog/first.post", paths.url);
        assert_eq!("blog/first.post.html", paths.link);
        assert_eq!(PathBuf::from("generated/blog/first.post.html"), paths.html);
        assert_eq!(PathBuf::from("generated/blog/first.post.md"), paths.markdown);
        assert_eq!(
            PathBuf::from("generated/blog/first.post.bbcode"),
            paths.bbcode
        );
    }

    #[test]
    fn test_output_paths_stay_inside_output_directory() {
        let paths = OutputPaths::new(Path::new("out"), "/etc/../../secret.txt");
        assert_eq!("etc/secret", paths.url);
        assert_eq!(PathBuf::from("out/etc/secret.html"), paths.html);

        let paths = OutputPaths::new(Path::new("out"), "./page");
        assert_eq!("page", paths.url);
        assert_eq!(PathBuf::from("out/page.html"), paths.html);
    }
}
