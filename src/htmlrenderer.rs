//! Renders a [`Document`] into the HTML that goes inside a page's content
//! `<div>`. Node text is emitted verbatim; only code blocks are escaped (by
//! [`crate::highlight`]). The surrounding page document lives in
//! [`crate::write`].

use crate::highlight::highlight;
use crate::node::{first_date, Date, Document, Node, NodeKind, Style};
use crate::post::Post;
use chrono::Month;
use std::fmt::{self, Write};

/// Renders `document` into `w`. `posts` is the full date-sorted file list
/// used to resolve `@Lister` nodes, and `current` is the source filename of
/// the file being rendered, which listers never link to.
pub fn render<W: Write>(
    w: &mut W,
    document: Document,
    posts: &[Post],
    current: &str,
) -> fmt::Result {
    HtmlRenderer::new(posts, current).render(w, document)
}

/// Walks one sibling sequence. List items are rendered by a fresh renderer,
/// so paragraph and thumbnail state never leak into or out of a list.
struct HtmlRenderer<'p, 'a> {
    posts: &'p [Post<'a>],
    current: &'p str,
    paragraph_open: bool,
    thumbnails_open: bool,
    date_shown: bool,
}

impl<'p, 'a> HtmlRenderer<'p, 'a> {
    fn new(posts: &'p [Post<'a>], current: &'p str) -> Self {
        HtmlRenderer {
            posts,
            current,
            paragraph_open: false,
            thumbnails_open: false,
            date_shown: false,
        }
    }

    fn render<W: Write>(&mut self, w: &mut W, document: Document) -> fmt::Result {
        let date = first_date(document);
        for (i, node) in document.iter().enumerate() {
            let previous = i.checked_sub(1).map(|i| &document[i]);
            let next = document.get(i + 1);
            self.on_node(w, node, previous, next, date)?;
        }
        Ok(())
    }

    fn on_node<W: Write>(
        &mut self,
        w: &mut W,
        node: &Node,
        previous: Option<&Node>,
        next: Option<&Node>,
        date: Option<Date>,
    ) -> fmt::Result {
        match node.kind {
            NodeKind::Title(text) => {
                writeln!(w, "<h1>{}</h1>", text)?;
                if let (false, Some(date)) = (self.date_shown, date) {
                    self.date_shown = true;
                    writeln!(
                        w,
                        "<h2>{} {} {}</h2>",
                        date.day,
                        month_name(date.month),
                        date.year
                    )?;
                }
                Ok(())
            }
            NodeKind::SubTitle(text) => {
                if let Some(previous) = previous {
                    if !matches!(previous.kind, NodeKind::Title(_)) {
                        writeln!(w, "<hr><br>")?;
                    }
                }
                writeln!(w, "<h2>{}</h2>", text)
            }
            NodeKind::Text(text) => self.on_text(w, text, node.style, next),
            NodeKind::ParagraphBreak => {
                if self.paragraph_open {
                    self.paragraph_open = false;
                    w.write_str("</p>")?;
                }
                Ok(())
            }
            NodeKind::UnorderedList(items) => self.on_list(w, "ul", items),
            NodeKind::OrderedList { items, .. } => self.on_list(w, "ol", items),
            NodeKind::Code { code, .. } => {
                w.write_str(r#"<div class="code"><pre>"#)?;
                highlight(w, code)?;
                w.write_str("</pre></div>")
            }
            NodeKind::YouTube(link) => write!(
                w,
                concat!(
                    r#"<div class="youtube"><iframe width="100%" height="315" src="{}" "#,
                    r#"frameborder="0" allow="accelerometer; autoplay; encrypted-media; "#,
                    r#"gyroscope; picture-in-picture" allowfullscreen></iframe></div>"#,
                ),
                link.replacen("watch?v=", "embed/", 1),
            ),
            NodeKind::Image(link) => writeln!(
                w,
                r#"<div class="image_container"><img class="image" src="{}"></div>"#,
                link
            ),
            NodeKind::ThumbnailImage(link) => {
                if !self.thumbnails_open {
                    self.thumbnails_open = true;
                    w.write_str(r#"<div class="thumbnail_image_container">"#)?;
                }
                write!(
                    w,
                    r#"<a href="{0}"><img class="thumbnail_image" src="{0}"></a>"#,
                    link
                )?;
                let group_continues =
                    matches!(next.map(|n| n.kind), Some(NodeKind::ThumbnailImage(_)));
                if !group_continues {
                    self.thumbnails_open = false;
                    writeln!(w, "</div>")?;
                }
                Ok(())
            }
            NodeKind::Link { text, url } => match self.paragraph_open {
                true => write!(w, r#"<a class="link" href="{}">{}</a>"#, url, text),
                false => write!(
                    w,
                    concat!(
                        r#"<div class="standalone_link_container">"#,
                        r#"<a class="link" href="{}">{}</a></div>"#,
                    ),
                    url, text
                ),
            },
            NodeKind::FeatureButton {
                image_path,
                text,
                link,
            } => {
                writeln!(w, r#"<div class="feature_button">"#)?;
                writeln!(w, r#"<a href="{}">"#, link)?;
                writeln!(
                    w,
                    r#"<div class="feature_button_image" style="background-image: url('{}');"></div>"#,
                    image_path
                )?;
                writeln!(w, r#"<div class="feature_button_text">"#)?;
                writeln!(w, "{}", text)?;
                writeln!(w, "</div>")?;
                writeln!(w, "</a>")?;
                writeln!(w, "</div>")
            }
            NodeKind::Lister(prefix) => self.on_lister(w, prefix),
            NodeKind::PageTitle(_) | NodeKind::Description(_) | NodeKind::Date(_) => Ok(()),
        }
    }

    fn on_text<W: Write>(
        &mut self,
        w: &mut W,
        text: &str,
        style: Style,
        next: Option<&Node>,
    ) -> fmt::Result {
        const TAGS: [(Style, &str, &str); 4] = [
            (Style::BOLD, "<strong>", "</strong>"),
            (Style::UNDERLINE, "<u>", "</u>"),
            (Style::ITALIC, "<i>", "</i>"),
            (Style::MONOSPACE, r#"<span class="monospace">"#, "</span>"),
        ];

        if !self.paragraph_open {
            self.paragraph_open = true;
            w.write_str("<p>")?;
        }
        for (flag, open, _) in TAGS.iter() {
            if style.contains(*flag) {
                w.write_str(open)?;
            }
        }
        w.write_str(text)?;
        for (flag, _, close) in TAGS.iter().rev() {
            if style.contains(*flag) {
                w.write_str(close)?;
            }
        }

        if !next.map_or(false, |n| n.is_text() || n.is_link()) {
            self.paragraph_open = false;
            w.write_str("</p>")?;
        }
        Ok(())
    }

    fn on_list<W: Write>(&mut self, w: &mut W, tag: &str, items: Document) -> fmt::Result {
        writeln!(w, "<{}>", tag)?;
        for item in items {
            w.write_str("<li>")?;
            HtmlRenderer::new(self.posts, self.current).render(w, std::slice::from_ref(item))?;
            w.write_str("</li>")?;
        }
        writeln!(w, "</{}>", tag)
    }

    fn on_lister<W: Write>(&mut self, w: &mut W, prefix: &str) -> fmt::Result {
        let matches = self
            .posts
            .iter()
            .filter(|post| post.source != self.current && post.source.starts_with(prefix));
        for post in matches {
            writeln!(
                w,
                r#"<a class="lister_link" href="{}">({}/{}/{}) {}</a>"#,
                post.paths.link, post.date.year, post.date.month, post.date.day, post.title
            )?;
        }
        Ok(())
    }
}

/// The English name of a 1-indexed month, or the number itself when it is
/// out of range.
fn month_name(month: i32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .map_or_else(|| month.to_string(), |month| month.name().to_owned())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arena::Arena;
    use crate::config::OutputFormats;
    use crate::parser::{parse, ErrorLog};
    use crate::post::sort_posts;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn render_source(source: &str) -> String {
        let arena = Arena::new();
        let mut errors = ErrorLog::new();
        let document = parse(&arena, source, "test.txt", &mut errors);
        assert!(errors.is_empty(), "{:?}", errors.errors());

        let mut out = String::new();
        render(&mut out, document, &[], "test.txt").unwrap();
        out
    }

    #[test]
    fn test_title_with_date_line() {
        assert_eq!(
            "<h1>Hello</h1>\n<h2>7 March 2024</h2>\n<h1>Again</h1>\n",
            render_source("@Date{2024-03-07}\n@Title{Hello}\n@Title{Again}"),
        );
    }

    #[test]
    fn test_month_name_fallback() {
        assert_eq!("January", month_name(1));
        assert_eq!("December", month_name(12));
        assert_eq!("0", month_name(0));
        assert_eq!("13", month_name(13));
        assert_eq!("-2", month_name(-2));
    }

    #[test]
    fn test_subtitle_rule() {
        assert_eq!(
            "<h2>First</h2>\n<h1>T</h1>\n<h2>Under title</h2>\n<hr><br>\n<h2>Later</h2>\n",
            render_source("@SubTitle{First}@Title{T}@SubTitle{Under title}@SubTitle{Later}"),
        );
    }

    #[test]
    fn test_paragraphs_and_styles() {
        assert_eq!(
            "<p>plain<i> slanted</i></p><p><u>under</u></p>",
            render_source("plain* slanted*\n\n|under|"),
        );
    }

    #[test]
    fn test_nested_styles_open_in_fixed_order() {
        assert_eq!(
            r#"<p><u><i><span class="monospace">x</span></i></u></p>"#,
            render_source("*`|x"),
        );
    }

    #[test]
    fn test_inline_and_standalone_links() {
        // Links never close a paragraph, so both stay inline.
        assert_eq!(
            r#"<p>see<a class="link" href="a.html">here</a><a class="link" href="b.html">there</a>"#,
            render_source(r#"see@Link{here,a.html}@Link{"there", "b.html"}"#),
        );
        assert_eq!(
            r#"<div class="standalone_link_container"><a class="link" href="b.html">there</a></div>"#,
            render_source(r#"@Link{"there", "b.html"}"#),
        );
    }

    #[test]
    fn test_thumbnail_group() {
        assert_eq!(
            concat!(
                r#"<div class="thumbnail_image_container">"#,
                r#"<a href="a.png"><img class="thumbnail_image" src="a.png"></a>"#,
                r#"<a href="b.png"><img class="thumbnail_image" src="b.png"></a>"#,
                "</div>\n",
                r#"<div class="image_container"><img class="image" src="c.png"></div>"#,
                "\n",
            ),
            render_source("@ThumbnailImage{a.png}@ThumbnailImage{b.png}@Image{c.png}"),
        );
    }

    #[test]
    fn test_youtube_embed() {
        let html = render_source(r#"@YouTube{"https://www.youtube.com/watch?v=abc"}"#);
        assert!(html.starts_with(
            r#"<div class="youtube"><iframe width="100%" height="315" src="https://www.youtube.com/embed/abc" "#
        ));
        assert!(html.ends_with("allowfullscreen></iframe></div>"));
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            concat!(
                r#"<div class="code"><pre>"#,
                r#"<span class="code_text" style="color: #f4b642;">int</span> x = "#,
                r#"<span class="code_text" style="color: #82c4e5;">1</span>; "#,
                r#"<span class="code_text" style="color: #8cba53;">// note</span>"#,
                "\n</pre></div>",
            ),
            render_source("@Code{int x = 1; // note\n}"),
        );
    }

    #[test]
    fn test_feature_button() {
        assert_eq!(
            concat!(
                "<div class=\"feature_button\">\n",
                "<a href=\"go.html\">\n",
                "<div class=\"feature_button_image\" style=\"background-image: url('i.png');\"></div>\n",
                "<div class=\"feature_button_text\">\n",
                "Go\n",
                "</div>\n",
                "</a>\n",
                "</div>\n",
            ),
            render_source(r#"@FeatureButton{"i.png", "Go", "go.html"}"#),
        );
    }

    #[test]
    fn test_lister_links_matching_files_in_sorted_order() {
        let arena = Arena::new();
        let mut errors = ErrorLog::new();
        let out = Path::new("generated");
        let formats = OutputFormats {
            html: true,
            ..OutputFormats::default()
        };
        let sources = [
            ("other.txt", "@Title{Other}@Date{2025-01-01}"),
            ("post-2.txt", "@Title{Second}@Date{2023-01-01}"),
            ("index.txt", "@Title{Index}@Lister{\"post\"}"),
            ("post-1.txt", "@Title{First}@Date{2024-01-01}"),
        ];
        let mut posts: Vec<Post> = sources
            .iter()
            .map(|(file, source)| {
                let document = parse(&arena, source, file, &mut errors);
                Post::new(&arena, document, file, out, formats)
            })
            .collect();
        sort_posts(&mut posts);

        let index = posts
            .iter()
            .find(|post| post.source == "index.txt")
            .unwrap();
        let mut html = String::new();
        render(&mut html, index.document, &posts, index.source).unwrap();
        assert_eq!(
            concat!(
                "<h1>Index</h1>\n",
                "<a class=\"lister_link\" href=\"post-1.html\">(2024/1/1) First</a>\n",
                "<a class=\"lister_link\" href=\"post-2.html\">(2023/1/1) Second</a>\n",
            ),
            html,
        );
    }

    #[test]
    fn test_lister_skips_the_current_file() {
        let arena = Arena::new();
        let mut errors = ErrorLog::new();
        let formats = OutputFormats::default();
        let document = parse(&arena, "@Title{Self}@Lister{\"post\"}", "post-0.txt", &mut errors);
        let posts = vec![Post::new(&arena, document, "post-0.txt", Path::new("generated"), formats)];

        let mut html = String::new();
        render(&mut html, document, &posts, "post-0.txt").unwrap();
        assert_eq!("<h1>Self</h1>\n", html);
    }

    #[test]
    fn test_lists_render_each_item() {
        let arena = Arena::new();
        let items = arena.alloc_slice_copy(&[
            Node::new(NodeKind::Text("one"), Style::NONE, 1),
            Node::new(NodeKind::Text("two"), Style::BOLD, 1),
        ]);
        let document = arena.alloc_slice_copy(&[Node::new(
            NodeKind::UnorderedList(items),
            Style::NONE,
            1,
        )]);
        let mut html = String::new();
        render(&mut html, document, &[], "x.txt").unwrap();
        assert_eq!(
            "<ul>\n<li><p>one</p></li><li><p><strong>two</strong></p></li></ul>\n",
            html
        );
    }
}
