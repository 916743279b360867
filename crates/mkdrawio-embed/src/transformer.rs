//! Page transformation.
//!
//! [`PageTransformer`] rewrites a rendered HTML page: every `<img>` whose
//! `src` names a diagram file is replaced with an embedded viewer widget, and
//! a `<script>` loading the viewer is added at the end of `<body>`.
//!
//! Failures are contained. A diagram that cannot be read or parsed keeps its
//! original `<img>`; a page that cannot be rewritten at all is returned as-is.

use std::borrow::Cow;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use lol_html::html_content::{ContentType, EndTag};
use lol_html::{EndTagHandler, RewriteStrSettings, element, end, rewrite_str};

use crate::cache::DiagramCache;
use crate::consts::DEFAULT_FILE_EXTENSION;
use crate::error::{EmbedError, PageError};
use crate::extractor::extract;
use crate::html_embed::embed_diagram;
use crate::resolver::resolve_reference;

/// Result of transforming one page.
#[derive(Debug)]
pub struct PageOutcome<'a> {
    /// Page HTML; borrowed from the input when nothing changed.
    pub html: Cow<'a, str>,
    /// Diagram references replaced with widgets.
    pub embedded: usize,
    /// Diagram references left in place because they failed.
    pub failed: usize,
}

impl<'a> PageOutcome<'a> {
    fn unchanged(html: &'a str) -> Self {
        Self {
            html: Cow::Borrowed(html),
            embedded: 0,
            failed: 0,
        }
    }
}

/// Replaces diagram references in rendered pages with embedded diagrams.
///
/// One transformer serves a whole build: it owns the [`DiagramCache`], so a
/// diagram shared by several pages is parsed once. It can be shared across
/// threads to transform pages in parallel.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use mkdrawio_embed::PageTransformer;
///
/// let transformer = PageTransformer::new(".drawio");
/// let html = r#"<html><body><img src="../flow.drawio" alt="Overview"></body></html>"#;
/// let page = transformer.transform(html, Path::new("docs/guide"), "../static/viewer-static.min.js");
/// ```
pub struct PageTransformer {
    /// Diagram file extension, lowercased.
    file_extension: String,
    cache: DiagramCache,
}

impl PageTransformer {
    /// Create a transformer matching references that contain `file_extension`
    /// (compared case-insensitively).
    #[must_use]
    pub fn new(file_extension: impl Into<String>) -> Self {
        Self {
            file_extension: file_extension.into().to_ascii_lowercase(),
            cache: DiagramCache::new(),
        }
    }

    /// Use `cache` for diagram loading instead of a fresh filesystem cache.
    #[must_use]
    pub fn with_cache(mut self, cache: DiagramCache) -> Self {
        self.cache = cache;
        self
    }

    /// The diagram file extension references are matched against.
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    /// The diagram cache shared by all pages.
    pub fn cache(&self) -> &DiagramCache {
        &self.cache
    }

    /// Transform a rendered page.
    ///
    /// `page_source_dir` is the directory of the page's source file, which
    /// diagram references are resolved against. `viewer_script` is the
    /// `<script src>` value for the viewer, relative to the page.
    ///
    /// Returns the input unchanged (borrowed) if the page references no
    /// diagrams or cannot be processed.
    pub fn transform<'a>(
        &self,
        html: &'a str,
        page_source_dir: &Path,
        viewer_script: &str,
    ) -> Cow<'a, str> {
        self.transform_page(html, page_source_dir, viewer_script)
            .html
    }

    /// Transform a rendered page, reporting how many diagrams were embedded.
    ///
    /// See [`transform`](Self::transform).
    pub fn transform_page<'a>(
        &self,
        html: &'a str,
        page_source_dir: &Path,
        viewer_script: &str,
    ) -> PageOutcome<'a> {
        if !contains_ignore_ascii_case(html, &self.file_extension) {
            return PageOutcome::unchanged(html);
        }

        match self.rewrite(html, page_source_dir, viewer_script) {
            Ok(Some((rewritten, embedded, failed))) => PageOutcome {
                html: Cow::Owned(rewritten),
                embedded,
                failed,
            },
            Ok(None) => PageOutcome::unchanged(html),
            Err(err) => {
                tracing::error!(error = %err, "error processing page content");
                PageOutcome::unchanged(html)
            }
        }
    }

    /// Build the widget markup for one diagram reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the diagram file cannot be read or parsed.
    pub fn substitute(
        &self,
        page_source_dir: &Path,
        reference: &str,
        sheet: Option<&str>,
    ) -> Result<String, EmbedError> {
        let path = resolve_reference(page_source_dir, reference);
        let document = self.cache.get_or_load(&path)?;
        Ok(embed_diagram(&extract(&document, sheet)))
    }

    /// Rewrite the page. Returns `None` if no `<img>` references a diagram.
    fn rewrite(
        &self,
        html: &str,
        page_source_dir: &Path,
        viewer_script: &str,
    ) -> Result<Option<(String, usize, usize)>, PageError> {
        let script: Rc<str> = Rc::from(script_tag(viewer_script));
        let matched = Rc::new(Cell::new(0usize));
        let embedded = Cell::new(0usize);
        let failed = Cell::new(0usize);
        let script_inserted = Rc::new(Cell::new(false));

        let rewritten = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("img[src]", |el| {
                        let Some(raw_src) = el.get_attribute("src") else {
                            return Ok(());
                        };
                        let src = decode_attr(&raw_src);
                        if !contains_ignore_ascii_case(&src, &self.file_extension) {
                            return Ok(());
                        }
                        matched.set(matched.get() + 1);

                        let alt = el.get_attribute("alt");
                        let sheet = alt.as_deref().map(decode_attr);
                        match self.substitute(page_source_dir, &src, sheet.as_deref()) {
                            Ok(widget) => {
                                el.replace(&widget, ContentType::Html);
                                embedded.set(embedded.get() + 1);
                            }
                            Err(err) => {
                                tracing::warn!(reference = %raw_src, error = %err, "failed to process diagram");
                                failed.set(failed.get() + 1);
                            }
                        }
                        Ok(())
                    }),
                    element!("body", |el| {
                        let matched = Rc::clone(&matched);
                        let script = Rc::clone(&script);
                        let script_inserted = Rc::clone(&script_inserted);
                        if let Some(handlers) = el.end_tag_handlers() {
                            let handler: EndTagHandler<'static> =
                                Box::new(move |end: &mut EndTag<'_>| {
                                    if matched.get() > 0 && !script_inserted.get() {
                                        end.before(&script, ContentType::Html);
                                        script_inserted.set(true);
                                    }
                                    Ok(())
                                });
                            handlers.push(handler);
                        }
                        Ok(())
                    }),
                ],
                // Covers pages without <body> and bodies whose end tag is omitted
                document_content_handlers: vec![end!(|end| {
                    if matched.get() > 0 && !script_inserted.get() {
                        end.append(&script, ContentType::Html);
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )?;

        if matched.get() == 0 {
            return Ok(None);
        }
        Ok(Some((rewritten, embedded.get(), failed.get())))
    }
}

impl Default for PageTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_EXTENSION)
    }
}

/// `<script>` element loading the viewer from `src`.
fn script_tag(src: &str) -> String {
    format!(
        r#"<script src="{}"></script>"#,
        quick_xml::escape::escape(src)
    )
}

/// Decode entities in a raw attribute value, keeping it as-is if it contains
/// references XML does not know.
fn decode_attr(raw: &str) -> String {
    quick_xml::escape::unescape(raw).map_or_else(|_| raw.to_owned(), Cow::into_owned)
}

/// Case-insensitive (ASCII) substring test.
fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
