//! Diagram reference resolution.
//!
//! Rendered pages reference diagrams relative to the page's *output* location.
//! With directory URLs a page `guide/setup.md` is written to
//! `guide/setup/index.html`, so the renderer prefixes sibling references with
//! one `../`. Dropping that single segment and joining with the page's source
//! directory recovers the file next to the Markdown source.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Parent-directory prefix added by the page renderer.
const PARENT_PREFIX: &str = "../";

/// Resolve a diagram reference to the diagram's path on disk.
///
/// Percent-escapes are decoded, one leading `../` segment is removed (only the
/// literal segment, never a run of `.` and `/` characters), and the result is
/// joined with `page_source_dir`. The file is not checked for existence; a
/// missing file surfaces as a read error when the diagram is loaded.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use mkdrawio_embed::resolve_reference;
///
/// let dir = Path::new("/docs/guide");
/// assert_eq!(resolve_reference(dir, "../flow.drawio"), PathBuf::from("/docs/guide/flow.drawio"));
/// assert_eq!(resolve_reference(dir, "img/My%20Flow.drawio"), PathBuf::from("/docs/guide/img/My Flow.drawio"));
/// ```
pub fn resolve_reference(page_source_dir: &Path, reference: &str) -> PathBuf {
    let decoded = percent_decode_str(reference).decode_utf8_lossy();
    let relative = decoded
        .strip_prefix(PARENT_PREFIX)
        .unwrap_or(decoded.as_ref());
    page_source_dir.join(relative)
}
