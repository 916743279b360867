//! Built-site layout: page discovery and page-to-source mapping.

use std::path::{Path, PathBuf};

/// A rendered page in the site directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SitePage {
    /// Absolute path of the HTML file.
    pub path: PathBuf,
    /// Site-relative path with `/` separators (e.g. `guide/setup/index.html`).
    pub dest_path: String,
}

/// Collect every `*.html` file under `site_dir`, sorted by destination path.
pub(crate) fn collect_pages(site_dir: &Path) -> std::io::Result<Vec<SitePage>> {
    let mut pages = Vec::new();
    collect_pages_inner(site_dir, site_dir, &mut pages)?;
    pages.sort_by(|a, b| a.dest_path.cmp(&b.dest_path));
    Ok(pages)
}

fn collect_pages_inner(base: &Path, dir: &Path, pages: &mut Vec<SitePage>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_pages_inner(base, &path, pages)?;
        } else if is_html(&path)
            && let Ok(rel) = path.strip_prefix(base)
        {
            // Normalize to forward slashes
            let dest_path = rel.to_string_lossy().replace('\\', "/");
            pages.push(SitePage { path, dest_path });
        }
    }
    Ok(())
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

/// Directory holding the source file of the page rendered to `dest_path`.
///
/// With directory URLs, `a/b/index.html` comes from either `a/b.md` or
/// `a/b/index.md`; the former wins when it exists in `docs_dir`. Otherwise
/// the page's own directory mirrors its source directory.
pub(crate) fn source_dir_for(docs_dir: &Path, dest_path: &str, use_directory_urls: bool) -> PathBuf {
    let segments: Vec<&str> = dest_path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((file, parents)) = segments.split_last() else {
        return docs_dir.to_path_buf();
    };

    let parent_dir = parents
        .iter()
        .fold(docs_dir.to_path_buf(), |dir, segment| dir.join(segment));

    if use_directory_urls
        && *file == "index.html"
        && let Some((stem, grandparents)) = parents.split_last()
    {
        let grandparent_dir = grandparents
            .iter()
            .fold(docs_dir.to_path_buf(), |dir, segment| dir.join(segment));
        if grandparent_dir.join(format!("{stem}.md")).is_file() {
            return grandparent_dir;
        }
    }

    parent_dir
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_collect_pages_finds_nested_html() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));
        touch(&tmp.path().join("guide/setup/index.html"));
        touch(&tmp.path().join("static/viewer-static.min.js"));
        touch(&tmp.path().join("img/logo.png"));

        let pages = collect_pages(tmp.path()).unwrap();

        let dest: Vec<&str> = pages.iter().map(|p| p.dest_path.as_str()).collect();
        assert_eq!(dest, vec!["guide/setup/index.html", "index.html"]);
        assert_eq!(pages[1].path, tmp.path().join("index.html"));
    }

    #[test]
    fn test_collect_pages_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();

        assert!(collect_pages(&tmp.path().join("absent")).is_err());
    }

    #[test]
    fn test_source_dir_for_root_index() {
        let docs = Path::new("/docs");

        assert_eq!(source_dir_for(docs, "index.html", true), PathBuf::from("/docs"));
        assert_eq!(source_dir_for(docs, "index.html", false), PathBuf::from("/docs"));
    }

    #[test]
    fn test_source_dir_for_directory_url_from_markdown_file() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("guide/setup.md"));

        assert_eq!(
            source_dir_for(tmp.path(), "guide/setup/index.html", true),
            tmp.path().join("guide")
        );
    }

    #[test]
    fn test_source_dir_for_directory_url_from_section_index() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("guide/index.md"));

        assert_eq!(
            source_dir_for(tmp.path(), "guide/index.html", true),
            tmp.path().join("guide")
        );
    }

    #[test]
    fn test_source_dir_for_flat_urls() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("guide/setup.md"));

        assert_eq!(
            source_dir_for(tmp.path(), "guide/setup.html", false),
            tmp.path().join("guide")
        );
        assert_eq!(
            source_dir_for(tmp.path(), "guide/setup/index.html", false),
            tmp.path().join("guide/setup")
        );
    }
}
