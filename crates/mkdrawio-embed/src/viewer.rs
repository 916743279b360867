//! Viewer script asset.
//!
//! Pages with embedded diagrams load a small client-side viewer that renders
//! every `div.mxgraph` container. The script ships inside this crate and is
//! written to disk once, then published into each built site under
//! `static/viewer-static.min.js`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::{STATIC_DIR, VIEWER_SCRIPT_FILENAME};

/// Bundled viewer script contents.
pub const VIEWER_SCRIPT: &str = include_str!("../static/viewer-static.min.js");

/// The viewer script on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerAsset {
    path: PathBuf,
}

impl ViewerAsset {
    /// Make sure the viewer script exists in `dir`, writing it if absent.
    ///
    /// An existing file is left untouched, even if its contents differ from
    /// the bundled script.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created or the script cannot be written.
    pub fn bootstrap(dir: &Path) -> io::Result<Self> {
        let path = dir.join(VIEWER_SCRIPT_FILENAME);
        if path.exists() {
            tracing::debug!(path = %path.display(), "viewer script already present");
        } else {
            fs::create_dir_all(dir)?;
            fs::write(&path, VIEWER_SCRIPT)?;
            tracing::debug!(path = %path.display(), "wrote viewer script");
        }
        Ok(Self { path })
    }

    /// Location of the bootstrapped script.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Site-relative output path of the script (`static/viewer-static.min.js`).
    pub fn output_path() -> String {
        format!("{STATIC_DIR}/{VIEWER_SCRIPT_FILENAME}")
    }

    /// Copy the script into `site_dir` at [`output_path`](Self::output_path).
    ///
    /// # Errors
    ///
    /// Returns an error if the target directory cannot be created or the copy fails.
    pub fn publish(&self, site_dir: &Path) -> io::Result<PathBuf> {
        let target = site_dir.join(STATIC_DIR).join(VIEWER_SCRIPT_FILENAME);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.path, &target)?;
        Ok(target)
    }

    /// `<script src>` value for a page written to `page_dest_path`.
    ///
    /// `page_dest_path` is the page's site-relative output path; the result is
    /// relative to the directory containing it.
    ///
    /// # Examples
    ///
    /// ```
    /// use mkdrawio_embed::ViewerAsset;
    ///
    /// assert_eq!(ViewerAsset::href_for("index.html"), "static/viewer-static.min.js");
    /// assert_eq!(ViewerAsset::href_for("guide/setup/index.html"), "../../static/viewer-static.min.js");
    /// ```
    pub fn href_for(page_dest_path: &str) -> String {
        relative_path(page_dest_path, &Self::output_path())
    }
}

/// Relative URL from the document at `from` to `to`.
///
/// Both are site-relative paths with `/` separators. The last segment of
/// `from` is the document itself, so only its directory counts.
fn relative_path(from: &str, to: &str) -> String {
    let from = from.replace('\\', "/");
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = "../".repeat(from_dir.len() - common);
    format!("{ups}{}", to_segs[common..].join("/"))
}
