//! Error types for diagram embedding.

use std::path::PathBuf;

/// Error while parsing a diagram file into a [`DiagramDocument`](crate::DiagramDocument).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// XML syntax error (mismatched tags, bad attribute syntax, ...).
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute.
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error while decoding names or text.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// The document has no root element.
    #[error("document has no root element")]
    Empty,

    /// A second element follows the root element.
    #[error("unexpected content after the root element")]
    ExtraContent,

    /// The document ended while an element was still open.
    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// Error while embedding a single diagram reference.
///
/// Always contained to the reference it was raised for: the page transformer
/// logs it and leaves that reference untouched.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The diagram file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Resolved diagram path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The diagram file is not well-formed XML.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// Resolved diagram path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: DocumentError,
    },
}

/// Error that aborted the rewrite of a whole page.
///
/// The page transformer never returns it to callers; it logs it and hands back
/// the page unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The HTML rewriter failed.
    #[error("HTML rewrite failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
}
