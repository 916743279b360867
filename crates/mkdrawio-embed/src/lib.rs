//! Inline draw.io diagrams in rendered documentation pages.
//!
//! Pages reference diagrams as ordinary images (`![Sheet](flow.drawio)`).
//! After a page is rendered to HTML, [`PageTransformer`] finds every such
//! `<img>`, loads the diagram file next to the page source, optionally narrows
//! it to the sheet named by the image's alt text, and replaces the image with
//! a `div.mxgraph` container the bundled viewer script renders client-side.
//!
//! # Pipeline
//!
//! 1. [`resolve_reference`] maps the `src` value to a file path.
//! 2. [`DiagramCache`] reads and parses each file once ([`DiagramDocument`]).
//! 3. [`extract`] selects a sheet by name.
//! 4. [`embed_diagram`] escapes the XML and wraps it in the viewer container.
//!
//! The viewer itself is handled by [`ViewerAsset`].

mod cache;
mod consts;
mod document;
mod error;
mod extractor;
mod html_embed;
mod resolver;
mod transformer;
mod viewer;

pub use cache::{DiagramCache, DiagramSource, FsDiagramSource};
pub use consts::DEFAULT_FILE_EXTENSION;
pub use document::{DiagramDocument, XmlElement, XmlNode};
pub use error::{DocumentError, EmbedError, PageError};
pub use extractor::{SheetLookup, extract, find_sheet};
pub use html_embed::{embed_diagram, escape_diagram, wrap_diagram};
pub use resolver::resolve_reference;
pub use transformer::{PageOutcome, PageTransformer};
pub use viewer::{VIEWER_SCRIPT, ViewerAsset};
