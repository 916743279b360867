//! Internal constants for diagram embedding.

/// Default extension of diagram source files referenced from pages.
pub const DEFAULT_FILE_EXTENSION: &str = ".drawio";

/// Root element of a multi-sheet diagram file.
pub const MXFILE_TAG: &str = "mxfile";

/// A single sheet inside an `mxfile`.
pub const DIAGRAM_TAG: &str = "diagram";

/// Attribute carrying a sheet's name.
pub const SHEET_NAME_ATTR: &str = "name";

/// Filename of the bundled viewer script.
pub const VIEWER_SCRIPT_FILENAME: &str = "viewer-static.min.js";

/// Site-relative directory the viewer script is published to.
pub const STATIC_DIR: &str = "static";
