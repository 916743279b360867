//! Sheet selection for multi-page diagram files.
//!
//! A `.drawio` file is either a bare `mxGraphModel` or an `mxfile` wrapping one
//! `diagram` element per sheet. Pages pick a sheet by name through the image's
//! `alt` text. Every anomaly here degrades to embedding more than was asked
//! for, never to an error.

use crate::consts::{DIAGRAM_TAG, MXFILE_TAG, SHEET_NAME_ATTR};
use crate::document::{DiagramDocument, XmlElement, XmlNode};

/// Outcome of looking a sheet up by name.
#[derive(Debug, PartialEq, Eq)]
pub enum SheetLookup<'a> {
    /// Exactly one sheet has the name.
    Found(&'a XmlElement),
    /// No sheet has the name.
    NotFound,
    /// Several sheets share the name, in document order.
    Ambiguous(Vec<&'a XmlElement>),
}

/// Find the `diagram` elements named `name` anywhere under `root`.
pub fn find_sheet<'a>(root: &'a XmlElement, name: &str) -> SheetLookup<'a> {
    let mut matches: Vec<_> = root
        .descendants_named(DIAGRAM_TAG)
        .into_iter()
        .filter(|sheet| sheet.attr(SHEET_NAME_ATTR) == Some(name))
        .collect();

    match matches.len() {
        0 => SheetLookup::NotFound,
        1 => SheetLookup::Found(matches.remove(0)),
        _ => SheetLookup::Ambiguous(matches),
    }
}

/// Serialize the part of `document` a page asked for.
///
/// Without a sheet name (or with an empty one) the whole document is returned.
/// With a name, the single matching sheet is returned inside a copy of the
/// `mxfile` element (same tag and attributes, no other sheets). A missing or
/// ambiguous name logs a warning and returns the whole `mxfile`; a document
/// without an `mxfile` element is returned as-is.
pub fn extract(document: &DiagramDocument, sheet: Option<&str>) -> String {
    let Some(name) = sheet.filter(|name| !name.is_empty()) else {
        return document.to_xml();
    };

    let Some(mxfile) = document.root().find_first(MXFILE_TAG) else {
        tracing::warn!(sheet = name, "no <mxfile> element in diagram, embedding whole file");
        return document.to_xml();
    };

    match find_sheet(document.root(), name) {
        SheetLookup::Found(page) => XmlElement {
            name: mxfile.name.clone(),
            attrs: mxfile.attrs.clone(),
            children: vec![XmlNode::Element(page.clone())],
        }
        .to_xml(),
        SheetLookup::NotFound => {
            tracing::warn!(sheet = name, "no page found for name, embedding all pages");
            mxfile.to_xml()
        }
        SheetLookup::Ambiguous(candidates) => {
            tracing::warn!(
                sheet = name,
                count = candidates.len(),
                "multiple pages found for name, embedding all pages"
            );
            mxfile.to_xml()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    const MULTI: &str = r#"<mxfile host="app"><diagram name="A" id="a"><mxGraphModel/></diagram><diagram name="B" id="b"><mxGraphModel/></diagram></mxfile>"#;

    fn parse(xml: &str) -> DiagramDocument {
        DiagramDocument::parse(xml).unwrap()
    }

    #[test]
    fn test_extract_without_sheet_returns_whole_document() {
        let doc = parse(r#"<mxGraphModel dx="1"><root/></mxGraphModel>"#);

        assert_eq!(extract(&doc, None), r#"<mxGraphModel dx="1"><root/></mxGraphModel>"#);
    }

    #[test]
    fn test_extract_empty_sheet_name_returns_whole_document() {
        let doc = parse(MULTI);

        assert_eq!(extract(&doc, Some("")), MULTI);
    }

    #[test]
    fn test_extract_named_sheet() {
        let doc = parse(MULTI);

        let xml = extract(&doc, Some("A"));

        assert_eq!(
            xml,
            r#"<mxfile host="app"><diagram name="A" id="a"><mxGraphModel/></diagram></mxfile>"#
        );
        let extracted = parse(&xml);
        let sheets: Vec<_> = extracted.root().elements().collect();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].attr("name"), Some("A"));
    }

    #[test]
    #[traced_test]
    fn test_extract_missing_sheet_returns_all_sheets() {
        let doc = parse(MULTI);

        assert_eq!(find_sheet(doc.root(), "C"), SheetLookup::NotFound);
        assert_eq!(extract(&doc, Some("C")), MULTI);
        assert!(logs_contain("no page found for name"));
    }

    #[test]
    #[traced_test]
    fn test_extract_ambiguous_sheet_returns_all_sheets() {
        let xml = r#"<mxfile><diagram name="A" id="1"/><diagram name="A" id="2"/></mxfile>"#;
        let doc = parse(xml);

        let SheetLookup::Ambiguous(candidates) = find_sheet(doc.root(), "A") else {
            panic!("expected ambiguous lookup");
        };
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].attr("id"), Some("1"));
        assert_eq!(extract(&doc, Some("A")), xml);
        assert!(logs_contain("multiple pages found for name"));
    }

    #[test]
    #[traced_test]
    fn test_extract_without_mxfile_returns_whole_document() {
        let xml = r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#;
        let doc = parse(xml);

        assert_eq!(extract(&doc, Some("A")), xml);
        assert!(logs_contain("no <mxfile> element"));
    }

    #[test]
    fn test_lookup_is_document_wide() {
        let xml = r#"<wrapper><mxfile v="1"><diagram name="X"/></mxfile><diagram name="Y"/></wrapper>"#;
        let doc = parse(xml);

        assert_eq!(
            extract(&doc, Some("Y")),
            r#"<mxfile v="1"><diagram name="Y"/></mxfile>"#
        );
    }

    #[test]
    fn test_sheet_name_match_is_exact() {
        let doc = parse(MULTI);

        assert_eq!(find_sheet(doc.root(), "a"), SheetLookup::NotFound);
        assert_eq!(find_sheet(doc.root(), "A "), SheetLookup::NotFound);
    }

    #[test]
    fn test_extract_does_not_modify_document() {
        let doc = parse(MULTI);

        let _ = extract(&doc, Some("B"));

        assert_eq!(doc.to_xml(), MULTI);
    }
}
