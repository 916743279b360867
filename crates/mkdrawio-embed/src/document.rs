//! In-memory XML tree for diagram files.
//!
//! [`DiagramDocument`] is the parsed form of a `.drawio` file: an owned element
//! tree that can be searched for sheets and serialized back to a string.
//! Tag names are kept verbatim (prefixes included) and attributes keep their
//! source order, so re-serializing a document yields the same markup modulo
//! escaping normalization.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::DocumentError;

/// A node inside an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    /// Child element.
    Element(XmlElement),
    /// Character data (entities already decoded).
    Text(String),
    /// `<![CDATA[...]]>` section, kept verbatim.
    CData(String),
    /// `<!-- ... -->` comment.
    Comment(String),
}

/// An XML element with its attributes and children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Tag name, including any namespace prefix.
    pub name: String,
    /// Attributes in source order (values decoded).
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Collect this element and all descendants with the given tag name,
    /// in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }

    /// First element (self included) with the given tag name, in document order.
    pub fn find_first(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.elements().find_map(|child| child.find_first(name))
    }

    /// Serialize this element and its subtree.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            escape_attr_into(value, out);
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.write_xml(out),
                XmlNode::Text(text) => escape_text_into(text, out),
                XmlNode::CData(data) => {
                    out.push_str("<![CDATA[");
                    out.push_str(data);
                    out.push_str("]]>");
                }
                XmlNode::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Append text, merging with a preceding text node.
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_owned()));
        }
    }
}

fn collect_named<'a>(el: &'a XmlElement, name: &str, found: &mut Vec<&'a XmlElement>) {
    if el.name == name {
        found.push(el);
    }
    for child in el.elements() {
        collect_named(child, name, found);
    }
}

/// A parsed diagram file.
///
/// Only the root element is retained; the XML declaration, doctype and
/// anything outside the root are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramDocument {
    root: XmlElement,
}

impl DiagramDocument {
    /// Wrap an existing element tree.
    #[must_use]
    pub fn from_root(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse a diagram file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed XML, a document without a root element,
    /// or more than one top-level element.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let xml = normalize_line_endings(xml);
        let mut reader = Reader::from_str(&xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if root.is_some() {
                        return Err(DocumentError::ExtraContent);
                    }
                    stack.push(start_element(&reader, &e)?);
                }
                Event::Empty(e) => {
                    if root.is_some() {
                        return Err(DocumentError::ExtraContent);
                    }
                    let el = start_element(&reader, &e)?;
                    attach(&mut stack, &mut root, el);
                }
                Event::End(_) => {
                    // End names are checked by the reader, so the top of the
                    // stack is the element being closed.
                    if let Some(el) = stack.pop() {
                        attach(&mut stack, &mut root, el);
                    }
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(&text),
                        None if !text.trim().is_empty() => {
                            return Err(DocumentError::ExtraContent);
                        }
                        None => {}
                    }
                }
                Event::GeneralRef(e) => {
                    let Some(parent) = stack.last_mut() else {
                        return Err(DocumentError::ExtraContent);
                    };
                    let entity = reader.decoder().decode(&e)?;
                    parent.push_text(&decode_entity(&entity));
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let data = String::from_utf8_lossy(&e).into_owned();
                        parent.children.push(XmlNode::CData(data));
                    }
                }
                Event::Comment(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let comment = reader.decoder().decode(&e)?.into_owned();
                        parent.children.push(XmlNode::Comment(comment));
                    }
                }
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Unclosed(open.name));
        }
        root.map(Self::from_root).ok_or(DocumentError::Empty)
    }

    /// The document's root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Serialize the whole document (root element, no XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        self.root.to_xml()
    }
}

/// Translate `\r\n` and lone `\r` to `\n`, as XML processors do before parsing.
fn normalize_line_endings(xml: &str) -> Cow<'_, str> {
    if xml.contains('\r') {
        Cow::Owned(xml.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(xml)
    }
}

/// Attach a completed element to its parent, or make it the root.
fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(el));
    } else {
        *root = Some(el);
    }
}

fn start_element(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<XmlElement, DocumentError> {
    let name = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            Cow::into_owned,
        );
        attrs.push((key, value));
    }
    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

/// Decode an entity reference (without `&` and `;`) to its text.
fn decode_entity(entity: &str) -> Cow<'static, str> {
    match entity {
        "lt" => Cow::Borrowed("<"),
        "gt" => Cow::Borrowed(">"),
        "amp" => Cow::Borrowed("&"),
        "apos" => Cow::Borrowed("'"),
        "quot" => Cow::Borrowed("\""),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32).map_or_else(
                || Cow::Owned(format!("&{entity};")),
                |c| Cow::Owned(c.to_string()),
            )
        }
        // Unknown entity - keep as written
        _ => Cow::Owned(format!("&{entity};")),
    }
}

/// Escape character data.
fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escape an attribute value.
///
/// Whitespace control characters become character references so a value
/// keeps its line breaks after the document is flattened to a single line.
fn escape_attr_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}
