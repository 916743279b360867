//! HTML embedding for diagram XML.
//!
//! The viewer script looks for `div.mxgraph` elements and reads their
//! `data-mxgraph` attribute as JSON. The attribute shape produced by
//! [`wrap_diagram`] is what the bundled viewer understands: key names and
//! literal values must not change.

/// Escape XML for use inside a double-quoted HTML attribute.
///
/// Replaces `&`, `<`, `>`, `"` and `'` with entities and drops every newline,
/// so the diagram ends up on a single line.
///
/// # Examples
///
/// ```
/// use mkdrawio_embed::escape_diagram;
///
/// assert_eq!(escape_diagram("<a & b>'"), "&lt;a &amp; b&gt;&apos;");
/// ```
pub fn escape_diagram(xml: &str) -> String {
    let mut escaped = String::with_capacity(xml.len() + xml.len() / 4);
    for ch in xml.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Wrap escaped diagram XML in the viewer's container element.
///
/// `escaped_xml` must already be escaped with [`escape_diagram`]; it is
/// placed verbatim as the JSON `xml` value.
pub fn wrap_diagram(escaped_xml: &str) -> String {
    format!(
        concat!(
            r#"<div class="mxgraph" style="max-width:100%;border:1px solid transparent;" "#,
            r#"data-mxgraph="{{&quot;highlight&quot;:&quot;#0000ff&quot;,&quot;nav&quot;:true,"#,
            r#"&quot;resize&quot;:true,&quot;toolbar&quot;:&quot;zoom layers tags lightbox&quot;,"#,
            r#"&quot;edit&quot;:&quot;_blank&quot;,&quot;xml&quot;:&quot;{}&quot;}}">"#,
            "</div>"
        ),
        escaped_xml
    )
}

/// Escape and wrap diagram XML in one step.
pub fn embed_diagram(xml: &str) -> String {
    wrap_diagram(&escape_diagram(xml))
}
