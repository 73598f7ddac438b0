//! # Markup Spans
//!
//! Locates elements and the root start tag in SVG text as byte spans.
//! Documents are parsed with `roxmltree`, whose node ranges point back into
//! the input; rewrites splice bytes at those spans, so every byte outside
//! the spliced range is preserved exactly.
//!
//! Elements match by local name in the SVG namespace or no namespace.
//! Markup inside comments and CDATA is text to the parser and never
//! matches.

use std::ops::Range;

use roxmltree::{Document, Node, ParsingOptions};

use crate::svg::SVG_NAMESPACE;

/// Byte span of an open/close element pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpan {
    /// Offset of `<` of the start tag.
    pub start: usize,
    /// Offset just past the start tag's `>`.
    pub content_start: usize,
    /// Offset of `<` of the end tag.
    pub content_end: usize,
    /// Offset just past the end tag's `>`.
    pub end: usize,
}

/// An element located in a document: its span and decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedElement {
    pub span: ElementSpan,
    /// Concatenated text and CDATA children, entities resolved.
    pub text: String,
}

/// Byte span of a single start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTag {
    pub start: usize,
    /// Offset just past `>`.
    pub end: usize,
    pub self_closing: bool,
}

impl StartTag {
    /// Offset where new attributes can be inserted: before `/>` or `>`.
    pub fn insert_at(&self, text: &str) -> usize {
        self.start + attribute_insert_point(&text[self.start..self.end])
    }
}

/// Parse `text` as XML, accepting a DOCTYPE.
pub fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// The root start tag, when the document is well-formed and its root
/// element is named `name`.
pub fn root_start_tag(text: &str, name: &str) -> Option<StartTag> {
    let doc = parse_document(text).ok()?;
    let root = doc.root_element();
    if root.tag_name().name() != name {
        return None;
    }
    let start = root.range().start;
    let end = tag_end(text, start)?;
    Some(StartTag {
        start,
        end,
        self_closing: is_self_closing(&text[start..end]),
    })
}

/// Every non-self-closing `name` element, in document order. Elements
/// nested inside another `name` element are not reported. A document that
/// does not parse has no elements.
pub fn find_elements(text: &str, name: &str) -> Vec<LocatedElement> {
    let doc = match parse_document(text) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "document is not well-formed XML");
            return Vec::new();
        }
    };
    doc.descendants()
        .filter(|n| matches_name(n, name))
        .filter(|n| !n.ancestors().skip(1).any(|a| matches_name(&a, name)))
        .filter_map(|n| {
            let span = element_span(text, n.range())?;
            Some(LocatedElement {
                span,
                text: n
                    .children()
                    .filter(|c| c.is_text())
                    .filter_map(|c| c.text())
                    .collect(),
            })
        })
        .collect()
}

/// Offset within `open_tag` where attributes can be appended.
pub fn attribute_insert_point(open_tag: &str) -> usize {
    let ws = |c: char| c.is_ascii_whitespace();
    let body = open_tag.strip_suffix('>').unwrap_or(open_tag).trim_end_matches(ws);
    body.strip_suffix('/').unwrap_or(body).trim_end_matches(ws).len()
}

fn matches_name(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), None | Some(SVG_NAMESPACE))
}

fn element_span(text: &str, range: Range<usize>) -> Option<ElementSpan> {
    let content_start = tag_end(text, range.start)?;
    if is_self_closing(&text[range.start..content_start]) {
        return None;
    }
    let content_end = range.start + text[range.clone()].rfind("</")?;
    Some(ElementSpan {
        start: range.start,
        content_start,
        content_end,
        end: range.end,
    })
}

fn is_self_closing(open_tag: &str) -> bool {
    open_tag
        .strip_suffix('>')
        .is_some_and(|body| body.ends_with('/'))
}

/// Offset just past the `>` closing a start tag, honouring quotes.
fn tag_end(text: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in text.as_bytes()[from..].iter().enumerate() {
        match (quote, b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(from + i + 1),
            (None, _) => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents<'a>(svg: &'a str, name: &str) -> Vec<&'a str> {
        find_elements(svg, name)
            .iter()
            .map(|e| &svg[e.span.content_start..e.span.content_end])
            .collect()
    }

    #[test]
    fn finds_element_content() {
        let svg = r#"<svg><metadata id="m">{"v":"x"}</metadata></svg>"#;
        let found = find_elements(svg, "metadata");
        assert_eq!(found.len(), 1);
        let s = found[0].span;
        assert_eq!(&svg[s.content_start..s.content_end], r#"{"v":"x"}"#);
        assert_eq!(&svg[s.start..s.end], r#"<metadata id="m">{"v":"x"}</metadata>"#);
        assert_eq!(found[0].text, r#"{"v":"x"}"#);
    }

    #[test]
    fn skips_self_closing_and_similar_names() {
        let svg = "<svg><metadata/><metadataX>a</metadataX><metadata>b</metadata ></svg>";
        let found = find_elements(svg, "metadata");
        assert_eq!(found.len(), 1);
        assert_eq!(contents(svg, "metadata"), ["b"]);
        assert_eq!(&svg[found[0].span.end..], "</svg>");
    }

    #[test]
    fn ignores_tags_inside_comments_and_cdata() {
        let svg = "<svg><!-- <metadata>no</metadata> --><metadata><![CDATA[</metadata>]]></metadata></svg>";
        let found = find_elements(svg, "metadata");
        assert_eq!(found.len(), 1);
        assert_eq!(contents(svg, "metadata"), ["<![CDATA[</metadata>]]>"]);
        assert_eq!(found[0].text, "</metadata>");
    }

    #[test]
    fn text_is_decoded() {
        let svg = "<svg><desc> {&quot;v&quot;:&quot;a&lt;b&amp;&#x41;&#66;&quot;} </desc><desc><![CDATA[x]]]]><![CDATA[>y]]></desc></svg>";
        let texts: Vec<String> = find_elements(svg, "desc").into_iter().map(|e| e.text).collect();
        assert_eq!(texts, [r#" {"v":"a<b&AB"} "#, "x]]>y"]);
    }

    #[test]
    fn foreign_namespaces_do_not_match() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x"><x:metadata>a</x:metadata><metadata>b</metadata></svg>"#;
        assert_eq!(contents(svg, "metadata"), ["b"]);
    }

    #[test]
    fn malformed_documents_have_no_elements() {
        assert!(find_elements("<svg><metadata>a</metadata>", "metadata").is_empty());
        assert!(root_start_tag("<svg", "svg").is_none());
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let svg = r#"<svg data-x="a>b" width="1"><desc>d</desc></svg>"#;
        let tag = root_start_tag(svg, "svg").unwrap();
        assert_eq!(&svg[tag.start..tag.end], r#"<svg data-x="a>b" width="1">"#);
        assert!(!tag.self_closing);
    }

    #[test]
    fn root_after_prolog() {
        let svg = "<?xml version=\"1.0\"?>\n<!DOCTYPE svg>\n<svg/>";
        let tag = root_start_tag(svg, "svg").unwrap();
        assert!(tag.self_closing);
        assert_eq!(&svg[tag.start..tag.end], "<svg/>");
        assert_eq!(tag.insert_at(svg), tag.start + 4);
        assert!(root_start_tag(svg, "html").is_none());
    }

    #[test]
    fn insert_point_is_before_close() {
        let svg = "<svg width=\"1\" >x</svg>";
        let tag = root_start_tag(svg, "svg").unwrap();
        assert_eq!(&svg[..tag.insert_at(svg)], "<svg width=\"1\"");
        assert_eq!(attribute_insert_point("<svg a=\"1\" / >"), "<svg a=\"1\"".len());
    }

    #[test]
    fn multiple_elements_in_order() {
        let svg = "<svg><desc>1</desc><g><desc>2</desc></g></svg>";
        assert_eq!(contents(svg, "desc"), ["1", "2"]);
    }
}
