//! # SVG Documents
//!
//! Parsing is used only to validate that a document is SVG and to read the
//! root element's attributes. Every write is a textual splice on the root
//! start tag located by [`crate::markup`], so untouched markup keeps its
//! exact bytes. Writes require a well-formed document with an `<svg>` root.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::Regex;

use sigil_core::SigilError;

use crate::markup::{attribute_insert_point, parse_document, root_start_tag};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The root `<svg>` element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgRoot {
    /// Root attributes by local name (`data-kind`, `width`, …).
    pub attributes: BTreeMap<String, String>,
    /// Whether the root is in the SVG namespace.
    pub namespaced: bool,
}

impl SvgRoot {
    /// Parse `text` as XML and require an `<svg>` root.
    ///
    /// Fails with "Not a valid SVG file" for malformed XML or any other
    /// root element.
    pub fn parse(text: &str) -> Result<Self, SigilError> {
        let doc = parse_document(text).map_err(|e| {
            tracing::debug!(error = %e, "document is not well-formed XML");
            SigilError::not_an_svg()
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(SigilError::not_an_svg());
        }
        let attributes = root
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        Ok(Self {
            attributes,
            namespaced: root.tag_name().namespace() == Some(SVG_NAMESPACE),
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Add `xmlns` to the root if absent. Nothing else changes.
pub fn ensure_xmlns(svg: &str) -> Cow<'_, str> {
    let Some(tag) = root_start_tag(svg, "svg") else {
        return Cow::Borrowed(svg);
    };
    let open = &svg[tag.start..tag.end];
    if attr_pattern("xmlns").is_some_and(|re| re.is_match(open)) {
        return Cow::Borrowed(svg);
    }
    let at = tag.start + "<svg".len();
    Cow::Owned(format!(
        "{} xmlns=\"{SVG_NAMESPACE}\"{}",
        &svg[..at],
        &svg[at..]
    ))
}

/// Set attributes on the root start tag, replacing existing values in
/// place and appending new ones before the tag closes.
pub fn set_root_attributes(svg: &str, attrs: &[(String, String)]) -> Result<String, SigilError> {
    let tag = root_start_tag(svg, "svg").ok_or_else(SigilError::not_an_svg)?;
    let mut open = svg[tag.start..tag.end].to_string();
    for (name, value) in attrs {
        let quoted = format!("\"{}\"", escape_attr(value));
        let re = attr_pattern(name)
            .ok_or_else(|| SigilError::InvalidArtifact(format!("invalid attribute name {name:?}")))?;
        let replaced = match re.captures(&open) {
            Some(caps) => caps.get(2).map(|m| {
                let mut s = open.clone();
                s.replace_range(m.range(), &quoted);
                s
            }),
            None => None,
        };
        open = match replaced {
            Some(s) => s,
            None => {
                let rel = attribute_insert_point(&open);
                format!("{} {name}={quoted}{}", &open[..rel], &open[rel..])
            }
        };
    }
    Ok(format!("{}{}{}", &svg[..tag.start], open, &svg[tag.end..]))
}

/// Insert `fragment` as the first child of the root element.
pub fn insert_first_child(svg: &str, fragment: &str) -> Result<String, SigilError> {
    let tag = root_start_tag(svg, "svg").ok_or_else(SigilError::not_an_svg)?;
    if tag.self_closing {
        let open = &svg[tag.start..tag.end];
        let slash = open
            .rfind('/')
            .ok_or_else(SigilError::not_an_svg)?;
        return Ok(format!(
            "{}{}>{fragment}</svg>{}",
            &svg[..tag.start],
            open[..slash].trim_end(),
            &svg[tag.end..]
        ));
    }
    Ok(format!("{}{fragment}{}", &svg[..tag.end], &svg[tag.end..]))
}

fn attr_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(
        r#"(\s){}\s*=\s*("[^"]*"|'[^']*')"#,
        regex::escape(name)
    ))
    .ok()
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_root_attributes() {
        let root = SvgRoot::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" data-kind="position" data-market-id="m1"/>"#,
        )
        .unwrap();
        assert!(root.namespaced);
        assert_eq!(root.attr("data-kind"), Some("position"));
        assert_eq!(root.attr("data-market-id"), Some("m1"));
    }

    #[test]
    fn rejects_non_svg_root_and_garbage() {
        for text in ["<html/>", "not xml at all", "\u{89}PNG\r\n", "<svg>"] {
            let err = SvgRoot::parse(text).unwrap_err();
            assert_eq!(err.to_string(), "Not a valid SVG file");
        }
    }

    #[test]
    fn accepts_prolog_and_doctype() {
        let text = "<?xml version=\"1.0\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n<svg width=\"10\"></svg>";
        assert!(!SvgRoot::parse(text).unwrap().namespaced);
    }

    #[test]
    fn ensure_xmlns_only_touches_root() {
        let svg = r#"<svg width="1"><g/></svg>"#;
        assert_eq!(
            ensure_xmlns(svg),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1"><g/></svg>"#
        );
        let already = r#"<svg xmlns='http://www.w3.org/2000/svg'/>"#;
        assert!(matches!(ensure_xmlns(already), Cow::Borrowed(_)));
    }

    #[test]
    fn set_attributes_replaces_and_appends() {
        let svg = "<svg data-kind='old' width=\"1\">\n<g/></svg>";
        let out = set_root_attributes(
            svg,
            &[
                ("data-kind".into(), "position".into()),
                ("data-market-id".into(), "m\"1".into()),
            ],
        )
        .unwrap();
        assert_eq!(
            out,
            "<svg data-kind=\"position\" width=\"1\" data-market-id=\"m&quot;1\">\n<g/></svg>"
        );
    }

    #[test]
    fn attribute_names_do_not_match_prefixes() {
        let svg = r#"<svg data-v-extra="x"/>"#;
        let out = set_root_attributes(svg, &[("data-v".into(), "SM-POS-1".into())]).unwrap();
        assert_eq!(out, r#"<svg data-v-extra="x" data-v="SM-POS-1"/>"#);
    }

    #[test]
    fn first_child_insert_handles_self_closing_root() {
        assert_eq!(
            insert_first_child("<svg a=\"1\" />", "<metadata/>").unwrap(),
            "<svg a=\"1\"><metadata/></svg>"
        );
        assert_eq!(
            insert_first_child("<svg><g/></svg>", "<desc/>").unwrap(),
            "<svg><desc/><g/></svg>"
        );
    }
}
