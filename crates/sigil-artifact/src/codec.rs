//! # Sigil Payload Codec
//!
//! Embeds and extracts the JSON payload carried in an SVG's `<metadata>`
//! (preferred) or `<desc>` element.
//!
//! ## Wire forms
//!
//! Element text is either entity-escaped JSON or one or more
//! `<![CDATA[ … ]]>` sections. Whatever form a block was read in is the form
//! it is written back in, and whitespace around the JSON is kept.
//!
//! ## Splicing
//!
//! `embed` replaces only the text between the chosen element's tags. All
//! other bytes of the document are copied through unchanged.
//!
//! ## Block selection
//!
//! When several candidate blocks exist, the first one whose JSON looks like
//! a sigil payload wins and the others are skipped silently. Which block an
//! authoring tool meant is not recorded anywhere, so this rule is
//! provisional.

use serde_json::Value;

use sigil_core::SigilError;

use crate::markup::{find_elements, ElementSpan};
use crate::payload::{is_plausible, SigilPayload};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// How JSON text is wrapped inside its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    Cdata,
    Escaped,
}

/// A payload block located in a document.
#[derive(Debug, Clone)]
pub struct PayloadBlock {
    pub element: &'static str,
    pub span: ElementSpan,
    pub wrapping: Wrapping,
    pub value: Value,
}

/// Wrapping style of raw element content: CDATA when the first
/// non-whitespace markup is a CDATA section.
pub fn wrapping_of(content: &str) -> Wrapping {
    if content.trim_start().starts_with(CDATA_OPEN) {
        Wrapping::Cdata
    } else {
        Wrapping::Escaped
    }
}

/// Encode JSON text for an element, keeping the original surrounding
/// whitespace of `original`.
pub fn encode_text(json: &str, wrapping: Wrapping, original: &str) -> String {
    let lead_len = original.len() - original.trim_start().len();
    let trail_len = original.len() - original.trim_end().len();
    let (lead, trail) = if original.trim().is_empty() {
        ("", "")
    } else {
        (&original[..lead_len], &original[original.len() - trail_len..])
    };
    let inner = match wrapping {
        Wrapping::Cdata => format!(
            "{CDATA_OPEN}{}{CDATA_CLOSE}",
            json.replace(CDATA_CLOSE, "]]]]><![CDATA[>")
        ),
        Wrapping::Escaped => escape(json),
    };
    format!("{lead}{inner}{trail}")
}

/// Every parseable JSON object in `<metadata>` then `<desc>` elements.
pub fn payload_blocks(svg: &str) -> Vec<PayloadBlock> {
    let mut blocks = Vec::new();
    for element in ["metadata", "desc"] {
        for found in find_elements(svg, element) {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(found.text.trim()) {
                let span = found.span;
                blocks.push(PayloadBlock {
                    element,
                    span,
                    wrapping: wrapping_of(&svg[span.content_start..span.content_end]),
                    value,
                });
            }
        }
    }
    blocks
}

/// Extract the embedded payload.
///
/// Returns the first plausible sigil payload, `<metadata>` before `<desc>`.
/// JSON that does not look like a sigil payload is never returned, and
/// absence is a valid state.
pub fn extract(svg: &str) -> Option<SigilPayload> {
    let block = payload_blocks(svg)
        .into_iter()
        .find(|b| is_plausible(&b.value))?;
    SigilPayload::from_value(block.value).ok()
}

/// The payload of the block [`embed`] would rewrite: the first plausible
/// `<metadata>` block. Payloads carried only in `<desc>` are ignored.
pub fn extract_metadata(svg: &str) -> Option<SigilPayload> {
    let block = metadata_block(svg)?;
    SigilPayload::from_value(block.value).ok()
}

/// Write `payload` into the first `<metadata>` block holding a sigil
/// payload, preserving its wrapping style.
pub fn embed(svg: &str, payload: &SigilPayload) -> Result<String, SigilError> {
    let block = metadata_block(svg).ok_or_else(|| {
        SigilError::MissingMetadata("No sigil <metadata> block to rewrite".into())
    })?;
    let json = payload.to_json_string()?;
    let original = &svg[block.span.content_start..block.span.content_end];
    let mut out = String::with_capacity(svg.len() + json.len());
    out.push_str(&svg[..block.span.content_start]);
    out.push_str(&encode_text(&json, block.wrapping, original));
    out.push_str(&svg[block.span.content_end..]);
    Ok(out)
}

fn metadata_block(svg: &str) -> Option<PayloadBlock> {
    payload_blocks(svg)
        .into_iter()
        .find(|b| b.element == "metadata" && is_plausible(&b.value))
}

/// A fresh CDATA `<metadata>` element carrying `payload`.
pub fn metadata_element(payload: &SigilPayload) -> Result<String, SigilError> {
    let json = payload.to_json_string()?;
    Ok(format!(
        "<metadata>{}</metadata>",
        encode_text(&json, Wrapping::Cdata, "")
    ))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
