//! Minting: place a payload into an SVG template.
//!
//! The payload hash is pinned at mint; the proof is attached later, on
//! first export. A template that already carries a sigil `<metadata>` block
//! has that block rewritten in its own wrapping style. Otherwise a CDATA
//! `<metadata>` element becomes the root's first child. Either way the
//! root's `data-*` attributes are refreshed from the payload.

use sigil_core::SigilError;

use crate::classify::mirrored_attributes;
use crate::codec::{self, payload_blocks};
use crate::payload::{is_plausible, SigilPayload};
use crate::svg::{insert_first_child, set_root_attributes, SvgRoot};

/// A freshly minted artifact.
#[derive(Debug, Clone)]
pub struct MintedSvg {
    pub svg: String,
    pub payload: SigilPayload,
    pub payload_hash: String,
}

pub fn mint(template: &str, payload: SigilPayload) -> Result<MintedSvg, SigilError> {
    SvgRoot::parse(template)?;
    let mut payload = payload;
    if !payload.is_plausible() {
        return Err(SigilError::Payload(
            "payload has no v/kind discriminator".into(),
        ));
    }
    payload.version()?;
    let payload_hash = payload.pin_payload_hash()?;

    let has_sigil_block = payload_blocks(template)
        .iter()
        .any(|b| b.element == "metadata" && is_plausible(&b.value));
    let embedded = if has_sigil_block {
        codec::embed(template, &payload)?
    } else {
        insert_first_child(template, &codec::metadata_element(&payload)?)?
    };
    let svg = set_root_attributes(&embedded, &mirrored_attributes(&payload))?;
    SvgRoot::parse(&svg)?;

    tracing::debug!(payload_hash = %payload_hash, kind = %payload.kind(), "minted sigil");
    Ok(MintedSvg {
        svg,
        payload,
        payload_hash,
    })
}
