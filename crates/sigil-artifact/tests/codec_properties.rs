//! # Codec Properties
//!
//! Embedding then extracting returns the payload, keeps the block's
//! wrapping style, and leaves the rest of the document untouched, for
//! payload text that includes markup and CDATA terminators.

use proptest::prelude::*;
use serde_json::json;

use sigil_artifact::codec::{embed, extract, payload_blocks, Wrapping};
use sigil_artifact::{classify, SigilKind, SigilPayload, SvgRoot};

const CDATA_SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <metadata>\n    <![CDATA[{\"v\":\"SM-PROP-1\",\"text\":\"old\"}]]>\n  </metadata>\n  <g id=\"art\"><!-- <metadata>decoy</metadata> --></g>\n</svg>\n";

const ESCAPED_SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\"><desc>logo</desc><metadata>{&quot;v&quot;:&quot;SM-PROP-1&quot;,&quot;text&quot;:&quot;old&quot;}</metadata><g/></svg>";

fn prophecy(text: &str) -> SigilPayload {
    SigilPayload::from_value(json!({"v": "SM-PROP-1", "text": text, "pulse": 77})).unwrap()
}

fn outside_metadata(svg: &str) -> (String, String) {
    let block = &payload_blocks(svg)[0];
    (
        svg[..block.span.content_start].to_string(),
        svg[block.span.content_end..].to_string(),
    )
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,24}",
        Just("]]>".to_string()),
        Just("a]]>b<c>&amp;d\"e".to_string()),
        "[<>&\\]\"' a-z]{0,16}",
    ]
}

proptest! {
    #[test]
    fn cdata_round_trip_preserves_document(text in text_strategy()) {
        let payload = prophecy(&text);
        let out = embed(CDATA_SVG, &payload).unwrap();
        prop_assert_eq!(extract(&out).unwrap(), payload);
        prop_assert_eq!(payload_blocks(&out)[0].wrapping, Wrapping::Cdata);
        prop_assert_eq!(outside_metadata(&out), outside_metadata(CDATA_SVG));
        prop_assert!(SvgRoot::parse(&out).is_ok());
    }

    #[test]
    fn escaped_round_trip_preserves_document(text in text_strategy()) {
        let payload = prophecy(&text);
        let out = embed(ESCAPED_SVG, &payload).unwrap();
        prop_assert_eq!(extract(&out).unwrap(), payload);
        prop_assert_eq!(payload_blocks(&out)[0].wrapping, Wrapping::Escaped);
        prop_assert!(!out.contains("CDATA"));
        prop_assert_eq!(outside_metadata(&out), outside_metadata(ESCAPED_SVG));
        prop_assert!(SvgRoot::parse(&out).is_ok());
    }
}

#[test]
fn commented_out_metadata_is_ignored() {
    let p = extract(CDATA_SVG).unwrap();
    assert_eq!(p.get_str("text"), Some("old"));
    assert_eq!(payload_blocks(CDATA_SVG).len(), 1);
}

// The first structurally plausible block wins when several exist. Nothing
// records which block an authoring tool intended, so this pins current
// behavior rather than a confirmed requirement.
#[test]
fn first_plausible_metadata_block_wins() {
    let svg = r#"<svg><metadata>{"v":"SM-VAULT-1","vaultId":"a"}</metadata><metadata>{"v":"SM-POS-1","marketId":"b"}</metadata></svg>"#;
    assert_eq!(extract(svg).unwrap().kind(), SigilKind::Vault);

    let out = embed(svg, &prophecy("x")).unwrap();
    assert!(out.ends_with(r#"<metadata>{"v":"SM-POS-1","marketId":"b"}</metadata></svg>"#));
}

#[test]
fn dom_attribute_wins_over_payload_version() {
    let svg = r#"<svg data-v="SM-POS-1"><metadata>{"v":"SM-RES-1","marketId":"m1"}</metadata></svg>"#;
    let root = SvgRoot::parse(svg).unwrap();
    let c = classify(&root.attributes, extract(svg).as_ref());
    assert_eq!(c.kind, SigilKind::Position);
    assert_eq!(c.fields["marketId"], "m1");
}
