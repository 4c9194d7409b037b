mod common;

use common::xml_to_value;
use crypto_sheets_api::{
    extract::{filter_or_inject, scalar_text, single_value},
    to_xml,
};
use serde_json::{json, Value};

fn round_trip(value: &Value) -> (String, Value) {
    xml_to_value(&to_xml(value, "result").unwrap())
}

#[test]
fn declaration_and_root() {
    let xml = to_xml(&json!({"a": 1}), "result").unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
    assert!(xml.contains("<result>"));
    assert!(xml.trim_end().ends_with("</result>"));
}

#[test]
fn nested_objects() {
    let (root, value) = round_trip(&json!({"ethereum": {"usd": 3456.78, "aud": 5210.01}}));
    assert_eq!(root, "result");
    assert_eq!(
        value,
        json!({"ethereum": {"usd": "3456.78", "aud": "5210.01"}})
    );
}

#[test]
fn member_order_is_kept() {
    let xml = to_xml(&json!({"zeta": 1, "alpha": 2}), "result").unwrap();
    let zeta = xml.find("<zeta>").unwrap();
    let alpha = xml.find("<alpha>").unwrap();
    assert!(zeta < alpha);
}

#[test]
fn arrays_become_repeated_elements() {
    let (_, value) = round_trip(&json!({"coins": [{"id": "bitcoin"}, {"id": "ethereum"}]}));
    assert_eq!(
        value,
        json!({"coins": [{"id": "bitcoin"}, {"id": "ethereum"}]})
    );
}

#[test]
fn nested_arrays_use_item_elements() {
    let (_, value) = round_trip(&json!({"prices": [[1, 2], [3, 4]]}));
    assert_eq!(
        value,
        json!({"prices": [{"item": ["1", "2"]}, {"item": ["3", "4"]}]})
    );
}

#[test]
fn top_level_array() {
    let (root, value) = round_trip(&json!([1, 2, 3]));
    assert_eq!(root, "result");
    assert_eq!(value, json!({"items": ["1", "2", "3"]}));
}

#[test]
fn top_level_empty_array() {
    let xml = to_xml(&json!([]), "result").unwrap();
    assert!(xml.contains("<result/>"));
}

#[test]
fn top_level_scalar() {
    let xml = to_xml(&json!("error: boom"), "result").unwrap();
    assert!(xml.contains("<result>error: boom</result>"));
}

#[test]
fn scalars() {
    let (_, value) = round_trip(&json!({"t": true, "f": false, "i": -3, "s": "x"}));
    assert_eq!(
        value,
        json!({"t": "true", "f": "false", "i": "-3", "s": "x"})
    );
}

#[test]
fn null_and_empty_containers() {
    let xml = to_xml(&json!({"a": null, "b": {}, "c": [[]]}), "result").unwrap();
    assert!(xml.contains("<a/>"));
    assert!(xml.contains("<b/>"));
    assert!(xml.contains("<c/>"));
    assert_eq!(
        xml_to_value(&xml).1,
        json!({"a": null, "b": null, "c": null})
    );
}

#[test]
fn empty_array_member_has_no_elements() {
    let xml = to_xml(&json!({"tags": [], "id": "tether"}), "result").unwrap();
    assert!(!xml.contains("tags"));
    assert_eq!(xml_to_value(&xml).1, json!({"id": "tether"}));
}

#[test]
fn text_is_escaped() {
    let text = r#"<b>Tom & "Jerry's"</b>"#;
    let xml = to_xml(&json!({"name": text}), "result").unwrap();
    assert!(!xml.contains("<b>"));
    assert_eq!(xml_to_value(&xml).1, json!({"name": text}));
}

#[test]
fn invalid_characters_are_replaced() {
    let (_, value) = round_trip(&json!({"a": "x\u{1}y\u{FFFF}"}));
    assert_eq!(value, json!({"a": "x\u{FFFD}y\u{FFFD}"}));
}

#[test]
fn element_names_are_sanitized() {
    let (_, value) = round_trip(&json!({"24h change": 1, "a:b": 2, "": 3}));
    assert_eq!(value, json!({"_24h_change": "1", "a_b": "2", "_": "3"}));
}

#[test]
fn custom_root_key() {
    let (root, _) = xml_to_value(&to_xml(&json!({"a": 1}), "data").unwrap());
    assert_eq!(root, "data");
}

#[test]
fn filtered_document() {
    let doc = json!({"bitcoin": {"usd": 67187.12}, "ethereum": {"usd": 3456.78}});
    let (_, value) = round_trip(&filter_or_inject(doc, "*.usd"));
    assert_eq!(value, json!({"items": ["67187.12", "3456.78"]}));
}

#[test]
fn failed_filter_adds_error_element() {
    let doc = json!({"bitcoin": {"usd": 67187.12}});
    let (_, value) = round_trip(&filter_or_inject(doc, "dogecoin.usd"));
    assert_eq!(
        value,
        json!({
            "bitcoin": {"usd": "67187.12"},
            "jsonpath-error": "match for dogecoin.usd not found"
        })
    );
}

/// Encoding `doc` as XML and reading it back must not change the text of
/// the value `expr` picks out, whether the whole document is encoded or
/// only the filtered match.
fn assert_text_survives(doc: Value, expr: &str) {
    let expected = single_value(&doc, expr).unwrap();

    let (_, parsed) = round_trip(&doc);
    let reread = single_value(&parsed, expr).unwrap();
    assert_eq!(reread, expected, "whole document");

    let (_, filtered) = round_trip(&filter_or_inject(doc, expr));
    assert_eq!(scalar_text(&filtered), expected, "filtered document");
}

mod text_survives_xml {
    use super::*;

    #[test]
    fn scalar() {
        assert_text_survives(json!({"price": 5210.01}), "price");
        assert_text_survives(json!({"name": "Ether & <friends>"}), "name");
        assert_text_survives(json!({"active": true}), "active");
        assert_text_survives(json!({"delisted": null}), "delisted");
    }

    #[test]
    fn nested_object() {
        let doc = json!({
            "bitcoin": {"usd": 67187.12, "aud": 101234.5},
            "ethereum": {"usd": 3456.78, "aud": 5210.01}
        });
        assert_text_survives(doc.clone(), "ethereum.aud");
        assert_text_survives(doc, "$['bitcoin']['usd']");
    }

    #[test]
    fn array() {
        let doc = json!({
            "coins": [
                {"id": "bitcoin", "tags": ["store", "of-value"]},
                {"id": "ethereum", "tags": ["smart", "contracts"]}
            ]
        });
        assert_text_survives(doc.clone(), "coins[1].id");
        assert_text_survives(doc.clone(), "coins[0].tags[1]");
        assert_text_survives(doc, "coins[?@.id == 'ethereum'].tags[0]");
    }
}
