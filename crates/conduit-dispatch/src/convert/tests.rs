//! Unit tests for the graded conversion engine.

use conduit_wire_types::TextEncoding;
use rstest::rstest;
use serde_json::json;

use super::*;

fn bytes(data: &[u8], encoding: TextEncoding) -> WireValue {
    WireValue::Bytes {
        data: data.to_vec(),
        encoding,
    }
}

// ---------------------------------------------------------------------------
// Assignment tier
// ---------------------------------------------------------------------------

#[rstest]
#[case(WireValue::Bool { value: true }, ValueShape::Bool, RuntimeValue::Bool(true))]
#[case(WireValue::Int { value: 7 }, ValueShape::Int, RuntimeValue::Int(7))]
#[case(WireValue::Double { value: 1.5 }, ValueShape::Double, RuntimeValue::Double(1.5))]
#[case(WireValue::string("hi"), ValueShape::Text, RuntimeValue::Text("hi".into()))]
fn assignment_is_identity_for_matching_shapes(
    #[case] value: WireValue,
    #[case] target: ValueShape,
    #[case] expected: RuntimeValue,
) {
    let converted = convert(&value, &target, MatchingLevel::TypeAssignment);
    assert_eq!(converted, Some(expected));
}

#[test]
fn assignment_rejects_mismatched_shapes() {
    let value = WireValue::string("5");
    assert!(convert(&value, &ValueShape::Int, MatchingLevel::TypeAssignment).is_none());
}

#[test]
fn assignment_covers_collections_elementwise() {
    let value = WireValue::Collection {
        items: vec![WireValue::Int { value: 1 }, WireValue::Int { value: 2 }],
    };
    let converted = convert(
        &value,
        &ValueShape::list(ValueShape::Int),
        MatchingLevel::TypeAssignment,
    );
    assert_eq!(
        converted,
        Some(RuntimeValue::List(vec![
            RuntimeValue::Int(1),
            RuntimeValue::Int(2)
        ]))
    );
}

#[test]
fn optional_target_wraps_assigned_value() {
    let converted = convert(
        &WireValue::string("hi"),
        &ValueShape::optional(ValueShape::Text),
        MatchingLevel::TypeAssignment,
    );
    assert_eq!(
        converted,
        Some(RuntimeValue::some(RuntimeValue::Text("hi".into())))
    );
}

#[test]
fn absent_source_with_optional_target_is_present_but_empty() {
    let converted = convert(
        &WireValue::Null,
        &ValueShape::optional(ValueShape::Text),
        MatchingLevel::TypeAssignment,
    );
    assert_eq!(converted, Some(RuntimeValue::none()));
}

#[test]
fn absent_source_without_optional_target_is_no_match() {
    assert!(convert(&WireValue::Null, &ValueShape::Text, MatchingLevel::TypeAssignment).is_none());
}

// ---------------------------------------------------------------------------
// Strict tier
// ---------------------------------------------------------------------------

#[rstest]
#[case(0, 0.0)]
#[case(42, 42.0)]
#[case(-9, -9.0)]
#[case(1 << 53, 9_007_199_254_740_992.0)]
fn widening_is_exact(#[case] input: i64, #[case] expected: f64) {
    let converted = convert(
        &WireValue::Int { value: input },
        &ValueShape::Double,
        MatchingLevel::TypeStrictConversion,
    );
    assert_eq!(converted, Some(RuntimeValue::Double(expected)));
}

#[test]
fn widening_rejects_inexact_magnitudes() {
    let value = WireValue::Int {
        value: i64::MAX,
    };
    assert!(convert(&value, &ValueShape::Double, MatchingLevel::TypeStrictConversion).is_none());
}

#[test]
fn bytes_decode_through_declared_encoding() {
    let value = bytes(&[0x68, 0xe9], TextEncoding::Latin1);
    let converted = convert(&value, &ValueShape::Text, MatchingLevel::TypeStrictConversion);
    assert_eq!(converted, Some(RuntimeValue::Text("hé".into())));
}

#[test]
fn invalid_utf8_bytes_are_no_match_at_strict() {
    let value = bytes(&[0xff, 0xfe], TextEncoding::Utf8);
    assert!(convert(&value, &ValueShape::Text, MatchingLevel::TypeStrictConversion).is_none());
}

#[test]
fn string_encodes_to_bytes() {
    let converted = convert(
        &WireValue::string("ab"),
        &ValueShape::Bytes,
        MatchingLevel::TypeStrictConversion,
    );
    assert_eq!(converted, Some(RuntimeValue::Bytes(vec![b'a', b'b'])));
}

#[test]
fn enumeration_matches_by_exact_name() {
    let shape = ValueShape::enumeration(["red", "green"]);
    let matched = convert(
        &WireValue::string("green"),
        &shape,
        MatchingLevel::TypeStrictConversion,
    );
    assert_eq!(matched, Some(RuntimeValue::Text("green".into())));
    assert!(convert(&WireValue::string("GREEN"), &shape, MatchingLevel::TypeStrictConversion).is_none());
}

#[test]
fn json_payload_yields_raw_text_at_strict() {
    let converted = convert(
        &WireValue::json("{\"a\":1}"),
        &ValueShape::Text,
        MatchingLevel::TypeStrictConversion,
    );
    assert_eq!(converted, Some(RuntimeValue::Text("{\"a\":1}".into())));
}

// ---------------------------------------------------------------------------
// Relaxed tier
// ---------------------------------------------------------------------------

#[test]
fn relaxed_parses_document_notation() {
    let converted = convert(
        &WireValue::json(r#"{"known":1,"unknown":2}"#),
        &ValueShape::Json,
        MatchingLevel::TypeRelaxedConversion,
    );
    assert_eq!(
        converted,
        Some(RuntimeValue::Json(json!({"known":1,"unknown":2})))
    );
}

#[test]
fn relaxed_coerces_scalars_out_of_documents() {
    let converted = convert(
        &WireValue::string("5"),
        &ValueShape::Int,
        MatchingLevel::TypeRelaxedConversion,
    );
    assert_eq!(converted, Some(RuntimeValue::Int(5)));
}

#[test]
fn relaxed_reads_documents_from_byte_buffers() {
    let value = bytes(br#"[true,false]"#, TextEncoding::Utf8);
    let converted = convert(
        &value,
        &ValueShape::list(ValueShape::Bool),
        MatchingLevel::TypeRelaxedConversion,
    );
    assert_eq!(
        converted,
        Some(RuntimeValue::List(vec![
            RuntimeValue::Bool(true),
            RuntimeValue::Bool(false)
        ]))
    );
}

#[test]
fn parse_failure_is_no_match_not_an_error() {
    let converted = convert(
        &WireValue::string("not json"),
        &ValueShape::Json,
        MatchingLevel::TypeRelaxedConversion,
    );
    assert!(converted.is_none());
}

#[test]
fn relaxed_handles_nested_optionals_in_documents() {
    let converted = convert(
        &WireValue::json("[1,null,3]"),
        &ValueShape::list(ValueShape::optional(ValueShape::Int)),
        MatchingLevel::TypeRelaxedConversion,
    );
    assert_eq!(
        converted,
        Some(RuntimeValue::List(vec![
            RuntimeValue::some(RuntimeValue::Int(1)),
            RuntimeValue::none(),
            RuntimeValue::some(RuntimeValue::Int(3)),
        ]))
    );
}

// ---------------------------------------------------------------------------
// Ladder ordering
// ---------------------------------------------------------------------------

#[test]
fn ladder_stops_at_first_success() {
    // A string against a text target could also match at the relaxed tier if
    // its content were valid JSON; assignment must win.
    let (converted, level) =
        convert_by_shape(&WireValue::string("\"quoted\""), &ValueShape::Text).expect("convert");
    assert_eq!(level, MatchingLevel::TypeAssignment);
    assert_eq!(converted, RuntimeValue::Text("\"quoted\"".into()));
}

#[test]
fn ladder_falls_through_to_strict() {
    let (_, level) =
        convert_by_shape(&WireValue::Int { value: 3 }, &ValueShape::Double).expect("convert");
    assert_eq!(level, MatchingLevel::TypeStrictConversion);
}

#[test]
fn ladder_falls_through_to_relaxed() {
    let (_, level) =
        convert_by_shape(&WireValue::string("11"), &ValueShape::Int).expect("convert");
    assert_eq!(level, MatchingLevel::TypeRelaxedConversion);
}

#[test]
fn idempotence_across_the_ladder() {
    let value = WireValue::string("hello");
    let first = convert_by_shape(&value, &ValueShape::Text).expect("first");
    let second = convert_by_shape(&value, &ValueShape::Text).expect("second");
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Collection path
// ---------------------------------------------------------------------------

#[test]
fn list_path_parses_serialised_arrays() {
    let converted = convert_list(&WireValue::string("[1,2,3]"), &ValueShape::Int);
    assert_eq!(
        converted,
        Some(RuntimeValue::List(vec![
            RuntimeValue::Int(1),
            RuntimeValue::Int(2),
            RuntimeValue::Int(3)
        ]))
    );
}

#[test]
fn list_path_rejects_non_arrays() {
    assert!(convert_list(&WireValue::string("{}"), &ValueShape::Int).is_none());
    assert!(convert_list(&WireValue::string("oops"), &ValueShape::Int).is_none());
}

#[test]
fn list_path_coerces_each_element() {
    let converted = convert_list(&WireValue::json(r#"["a","b"]"#), &ValueShape::Text);
    assert_eq!(
        converted,
        Some(RuntimeValue::List(vec![
            RuntimeValue::Text("a".into()),
            RuntimeValue::Text("b".into())
        ]))
    );
}

// ---------------------------------------------------------------------------
// Outbound direction
// ---------------------------------------------------------------------------

#[rstest]
#[case(RuntimeValue::Bool(true), WireValue::Bool { value: true })]
#[case(RuntimeValue::Int(5), WireValue::Int { value: 5 })]
#[case(RuntimeValue::Text("x".into()), WireValue::string("x"))]
fn scalar_outputs_render_at_assignment(#[case] value: RuntimeValue, #[case] expected: WireValue) {
    assert_eq!(render(&value, MatchingLevel::TypeAssignment), Some(expected));
}

#[test]
fn documents_render_at_strict() {
    let value = RuntimeValue::Json(json!({"a": 1}));
    let rendered = render(&value, MatchingLevel::TypeStrictConversion).expect("render");
    assert_eq!(rendered, WireValue::json(r#"{"a":1}"#));
}

#[test]
fn empty_optional_renders_to_the_sentinel() {
    let rendered = render(&RuntimeValue::none(), MatchingLevel::TypeStrictConversion);
    assert_eq!(rendered, Some(empty_document()));
}

#[test]
fn relaxed_rendering_is_total() {
    let value = RuntimeValue::List(vec![RuntimeValue::Bytes(vec![1]), RuntimeValue::Null]);
    let rendered = render(&value, MatchingLevel::TypeRelaxedConversion).expect("render");
    assert_eq!(rendered, WireValue::json("[[1],null]"));
}

#[test]
fn round_trip_preserves_scalars() {
    let original = RuntimeValue::Text("hello".into());
    let wire = render_by_shape(&original).expect("render");
    let (back, _) = convert_by_shape(&wire, &ValueShape::Text).expect("convert back");
    assert_eq!(back, original);
}

#[test]
fn round_trip_preserves_documents() {
    let original = RuntimeValue::Json(json!({"a": [1, 2], "b": "x"}));
    let wire = render_by_shape(&original).expect("render");
    let (back, _) = convert_by_shape(&wire, &ValueShape::Json).expect("convert back");
    assert_eq!(back, original);
}
