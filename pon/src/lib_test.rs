//! Codec-level properties: round trips across every variant.

use super::*;

fn sample_values() -> Vec<Pon> {
    vec![
        Pon::Nil,
        Pon::Bool(false),
        Pon::Number(0.0),
        Pon::Number(-1.56),
        Pon::Number(533.12),
        Pon::Number(1e-7),
        Pon::string(""),
        Pon::string("it's \\ 'quoted' \\\\"),
        Pon::string("multi\nline"),
        Pon::Array(vec![]),
        Pon::array([Pon::Nil, Pon::Number(1.0), Pon::string("a")]),
        Pon::map([("name", Pon::string("a")), ("with space", Pon::Bool(true))]),
        Pon::call("vec3", pon_map! { "x" => -1.56, "y" => 33.0, "z" => 533.12 }),
        Pon::call("static_mesh", Pon::Nil),
        Pon::call("outer", Pon::call("inner", Pon::array([Pon::Number(1.0)]))),
        Pon::selector("567"),
        Pon::selector("root > Camera"),
        Pon::selector("a:[name='x y']"),
        Pon::prop_ref("root:Hello", "y"),
        Pon::dep_prop_ref("some:[name=else]", "test"),
        pon_map! {
            "deep" => pon_map! {
                "list" => Pon::array([Pon::dep_prop_ref("root", "x"), Pon::selector("1")]),
            },
        },
    ]
}

#[test]
fn parse_of_stringify_is_identity() {
    for value in sample_values() {
        let text = stringify(&value);
        let parsed = parse(&text).unwrap_or_else(|e| panic!("{text:?} failed to parse: {e}"));
        assert_eq!(parsed, value, "round trip of {text:?}");
    }
}

#[test]
fn stringify_is_stable_after_one_round_trip() {
    for value in sample_values() {
        let once = stringify(&value);
        let twice = stringify(&parse(&once).expect("parse"));
        assert_eq!(once, twice);
    }
}

#[test]
fn explicit_nil_entries_are_dropped_by_the_round_trip() {
    let value = pon_map! { "keep" => 1.0, "unset" => Pon::Nil };
    let reparsed = parse(&stringify(&value)).expect("parse");
    assert_eq!(reparsed, pon_map! { "keep" => 1.0 });
}

#[test]
fn escaped_string_recovers_exact_text() {
    let original = r"a'b\c\'d";
    let text = stringify(&Pon::string(original));
    assert_eq!(parse(&text).expect("parse").as_str(), Some(original));
}

#[test]
fn response_body_example_parses_to_nested_map() {
    let body = parse("{ arg: { name: 'a' } }").expect("parse");
    assert_eq!(body, pon_map! { "arg" => pon_map! { "name" => "a" } });
}

#[test]
fn to_pon_covers_common_types() {
    assert_eq!(().to_pon(), Pon::Nil);
    assert_eq!(5_u64.to_pon(), Pon::Number(5.0));
    assert_eq!(Some("x").to_pon(), Pon::string("x"));
    assert_eq!(None::<f64>.to_pon(), Pon::Nil);
    assert_eq!(vec![1_i32, 2].to_pon(), Pon::array([Pon::Number(1.0), Pon::Number(2.0)]));
}

#[test]
fn error_offset_points_at_failure() {
    let err = parse("{ a: 1, b: }").expect_err("missing value");
    assert_eq!(err.offset(), 11);
    assert!(err.to_string().contains("offset 11"));
}
