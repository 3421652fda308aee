use super::*;
use crate::{PonMap, parse, pon_map};

#[test]
fn renders_scalars() {
    assert_eq!(stringify(&Pon::Nil), "()");
    assert_eq!(stringify(&Pon::Bool(true)), "true");
    assert_eq!(stringify(&Pon::Number(33.0)), "33");
    assert_eq!(stringify(&Pon::Number(-1.56)), "-1.56");
    assert_eq!(stringify(&Pon::string("hello")), "'hello'");
}

#[test]
fn escapes_quote_and_backslash() {
    assert_eq!(stringify(&Pon::string(r"it's a \ path")), r"'it\'s a \\ path'");
}

#[test]
fn renders_non_finite_numbers_as_nil() {
    assert_eq!(stringify(&Pon::Number(f64::NAN)), "()");
    assert_eq!(stringify(&Pon::Number(f64::INFINITY)), "()");
}

#[test]
fn renders_call_as_name_then_arg() {
    let value = Pon::call("request_x", pon_map! { "name" => "a" });
    assert_eq!(stringify(&value), "request_x { name: 'a' }");
    assert_eq!(stringify(&Pon::call("frame_stream_create", Pon::Nil)), "frame_stream_create ()");
}

#[test]
fn map_keeps_insertion_order_and_drops_nil_values() {
    let value = pon_map! {
        "z" => 1.0,
        "unset" => Pon::Nil,
        "a" => Pon::array([Pon::Nil, Pon::Bool(false)]),
    };
    assert_eq!(stringify(&value), "{ z: 1, a: [(), false] }");
}

#[test]
fn map_of_only_nil_values_renders_empty() {
    let value = pon_map! { "gone" => Pon::Nil };
    assert_eq!(stringify(&value), "{}");
    assert_eq!(stringify(&Pon::Map(PonMap::new())), "{}");
}

#[test]
fn quotes_keys_that_are_not_identifiers() {
    let value = pon_map! { "with space" => 1.0, "9lives" => 2.0 };
    assert_eq!(stringify(&value), "{ 'with space': 1, '9lives': 2 }");
}

#[test]
fn renders_references_with_prefixes() {
    assert_eq!(stringify(&Pon::selector("#root > Camera")), "#root > Camera");
    assert_eq!(stringify(&Pon::prop_ref("root:Hello", "y")), "root:Hello.y");
    assert_eq!(stringify(&Pon::dep_prop_ref("root:Hello", "y")), "@root:Hello.y");
}

#[test]
fn pretty_breaks_long_arrays_only() {
    let short = Pon::array([Pon::Number(1.0), Pon::Number(2.0)]);
    assert_eq!(stringify_with(&short, PonStringifyOptions::pretty()), "[1, 2]");

    let long = Pon::Array((0..60).map(|n| Pon::Number(f64::from(n))).collect());
    let pretty = stringify_with(&long, PonStringifyOptions::pretty());
    assert_eq!(pretty.lines().count(), 60);
    assert_eq!(parse(&pretty).expect("pretty output parses"), long);
}

#[test]
fn display_matches_stringify() {
    let value = Pon::call("vec3", pon_map! { "x" => 1.5 });
    assert_eq!(value.to_string(), stringify(&value));
}
