use super::*;
use crate::{parse, pon_map};
use serde_json::json;

#[test]
fn call_converts_to_transform_object() {
    let value = parse("vec3 { x: 1, y: 33 }").expect("parse");
    assert_eq!(value.to_json(), json!({ "_transform": "vec3", "arg": { "x": 1.0, "y": 33.0 } }));
}

#[test]
fn references_convert_to_prefixed_strings() {
    let value = pon_map! {
        "sel" => Pon::selector("root"),
        "dep" => Pon::dep_prop_ref("root", "y"),
        "nil" => Pon::Nil,
    };
    assert_eq!(value.to_json(), json!({ "sel": "#root", "dep": "@root.y", "nil": null }));
}

#[test]
fn nan_converts_to_null() {
    assert_eq!(Pon::Number(f64::NAN).to_json(), serde_json::Value::Null);
}

#[test]
fn transform_object_converts_back_to_call() {
    let value = Pon::from_json(&json!({ "_transform": "color", "arg": { "r": 1 } }));
    assert_eq!(value, Pon::call("color", pon_map! { "r" => 1.0 }));
}

#[test]
fn objects_with_extra_keys_stay_maps() {
    let value = Pon::from_json(&json!({ "_transform": "color", "arg": 1, "extra": true }));
    assert!(value.as_map().is_some_and(|m| m.len() == 3));
}

#[test]
fn json_keeps_object_order() {
    let value = Pon::from_json(&json!({ "b": 1, "a": [true, null, "s"] }));
    assert_eq!(value.to_string(), "{ b: 1, a: [true, (), 's'] }");
}
