use super::*;

#[test]
fn split_property_uses_last_top_level_dot() {
    assert_eq!(split_property("root:Hello.y"), Some(("root:Hello", "y")));
    assert_eq!(split_property("a:[x=1.5].y"), Some(("a:[x=1.5]", "y")));
    assert_eq!(split_property("a:[x=1.5]"), None);
    assert_eq!(split_property(".y"), None);
    assert_eq!(split_property("a.9"), None);
}

#[test]
fn prop_ref_from_str_accepts_dependent_prefix() {
    let plain: PropRef = "root:Hello.y".parse().expect("prop ref");
    let dep: PropRef = "@root:Hello.y".parse().expect("dep prop ref");
    assert_eq!(plain, PropRef::new("root:Hello", "y"));
    assert_eq!(plain, dep);
    assert!("root".parse::<PropRef>().is_err());
}

#[test]
fn selector_constructor_strips_hash() {
    assert_eq!(Pon::selector("#567"), Pon::Selector("567".to_owned()));
    assert_eq!(Pon::selector("567"), Pon::Selector("567".to_owned()));
}

#[test]
fn get_reads_map_and_call_args_but_skips_nil() {
    let map = Pon::map([("x", Pon::Number(1.0)), ("unset", Pon::Nil)]);
    assert_eq!(map.get("x"), Some(&Pon::Number(1.0)));
    assert_eq!(map.get("unset"), None);

    let call = Pon::call("vec3", map);
    assert_eq!(call.get("x").and_then(Pon::as_f64), Some(1.0));
    assert_eq!(Pon::Number(1.0).get("x"), None);
    assert!(call.field("missing").is_nil());
    assert_eq!(call.field("x").as_f64(), Some(1.0));
}

#[test]
fn identifiers() {
    assert!(is_identifier("vec3"));
    assert!(is_identifier("_private"));
    assert!(!is_identifier("3d"));
    assert!(!is_identifier(""));
    assert!(!is_identifier("with space"));
}
