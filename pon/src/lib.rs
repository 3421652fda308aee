//! Pon: the text notation used for every pixelport request and response.
//!
//! This crate owns the wire representation shared by the client engine and
//! the CLI. A Pon value is one of a closed set of variants (see [`Pon`]);
//! text is parsed with [`parse`] and rendered with [`stringify`] or
//! `Display`.
//!
//! ```text
//! vec3 { x: -1.56, y: 33, z: 533.12 }     call with a map argument
//! #root > Camera                          selector
//! root:Hello.y / @root:Hello.y            property reference / dependent reference
//! ```

mod error;
mod json;
mod parse;
mod stringify;
mod to_pon;
mod value;

pub use error::PonError;
pub use parse::{ParseOptions, parse, parse_with};
pub use stringify::{PonStringifyOptions, quote, stringify, stringify_with};
pub use to_pon::ToPon;
pub use value::{Pon, PonCall, PonMap, PropRef, is_identifier};

pub use indexmap;

/// Build a [`Pon::Map`] from `key => value` pairs, keeping their order.
///
/// Values go through [`ToPon`], so plain Rust values work:
/// `pon_map! { "x" => 1.0, "name" => "a" }`.
#[macro_export]
macro_rules! pon_map {
    () => {
        $crate::Pon::Map($crate::PonMap::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::PonMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::ToPon::to_pon(&$value));
        )+
        $crate::Pon::Map(map)
    }};
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
