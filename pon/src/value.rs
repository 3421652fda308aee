//! The Pon value model.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::PonError;

/// Map payload. Keys are unique and keep insertion order for serialization.
pub type PonMap = IndexMap<String, Pon>;

/// A single Pon value as it appears on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum Pon {
    /// The `()` literal. As a map value it means "unset" and is omitted on output.
    Nil,
    Bool(bool),
    /// Integers and decimals share one representation.
    Number(f64),
    String(String),
    Array(Vec<Pon>),
    Map(PonMap),
    /// A named invocation such as `vec3 { x: 1 }`.
    Call(Box<PonCall>),
    /// Entity reference; holds the raw text after the leading `#`.
    Selector(String),
    /// Snapshot read of `entity.property`.
    PropRef(PropRef),
    /// Dependency-tracked `@entity.property`.
    DepPropRef(PropRef),
}

/// Name plus argument of a [`Pon::Call`].
#[derive(Clone, Debug, PartialEq)]
pub struct PonCall {
    pub name: String,
    pub arg: Pon,
}

/// Reference to a property on an entity, e.g. `root:Hello.y`.
///
/// `entity` keeps the entity part verbatim (selector syntax included) so the
/// reference renders exactly as it was parsed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropRef {
    pub entity: String,
    pub property: String,
}

impl PropRef {
    #[must_use]
    pub fn new(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self { entity: entity.into(), property: property.into() }
    }
}

impl fmt::Display for PropRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.property)
    }
}

impl FromStr for PropRef {
    type Err = PonError;

    /// Split `entity.property` at the last `.` that is not inside `[...]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix('@').unwrap_or(s);
        split_property(s)
            .map(|(entity, property)| Self::new(entity, property))
            .ok_or_else(|| PonError::InvalidReference { offset: 0, text: s.to_owned() })
    }
}

/// Split a reference token into `(entity, property)`.
///
/// Returns `None` when there is no top-level `.`, the entity is empty, or the
/// property is not an identifier.
pub(crate) fn split_property(raw: &str) -> Option<(&str, &str)> {
    let mut depth = 0_usize;
    let mut split = None;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => split = Some(idx),
            _ => {}
        }
    }
    let idx = split?;
    let (entity, property) = (&raw[..idx], &raw[idx + 1..]);
    if entity.is_empty() || !is_identifier(property) {
        return None;
    }
    Some((entity, property))
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// True for bare words that can be written unquoted (call names, map keys).
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

impl Pon {
    #[must_use]
    pub fn call(name: impl Into<String>, arg: Pon) -> Self {
        Self::Call(Box::new(PonCall { name: name.into(), arg }))
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Selector from its raw text, with or without the leading `#`.
    #[must_use]
    pub fn selector(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.strip_prefix('#') {
            Some(rest) => Self::Selector(rest.to_owned()),
            None => Self::Selector(raw),
        }
    }

    #[must_use]
    pub fn prop_ref(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropRef(PropRef::new(entity, property))
    }

    #[must_use]
    pub fn dep_prop_ref(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self::DepPropRef(PropRef::new(entity, property))
    }

    /// Build a map from key/value pairs, keeping their order.
    #[must_use]
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Pon)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Pon>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Pon]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&PonMap> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_call(&self) -> Option<&PonCall> {
        match self {
            Self::Call(v) => Some(v),
            _ => None,
        }
    }

    /// Look up `key` in a map, or in the map argument of a call.
    ///
    /// Returns `None` for other variants and for keys bound to `Nil`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Pon> {
        let map = match self {
            Self::Map(map) => map,
            Self::Call(call) => call.arg.as_map()?,
            _ => return None,
        };
        map.get(key).filter(|v| !v.is_nil())
    }

    /// Like [`Pon::get`], but yields `Nil` for anything absent.
    #[must_use]
    pub fn field(&self, key: &str) -> &Pon {
        static NIL: Pon = Pon::Nil;
        self.get(key).unwrap_or(&NIL)
    }
}

impl FromStr for Pon {
    type Err = PonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse(s)
    }
}

impl From<bool> for Pon {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Pon {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Pon {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Pon {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Pon>> for Pon {
    fn from(value: Vec<Pon>) -> Self {
        Self::Array(value)
    }
}

impl From<PonMap> for Pon {
    fn from(value: PonMap) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
