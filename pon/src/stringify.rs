//! Pon serialization.
//!
//! Output is deterministic: map entries keep insertion order and `Nil` map
//! values are dropped, so an "unset" field never reaches the wire.

use std::fmt::{self, Write as _};

use crate::value::{Pon, is_identifier};

/// Line length past which `break_up_lines` puts one entry per line.
const BREAK_UP_THRESHOLD: usize = 180;

/// Rendering switches for [`stringify_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PonStringifyOptions {
    /// Break long arrays and maps onto multiple lines. Never use for wire payloads.
    pub break_up_lines: bool,
}

impl PonStringifyOptions {
    #[must_use]
    pub fn pretty() -> Self {
        Self { break_up_lines: true }
    }
}

/// Render a value as single-line Pon text.
#[must_use]
pub fn stringify(value: &Pon) -> String {
    stringify_with(value, PonStringifyOptions::default())
}

/// Render a value with explicit options.
#[must_use]
pub fn stringify_with(value: &Pon, options: PonStringifyOptions) -> String {
    let mut out = String::new();
    write_value(&mut out, value, options);
    out
}

/// Quote and escape a string literal.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if matches!(ch, '\\' | '\'') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

fn write_value(out: &mut String, value: &Pon, options: PonStringifyOptions) {
    match value {
        Pon::Nil => out.push_str("()"),
        Pon::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Pon::Number(v) if v.is_finite() => {
            let _ = write!(out, "{v}");
        }
        // No literal exists for NaN or infinities.
        Pon::Number(_) => out.push_str("()"),
        Pon::String(v) => out.push_str(&quote(v)),
        Pon::Array(items) => {
            let parts = items
                .iter()
                .map(|item| stringify_with(item, options))
                .collect::<Vec<_>>();
            out.push('[');
            out.push_str(&join(&parts, options));
            out.push(']');
        }
        Pon::Map(entries) => {
            let parts = entries
                .iter()
                .filter(|(_, v)| !v.is_nil())
                .map(|(k, v)| {
                    let key = if is_identifier(k) { k.clone() } else { quote(k) };
                    format!("{key}: {}", stringify_with(v, options))
                })
                .collect::<Vec<_>>();
            if parts.is_empty() {
                out.push_str("{}");
            } else {
                out.push_str("{ ");
                out.push_str(&join(&parts, options));
                out.push_str(" }");
            }
        }
        Pon::Call(call) => {
            out.push_str(&call.name);
            out.push(' ');
            write_value(out, &call.arg, options);
        }
        Pon::Selector(raw) => {
            out.push('#');
            out.push_str(raw);
        }
        Pon::PropRef(prop_ref) => {
            let _ = write!(out, "{prop_ref}");
        }
        Pon::DepPropRef(prop_ref) => {
            let _ = write!(out, "@{prop_ref}");
        }
    }
}

fn join(parts: &[String], options: PonStringifyOptions) -> String {
    let joined = parts.join(", ");
    if options.break_up_lines && joined.len() > BREAK_UP_THRESHOLD {
        parts.join(",\n")
    } else {
        joined
    }
}

impl fmt::Display for Pon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&stringify_with(self, PonStringifyOptions::pretty()))
        } else {
            f.write_str(&stringify(self))
        }
    }
}

#[cfg(test)]
#[path = "stringify_test.rs"]
mod tests;
