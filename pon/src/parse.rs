//! Recursive descent parser for Pon text.
//!
//! Whitespace and `//` line comments are skipped between tokens. Structural
//! delimiters are strict: an unbalanced bracket, a missing comma, or trailing
//! garbage is an error rather than a truncated value.

use crate::error::PonError;
use crate::value::{Pon, PonMap, PropRef, is_ident_char, is_ident_start, split_property};

const MAX_DEPTH: usize = 128;

/// Parser switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept unquoted words (`root`, `root:[name=a]`) as strings.
    ///
    /// Older payloads relied on this. New payloads should quote strings.
    pub legacy_bare_words: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn legacy() -> Self {
        Self { legacy_bare_words: true }
    }
}

/// Parse a complete Pon value.
///
/// # Errors
///
/// Returns [`PonError`] if the text does not match the grammar or has
/// trailing input after the value.
pub fn parse(input: &str) -> Result<Pon, PonError> {
    parse_with(input, ParseOptions::default())
}

/// Parse a complete Pon value with explicit options.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_with(input: &str, options: ParseOptions) -> Result<Pon, PonError> {
    let mut parser = Parser { src: input, pos: 0, options };
    parser.skip_insignificant();
    let value = parser.value(0)?;
    parser.skip_insignificant();
    if parser.peek().is_some() {
        return Err(PonError::TrailingInput { offset: parser.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_insignificant(&mut self) {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.src.len() - trimmed.len();
            if !trimmed.starts_with("//") {
                return;
            }
            self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
        }
    }

    fn unexpected(&self, expected: &'static str) -> PonError {
        match self.peek() {
            Some(found) => PonError::UnexpectedChar { offset: self.pos, found, expected },
            None => PonError::UnexpectedEnd { offset: self.pos },
        }
    }

    fn expect(&mut self, ch: char, expected: &'static str) -> Result<(), PonError> {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Pon, PonError> {
        if depth > MAX_DEPTH {
            return Err(PonError::TooDeep { offset: self.pos });
        }
        match self.peek() {
            Some('(') => self.nil(),
            Some('\'') => self.string().map(Pon::String),
            Some('[') => self.array(depth),
            Some('{') => self.map(depth),
            Some('-' | '0'..='9') => self.number(),
            Some('#' | '@') => self.reference(),
            Some(ch) if is_ident_start(ch) => self.word(depth),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn nil(&mut self) -> Result<Pon, PonError> {
        self.expect('(', "'('")?;
        self.skip_insignificant();
        self.expect(')', "')'")?;
        Ok(Pon::Nil)
    }

    fn number(&mut self) -> Result<Pon, PonError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let int_digits = self.digits();
        let mut valid = int_digits > 0;
        if valid && self.peek() == Some('.') {
            self.pos += 1;
            valid = self.digits() > 0;
        }
        let text = &self.src[start..self.pos];
        if !valid {
            return Err(PonError::InvalidNumber { offset: start, text: text.to_owned() });
        }
        text.parse::<f64>()
            .map(Pon::Number)
            .map_err(|_| PonError::InvalidNumber { offset: start, text: text.to_owned() })
    }

    fn digits(&mut self) -> usize {
        let count = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        self.pos += count;
        count
    }

    fn string(&mut self) -> Result<String, PonError> {
        self.expect('\'', "a quoted string")?;
        let mut out = String::new();
        loop {
            let offset = self.pos;
            match self.bump() {
                None => return Err(PonError::UnexpectedEnd { offset }),
                Some('\'') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(ch @ ('\\' | '\'')) => out.push(ch),
                    Some(found) => return Err(PonError::InvalidEscape { offset, found }),
                    None => return Err(PonError::UnexpectedEnd { offset: self.pos }),
                },
                Some(ch) => out.push(ch),
            }
        }
    }

    fn array(&mut self, depth: usize) -> Result<Pon, PonError> {
        self.expect('[', "'['")?;
        let mut items = Vec::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Pon::Array(items));
            }
            items.push(self.value(depth + 1)?);
            self.skip_insignificant();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(Pon::Array(items));
                }
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
    }

    fn map(&mut self, depth: usize) -> Result<Pon, PonError> {
        self.expect('{', "'{'")?;
        let mut entries = PonMap::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Pon::Map(entries));
            }
            let key_offset = self.pos;
            let key = self.key()?;
            self.skip_insignificant();
            self.expect(':', "':'")?;
            self.skip_insignificant();
            let value = self.value(depth + 1)?;
            if entries.contains_key(&key) {
                return Err(PonError::DuplicateKey { offset: key_offset, key });
            }
            entries.insert(key, value);
            self.skip_insignificant();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(Pon::Map(entries));
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
    }

    fn key(&mut self) -> Result<String, PonError> {
        match self.peek() {
            Some('\'') => self.string(),
            Some(ch) if is_ident_start(ch) => Ok(self.identifier().to_owned()),
            _ => Err(self.unexpected("a map key")),
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        let len = self.rest().find(|c: char| !is_ident_char(c)).unwrap_or(self.rest().len());
        self.pos += len;
        &self.src[start..self.pos]
    }

    /// A word is a boolean, a call, the head of a reference, or a legacy string.
    fn word(&mut self, depth: usize) -> Result<Pon, PonError> {
        let start = self.pos;
        let word = self.identifier();

        if matches!(self.peek(), Some(':' | '.')) {
            self.pos = start;
            return self.reference();
        }

        // A call named `true` or `false` is still a call.
        let after_word = self.pos;
        self.skip_insignificant();
        if self.starts_call_arg() {
            let arg = self.value(depth + 1)?;
            return Ok(Pon::call(word, arg));
        }
        self.pos = after_word;

        match word {
            "true" => return Ok(Pon::Bool(true)),
            "false" => return Ok(Pon::Bool(false)),
            _ => {}
        }

        if self.options.legacy_bare_words {
            Ok(Pon::String(word.to_owned()))
        } else {
            Err(PonError::BareWord { offset: start, word: word.to_owned() })
        }
    }

    fn starts_call_arg(&self) -> bool {
        match self.peek() {
            Some('{' | '[' | '(' | '\'' | '#' | '@' | '-' | '0'..='9') => true,
            Some(ch) => is_ident_start(ch),
            None => false,
        }
    }

    /// Parse `#selector`, `entity.prop` or `@entity.prop`.
    ///
    /// Selector segments may be chained with `>`; the raw text between the
    /// first and last segment is kept verbatim, spacing included.
    fn reference(&mut self) -> Result<Pon, PonError> {
        let start = self.pos;
        let dependent = self.peek() == Some('@');
        if dependent {
            self.pos += 1;
        }
        let token_start = self.pos;
        self.reference_segment()?;
        loop {
            let segment_end = self.pos;
            self.skip_insignificant();
            if self.peek() != Some('>') {
                self.pos = segment_end;
                break;
            }
            self.pos += 1;
            self.skip_insignificant();
            self.reference_segment()?;
        }
        let raw = &self.src[token_start..self.pos];

        if let Some((entity, property)) = split_property(raw) {
            let prop_ref = PropRef::new(entity, property);
            return Ok(if dependent { Pon::DepPropRef(prop_ref) } else { Pon::PropRef(prop_ref) });
        }
        if dependent {
            return Err(PonError::InvalidReference { offset: start, text: raw.to_owned() });
        }
        if let Some(selector) = raw.strip_prefix('#') {
            return Ok(Pon::Selector(selector.to_owned()));
        }
        if self.options.legacy_bare_words {
            Ok(Pon::String(raw.to_owned()))
        } else {
            Err(PonError::BareWord { offset: start, word: raw.to_owned() })
        }
    }

    fn reference_segment(&mut self) -> Result<(), PonError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            match ch {
                '[' => self.bracket_group()?,
                ch if is_ident_char(ch) || matches!(ch, ':' | '.' | '#' | '-' | '*') => {
                    self.pos += ch.len_utf8();
                }
                _ => break,
            }
        }
        if self.pos == start || (self.pos == start + 1 && self.src[start..].starts_with('#')) {
            return Err(self.unexpected("a reference"));
        }
        Ok(())
    }

    /// Consume a balanced `[...]` group, quotes included, as opaque text.
    fn bracket_group(&mut self) -> Result<(), PonError> {
        let mut depth = 0_usize;
        loop {
            let offset = self.pos;
            match self.bump() {
                None => return Err(PonError::UnexpectedEnd { offset }),
                Some('[') => depth += 1,
                Some(']') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('\'') => {
                    self.pos = offset;
                    self.string()?;
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
