/// Error returned by [`crate::parse`].
///
/// Every variant carries the byte offset into the input where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PonError {
    /// Input ended in the middle of a value.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },
    /// A character that cannot start or continue the current construct.
    #[error("unexpected {found:?} at offset {offset}, expected {expected}")]
    UnexpectedChar { offset: usize, found: char, expected: &'static str },
    /// A number that does not match `["-"] digits ["." digits]`.
    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { offset: usize, text: String },
    /// A backslash followed by anything other than `\` or `'`.
    #[error("invalid escape \\{found} at offset {offset}")]
    InvalidEscape { offset: usize, found: char },
    /// The same key appears twice in one map.
    #[error("duplicate map key {key:?} at offset {offset}")]
    DuplicateKey { offset: usize, key: String },
    /// An unquoted word that is neither a call, a boolean, nor a reference.
    #[error("bare word {word:?} at offset {offset}; quote it as a string")]
    BareWord { offset: usize, word: String },
    /// A `#`/`@` reference that is missing its required parts.
    #[error("invalid reference {text:?} at offset {offset}")]
    InvalidReference { offset: usize, text: String },
    /// Nesting exceeded the parser's depth limit.
    #[error("nesting too deep at offset {offset}")]
    TooDeep { offset: usize },
    /// Non-whitespace input after a complete top-level value.
    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

impl PonError {
    /// Byte offset at which the error was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEnd { offset }
            | Self::UnexpectedChar { offset, .. }
            | Self::InvalidNumber { offset, .. }
            | Self::InvalidEscape { offset, .. }
            | Self::DuplicateKey { offset, .. }
            | Self::BareWord { offset, .. }
            | Self::InvalidReference { offset, .. }
            | Self::TooDeep { offset }
            | Self::TrailingInput { offset } => *offset,
        }
    }
}
