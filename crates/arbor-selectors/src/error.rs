//! Selector compilation errors.
//!
//! A malformed selector always surfaces as a [`ParseError`]; it is never
//! collapsed into an empty selector list. Callers can therefore tell
//! "invalid selector" apart from "valid selector, zero matches".

use thiserror::Error;

/// Result type for selector compilation.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced by the tokenizer and parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character that cannot start or continue any token.
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the selector string.
        offset: usize,
    },

    /// A token that is valid on its own but illegal where it appeared.
    #[error("unexpected token at offset {0}")]
    UnexpectedToken(usize),

    /// Input ended while a production was still open.
    #[error("unexpected end of selector")]
    UnexpectedEnd,

    /// The selector (or one comma-separated member) is empty.
    #[error("empty selector")]
    EmptySelector,

    /// A combinator with no compound selector on its right.
    #[error("selector ends in a dangling combinator")]
    DanglingCombinator,

    /// `[` without a matching `]`, or a stray `]`.
    #[error("unbalanced bracket in attribute selector")]
    UnbalancedBracket,

    /// `(` without a matching `)`.
    #[error("unbalanced parenthesis in functional pseudo-class")]
    UnbalancedParen,

    /// A quoted string that never closes.
    #[error("unterminated string")]
    UnterminatedString,

    /// A pseudo-class name this engine does not know.
    #[error("unknown pseudo-class `:{0}`")]
    UnknownPseudoClass(String),

    /// Pseudo-elements cannot be matched against a bare node tree.
    #[error("unsupported pseudo-element `::{0}`")]
    UnsupportedPseudoElement(String),

    /// The argument of an `:nth-*` pseudo-class is not a valid An+B form.
    #[error("invalid An+B expression `{0}`")]
    InvalidNth(String),

    /// A backslash escape that cannot be decoded.
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
}
