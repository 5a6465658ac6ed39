//! Arbor Selectors - CSS selector compilation
//!
//! Tokenizer, recursive-descent parser, fast-path classification and a
//! bounded per-document selector cache. This crate is pure: it never
//! touches a node tree, so the DOM crate can depend on it for matching.

mod ast;
mod cache;
mod error;
mod fast_path;
mod parser;
mod tokenizer;

pub use ast::{
    AttrMatch, AttributeSelector, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    SelectorList, SimpleSelector,
};
pub use cache::{DEFAULT_CACHE_CAPACITY, ScopeHint, Selector, SelectorCache};
pub use error::{ParseError, ParseResult};
pub use fast_path::{FastPath, classify};
pub use parser::parse_selector_list;
pub use tokenizer::{Token, TokenKind, tokenize};
