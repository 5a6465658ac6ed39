//! DOM operation errors.
//!
//! Every mutation error is synchronous and leaves the tree unmodified:
//! operations validate fully before touching any link. A selector parse
//! error aborts the whole query rather than matching nothing.

use arbor_selectors::ParseError;
use thiserror::Error;

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Errors produced by tree mutation, attribute mutation and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The requested insertion would violate tree structure rules.
    #[error("hierarchy request error: {0}")]
    Hierarchy(HierarchyViolation),

    /// A node, attribute or id that was expected to exist does not.
    #[error("not found")]
    NotFound,

    /// An element or attribute name contains an illegal character.
    #[error("invalid character in name `{0}`")]
    InvalidCharacter(String),

    /// The selector string is malformed.
    #[error("selector syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// The document's region budget is exhausted.
    #[error("allocation failure: document region exhausted")]
    Allocation,
}

/// Why an insertion was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyViolation {
    /// The new parent is the node itself or one of its descendants.
    #[error("insertion would create a cycle")]
    Cycle,
    /// The parent kind cannot hold children.
    #[error("parent cannot hold children")]
    ParentCannotHoldChildren,
    /// The child kind is never insertable (e.g. a document node).
    #[error("node kind cannot be inserted")]
    ChildNotInsertable,
    /// A document may hold at most one element child.
    #[error("document already has an element child")]
    DocumentElementExists,
    /// A document may hold at most one doctype child.
    #[error("document already has a doctype child")]
    DocumentDoctypeExists,
    /// Text and doctype placement rules.
    #[error("node kind not allowed under this parent")]
    KindNotAllowedHere,
}
