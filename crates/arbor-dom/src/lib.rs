//! Arbor DOM - headless document tree.
//!
//! An in-memory DOM with arena-allocated nodes, region-allocated
//! strings, refcounted node lifetimes and a selector query engine built
//! on `arbor-selectors`. One `Document` owns everything reachable from
//! it; dropping the last external handle tears the whole tree down in
//! two phases.

mod document;
mod element;
mod error;
mod iter;
mod matcher;
mod node;
mod query;
mod region;
mod tree;

pub use document::Document;
pub use error::{DomError, DomResult, HierarchyViolation};
pub use iter::ElementIter;
pub use node::{NodeId, NodeType};
pub use region::StrId;

// Selector compilation errors surface through `DomError::Syntax`.
pub use arbor_selectors::ParseError;
