//! Compiled selectors and the per-document selector cache.
//!
//! The cache maps exact selector strings to their compiled form (parsed
//! list plus fast-path scope hint). It is bounded with first-in-first-out
//! eviction and owned by one document; it is never shared.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::ast::{Combinator, SelectorList};
use crate::error::ParseResult;
use crate::parser::parse_selector_list;

/// Default capacity of a document's selector cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// A compiled selector: parsed AST plus its fast-path classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: Box<str>,
    /// The parsed selector list.
    pub list: SelectorList,
    /// Id-based search-root narrowing hint.
    pub scope_hint: ScopeHint,
}

/// How an id selector inside the compiled selector bounds the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeHint {
    /// No usable id; search the whole subtree.
    None,
    /// The rightmost compound requires this id: every match carries it.
    Key(Box<str>),
    /// A compound joined by descendant/child combinators requires this id:
    /// every match lives in the identified element's subtree.
    Ancestor(Box<str>),
}

impl Selector {
    /// Parse and classify a selector string.
    pub fn compile(source: &str) -> ParseResult<Self> {
        let list = parse_selector_list(source)?;
        let scope_hint = compute_scope_hint(&list);
        Ok(Self {
            source: source.into(),
            list,
            scope_hint,
        })
    }

    /// The exact source string this selector was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Derive the id narrowing hint from a parsed list.
///
/// Only a single-member list can be narrowed. An id in the key compound
/// bounds matches to the identified element itself. An id further left
/// counts only when the combinator joining that compound to the chain is
/// descendant or child; sibling combinators place the compound's element
/// outside the candidate's ancestor path.
fn compute_scope_hint(list: &SelectorList) -> ScopeHint {
    if list.selectors.len() != 1 {
        return ScopeHint::None;
    }
    let complex = &list.selectors[0];
    if let Some(id) = complex.key.required_id() {
        return ScopeHint::Key(id.into());
    }
    for (combinator, compound) in &complex.rest {
        if matches!(combinator, Combinator::Descendant | Combinator::Child) {
            if let Some(id) = compound.required_id() {
                return ScopeHint::Ancestor(id.into());
            }
        }
    }
    ScopeHint::None
}

/// Bounded selector-string -> compiled-selector cache, FIFO eviction.
#[derive(Debug)]
pub struct SelectorCache {
    map: HashMap<Rc<str>, Rc<Selector>>,
    /// Insertion order; front is the oldest entry.
    order: VecDeque<Rc<str>>,
    capacity: usize,
}

impl SelectorCache {
    /// Create a cache with the given fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Look up a compiled selector by its exact source string.
    pub fn get(&self, source: &str) -> Option<Rc<Selector>> {
        self.map.get(source).cloned()
    }

    /// Insert a compiled selector, evicting the oldest entry when full.
    pub fn insert(&mut self, selector: Rc<Selector>) {
        let key: Rc<str> = selector.source().into();
        if self.map.contains_key(&*key) {
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                tracing::debug!(selector = %oldest, "selector cache evicting oldest entry");
                self.map.remove(&*oldest);
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, selector);
    }

    /// Number of cached selectors.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
