//! Query dispatch: fast paths, id narrowing and the generic scan.
//!
//! Every query resolves through one funnel. The selector string is first
//! classified without parsing; single-simple-selector shapes (`#id`,
//! `.class`, `tag`) run directly against the identity index, class bloom
//! or tag compare. Selectors containing a plain id compile through the
//! per-document cache and may narrow the search root via their scope
//! hint. Everything else compiles and scans the subtree with the full
//! matcher. All paths return exactly what the generic scan would.

use std::rc::Rc;

use arbor_selectors::{FastPath, ScopeHint, Selector, classify};

use crate::document::Document;
use crate::error::DomResult;
use crate::iter::ElementIter;
use crate::matcher;
use crate::node::NodeId;

/// Dispatch strategy. `Generic` skips every fast path so the two can be
/// compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryMode {
    FastPath,
    Generic,
}

impl Document {
    /// First element in the document matching the selector list, in tree
    /// order.
    pub fn query_selector(&self, selectors: &str) -> DomResult<Option<NodeId>> {
        self.query_selector_from(self.document_node(), selectors)
    }

    /// Every element in the document matching the selector list, in tree
    /// order.
    pub fn query_selector_all(&self, selectors: &str) -> DomResult<Vec<NodeId>> {
        self.query_selector_all_from(self.document_node(), selectors)
    }

    /// First matching element among `root`'s descendants. `root` itself
    /// is never returned.
    pub fn query_selector_from(&self, root: NodeId, selectors: &str) -> DomResult<Option<NodeId>> {
        let found = self.run_query(root, selectors, QueryMode::FastPath, true)?;
        Ok(found.into_iter().next())
    }

    /// Every matching element among `root`'s descendants, in tree order.
    pub fn query_selector_all_from(
        &self,
        root: NodeId,
        selectors: &str,
    ) -> DomResult<Vec<NodeId>> {
        self.run_query(root, selectors, QueryMode::FastPath, false)
    }

    /// Whether `el` matches the selector list. Non-element nodes never
    /// match; a malformed selector is still an error.
    pub fn matches(&self, el: NodeId, selectors: &str) -> DomResult<bool> {
        let selector = self.compiled_selector(selectors)?;
        Ok(matcher::matches_selector_list(self, el, &selector.list))
    }

    /// Nearest inclusive ancestor of `el` (starting with `el` itself)
    /// matching the selector list.
    pub fn closest(&self, el: NodeId, selectors: &str) -> DomResult<Option<NodeId>> {
        let selector = self.compiled_selector(selectors)?;
        let mut current = Some(el);
        while let Some(id) = current {
            if self.node(id).is_some_and(|n| n.is_element())
                && matcher::matches_selector_list(self, id, &selector.list)
            {
                return Ok(Some(id));
            }
            current = self.node(id).and_then(|n| n.parent.to_option());
        }
        Ok(None)
    }

    /// Compile a selector through the per-document cache. The same
    /// string is parsed at most once while it stays cached.
    fn compiled_selector(&self, source: &str) -> DomResult<Rc<Selector>> {
        let mut cache = self.cache().borrow_mut();
        if let Some(selector) = cache.get(source) {
            return Ok(selector);
        }
        let selector = Rc::new(Selector::compile(source)?);
        cache.insert(selector.clone());
        Ok(selector)
    }

    pub(crate) fn run_query(
        &self,
        root: NodeId,
        selectors: &str,
        mode: QueryMode,
        first_only: bool,
    ) -> DomResult<Vec<NodeId>> {
        if mode == QueryMode::Generic {
            return self.generic_query(root, selectors, first_only);
        }
        match classify(selectors) {
            FastPath::Id(id) => self.id_query(root, selectors, id, first_only),
            FastPath::Class(class) => {
                tracing::debug!(selector = selectors, "class fast path");
                Ok(self.scan(root, first_only, |el| {
                    self.node(el)
                        .and_then(|n| n.as_element())
                        .is_some_and(|e| e.has_class(self.region(), class))
                }))
            }
            FastPath::Tag(tag) => {
                tracing::debug!(selector = selectors, "tag fast path");
                Ok(self.scan(root, first_only, |el| {
                    self.tag_name(el).is_some_and(|t| t.eq_ignore_ascii_case(tag))
                }))
            }
            FastPath::ScopedId => self.scoped_query(root, selectors, first_only),
            FastPath::Generic => self.generic_query(root, selectors, first_only),
        }
    }

    /// Pure `#id` selector. When the root is connected the identity
    /// index answers directly; a detached root falls back to a scan of
    /// its (unindexed) subtree.
    fn id_query(
        &self,
        root: NodeId,
        selectors: &str,
        id: &str,
        first_only: bool,
    ) -> DomResult<Vec<NodeId>> {
        if self.is_connected(root) {
            let candidates = self.id_index_entry(id).unwrap_or(&[]);
            match candidates {
                [] => return Ok(Vec::new()),
                [single] => {
                    tracing::debug!(selector = selectors, "id fast path");
                    let hit = *single != root && self.contains(root, *single);
                    return Ok(if hit { vec![*single] } else { Vec::new() });
                }
                // Duplicate ids: tree order matters, scan instead.
                _ => {}
            }
        }
        Ok(self.scan(root, first_only, |el| self.id_of(el) == Some(id)))
    }

    /// Selector containing a plain id somewhere: compile it and use its
    /// scope hint to shrink the searched subtree before matching.
    fn scoped_query(
        &self,
        root: NodeId,
        selectors: &str,
        first_only: bool,
    ) -> DomResult<Vec<NodeId>> {
        let selector = self.compiled_selector(selectors)?;
        let narrowed = if self.is_connected(root) {
            match &selector.scope_hint {
                ScopeHint::Key(id) => match self.id_index_entry(id) {
                    Some([single]) => {
                        // Every match carries this id; with a unique
                        // holder there is one candidate to test.
                        let single = *single;
                        let hit = single != root
                            && self.contains(root, single)
                            && matcher::matches_selector_list(self, single, &selector.list);
                        return Ok(if hit { vec![single] } else { Vec::new() });
                    }
                    None => return Ok(Vec::new()),
                    Some(_) => None,
                },
                ScopeHint::Ancestor(id) => match self.id_index_entry(id) {
                    Some([single]) => {
                        // Matches live strictly inside the identified
                        // element's subtree.
                        let single = *single;
                        if self.contains(root, single) {
                            Some(single)
                        } else if self.contains(single, root) {
                            Some(root)
                        } else {
                            return Ok(Vec::new());
                        }
                    }
                    None => return Ok(Vec::new()),
                    Some(_) => None,
                },
                ScopeHint::None => None,
            }
        } else {
            None
        };
        let scan_root = narrowed.unwrap_or(root);
        if narrowed.is_some() {
            tracing::debug!(selector = selectors, "scoped id fast path");
        }
        Ok(self.scan(scan_root, first_only, |el| {
            matcher::matches_selector_list(self, el, &selector.list)
        }))
    }

    fn generic_query(
        &self,
        root: NodeId,
        selectors: &str,
        first_only: bool,
    ) -> DomResult<Vec<NodeId>> {
        let selector = self.compiled_selector(selectors)?;
        Ok(self.scan(root, first_only, |el| {
            matcher::matches_selector_list(self, el, &selector.list)
        }))
    }

    fn scan<F>(&self, root: NodeId, first_only: bool, mut accept: F) -> Vec<NodeId>
    where
        F: FnMut(NodeId) -> bool,
    {
        let mut found = Vec::new();
        for el in ElementIter::new(self, root) {
            if accept(el) {
                found.push(el);
                if first_only {
                    break;
                }
            }
        }
        found
    }
}
