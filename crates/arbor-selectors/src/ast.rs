//! Selector AST.
//!
//! A selector list is a comma-separated sequence of complex selectors.
//! Each complex selector is stored rightmost-compound-first, because the
//! matcher evaluates right-to-left: the key compound is checked against
//! the candidate element before any combinator is walked.

/// A full, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// Members in source order.
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Iterate members in source order.
    pub fn iter(&self) -> impl Iterator<Item = &ComplexSelector> {
        self.selectors.iter()
    }
}

/// One complex selector: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound (matched against the candidate itself).
    pub key: CompoundSelector,
    /// Remaining compounds from right to left. Each entry's combinator
    /// joins it to the compound on its *right*.
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

/// Combinators between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: parent.
    Child,
    /// `+`: immediately preceding element sibling.
    NextSibling,
    /// `~`: any preceding element sibling.
    SubsequentSibling,
}

/// An unordered set of simple selectors with no combinator between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Simple selectors; never empty in a parsed selector.
    pub simples: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// The id required by this compound, if it contains an id selector.
    pub fn required_id(&self) -> Option<&str> {
        self.simples.iter().find_map(|s| match s {
            SimpleSelector::Id(id) => Some(id.as_ref()),
            _ => None,
        })
    }
}

/// A single simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// `*`
    Universal,
    /// Type selector (tag name), matched ASCII case-insensitively.
    Type(Box<str>),
    /// `.class`
    Class(Box<str>),
    /// `#id`
    Id(Box<str>),
    /// `[attr]`, `[attr=value]`, ...
    Attribute(AttributeSelector),
    /// `:first-child`, `:nth-child(2n+1)`, ...
    PseudoClass(PseudoClass),
    /// `:not(...)` with a nested complex selector.
    Not(Box<ComplexSelector>),
}

/// Attribute selector with its match operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name, matched against the first attribute with that
    /// qualified name irrespective of namespace.
    pub name: Box<str>,
    /// Operator plus expected value.
    pub op: AttrMatch,
    /// `[attr=value i]` case-insensitivity flag.
    pub case_insensitive: bool,
}

/// Attribute match operator semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[attr]` - presence only.
    Exists,
    /// `[attr=v]` - exact value.
    Equals(Box<str>),
    /// `[attr~=v]` - whitespace-delimited word.
    Includes(Box<str>),
    /// `[attr|=v]` - exact or `v-` prefix.
    DashMatch(Box<str>),
    /// `[attr^=v]` - value prefix.
    Prefix(Box<str>),
    /// `[attr$=v]` - value suffix.
    Suffix(Box<str>),
    /// `[attr*=v]` - substring.
    Substring(Box<str>),
}

/// Structural pseudo-classes supported by the headless matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:root`
    Root,
    /// `:empty`
    Empty,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:only-of-type`
    OnlyOfType,
    /// `:nth-child(An+B)`
    NthChild(Nth),
    /// `:nth-last-child(An+B)`
    NthLastChild(Nth),
    /// `:nth-of-type(An+B)`
    NthOfType(Nth),
    /// `:nth-last-of-type(An+B)`
    NthLastOfType(Nth),
}

/// An+B index expression for `:nth-*` pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    /// Step (A in An+B).
    pub a: i32,
    /// Offset (B in An+B).
    pub b: i32,
}

impl Nth {
    /// `odd` == `2n+1`.
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// `even` == `2n`.
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }

    /// Whether a 1-based sibling index satisfies this expression.
    pub fn matches_index(&self, index: i32) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        let diff = index - self.b;
        if self.a > 0 {
            diff >= 0 && diff % self.a == 0
        } else {
            diff <= 0 && diff % self.a == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_odd() {
        let nth = Nth::odd();
        assert!(nth.matches_index(1));
        assert!(!nth.matches_index(2));
        assert!(nth.matches_index(3));
    }

    #[test]
    fn test_nth_even() {
        let nth = Nth::even();
        assert!(!nth.matches_index(1));
        assert!(nth.matches_index(2));
        assert!(nth.matches_index(4));
    }

    #[test]
    fn test_nth_fixed_index() {
        let nth = Nth { a: 0, b: 3 };
        assert!(nth.matches_index(3));
        assert!(!nth.matches_index(6));
    }

    #[test]
    fn test_nth_negative_step() {
        // -n+3 matches the first three siblings.
        let nth = Nth { a: -1, b: 3 };
        assert!(nth.matches_index(1));
        assert!(nth.matches_index(2));
        assert!(nth.matches_index(3));
        assert!(!nth.matches_index(4));
    }

    #[test]
    fn test_required_id() {
        let compound = CompoundSelector {
            simples: vec![
                SimpleSelector::Type("div".into()),
                SimpleSelector::Id("main".into()),
            ],
        };
        assert_eq!(compound.required_id(), Some("main"));
    }
}
