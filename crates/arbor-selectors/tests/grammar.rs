//! Randomized grammar checks: the fast-path classifier must agree with
//! the parser on simple shapes, and the parser must reject garbage with
//! an error rather than a panic.

use arbor_selectors::{
    Combinator, FastPath, SimpleSelector, classify, parse_selector_list,
};
use proptest::prelude::*;

/// An unescaped name the pure fast paths are allowed to shortcut.
fn simple_name() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_-]{0,10}"
}

proptest! {
    #[test]
    fn tag_classification_agrees_with_parse(name in simple_name()) {
        prop_assert_eq!(classify(&name), FastPath::Tag(&name));
        let list = parse_selector_list(&name).unwrap();
        prop_assert_eq!(list.selectors.len(), 1);
        let complex = &list.selectors[0];
        prop_assert!(complex.rest.is_empty());
        prop_assert_eq!(
            &complex.key.simples,
            &vec![SimpleSelector::Type(name.as_str().into())]
        );
    }

    #[test]
    fn class_classification_agrees_with_parse(name in simple_name()) {
        let source = format!(".{name}");
        prop_assert_eq!(classify(&source), FastPath::Class(&name));
        let list = parse_selector_list(&source).unwrap();
        prop_assert_eq!(
            &list.selectors[0].key.simples,
            &vec![SimpleSelector::Class(name.as_str().into())]
        );
    }

    #[test]
    fn id_classification_agrees_with_parse(name in simple_name()) {
        let source = format!("#{name}");
        prop_assert_eq!(classify(&source), FastPath::Id(&name));
        let list = parse_selector_list(&source).unwrap();
        prop_assert_eq!(
            &list.selectors[0].key.simples,
            &vec![SimpleSelector::Id(name.as_str().into())]
        );
    }

    #[test]
    fn list_members_match_comma_count(
        names in proptest::collection::vec(simple_name(), 1..6),
    ) {
        let source = names.join(", ");
        let list = parse_selector_list(&source).unwrap();
        prop_assert_eq!(list.selectors.len(), names.len());
    }

    #[test]
    fn combinator_spacing_is_insignificant(
        left in simple_name(),
        right in simple_name(),
        pick in 0usize..3,
    ) {
        let (symbol, combinator) = [
            (">", Combinator::Child),
            ("+", Combinator::NextSibling),
            ("~", Combinator::SubsequentSibling),
        ][pick];
        let tight = parse_selector_list(&format!("{left}{symbol}{right}")).unwrap();
        let spaced = parse_selector_list(&format!("{left} {symbol} {right}")).unwrap();
        prop_assert_eq!(&tight, &spaced);
        prop_assert_eq!(tight.selectors[0].rest[0].0, combinator);
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,40}") {
        // Outcome is unconstrained; reaching this line is the assertion.
        let _ = parse_selector_list(&input);
    }
}
