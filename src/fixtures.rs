//! Shared grammar fixtures for unit tests.

use crate::grammar::{Grammar, Rule};

/// The boolean grammar from the enumeration scenarios: terminals `True` and
/// `False` plus the binary conjunction `and`, all over symbol `bool`.
pub(crate) fn boolean_grammar() -> Grammar<u32, bool> {
    let mut grammar = Grammar::new("bool");
    grammar
        .add_rule(Rule::terminal("True", "bool", |_, _| true))
        .unwrap();
    grammar
        .add_rule(Rule::terminal("False", "bool", |_, _| false))
        .unwrap();
    grammar
        .add_rule(Rule::branching(
            "and",
            "bool",
            vec!["bool".into(), "bool".into()],
            |_, values| values[0] && values[1],
        ))
        .unwrap();
    grammar
}

/// A grammar whose terminals inspect the referent, for evaluation tests
/// against a numeric universe.
pub(crate) fn parity_grammar() -> Grammar<u32, bool> {
    let mut grammar = Grammar::new("bool");
    grammar
        .add_rule(Rule::terminal("even", "bool", |referent, _| {
            referent % 2 == 0
        }))
        .unwrap();
    grammar
        .add_rule(Rule::terminal("odd", "bool", |referent, _| {
            referent % 2 == 1
        }))
        .unwrap();
    grammar
        .add_rule(Rule::branching(
            "not",
            "bool",
            vec!["bool".into()],
            |_, values: &[bool]| !values[0],
        ))
        .unwrap();
    grammar
        .add_rule(Rule::branching(
            "and",
            "bool",
            vec!["bool".into(), "bool".into()],
            |_, values| values[0] && values[1],
        ))
        .unwrap();
    grammar
}
