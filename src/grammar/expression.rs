use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::rule::{Rule, RuleFn};
use crate::semantics::{Meaning, Truthy, Universe};

/// A derivation tree node, built up from a [`Grammar`](super::Grammar) by
/// applying a sequence of rules. Crucially, it is callable: each node applies
/// the function of its originating rule.
///
/// `children` is `None` for terminals. This is not the same as an empty
/// vector, which only occurs transiently while a parser is still appending
/// children to an open node.
pub struct Expression<R, V> {
    rule_name: String,
    func: RuleFn<R, V>,
    children: Option<Vec<Rc<Expression<R, V>>>>,
}

impl<R, V> Expression<R, V> {
    /// Terminal node for the given rule.
    pub fn leaf(rule: &Rule<R, V>) -> Self {
        Self {
            rule_name: rule.name().to_owned(),
            func: Rc::clone(rule.func()),
            children: None,
        }
    }

    /// Internal node for the given rule. An empty child vector is kept as-is;
    /// parsers and enumerators are responsible for matching the rule's arity.
    pub fn node(rule: &Rule<R, V>, children: Vec<Rc<Expression<R, V>>>) -> Self {
        Self {
            rule_name: rule.name().to_owned(),
            func: Rc::clone(rule.func()),
            children: Some(children),
        }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn children(&self) -> Option<&[Rc<Expression<R, V>>]> {
        self.children.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Applies the tree to a referent. Children are evaluated eagerly, left
    /// to right, with the same referent threaded to every child unchanged;
    /// the node's function then folds their values. Terminals apply their
    /// function to the referent directly.
    pub fn call(&self, referent: &R) -> V {
        match &self.children {
            None => (self.func)(referent, &[]),
            Some(children) => {
                let values: Vec<V> = children.iter().map(|child| child.call(referent)).collect();
                (self.func)(referent, &values)
            }
        }
    }

    /// Total node count of the subtree; terminals have length 1.
    pub fn len(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(|child| child.len())
            .sum::<usize>()
    }

    /// A derivation tree is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Root-to-leaf edge count; terminals have depth 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .flatten()
            .map(|child| child.depth())
            .max()
            .map_or(0, |deepest| deepest + 1)
    }

    /// The yield of this derivation: the left-to-right concatenation of the
    /// printed forms of its terminal descendants, i.e. the string the
    /// underlying CFG generates for this tree.
    pub fn yield_string(&self) -> String {
        match &self.children {
            None => self.rule_name.clone(),
            Some(children) => children.iter().map(|child| child.yield_string()).collect(),
        }
    }

    /// Flat record of this expression for downstream tooling.
    pub fn to_record(&self) -> ExpressionRecord {
        ExpressionRecord {
            form: self.to_string(),
            length: self.len(),
        }
    }

    fn children_or_empty(&self) -> &[Rc<Expression<R, V>>] {
        self.children.as_deref().unwrap_or(&[])
    }
}

impl<R: Clone + PartialEq, V: Truthy> Expression<R, V> {
    /// Computes the meaning of this expression: the ordered subset of the
    /// universe's referents for which the tree, called as a predicate, is
    /// truthy. Uncached; see [`Evaluator`](crate::semantics::Evaluator) for
    /// the memoizing evaluation context.
    pub fn evaluate(&self, universe: &Universe<R>) -> Meaning<R> {
        Meaning::from_predicate(universe, |referent| self.call(referent).is_truthy())
    }
}

impl<R, V> Expression<R, V> {
    /// Calls this expression on every referent of a universe, returning the
    /// raw values in universe order.
    pub fn call_on_universe(&self, universe: &Universe<R>) -> Vec<V> {
        universe
            .referents()
            .iter()
            .map(|referent| self.call(referent))
            .collect()
    }
}

impl<R, V> Clone for Expression<R, V> {
    fn clone(&self) -> Self {
        Self {
            rule_name: self.rule_name.clone(),
            func: Rc::clone(&self.func),
            children: self.children.clone(),
        }
    }
}

impl<R, V> PartialEq for Expression<R, V> {
    /// Structural equality over `(rule_name, children)`, with a missing
    /// child list comparing as empty so that equality, hashing, and ordering
    /// all agree on the same view of a node.
    fn eq(&self, other: &Self) -> bool {
        self.rule_name == other.rule_name
            && self.children_or_empty() == other.children_or_empty()
    }
}

impl<R, V> Eq for Expression<R, V> {}

impl<R, V> Hash for Expression<R, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rule_name.hash(state);
        let children = self.children_or_empty();
        state.write_usize(children.len());
        for child in children {
            child.hash(state);
        }
    }
}

impl<R, V> Ord for Expression<R, V> {
    /// Total order over `(rule_name, children)`, with a missing child list
    /// comparing as empty. Rule semantics are determined by the rule name,
    /// so the name stands in for function identity.
    fn cmp(&self, other: &Self) -> Ordering {
        self.rule_name
            .cmp(&other.rule_name)
            .then_with(|| self.children_or_empty().cmp(other.children_or_empty()))
    }
}

impl<R, V> PartialOrd for Expression<R, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R, V> fmt::Display for Expression<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule_name)?;
        if let Some(children) = &self.children {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl<R, V> fmt::Debug for Expression<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({self})")
    }
}

/// Serialized view of an expression: its printed form and node count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub form: String,
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::fixtures::boolean_grammar;

    fn conjunction(left: &str, right: &str) -> Rc<Expression<u32, bool>> {
        let grammar = boolean_grammar();
        grammar
            .parse(&format!("and({left}, {right})"))
            .expect("fixture expression should parse")
    }

    #[test]
    fn leaf_length_and_depth() {
        let grammar = boolean_grammar();
        let leaf = grammar.parse("True").unwrap();
        assert_eq!(leaf.len(), 1);
        assert_eq!(leaf.depth(), 0);
        assert!(leaf.is_leaf());
    }

    #[test]
    fn length_is_one_plus_children() {
        let expr = conjunction("True", "False");
        assert_eq!(expr.len(), 3);
        let children = expr.children().unwrap();
        let child_sum: usize = children.iter().map(|child| child.len()).sum();
        assert_eq!(expr.len(), 1 + child_sum);
    }

    #[test]
    fn call_folds_children() {
        assert!(conjunction("True", "True").call(&0));
        assert!(!conjunction("True", "False").call(&0));
    }

    #[test]
    fn display_is_canonical() {
        let expr = conjunction("True", "False");
        assert_eq!(expr.to_string(), "and(True, False)");
    }

    #[test]
    fn yield_string_concatenates_leaves() {
        let grammar = boolean_grammar();
        let expr = grammar.parse("and(and(True, False), True)").unwrap();
        assert_eq!(expr.yield_string(), "TrueFalseTrue");
    }

    #[test]
    fn structural_equality_and_hashing() {
        let a = conjunction("True", "False");
        let b = conjunction("True", "False");
        let c = conjunction("False", "True");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(Rc::clone(&a));
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn ordering_is_total_and_deterministic() {
        let grammar = boolean_grammar();
        let mut exprs = vec![
            conjunction("True", "True"),
            grammar.parse("True").unwrap(),
            conjunction("False", "True"),
            grammar.parse("False").unwrap(),
        ];
        exprs.sort();
        let printed: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            printed,
            vec![
                "False",
                "True",
                "and(False, True)",
                "and(True, True)",
            ]
        );
    }

    #[test]
    fn comparisons_treat_a_missing_child_list_as_empty() {
        let grammar = boolean_grammar();
        let rule = grammar.rule_by_name("True").unwrap();
        let leaf = Expression::leaf(rule);
        let hollow = Expression::node(rule, Vec::new());

        assert_eq!(leaf, hollow);
        assert_eq!(leaf.cmp(&hollow), Ordering::Equal);
        let mut set = HashSet::new();
        set.insert(leaf);
        set.insert(hollow);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn record_serializes_form_and_length() {
        let record = conjunction("True", "False").to_record();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "form": "and(True, False)", "length": 3 })
        );
    }
}
