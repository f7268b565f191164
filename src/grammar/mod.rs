//! Weighted context-free grammars whose rules carry executable semantics.
//!
//! The [`Grammar`] type owns the rule set; its generation, enumeration, and
//! parsing operations live in the sibling modules of this tree.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use anyhow::{Result, bail};
use itertools::Itertools;

pub mod definition;
pub mod enumeration;
pub mod expression;
pub mod generation;
pub mod parsing;
pub mod rule;
pub mod uniqueness;

pub use definition::{Registry, RuleDefinition};
pub use enumeration::EnumerationCache;
pub use expression::{Expression, ExpressionRecord};
pub use rule::{Rule, RuleFn};
pub use uniqueness::{Uniqueness, UniquenessFilter};

/// An indexed collection of [`Rule`]s keyed by left-hand-side symbol.
///
/// `R` is the referent type expressions are called on; `V` is the value type
/// rule functions produce. Rules are added one at a time before use; the
/// grammar is read-only during generation, enumeration, and parsing.
pub struct Grammar<R, V> {
    start: String,
    /// Symbol -> rules producing it, in insertion order.
    rules: HashMap<String, Vec<Rc<Rule<R, V>>>>,
    /// Rule name -> rule, for O(1) lookup during parsing.
    rules_by_name: HashMap<String, Rc<Rule<R, V>>>,
}

impl<R, V> Grammar<R, V> {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            rules: HashMap::new(),
            rules_by_name: HashMap::new(),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    /// Registers a rule. Rule names must be unique within one grammar
    /// regardless of their `lhs`; a duplicate name is an error (the rule has
    /// already been appended to its lhs list at that point, matching the
    /// partial-mutation behavior documented for registration conflicts).
    pub fn add_rule(&mut self, rule: Rule<R, V>) -> Result<()> {
        let rule = Rc::new(rule);
        self.rules
            .entry(rule.lhs().to_owned())
            .or_default()
            .push(Rc::clone(&rule));
        if self.rules_by_name.contains_key(rule.name()) {
            bail!(
                "rules of a grammar must have unique names; \
                 this grammar already has a rule named `{}`",
                rule.name()
            );
        }
        self.rules_by_name.insert(rule.name().to_owned(), rule);
        Ok(())
    }

    /// The rules producing `symbol`, in registration order. A symbol with no
    /// rules cannot be expanded: generation fails and enumeration yields
    /// nothing for it.
    pub fn rules_for(&self, symbol: &str) -> &[Rc<Rule<R, V>>] {
        self.rules.get(symbol).map_or(&[], Vec::as_slice)
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rc<Rule<R, V>>> {
        self.rules_by_name.get(name)
    }

    /// All rules, grouped by lhs (lhs symbols in sorted order, rules in
    /// registration order within each lhs).
    pub fn all_rules(&self) -> impl Iterator<Item = &Rc<Rule<R, V>>> {
        self.rules
            .keys()
            .sorted()
            .flat_map(|lhs| self.rules[lhs].iter())
    }

    pub fn rule_count(&self) -> usize {
        self.rules_by_name.len()
    }
}

impl<R, V> fmt::Display for Grammar<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rules:")?;
        for rule in self.all_rules() {
            write!(f, "\n\t{rule}")?;
        }
        Ok(())
    }
}

impl<R, V> fmt::Debug for Grammar<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("start", &self.start)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
