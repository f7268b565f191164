//! Building grammars from externally loaded rule definitions.
//!
//! Rule definitions are plain data: serde-deserializable records whose
//! `func` field names an entry in a [`Registry`] of statically compiled
//! functions. Definitions never carry executable source.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use super::Grammar;
use super::rule::{Rule, RuleFn};

fn default_weight() -> f64 {
    1.0
}

/// A rule as supplied by an external loader. `rhs` is absent for terminal
/// rules; `weight` defaults to 1.0; `func` is a [`Registry`] key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub lhs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs: Option<Vec<String>>,
    pub func: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// A registry mapping function keys to rule semantics, so that rule
/// definitions can reference compiled functions by name.
pub struct Registry<R, V> {
    functions: HashMap<String, RuleFn<R, V>>,
}

impl<R, V> Registry<R, V> {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers a function under `key`, replacing any previous entry.
    pub fn with(mut self, key: impl Into<String>, func: impl Fn(&R, &[V]) -> V + 'static) -> Self {
        self.functions.insert(key.into(), Rc::new(func));
        self
    }

    pub fn get(&self, key: &str) -> Option<RuleFn<R, V>> {
        self.functions.get(key).map(Rc::clone)
    }
}

impl<R, V> Default for Registry<R, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, V> Grammar<R, V> {
    /// Builds a grammar from a list of rule definitions, resolving each
    /// definition's `func` key through `registry`. Fails on an unknown
    /// function key or a duplicate rule name.
    pub fn from_definitions(
        start: impl Into<String>,
        definitions: &[RuleDefinition],
        registry: &Registry<R, V>,
    ) -> Result<Self> {
        let mut grammar = Grammar::new(start);
        for definition in definitions {
            let func = registry.get(&definition.func).ok_or_else(|| {
                anyhow!(
                    "no registered function `{}` for rule `{}`",
                    definition.func,
                    definition.name
                )
            })?;
            let rule = Rule::new(
                definition.name.clone(),
                definition.lhs.clone(),
                definition.rhs.clone(),
                func,
            )
            .with_weight(definition.weight);
            grammar.add_rule(rule)?;
        }
        Ok(grammar)
    }
}
