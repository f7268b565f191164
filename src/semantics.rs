//! Universes of referents and the meanings expressions pick out of them.
//!
//! A [`Universe`] is the ordered set of objects of reference under
//! consideration; a [`Meaning`] is the subset of a universe's referents for
//! which an expression, called as a predicate, holds. The engine only needs
//! iteration over referents and one predicate call per referent.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, bail};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::grammar::expression::Expression;

/// Values that can act as the outcome of a predicate call.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

/// The full ordered collection of referents for a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Universe<R> {
    referents: Vec<R>,
}

impl<R> Universe<R> {
    pub fn new(referents: Vec<R>) -> Self {
        Self { referents }
    }

    pub fn referents(&self) -> &[R] {
        &self.referents
    }

    pub fn len(&self) -> usize {
        self.referents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.referents.is_empty()
    }
}

impl<R: PartialEq> Universe<R> {
    pub fn contains(&self, referent: &R) -> bool {
        self.referents.contains(referent)
    }
}

/// An ordered subset of a universe's referents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Meaning<R> {
    referents: Vec<R>,
}

impl<R> Meaning<R> {
    pub fn referents(&self) -> &[R] {
        &self.referents
    }

    pub fn len(&self) -> usize {
        self.referents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.referents.is_empty()
    }

    /// A random referent of this meaning, or `None` if it is empty.
    pub fn draw(&self, rng: &mut impl Rng) -> Option<&R> {
        self.referents.choose(rng)
    }
}

impl<R: Clone + PartialEq> Meaning<R> {
    /// Checked constructor: every referent must belong to `universe`.
    pub fn new(referents: Vec<R>, universe: &Universe<R>) -> Result<Self> {
        if referents.iter().any(|referent| !universe.contains(referent)) {
            bail!("the referents of a meaning must be a subset of the universe of discourse");
        }
        Ok(Self { referents })
    }

    /// The meaning selecting exactly the referents of `universe` satisfying
    /// `predicate`, in universe order.
    pub fn from_predicate(universe: &Universe<R>, mut predicate: impl FnMut(&R) -> bool) -> Self {
        Self {
            referents: universe
                .referents()
                .iter()
                .filter(|referent| predicate(referent))
                .cloned()
                .collect(),
        }
    }

    /// The complement of this meaning within `universe`: all referents for
    /// which the expression did not hold.
    pub fn complement(&self, universe: &Universe<R>) -> Self {
        Self {
            referents: universe
                .referents()
                .iter()
                .filter(|referent| !self.referents.contains(referent))
                .cloned()
                .collect(),
        }
    }
}

/// Memoizing evaluation context: computes meanings and antimeanings against
/// one universe, caching each at most once per node instance. Keys are node
/// identities; the cache retains the expressions so their addresses stay
/// stable for the lifetime of the evaluator.
pub struct Evaluator<'u, R, V> {
    universe: &'u Universe<R>,
    meanings: HashMap<*const Expression<R, V>, CacheEntry<R, V>>,
    antimeanings: HashMap<*const Expression<R, V>, CacheEntry<R, V>>,
}

struct CacheEntry<R, V> {
    #[allow(dead_code)]
    expression: Rc<Expression<R, V>>,
    meaning: Rc<Meaning<R>>,
}

impl<'u, R, V> Evaluator<'u, R, V> {
    pub fn new(universe: &'u Universe<R>) -> Self {
        Self {
            universe,
            meanings: HashMap::new(),
            antimeanings: HashMap::new(),
        }
    }

    pub fn universe(&self) -> &Universe<R> {
        self.universe
    }
}

impl<R: Clone + PartialEq, V: Truthy> Evaluator<'_, R, V> {
    /// The meaning of `expression`, computed on first call and replayed
    /// from the cache afterwards.
    pub fn meaning(&mut self, expression: &Rc<Expression<R, V>>) -> Rc<Meaning<R>> {
        let key = Rc::as_ptr(expression);
        if let Some(entry) = self.meanings.get(&key) {
            return Rc::clone(&entry.meaning);
        }
        let meaning = Rc::new(expression.evaluate(self.universe));
        self.meanings.insert(
            key,
            CacheEntry {
                expression: Rc::clone(expression),
                meaning: Rc::clone(&meaning),
            },
        );
        meaning
    }

    /// The antimeaning of `expression`: the complement of its meaning
    /// within the universe. Lazily computed and cached once.
    pub fn antimeaning(&mut self, expression: &Rc<Expression<R, V>>) -> Rc<Meaning<R>> {
        let key = Rc::as_ptr(expression);
        if let Some(entry) = self.antimeanings.get(&key) {
            return Rc::clone(&entry.meaning);
        }
        let antimeaning = Rc::new(self.meaning(expression).complement(self.universe));
        self.antimeanings.insert(
            key,
            CacheEntry {
                expression: Rc::clone(expression),
                meaning: Rc::clone(&antimeaning),
            },
        );
        antimeaning
    }
}
