//! Key-based deduplication of expressions during enumeration.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::rc::Rc;

use super::expression::Expression;

/// Object-safe view of a uniqueness policy, as consumed by the enumerator.
///
/// Erases the key type so that enumeration does not have to be generic over
/// it.
pub trait UniquenessFilter<R, V> {
    /// Offers a candidate enumerated under `symbol`. Returns `true` when the
    /// candidate was stored as the (new) best expression for its key: either
    /// the key had not been seen for this symbol, or the comparator prefers
    /// the candidate over the incumbent. Replacement is monotonic; on a tie
    /// the first-seen expression is retained.
    fn admit(&mut self, symbol: &str, expression: &Rc<Expression<R, V>>) -> bool;

    /// Number of distinct keys stored so far, across all symbols.
    fn total_keys(&self) -> usize;
}

/// A uniqueness policy: a key function mapping expressions to equivalence
/// keys (typically their evaluated meaning) and a comparator
/// `better(new, incumbent)` deciding replacement. Accumulates, per symbol,
/// the best expression seen for each key over one enumeration run.
pub struct Uniqueness<'a, R, V, K> {
    key: Box<dyn FnMut(&Rc<Expression<R, V>>) -> K + 'a>,
    better: Box<dyn Fn(&Expression<R, V>, &Expression<R, V>) -> bool + 'a>,
    best: HashMap<String, HashMap<K, Rc<Expression<R, V>>>>,
    total: usize,
}

impl<'a, R, V, K: Eq + Hash> Uniqueness<'a, R, V, K> {
    pub fn new(
        key: impl FnMut(&Rc<Expression<R, V>>) -> K + 'a,
        better: impl Fn(&Expression<R, V>, &Expression<R, V>) -> bool + 'a,
    ) -> Self {
        Self {
            key: Box::new(key),
            better: Box::new(better),
            best: HashMap::new(),
            total: 0,
        }
    }

    /// The key -> best-expression mapping collected for `symbol`, if any
    /// expression of that symbol was admitted.
    pub fn best_for(&self, symbol: &str) -> Option<&HashMap<K, Rc<Expression<R, V>>>> {
        self.best.get(symbol)
    }

    /// Consumes the policy, returning the mapping collected for `symbol`.
    pub fn into_best_for(mut self, symbol: &str) -> HashMap<K, Rc<Expression<R, V>>> {
        self.best.remove(symbol).unwrap_or_default()
    }
}

impl<R, V, K: Eq + Hash> UniquenessFilter<R, V> for Uniqueness<'_, R, V, K> {
    fn admit(&mut self, symbol: &str, expression: &Rc<Expression<R, V>>) -> bool {
        let key = (self.key)(expression);
        match self.best.entry(symbol.to_owned()).or_default().entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Rc::clone(expression));
                self.total += 1;
                true
            }
            Entry::Occupied(mut slot) => {
                if (self.better)(expression, slot.get()) {
                    slot.insert(Rc::clone(expression));
                    true
                } else {
                    false
                }
            }
        }
    }

    fn total_keys(&self) -> usize {
        self.total
    }
}
