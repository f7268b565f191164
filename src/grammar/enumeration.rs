//! Exhaustive depth-bounded enumeration of derivation trees.
//!
//! Enumeration is memoized per `(depth, symbol)` pair through an explicit
//! cache that lives for one run, and optionally deduplicated through a
//! [`UniquenessFilter`]. Depth is the root-to-leaf edge count, so terminals
//! sit at depth 0 and a tree has depth `d` exactly when at least one child
//! has depth `d - 1` and none has more.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::rc::Rc;

use itertools::Itertools;
use log::{debug, trace};

use super::Grammar;
use super::expression::Expression;
use super::uniqueness::{Uniqueness, UniquenessFilter};

/// Memo table for one enumeration run, keyed by `(depth, symbol)`.
///
/// The cache grows unboundedly within a run and is never evicted; reusing
/// one cache across logically distinct uniqueness runs silently replays
/// stale results, so callers must supply a fresh cache per run.
pub struct EnumerationCache<R, V> {
    entries: HashMap<(usize, String), Vec<Rc<Expression<R, V>>>>,
}

impl<R, V> EnumerationCache<R, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of `(depth, symbol)` pairs computed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R, V> Default for EnumerationCache<R, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// State threaded through one recursive enumeration run. The cache and the
/// uniqueness filter come from different owners, so they carry separate
/// lifetimes.
struct EnumerationRun<'c, 'u, R, V> {
    cache: &'c mut EnumerationCache<R, V>,
    uniqueness: Option<&'u mut (dyn UniquenessFilter<R, V> + 'u)>,
    /// Abort once this many distinct keys have been collected (across all
    /// symbols). Only meaningful together with a uniqueness filter.
    limit: Option<usize>,
}

impl<R, V> Grammar<R, V> {
    /// Enumerates every derivation tree from the start symbol of depth less
    /// than `max_depth`, in depth order, sharing one cache across depths.
    pub fn enumerate(
        &self,
        max_depth: usize,
        uniqueness: Option<&mut dyn UniquenessFilter<R, V>>,
    ) -> Vec<Rc<Expression<R, V>>> {
        self.enumerate_from(max_depth, self.start(), uniqueness)
    }

    /// Enumerates every derivation tree rooted at `symbol` of depth less
    /// than `max_depth`: the concatenation of the exact-depth enumerations
    /// for depths `0..max_depth`.
    pub fn enumerate_from(
        &self,
        max_depth: usize,
        symbol: &str,
        uniqueness: Option<&mut dyn UniquenessFilter<R, V>>,
    ) -> Vec<Rc<Expression<R, V>>> {
        let mut cache = EnumerationCache::new();
        {
            let mut run = EnumerationRun {
                cache: &mut cache,
                uniqueness,
                limit: None,
            };
            for depth in 0..max_depth {
                debug!("enumerating `{symbol}` at depth {depth}");
                let _ = self.fill_at_depth(depth, symbol, &mut run);
            }
        }
        (0..max_depth)
            .filter_map(|depth| cache.entries.get(&(depth, symbol.to_owned())))
            .flatten()
            .cloned()
            .collect()
    }

    /// Enumerates every syntactically distinct derivation tree rooted at
    /// `symbol` whose depth is exactly `depth`, routing repeated
    /// `(depth, symbol)` sub-problems through `cache`. A cache hit replays
    /// the previously computed sequence instead of recomputing (and does not
    /// re-consult the uniqueness filter).
    pub fn enumerate_at_depth(
        &self,
        depth: usize,
        symbol: &str,
        uniqueness: Option<&mut dyn UniquenessFilter<R, V>>,
        cache: &mut EnumerationCache<R, V>,
    ) -> Vec<Rc<Expression<R, V>>> {
        {
            let mut run = EnumerationRun {
                cache: &mut *cache,
                uniqueness,
                limit: None,
            };
            let _ = self.fill_at_depth(depth, symbol, &mut run);
        }
        cache
            .entries
            .get(&(depth, symbol.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    /// Drives an enumeration with a uniqueness policy built from `key` and
    /// `better`, discarding the yielded stream and returning the final
    /// key -> best-expression mapping for the start symbol.
    pub fn get_unique_expressions<K: Eq + Hash>(
        &self,
        depth: usize,
        key: impl FnMut(&Rc<Expression<R, V>>) -> K,
        better: impl Fn(&Expression<R, V>, &Expression<R, V>) -> bool,
        max_size: Option<usize>,
    ) -> HashMap<K, Rc<Expression<R, V>>> {
        self.get_unique_expressions_from(depth, self.start(), key, better, max_size)
    }

    /// As [`get_unique_expressions`](Self::get_unique_expressions), rooted
    /// at `symbol`. When `max_size` is given, the run stops as soon as the
    /// total number of distinct keys collected across all symbols reaches
    /// it, so a start symbol that recursively touches other symbols can
    /// stop before `symbol` itself holds `max_size` keys.
    pub fn get_unique_expressions_from<K: Eq + Hash>(
        &self,
        depth: usize,
        symbol: &str,
        key: impl FnMut(&Rc<Expression<R, V>>) -> K,
        better: impl Fn(&Expression<R, V>, &Expression<R, V>) -> bool,
        max_size: Option<usize>,
    ) -> HashMap<K, Rc<Expression<R, V>>> {
        let mut uniqueness = Uniqueness::new(key, better);
        let mut cache = EnumerationCache::new();
        {
            let mut run = EnumerationRun {
                cache: &mut cache,
                uniqueness: Some(&mut uniqueness),
                limit: max_size,
            };
            for current in 0..depth {
                if self.fill_at_depth(current, symbol, &mut run).is_break() {
                    break;
                }
            }
        }
        uniqueness.into_best_for(symbol)
    }

    /// Computes the cache entry for `(depth, symbol)` if it is not already
    /// present. Breaks out of the whole run once the key limit is hit.
    fn fill_at_depth(
        &self,
        depth: usize,
        symbol: &str,
        run: &mut EnumerationRun<'_, '_, R, V>,
    ) -> ControlFlow<()> {
        let entry_key = (depth, symbol.to_owned());
        if run.cache.entries.contains_key(&entry_key) {
            trace!("cache hit for `{symbol}` at depth {depth}");
            return ControlFlow::Continue(());
        }
        run.cache.entries.insert(entry_key.clone(), Vec::new());

        if depth == 0 {
            for rule in self.rules_for(symbol) {
                if !rule.is_terminal() {
                    continue;
                }
                self.accept(&entry_key, Rc::new(Expression::leaf(rule)), run)?;
            }
            return ControlFlow::Continue(());
        }

        for rule in self.rules_for(symbol) {
            let Some(rhs) = rule.rhs() else {
                // terminal rules cannot appear above depth 0
                continue;
            };

            // Every tuple of child depths from {0, .., depth-1}^arity with
            // at least one entry equal to depth-1: the defining condition
            // for the parent to sit at exactly `depth`.
            for child_depths in rhs.iter().map(|_| 0..depth).multi_cartesian_product() {
                if child_depths.iter().copied().max() != Some(depth - 1) {
                    continue;
                }

                // materialize all children first so the cross product below
                // can read completed cache entries
                for (&child_depth, child_symbol) in child_depths.iter().zip(rhs) {
                    self.fill_at_depth(child_depth, child_symbol, run)?;
                }
                let pools: Vec<Vec<Rc<Expression<R, V>>>> = child_depths
                    .iter()
                    .zip(rhs)
                    .map(|(&child_depth, child_symbol)| {
                        run.cache.entries[&(child_depth, child_symbol.clone())].clone()
                    })
                    .collect();

                for children in pools.into_iter().multi_cartesian_product() {
                    self.accept(&entry_key, Rc::new(Expression::node(rule, children)), run)?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Runs a candidate through the uniqueness filter (when present), caches
    /// it on acceptance, and enforces the distinct-key limit.
    fn accept(
        &self,
        entry_key: &(usize, String),
        expression: Rc<Expression<R, V>>,
        run: &mut EnumerationRun<'_, '_, R, V>,
    ) -> ControlFlow<()> {
        if let Some(filter) = run.uniqueness.as_mut() {
            if !filter.admit(&entry_key.1, &expression) {
                return ControlFlow::Continue(());
            }
            run.cache.entries.get_mut(entry_key).unwrap().push(expression);
            if let Some(limit) = run.limit {
                if filter.total_keys() >= limit {
                    debug!("stopping enumeration after {limit} distinct keys");
                    return ControlFlow::Break(());
                }
            }
        } else {
            run.cache.entries.get_mut(entry_key).unwrap().push(expression);
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::fixtures::boolean_grammar;
    use crate::grammar::Rule;

    fn printed(expressions: &[Rc<Expression<u32, bool>>]) -> Vec<String> {
        expressions.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn depth_zero_yields_exactly_the_terminal_rules() {
        let grammar = boolean_grammar();
        let mut cache = EnumerationCache::new();
        let exprs = grammar.enumerate_at_depth(0, "bool", None, &mut cache);

        let forms: HashSet<String> = printed(&exprs).into_iter().collect();
        assert_eq!(forms, HashSet::from(["True".to_owned(), "False".to_owned()]));
        assert!(exprs.iter().all(|e| e.len() == 1));
    }

    #[test]
    fn depth_one_yields_all_four_conjunctions() {
        let grammar = boolean_grammar();
        let mut cache = EnumerationCache::new();
        let exprs = grammar.enumerate_at_depth(1, "bool", None, &mut cache);

        let forms: HashSet<String> = printed(&exprs).into_iter().collect();
        assert_eq!(
            forms,
            HashSet::from([
                "and(True, True)".to_owned(),
                "and(True, False)".to_owned(),
                "and(False, True)".to_owned(),
                "and(False, False)".to_owned(),
            ])
        );
        assert_eq!(exprs.len(), 4);
        assert!(exprs.iter().all(|e| e.len() == 3));
    }

    #[test]
    fn every_tree_has_exactly_the_requested_depth() {
        let grammar = boolean_grammar();
        let mut cache = EnumerationCache::new();
        for depth in 0..3 {
            let exprs = grammar.enumerate_at_depth(depth, "bool", None, &mut cache);
            assert!(!exprs.is_empty());
            assert!(exprs.iter().all(|e| e.depth() == depth), "depth {depth}");
        }
    }

    #[test]
    fn depth_two_counts_match_the_child_depth_tuples() {
        // tuples with max = 1 over {0,1}^2: (0,1), (1,0), (1,1)
        // counts: 2*4 + 4*2 + 4*4 = 32
        let grammar = boolean_grammar();
        let mut cache = EnumerationCache::new();
        let exprs = grammar.enumerate_at_depth(2, "bool", None, &mut cache);
        assert_eq!(exprs.len(), 32);

        let distinct: HashSet<Rc<Expression<u32, bool>>> = exprs.iter().cloned().collect();
        assert_eq!(distinct.len(), 32, "no duplicates expected");
    }

    #[test]
    fn enumerate_concatenates_depths_in_order() {
        let grammar = boolean_grammar();
        let exprs = grammar.enumerate(2, None);
        assert_eq!(exprs.len(), 2 + 4);
        assert!(exprs[..2].iter().all(|e| e.depth() == 0));
        assert!(exprs[2..].iter().all(|e| e.depth() == 1));
    }

    #[test]
    fn unknown_symbols_enumerate_to_nothing() {
        let grammar = boolean_grammar();
        assert!(grammar.enumerate_from(3, "no_such_symbol", None).is_empty());
    }

    #[test]
    fn cache_hits_replay_previous_results() {
        let grammar = boolean_grammar();
        let mut cache = EnumerationCache::new();
        let first = grammar.enumerate_at_depth(1, "bool", None, &mut cache);
        let computed_entries = cache.len();
        let second = grammar.enumerate_at_depth(1, "bool", None, &mut cache);
        assert_eq!(first, second);
        assert_eq!(cache.len(), computed_entries);
    }

    #[test]
    fn unique_expressions_prefer_shorter_trees() {
        let grammar = boolean_grammar();
        let best = grammar.get_unique_expressions(
            2,
            |e| e.call(&0),
            |new, old| new.len() < old.len(),
            None,
        );

        assert_eq!(best.len(), 2);
        assert_eq!(best[&true].to_string(), "True");
        assert_eq!(best[&false].to_string(), "False");
        assert!(best.values().all(|e| e.len() == 1));
    }

    #[test]
    fn unique_expressions_can_prefer_longer_trees() {
        let grammar = boolean_grammar();
        let best = grammar.get_unique_expressions(
            2,
            |e| e.call(&0),
            |new, old| new.len() > old.len(),
            None,
        );

        // depth-1 conjunctions displace the terminals; among equal-length
        // candidates the first seen is retained
        assert_eq!(best.len(), 2);
        assert_eq!(best[&true].to_string(), "and(True, True)");
        assert_eq!(best[&false].to_string(), "and(True, False)");
    }

    #[test]
    fn max_size_stops_the_run_early() {
        let grammar = boolean_grammar();
        let best = grammar.get_unique_expressions(
            3,
            |e| e.call(&0),
            |new, old| new.len() < old.len(),
            Some(1),
        );
        assert_eq!(best.len(), 1);
    }

    #[test]
    fn the_key_limit_counts_across_symbols() {
        let mut grammar: Grammar<u32, bool> = Grammar::new("s");
        grammar
            .add_rule(Rule::terminal("zero", "s", |_, _| false))
            .unwrap();
        grammar
            .add_rule(Rule::branching(
                "wrap",
                "s",
                vec!["t".into()],
                |_, values: &[bool]| values[0],
            ))
            .unwrap();
        grammar
            .add_rule(Rule::terminal("a", "t", |_, _| true))
            .unwrap();
        grammar
            .add_rule(Rule::terminal("b", "t", |_, _| true))
            .unwrap();

        // `zero` at depth 0 is the first key; filling `t` for the depth-1
        // `wrap` trees contributes `a` as the second, hitting the limit
        // before any `wrap(...)` tree is built for `s`
        let best = grammar.get_unique_expressions(
            2,
            |e: &Rc<Expression<u32, bool>>| e.to_string(),
            |new, old| new.len() < old.len(),
            Some(2),
        );
        assert_eq!(best.len(), 1);
        assert!(best.contains_key("zero"));
    }

    #[test]
    fn uniqueness_filters_the_enumerated_stream() {
        let grammar = boolean_grammar();
        let mut uniqueness = Uniqueness::new(
            |e: &Rc<Expression<u32, bool>>| e.call(&0),
            |new: &Expression<u32, bool>, old: &Expression<u32, bool>| new.len() < old.len(),
        );
        let exprs = grammar.enumerate(2, Some(&mut uniqueness));

        // the four conjunctions all collide with the two terminals on their
        // key and lose on length, so only the terminals survive
        assert_eq!(printed(&exprs), vec!["True", "False"]);
    }
}
