//! Weighted random generation of derivation trees.

use std::rc::Rc;

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;

use super::Grammar;
use super::expression::Expression;

impl<R, V> Grammar<R, V> {
    /// Samples one derivation tree from the start symbol.
    ///
    /// The generator is caller-owned so that runs can be seeded and
    /// isolated. Termination requires a terminal rule to be reachable from
    /// every symbol the walk can visit; that is a precondition on the
    /// grammar, not something this method checks.
    pub fn generate(&self, rng: &mut impl Rng) -> Result<Rc<Expression<R, V>>> {
        self.generate_from(self.start(), rng)
    }

    /// Samples one derivation tree rooted at `symbol`, drawing one rule per
    /// symbol with probability proportional to its weight (weights need not
    /// sum to 1), then recursing over the chosen rule's rhs in order.
    pub fn generate_from(&self, symbol: &str, rng: &mut impl Rng) -> Result<Rc<Expression<R, V>>> {
        let rule = self
            .rules_for(symbol)
            .choose_weighted(rng, |rule| rule.weight())
            .with_context(|| format!("cannot sample a rule for symbol `{symbol}`"))?;

        let expression = match rule.rhs() {
            None => Expression::leaf(rule),
            Some(rhs) => {
                let children = rhs
                    .iter()
                    .map(|child_symbol| self.generate_from(child_symbol, rng))
                    .collect::<Result<Vec<_>>>()?;
                Expression::node(rule, children)
            }
        };
        Ok(Rc::new(expression))
    }
}
