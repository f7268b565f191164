use std::fmt;
use std::rc::Rc;

/// Semantic action attached to a rule.
///
/// A terminal rule reads the referent it is called on and ignores the value
/// slice; a non-terminal rule folds the already-evaluated values of its
/// children (left to right) and usually ignores the referent, which is
/// threaded through unchanged.
pub type RuleFn<R, V> = Rc<dyn Fn(&R, &[V]) -> V>;

/// A weighted production of a grammar: a named function from zero or more
/// typed argument slots (`rhs`) to a result type (`lhs`).
pub struct Rule<R, V> {
    name: String,
    lhs: String,
    rhs: Option<Vec<String>>,
    func: RuleFn<R, V>,
    weight: f64,
}

impl<R, V> Rule<R, V> {
    /// Creates a rule with the default weight of 1.0.
    ///
    /// An empty `rhs` is normalized to `None`: both mark a terminal rule.
    pub fn new(
        name: impl Into<String>,
        lhs: impl Into<String>,
        rhs: Option<Vec<String>>,
        func: RuleFn<R, V>,
    ) -> Self {
        Self {
            name: name.into(),
            lhs: lhs.into(),
            rhs: rhs.filter(|symbols| !symbols.is_empty()),
            func,
            weight: 1.0,
        }
    }

    /// Creates a terminal rule (no child slots).
    pub fn terminal(
        name: impl Into<String>,
        lhs: impl Into<String>,
        func: impl Fn(&R, &[V]) -> V + 'static,
    ) -> Self {
        Self::new(name, lhs, None, Rc::new(func))
    }

    /// Creates a non-terminal rule consuming one child per `rhs` symbol.
    pub fn branching(
        name: impl Into<String>,
        lhs: impl Into<String>,
        rhs: Vec<String>,
        func: impl Fn(&R, &[V]) -> V + 'static,
    ) -> Self {
        Self::new(name, lhs, Some(rhs), Rc::new(func))
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    pub fn rhs(&self) -> Option<&[String]> {
        self.rhs.as_deref()
    }

    pub fn func(&self) -> &RuleFn<R, V> {
        &self.func
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_terminal(&self) -> bool {
        self.rhs.is_none()
    }

    /// Number of child slots; terminals have arity 0.
    pub fn arity(&self) -> usize {
        self.rhs.as_ref().map_or(0, Vec::len)
    }
}

impl<R, V> fmt::Display for Rule<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.name)?;
        if let Some(rhs) = &self.rhs {
            write!(f, "({})", rhs.join(", "))?;
        }
        Ok(())
    }
}

impl<R, V> fmt::Debug for Rule<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}
