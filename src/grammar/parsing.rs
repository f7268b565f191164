//! Parsing expressions back from their canonical printed form.
//!
//! This is not a general-purpose CFG parser: the input must be the
//! `name(child, ..., child)` form that [`Expression`]'s `Display`
//! implementation produces, with each name resolving to a rule of the
//! grammar being parsed against.

use std::rc::Rc;

use anyhow::{Result, bail};

use super::Grammar;
use super::expression::Expression;
use super::rule::Rule;

/// An open node accumulating children during parsing; frozen into an
/// immutable [`Expression`] once its rule's arity is satisfied.
struct NodeBuilder<R, V> {
    rule: Rc<Rule<R, V>>,
    children: Vec<Rc<Expression<R, V>>>,
}

impl<R, V> NodeBuilder<R, V> {
    fn new(rule: Rc<Rule<R, V>>) -> Self {
        Self {
            rule,
            children: Vec::new(),
        }
    }

    fn push(&mut self, child: Rc<Expression<R, V>>) {
        self.children.push(child);
    }

    fn finish(self) -> Result<Expression<R, V>> {
        if self.children.len() != self.rule.arity() {
            bail!(
                "rule `{}` takes {} children, found {}",
                self.rule.name(),
                self.rule.arity(),
                self.children.len()
            );
        }
        if self.rule.is_terminal() {
            Ok(Expression::leaf(&self.rule))
        } else {
            Ok(Expression::node(&self.rule, self.children))
        }
    }
}

/// One element of the parser stack: either a node still collecting children
/// or an already-complete subtree waiting to be attached to its parent.
enum StackItem<R, V> {
    Open(NodeBuilder<R, V>),
    Done(Rc<Expression<R, V>>),
}

#[derive(Debug, PartialEq)]
enum Token<'t> {
    /// `name(`: starts a new node.
    Open(&'t str),
    /// A bare name: a complete leaf.
    Name(&'t str),
    /// Delimiter between siblings.
    Separator,
    /// Closes the current node's child list.
    Close,
}

fn tokenize(text: &str, opener: char, closer: char, delimiter: char) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        let Some(next) = rest.chars().next() else {
            return Ok(tokens);
        };
        if next == closer {
            tokens.push(Token::Close);
            rest = &rest[closer.len_utf8()..];
        } else if next == delimiter {
            tokens.push(Token::Separator);
            rest = &rest[delimiter.len_utf8()..];
        } else {
            let end = rest
                .find([opener, closer, delimiter])
                .unwrap_or(rest.len());
            let name = rest[..end].trim();
            if name.is_empty() {
                bail!("malformed expression: unexpected `{opener}` in `{text}`");
            }
            if rest[end..].starts_with(opener) {
                tokens.push(Token::Open(name));
                rest = &rest[end + opener.len_utf8()..];
            } else {
                tokens.push(Token::Name(name));
                rest = &rest[end..];
            }
        }
    }
}

impl<R, V> Grammar<R, V> {
    /// Parses the canonical `name(child, ..., child)` form of an expression
    /// of this grammar. Round-trip contract: parsing the printed form of a
    /// tree yields a structurally equal tree.
    pub fn parse(&self, text: &str) -> Result<Rc<Expression<R, V>>> {
        self.parse_with(text, '(', ')', ',')
    }

    /// As [`parse`](Self::parse), with custom punctuation.
    ///
    /// Walks the token stream left to right over an explicit stack: an
    /// opener token pushes a new open node, a bare name pushes a complete
    /// leaf, and a delimiter or closer pops the finished top of the stack
    /// and appends it as a child of the enclosing open node. At the end of
    /// input exactly one node must remain.
    pub fn parse_with(
        &self,
        text: &str,
        opener: char,
        closer: char,
        delimiter: char,
    ) -> Result<Rc<Expression<R, V>>> {
        let mut stack: Vec<StackItem<R, V>> = Vec::new();

        for token in tokenize(text, opener, closer, delimiter)? {
            match token {
                Token::Open(name) => {
                    let rule = self.lookup(name)?;
                    stack.push(StackItem::Open(NodeBuilder::new(rule)));
                }
                Token::Name(name) => {
                    let rule = self.lookup(name)?;
                    if !rule.is_terminal() {
                        bail!(
                            "rule `{name}` takes {} children but appears without an argument list",
                            rule.arity()
                        );
                    }
                    stack.push(StackItem::Done(Rc::new(Expression::leaf(&rule))));
                }
                Token::Separator | Token::Close => {
                    let child = match stack.pop() {
                        Some(StackItem::Done(expression)) => expression,
                        Some(StackItem::Open(builder)) => Rc::new(builder.finish()?),
                        None => bail!("malformed expression `{text}`: nothing to close"),
                    };
                    match stack.last_mut() {
                        Some(StackItem::Open(parent)) => parent.push(child),
                        _ => bail!("malformed expression `{text}`: unbalanced `{closer}`"),
                    }
                }
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(StackItem::Done(expression)), true) => Ok(expression),
            (Some(StackItem::Open(builder)), true) => Ok(Rc::new(builder.finish()?)),
            _ => bail!("could not parse expression `{text}`"),
        }
    }

    fn lookup(&self, name: &str) -> Result<Rc<Rule<R, V>>> {
        match self.rule_by_name(name) {
            Some(rule) => Ok(Rc::clone(rule)),
            None => bail!("no rule named `{name}` in this grammar"),
        }
    }
}
