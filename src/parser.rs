use log::{debug, trace};
use once_cell::sync::OnceCell;

use crate::{
    context::{Context, Key, Outcome},
    errors::{Error, RecursionLimit, UnknownIdentifier},
    lexer::skip_whitespace,
    log::log_result,
    patterns::{Trace, Walk},
    syntax::ParseNode,
    Definition, Expression, Grammar, Pattern,
};

/// Interprets a compiled grammar over one input
pub(crate) struct Session<'g, 's> {
    grammar: &'g Grammar,
    source: &'s str,
    context: Context,
}

impl<'g, 's> Session<'g, 's> {
    pub(crate) fn new(grammar: &'g Grammar, source: &'s str) -> Self {
        Self {
            grammar,
            source,
            context: Context::new(),
        }
    }

    /// Match start production against the whole input
    pub(crate) fn parse(mut self) -> Result<ParseNode, Error> {
        let grammar = self.grammar;
        let options = *grammar.options();
        let mut trace = Trace::default();
        let end = self.value(grammar.start(), 0, &mut trace)?;

        if let Some(mut end) = end {
            if options.complete && options.skip_whitespace {
                end = skip_whitespace(self.source, end);
            }
            if !options.complete || end == self.source.len() {
                if let Some(tree) = trace.nodes.pop() {
                    return Ok(tree);
                }
            }
            self.context.expect("end of input", end);
        }
        Err(self.context.error().into())
    }

    fn token(
        &mut self,
        name: &str,
        pattern: &Pattern,
        at: usize,
        trace: &mut Trace,
    ) -> Option<usize> {
        let start = if self.grammar.options().skip_whitespace {
            skip_whitespace(self.source, at)
        } else {
            at
        };

        let target = format!("{name}@{start}");
        match pattern.match_at(self.source, start) {
            Some(m) if !m.is_empty() => {
                trace!(target: target.as_str(), "matched '{}'", m.as_str());
                trace.nodes.push(ParseNode::leaf(name, m.as_str(), start));
                Some(m.end())
            }
            _ => {
                trace!(target: target.as_str(), "no match");
                self.context.expect(name, start);
                None
            }
        }
    }

    fn production(
        &mut self,
        name: &str,
        expression: &Expression,
        at: usize,
        trace: &mut Trace,
    ) -> Result<Option<usize>, Error> {
        let options = *self.grammar.options();
        let target = format!("{name}@{at}");
        let key = Key::new(name, at);

        if options.memoize {
            if let Some(outcome) = self.context.fetch(&key) {
                trace!(target: target.as_str(), "cache hit");
                return Ok(outcome.clone().map(|(end, node)| {
                    trace.nodes.push(node);
                    end
                }));
            }
        }

        if self.context.depth() >= options.recursion_limit {
            debug!(target: target.as_str(), "recursion limit reached");
            return Err(RecursionLimit {
                production: name.to_string(),
                at,
            }
            .into());
        }
        if !self.context.enter(&key) {
            trace!(target: target.as_str(), "already being matched here");
            return Ok(None);
        }

        let guard_hits = self.context.guard_hits;
        let mut inner = Trace::default();
        let end = self.sequence(&expression.root, at, &mut inner);
        self.context.exit(&key);

        let outcome: Outcome = end?.map(|end| (end, ParseNode::production(name, inner.nodes)));
        log_result(target.as_str(), at, self.source, &outcome);

        if options.memoize && self.context.guard_hits == guard_hits {
            self.context.cache(key, outcome.clone());
        }
        Ok(outcome.map(|(end, node)| {
            trace.nodes.push(node);
            end
        }))
    }
}

impl Walk for Session<'_, '_> {
    type Error = Error;

    fn source(&self) -> &str {
        self.source
    }

    fn value(&mut self, name: &str, at: usize, trace: &mut Trace) -> Result<Option<usize>, Error> {
        let grammar = self.grammar;
        if let Some(pattern) = grammar.token(name) {
            return Ok(self.token(name, pattern, at, trace));
        }
        if let Some(expression) = grammar.production(name) {
            return self.production(name, expression, at, trace);
        }
        Err(UnknownIdentifier {
            name: name.to_string(),
            rule: grammar.start().to_string(),
        }
        .into())
    }
}

/// Grammar definition compiled on first use
#[derive(Debug)]
pub struct Engine {
    definition: Definition,
    grammar: OnceCell<Grammar>,
}

impl Engine {
    /// Create engine for definition without compiling it
    pub fn new(definition: Definition) -> Self {
        Self {
            definition,
            grammar: OnceCell::new(),
        }
    }

    /// Definition this engine was created from
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Compile definition, at most once.
    ///
    /// Failed compilation isn't remembered and is repeated on the next call
    pub fn compile(&self) -> Result<&Grammar, Error> {
        self.grammar
            .get_or_try_init(|| Grammar::compile(&self.definition))
    }

    /// Compile definition if needed and parse `input`
    /// ```
    /// # use pretty_assertions::assert_eq;
    /// use gramma::{grammar, Engine};
    ///
    /// let engine = Engine::new(grammar! {
    ///     start: LIST,
    ///     tokens { ITEM: "[a-z]+", COMMA: "," },
    ///     productions { LIST: "ITEM (COMMA ITEM)*" }
    /// });
    /// let tree = engine.parse_tree("a, b,c").unwrap();
    /// assert_eq!(tree.children_of("ITEM").count(), 3);
    /// assert!(engine.parse_tree("a,").is_err());
    /// ```
    pub fn parse_tree(&self, input: &str) -> Result<ParseNode, Error> {
        self.compile()?.parse_tree(input)
    }
}

impl From<Definition> for Engine {
    fn from(definition: Definition) -> Self {
        Engine::new(definition)
    }
}
