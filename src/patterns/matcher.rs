use std::{collections::BTreeMap, convert::Infallible, ops::Range};

use crate::syntax::ParseNode;

use super::{is_word, Kind, Node, Pattern, Sequence};

/// Span matched by a capturing group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Group number, 0 for the whole match
    pub group: usize,
    /// Byte range in the text
    pub range: Range<usize>,
}

/// Everything recorded while walking, truncated back when an attempt fails
#[derive(Debug, Default)]
pub struct Trace {
    /// Group captures, innermost first
    pub captures: Vec<Capture>,
    /// Parse tree nodes produced by references
    pub nodes: Vec<ParseNode>,
}

/// Position inside a [`Trace`] to roll back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    captures: usize,
    nodes: usize,
}

impl Trace {
    /// Remember current position
    pub fn mark(&self) -> Mark {
        Mark {
            captures: self.captures.len(),
            nodes: self.nodes.len(),
        }
    }

    /// Forget everything recorded after `mark`
    pub fn rollback(&mut self, mark: Mark) {
        self.captures.truncate(mark.captures);
        self.nodes.truncate(mark.nodes);
    }
}

/// Walks pattern trees over source text.
///
/// Repetition is greedy and never gives characters back: the only backtracking
/// is the fallback from a failed sequence to its alternate.
/// Implementors decide what a [`Kind::Value`] reference matches.
pub trait Walk {
    /// Error raised by reference resolution
    type Error;

    /// Text being matched
    fn source(&self) -> &str;

    /// Match reference `name` at `at`, returning end offset on success
    fn value(
        &mut self,
        name: &str,
        at: usize,
        trace: &mut Trace,
    ) -> Result<Option<usize>, Self::Error>;

    /// Match sequence or, failing that, its alternatives in order
    fn sequence(
        &mut self,
        sequence: &Sequence,
        at: usize,
        trace: &mut Trace,
    ) -> Result<Option<usize>, Self::Error> {
        let mark = trace.mark();
        let mut branch = Some(sequence);
        'branches: while let Some(current) = branch {
            let mut offset = at;
            for node in &current.nodes {
                match self.repeat(node, offset, trace)? {
                    Some(end) => offset = end,
                    None => {
                        trace.rollback(mark);
                        branch = current.alternate.as_deref();
                        continue 'branches;
                    }
                }
            }
            return Ok(Some(offset));
        }
        Ok(None)
    }

    /// Match node as many times as its quantifier allows
    fn repeat(
        &mut self,
        node: &Node,
        at: usize,
        trace: &mut Trace,
    ) -> Result<Option<usize>, Self::Error> {
        let bounds = node.bounds();
        let mark = trace.mark();

        let mut quantity = 0;
        let mut offset = at;
        while bounds.allows_more(quantity) {
            let attempt = trace.mark();
            match self.once(node, offset, trace)? {
                // Every further iteration would match empty too,
                // so keep it only to reach the minimum
                Some(end) if end == offset => {
                    if quantity >= bounds.min {
                        trace.rollback(attempt);
                    } else {
                        quantity = bounds.min;
                    }
                    break;
                }
                Some(end) => {
                    quantity += 1;
                    offset = end;
                }
                None => {
                    trace.rollback(attempt);
                    break;
                }
            }
        }

        if quantity < bounds.min {
            trace.rollback(mark);
            return Ok(None);
        }

        if let Kind::Group { group, .. } = node.kind {
            if quantity > 0 {
                trace.captures.push(Capture {
                    group,
                    range: at..offset,
                });
            }
        }
        Ok(Some(offset))
    }

    /// Match single iteration of node
    fn once(
        &mut self,
        node: &Node,
        at: usize,
        trace: &mut Trace,
    ) -> Result<Option<usize>, Self::Error> {
        match &node.kind {
            Kind::Group { body, .. } => self.sequence(body, at, trace),
            Kind::CharacterSet { items, negated } => {
                let mark = trace.mark();
                for item in items {
                    if let Some(end) = self.once(item, at, trace)? {
                        if *negated {
                            trace.rollback(mark);
                            return Ok(None);
                        }
                        return Ok(Some(end));
                    }
                }
                if *negated {
                    return Ok(self.source()[at..].chars().next().map(|c| at + c.len_utf8()));
                }
                Ok(None)
            }
            Kind::Value(name) => self.value(name, at, trace),
            Kind::WordBoundary => {
                let source = self.source();
                let before = source[..at].chars().next_back().is_some_and(is_word);
                let after = source[at..].chars().next().is_some_and(is_word);
                Ok((before != after).then_some(at))
            }
            kind => Ok(self.source()[at..]
                .chars()
                .next()
                .filter(|c| kind.accepts(*c))
                .map(|c| at + c.len_utf8())),
        }
    }
}

/// Walks patterns over plain text. References match nothing
struct TextWalker<'s> {
    source: &'s str,
}

impl Walk for TextWalker<'_> {
    type Error = Infallible;

    fn source(&self) -> &str {
        self.source
    }

    fn value(&mut self, _: &str, _: usize, _: &mut Trace) -> Result<Option<usize>, Infallible> {
        Ok(None)
    }
}

/// Successful match of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'s> {
    source: &'s str,
    range: Range<usize>,
    captures: Vec<Capture>,
}

impl<'s> Match<'s> {
    /// Keeps the last capture of each group, ordered by group number
    fn new(source: &'s str, range: Range<usize>, captures: Vec<Capture>) -> Self {
        let last = captures
            .into_iter()
            .map(|c| (c.group, c.range))
            .chain(std::iter::once((0, range.clone())))
            .collect::<BTreeMap<_, _>>();
        Self {
            source,
            range,
            captures: last
                .into_iter()
                .map(|(group, range)| Capture { group, range })
                .collect(),
        }
    }

    /// Byte range of the match
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Offset right after the match
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Number of matched bytes
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Did the match consume nothing?
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Matched text
    pub fn as_str(&self) -> &'s str {
        &self.source[self.range.clone()]
    }

    /// Text captured by group, 0 being the whole match
    pub fn group(&self, group: usize) -> Option<&'s str> {
        self.captures
            .iter()
            .find(|c| c.group == group)
            .map(|c| &self.source[c.range.clone()])
    }

    /// All captures ordered by group, starting with the whole match
    pub fn captures(&self) -> impl Iterator<Item = (usize, &'s str)> + '_ {
        self.captures
            .iter()
            .map(|c| (c.group, &self.source[c.range.clone()]))
    }
}

impl Pattern {
    /// Match pattern against `text` starting exactly at byte offset `at`.
    ///
    /// The match isn't required to reach the end of text.
    /// ```
    /// use gramma::Pattern;
    ///
    /// let pattern = Pattern::new(r"(\w+)@(\w+)").unwrap();
    /// let m = pattern.match_at("to: john@example", 4).unwrap();
    /// assert_eq!(m.as_str(), "john@example");
    /// assert_eq!(m.group(1), Some("john"));
    /// assert_eq!(m.group(2), Some("example"));
    /// ```
    pub fn match_at<'s>(&self, text: &'s str, at: usize) -> Option<Match<'s>> {
        if !text.is_char_boundary(at) {
            return None;
        }

        let mut walker = TextWalker { source: text };
        let mut trace = Trace::default();
        let end = match walker.sequence(&self.root, at, &mut trace) {
            Ok(end) => end?,
            Err(never) => match never {},
        };
        Some(Match::new(text, at..end, trace.captures))
    }

    /// Match pattern at the start of `text`
    pub fn matches<'s>(&self, text: &'s str) -> Option<Match<'s>> {
        self.match_at(text, 0)
    }
}
