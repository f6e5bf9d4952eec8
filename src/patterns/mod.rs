mod compiler;

mod matcher;
pub use matcher::*;

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Repetition bounds of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantifier {
    /// Minimum number of repetitions
    #[serde(default)]
    pub min: usize,
    /// Maximum number of repetitions, unbounded if `None`
    #[serde(default)]
    pub max: Option<usize>,
}

impl Quantifier {
    /// Exactly once. This is the implicit quantifier of every node
    pub const ONCE: Quantifier = Quantifier {
        min: 1,
        max: Some(1),
    };

    /// `*`
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// `+`
    pub fn once_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// `?`
    pub fn at_most_once() -> Self {
        Self {
            min: 0,
            max: Some(1),
        }
    }

    /// `{n}`
    pub fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// `{min,}`
    pub fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// `{min,max}`, if `min <= max`
    pub fn between(min: usize, max: usize) -> Option<Self> {
        (min <= max).then_some(Self {
            min,
            max: Some(max),
        })
    }

    /// Is this the implicit `{1,1}`?
    pub fn is_once(&self) -> bool {
        *self == Self::ONCE
    }

    /// May one more repetition be attempted after `quantity` ones?
    pub fn allows_more(&self, quantity: usize) -> bool {
        self.max.map_or(true, |max| quantity < max)
    }
}

/// What a node matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    /// Capturing group around a sequence with its alternatives
    Group { group: usize, body: Sequence },
    /// One of the items, or anything but them if negated
    CharacterSet { items: Vec<Node>, negated: bool },
    /// Specific character
    Literal(char),
    /// Character in the inclusive range
    Range { from: char, to: char },
    /// Any character except line breaks
    Dot,
    /// `\b`, zero-width
    WordBoundary,
    /// `\s`
    Whitespace,
    /// `\S`
    NotWhitespace,
    /// `\w`
    Word,
    /// `\W`
    NotWord,
    /// `\d`
    Digit,
    /// `\D`
    NotDigit,
    /// Reference to a token or a production
    Value(String),
}

impl Kind {
    /// Does this single-character kind accept `c`?
    ///
    /// Groups, sets, references and anchors accept no character by themselves.
    pub fn accepts(&self, c: char) -> bool {
        match self {
            Kind::Literal(l) => *l == c,
            Kind::Range { from, to } => (*from..=*to).contains(&c),
            Kind::Dot => c != '\n' && c != '\r',
            Kind::Whitespace => is_whitespace(c),
            Kind::NotWhitespace => !is_whitespace(c),
            Kind::Word => is_word(c),
            Kind::NotWord => !is_word(c),
            Kind::Digit => c.is_ascii_digit(),
            Kind::NotDigit => !c.is_ascii_digit(),
            Kind::Group { .. }
            | Kind::CharacterSet { .. }
            | Kind::WordBoundary
            | Kind::Value(_) => false,
        }
    }
}

/// `\s`: ASCII whitespace including vertical tab
pub fn is_whitespace(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0B'
}

/// `\w`: ASCII letters, digits and underscore
pub fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Node of a compiled pattern or grammar expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// What to match
    pub kind: Kind,
    /// How many times. `None` means exactly once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantifier: Option<Quantifier>,
}

impl Node {
    /// Node matched exactly once
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            quantifier: None,
        }
    }

    /// Attach quantifier. `{1,1}` is dropped
    pub fn with_quantifier(mut self, quantifier: Option<Quantifier>) -> Self {
        self.quantifier = quantifier.filter(|q| !q.is_once());
        self
    }

    /// Effective repetition bounds
    pub fn bounds(&self) -> Quantifier {
        self.quantifier.unwrap_or(Quantifier::ONCE)
    }
}

impl From<Kind> for Node {
    fn from(kind: Kind) -> Self {
        Node::new(kind)
    }
}

impl From<char> for Node {
    fn from(c: char) -> Self {
        Node::new(Kind::Literal(c))
    }
}

/// Nodes matched one after another, with a fallback sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Nodes to match in order
    pub nodes: Vec<Node>,
    /// Tried from the same offset if these nodes fail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<Box<Sequence>>,
}

impl Sequence {
    /// Create a sequence without alternatives
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            alternate: None,
        }
    }

    /// Append `other` to the end of the alternation chain
    pub fn or(mut self, other: Sequence) -> Self {
        self.alternate = Some(Box::new(match self.alternate.take() {
            Some(alternate) => alternate.or(other),
            None => other,
        }));
        self
    }

    /// This sequence followed by all of its alternatives
    pub fn alternatives(&self) -> impl Iterator<Item = &Sequence> {
        std::iter::successors(Some(self), |s| s.alternate.as_deref())
    }

    /// Visit every node of the chain depth first, in source order
    pub fn visit<'n>(&'n self, f: &mut impl FnMut(&'n Node)) {
        for sequence in self.alternatives() {
            Sequence::visit_nodes(&sequence.nodes, f);
        }
    }

    fn visit_nodes<'n>(nodes: &'n [Node], f: &mut impl FnMut(&'n Node)) {
        for node in nodes {
            f(node);
            match &node.kind {
                Kind::Group { body, .. } => body.visit(f),
                Kind::CharacterSet { items, .. } => Sequence::visit_nodes(items, f),
                _ => {}
            }
        }
    }
}

impl From<Vec<Node>> for Sequence {
    fn from(nodes: Vec<Node>) -> Self {
        Sequence::new(nodes)
    }
}

/// Compiled regex-like pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Source of the pattern
    pub source: String,
    /// Top-level sequence
    pub root: Sequence,
    /// Number of capturing groups
    pub groups: usize,
}

impl Pattern {
    /// Compile pattern
    /// ```
    /// use gramma::Pattern;
    ///
    /// let pattern = Pattern::new("[0-9]+").unwrap();
    /// assert_eq!(pattern.matches("123abc").unwrap().as_str(), "123");
    /// assert!(pattern.matches("abc").is_none());
    /// ```
    pub fn new(source: &str) -> Result<Self, Error> {
        compiler::compile(source)
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s)
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/", self.source)
    }
}
