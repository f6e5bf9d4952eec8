use std::collections::{HashMap, HashSet};

use crate::{errors::ParseError, syntax::ParseNode};

/// Keys inside cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// Production's name
    pub production: String,
    /// Position at which parsed
    pub at: usize,
}

impl Key {
    /// Key for `production` matched at `at`
    pub fn new(production: impl Into<String>, at: usize) -> Self {
        Self {
            production: production.into(),
            at,
        }
    }
}

/// Outcome of matching a production: end offset and its tree, or nothing
pub type Outcome = Option<(usize, ParseNode)>;

pub type Cache = HashMap<Key, Outcome>;

/// State of a single parse
#[derive(Debug, Default)]
pub struct Context {
    /// Productions currently being matched
    active: HashSet<Key>,
    /// How many times re-entering a production at the same offset was refused
    pub guard_hits: usize,
    /// Furthest offset where a token failed
    pub furthest: usize,
    /// Tokens that failed at the furthest offset
    pub expected: Vec<String>,
    /// Cached production outcomes
    pub cache: Cache,
}

impl Context {
    /// Create a new context for a parse
    pub fn new() -> Context {
        Context::default()
    }

    /// Start matching production. Returns `false` if it's already being matched at the same offset
    pub fn enter(&mut self, key: &Key) -> bool {
        if self.active.contains(key) {
            self.guard_hits += 1;
            return false;
        }
        self.active.insert(key.clone());
        true
    }

    /// Finish matching production
    pub fn exit(&mut self, key: &Key) {
        self.active.remove(key);
    }

    /// Number of productions being matched
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Remember that `expected` failed to match at `at`
    pub fn expect(&mut self, expected: &str, at: usize) {
        if at > self.furthest {
            self.furthest = at;
            self.expected.clear();
        }
        if at == self.furthest && !self.expected.iter().any(|e| e == expected) {
            self.expected.push(expected.to_string());
        }
    }

    /// Error describing the furthest failure
    pub fn error(&self) -> ParseError {
        ParseError {
            expected: self.expected.clone(),
            at: self.furthest,
        }
    }

    /// Cache outcome of a production
    pub fn cache(&mut self, key: Key, outcome: Outcome) {
        self.cache.insert(key, outcome);
    }

    /// Fetch outcome of a production from cache
    pub fn fetch(&self, key: &Key) -> Option<&Outcome> {
        self.cache.get(key)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::{errors::ParseError, syntax::ParseNode, Context, Key};

    #[test]
    fn left_recursion_guard() {
        let mut context = Context::new();
        let key = Key::new("EXPR", 0);
        assert!(context.enter(&key));
        assert!(context.enter(&Key::new("EXPR", 1)));
        assert!(!context.enter(&key));
        assert_eq!(context.guard_hits, 1);
        assert_eq!(context.depth(), 2);

        context.exit(&key);
        assert!(context.enter(&key));
    }

    #[test]
    fn furthest_failure() {
        let mut context = Context::new();
        context.expect("NUM", 2);
        context.expect("LP", 2);
        context.expect("NUM", 2);
        context.expect("PLUS", 1);
        assert_eq!(
            context.error(),
            ParseError {
                expected: vec!["NUM".into(), "LP".into()],
                at: 2
            }
        );

        context.expect("PLUS", 4);
        assert_eq!(context.error().expected, vec!["PLUS".to_string()]);
    }

    #[test]
    fn caching() {
        let mut context = Context::new();
        assert!(context.cache.is_empty());

        let key = Key::new("TERM", 3);
        let node = ParseNode::production("TERM", vec![ParseNode::leaf("NUM", "4", 3)]);
        context.cache(key.clone(), Some((4, node.clone())));
        assert_eq!(context.fetch(&key), Some(&Some((4, node))));
        assert_eq!(context.fetch(&Key::new("TERM", 0)), None);
    }
}
