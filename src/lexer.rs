use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, UnexpectedCharacter},
    patterns::is_whitespace,
    Pattern,
};

/// Piece of text matched by a lexical rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token<K> {
    /// Rule that matched
    pub kind: K,
    /// Matched text
    pub value: String,
    /// Byte offset of the text
    pub index: usize,
}

/// Splits text into tokens using ordered pattern rules.
///
/// At every position the first rule with a non-empty match wins.
#[derive(Debug, Clone)]
pub struct Lexer<K> {
    rules: Vec<(K, Pattern)>,
    skip_whitespace: bool,
}

impl<K> Default for Lexer<K> {
    fn default() -> Self {
        Self {
            rules: vec![],
            skip_whitespace: true,
        }
    }
}

impl<K: Clone> Lexer<K> {
    /// Create lexer without rules that skips whitespace between tokens
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rule with pattern source
    pub fn rule(self, kind: K, pattern: &str) -> Result<Self, Error> {
        Ok(self.with_pattern(kind, Pattern::new(pattern)?))
    }

    /// Add rule with compiled pattern
    pub fn with_pattern(mut self, kind: K, pattern: Pattern) -> Self {
        self.rules.push((kind, pattern));
        self
    }

    /// Should whitespace between tokens be skipped?
    pub fn skip_whitespace(mut self, skip: bool) -> Self {
        self.skip_whitespace = skip;
        self
    }

    /// Lazily iterate over tokens of `source`
    /// ```
    /// # use pretty_assertions::assert_eq;
    /// use gramma::lexer::Lexer;
    ///
    /// let lexer = Lexer::new()
    ///     .rule("NUM", "[0-9]+").unwrap()
    ///     .rule("OP", r"[+\-]").unwrap();
    /// let kinds = lexer
    ///     .tokens("1 + 20")
    ///     .map(|t| t.unwrap().kind)
    ///     .collect::<Vec<_>>();
    /// assert_eq!(kinds, vec!["NUM", "OP", "NUM"]);
    /// ```
    pub fn tokens<'l, 's>(&'l self, source: &'s str) -> Tokens<'l, 's, K> {
        Tokens {
            lexer: self,
            source,
            at: 0,
            failed: false,
        }
    }

    /// Split whole `source` into tokens
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token<K>>, Error> {
        self.tokens(source).collect()
    }
}

/// Iterator over tokens, stops after the first error
#[derive(Debug)]
pub struct Tokens<'l, 's, K> {
    lexer: &'l Lexer<K>,
    source: &'s str,
    at: usize,
    failed: bool,
}

impl<K: Clone> Iterator for Tokens<'_, '_, K> {
    type Item = Result<Token<K>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.lexer.skip_whitespace {
            self.at = skip_whitespace(self.source, self.at);
        }
        let found = self.source[self.at..].chars().next()?;

        for (kind, pattern) in &self.lexer.rules {
            let Some(m) = pattern.match_at(self.source, self.at) else {
                continue;
            };
            if m.is_empty() {
                continue;
            }

            let token = Token {
                kind: kind.clone(),
                value: m.as_str().to_string(),
                index: self.at,
            };
            self.at = m.end();
            return Some(Ok(token));
        }

        trace!(target: "lexer", "no rule matches at {}", self.at);
        self.failed = true;
        Some(Err(UnexpectedCharacter { found, at: self.at }.into()))
    }
}

/// Offset of the first non-whitespace character at or after `at`
pub fn skip_whitespace(source: &str, at: usize) -> usize {
    source[at..]
        .find(|c: char| !is_whitespace(c))
        .map_or(source.len(), |i| at + i)
}
