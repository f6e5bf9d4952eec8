//! Grammar expressions: production bodies written in the pattern mini-language,
//! with identifiers referencing tokens and productions instead of characters

mod normalize;
mod raw;

use std::{fmt::Display, str::FromStr};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    patterns::{Kind, Sequence},
};

/// Compiled right-hand side of a production
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Source of the expression
    pub source: String,
    /// Top-level sequence
    pub root: Sequence,
    /// Number of groups
    pub groups: usize,
}

impl Expression {
    /// Compile grammar expression
    /// ```
    /// use gramma::Expression;
    ///
    /// let expression = Expression::new("NUM (PLUS NUM)*").unwrap();
    /// assert_eq!(expression.groups, 1);
    /// assert_eq!(expression.references(), vec!["NUM", "PLUS", "NUM"]);
    ///
    /// assert!(Expression::new("NUM (PLUS").is_err());
    /// ```
    pub fn new(source: &str) -> Result<Self, Error> {
        let raw = raw::parse(source)?;
        let expression = normalize::normalize(source, raw)?;
        debug!(target: "expressions", "compiled '{source}' with {} groups", expression.groups);
        Ok(expression)
    }

    /// Names referenced by this expression, in source order
    pub fn references(&self) -> Vec<&str> {
        let mut names = vec![];
        self.root.visit(&mut |node| {
            if let Kind::Value(name) = &node.kind {
                names.push(name.as_str());
            }
        });
        names
    }
}

impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::new(s)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
