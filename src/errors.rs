use derive_more::From;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed pattern or grammar expression
#[derive(Debug, Error, Diagnostic, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[error("invalid expression: {message}")]
pub struct InvalidExpression {
    /// What is wrong
    pub message: String,
    /// Expression being compiled
    #[source_code]
    pub expression: String,
    /// Offset inside the expression
    #[label("{message}")]
    pub at: usize,
}

impl InvalidExpression {
    /// Create error for `expression` at given offset
    pub fn new(message: impl Into<String>, expression: &str, at: usize) -> Self {
        Self {
            message: message.into(),
            expression: expression.to_string(),
            at,
        }
    }
}

#[derive(Debug, Error, Diagnostic, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[error("unknown identifier '{name}' in rule '{rule}'")]
#[diagnostic(help("declare '{name}' as a token or a production"))]
pub struct UnknownIdentifier {
    /// Name that doesn't resolve
    pub name: String,
    /// Rule that references the name
    pub rule: String,
}

#[derive(Debug, Error, Diagnostic, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[error("name '{name}' is declared more than once")]
#[diagnostic(help("token and production names must be unique"))]
pub struct DuplicateName {
    /// Name declared twice
    pub name: String,
}

#[derive(Debug, Error, Diagnostic, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[error("unexpected character '{}'", .found.escape_default())]
pub struct UnexpectedCharacter {
    /// Character no rule matches
    pub found: char,
    /// Where the character is
    #[label("no rule matches here")]
    pub at: usize,
}

#[derive(Debug, Error, Diagnostic, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[error("failed to parse input at offset {at}{}", expected_suffix(.expected))]
pub struct ParseError {
    /// Tokens that were tried at the furthest offset
    pub expected: Vec<String>,
    /// Furthest offset reached
    #[label("parsing stopped here")]
    pub at: usize,
}

#[derive(Debug, Error, Diagnostic, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[error("recursion limit reached in '{production}'")]
#[diagnostic(help("raise `recursion_limit` in grammar options"))]
pub struct RecursionLimit {
    /// Production that was entered once too often
    pub production: String,
    /// Where it was entered
    #[label("entered here")]
    pub at: usize,
}

fn expected_suffix(expected: &[String]) -> String {
    match expected {
        [] => String::new(),
        [single] => format!(", expected {single}"),
        _ => format!(", expected one of {}", expected.join(", ")),
    }
}

/// Helper macro to create error enumeration
macro_rules! error_enum {
	($($name:ident),*) => {
		/// All errors that can occur during compilation and parsing
		#[derive(Debug, Error, Diagnostic, PartialEq, Eq, Serialize, Deserialize, Clone, From)]
		pub enum Error {
			$(
				#[error(transparent)]
				#[diagnostic(transparent)]
				$name($name)
			),*
		}
	};
}

error_enum!(
    InvalidExpression,
    UnknownIdentifier,
    DuplicateName,
    UnexpectedCharacter,
    ParseError,
    RecursionLimit
);
