use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::lexer::Lexer;

/// Tokens of the grammar-expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Identifier,
    Number,
    Pipe,
    Plus,
    Question,
    Star,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Caret,
}

impl Symbol {
    /// Pattern matching this symbol
    pub fn pattern(&self) -> &'static str {
        match self {
            Symbol::Identifier => "[a-zA-Z_][a-zA-Z0-9_]*",
            Symbol::Number => "[0-9]+",
            Symbol::Pipe => r"\|",
            Symbol::Plus => r"\+",
            Symbol::Question => r"\?",
            Symbol::Star => r"\*",
            Symbol::LeftParen => r"\(",
            Symbol::RightParen => r"\)",
            Symbol::LeftBrace => r"\{",
            Symbol::RightBrace => r"\}",
            Symbol::LeftBracket => r"\[",
            Symbol::RightBracket => r"\]",
            Symbol::Comma => ",",
            Symbol::Caret => r"\^",
        }
    }

    /// All symbols in matching order
    pub const ALL: [Symbol; 14] = [
        Symbol::Identifier,
        Symbol::Number,
        Symbol::Pipe,
        Symbol::Plus,
        Symbol::Question,
        Symbol::Star,
        Symbol::LeftParen,
        Symbol::RightParen,
        Symbol::LeftBrace,
        Symbol::RightBrace,
        Symbol::LeftBracket,
        Symbol::RightBracket,
        Symbol::Comma,
        Symbol::Caret,
    ];
}

/// Tokenizer of grammar expressions
pub static EXPRESSION_LEXER: LazyLock<Lexer<Symbol>> = LazyLock::new(|| {
    Symbol::ALL.into_iter().fold(Lexer::new(), |lexer, symbol| {
        lexer
            .rule(symbol, symbol.pattern())
            .expect("symbol patterns are valid")
    })
});
