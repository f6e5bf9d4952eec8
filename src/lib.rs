//! Regex-like patterns and grammars interpreted over text, without generating parsers

pub mod patterns;
pub use patterns::Pattern;

pub mod expressions;
pub use expressions::Expression;

mod grammar;
pub use grammar::*;

mod parser;
pub use parser::Engine;

mod context;
pub use context::*;

pub mod errors;

pub mod lexer;

pub mod bootstrap;

pub mod syntax;

mod log;

pub mod macros;

#[cfg(test)]
#[ctor::ctor]
fn init_logger() {
    let _ = pretty_env_logger::try_init();
}
