//! Parse trees produced by grammars and the interfaces that consume them

mod node;
pub use node::*;

mod visit;
pub use visit::*;
