/// Macro for convenient grammar definition
/// ```
/// # use pretty_assertions::assert_eq;
/// use gramma::{grammar, Definition, Options, Rule};
///
/// let definition = grammar! {
///     start: EXPR,
///     tokens { NUM: "[0-9]+", PLUS: r"\+" },
///     productions { EXPR: "NUM (PLUS NUM)*" }
/// };
/// assert_eq!(
///     definition,
///     Definition {
///         start: "EXPR".to_string(),
///         tokens: vec![Rule::new("NUM", "[0-9]+"), Rule::new("PLUS", r"\+")],
///         productions: vec![Rule::new("EXPR", "NUM (PLUS NUM)*")],
///         options: Options::default(),
///     }
/// );
/// assert_eq!(definition.compile().unwrap().parse_tree("1 + 2").unwrap().nodes.len(), 3);
/// ```
#[macro_export]
macro_rules! grammar {
    (
        start: $start:ident,
        tokens { $($token:ident : $pattern:expr),* $(,)? },
        productions { $($production:ident : $expression:expr),* $(,)? } $(,)?
    ) => {
        $crate::Definition {
            start: stringify!($start).to_string(),
            tokens: vec![$($crate::Rule::new(stringify!($token), $pattern)),*],
            productions: vec![$($crate::Rule::new(stringify!($production), $expression)),*],
            options: $crate::Options::default(),
        }
    };
}
