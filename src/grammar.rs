use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{DuplicateName, Error, UnknownIdentifier},
    lexer::{Lexer, Token},
    parser::Session,
    syntax::ParseNode,
    Expression, Pattern,
};

/// Named token pattern or production expression
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
pub struct Rule {
    /// Rule name
    pub name: String,
    /// Pattern of a token or expression of a production
    pub expression: String,
}

impl Rule {
    /// Create a new rule with a name and an expression
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

/// Switches of the grammar interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Skip whitespace before tokens
    pub skip_whitespace: bool,
    /// Require the start production to consume the whole input
    pub complete: bool,
    /// Cache outcomes of productions per offset
    pub memoize: bool,
    /// Maximum number of productions being matched at once.
    ///
    /// This counts nested production invocations rather than nesting of the input:
    /// with `EXPR: "TERM"` and `TERM: "LP EXPR RP | NUM"` every pair of parentheses
    /// takes two of them.
    pub recursion_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            skip_whitespace: true,
            complete: true,
            memoize: false,
            recursion_limit: 256,
        }
    }
}

/// Declarative grammar: token patterns and production expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Production to parse input with
    pub start: String,
    /// Token rules, in matching order
    #[serde(default)]
    pub tokens: Vec<Rule>,
    /// Production rules
    #[serde(default)]
    pub productions: Vec<Rule>,
    /// Interpreter switches
    #[serde(default)]
    pub options: Options,
}

impl Definition {
    /// Create definition without rules
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            tokens: vec![],
            productions: vec![],
            options: Options::default(),
        }
    }

    /// Add token rule
    pub fn token(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.tokens.push(Rule::new(name, pattern));
        self
    }

    /// Add production rule
    pub fn production(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.productions.push(Rule::new(name, expression));
        self
    }

    /// Replace options
    pub fn with_options(self, options: Options) -> Self {
        Self { options, ..self }
    }

    /// Compile this definition
    pub fn compile(&self) -> Result<Grammar, Error> {
        Grammar::compile(self)
    }
}

/// Compiled grammar. Immutable and shared by all parses
#[derive(Debug, Clone)]
pub struct Grammar {
    start: String,
    tokens: HashMap<String, Pattern>,
    productions: HashMap<String, Expression>,
    lexer: Lexer<String>,
    options: Options,
}

impl Grammar {
    /// Compile token patterns and production expressions, resolving all references
    pub fn compile(definition: &Definition) -> Result<Grammar, Error> {
        let mut lexer = Lexer::new().skip_whitespace(definition.options.skip_whitespace);
        let mut tokens = HashMap::new();
        for rule in &definition.tokens {
            let pattern = Pattern::new(&rule.expression)?;
            lexer = lexer.with_pattern(rule.name.clone(), pattern.clone());
            tokens.insert(rule.name.clone(), pattern);
        }

        let mut names = HashSet::new();
        for rule in definition.tokens.iter().chain(&definition.productions) {
            if !names.insert(rule.name.as_str()) {
                return Err(DuplicateName {
                    name: rule.name.clone(),
                }
                .into());
            }
        }

        let mut productions = HashMap::new();
        for rule in &definition.productions {
            let expression = Expression::new(&rule.expression)?;
            if let Some(name) = expression
                .references()
                .into_iter()
                .find(|name| !names.contains(name))
            {
                return Err(UnknownIdentifier {
                    name: name.to_string(),
                    rule: rule.name.clone(),
                }
                .into());
            }
            productions.insert(rule.name.clone(), expression);
        }

        if !productions.contains_key(&definition.start) {
            return Err(UnknownIdentifier {
                name: definition.start.clone(),
                rule: "start".to_string(),
            }
            .into());
        }

        debug!(
            target: "grammar",
            "compiled {} tokens and {} productions, starting at '{}'",
            tokens.len(),
            productions.len(),
            definition.start
        );
        Ok(Grammar {
            start: definition.start.clone(),
            tokens,
            productions,
            lexer,
            options: definition.options,
        })
    }

    /// Name of the start production
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Interpreter switches
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compiled token pattern
    pub fn token(&self, name: &str) -> Option<&Pattern> {
        self.tokens.get(name)
    }

    /// Compiled production expression
    pub fn production(&self, name: &str) -> Option<&Expression> {
        self.productions.get(name)
    }

    /// Parse `input` with the start production.
    ///
    /// ```
    /// # use pretty_assertions::assert_eq;
    /// use gramma::Definition;
    ///
    /// let grammar = Definition::new("EXPR")
    ///     .token("NUM", "[0-9]+")
    ///     .token("PLUS", r"\+")
    ///     .production("EXPR", "NUM (PLUS NUM)*")
    ///     .compile()
    ///     .unwrap();
    /// let tree = grammar.parse_tree("1 + 2").unwrap();
    /// assert_eq!(tree.kind, "EXPR");
    /// assert_eq!(tree.text(), "1+2");
    /// ```
    pub fn parse_tree(&self, input: &str) -> Result<ParseNode, Error> {
        Session::new(self, input).parse()
    }

    /// Split `input` into tokens using token rules in declaration order
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token<String>>, Error> {
        self.lexer.tokenize(input)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        errors::{
            DuplicateName, Error, InvalidExpression, ParseError, RecursionLimit, UnknownIdentifier,
        },
        grammar,
        syntax::ParseNode,
        Definition, Grammar, Options,
    };

    fn arithmetic() -> Grammar {
        let definition = grammar! {
            start: EXPR,
            tokens { NUM: "[0-9]+", PLUS: r"\+" },
            productions { EXPR: "NUM (PLUS NUM)*" }
        };
        definition.compile().unwrap()
    }

    #[test]
    fn flat_sum() {
        assert_eq!(
            arithmetic().parse_tree("1+2+3").unwrap(),
            ParseNode::production(
                "EXPR",
                vec![
                    ParseNode::leaf("NUM", "1", 0),
                    ParseNode::leaf("PLUS", "+", 1),
                    ParseNode::leaf("NUM", "2", 2),
                    ParseNode::leaf("PLUS", "+", 3),
                    ParseNode::leaf("NUM", "3", 4),
                ]
            )
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        let tree = arithmetic().parse_tree(" 1 +\t2 \n").unwrap();
        assert_eq!(
            tree,
            ParseNode::production(
                "EXPR",
                vec![
                    ParseNode::leaf("NUM", "1", 1),
                    ParseNode::leaf("PLUS", "+", 3),
                    ParseNode::leaf("NUM", "2", 5),
                ]
            )
        );
        assert!(tree.tokens().all(|t| !t.text().contains(char::is_whitespace)));
    }

    #[test]
    fn incomplete_input() {
        assert_eq!(
            arithmetic().parse_tree("1+2 3"),
            Err(Error::ParseError(ParseError {
                expected: vec!["PLUS".into(), "end of input".into()],
                at: 4
            }))
        );
        assert_eq!(
            arithmetic().parse_tree("1+"),
            Err(Error::ParseError(ParseError {
                expected: vec!["NUM".into()],
                at: 2
            }))
        );
        assert_eq!(
            arithmetic().parse_tree(""),
            Err(Error::ParseError(ParseError {
                expected: vec!["NUM".into()],
                at: 0
            }))
        );
    }

    #[test]
    fn partial_parse() {
        let grammar = grammar! {
            start: EXPR,
            tokens { NUM: "[0-9]+", PLUS: r"\+" },
            productions { EXPR: "NUM (PLUS NUM)*" }
        }
        .with_options(Options {
            complete: false,
            ..Default::default()
        })
        .compile()
        .unwrap();
        assert_eq!(grammar.parse_tree("1+2 3").unwrap().text(), "1+2");
    }

    #[test]
    fn significant_whitespace() {
        let grammar = grammar! {
            start: PAIR,
            tokens { WORD: "[a-z]+", SPACE: " " },
            productions { PAIR: "WORD SPACE WORD" }
        }
        .with_options(Options {
            skip_whitespace: false,
            ..Default::default()
        })
        .compile()
        .unwrap();
        assert_eq!(grammar.parse_tree("ab cd").unwrap().nodes.len(), 3);
        assert!(grammar.parse_tree("ab  cd").is_err());
        assert!(grammar.parse_tree("ab cd ").is_err());
    }

    #[test]
    fn nested_productions() {
        let grammar = grammar! {
            start: EXPR,
            tokens { NUM: "[0-9]+", LP: r"\(", RP: r"\)", PLUS: r"\+" },
            productions {
                EXPR: "TERM (PLUS TERM)*",
                TERM: "NUM | LP EXPR RP"
            }
        }
        .compile()
        .unwrap();

        let tree = grammar.parse_tree("(1 + (2)) + 3").unwrap();
        assert_eq!(tree.kind, "EXPR");
        assert_eq!(tree.children_of("TERM").count(), 2);

        let inner = &tree["TERM"]["EXPR"];
        assert_eq!(inner.text(), "1+(2)");
        assert_eq!(inner[2]["EXPR"]["TERM"]["NUM"].value.as_deref(), Some("2"));

        let depth = |input: &str| {
            let tree = grammar.parse_tree(input).unwrap();
            let mut depth = 0;
            let mut node = &tree;
            while let Some(term) = node.children_of("TERM").next() {
                depth += 1;
                match term.children_of("EXPR").next() {
                    Some(expr) => node = expr,
                    None => break,
                }
            }
            depth
        };
        assert_eq!(depth("1"), 1);
        assert_eq!(depth("((((1))))"), 5);
    }

    #[test]
    fn mutual_recursion() {
        let grammar = grammar! {
            start: LIST,
            tokens { A: "a", B: "b" },
            productions {
                LIST: "A REST?",
                REST: "B LIST?"
            }
        }
        .compile()
        .unwrap();

        let tree = grammar.parse_tree("a b a b a").unwrap();
        assert_eq!(tree.text(), "ababa");
        assert_eq!(tree["REST"]["LIST"]["REST"]["LIST"].text(), "a");
        assert!(grammar.parse_tree("a a").is_err());
    }

    #[test]
    fn left_recursion_falls_back() {
        let grammar = grammar! {
            start: EXPR,
            tokens { NUM: "[0-9]+", MINUS: "-" },
            productions { EXPR: "EXPR MINUS NUM | NUM" }
        }
        .compile()
        .unwrap();
        assert_eq!(
            grammar.parse_tree("7").unwrap(),
            ParseNode::production("EXPR", vec![ParseNode::leaf("NUM", "7", 0)])
        );

        let grammar = grammar! {
            start: A,
            tokens { X: "x" },
            productions { A: "B X | X", B: "A X" }
        }
        .compile()
        .unwrap();
        assert_eq!(grammar.parse_tree("x").unwrap().text(), "x");
    }

    #[test]
    fn sets_and_groups_are_flattened() {
        let grammar = grammar! {
            start: CALL,
            tokens { ID: "[a-z]+", NUM: "[0-9]+", LP: r"\(", RP: r"\)", COMMA: "," },
            productions {
                CALL: "ID LP ([ID NUM] (COMMA [ID NUM])*)? RP"
            }
        }
        .compile()
        .unwrap();

        let tree = grammar.parse_tree("f(x, 1, y)").unwrap();
        let kinds = tree.nodes.iter().map(|n| n.kind.as_str()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec!["ID", "LP", "ID", "COMMA", "NUM", "COMMA", "ID", "RP"]
        );
        assert_eq!(grammar.parse_tree("g()").unwrap().nodes.len(), 3);
    }

    #[test]
    fn negated_set_consumes_a_character() {
        let grammar = grammar! {
            start: QUOTED,
            tokens { QUOTE: "\"", ESCAPE: r"\\." },
            productions { QUOTED: "QUOTE [^QUOTE]* QUOTE" }
        }
        .with_options(Options {
            skip_whitespace: false,
            ..Default::default()
        })
        .compile()
        .unwrap();

        let tree = grammar.parse_tree("\"a b\"").unwrap();
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.range(), Some(0..5));
    }

    #[test]
    fn bounded_repetition() {
        let grammar = grammar! {
            start: CODE,
            tokens { DIGIT: "[0-9]" },
            productions { CODE: "DIGIT{2,3}" }
        }
        .compile()
        .unwrap();
        assert!(grammar.parse_tree("1").is_err());
        assert_eq!(grammar.parse_tree("12").unwrap().nodes.len(), 2);
        assert_eq!(grammar.parse_tree("1 2 3").unwrap().nodes.len(), 3);
        assert!(grammar.parse_tree("1234").is_err());
    }

    #[test]
    fn unknown_identifier() {
        let result = grammar! {
            start: EXPR,
            tokens { NUM: "[0-9]+" },
            productions { EXPR: "NUM PLUS NUM" }
        }
        .compile();
        assert_eq!(
            result.unwrap_err(),
            Error::UnknownIdentifier(UnknownIdentifier {
                name: "PLUS".into(),
                rule: "EXPR".into()
            })
        );

        let result = grammar! {
            start: MAIN,
            tokens { NUM: "[0-9]+" },
            productions { EXPR: "NUM" }
        }
        .compile();
        assert_eq!(
            result.unwrap_err(),
            Error::UnknownIdentifier(UnknownIdentifier {
                name: "MAIN".into(),
                rule: "start".into()
            })
        );

        // Tokens can't be start symbols
        assert!(grammar! {
            start: NUM,
            tokens { NUM: "[0-9]+" },
            productions { EXPR: "NUM" }
        }
        .compile()
        .is_err());
    }

    #[test]
    fn duplicate_names() {
        let duplicate = |definition: Definition| match definition.compile() {
            Err(Error::DuplicateName(DuplicateName { name })) => name,
            other => panic!("expected duplicate name, got {other:?}"),
        };
        assert_eq!(
            duplicate(grammar! {
                start: NUM,
                tokens { NUM: "[0-9]+" },
                productions { NUM: "NUM" }
            }),
            "NUM"
        );
        assert_eq!(
            duplicate(grammar! {
                start: S,
                tokens { A: "a", A: "b" },
                productions { S: "A" }
            }),
            "A"
        );
        assert_eq!(
            duplicate(grammar! {
                start: S,
                tokens { A: "a" },
                productions { S: "A", S: "A A" }
            }),
            "S"
        );
    }

    #[test]
    fn invalid_rules() {
        let result = grammar! {
            start: S,
            tokens { A: "a{3,1}" },
            productions { S: "A" }
        }
        .compile();
        assert!(matches!(
            result,
            Err(Error::InvalidExpression(InvalidExpression { at: 1, .. }))
        ));

        let result = grammar! {
            start: S,
            tokens { A: "a" },
            productions { S: "(A" }
        }
        .compile();
        assert!(matches!(result, Err(Error::InvalidExpression(_))));
    }

    #[test]
    fn recursion_limit() {
        let grammar = grammar! {
            start: NESTED,
            tokens { LP: r"\(", RP: r"\)", X: "x" },
            productions { NESTED: "LP NESTED RP | X" }
        }
        .with_options(Options {
            recursion_limit: 8,
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(grammar.parse_tree("((((x))))").is_ok());
        assert_eq!(
            grammar.parse_tree("((((((((((x))))))))))"),
            Err(Error::RecursionLimit(RecursionLimit {
                production: "NESTED".into(),
                at: 8
            }))
        );
    }

    #[test]
    fn recursion_limit_counts_productions() {
        let grammar = grammar! {
            start: EXPR,
            tokens { LP: r"\(", RP: r"\)", X: "x" },
            productions { EXPR: "TERM", TERM: "LP EXPR RP | X" }
        }
        .with_options(Options {
            recursion_limit: 8,
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(grammar.parse_tree("(((x)))").is_ok());
        assert_eq!(
            grammar.parse_tree("((((x))))"),
            Err(Error::RecursionLimit(RecursionLimit {
                production: "EXPR".into(),
                at: 4
            }))
        );
    }

    #[test]
    fn empty_iterations_leave_no_nodes() {
        let definition = grammar! {
            start: S,
            tokens { A: "a", B: "b" },
            productions { S: "P* A", P: "B?" }
        };
        let grammar = definition.compile().unwrap();

        assert_eq!(
            grammar.parse_tree("a").unwrap(),
            ParseNode::production("S", vec![ParseNode::leaf("A", "a", 0)])
        );
        assert_eq!(
            grammar.parse_tree("b b a").unwrap(),
            ParseNode::production(
                "S",
                vec![
                    ParseNode::production("P", vec![ParseNode::leaf("B", "b", 0)]),
                    ParseNode::production("P", vec![ParseNode::leaf("B", "b", 2)]),
                    ParseNode::leaf("A", "a", 4),
                ]
            )
        );

        // An empty iteration stays when the minimum needs it
        let grammar = grammar! {
            start: S,
            tokens { A: "a", B: "b" },
            productions { S: "P+ A", P: "B?" }
        }
        .compile()
        .unwrap();
        assert_eq!(
            grammar.parse_tree("a").unwrap(),
            ParseNode::production(
                "S",
                vec![ParseNode::production("P", vec![]), ParseNode::leaf("A", "a", 0)]
            )
        );
    }

    #[test]
    fn memoization_preserves_results() {
        let definition = grammar! {
            start: EXPR,
            tokens { NUM: "[0-9]+", LP: r"\(", RP: r"\)", PLUS: r"\+", STAR: r"\*" },
            productions {
                EXPR: "TERM PLUS EXPR | TERM",
                TERM: "FACTOR STAR TERM | FACTOR",
                FACTOR: "NUM | LP EXPR RP"
            }
        };
        let plain = definition.compile().unwrap();
        let memoized = definition
            .with_options(Options {
                memoize: true,
                ..Default::default()
            })
            .compile()
            .unwrap();

        for input in ["1", "1 + 2 * 3", "(1 + 2) * (3 + (4))", "1 + * 2", "((1)"] {
            assert_eq!(memoized.parse_tree(input), plain.parse_tree(input), "{input}");
        }
    }

    #[test]
    fn tokenize() {
        let tokens = arithmetic()
            .tokenize("12 + 3")
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.value, t.index))
            .collect::<Vec<_>>();
        assert_eq!(
            tokens,
            vec![
                ("NUM".to_string(), "12".to_string(), 0),
                ("PLUS".to_string(), "+".to_string(), 3),
                ("NUM".to_string(), "3".to_string(), 5),
            ]
        );
        assert!(arithmetic().tokenize("1 - 2").is_err());
    }

    #[test]
    fn definition_from_json() {
        let definition: Definition = serde_json::from_value(json!({
            "start": "EXPR",
            "tokens": [
                { "name": "NUM", "expression": "[0-9]+" },
                { "name": "PLUS", "expression": "\\+" }
            ],
            "productions": [{ "name": "EXPR", "expression": "NUM (PLUS NUM)*" }],
            "options": { "memoize": true }
        }))
        .unwrap();
        assert_eq!(
            definition.options,
            Options {
                memoize: true,
                ..Default::default()
            }
        );
        assert_eq!(
            serde_json::to_value(definition.compile().unwrap().parse_tree("1+2").unwrap()).unwrap(),
            json!({
                "type": "EXPR",
                "nodes": [
                    { "type": "NUM", "value": "1", "index": 0 },
                    { "type": "PLUS", "value": "+", "index": 1 },
                    { "type": "NUM", "value": "2", "index": 2 }
                ]
            })
        );
    }
}
