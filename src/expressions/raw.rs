use crate::{
    bootstrap::rules::{Symbol, EXPRESSION_LEXER},
    errors::{Error, InvalidExpression},
    lexer::Token,
};

/// Shape of a raw node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RawKind {
    Root,
    Group,
    CharacterSet,
    /// Body of `{...}`
    Range,
    /// Sequence after `|`
    AlternateSet,
    Value,
}

/// Quantifier as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RawQuantifier {
    Star,
    Plus,
    Question,
    Range(Box<RawNode>),
}

/// Node of an expression before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RawNode {
    pub kind: RawKind,
    /// Token of a value
    pub token: Option<Token<Symbol>>,
    pub nodes: Vec<RawNode>,
    pub quantifier: Option<RawQuantifier>,
    pub alternate: Option<Box<RawNode>>,
    /// Offset in the expression
    pub at: usize,
}

impl RawNode {
    fn new(kind: RawKind, at: usize) -> Self {
        Self {
            kind,
            token: None,
            nodes: vec![],
            quantifier: None,
            alternate: None,
            at,
        }
    }

    fn value(token: Token<Symbol>) -> Self {
        Self {
            at: token.index,
            token: Some(token),
            ..Self::new(RawKind::Value, 0)
        }
    }
}

/// Parse grammar expression into raw tree
pub(super) fn parse(source: &str) -> Result<RawNode, Error> {
    let tokens = EXPRESSION_LEXER.tokenize(source).map_err(|e| match e {
        Error::UnexpectedCharacter(e) => InvalidExpression::new(
            format!("unexpected character '{}'", e.found.escape_default()),
            source,
            e.at,
        )
        .into(),
        e => e,
    })?;

    let mut parser = Parser {
        source,
        tokens,
        position: 0,
    };
    let root = parser.sequence(RawKind::Root, 0)?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(format!("unbalanced '{}'", token.value), token.index));
    }
    Ok(root)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token<Symbol>>,
    position: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token<Symbol>> {
        self.tokens.get(self.position)
    }

    fn bump(&mut self) -> Option<Token<Symbol>> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn error(&self, message: impl Into<String>, at: usize) -> Error {
        InvalidExpression::new(message, self.source, at).into()
    }

    fn expect(&mut self, symbol: Symbol, opened_at: usize) -> Result<(), Error> {
        let closing = &symbol.pattern()[1..];
        match self.bump() {
            Some(token) if token.kind == symbol => Ok(()),
            Some(token) => Err(self.error(
                format!("expected '{closing}', found '{}'", token.value),
                token.index,
            )),
            None => Err(self.error(format!("missing '{closing}'"), opened_at)),
        }
    }

    /// Atoms up to a closing symbol or the end, the rest after `|` becoming the alternate
    fn sequence(&mut self, kind: RawKind, at: usize) -> Result<RawNode, Error> {
        let mut sequence = RawNode::new(kind, at);
        while let Some(token) = self.peek() {
            match token.kind {
                Symbol::RightParen | Symbol::RightBracket | Symbol::RightBrace => break,
                Symbol::Pipe => {
                    let at = token.index;
                    self.position += 1;
                    let alternate = self.sequence(RawKind::AlternateSet, at)?;
                    sequence.alternate = Some(Box::new(alternate));
                    break;
                }
                _ => {
                    let atom = self.atom()?;
                    sequence.nodes.push(atom);
                }
            }
        }
        Ok(sequence)
    }

    fn atom(&mut self) -> Result<RawNode, Error> {
        let Some(token) = self.bump() else {
            return Err(self.error("unexpected end of expression", self.source.len()));
        };

        let mut atom = match token.kind {
            Symbol::Identifier | Symbol::Number | Symbol::Comma | Symbol::Caret => {
                RawNode::value(token)
            }
            Symbol::LeftParen => {
                let group = self.sequence(RawKind::Group, token.index)?;
                self.expect(Symbol::RightParen, token.index)?;
                group
            }
            Symbol::LeftBracket => self.character_set(token.index)?,
            Symbol::Plus | Symbol::Star | Symbol::Question | Symbol::LeftBrace => {
                return Err(self.error(
                    format!("nothing to repeat before '{}'", token.value),
                    token.index,
                ))
            }
            Symbol::Pipe | Symbol::RightParen | Symbol::RightBracket | Symbol::RightBrace => {
                return Err(self.error(format!("unexpected '{}'", token.value), token.index))
            }
        };
        atom.quantifier = self.quantifier()?;
        Ok(atom)
    }

    fn character_set(&mut self, at: usize) -> Result<RawNode, Error> {
        let mut set = RawNode::new(RawKind::CharacterSet, at);
        loop {
            let Some(token) = self.bump() else {
                return Err(self.error("missing ']'", at));
            };
            match token.kind {
                Symbol::RightBracket => return Ok(set),
                Symbol::Identifier | Symbol::Number | Symbol::Comma | Symbol::Caret => {
                    set.nodes.push(RawNode::value(token))
                }
                _ => {
                    return Err(self.error(
                        format!("unexpected '{}' in set", token.value),
                        token.index,
                    ))
                }
            }
        }
    }

    fn quantifier(&mut self) -> Result<Option<RawQuantifier>, Error> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let quantifier = match token.kind {
            Symbol::Star => RawQuantifier::Star,
            Symbol::Plus => RawQuantifier::Plus,
            Symbol::Question => RawQuantifier::Question,
            Symbol::LeftBrace => {
                let at = token.index;
                self.position += 1;
                return Ok(Some(RawQuantifier::Range(Box::new(self.range(at)?))));
            }
            _ => return Ok(None),
        };
        self.position += 1;
        Ok(Some(quantifier))
    }

    fn range(&mut self, at: usize) -> Result<RawNode, Error> {
        let mut range = RawNode::new(RawKind::Range, at);
        loop {
            let Some(token) = self.bump() else {
                return Err(self.error("missing '}'", at));
            };
            match token.kind {
                Symbol::RightBrace => return Ok(range),
                Symbol::Identifier | Symbol::Number | Symbol::Comma | Symbol::Caret => {
                    range.nodes.push(RawNode::value(token))
                }
                _ => {
                    return Err(self.error(
                        format!("unexpected '{}' in repetition bounds", token.value),
                        token.index,
                    ))
                }
            }
        }
    }
}
