use crate::{
    bootstrap::rules::Symbol,
    errors::{Error, InvalidExpression},
    patterns::{Kind, Node, Quantifier, Sequence},
};

use super::{
    raw::{RawKind, RawNode, RawQuantifier},
    Expression,
};

/// Turn raw tree into expression with numbered groups and checked bounds
pub(super) fn normalize(source: &str, root: RawNode) -> Result<Expression, Error> {
    let mut normalizer = Normalizer { source, groups: 0 };
    let root = normalizer.sequence(root)?;
    Ok(Expression {
        source: source.to_string(),
        root,
        groups: normalizer.groups,
    })
}

struct Normalizer<'s> {
    source: &'s str,
    groups: usize,
}

impl Normalizer<'_> {
    fn error(&self, message: impl Into<String>, at: usize) -> Error {
        InvalidExpression::new(message, self.source, at).into()
    }

    fn sequence(&mut self, raw: RawNode) -> Result<Sequence, Error> {
        let nodes = raw
            .nodes
            .into_iter()
            .map(|n| self.node(n))
            .collect::<Result<Vec<_>, _>>()?;
        let alternate = match raw.alternate {
            Some(alternate) => Some(Box::new(self.sequence(*alternate)?)),
            None => None,
        };
        Ok(Sequence { nodes, alternate })
    }

    fn node(&mut self, mut raw: RawNode) -> Result<Node, Error> {
        let quantifier = raw
            .quantifier
            .take()
            .map(|q| self.quantifier(q))
            .transpose()?;

        let kind = match raw.kind {
            RawKind::Group => {
                self.groups += 1;
                let group = self.groups;
                Kind::Group {
                    group,
                    body: self.sequence(raw)?,
                }
            }
            RawKind::CharacterSet => {
                let mut items = raw.nodes.into_iter().peekable();
                let negated = items.next_if(|n| is(n, Symbol::Caret)).is_some();
                let items = items
                    .map(|n| self.identifier(&n).map(|name| Node::new(Kind::Value(name))))
                    .collect::<Result<Vec<_>, _>>()?;
                Kind::CharacterSet { items, negated }
            }
            RawKind::Value => Kind::Value(self.identifier(&raw)?),
            RawKind::Root | RawKind::AlternateSet | RawKind::Range => {
                return Err(self.error("unexpected nested sequence", raw.at))
            }
        };
        Ok(Node::new(kind).with_quantifier(quantifier))
    }

    /// Name referenced by a bare value
    fn identifier(&self, raw: &RawNode) -> Result<String, Error> {
        match &raw.token {
            Some(token)
                if raw.kind == RawKind::Value
                    && raw.nodes.is_empty()
                    && token.kind == Symbol::Identifier =>
            {
                Ok(token.value.clone())
            }
            Some(token) => Err(self.error(
                format!("expected identifier, found '{}'", token.value),
                token.index,
            )),
            None => Err(self.error("expected identifier", raw.at)),
        }
    }

    fn quantifier(&self, raw: RawQuantifier) -> Result<Quantifier, Error> {
        let range = match raw {
            RawQuantifier::Star => return Ok(Quantifier::zero_or_more()),
            RawQuantifier::Plus => return Ok(Quantifier::once_or_more()),
            RawQuantifier::Question => return Ok(Quantifier::at_most_once()),
            RawQuantifier::Range(range) => range,
        };

        let bounds = range
            .nodes
            .iter()
            .filter_map(|n| n.token.as_ref())
            .map(|t| (t.kind, t.value.as_str(), t.index))
            .collect::<Vec<_>>();
        match bounds.as_slice() {
            [(Symbol::Number, n, at)] => Ok(Quantifier::exactly(self.number(n, *at)?)),
            [(Symbol::Number, n, at), (Symbol::Comma, ..)] => {
                Ok(Quantifier::at_least(self.number(n, *at)?))
            }
            [(Symbol::Number, n, at), (Symbol::Comma, ..), (Symbol::Number, m, _)] => {
                let (min, max) = (self.number(n, *at)?, self.number(m, *at)?);
                Quantifier::between(min, max).ok_or_else(|| {
                    self.error(
                        format!("minimum {min} is greater than maximum {max}"),
                        range.at,
                    )
                })
            }
            _ => Err(self.error("malformed repetition bounds", range.at)),
        }
    }

    fn number(&self, digits: &str, at: usize) -> Result<usize, Error> {
        digits
            .parse()
            .map_err(|_| self.error("repetition bound is too large", at))
    }
}

fn is(raw: &RawNode, symbol: Symbol) -> bool {
    raw.token.as_ref().is_some_and(|t| t.kind == symbol)
}
