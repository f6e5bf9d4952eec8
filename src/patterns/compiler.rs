use crate::errors::{Error, InvalidExpression};

use super::{Kind, Node, Pattern, Quantifier, Sequence};

/// Compile pattern source into a pattern tree
pub(super) fn compile(source: &str) -> Result<Pattern, Error> {
    let mut compiler = Compiler {
        source,
        at: 0,
        groups: 0,
    };
    let root = compiler.sequence(None)?;
    Ok(Pattern {
        source: source.to_string(),
        root,
        groups: compiler.groups,
    })
}

/// Cursor over pattern source
struct Compiler<'s> {
    source: &'s str,
    /// Byte offset of the next character
    at: usize,
    /// Groups opened so far
    groups: usize,
}

impl<'s> Compiler<'s> {
    fn peek(&self) -> Option<char> {
        self.source[self.at..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.at..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.at += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>, at: usize) -> Error {
        InvalidExpression::new(message, self.source, at).into()
    }

    /// Compile nodes up to the end of the pattern, or up to `)` if inside a group.
    /// `|` hands the rest of the group over to the alternate sequence.
    fn sequence(&mut self, group_start: Option<usize>) -> Result<Sequence, Error> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                None => {
                    if let Some(start) = group_start {
                        return Err(self.error("unclosed group", start));
                    }
                    return Ok(Sequence::new(nodes));
                }
                Some(')') => {
                    if group_start.is_some() {
                        return Ok(Sequence::new(nodes));
                    }
                    return Err(self.error("unmatched ')'", self.at));
                }
                Some('|') => {
                    self.bump();
                    let alternate = self.sequence(group_start)?;
                    return Ok(Sequence {
                        nodes,
                        alternate: Some(Box::new(alternate)),
                    });
                }
                Some(_) => {
                    let node = self.atom()?;
                    let quantifier = self.quantifier()?;
                    nodes.push(node.with_quantifier(quantifier));
                }
            }
        }
    }

    fn atom(&mut self) -> Result<Node, Error> {
        let start = self.at;
        let Some(c) = self.bump() else {
            return Err(self.error("unexpected end of pattern", start));
        };
        let kind = match c {
            '(' => {
                self.groups += 1;
                let group = self.groups;
                let body = self.sequence(Some(start))?;
                self.bump();
                Kind::Group { group, body }
            }
            '[' => self.character_set(start)?,
            '.' => Kind::Dot,
            '\\' => self.escape(start, false)?,
            c => Kind::Literal(c),
        };
        Ok(kind.into())
    }

    /// Character after `\`
    fn escape(&mut self, start: usize, in_set: bool) -> Result<Kind, Error> {
        let Some(c) = self.bump() else {
            return Err(self.error("trailing '\\'", start));
        };
        Ok(match c {
            't' => Kind::Literal('\t'),
            'n' => Kind::Literal('\n'),
            'v' => Kind::Literal('\x0B'),
            'f' => Kind::Literal('\x0C'),
            'r' => Kind::Literal('\r'),
            '0' => Kind::Literal('\0'),
            // Backspace inside a set, as in most regex dialects
            'b' if in_set => Kind::Literal('\x08'),
            'b' => Kind::WordBoundary,
            's' => Kind::Whitespace,
            'S' => Kind::NotWhitespace,
            'w' => Kind::Word,
            'W' => Kind::NotWord,
            'd' => Kind::Digit,
            'D' => Kind::NotDigit,
            c => Kind::Literal(c),
        })
    }

    /// Body of `[...]`, opening bracket already consumed
    fn character_set(&mut self, start: usize) -> Result<Kind, Error> {
        let negated = self.peek() == Some('^');
        if negated {
            self.bump();
        }

        let mut items: Vec<Node> = Vec::new();
        loop {
            let item_start = self.at;
            let kind = match self.bump() {
                None => return Err(self.error("unclosed character set", start)),
                Some(']') => return Ok(Kind::CharacterSet { items, negated }),
                Some('\\') => self.escape(item_start, true)?,
                Some(c) => Kind::Literal(c),
            };

            if let Kind::Literal(from) = kind {
                if self.peek() == Some('-') && !matches!(self.peek_nth(1), None | Some(']')) {
                    self.bump();
                    let to = self.range_end(start)?;
                    if from > to {
                        return Err(self.error(
                            format!("range {from}-{to} is out of order"),
                            item_start,
                        ));
                    }
                    items.push(Kind::Range { from, to }.into());
                    continue;
                }
            }
            items.push(kind.into());
        }
    }

    fn range_end(&mut self, set_start: usize) -> Result<char, Error> {
        let start = self.at;
        match self.bump() {
            None => Err(self.error("unclosed character set", set_start)),
            Some('\\') => match self.escape(start, true)? {
                Kind::Literal(c) => Ok(c),
                _ => Err(self.error("character class can't end a range", start)),
            },
            Some(c) => Ok(c),
        }
    }

    fn quantifier(&mut self) -> Result<Option<Quantifier>, Error> {
        let quantifier = match self.peek() {
            Some('*') => Quantifier::zero_or_more(),
            Some('+') => Quantifier::once_or_more(),
            Some('?') => Quantifier::at_most_once(),
            Some('{') => return self.bounds(),
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(quantifier))
    }

    /// `{m}`, `{m,}` or `{m,n}`. Anything else leaves `{` to be read as a literal
    fn bounds(&mut self) -> Result<Option<Quantifier>, Error> {
        let start = self.at;
        let rest = &self.source[start + 1..];
        let Some(close) = rest.find('}') else {
            return Ok(None);
        };
        let body = &rest[..close];
        let (min, max) = match body.split_once(',') {
            Some((min, max)) => (min, Some(max)),
            None => (body, None),
        };
        let Some(min) = number(min) else {
            return Ok(None);
        };
        let quantifier = match max {
            None => Quantifier::exactly(min),
            Some("") => Quantifier::at_least(min),
            Some(max) => {
                let Some(max) = number(max) else {
                    return Ok(None);
                };
                Quantifier::between(min, max).ok_or_else(|| {
                    self.error(format!("{{{min},{max}}}: minimum exceeds maximum"), start)
                })?
            }
        };
        self.at = start + 1 + close + 1;
        Ok(Some(quantifier))
    }
}

fn number(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
