use std::ops::{Index, Range};

use serde::{Deserialize, Serialize};

/// Node of a parse tree.
///
/// Leaves are matched tokens and carry `value` and `index`,
/// inner nodes are matched productions and carry `nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNode {
    /// Token or production name
    #[serde(rename = "type")]
    pub kind: String,
    /// Children in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ParseNode>,
    /// Matched text of a token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Byte offset of a token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ParseNode {
    /// Create token leaf
    pub fn leaf(kind: impl Into<String>, value: impl Into<String>, index: usize) -> Self {
        Self {
            kind: kind.into(),
            nodes: vec![],
            value: Some(value.into()),
            index: Some(index),
        }
    }

    /// Create production node
    pub fn production(kind: impl Into<String>, nodes: Vec<ParseNode>) -> Self {
        Self {
            kind: kind.into(),
            nodes,
            value: None,
            index: None,
        }
    }

    /// Is this a token?
    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    /// Change type of this node
    pub fn with_kind(self, kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..self
        }
    }

    /// Iterate over token leaves, depth first
    pub fn tokens(&self) -> Box<dyn Iterator<Item = &ParseNode> + '_> {
        if self.is_leaf() {
            return Box::new(std::iter::once(self));
        }
        Box::new(self.nodes.iter().flat_map(|n| n.tokens()))
    }

    /// Source range covered by this node, if it has tokens
    /// ```
    /// # use pretty_assertions::assert_eq;
    /// use gramma::syntax::ParseNode;
    ///
    /// let leaf = ParseNode::leaf("NUM", "12", 3);
    /// assert_eq!(leaf.range().unwrap(), 3..5);
    ///
    /// let expr = ParseNode::production("EXPR", vec![
    /// 	ParseNode::leaf("NUM", "1", 0),
    /// 	ParseNode::leaf("PLUS", "+", 2),
    /// 	ParseNode::leaf("NUM", "2", 4),
    /// ]);
    /// assert_eq!(expr.range().unwrap(), 0..5);
    ///
    /// assert_eq!(ParseNode::production("EMPTY", vec![]).range(), None);
    /// ```
    pub fn range(&self) -> Option<Range<usize>> {
        let mut tokens = self.tokens();
        let first = tokens.next()?;
        let last = tokens.last().unwrap_or(first);
        Some(first.start()?..last.end()?)
    }

    fn start(&self) -> Option<usize> {
        self.index
    }

    fn end(&self) -> Option<usize> {
        Some(self.index? + self.value.as_ref()?.len())
    }

    /// Children of given type
    pub fn children_of<'n, 'k>(
        &'n self,
        kind: &'k str,
    ) -> impl Iterator<Item = &'n ParseNode> + 'k
    where
        'n: 'k,
    {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Text of all tokens joined together, without the whitespace between them
    pub fn text(&self) -> String {
        self.tokens()
            .filter_map(|t| t.value.as_deref())
            .collect()
    }
}

impl Index<usize> for ParseNode {
    type Output = ParseNode;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

impl Index<&str> for ParseNode {
    type Output = ParseNode;

    fn index(&self, kind: &str) -> &Self::Output {
        self.nodes
            .iter()
            .find(|n| n.kind == kind)
            .unwrap_or_else(|| panic!("no child of type '{kind}' in '{}'", self.kind))
    }
}
