use super::ParseNode;

/// Hooks called while walking a parse tree
pub trait Visitor {
    /// Called before children of `node` are visited
    fn enter(&mut self, _node: &ParseNode, _parent: Option<&ParseNode>) {}

    /// Called after children of `node` were visited
    fn exit(&mut self, _node: &ParseNode, _parent: Option<&ParseNode>) {}
}

/// Builds a value out of a parse tree, bottom-up
pub trait Transform {
    /// Value built for every node
    type Output;
    /// Error aborting the transformation
    type Error;

    /// Transform token leaf. `None` drops it from its parent's children
    fn token(
        &mut self,
        node: &ParseNode,
        parent: &ParseNode,
    ) -> Result<Option<Self::Output>, Self::Error>;

    /// Transform production from the outputs of its children
    fn production(
        &mut self,
        node: &ParseNode,
        children: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;
}

impl ParseNode {
    /// Visit this node and all of its descendants in source order
    pub fn walk(&self, visitor: &mut impl Visitor) {
        self.walk_from(None, visitor)
    }

    fn walk_from(&self, parent: Option<&ParseNode>, visitor: &mut impl Visitor) {
        visitor.enter(self, parent);
        for node in &self.nodes {
            node.walk_from(Some(self), visitor);
        }
        visitor.exit(self, parent);
    }

    /// Transform this production with `transform`
    pub fn transform<T: Transform>(&self, transform: &mut T) -> Result<T::Output, T::Error> {
        let mut children = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let output = if node.is_leaf() {
                transform.token(node, self)?
            } else {
                Some(node.transform(transform)?)
            };
            children.extend(output);
        }
        transform.production(self, children)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::syntax::{ParseNode, Transform, Visitor};

    /// 1 + (2 + 3)
    fn tree() -> ParseNode {
        ParseNode::production(
            "SUM",
            vec![
                ParseNode::leaf("NUM", "1", 0),
                ParseNode::leaf("PLUS", "+", 2),
                ParseNode::production(
                    "SUM",
                    vec![
                        ParseNode::leaf("NUM", "2", 5),
                        ParseNode::leaf("PLUS", "+", 7),
                        ParseNode::leaf("NUM", "3", 9),
                    ],
                ),
            ],
        )
    }

    #[derive(Default)]
    struct Events(Vec<String>);

    impl Visitor for Events {
        fn enter(&mut self, node: &ParseNode, parent: Option<&ParseNode>) {
            let parent = parent.map_or("-", |p| p.kind.as_str());
            self.0.push(format!("enter {} in {parent}", node.kind));
        }

        fn exit(&mut self, node: &ParseNode, _: Option<&ParseNode>) {
            self.0.push(format!("exit {}", node.kind));
        }
    }

    #[test]
    fn walk_order() {
        let mut events = Events::default();
        tree().walk(&mut events);
        assert_eq!(
            events.0,
            vec![
                "enter SUM in -",
                "enter NUM in SUM",
                "exit NUM",
                "enter PLUS in SUM",
                "exit PLUS",
                "enter SUM in SUM",
                "enter NUM in SUM",
                "exit NUM",
                "enter PLUS in SUM",
                "exit PLUS",
                "enter NUM in SUM",
                "exit NUM",
                "exit SUM",
                "exit SUM",
            ]
        );
    }

    struct Evaluate;

    impl Transform for Evaluate {
        type Output = i64;
        type Error = String;

        fn token(&mut self, node: &ParseNode, _: &ParseNode) -> Result<Option<i64>, String> {
            match node.kind.as_str() {
                "NUM" => node
                    .value
                    .as_deref()
                    .unwrap_or_default()
                    .parse()
                    .map(Some)
                    .map_err(|e| format!("{e}")),
                _ => Ok(None),
            }
        }

        fn production(&mut self, node: &ParseNode, children: Vec<i64>) -> Result<i64, String> {
            match node.kind.as_str() {
                "SUM" => Ok(children.iter().sum()),
                kind => Err(format!("type {kind} not handled")),
            }
        }
    }

    #[test]
    fn transform_bottom_up() {
        assert_eq!(tree().transform(&mut Evaluate), Ok(6));
        assert_eq!(
            ParseNode::production("PRODUCT", vec![]).transform(&mut Evaluate),
            Err("type PRODUCT not handled".to_string())
        );
    }
}
