//! Depth-first traversal over a parsed query
//!
//! Containers are visited before their children, and children in source
//! order (see [`Node::children`]). Every node reachable from
//! `query.expression` is yielded exactly once together with its direct
//! structural parent.

use crate::ast::{Node, Query};

/// A visited node and the container it was reached through
pub type Visit<'a> = (&'a Node, Option<&'a Node>);

/// Pre-order iterator over `(node, parent)` pairs
pub struct Nodes<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, parent) = self.stack.pop()?;
        // reversed so the leftmost child is popped first
        self.stack
            .extend(node.children().into_iter().rev().map(|child| (child, Some(node))));
        Some((node, parent))
    }
}

/// Iterate over every node of `query`
#[must_use]
pub fn nodes(query: &Query) -> Nodes<'_> {
    Nodes {
        stack: query.expression.iter().map(|root| (root, None)).collect(),
    }
}

/// Invoke `visit` with `(node, parent)` for every node of `query`
pub fn walk<'a>(query: &'a Query, mut visit: impl FnMut(&'a Node, Option<&'a Node>)) {
    for (node, parent) in nodes(query) {
        visit(node, parent);
    }
}
