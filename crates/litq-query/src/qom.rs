//! Query Object Model.
//!
//! The canonical, platform-independent query tree. Nodes live in an arena
//! owned by [`Query`] and are addressed by [`NodeId`]; parents hold child ids
//! and nothing points back up.
//!
//! Walks over the tree use explicit stacks, so trees of any depth can be
//! compared, printed and folded.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::TreeViolation,
    matching::{Matcher, Record},
    precedence::BinaryOp,
    span::Span,
};

/// Opaque metadata carried alongside the root.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which input format a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    /// A query string; spans are byte ranges.
    String,
    /// A list-format record; spans are `{record, record + 1}`.
    List,
}

/// Operator kinds in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
    /// The single child must not match.
    Not,
    /// Children must occur near each other.
    Near {
        /// Maximum word distance, if given.
        distance: Option<u32>,
    },
}

impl OperatorKind {
    /// Upper-case keyword without the distance.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Near { .. } => "NEAR",
        }
    }

    /// The binary operator this kind is produced by, or None for unary NOT.
    pub const fn binary_op(self) -> Option<BinaryOp> {
        match self {
            Self::And => Some(BinaryOp::And),
            Self::Or => Some(BinaryOp::Or),
            Self::Near { .. } => Some(BinaryOp::Near),
            Self::Not => None,
        }
    }

    /// Whether `count` children is a valid arity for this kind.
    pub const fn accepts_arity(self, count: usize) -> bool {
        match self {
            Self::Not => count == 1,
            _ => count >= 2,
        }
    }

    /// Parses `AND`, `OR`, `NOT`, `NEAR` or `NEAR/n`, case-insensitively.
    pub fn parse(keyword: &str) -> Option<Self> {
        let upper = keyword.trim().to_ascii_uppercase();
        match upper.as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "NEAR" => Some(Self::Near { distance: None }),
            _ => {
                let distance = upper.strip_prefix("NEAR/")?.parse().ok()?;
                Some(Self::Near {
                    distance: Some(distance),
                })
            }
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Near {
                distance: Some(distance),
            } => write!(f, "NEAR/{distance}"),
            _ => f.write_str(self.keyword()),
        }
    }
}

/// A leaf search term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// The term text, without quotes.
    pub value: String,
    /// Field qualifier, e.g. `ti`.
    pub field: Option<String>,
    /// Whether the term came from a quoted phrase.
    pub exact: bool,
}

impl Term {
    /// Creates an unqualified, non-exact term.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            field: None,
            exact: false,
        }
    }

    /// Creates an exact phrase term.
    pub fn phrase(value: impl Into<String>) -> Self {
        Self {
            exact: true,
            ..Self::new(value)
        }
    }

    /// Sets the field qualifier.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// An operator node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    /// Operator kind.
    pub kind: OperatorKind,
    /// Child node ids, in source order.
    pub children: Vec<NodeId>,
    /// Whether the author wrote parentheses around this subtree.
    pub explicit_parens: bool,
    /// Whether an unparenthesized operator of another kind meets this one.
    pub implicit_precedence: bool,
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf.
    Term(Term),
    /// An operator with children.
    Operator(Operator),
}

/// A node in the query tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Leaf or operator.
    pub kind: NodeKind,
    /// Source location (synthetic for list input).
    pub span: Span,
    /// Input format the node came from.
    pub origin: Origin,
}

impl Node {
    /// Returns the term if this node is a leaf.
    pub const fn as_term(&self) -> Option<&Term> {
        match &self.kind {
            NodeKind::Term(term) => Some(term),
            NodeKind::Operator(_) => None,
        }
    }

    /// Returns the operator if this node is not a leaf.
    pub const fn as_operator(&self) -> Option<&Operator> {
        match &self.kind {
            NodeKind::Operator(op) => Some(op),
            NodeKind::Term(_) => None,
        }
    }

    /// Child ids; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Operator(op) => &op.children,
            NodeKind::Term(_) => &[],
        }
    }
}

/// A query tree: node arena, optional root and metadata.
///
/// An empty query has no root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Node arena. Some entries may be unreachable after parser recovery.
    nodes: Vec<Node>,
    /// Root node, if any.
    root: Option<NodeId>,
    /// Opaque pass-through metadata.
    metadata: Metadata,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf and returns its id.
    pub fn add_term(&mut self, term: Term, span: Span, origin: Origin) -> NodeId {
        self.push(Node {
            kind: NodeKind::Term(term),
            span,
            origin,
        })
    }

    /// Adds an operator over existing nodes and returns its id.
    pub fn add_operator(
        &mut self,
        kind: OperatorKind,
        children: Vec<NodeId>,
        span: Span,
        origin: Origin,
    ) -> NodeId {
        self.push(Node {
            kind: NodeKind::Operator(Operator {
                kind,
                children,
                explicit_parens: false,
                implicit_precedence: false,
            }),
            span,
            origin,
        })
    }

    /// Appends a node to the arena.
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Sets the root.
    pub const fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Root id, None for an empty query.
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Whether the query has no root.
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this query.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Returns a node if the id is in range.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutable access to an operator node.
    pub fn operator_mut(&mut self, id: NodeId) -> Option<&mut Operator> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Operator(op) => Some(op),
            NodeKind::Term(_) => None,
        }
    }

    /// Metadata attached to the root.
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Replaces the metadata.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// Node ids reachable from the root, in pre-order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            order.push(id);
            stack.extend(node.children().iter().rev());
        }
        order
    }

    /// Folds the tree bottom-up.
    ///
    /// `visit` is called once per reachable node, children before parents,
    /// with the results for the node's children in order. Returns None for an
    /// empty query or when a child id is out of range.
    pub fn fold<T>(&self, mut visit: impl FnMut(NodeId, &Node, Vec<T>) -> T) -> Option<T> {
        let root = self.root?;
        let mut pending = vec![(root, false)];
        let mut results: Vec<T> = Vec::new();
        while let Some((id, expanded)) = pending.pop() {
            let node = self.get(id)?;
            if expanded {
                let first = results.len().checked_sub(node.children().len())?;
                let children = results.split_off(first);
                results.push(visit(id, node, children));
            } else {
                pending.push((id, true));
                pending.extend(node.children().iter().rev().map(|child| (*child, false)));
            }
        }
        results.pop()
    }

    /// Reachable leaves, in source order.
    pub fn terms(&self) -> Vec<(NodeId, &Term)> {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.node(id).as_term().map(|t| (id, t)))
            .collect()
    }

    /// Checks the well-formedness invariants: arities, ids in range, and no
    /// node reachable twice.
    pub fn validate(&self) -> Result<(), Vec<TreeViolation>> {
        let mut violations = Vec::new();
        let Some(root) = self.root else {
            return Ok(());
        };
        if self.get(root).is_none() {
            return Err(vec![TreeViolation::DanglingRoot(root.0)]);
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                violations.push(TreeViolation::SharedNode { node: id.0 });
                continue;
            }
            seen[id.0] = true;

            let NodeKind::Operator(op) = &self.node(id).kind else {
                continue;
            };
            if !op.kind.accepts_arity(op.children.len()) {
                violations.push(TreeViolation::Arity {
                    node: id.0,
                    kind: op.kind.to_string(),
                    found: op.children.len(),
                });
            }
            for child in &op.children {
                if self.get(*child).is_some() {
                    stack.push(*child);
                } else {
                    violations.push(TreeViolation::DanglingChild {
                        node: id.0,
                        child: child.0,
                    });
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Whether `record` satisfies the query.
    ///
    /// Compiles the query on every call; use a [`Matcher`] to screen many
    /// records.
    pub fn selects(&self, record: &Record) -> bool {
        Matcher::new(self).selects(record)
    }

    /// Compares two trees by operator kinds, child order and term contents.
    /// Spans, origins, grouping flags and metadata are ignored.
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (self.root, other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => self.subtree_eq(a, other, b),
            _ => false,
        }
    }

    /// Compares two subtrees of this query structurally.
    pub fn nodes_eq(&self, a: NodeId, b: NodeId) -> bool {
        self.subtree_eq(a, self, b)
    }

    /// Compares the subtree at `a` with the subtree at `b` in `other`.
    fn subtree_eq(&self, a: NodeId, other: &Self, b: NodeId) -> bool {
        let mut pairs = vec![(a, b)];
        while let Some((a, b)) = pairs.pop() {
            let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
                return false;
            };
            match (&left.kind, &right.kind) {
                (NodeKind::Term(x), NodeKind::Term(y)) if x == y => {}
                (NodeKind::Operator(x), NodeKind::Operator(y))
                    if x.kind == y.kind && x.children.len() == y.children.len() =>
                {
                    pairs.extend(x.children.iter().copied().zip(y.children.iter().copied()));
                }
                _ => return false,
            }
        }
        true
    }
}

/// Writes one node of the indented tree.
fn fmt_line(f: &mut fmt::Formatter<'_>, node: &Node, indent: usize) -> fmt::Result {
    let prefix = "  ".repeat(indent);
    match &node.kind {
        NodeKind::Term(term) => {
            let field = term
                .field
                .as_ref()
                .map(|field| format!("{field}:"))
                .unwrap_or_default();
            if term.exact {
                writeln!(f, "{prefix}{field}Phrase({:?})", term.value)
            } else {
                writeln!(f, "{prefix}{field}Term({:?})", term.value)
            }
        }
        NodeKind::Operator(op) => {
            let mut marks = String::new();
            if op.explicit_parens {
                marks.push_str(" ()");
            }
            if op.implicit_precedence {
                marks.push_str(" [implicit]");
            }
            writeln!(f, "{prefix}{}{marks}", op.kind)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.root else {
            return writeln!(f, "(empty)");
        };
        let mut stack = vec![(root, 0)];
        while let Some((id, indent)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            fmt_line(f, node, indent)?;
            stack.extend(node.children().iter().rev().map(|child| (*child, indent + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(query: &mut Query, value: &str) -> NodeId {
        query.add_term(Term::new(value), Span::default(), Origin::String)
    }

    /// `NOT NOT ... a` with `depth` negations.
    fn negations(depth: usize) -> Query {
        let mut q = Query::new();
        let mut id = leaf(&mut q, "a");
        for _ in 0..depth {
            id = q.add_operator(OperatorKind::Not, vec![id], Span::default(), Origin::List);
        }
        q.set_root(Some(id));
        q
    }

    #[test]
    fn preorder_visits_children_in_order() {
        let mut q = Query::new();
        let a = leaf(&mut q, "a");
        let b = leaf(&mut q, "b");
        let c = leaf(&mut q, "c");
        let and = q.add_operator(OperatorKind::And, vec![a, b], Span::default(), Origin::String);
        let or = q.add_operator(OperatorKind::Or, vec![and, c], Span::default(), Origin::String);
        q.set_root(Some(or));
        assert_eq!(q.preorder(), vec![or, and, a, b, c]);
        let values: Vec<&str> = q.terms().iter().map(|(_, t)| t.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn validate_reports_arity_and_sharing() {
        let mut q = Query::new();
        let a = leaf(&mut q, "a");
        let not = q.add_operator(OperatorKind::Not, vec![a, a], Span::default(), Origin::List);
        q.set_root(Some(not));
        let violations = q.validate().unwrap_err();
        assert!(violations.contains(&TreeViolation::Arity {
            node: not.index(),
            kind: "NOT".into(),
            found: 2,
        }));
        assert!(violations.contains(&TreeViolation::SharedNode { node: a.index() }));
    }

    #[test]
    fn empty_query_is_well_formed() {
        assert!(Query::new().validate().is_ok());
        assert!(Query::new().structurally_eq(&Query::new()));
    }

    #[test]
    fn structural_equality_ignores_spans() {
        let mut x = Query::new();
        let a = x.add_term(Term::new("a"), Span::new(0, 1), Origin::String);
        x.set_root(Some(a));
        let mut y = Query::new();
        let b = y.add_term(Term::new("a"), Span::new(0, 1), Origin::List);
        y.set_root(Some(b));
        assert!(x.structurally_eq(&y));

        let mut z = Query::new();
        let c = z.add_term(Term::phrase("a"), Span::new(0, 1), Origin::List);
        z.set_root(Some(c));
        assert!(!x.structurally_eq(&z));
    }

    #[test]
    fn fold_sees_children_in_order() {
        let mut q = Query::new();
        let a = leaf(&mut q, "a");
        let b = leaf(&mut q, "b");
        let c = leaf(&mut q, "c");
        let or = q.add_operator(OperatorKind::Or, vec![b, c], Span::default(), Origin::String);
        let and = q.add_operator(OperatorKind::And, vec![a, or], Span::default(), Origin::String);
        q.set_root(Some(and));
        let text = q.fold(|_, node, parts: Vec<String>| match &node.kind {
            NodeKind::Term(term) => term.value.clone(),
            NodeKind::Operator(op) => format!("{}({})", op.kind, parts.join(",")),
        });
        assert_eq!(text.as_deref(), Some("AND(a,OR(b,c))"));
        assert_eq!(Query::new().fold(|_, _, _: Vec<()>| ()), None);
    }

    #[test]
    fn very_deep_trees_are_walked_without_recursion() {
        let depth = 100_000;
        let q = negations(depth);
        let height = q.fold(|_, _, children: Vec<usize>| {
            children.into_iter().max().unwrap_or_default() + 1
        });
        assert_eq!(height, Some(depth + 1));
        assert!(q.structurally_eq(&negations(depth)));
        assert!(!q.structurally_eq(&negations(depth - 1)));
        assert!(q.validate().is_ok());
        let shallower = negations(3_000);
        assert_eq!(shallower.to_string().lines().count(), 3_001);
    }

    #[test]
    fn operator_kind_parsing() {
        assert_eq!(OperatorKind::parse("and"), Some(OperatorKind::And));
        assert_eq!(
            OperatorKind::parse("NEAR/5"),
            Some(OperatorKind::Near { distance: Some(5) })
        );
        assert_eq!(OperatorKind::parse("XOR"), None);
        assert_eq!(OperatorKind::Near { distance: Some(2) }.to_string(), "NEAR/2");
    }

    #[test]
    fn display_tree() {
        let mut q = Query::new();
        let a = q.add_term(Term::new("a").with_field("ti"), Span::default(), Origin::String);
        let b = q.add_term(Term::phrase("b c"), Span::default(), Origin::String);
        let or = q.add_operator(OperatorKind::Or, vec![a, b], Span::default(), Origin::String);
        q.set_root(Some(or));
        assert_eq!(q.to_string(), "OR\n  ti:Term(\"a\")\n  Phrase(\"b c\")\n");
    }
}
