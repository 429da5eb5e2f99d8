//! The unified abstract syntax tree.
//!
//! Every node shares the same shape — a kind tag, the token it grew from,
//! an attached [`TypeId`], and an ordered child list — so formatters,
//! the optimizer, and the interpreter all dispatch on the tag.
//!
//! # Arena layout
//!
//! Nodes live in a per-AST arena (`Vec<Node>`); [`NodeId`] is an index
//! into it. Children and the non-owning parent back-reference are ids,
//! which makes parser-time tree surgery (popping a just-parsed operand
//! and re-attaching it under a new operator node) plain index juggling
//! with no ownership cycles. Nodes orphaned by the optimizer simply stop
//! being reachable from the root; the arena reclaims them when the AST
//! is dropped.

use crate::token::{Token, TokenKind};
use crate::types::TypeId;
use quill_base::Symbol;

bitflags::bitflags! {
    /// Properties of a function declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FunctionFlags: u8 {
        /// Listed in the module interface for dependents.
        const EXPORTED = 1 << 0;
        /// Accepts any number of arguments (built-ins only).
        const VARIADIC = 1 << 1;
        /// Declared by another module's interface; has no body here.
        const IMPORTED = 1 << 2;
    }
}

/// Literal payload carried by a `ConstantValue` node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Char(char),
    Str(Symbol),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryFixity {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Top of a translation unit; children are top-level statements.
    Root,
    /// `{ … }`; pushes a lexical scope.
    Scope,
    /// A simple statement; single expression child.
    Statement,
    /// Expression wrapper collapsed away by the optimizer.
    Expression,
    /// `[cond, then, else?]`
    If,
    /// `[cond, body]`
    While,
    /// `[init, cond, step, body]`
    For,
    /// `[value?]`
    Return,
    /// Name in `token`, declared type in `type_id`, `[initializer?]`.
    VariableDeclaration { constant: bool },
    /// Name in `token`; children are an optional subscript index
    /// expression and/or a `MemberIdentifier` chain.
    Variable,
    /// Name in `token`; children: parameter declarations then the body.
    FunctionDeclaration { flags: FunctionFlags },
    /// Callee name in `token`; children are argument expressions.
    /// `resolved` caches the matched declaration (`None` for built-ins).
    FunctionCall { resolved: Option<NodeId> },
    /// Name in `token`; children are member declarations.
    TypeDeclaration,
    /// Member name in `token`; `index` is the resolved member slot.
    MemberIdentifier { index: u32 },
    /// Literal with its decoded payload.
    ConstantValue(Value),
    /// Conversion to `type_id`; single source child.
    Cast,
    /// Read from a storage location; single lvalue child.
    LValueToRValue,
    /// `&x`; single lvalue child.
    GetPointer,
    /// `*p`; single pointer-expression child.
    Dereference,
    /// Operator in `token`; single operand child.
    UnaryOperator { fixity: UnaryFixity },
    /// Operator in `token`; `[lhs, rhs]`.
    BinaryOperator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub token: Token,
    pub type_id: TypeId,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind, token: Token) -> Self {
        Node {
            kind,
            token,
            type_id: TypeId::VOID,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_type(kind: NodeKind, token: Token, type_id: TypeId) -> Self {
        Node {
            kind,
            token,
            type_id,
            children: Vec::new(),
            parent: None,
        }
    }

    /// True for nodes denoting a storage location.
    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, NodeKind::Variable | NodeKind::Dereference)
    }
}

/// One translation unit's tree, arena-backed.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        let root = Node::new(NodeKind::Root, Token::synthetic(TokenKind::Eof));
        Ast { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the root always exists
    }

    /// Allocates a detached node.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocates a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.add(node);
        self.attach(parent, id);
        id
    }

    /// Appends an existing node under `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Detaches and returns the last child of `parent`.
    pub fn pop_child(&mut self, parent: NodeId) -> Option<NodeId> {
        let child = self.nodes[parent.index()].children.pop()?;
        self.nodes[child.index()].parent = None;
        Some(child)
    }

    /// Replaces the contents of `id` with those of its only child,
    /// collapsing one level of the tree. The child node is orphaned.
    pub fn replace_with_child(&mut self, id: NodeId) {
        debug_assert_eq!(self.nodes[id.index()].children.len(), 1);
        let child = self.nodes[id.index()].children[0];
        let mut taken = std::mem::replace(
            &mut self.nodes[child.index()],
            Node::new(NodeKind::Expression, Token::synthetic(TokenKind::Eof)),
        );
        taken.parent = self.nodes[id.index()].parent;
        let grandchildren = taken.children.clone();
        self.nodes[id.index()] = taken;
        for grandchild in grandchildren {
            self.nodes[grandchild.index()].parent = Some(id);
        }
    }

    /// Pre-order traversal from `id`, applying `visit` to every reachable
    /// node.
    pub fn walk(&self, id: NodeId, visit: &mut impl FnMut(&Ast, NodeId)) {
        visit(self, id);
        for child in self.node(id).children.clone() {
            self.walk(child, visit);
        }
    }

    /// Counts reachable nodes matching `predicate`.
    pub fn count_matching(&self, predicate: impl Fn(&Node) -> bool) -> usize {
        let mut count = 0;
        self.walk(self.root(), &mut |ast, id| {
            if predicate(ast.node(id)) {
                count += 1;
            }
        });
        count
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: NodeKind) -> Node {
        Node::new(kind, Token::synthetic(TokenKind::Eof))
    }

    #[test]
    fn add_child_links_both_directions() {
        let mut ast = Ast::new();
        let child = ast.add_child(ast.root(), leaf(NodeKind::Statement));
        assert_eq!(ast.node(ast.root()).children, vec![child]);
        assert_eq!(ast.node(child).parent, Some(ast.root()));
    }

    #[test]
    fn pop_child_detaches() {
        let mut ast = Ast::new();
        let child = ast.add_child(ast.root(), leaf(NodeKind::Statement));
        assert_eq!(ast.pop_child(ast.root()), Some(child));
        assert!(ast.node(ast.root()).children.is_empty());
        assert_eq!(ast.node(child).parent, None);
        assert_eq!(ast.pop_child(ast.root()), None);
    }

    #[test]
    fn pop_then_attach_rotates_subtree() {
        // The parser's rotation: operand becomes the operator's first child.
        let mut ast = Ast::new();
        let operand = ast.add_child(ast.root(), leaf(NodeKind::ConstantValue(Value::Integer(1))));
        let popped = ast.pop_child(ast.root()).unwrap();
        assert_eq!(popped, operand);
        let op = ast.add_child(ast.root(), leaf(NodeKind::BinaryOperator));
        ast.attach(op, popped);
        assert_eq!(ast.node(op).children, vec![operand]);
        assert_eq!(ast.node(operand).parent, Some(op));
    }

    #[test]
    fn replace_with_child_collapses_wrapper() {
        let mut ast = Ast::new();
        let wrapper = ast.add_child(ast.root(), leaf(NodeKind::Expression));
        let inner = ast.add_child(wrapper, leaf(NodeKind::ConstantValue(Value::Integer(7))));
        let grandchild = ast.add_child(inner, leaf(NodeKind::ConstantValue(Value::Integer(8))));

        ast.replace_with_child(wrapper);

        assert_eq!(
            ast.node(wrapper).kind,
            NodeKind::ConstantValue(Value::Integer(7))
        );
        assert_eq!(ast.node(wrapper).parent, Some(ast.root()));
        assert_eq!(ast.node(wrapper).children, vec![grandchild]);
        assert_eq!(ast.node(grandchild).parent, Some(wrapper));
    }

    #[test]
    fn count_matching_sees_only_reachable_nodes() {
        let mut ast = Ast::new();
        let wrapper = ast.add_child(ast.root(), leaf(NodeKind::Expression));
        ast.add_child(wrapper, leaf(NodeKind::ConstantValue(Value::Integer(1))));
        ast.replace_with_child(wrapper);
        // The orphaned wrapper slot no longer counts.
        assert_eq!(
            ast.count_matching(|n| matches!(n.kind, NodeKind::ConstantValue(_))),
            1
        );
    }
}
