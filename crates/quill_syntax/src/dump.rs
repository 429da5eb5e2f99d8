//! Human-readable dumps of token streams and parsed trees.
//!
//! The AST dump detaches into a plain label tree first, then hands it to
//! `ptree` for box-drawing rendering. Labels carry the node kind, the
//! source lexeme where one exists, and the attached type designation.

use crate::ast::{Ast, NodeId, NodeKind, Value};
use crate::token::Token;
use crate::types::TypeRegistry;
use quill_base::{error, Interner};
use std::borrow::Cow;
use std::io;

/// Formats a token stream, one token per line with its position.
pub fn format_tokens(tokens: &[Token], interner: &Interner, source: &str) -> String {
    let mut out = String::new();
    for token in tokens {
        let (line, column) = error::line_column(source, token.span);
        out.push_str(&format!(
            "{:<16} {:<20} {}:{}\n",
            format!("{:?}", token.kind),
            interner.resolve(token.lexeme),
            line,
            column
        ));
    }
    out
}

/// A detached, owned rendering tree. [`Ast`] nodes reference the arena
/// and the interner, so the dump snapshots labels into plain strings
/// that `ptree` can walk on its own.
#[derive(Clone)]
pub struct DisplayTree {
    pub label: String,
    pub children: Vec<DisplayTree>,
}

impl ptree::TreeItem for DisplayTree {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _: &ptree::Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children)
    }
}

pub fn display_tree(ast: &Ast, interner: &Interner, registry: &TypeRegistry) -> DisplayTree {
    build(ast, ast.root(), interner, registry)
}

/// Renders the AST to stdout through `ptree`.
pub fn print_ast(ast: &Ast, interner: &Interner, registry: &TypeRegistry) -> io::Result<()> {
    ptree::print_tree(&display_tree(ast, interner, registry))
}

fn build(ast: &Ast, id: NodeId, interner: &Interner, registry: &TypeRegistry) -> DisplayTree {
    let node = ast.node(id);
    let type_name = registry.designation(node.type_id);
    let lexeme = interner.resolve(node.token.lexeme);

    let label = match &node.kind {
        NodeKind::Root => "Root".to_string(),
        NodeKind::Scope => "Scope".to_string(),
        NodeKind::Statement => "Statement".to_string(),
        NodeKind::Expression => format!("Expression : {}", type_name),
        NodeKind::If => "If".to_string(),
        NodeKind::While => "While".to_string(),
        NodeKind::For => "For".to_string(),
        NodeKind::Return => format!("Return : {}", type_name),
        NodeKind::VariableDeclaration { constant } => format!(
            "VariableDeclaration{} '{}' : {}",
            if *constant { " const" } else { "" },
            lexeme,
            type_name
        ),
        NodeKind::Variable => format!("Variable '{}' : {}", lexeme, type_name),
        NodeKind::FunctionDeclaration { flags } => {
            format!("FunctionDeclaration '{}' : {} [{:?}]", lexeme, type_name, flags)
        }
        NodeKind::FunctionCall { .. } => format!("FunctionCall '{}()' : {}", lexeme, type_name),
        NodeKind::TypeDeclaration => format!("TypeDeclaration '{}'", lexeme),
        NodeKind::MemberIdentifier { index } => {
            format!("Member '{}' #{} : {}", lexeme, index, type_name)
        }
        NodeKind::ConstantValue(value) => {
            format!("Constant {} : {}", format_value(value, interner), type_name)
        }
        NodeKind::Cast => format!("Cast : {}", type_name),
        NodeKind::LValueToRValue => format!("LValueToRValue : {}", type_name),
        NodeKind::GetPointer => format!("GetPointer : {}", type_name),
        NodeKind::Dereference => format!("Dereference : {}", type_name),
        NodeKind::UnaryOperator { fixity } => {
            format!("Unary{:?} '{}' : {}", fixity, lexeme, type_name)
        }
        NodeKind::BinaryOperator => format!("Binary '{}' : {}", lexeme, type_name),
    };

    DisplayTree {
        label,
        children: node
            .children
            .iter()
            .map(|&child| build(ast, child, interner, registry))
            .collect(),
    }
}

fn format_value(value: &Value, interner: &Interner) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::Float(v) => format!("{}", v),
        Value::Boolean(v) => v.to_string(),
        Value::Char(v) => format!("'{}'", v.escape_default()),
        Value::Str(s) => format!("\"{}\"", interner.resolve(*s).escape_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    #[test]
    fn display_tree_labels_nodes() {
        let source = "int total = 1 + 2;";
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new();
        let tokens = Lexer::tokenize(source, &mut interner).unwrap();
        let result = Parser::new(source, &tokens, &mut interner, &mut registry)
            .parse()
            .unwrap();

        let tree = display_tree(&result.ast, &interner, &registry);
        assert_eq!(tree.label, "Root");
        let decl = &tree.children[0];
        assert!(decl.label.contains("VariableDeclaration"));
        assert!(decl.label.contains("total"));
        assert!(decl.label.contains("int"));
    }

    #[test]
    fn format_tokens_includes_positions() {
        let source = "int x;\nint y;";
        let mut interner = Interner::new();
        let tokens = Lexer::tokenize(source, &mut interner).unwrap();
        let dump = format_tokens(&tokens, &interner, source);
        assert!(dump.contains("Identifier"));
        assert!(dump.contains("2:1"));
    }

    #[test]
    fn eof_kind_renders() {
        let _ = format!("{:?}", crate::token::TokenKind::Eof);
    }
}
