//! Constant folding and wrapper collapsing.
//!
//! A single bottom-up pass over the tree:
//!
//! - an `Expression` node with exactly one child is replaced by that
//!   child, removing the parser's wrapper layer;
//! - a `BinaryOperator` whose operands are both `ConstantValue` of the
//!   same numeric class becomes a `ConstantValue` holding the computed
//!   result (`+ - * / %` on integers, `+ - * /` on floats).
//!
//! Division by zero is never folded; the operator node survives and the
//! interpreter reports it at runtime. The pass is idempotent: running it
//! again changes nothing.

use quill_syntax::ast::{Ast, NodeId, NodeKind, Value};
use quill_syntax::token::TokenKind;

pub fn optimize(ast: &mut Ast) {
    fold(ast, ast.root());
}

fn fold(ast: &mut Ast, id: NodeId) {
    for child in ast.node(id).children.clone() {
        fold(ast, child);
    }

    if matches!(ast.node(id).kind, NodeKind::Expression) && ast.node(id).children.len() == 1 {
        ast.replace_with_child(id);
        return;
    }

    if matches!(ast.node(id).kind, NodeKind::BinaryOperator) {
        let &[lhs, rhs] = ast.node(id).children.as_slice() else {
            return;
        };
        let folded = match (&ast.node(lhs).kind, &ast.node(rhs).kind) {
            (NodeKind::ConstantValue(l), NodeKind::ConstantValue(r)) => {
                fold_binary(ast.node(id).token.kind, l, r)
            }
            _ => None,
        };
        if let Some(value) = folded {
            let node = ast.node_mut(id);
            node.kind = NodeKind::ConstantValue(value);
            node.children.clear();
        }
    }
}

fn fold_binary(op: TokenKind, l: &Value, r: &Value) -> Option<Value> {
    match (l, r) {
        (Value::Integer(l), Value::Integer(r)) => fold_int(op, *l, *r),
        (Value::Float(l), Value::Float(r)) => fold_float(op, *l, *r),
        _ => None,
    }
}

fn fold_int(op: TokenKind, l: i64, r: i64) -> Option<Value> {
    match op {
        TokenKind::Addition => Some(Value::Integer(l.wrapping_add(r))),
        TokenKind::Subtraction => Some(Value::Integer(l.wrapping_sub(r))),
        TokenKind::Multiplication => Some(Value::Integer(l.wrapping_mul(r))),
        TokenKind::Division if r != 0 => Some(Value::Integer(l / r)),
        TokenKind::Modulus if r != 0 => Some(Value::Integer(l % r)),
        _ => None,
    }
}

fn fold_float(op: TokenKind, l: f64, r: f64) -> Option<Value> {
    match op {
        TokenKind::Addition => Some(Value::Float(l + r)),
        TokenKind::Subtraction => Some(Value::Float(l - r)),
        TokenKind::Multiplication => Some(Value::Float(l * r)),
        TokenKind::Division if r != 0.0 => Some(Value::Float(l / r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_base::Interner;
    use quill_syntax::lexer::Lexer;
    use quill_syntax::parser::Parser;
    use quill_syntax::types::TypeRegistry;

    fn optimized(source: &str) -> Ast {
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new();
        let tokens = Lexer::tokenize(source, &mut interner).unwrap();
        let mut result = Parser::new(source, &tokens, &mut interner, &mut registry)
            .parse()
            .expect("parse failed");
        optimize(&mut result.ast);
        result.ast
    }

    fn constants(ast: &Ast) -> Vec<Value> {
        let mut out = Vec::new();
        ast.walk(ast.root(), &mut |ast, id| {
            if let NodeKind::ConstantValue(v) = &ast.node(id).kind {
                out.push(v.clone());
            }
        });
        out
    }

    #[test]
    fn folds_integer_arithmetic_to_one_constant() {
        let ast = optimized("25 + 97;");
        assert_eq!(constants(&ast), vec![Value::Integer(122)]);
        assert_eq!(
            ast.count_matching(|n| n.kind == NodeKind::BinaryOperator),
            0
        );
    }

    #[test]
    fn folds_nested_expressions() {
        let ast = optimized("125 * 45 + 24 / (4 + 3) - 5;");
        assert_eq!(constants(&ast), vec![Value::Integer(5623)]);
    }

    #[test]
    fn folds_grouped_arithmetic() {
        let ast = optimized("2 * (6 * 1 + 2) / 4 * (4 + 1);");
        assert_eq!(constants(&ast), vec![Value::Integer(20)]);
    }

    #[test]
    fn folds_modulo() {
        let ast = optimized("17 % 5;");
        assert_eq!(constants(&ast), vec![Value::Integer(2)]);
    }

    #[test]
    fn folds_float_arithmetic() {
        let ast = optimized("2.5 * 2.0;");
        assert_eq!(constants(&ast), vec![Value::Float(5.0)]);
    }

    #[test]
    fn division_by_zero_is_left_for_runtime() {
        let ast = optimized("1 / 0;");
        assert_eq!(
            ast.count_matching(|n| n.kind == NodeKind::BinaryOperator),
            1
        );
    }

    #[test]
    fn collapses_expression_wrappers() {
        let ast = optimized("4;");
        assert_eq!(
            ast.count_matching(|n| n.kind == NodeKind::Expression),
            0
        );
        // The Statement node survives with the constant directly beneath.
        let stmt = ast.node(ast.root()).children[0];
        assert_eq!(ast.node(stmt).kind, NodeKind::Statement);
        let child = ast.node(stmt).children[0];
        assert_eq!(ast.node(child).kind, NodeKind::ConstantValue(Value::Integer(4)));
    }

    #[test]
    fn variables_are_not_folded() {
        let ast = optimized("int a = 1; a + 2;");
        assert_eq!(
            ast.count_matching(|n| n.kind == NodeKind::BinaryOperator),
            1
        );
    }

    #[test]
    fn pass_is_idempotent() {
        let source = "int a = 2 * (6 * 1 + 2) / 4 * (4 + 1); a = a + 1;";
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new();
        let tokens = Lexer::tokenize(source, &mut interner).unwrap();
        let mut result = Parser::new(source, &tokens, &mut interner, &mut registry)
            .parse()
            .unwrap();
        optimize(&mut result.ast);
        let once = snapshot(&result.ast);
        optimize(&mut result.ast);
        assert_eq!(once, snapshot(&result.ast));
    }

    fn snapshot(ast: &Ast) -> Vec<String> {
        let mut out = Vec::new();
        ast.walk(ast.root(), &mut |ast, id| {
            out.push(format!(
                "{:?}/{}",
                ast.node(id).kind,
                ast.node(id).children.len()
            ));
        });
        out
    }
}
