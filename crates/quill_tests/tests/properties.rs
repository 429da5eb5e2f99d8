//! Property-style checks: invariants the pipeline must hold.

mod common;

use quill_base::Interner;
use quill_compile::{optimize, CompileOptions, Compiler, DependencyTree, ModuleInterface};
use quill_syntax::ast::{Ast, NodeKind, Value};
use quill_syntax::lexer::Lexer;
use quill_syntax::parser::Parser;
use quill_syntax::types::TypeRegistry;
use std::fs;

const SAMPLE_PROGRAM: &str = "\
// sample exercising most of the surface\n\
import math;\n\
const int size = 4;\n\
type vec2 { float x = 0; float y = 0; }\n\
function norm2(vec2 v) : float { return v.x * v.x + v.y * v.y; }\n\
int[size] data;\n\
for(int i = 0; i < size; ++i) data[i] = i * 2;\n\
vec2 v;\n\
v.x = 1.5;\n\
print(\"ready\", data[3]);\n\
return norm2(v);\n";

/// Property 1: concatenating every token's source slice together with
/// the skipped whitespace reproduces the input exactly.
#[test]
fn token_stream_round_trips_arbitrary_source() {
    for source in [
        SAMPLE_PROGRAM,
        "int x=1;x=x+1;;",
        "  \t\n\n'a' \"str\\\"s\" 2.5f 10u // tail\n",
        "a<=b>=c!=d==e&&f||g^h",
    ] {
        let mut interner = Interner::new();
        let mut lexer = Lexer::new(source);
        let mut rebuilt = String::new();
        let mut cursor = 0;
        while let Some(token) = lexer
            .next_token(&mut interner)
            .unwrap_or_else(|e| panic!("lex failed on {:?}: {}", source, e))
        {
            rebuilt.push_str(&source[cursor..token.span.start]);
            rebuilt.push_str(&source[token.span.start..token.span.end]);
            cursor = token.span.end;
        }
        rebuilt.push_str(&source[cursor..]);
        assert_eq!(rebuilt, source);
    }
}

fn parse_and_fold(source: &str) -> Ast {
    let mut interner = Interner::new();
    let mut registry = TypeRegistry::new();
    let tokens = Lexer::tokenize(source, &mut interner).expect("lexing failed");
    let mut result = Parser::new(source, &tokens, &mut interner, &mut registry)
        .parse()
        .expect("parse failed");
    optimize(&mut result.ast);
    result.ast
}

fn shape(ast: &Ast) -> Vec<String> {
    let mut out = Vec::new();
    ast.walk(ast.root(), &mut |ast, id| {
        out.push(format!(
            "{:?}:{}",
            ast.node(id).kind,
            ast.node(id).children.len()
        ));
    });
    out
}

/// Property 2: optimize(optimize(ast)) == optimize(ast) structurally.
#[test]
fn optimizer_is_idempotent() {
    let sources = [
        "25 + 97;",
        "2 * (6 * 1 + 2) / 4 * (4 + 1);",
        "int a = 1; a + 2 * 3;",
        "1 / 0;",
        "function f(int n) : int { return n * (2 + 3); } f(4);",
    ];
    for source in sources {
        let mut ast = parse_and_fold(source);
        let once = shape(&ast);
        optimize(&mut ast);
        assert_eq!(once, shape(&ast), "not idempotent for {:?}", source);
    }
}

/// Property 3: for integers a, b (b ≠ 0), the optimized AST of `a op b`
/// contains exactly one constant, equal to the native computation.
#[test]
fn constant_folding_matches_native_arithmetic() {
    let samples: &[i64] = &[-17, -3, -1, 1, 2, 7, 45, 125, 1000];
    for &a in samples {
        for &b in samples {
            for (op, native) in [
                ("+", a.wrapping_add(b)),
                ("-", a.wrapping_sub(b)),
                ("*", a.wrapping_mul(b)),
                ("/", a / b),
            ] {
                // Negative literals are spelled through a variable-free
                // expression: (0 - n).
                let lhs = literal(a);
                let rhs = literal(b);
                let ast = parse_and_fold(&format!("{} {} {};", lhs, op, rhs));
                let mut constants = Vec::new();
                ast.walk(ast.root(), &mut |ast, id| {
                    if let NodeKind::ConstantValue(Value::Integer(v)) = ast.node(id).kind {
                        constants.push(v);
                    }
                });
                assert_eq!(
                    constants,
                    vec![native],
                    "folding {} {} {}",
                    a,
                    op,
                    b
                );
            }
        }
    }
}

fn literal(n: i64) -> String {
    if n < 0 {
        format!("(0 - {})", -n)
    } else {
        n.to_string()
    }
}

/// Property 6: for every dependency edge A → B, B's wave precedes A's,
/// and every file lands in exactly one wave.
#[test]
fn wave_schedule_respects_every_edge() {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("base.ql", ""),
        ("fmt.ql", "import base;"),
        ("io.ql", "import base;"),
        ("net.ql", "import io; import fmt;"),
        ("app.ql", "import net; import fmt; import base;"),
    ];
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    let root = dir.path().join("app.ql");

    let mut interner = Interner::new();
    let tree = DependencyTree::construct(&root, None, &mut interner).unwrap();
    let stages = tree.processing_stages().unwrap();

    let wave_of = |name: &str| {
        stages
            .iter()
            .position(|wave| wave.iter().any(|p| p.ends_with(name)))
            .unwrap_or_else(|| panic!("{} not scheduled", name))
    };
    for (importer, imported) in [
        ("fmt.ql", "base.ql"),
        ("io.ql", "base.ql"),
        ("net.ql", "io.ql"),
        ("net.ql", "fmt.ql"),
        ("app.ql", "net.ql"),
        ("app.ql", "fmt.ql"),
        ("app.ql", "base.ql"),
    ] {
        assert!(
            wave_of(imported) < wave_of(importer),
            "{} should precede {}",
            imported,
            importer
        );
    }
    let scheduled: usize = stages.iter().map(Vec::len).sum();
    assert_eq!(scheduled, files.len());
}

/// Property 7: import(save(interface)) preserves every exported name and
/// type designation, modulo type-id renumbering.
#[test]
fn interface_round_trips_modulo_renumbering() {
    let dir = tempfile::tempdir().unwrap();
    let source = "\
        import core;\n\
        export type pixel { let r: int = 0; let g: int = 0; let b: int = 0; }\n\
        export function blend(pixel a, pixel b) : pixel { return a; }\n\
        export function gamma(float v) : float { return v; }";
    let saved = dir.path().join("iface");

    // Original job.
    let mut compiler = Compiler::new(CompileOptions::default());
    let output = compiler
        .compile_source(source, &dir.path().join("px.ql"), &[])
        .unwrap();
    output
        .interface
        .save(&saved, &compiler.registry, &compiler.interner)
        .unwrap();

    // Fresh job: different registry, freshly numbered ids.
    let mut interner = Interner::new();
    let mut registry = TypeRegistry::new();
    // Pad the registry so imported ids cannot accidentally line up.
    registry.get_or_register("decoy_a");
    registry.get_or_register("decoy_b");
    let mut imported = ModuleInterface::new(dir.path().to_path_buf());
    imported.import(&saved, &mut registry, &mut interner).unwrap();

    assert_eq!(imported.dependencies, vec!["core"]);

    let names: Vec<&str> = imported
        .imported_functions
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["blend", "gamma"]);

    let blend = &imported.imported_functions[0];
    assert_eq!(registry.designation(blend.return_type), "pixel");
    assert_eq!(
        blend
            .parameters
            .iter()
            .map(|&p| registry.designation(p))
            .collect::<Vec<_>>(),
        vec!["pixel", "pixel"]
    );

    let (type_name, type_id) = &imported.imported_types[0];
    assert_eq!(type_name, "pixel");
    let members = registry.members_of(*type_id).unwrap();
    assert_eq!(members.len(), 3);
    assert!(members.iter().all(|m| registry.designation(m.type_id) == "int"));
}

/// Scope isolation seen through the public API: a name declared in an
/// inner scope is gone once the scope closes.
#[test]
fn inner_scope_names_do_not_escape() {
    let mut interner = Interner::new();
    let mut registry = TypeRegistry::new();
    let source = "{ int hidden = 1; } return hidden;";
    let tokens = Lexer::tokenize(source, &mut interner).unwrap();
    let errors = Parser::new(source, &tokens, &mut interner, &mut registry)
        .parse()
        .unwrap_err();
    assert!(errors.iter().any(|e| e.to_string().contains("hidden")));
}
