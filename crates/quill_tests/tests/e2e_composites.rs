//! E2E: user composite types, member access, defaults.

mod common;

use common::{expect_float, expect_int};
use quill_compile::interpret_source;

#[test]
fn e2e_member_arithmetic() {
    let source = "\
        type complex {\n\
            float i = 0;\n\
            float j = 0;\n\
        }\n\
        complex z;\n\
        z.i = 2.55;\n\
        z.j = 2.0 * z.i;\n\
        return z.j;";
    expect_float(source, 5.1);
}

#[test]
fn e2e_member_defaults_apply_on_declaration() {
    let source = "\
        type settings {\n\
            int retries = 3;\n\
            bool verbose = false;\n\
        }\n\
        settings s;\n\
        return s.retries;";
    expect_int(source, 3);
}

#[test]
fn e2e_members_without_defaults_are_zeroed() {
    let source = "\
        type point { let x: int; let y: int; }\n\
        point p;\n\
        return p.x + p.y;";
    expect_int(source, 0);
}

#[test]
fn e2e_member_assignment_is_independent() {
    let source = "\
        type pair { int a = 0; int b = 0; }\n\
        pair p;\n\
        p.a = 7;\n\
        return p.a * 10 + p.b;";
    expect_int(source, 70);
}

#[test]
fn e2e_two_instances_do_not_share_members() {
    let source = "\
        type counter { int value = 0; }\n\
        counter left;\n\
        counter right;\n\
        left.value = 5;\n\
        return left.value * 10 + right.value;";
    expect_int(source, 50);
}

#[test]
fn e2e_int_literal_widens_into_float_member() {
    let source = "\
        type scale { float factor = 2; }\n\
        scale s;\n\
        return s.factor * 1.5;";
    expect_float(source, 3.0);
}

#[test]
fn e2e_composite_member_in_expression() {
    let source = "\
        type vec2 { float x = 0; float y = 0; }\n\
        vec2 v;\n\
        v.x = 3.0;\n\
        v.y = 4.0;\n\
        return v.x * v.x + v.y * v.y;";
    expect_float(source, 25.0);
}

#[test]
fn e2e_array_out_of_bounds_is_a_runtime_error() {
    let error = interpret_source("int[4] arr; int i = 9; return arr[i];").unwrap_err();
    assert!(error.to_string().contains("out of bounds"));
}

#[test]
fn e2e_division_by_zero_is_a_runtime_error() {
    let source = "int d = 0; return 10 / d;";
    let error = interpret_source(source).unwrap_err();
    assert!(error.to_string().contains("division by zero"));
}
