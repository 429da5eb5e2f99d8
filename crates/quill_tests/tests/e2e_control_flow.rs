//! E2E: branches, loops, arrays, and lexical scoping.

mod common;

use common::{expect_int, run};
use quill_compile::RuntimeValue;

#[test]
fn e2e_if_else_branches() {
    expect_int("int x = 5; if(x > 3) { x = 1; } else { x = 2; } return x;", 1);
    expect_int("int x = 1; if(x > 3) { x = 1; } else { x = 2; } return x;", 2);
}

#[test]
fn e2e_else_if_chain() {
    let source = "\
        function classify(int n) : int {\n\
            if(n < 0) return 0;\n\
            else if(n == 0) return 1;\n\
            else return 2;\n\
        }\n\
        return classify(0) * 100 + classify(-4) * 10 + classify(9);";
    expect_int(source, 102);
}

#[test]
fn e2e_while_countdown() {
    expect_int("int n = 32; while(n > 1) { n = n / 2; } return n;", 1);
}

#[test]
fn e2e_for_loop_array_sum() {
    let source = "\
        const int size = 8;\n\
        int[size] arr;\n\
        int total = 0;\n\
        for(int i = 0; i < size; ++i)\n\
            arr[i] = i;\n\
        for(int i = 0; i < size; ++i)\n\
            total = total + arr[i];\n\
        return total;";
    expect_int(source, 28);
}

#[test]
fn e2e_for_loop_variable_is_scoped_to_the_loop() {
    // Both loops declare `i`; neither sees the other's.
    let source = "\
        int total = 0;\n\
        for(int i = 0; i < 3; ++i) total = total + 1;\n\
        for(int i = 10; i < 13; ++i) total = total + 1;\n\
        return total;";
    expect_int(source, 6);
}

#[test]
fn e2e_array_elements_default_to_zero() {
    expect_int("int[4] arr; return arr[0] + arr[3];", 0);
}

#[test]
fn e2e_array_writes_persist() {
    expect_int("int[4] arr; arr[2] = 9; arr[2] = arr[2] + 1; return arr[2];", 10);
}

#[test]
fn e2e_nested_scopes_shadow() {
    let source = "\
        int x = 1;\n\
        {\n\
            int y = 10;\n\
            x = x + y;\n\
        }\n\
        {\n\
            int y = 20;\n\
            x = x + y;\n\
        }\n\
        return x;";
    expect_int(source, 31);
}

#[test]
fn e2e_while_with_early_return() {
    let source = "\
        function first_multiple(int base, int above) : int {\n\
            int candidate = base;\n\
            while(true) {\n\
                if(candidate > above) return candidate;\n\
                candidate = candidate + base;\n\
            }\n\
        }\n\
        return first_multiple(7, 40);";
    expect_int(source, 42);
}

#[test]
fn e2e_return_without_value_is_void() {
    assert_eq!(run("return;"), RuntimeValue::Void);
}

#[test]
fn e2e_nested_loops() {
    let source = "\
        int cells = 0;\n\
        for(int row = 0; row < 4; ++row)\n\
            for(int col = 0; col < 5; ++col)\n\
                cells = cells + 1;\n\
        return cells;";
    expect_int(source, 20);
}
