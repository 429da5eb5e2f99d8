//! E2E: declarations, calls, recursion, overloads, built-ins.

mod common;

use common::{expect_bool, expect_int, output};

#[test]
fn e2e_recursive_fibonacci_matches_reference() {
    fn reference(n: u64) -> u64 {
        if n <= 1 {
            n
        } else {
            reference(n - 1) + reference(n - 2)
        }
    }

    // One program fills results[0..=20]; the checksum pins every entry.
    let source = "\
        function fib(int n) : int {\n\
            if(n <= 1) return n;\n\
            return fib(n - 1) + fib(n - 2);\n\
        }\n\
        const int count = 21;\n\
        int[count] results;\n\
        for(int i = 0; i < count; ++i) results[i] = fib(i);\n\
        int checksum = 0;\n\
        for(int i = 0; i < count; ++i) checksum = checksum + results[i];\n\
        return checksum;";
    let expected: u64 = (0..=20).map(reference).sum();
    expect_int(source, expected as i64);

    expect_int(
        "function fib(int n) : int { if(n <= 1) return n; return fib(n - 1) + fib(n - 2); } return fib(20);",
        reference(20) as i64,
    );
}

#[test]
fn e2e_prime_test_matches_reference() {
    fn reference_is_prime(n: u32) -> bool {
        if n < 2 {
            return false;
        }
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }

    let source = "\
        function is_prime(int n) : bool {\n\
            if(n < 2) return false;\n\
            for(int d = 2; d * d <= n; ++d)\n\
                if(n % d == 0) return false;\n\
            return true;\n\
        }\n\
        int count = 0;\n\
        for(int n = 2; n < 1000; ++n)\n\
            if(is_prime(n)) count = count + 1;\n\
        return count;";
    let expected = (2u32..1000).filter(|&n| reference_is_prime(n)).count();
    expect_int(source, expected as i64);
}

#[test]
fn e2e_prime_spot_checks() {
    let prelude = "\
        function is_prime(int n) : bool {\n\
            if(n < 2) return false;\n\
            for(int d = 2; d * d <= n; ++d)\n\
                if(n % d == 0) return false;\n\
            return true;\n\
        }\n";
    expect_bool(&format!("{}return is_prime(2);", prelude), true);
    expect_bool(&format!("{}return is_prime(997);", prelude), true);
    expect_bool(&format!("{}return is_prime(999);", prelude), false);
    expect_bool(&format!("{}return is_prime(1);", prelude), false);
}

#[test]
fn e2e_arguments_evaluate_in_caller_scope() {
    let source = "\
        function add(int a, int b) : int { return a + b; }\n\
        int a = 100;\n\
        return add(a + 1, a + 2);";
    expect_int(source, 203);
}

#[test]
fn e2e_parameters_shadow_outer_variables() {
    let source = "\
        int x = 5;\n\
        function bump(int x) : int { return x + 1; }\n\
        return bump(40) + x;";
    expect_int(source, 46);
}

#[test]
fn e2e_overloads_dispatch_on_argument_type() {
    let source = "\
        function describe(int v) : int { return 1; }\n\
        function describe(float v) : int { return 2; }\n\
        function describe(bool v) : int { return 3; }\n\
        return describe(1) * 100 + describe(1.5) * 10 + describe(true);";
    expect_int(source, 123);
}

#[test]
fn e2e_void_function_call_as_statement() {
    let source = "\
        function noop() { return; }\n\
        noop();\n\
        return 4;";
    expect_int(source, 4);
}

#[test]
fn e2e_print_formats_each_argument() {
    assert_eq!(
        output("print(122, 2.5, true, 'q', \"done\");"),
        vec!["122", "2.5", "true", "q", "done"]
    );
}

#[test]
fn e2e_print_inside_loops() {
    assert_eq!(
        output("for(int i = 0; i < 3; ++i) print(i * i);"),
        vec!["0", "1", "4"]
    );
}

#[test]
fn e2e_functions_calling_functions() {
    let source = "\
        function square(int x) : int { return x * x; }\n\
        function sum_of_squares(int a, int b) : int { return square(a) + square(b); }\n\
        return sum_of_squares(3, 4);";
    expect_int(source, 25);
}
