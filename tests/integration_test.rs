// Integration tests: whole programs compiled to WebAssembly text

use cinonim::compile_source;
use cinonim::error::ErrorKind;

/// Compiles `source` and wraps the result in newlines, so the expected text
/// can start on its own line in a raw string
fn wat(source: &str) -> String {
    match compile_source(source) {
        Ok(text) => format!("\n{}\n", text),
        Err(e) => panic!("Compilation failed: {}", e),
    }
}

#[test]
fn test_globals_and_casts() {
    let source = r#"
double foo = 3.14;
long   bar = 42;
const float baz = 1.2F;

double fun(int a)
{
    bar = (long) a;
    foo = (double) baz;
    foo = ((double) baz) + 2 * ((double) a);
    foo = ((double) bar) + 1.2;
    return (double) baz;
}
"#;

    let expected = r#"
(module
    (global $foo (mut f64) (f64.const 3.14))
    (global $bar (mut i64) (i64.const 42))
    (global $baz f32 (f32.const 1.2))
    (func $fun (param $a i32) (result f64)
        (global.set $bar (local.get $a) (i64.extend_i32_s))
        (global.set $foo (global.get $baz) (f64.promote_f32))
        (global.set $foo (global.get $baz) (f64.promote_f32) (f64.const 2) (local.get $a) (f64.convert_i32_s) (f64.mul) (f64.add))
        (global.set $foo (global.get $bar) (f64.convert_i64_s) (f64.const 1.2) (f64.add))
        (global.get $baz) (f64.promote_f32)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_functions_and_calls() {
    let source = r#"
#export-func sub = callSub

int sub(const int a, const int b)
{
    return a - b;
}

void foo(double a, long b) {}

int callSub(int a, int b) {
    foo(1, 2);

    return sub(a, b);
}
"#;

    let expected = r#"
(module
    (export "sub" (func $callSub))
    (func $sub (param $a i32) (param $b i32) (result i32)
        (local.get $a) (local.get $b) (i32.sub)
    )
    (func $foo (param $a f64) (param $b i64)
    )
    (func $callSub (param $a i32) (param $b i32) (result i32)
        (f64.const 1)
        (i64.const 2)
        (call $foo)
        (local.get $a)
        (local.get $b)
        (call $sub)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_loops() {
    let source = r#"
void forLoop(int j)
{
    int i;
    for (i = 0, j = 0; i < 10; i += 1) { j = j + 1; }
    for (i = 0; i > 0; ) { }
    for (i = 0;; i = i + 1) { break; }
    for (i = 0, j = 1; ; i += 1, j -= 1) { break; }
    for (;;) { break; }

    for (;;) {
        if (i < 0) {
            break;
        }
        if (i >= 0) {
            break;
        }
    }
}

int doLoop(int i)
{
    do {
        i += 1;

        if (i == 5) {
            return i;
        }
    } while (i < 10);

    return i;
}

int whileLoop(int i)
{
    while (i < 10) {
        if (i == 5) {
            return i;
        }
        else {
            break;
        }
    }

    return i;
}
"#;

    let expected = r#"
(module
    (func $forLoop (param $j i32)
        (local $i i32)
        (local.set $i (i32.const 0))
        (local.set $j (i32.const 0))
        (block (loop
            (br_if 1 (i32.eqz (local.get $i) (i32.const 10) (i32.lt_s)))
            (local.set $j (local.get $j) (i32.const 1) (i32.add))
            (local.set $i (local.get $i) (i32.const 1) (i32.add))
            (br 0)
        ))
        (local.set $i (i32.const 0))
        (block (loop
            (br_if 1 (i32.eqz (local.get $i) (i32.const 0) (i32.gt_s)))
            (br 0)
        ))
        (local.set $i (i32.const 0))
        (block (loop
            (br 1)
            (local.set $i (local.get $i) (i32.const 1) (i32.add))
            (br 0)
        ))
        (local.set $i (i32.const 0))
        (local.set $j (i32.const 1))
        (block (loop
            (br 1)
            (local.set $i (local.get $i) (i32.const 1) (i32.add))
            (local.set $j (local.get $j) (i32.const 1) (i32.sub))
            (br 0)
        ))
        (block (loop
            (br 1)
            (br 0)
        ))
        (block (loop
            (local.get $i) (i32.const 0) (i32.lt_s)
            (if (then
                (br 2)
            ))
            (local.get $i) (i32.const 0) (i32.ge_s)
            (if (then
                (br 2)
            ))
            (br 0)
        ))
    )
    (func $doLoop (param $i i32) (result i32)
        (block (loop
            (local.set $i (local.get $i) (i32.const 1) (i32.add))
            (local.get $i) (i32.const 5) (i32.eq)
            (if (then
                (local.get $i)
                (return)
            ))
            (br_if 0 (local.get $i) (i32.const 10) (i32.lt_s))
        ))
        (local.get $i)
    )
    (func $whileLoop (param $i i32) (result i32)
        (block (loop
            (br_if 1 (i32.eqz (local.get $i) (i32.const 10) (i32.lt_s)))
            (local.get $i) (i32.const 5) (i32.eq)
            (if (then
                (local.get $i)
                (return)
            ))
            (br 1)
            (br 0)
        ))
        (local.get $i)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_if_else() {
    let source = r#"
void foo()
{
    int a, b, c;

    a = 1, b = 2;

    if (a > 2) {
        a = 2;
    }

    if (a == 3 && b == 4) {
        a = b;
        b = 5;
    }
    else
    {
        a = 2;
    }
}
"#;

    let expected = r#"
(module
    (func $foo
        (local $a i32)
        (local $b i32)
        (local $c i32)
        (local.set $a (i32.const 1))
        (local.set $b (i32.const 2))
        (local.get $a) (i32.const 2) (i32.gt_s)
        (if (then
            (local.set $a (i32.const 2))
        ))
        (local.get $a) (i32.const 3) (i32.eq) (local.get $b) (i32.const 4) (i32.eq) (i32.and)
        (if (then
            (local.set $a (local.get $b))
            (local.set $b (i32.const 5))
        )(else
            (local.set $a (i32.const 2))
        ))
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_arrays() {
    let source = r#"
#export-func get13 = get13

double foo[100];
float  bar[100];
int    baz[100];
long   gaz[100];

int get13()
{
    int i, n;

    i = 13;
    n = 42;

    foo[i] = (double) n;
    bar[i] = (float)  n;
    baz[i] =          n;
    gaz[i] = (long)   n;

    return baz[13];
}
"#;

    let expected = r#"
(module
    (export "get13" (func $get13))
    (memory 1)
    (func $get13 (result i32)
        (local $i i32)
        (local $n i32)
        (local.set $i (i32.const 13))
        (local.set $n (i32.const 42))
        (local.get $i) (i32.const 3) (i32.shl) (i32.const 0) (i32.add) (local.get $n) (f64.convert_i32_s) (f64.store)
        (local.get $i) (i32.const 2) (i32.shl) (i32.const 800) (i32.add) (local.get $n) (f32.convert_i32_s) (f32.store)
        (local.get $i) (i32.const 2) (i32.shl) (i32.const 1200) (i32.add) (local.get $n) (i32.store)
        (local.get $i) (i32.const 3) (i32.shl) (i32.const 1600) (i32.add) (local.get $n) (i64.extend_i32_s) (i64.store)
        (i32.const 13) (i32.const 2) (i32.shl) (i32.const 1200) (i32.add) (i32.load)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_fibonacci() {
    let source = r#"
#export-func fibonacci = fibonacci

long fibonacci(int n)
{
    long curr, prev, temp;

    curr = 1;
    prev = 1;

    while(n > 2) {
        temp  = curr;
        curr += prev;
        prev  = temp;
        n    -= 1;
    }

    return curr;
}
"#;

    let expected = r#"
(module
    (export "fibonacci" (func $fibonacci))
    (func $fibonacci (param $n i32) (result i64)
        (local $curr i64)
        (local $prev i64)
        (local $temp i64)
        (local.set $curr (i64.const 1))
        (local.set $prev (i64.const 1))
        (block (loop
            (br_if 1 (i32.eqz (local.get $n) (i32.const 2) (i32.gt_s)))
            (local.set $temp (local.get $curr))
            (local.set $curr (local.get $curr) (local.get $prev) (i64.add))
            (local.set $prev (local.get $temp))
            (local.set $n (local.get $n) (i32.const 1) (i32.sub))
            (br 0)
        ))
        (local.get $curr)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_factorial() {
    let source = r#"
#export-func factorial = factorial

long factorial(int n)
{
    if (n == 0) return 1;
    return ((long) n) * factorial(n - 1);
}
"#;

    let expected = r#"
(module
    (export "factorial" (func $factorial))
    (func $factorial (param $n i32) (result i64)
        (local.get $n) (i32.const 0) (i32.eq)
        (if (then
            (i64.const 1)
            (return)
        ))
        (local.get $n) (i64.extend_i32_s) (local.get $n) (i32.const 1) (i32.sub)
        (call $factorial) (i64.mul)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_mccarthy_91() {
    let source = r#"
#export-func mc91 = mc91

int mc91rec(int n, int c)
{
    if (c != 0) {
        if (n > 100)
            return mc91rec(n - 10, c - 1);

        return mc91rec(n + 11, c + 1);
    }

    return n;
}

int mc91(int n)
{
    return mc91rec(n, 1);
}
"#;

    let expected = r#"
(module
    (export "mc91" (func $mc91))
    (func $mc91rec (param $n i32) (param $c i32) (result i32)
        (local.get $c) (i32.const 0) (i32.ne)
        (if (then
            (local.get $n) (i32.const 100) (i32.gt_s)
            (if (then
                (local.get $n) (i32.const 10) (i32.sub)
                (local.get $c) (i32.const 1) (i32.sub)
                (call $mc91rec)
                (return)
            ))
            (local.get $n) (i32.const 11) (i32.add)
            (local.get $c) (i32.const 1) (i32.add)
            (call $mc91rec)
            (return)
        ))
        (local.get $n)
    )
    (func $mc91 (param $n i32) (result i32)
        (local.get $n)
        (i32.const 1)
        (call $mc91rec)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_imports() {
    let source = r#"
#import-func console log = void logInt(int n)
#import-func env random = double random()

void main()
{
    logInt((int) random());
}
"#;

    let expected = r#"
(module
    (import "console" "log" (func $logInt (param i32)))
    (import "env" "random" (func $random (result f64)))
    (func $main
        (call $random) (i32.trunc_f64_s)
        (call $logInt)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_assignment_to_global_from_function() {
    let source = r#"
double bar = 0;
void foo() { bar = 3.14; }
"#;

    let expected = r#"
(module
    (global $bar (mut f64) (f64.const 0))
    (func $foo
        (global.set $bar (f64.const 3.14))
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_local_shadows_global() {
    let source = r#"
double bar = 0;
int foo() { int bar; bar = 3; return bar; }
"#;

    let expected = r#"
(module
    (global $bar (mut f64) (f64.const 0))
    (func $foo (result i32)
        (local $bar i32)
        (local.set $bar (i32.const 3))
        (local.get $bar)
    )
)
"#;

    assert_eq!(wat(source), expected);
}

#[test]
fn test_comments_are_ignored() {
    let source = "// leading\nint /* inline */ f() { return 1; } // trailing";

    assert_eq!(
        compile_source(source).unwrap(),
        "(module\n    (func $f (result i32)\n        (i32.const 1)\n    )\n)"
    );
}

#[test]
fn test_error_kinds() {
    let cases = [
        ("int f() { return x; }", ErrorKind::Binding),
        ("int f() { return g(); }", ErrorKind::Binding),
        ("const int c = 1;\nvoid f() { c = 2; }", ErrorKind::Immutability),
        ("long f(int a) { return a; }", ErrorKind::Type),
        ("void f() { break; }", ErrorKind::Structure),
        ("void f(int a) { a = 1; int b; }", ErrorKind::Structure),
        ("int a[3];\nint f() { return a; }", ErrorKind::Structure),
        ("int f() { return 1 }", ErrorKind::Syntax),
        ("int f() { return 1; } @", ErrorKind::Lexical),
        ("int f() { return 3000000000; }", ErrorKind::Type),
        ("void f() {}\nvoid f() {}", ErrorKind::Binding),
    ];

    for (source, kind) in cases {
        match compile_source(source) {
            Ok(text) => panic!("Expected {} error for {:?}, got:\n{}", kind, source, text),
            Err(e) => assert_eq!(e.kind, kind, "{:?}: {}", source, e),
        }
    }
}

#[test]
fn test_error_location_and_message() {
    let err = compile_source("int f()\n{\n    return 1.5;\n}").unwrap_err();

    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "Wrong data type. Expected i32, but got f32: 1.5");
    assert_eq!((err.location.line, err.location.column), (3, 12));
    assert_eq!(
        err.to_string(),
        "Type error at line 3, column 12: Wrong data type. Expected i32, but got f32: 1.5"
    );
}

#[test]
fn test_deterministic_output() {
    let source = "int a[4];\nlong b[4];\nint g = 0;\nint f(int i) { a[i] = g; return a[i]; }";

    assert_eq!(compile_source(source).unwrap(), compile_source(source).unwrap());
}
