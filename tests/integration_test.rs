// Integration tests for the stack-language compiler

use std::cell::RefCell;

use stackc::compiler::environment::Environment;
use stackc::compiler::errors::CompileError;
use stackc::compiler::instruction::CompiledProgram;
use stackc::parser::ast::FunctionKind;
use stackc::parser::parse::{ParseErrorKind, Parser, MAX_NESTING};
use stackc::vm::{Bindings, Machine, MachineConfig};
use stackc::Error;

const SEPARATOR: &str = "_____________________";

/// Environment with the console functions and the given globals
fn console_env(globals: &[&str]) -> Environment {
    let mut env = Environment::new();
    env.function("Print", 1, FunctionKind::Void);
    env.function("EndSection", 0, FunctionKind::Void);
    for name in globals {
        env.global(name);
    }
    env
}

/// Compile `source`, invoke `entry` and collect everything printed
fn run_program(
    source: &str,
    globals: &[(&str, i64)],
    entry: &str,
    args: &[i64],
) -> (Vec<String>, Vec<(String, i64)>) {
    let names: Vec<&str> = globals.iter().map(|(name, _)| *name).collect();
    let env = console_env(&names);
    let program = stackc::compile(source, &env).expect("Compilation failed");

    let output = RefCell::new(Vec::new());
    let mut bindings = Bindings::new(&env);
    bindings
        .bind("Print", |args| {
            output.borrow_mut().push(args[0].to_string());
            0
        })
        .unwrap();
    bindings
        .bind("EndSection", |_| {
            output.borrow_mut().push(SEPARATOR.to_string());
            0
        })
        .unwrap();
    for (name, value) in globals {
        bindings.set_global(name, *value).unwrap();
    }

    let mut machine = Machine::new(&program, bindings, MachineConfig::default());
    let result = machine.invoke(entry, args);
    assert!(result.is_ok(), "Execution failed: {:?}", result);

    let final_globals = names
        .iter()
        .map(|name| (name.to_string(), machine.host().global(name).unwrap()))
        .collect();
    drop(machine);

    (output.into_inner(), final_globals)
}

fn compile_error(source: &str) -> CompileError {
    match stackc::compile(source, &console_env(&[])) {
        Err(Error::Compile(e)) => e,
        other => panic!("Expected compile error, got {:?}", other),
    }
}

const DEMO: &str = r#"
func Get1() {
    return 1;
}
proc Test() {
    Print(5);
}
proc PrintAddMul(x, y, z) {
    Print(x + y * z);
}
proc TestRet1(x) {
    if (x) {
        return;
    } else {
        // return; // unreachable code
    }
    return;
}
func TestRet2(x) {
    if (x) {
        return 1;
    } else {
        // return; // unreachable code
    }
    return 3; // must have
}
func TestRet3(x) {
    if (x) {
        return x;
    } else {
        return -x;
    }
}
func PrintAndGet(p, r) {
    Print(p);
    return r;
}
proc TestAndOr() {
    PrintAndGet(30, 0) && PrintAndGet(30, 1); // 30
    PrintAndGet(31, 1) && PrintAndGet(31, 1); // 31 31
    PrintAndGet(32, 1) || PrintAndGet(32, 1); // 32
    PrintAndGet(33, 0) || PrintAndGet(33, 1); // 33 33
}
proc Main(a, b, c) {
    var mvar;
    mvar = 11;
    Test();
    Print(bbb + a);
    a = 5;
    Get1();
    PrintAddMul(a + b, Get1(), mvar);
    EndSection();
    Print(1 < 2);
    Print(1 < 0);
    Print(1 == 2);
    Print(1 == 1);
    if (2) {
        Print(333);
    } else {
        Print(222);
    }
    if (0) {
        Print(18);
    } else {
        Print(81);
    }
    EndSection();
    TestAndOr();
    EndSection();
    setMe = 999;

    TestRet1(1);
    Print(TestRet2(2));
    Print(TestRet3(3));
    EndSection();
}
"#;

#[test]
fn test_demo_program_output() {
    let (output, globals) = run_program(DEMO, &[("bbb", 30), ("setMe", 15)], "Main", &[1, 2, 3]);

    let expected = [
        "5", "31", "18", SEPARATOR, //
        "1", "0", "0", "1", "333", "81", SEPARATOR, //
        "30", "31", "31", "32", "33", "33", SEPARATOR, //
        "1", "3", SEPARATOR,
    ];
    assert_eq!(output, expected);
    assert_eq!(
        globals,
        vec![("bbb".to_string(), 30), ("setMe".to_string(), 999)]
    );
}

#[test]
fn test_print_add_mul() {
    let source = r#"
        func Get1() { return 1; }
        proc PrintAddMul(x, y, z) { Print(x + y * z); }
        proc Main(a, b) {
            var m;
            m = 11;
            PrintAddMul(a + b, Get1(), m);
        }
    "#;
    let (output, _) = run_program(source, &[], "Main", &[5, 2]);
    assert_eq!(output, vec!["18"]);
}

#[test]
fn test_short_circuit_skips_right_operand() {
    let source = r#"
        func Touch(id, r) { Print(id); return r; }
        proc Main() {
            var x;
            x = Touch(1, 0) && Touch(2, 1);
            Print(x);
            x = Touch(3, 5) || Touch(4, 1);
            Print(x);
            x = Touch(5, 7) && Touch(6, 9);
            Print(x);
            x = Touch(7, 0) || Touch(8, 0);
            Print(x);
        }
    "#;
    let (output, _) = run_program(source, &[], "Main", &[]);
    assert_eq!(
        output,
        vec!["1", "0", "3", "1", "5", "6", "1", "7", "8", "0"]
    );
}

#[test]
fn test_mutual_recursion_in_either_order() {
    let even_first = r#"
        func IsEven(n) { if (n == 0) { return 1; } return IsOdd(n - 1); }
        func IsOdd(n) { if (n == 0) { return 0; } return IsEven(n - 1); }
        proc Main(n) { Print(IsEven(n)); Print(IsOdd(n)); }
    "#;
    let odd_first = r#"
        proc Main(n) { Print(IsEven(n)); Print(IsOdd(n)); }
        func IsOdd(n) { if (n == 0) { return 0; } return IsEven(n - 1); }
        func IsEven(n) { if (n == 0) { return 1; } return IsOdd(n - 1); }
    "#;

    for source in [even_first, odd_first] {
        assert_eq!(run_program(source, &[], "Main", &[7]).0, vec!["0", "1"]);
        assert_eq!(run_program(source, &[], "Main", &[10]).0, vec!["1", "0"]);
    }
}

#[test]
fn test_assigning_call_results() {
    let err = compile_error("proc Q() { } proc Main() { var x; x = Q(); }");
    assert_eq!(
        err,
        CompileError::VoidValueMisuse {
            function: "Main".to_string(),
            callee: "Q".to_string()
        }
    );

    let (output, _) = run_program(
        "func F() { return 4; } proc Main() { var x; x = F(); Print(x); }",
        &[],
        "Main",
        &[],
    );
    assert_eq!(output, vec!["4"]);
}

#[test]
fn test_if_else_returning_func() {
    let source = "func Sign(x) { if (x < 0) { return -1; } else { return 1; } } proc Main(x) { Print(Sign(x)); }";
    assert_eq!(run_program(source, &[], "Main", &[-9]).0, vec!["-1"]);
    assert_eq!(run_program(source, &[], "Main", &[9]).0, vec!["1"]);
}

#[test]
fn test_return_path_errors() {
    assert!(matches!(
        compile_error("proc Main() { return; Print(1); }"),
        CompileError::UnreachableCode { .. }
    ));
    assert!(matches!(
        compile_error("func F(x) { if (x) { return 1; } }"),
        CompileError::IncompleteReturnPaths { .. }
    ));
    assert!(matches!(
        compile_error("func F() { return; }"),
        CompileError::ReturnKindMismatch { .. }
    ));
}

#[test]
fn test_unresolved_symbols_and_arity() {
    assert_eq!(
        compile_error("proc Main() { Print(missing); }"),
        CompileError::UnresolvedSymbol {
            function: "Main".to_string(),
            name: "missing".to_string()
        }
    );
    assert!(matches!(
        compile_error("proc Main() { Nowhere(1); }"),
        CompileError::UnresolvedSymbol { .. }
    ));
    assert!(matches!(
        compile_error("proc P(a, b) { } proc Main() { P(1); }"),
        CompileError::ArityMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn test_redefinition_is_an_error() {
    assert_eq!(
        compile_error("proc Main() { } func Main() { return 0; }"),
        CompileError::FunctionRedefinition {
            function: "Main".to_string()
        }
    );
}

#[test]
fn test_parse_errors_surface_through_compile() {
    match stackc::compile("proc Main() {\n  x = ;\n}", &console_env(&[])) {
        Err(Error::Parse(e)) => {
            assert_eq!(e.kind, ParseErrorKind::Syntax);
            assert_eq!(e.location.line, 2);
        }
        other => panic!("Expected parse error, got {:?}", other),
    }

    match stackc::compile("proc Main() { proc Inner() { } }", &console_env(&[])) {
        Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::NestedFunction),
        other => panic!("Expected parse error, got {:?}", other),
    }

    match stackc::compile("proc Main() { x = 1 & 2; }", &console_env(&[])) {
        Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::Lex),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_compilation_is_deterministic() {
    let env = console_env(&["bbb", "setMe"]);
    let first: CompiledProgram = stackc::compile(DEMO, &env).unwrap();
    let second: CompiledProgram = stackc::compile(DEMO, &env).unwrap();

    assert_eq!(first.code, second.code);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_printed_program_compiles_identically() {
    let env = console_env(&["bbb", "setMe"]);
    let program = Parser::new(DEMO).parse_program().unwrap();
    let printed = program.to_string();

    assert_eq!(
        stackc::compile(DEMO, &env).unwrap(),
        stackc::compile(&printed, &env).unwrap()
    );
}

#[test]
fn test_value_returned_to_host() {
    let env = console_env(&[]);
    let program = stackc::compile(
        "func Fib(n) { if (n < 2) { return n; } return Fib(n - 1) + Fib(n - 2); }",
        &env,
    )
    .unwrap();
    let mut machine = Machine::new(&program, Bindings::new(&env), MachineConfig::default());

    assert_eq!(machine.invoke("Fib", &[20]), Ok(Some(6765)));
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let env = console_env(&[]);
    for depth in [MAX_NESTING + 1, 200, 1_000, 20_000] {
        let source = format!(
            "func F() {{ return {}1{}; }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        match stackc::compile(&source, &env) {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::Syntax),
            other => panic!("Expected parse error at depth {}, got {:?}", depth, other),
        }
    }

    let source = format!("func F() {{ return {}1; }}", "-".repeat(200_000));
    match stackc::compile(&source, &env) {
        Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::Syntax),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_nesting_at_the_limit_compiles_and_runs() {
    let env = console_env(&[]);
    let parens = format!(
        "func F() {{ return {}1{}; }}",
        "(".repeat(MAX_NESTING),
        ")".repeat(MAX_NESTING)
    );
    let chain = format!(
        "func G(a) {{ return {}; }}",
        vec!["a"; MAX_NESTING + 1].join(" + ")
    );

    for (source, entry, args, expected) in [
        (parens, "F", Vec::<i64>::new(), 1),
        (chain, "G", vec![2i64], 2 * (MAX_NESTING as i64 + 1)),
    ] {
        let program = stackc::compile(&source, &env).unwrap();
        let mut machine = Machine::new(&program, Bindings::new(&env), MachineConfig::default());
        assert_eq!(machine.invoke(entry, &args), Ok(Some(expected)));
    }
}
