use lox_interpreter as lox;

use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

fn resolve_source(source: &str) -> Result<(), LoxError> {
    let tokens: Vec<Token> = Scanner::new(source)
        .collect::<Result<Vec<Token>, LoxError>>()
        .expect("lexing should succeed");

    let mut parser = Parser::new(tokens);
    let statements = parser.parse();

    assert!(
        !parser.had_error(),
        "unexpected parse errors: {:?}",
        parser.errors()
    );

    let mut interpreter = Interpreter::new();
    let mut resolver = Resolver::new(&mut interpreter);

    resolver.resolve(&statements)
}

fn resolve_error(source: &str) -> String {
    resolve_source(source)
        .expect_err("expected a resolution error")
        .to_string()
}

#[test]
fn test_resolver_01_read_in_own_initializer() {
    let message = resolve_error("{ var a = a; }");

    assert_eq!(
        message,
        "Compiler error on line 1: Can't read local variable in its own initializer."
    );
}

#[test]
fn test_resolver_02_global_self_reference_is_allowed() {
    // At global scope the rule does not apply; this fails at runtime instead.
    assert!(resolve_source("var a = a;").is_ok());
}

#[test]
fn test_resolver_03_duplicate_declaration_in_scope() {
    let message = resolve_error("{ var a = 1; var a = 2; }");

    assert!(message.contains("Already a variable with this name in this scope."));
}

#[test]
fn test_resolver_04_shadowing_in_nested_scope_is_allowed() {
    assert!(resolve_source("{ var a = 1; { var a = 2; print a; } }").is_ok());
}

#[test]
fn test_resolver_05_top_level_return() {
    let message = resolve_error("return 1;");

    assert!(message.contains("Can't return from top-level code."));
}

#[test]
fn test_resolver_06_return_value_from_initializer() {
    let message = resolve_error("class C { init() { return 1; } }");

    assert!(message.contains("Can't return a value from an initializer."));
}

#[test]
fn test_resolver_07_bare_return_from_initializer_is_allowed() {
    assert!(resolve_source("class C { init() { return; } }").is_ok());
}

#[test]
fn test_resolver_08_this_outside_class() {
    let message = resolve_error("print this;");

    assert!(message.contains("Can't use 'this' outside of a class."));
}

#[test]
fn test_resolver_09_this_in_nested_function_inside_method_is_allowed() {
    let source = "class C { m() { fun inner() { print this; } inner(); } }";

    assert!(resolve_source(source).is_ok());
}

#[test]
fn test_resolver_10_super_outside_class() {
    let message = resolve_error("print super.m;");

    assert!(message.contains("Can't use 'super' outside of a class."));
}

#[test]
fn test_resolver_11_super_without_superclass() {
    let message = resolve_error("class C { m() { super.m(); } }");

    assert!(message.contains("Can't use 'super' in a class with no superclass."));
}

#[test]
fn test_resolver_12_class_inheriting_from_itself() {
    let message = resolve_error("class C < C {}");

    assert!(message.contains("A class can't inherit from itself."));
}

#[test]
fn test_resolver_13_duplicate_parameter_names() {
    let message = resolve_error("fun f(a, a) {}");

    assert!(message.contains("Already a variable with this name in this scope."));
}

#[test]
fn test_resolver_14_scope_discipline_across_statements() {
    // Blocks, loops, functions and classes must leave the scope stack
    // balanced; a follow-up global reference still resolves fine.
    let source = "
        var g = 1;
        { var a = 2; { var b = 3; print a + b; } }
        fun f(x) { { var y = x; print y; } return x; }
        while (g < 0) { var t = g; print t; }
        class C { m() { return this; } }
        print g;
    ";

    assert!(resolve_source(source).is_ok());
}
