use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lox_interpreter as lox;

use lox::runner::Runner;

/// Cloneable sink: the test keeps one handle, the interpreter the other.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).to_string()
    }
}

fn run(source: &str) -> String {
    let buf = SharedBuf::default();

    let mut runner = Runner::with_output(Rc::new(RefCell::new(buf.clone())));
    runner.run(source);

    buf.contents()
}

// ─────────────────────────────────────────────────────────────────────────
// Expressions and printing
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_interp_01_arithmetic() {
    assert_eq!(run("print -123 * (35.67 + 10);"), "-5617.41\n");
}

#[test]
fn test_interp_02_integral_numbers_print_without_fraction() {
    assert_eq!(run("print 4 + 10;"), "14\n");
    assert_eq!(run("print 14.0;"), "14\n");
    assert_eq!(run("print 10 / 4;"), "2.5\n");
}

#[test]
fn test_interp_03_string_concatenation() {
    assert_eq!(run("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn test_interp_04_literals_print() {
    assert_eq!(run("print nil;"), "nil\n");
    assert_eq!(run("print true;"), "true\n");
    assert_eq!(run("print false;"), "false\n");
}

#[test]
fn test_interp_05_truthiness() {
    // Only nil and false are falsey; 0 and "" are truthy.
    assert_eq!(run("print !nil;"), "true\n");
    assert_eq!(run("print !0;"), "false\n");
    assert_eq!(run("print !\"\";"), "false\n");
}

#[test]
fn test_interp_06_logical_operators_return_operands() {
    assert_eq!(run("print \"hi\" or 2;"), "hi\n");
    assert_eq!(run("print nil or \"yes\";"), "yes\n");
    assert_eq!(run("print 0 and 1;"), "1\n");
    assert_eq!(run("print false and 1;"), "false\n");
}

#[test]
fn test_interp_07_equality() {
    assert_eq!(run("print nil == nil;"), "true\n");
    assert_eq!(run("print 1 == 1;"), "true\n");
    assert_eq!(run("print \"a\" == \"b\";"), "false\n");
    assert_eq!(run("print 1 == \"1\";"), "false\n");
    assert_eq!(run("print 1 != 2;"), "true\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Variables, scoping, control flow
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_interp_08_scoping_and_shadowing() {
    assert_eq!(
        run("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn test_interp_09_block_assignment_targets_declaring_scope() {
    assert_eq!(
        run("var a = 1; { a = 2; } print a;"),
        "2\n"
    );
}

#[test]
fn test_interp_10_if_else_and_while() {
    assert_eq!(run("if (1 < 2) print \"yes\"; else print \"no\";"), "yes\n");

    assert_eq!(
        run("var i = 0; while (i < 3) { print i; i = i + 1; }"),
        "0\n1\n2\n"
    );
}

#[test]
fn test_interp_11_for_loop() {
    assert_eq!(
        run("for (var i = 0; i < 10; i = i + 1) print i;"),
        "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n"
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Functions and closures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_interp_12_function_call_and_return() {
    assert_eq!(
        run("fun add(a, b) { return a + b; } print add(1, 2);"),
        "3\n"
    );
}

#[test]
fn test_interp_13_function_without_return_yields_nil() {
    assert_eq!(run("fun noop() {} print noop();"), "nil\n");
}

#[test]
fn test_interp_14_recursion() {
    assert_eq!(
        run("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"),
        "55\n"
    );
}

#[test]
fn test_interp_15_closure_captures_declaration_site() {
    // The closure sees the binding visible where it was declared, even after
    // a later declaration shadows the name.
    let source = "var a = \"global\";
{
  fun showA() { print a; }
  showA();
  var a = \"block\";
  showA();
}";

    assert_eq!(run(source), "global\nglobal\n");
}

#[test]
fn test_interp_16_counter_closure_keeps_state() {
    let source = "fun makeCounter() {
  var count = 0;
  fun tick() { count = count + 1; print count; }
  return tick;
}
var counter = makeCounter();
counter();
counter();";

    assert_eq!(run(source), "1\n2\n");
}

#[test]
fn test_interp_17_function_display() {
    assert_eq!(run("fun f() {} print f;"), "<fn f>\n");
    assert_eq!(run("print clock;"), "<native fn clock>\n");
}

#[test]
fn test_interp_18_clock_returns_seconds() {
    assert_eq!(run("print clock() > 0;"), "true\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Classes, instances, inheritance
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_interp_19_class_and_instance_display() {
    assert_eq!(run("class Bagel {} print Bagel;"), "Bagel\n");
    assert_eq!(run("class Bagel {} print Bagel();"), "Bagel instance\n");
}

#[test]
fn test_interp_20_fields_and_methods() {
    let source = "class Box {}
var box = Box();
box.value = \"contents\";
print box.value;";

    assert_eq!(run(source), "contents\n");
}

#[test]
fn test_interp_21_initializer_binds_this() {
    let source = "class Point {
  init(x, y) { this.x = x; this.y = y; }
  sum() { return this.x + this.y; }
}
print Point(3, 4).sum();";

    assert_eq!(run(source), "7\n");
}

#[test]
fn test_interp_22_initializer_returns_this() {
    let source = "class C { init() { this.x = 1; } }
var i = C();
print i.init() == i;";

    assert_eq!(run(source), "true\n");
}

#[test]
fn test_interp_23_method_rebinding_preserves_receiver() {
    let source = "class Person {
  init(name) { this.name = name; }
  sayName() { print this.name; }
}
var a = Person(\"a\");
var b = Person(\"b\");
a.sayName = b.sayName;
a.sayName();";

    assert_eq!(run(source), "b\n");
}

#[test]
fn test_interp_24_inherited_method() {
    let source = "class A { greet() { print \"hello\"; } }
class B < A {}
B().greet();";

    assert_eq!(run(source), "hello\n");
}

#[test]
fn test_interp_25_super_dispatch_through_chain() {
    let source = "class A { method() { print \"A method\"; } }
class B < A {
  method() { print \"B method\"; }
  test() { super.method(); }
}
class C < B {}
C().test();";

    assert_eq!(run(source), "A method\n");
}

#[test]
fn test_interp_26_super_keeps_receiver() {
    let source = "class A {
  name() { return \"instance of \" + this.kind; }
  describe() { print this.name(); }
}
class B < A {
  name() { return \"B:\" + super.name(); }
}
var b = B();
b.kind = \"b\";
b.describe();";

    assert_eq!(run(source), "B:instance of b\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_interp_27_static_error_read_in_own_initializer() {
    let output = run("{ var a = a; }");

    assert!(
        output.contains("Can't read local variable in its own initializer"),
        "got: {output}"
    );
}

#[test]
fn test_interp_28_runtime_type_error_on_plus() {
    let output = run("4 + \"foo\";");

    assert!(
        output.contains("Operands must be two numbers or two strings"),
        "got: {output}"
    );
    assert!(output.contains("Runtime error executing \"+\" on line 1"));
}

#[test]
fn test_interp_29_runtime_error_formats() {
    assert_eq!(
        run("print missing;"),
        "Runtime error executing \"missing\" on line 1: Undefined variable 'missing'.\n"
    );

    assert!(run("-\"str\";").contains("Operand must be a number."));
    assert!(run("\"nope\"();").contains("Can only call functions and classes."));
    assert!(run("4 .x;").contains("Only instances have properties."));
    assert!(run("4 .x = 1;").contains("Only instances have fields."));
    assert!(run("fun f(a) {} f(1, 2);").contains("Expected 1 arguments but got 2."));
    assert!(run("class C {} C().missing;").contains("Undefined property 'missing'."));
    assert!(run("var NotAClass = 1; class C < NotAClass {}")
        .contains("Superclass must be a class."));
}

#[test]
fn test_interp_30_lexical_errors_halt_pipeline() {
    let output = run("print 1; $");

    assert_eq!(
        output,
        "There were lexical errors:\n  Unexpected character \"$\" on line 1\n"
    );
}

#[test]
fn test_interp_31_syntax_errors_halt_pipeline() {
    let output = run("print 1\nprint 2;");

    assert!(output.starts_with("There were syntax errors:\n"), "got: {output}");
    assert!(output.contains("  Error on line"));
    // Nothing executed.
    assert!(!output.contains("2\n"));
}

#[test]
fn test_interp_32_runtime_error_unwinds_call_stack() {
    let source = "fun inner() { return 1 + nil; }
fun outer() { inner(); }
outer();
";

    let output = run(source);

    assert!(output.contains("Runtime error executing \"+\""), "got: {output}");
}

// ─────────────────────────────────────────────────────────────────────────
// Runner/REPL state
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_interp_33_state_persists_across_runs() {
    let buf = SharedBuf::default();
    let mut runner = Runner::with_output(Rc::new(RefCell::new(buf.clone())));

    runner.run("var x = 10;");
    runner.run("fun double(n) { return n * 2; }");
    runner.run("print double(x);");

    assert_eq!(buf.contents(), "20\n");
}

#[test]
fn test_interp_34_error_does_not_poison_later_runs() {
    let buf = SharedBuf::default();
    let mut runner = Runner::with_output(Rc::new(RefCell::new(buf.clone())));

    runner.run("print missing;");
    runner.run("print \"still alive\";");

    let output = buf.contents();

    assert!(output.contains("Undefined variable 'missing'."));
    assert!(output.ends_with("still alive\n"));
}
