use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::{undefined_variable, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Destination for `print` output and diagnostics; stdout by default,
/// injectable for tests.
pub type OutputSink = Rc<RefCell<dyn Write>>;

/// Non-local exit from statement execution: either a genuine error or a
/// `return` unwinding to the nearest enclosing call.
enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Error(e)
    }
}

impl From<io::Error> for Unwind {
    fn from(e: io::Error) -> Self {
        Unwind::Error(LoxError::Io(e))
    }
}

type Exec<T> = std::result::Result<T, Unwind>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    out: OutputSink,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    pub fn with_output(out: OutputSink) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    pub fn output(&self) -> OutputSink {
        self.out.clone()
    }

    /// Resolver callback: the named-reference expression `id` binds `depth`
    /// scopes out from its use site. Unannotated references are globals.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => return Err(e),

                // The resolver rejects top-level returns; this only trips on
                // unresolved input fed straight to the interpreter.
                Err(Unwind::Return(_)) => {
                    return Err(LoxError::runtime("Can't return from top-level code."))
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                let mut out = self.out.borrow_mut();
                writeln!(out, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let scope: Environment = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function: LoxFunction =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> = self.environment.clone();

        self.environment = environment;

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.environment = previous;
                return Err(e);
            }
        }

        self.environment = previous;

        Ok(())
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Exec<()> {
        // The class name exists (as nil) while the class value is built, so
        // the body can refer to it.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let value: Value = self.evaluate(expr)?;

                match value {
                    Value::Class(class) => Some(class),

                    _ => {
                        let error: LoxError = match expr {
                            Expr::Variable { name, .. } => {
                                LoxError::runtime_at(name, "Superclass must be a class.")
                            }
                            _ => LoxError::runtime("Superclass must be a class."),
                        };

                        return Err(error.into());
                    }
                }
            }

            None => None,
        };

        // Methods of a subclass close over a scope holding `super`.
        let enclosing: Option<Rc<RefCell<Environment>>> = superclass_value.as_ref().map(|class| {
            let previous: Rc<RefCell<Environment>> = self.environment.clone();

            let mut scope: Environment = Environment::with_enclosing(previous.clone());
            scope.define("super", Value::Class(class.clone()));

            self.environment = Rc::new(RefCell::new(scope));

            previous
        });

        let mut method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in methods {
            let is_initializer: bool = declaration.name.lexeme == "init";

            let method: LoxFunction =
                LoxFunction::new(declaration.clone(), self.environment.clone(), is_initializer);

            method_table.insert(declaration.name.lexeme.clone(), Rc::new(method));
        }

        let class: Rc<LoxClass> = Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            method_table,
        ));

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(class))?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(token) => Ok(self.evaluate_literal(token)?),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => Ok(self.look_up(name, *id)?),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => {
                        let assigned: bool = self.environment.borrow_mut().assign_at(
                            *distance,
                            &name.lexeme,
                            value.clone(),
                        );

                        if !assigned {
                            return Err(undefined_variable(name).into());
                        }
                    }

                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, args, paren)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        LoxInstance::get(&instance, name).ok_or_else(|| {
                            LoxError::runtime_at(
                                name,
                                format!("Undefined property '{}'.", name.lexeme),
                            )
                            .into()
                        })
                    }

                    _ => Err(LoxError::runtime_at(name, "Only instances have properties.").into()),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance.borrow_mut().set(name, value.clone());

                        Ok(value)
                    }

                    _ => Err(LoxError::runtime_at(name, "Only instances have fields.").into()),
                }
            }

            Expr::This { id, keyword } => Ok(self.look_up(keyword, *id)?),

            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        match (token.token_type, &token.literal) {
            (TokenType::NUMBER, Literal::Number(n)) => Ok(Value::Number(*n)),

            (TokenType::STRING, Literal::Str(s)) => Ok(Value::String(s.clone())),

            (TokenType::TRUE, _) => Ok(Value::Bool(true)),

            (TokenType::FALSE, _) => Ok(Value::Bool(false)),

            (TokenType::NIL, _) => Ok(Value::Nil),

            _ => Err(LoxError::runtime_at(token, "Invalid literal.")),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Exec<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime_at(operator, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime_at(operator, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime_at(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(numbers_required(operator)),
            },

            // IEEE-754 division; dividing by zero yields an infinity.
            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(numbers_required(operator)),
            },

            _ => Err(LoxError::runtime_at(operator, "Invalid binary operator.").into()),
        }
    }

    /// `and`/`or` short-circuit and yield the deciding operand itself, not a
    /// coerced boolean.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Exec<Value> {
        let left: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR if is_truthy(&left) => Ok(left),

            TokenType::AND if !is_truthy(&left) => Ok(left),

            _ => self.evaluate(right),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Exec<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(distance) => *distance,
            None => return Err(undefined_variable(keyword).into()),
        };

        let superclass: Rc<LoxClass> =
            match self.environment.borrow().get_at(distance, "super") {
                Some(Value::Class(class)) => class,
                _ => return Err(undefined_variable(keyword).into()),
            };

        // `this` always sits one scope inside the one holding `super`.
        let instance: Rc<RefCell<LoxInstance>> =
            match self.environment.borrow().get_at(distance - 1, "this") {
                Some(Value::Instance(instance)) => instance,
                _ => return Err(undefined_variable(keyword).into()),
            };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(LoxError::runtime_at(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    fn look_up(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(distance) => self
                .environment
                .borrow()
                .get_at(*distance, &name.lexeme)
                .ok_or_else(|| undefined_variable(name)),

            None => self.globals.borrow().get(name),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, paren: &Token) -> Exec<Value> {
        match callee {
            Value::NativeFunction { arity, func, .. } => {
                check_arity(arity, arguments.len(), paren)?;

                Ok(func(&arguments)?)
            }

            Value::Function(function) => {
                check_arity(function.arity(), arguments.len(), paren)?;

                self.call_function(&function, arguments)
            }

            Value::Class(class) => {
                check_arity(class.arity(), arguments.len(), paren)?;

                self.instantiate(&class, arguments)
            }

            _ => Err(LoxError::runtime_at(paren, "Can only call functions and classes.").into()),
        }
    }

    fn call_function(&mut self, function: &Rc<LoxFunction>, arguments: Vec<Value>) -> Exec<Value> {
        let mut scope: Environment = Environment::with_enclosing(function.closure.clone());

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            scope.define(&param.lexeme, argument);
        }

        let result: Exec<()> =
            self.execute_block(&function.declaration.body, Rc::new(RefCell::new(scope)));

        match result {
            Ok(()) => {
                if function.is_initializer {
                    self.initializer_this(function)
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Unwind::Return(value)) => {
                if function.is_initializer {
                    self.initializer_this(function)
                } else {
                    Ok(value)
                }
            }

            Err(e) => Err(e),
        }
    }

    /// An initializer call always yields the bound `this`, even on a bare
    /// `return;` or fall-through.
    fn initializer_this(&self, function: &Rc<LoxFunction>) -> Exec<Value> {
        function
            .closure
            .borrow()
            .get_at(0, "this")
            .ok_or_else(|| LoxError::runtime("Initializer has no bound 'this'.").into())
    }

    fn instantiate(&mut self, class: &Rc<LoxClass>, arguments: Vec<Value>) -> Exec<Value> {
        let instance: Rc<RefCell<LoxInstance>> =
            Rc::new(RefCell::new(LoxInstance::new(class.clone())));

        if let Some(initializer) = class.find_method("init") {
            let bound: Rc<LoxFunction> = Rc::new(initializer.bind(instance.clone()));

            self.call_function(&bound, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Exec<()> {
    if expected != got {
        return Err(LoxError::runtime_at(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        )
        .into());
    }

    Ok(())
}

fn numbers_required(operator: &Token) -> Unwind {
    LoxError::runtime_at(operator, "Operands must be numbers.").into()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn is_equal(left: &Value, right: &Value) -> bool {
    left == right
}

fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
