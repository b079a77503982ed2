use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::Result;
use crate::stmt::FunctionDecl;
use crate::token::Token;

/// Runtime value produced and consumed by the evaluator.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value>,
    },
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<LoxInstance>>),
}

// Primitives compare by value, reference types by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

            (
                Value::NativeFunction { func: a, .. },
                Value::NativeFunction { func: b, .. },
            ) => a == b,

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(fun) => write!(f, "<fn {}>", fun.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class.name)
            }
        }
    }
}

/// A user function paired with the environment captured at its declaration
/// site. The closure reference never changes for the lifetime of the value.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this method whose closure starts with a one-entry
    /// scope binding `this` to the given instance.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut scope: Environment = Environment::with_enclosing(self.closure.clone());
        scope.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: Rc::new(RefCell::new(scope)),
            is_initializer: self.is_initializer,
        }
    }
}

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Method lookup walks the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned().or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name))
        })
    }

    /// A class is called like a function; its arity is its initializer's.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property access: fields shadow methods; found methods come back bound
    /// to this instance. `None` when the name is neither.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Option<Value> {
        if let Some(field) = instance.borrow().fields.get(&name.lexeme) {
            return Some(field.clone());
        }

        let method: Rc<LoxFunction> = instance.borrow().class.find_method(&name.lexeme)?;

        Some(Value::Function(Rc::new(method.bind(instance.clone()))))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
