use crate::console::Console;
use crate::environment::Environment;
use crate::evaluator;
use derive_more::{Deref, DerefMut};
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type Int = i64;

#[derive(Deref, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Symbol(pub String);

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol(name.to_owned())
    }
}

/// A decoded NUMBER or STRING token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(Int),
    String(String),
}

#[derive(Deref, DerefMut, Debug, PartialEq)]
pub struct NodeList(pub Vec<Node>);

/// One node of the tree produced by the reader. Code and data share this shape;
/// special forms are only told apart from calls at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Literal),
    Symbol(Symbol),
    List(Rc<NodeList>),
}

impl Node {
    pub fn wrap_list(elements: Vec<Node>) -> Self {
        Self::List(Rc::new(NodeList(elements)))
    }

    pub fn new_symbol(name: &str) -> Self {
        Self::Symbol(Symbol::from(name))
    }

    pub(crate) fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Node::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

/// Most primitives are pure functions of their arguments; the few that talk to
/// the outside world are handed the console.
pub enum PrimitiveImpl {
    Pure(fn(&[Value]) -> evaluator::Result),
    Console(fn(&[Value], &mut Console) -> evaluator::Result),
}

pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: PrimitiveImpl,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

#[derive(Clone)]
pub struct Closure {
    pub name: Option<Symbol>,
    pub parameters: Vec<Symbol>,
    pub body: Vec<Node>,
    pub parent: Rc<Environment>,
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{name: {:?}, parameters: {:?}, body: {:?}}}",
            self.name, self.parameters, self.body
        )
    }
}

#[derive(Deref, DerefMut, Debug)]
pub struct ValueList(pub Vec<Value>);

#[derive(Debug, Clone)]
pub enum Value {
    Nothing,
    Integer(Int),
    Float(f64),
    Bool(bool),
    String(String),
    List(Rc<ValueList>),
    Primitive(&'static PrimitiveFn),
    Closure(Rc<Closure>),
}

/// Only boolean `false` is falsy.
pub(crate) fn truthy(value: &Value) -> bool {
    use Value::*;
    match value {
        Nothing | Integer(_) | Float(_) | String(_) | List(_) | Primitive(_) | Closure(_) => true,
        Bool(t) => *t,
    }
}

#[derive(Debug)]
pub enum TypeMismatch {
    Expected {
        operation: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    Operands {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeMismatch::Expected {
                operation,
                expected,
                got,
            } => write!(f, "'{}' expected {}, got {}", operation, expected, got),
            TypeMismatch::Operands {
                operation,
                left,
                right,
            } => write!(
                f,
                "unsupported operands for '{}': {} and {}",
                operation, left, right
            ),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nothing => "nothing",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Primitive(_) => "builtin",
            Value::Closure(_) => "function",
        }
    }

    pub(crate) fn as_int(&self, operation: &'static str) -> Result<Int, TypeMismatch> {
        match self {
            Value::Integer(x) => Ok(*x),
            _ => Err(self.expected(operation, "an integer")),
        }
    }

    pub(crate) fn as_string(&self, operation: &'static str) -> Result<&str, TypeMismatch> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.expected(operation, "a string")),
        }
    }

    pub(crate) fn as_list(&self, operation: &'static str) -> Result<&[Value], TypeMismatch> {
        match self {
            Value::List(xs) => Ok(xs),
            _ => Err(self.expected(operation, "a list")),
        }
    }

    pub(crate) fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(x) => Some(*x as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub(crate) fn expected(&self, operation: &'static str, expected: &'static str) -> TypeMismatch {
        TypeMismatch::Expected {
            operation,
            expected,
            got: self.type_name(),
        }
    }

    pub fn is_nothing(&self) -> bool {
        match self {
            Value::Nothing => true,
            _ => false,
        }
    }

    pub fn new_list() -> Self {
        Self::List(Rc::new(ValueList(Vec::new())))
    }

    pub fn wrap_list(elements: Vec<Value>) -> Self {
        Self::List(Rc::new(ValueList(elements)))
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Integer(x) => Value::Integer(*x),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<Int> for Value {
    fn from(x: Int) -> Self {
        Value::Integer(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Value::wrap_list(elements)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Integer(x), Integer(y)) => x == y,
            (Integer(_), Float(_)) | (Float(_), Integer(_)) | (Float(_), Float(_)) => {
                self.as_float() == other.as_float()
            }
            (Bool(x), Bool(y)) => x == y,
            (String(x), String(y)) => x == y,
            (List(x), List(y)) => x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| a == b),
            (Primitive(x), Primitive(y)) => std::ptr::eq(*x, *y),
            (Closure(x), Closure(y)) => Rc::ptr_eq(x, y),
            (Nothing, Nothing) => true,
            (_, _) => false,
        }
    }
}
