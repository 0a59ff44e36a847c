use crate::console::Console;
use crate::environment::{self, DuplicateDefinition, Environment, UnboundVariable};
use crate::special_forms::{self, FormError, SpecialForm};
use crate::types::{self, Closure, Int, Node, PrimitiveFn, PrimitiveImpl, TypeMismatch, Value};
use itertools::Itertools;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnboundVariable(environment::UnboundVariable),
    DuplicateDefinition(environment::DuplicateDefinition),
    TypeMismatch(types::TypeMismatch),
    BadArgCount(types::BadArgCount),
    BadIndex {
        operation: &'static str,
        index: Int,
        len: usize,
    },
    InvalidInput {
        form: SpecialForm,
        reason: String,
    },
    Form(FormError),
    DivideByZero(&'static str),
    RecursionLimit(usize),
    IOError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnboundVariable(UnboundVariable(s)) => {
                write!(f, "undefined variable '{}'", s.as_str())
            }
            Error::DuplicateDefinition(DuplicateDefinition(s)) => {
                write!(f, "'{}' is already defined in this scope", s.as_str())
            }
            Error::TypeMismatch(e) => write!(f, "type mismatch: {}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::BadIndex {
                operation,
                index,
                len,
            } => write!(
                f,
                "'{}': index {} out of bounds for length {}",
                operation, index, len
            ),
            Error::InvalidInput { form, reason } => {
                write!(f, "{}: invalid input: {}", form, reason)
            }
            Error::Form(e) => write!(f, "{}", e),
            Error::DivideByZero(operation) => write!(f, "'{}': cannot divide by zero", operation),
            Error::RecursionLimit(limit) => {
                write!(f, "maximum recursion depth of {} exceeded", limit)
            }
            Error::IOError(e) => write!(f, "io error: {}", e),
        }
    }
}

impl From<types::TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

impl From<FormError> for Error {
    fn from(e: FormError) -> Self {
        Self::Form(e)
    }
}

/// Deepest nesting of list evaluations. Has to fit in a 2 MiB thread stack
/// in a debug build.
pub const MAX_DEPTH: usize = 512;

thread_local! {
    static DEPTH: Cell<usize> = Cell::new(0);
}

/// Holds one level of evaluation depth until dropped.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<Self> {
        DEPTH.with(|depth| {
            if depth.get() >= MAX_DEPTH {
                return Err(Error::RecursionLimit(MAX_DEPTH));
            }
            depth.set(depth.get() + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

#[allow(non_snake_case)]
pub(crate) fn EVAL(node: &Node, env: &Rc<Environment>, console: &mut Console) -> Result {
    match node {
        Node::Literal(literal) => Ok(Value::from(literal)),
        Node::Symbol(name) => env.fetch(name).map_err(Error::UnboundVariable),
        Node::List(list) => {
            let _depth = DepthGuard::enter()?;
            let (head, args) = match list.split_first() {
                Some(split) => split,
                None => return Ok(Value::Nothing),
            };
            if let Some(form) = head.as_symbol().and_then(SpecialForm::lookup) {
                log::trace!("special form {}", node);
                return special_forms::apply(form, args, env, console);
            }
            log::trace!("apply {}", node);
            let callable = EVAL(head, env, console)?;
            let args = evaluate_sequence_elementwise(args, env, console)?;
            apply(&callable, &args, console)
        }
    }
}

pub fn evaluate_sequence_elementwise(
    seq: &[Node],
    env: &Rc<Environment>,
    console: &mut Console,
) -> Result<Vec<Value>> {
    seq.iter().map(|node| EVAL(node, env, console)).collect()
}

/// Evaluates `body` in order, giving the last value, or nothing for an empty body.
pub(crate) fn evaluate_body(body: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    let mut result = Value::Nothing;
    for node in body {
        result = EVAL(node, env, console)?;
    }
    Ok(result)
}

pub fn apply(callable: &Value, args: &[Value], console: &mut Console) -> Result {
    match callable {
        Value::Primitive(f) => call_primitive(f, args, console),
        Value::Closure(f) => call_closure(f, args, console),
        other => Err(other.expected("apply", "a function").into()),
    }
}

pub(crate) fn pretty_print_args(args: &[Value]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_primitive(func: &PrimitiveFn, args: &[Value], console: &mut Console) -> Result {
    func.arity
        .validate_for(args.len(), func.name)
        .map_err(Error::BadArgCount)?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = match func.fn_ptr {
        PrimitiveImpl::Pure(f) => f(args),
        PrimitiveImpl::Console(f) => f(args, console),
    };
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}

fn call_closure(func: &Closure, args: &[Value], console: &mut Console) -> Result {
    let env = make_closure_env(func, args);
    evaluate_body(&func.body, &env, console)
}

// Arguments are bound positionally; surplus arguments or parameters are dropped.
fn make_closure_env(func: &Closure, args: &[Value]) -> Rc<Environment> {
    if func.parameters.len() != args.len() {
        log::debug!(
            "{:?} takes {} parameters but was given {} arguments",
            func.name,
            func.parameters.len(),
            args.len()
        );
    }
    let env = Environment::spawn_from(&func.parent);
    for (key, value) in func.parameters.iter().zip(args) {
        env.set(key.clone(), value.clone());
    }
    env
}
