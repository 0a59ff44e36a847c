use crate::console::Console;
use crate::environment::Environment;
use crate::evaluator::{self, EVAL};
use crate::reader;
use crate::types::{Symbol, Value};
use std::fmt;
use std::rc::Rc;

/// Each top-level result is bound to this name in the session scope.
pub const LAST_RESULT: &str = "_";

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "syntax error: {}", e),
            Error::Eval(e) => write!(f, "runtime error: {}", e),
        }
    }
}

impl From<reader::Error> for Error {
    fn from(e: reader::Error) -> Self {
        Self::Read(e)
    }
}

impl From<evaluator::Error> for Error {
    fn from(e: evaluator::Error) -> Self {
        Self::Eval(e)
    }
}

pub struct Interpreter {
    globals: Rc<Environment>,
    console: Console,
    last_result: Value,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_console(Console::stdio())
    }

    pub fn with_console(console: Console) -> Self {
        Self {
            globals: Rc::new(Environment::default()),
            console,
            last_result: Value::Nothing,
        }
    }

    /// A new scope directly below the builtins. Definitions made through one
    /// session are invisible to every other session.
    pub fn session(&self) -> Rc<Environment> {
        Environment::spawn_from(&self.globals)
    }

    /// Runs `source` in a session of its own.
    pub fn interpret(&mut self, source: &str) -> Result {
        let scope = self.session();
        self.interpret_in(source, &scope)
    }

    /// Runs every top-level form of `source` in `scope`, stopping at the first
    /// error. Gives the value of the last form, or nothing for an empty source.
    pub fn interpret_in(&mut self, source: &str, scope: &Rc<Environment>) -> Result {
        let forms = reader::read_str(source)?;
        log::debug!("read {} top-level forms", forms.len());
        let last = Symbol::from(LAST_RESULT);
        let mut result = Value::Nothing;
        for form in &forms {
            result = EVAL(form, scope, &mut self.console)?;
            scope.define_or_assign(&last, result.clone());
            self.last_result = result.clone();
        }
        Ok(result)
    }

    pub fn last_result(&self) -> &Value {
        &self.last_result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
