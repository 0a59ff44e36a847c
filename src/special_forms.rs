use crate::console::Console;
use crate::environment::Environment;
use crate::evaluator::{evaluate_body, Error, Result, EVAL};
use crate::types::{truthy, Arity, Closure, Int, Node, Symbol, Value};
use bimap::BiMap;
use std::fmt;
use std::rc::Rc;

/// The list heads the evaluator treats as syntax. Their names are reserved: a
/// variable called `if` can be defined but never read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    Define,
    Set,
    If,
    Lambda,
    Func,
    Begin,
    While,
    For,
    And,
    Or,
    ReadLine,
    ReadInt,
    ReadInts,
}

lazy_static! {
    static ref NAMES: BiMap<String, SpecialForm> = {
        use SpecialForm::*;
        let mut m = BiMap::new();
        for &(name, form) in [
            ("define", Define),
            ("set", Set),
            ("if", If),
            ("lambda", Lambda),
            ("func", Func),
            ("begin", Begin),
            ("while", While),
            ("for", For),
            ("and", And),
            ("or", Or),
            ("read-line", ReadLine),
            ("read-int", ReadInt),
            ("read-ints", ReadInts),
        ]
        .iter()
        {
            m.insert(name.to_owned(), form);
        }
        m
    };
}

impl SpecialForm {
    pub fn lookup(name: &Symbol) -> Option<Self> {
        NAMES.get_by_left(&name.0).copied()
    }

    pub fn name(self) -> &'static str {
        NAMES.get_by_right(&self).map_or("?", String::as_str)
    }
}

impl fmt::Display for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug)]
pub enum FormErrorKind {
    NameNotASymbol,
    ParametersNotAList,
    ParameterNotASymbol,
}

#[derive(Debug)]
pub struct FormError {
    pub form: SpecialForm,
    pub kind: FormErrorKind,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            FormErrorKind::NameNotASymbol => "expected a variable name",
            FormErrorKind::ParametersNotAList => "expected a parenthesised parameter list",
            FormErrorKind::ParameterNotASymbol => "every parameter must be a name",
        };
        write!(f, "{}: {}", self.form, reason)
    }
}

fn check_arity(form: SpecialForm, arity: Arity, args: &[Node]) -> Result<()> {
    arity
        .validate_for(args.len(), form.name())
        .map_err(Error::BadArgCount)
}

fn expect_name(form: SpecialForm, node: &Node) -> Result<&Symbol> {
    node.as_symbol().ok_or_else(|| {
        Error::Form(FormError {
            form,
            kind: FormErrorKind::NameNotASymbol,
        })
    })
}

fn expect_parameters(form: SpecialForm, node: &Node) -> Result<Vec<Symbol>> {
    let error = |kind| Error::Form(FormError { form, kind });
    node.as_list()
        .ok_or_else(|| error(FormErrorKind::ParametersNotAList))?
        .iter()
        .map(|p| {
            p.as_symbol()
                .cloned()
                .ok_or_else(|| error(FormErrorKind::ParameterNotASymbol))
        })
        .collect()
}

pub fn apply(
    form: SpecialForm,
    args: &[Node],
    env: &Rc<Environment>,
    console: &mut Console,
) -> Result {
    use SpecialForm::*;
    match form {
        Define => apply_define(args, env, console),
        Set => apply_set(args, env, console),
        If => apply_if(args, env, console),
        Lambda => apply_lambda(args, env),
        Func => apply_func(args, env),
        Begin => evaluate_body(args, env, console),
        While => apply_while(args, env, console),
        For => apply_for(args, env, console),
        And => apply_and(args, env, console),
        Or => apply_or(args, env, console),
        ReadLine => apply_read_line(args, env, console),
        ReadInt => apply_read_int(args, env, console),
        ReadInts => apply_read_ints(args, env, console),
    }
}

pub fn apply_define(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    check_arity(SpecialForm::Define, Arity::exactly(2), args)?;
    let key = expect_name(SpecialForm::Define, &args[0])?;
    let value = EVAL(&args[1], env, console)?;
    env.define(key, value.clone()).map_err(Error::DuplicateDefinition)?;
    log::debug!("define {} as {}", key.as_str(), value);
    Ok(value)
}

pub fn apply_set(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    check_arity(SpecialForm::Set, Arity::exactly(2), args)?;
    let key = expect_name(SpecialForm::Set, &args[0])?;
    let value = EVAL(&args[1], env, console)?;
    env.assign(key, value.clone()).map_err(Error::UnboundVariable)?;
    Ok(value)
}

pub fn apply_if(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    check_arity(SpecialForm::If, Arity::Between(2..=3), args)?;
    let condition = EVAL(&args[0], env, console)?;
    if truthy(&condition) {
        EVAL(&args[1], env, console)
    } else if args.len() == 3 {
        EVAL(&args[2], env, console)
    } else {
        Ok(Value::Nothing)
    }
}

fn make_closure(
    form: SpecialForm,
    name: Option<Symbol>,
    parameters: &Node,
    body: &[Node],
    env: &Rc<Environment>,
) -> Result {
    let closure = Closure {
        name,
        parameters: expect_parameters(form, parameters)?,
        body: body.to_vec(),
        parent: env.clone(),
    };
    Ok(Value::Closure(Rc::new(closure)))
}

pub fn apply_lambda(args: &[Node], env: &Rc<Environment>) -> Result {
    check_arity(SpecialForm::Lambda, Arity::at_least(1), args)?;
    make_closure(SpecialForm::Lambda, None, &args[0], &args[1..], env)
}

/// `(func name (p...) body...)` is `(define name (lambda (p...) body...))`.
pub fn apply_func(args: &[Node], env: &Rc<Environment>) -> Result {
    check_arity(SpecialForm::Func, Arity::at_least(2), args)?;
    let key = expect_name(SpecialForm::Func, &args[0])?;
    let closure = make_closure(
        SpecialForm::Func,
        Some(key.clone()),
        &args[1],
        &args[2..],
        env,
    )?;
    env.define(key, closure.clone()).map_err(Error::DuplicateDefinition)?;
    log::debug!("define function {}", key.as_str());
    Ok(closure)
}

pub fn apply_while(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    check_arity(SpecialForm::While, Arity::at_least(1), args)?;
    let (condition, body) = (&args[0], &args[1..]);
    let mut result = Value::Nothing;
    while truthy(&EVAL(condition, env, console)?) {
        result = evaluate_body(body, env, console)?;
    }
    Ok(result)
}

pub fn apply_for(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    check_arity(SpecialForm::For, Arity::at_least(3), args)?;
    let key = expect_name(SpecialForm::For, &args[0])?;
    let start = EVAL(&args[1], env, console)?.as_int("for")?;
    let end = EVAL(&args[2], env, console)?.as_int("for")?;
    let body = &args[3..];
    let mut result = Value::Nothing;
    for i in start..end {
        let scope = Environment::spawn_from(env);
        scope.set(key.clone(), Value::Integer(i));
        result = evaluate_body(body, &scope, console)?;
    }
    Ok(result)
}

pub fn apply_and(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    let mut result = Value::Bool(true);
    for arg in args {
        result = EVAL(arg, env, console)?;
        if !truthy(&result) {
            break;
        }
    }
    Ok(result)
}

pub fn apply_or(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    let mut result = Value::Bool(false);
    for arg in args {
        result = EVAL(arg, env, console)?;
        if truthy(&result) {
            break;
        }
    }
    Ok(result)
}

fn invalid_input(form: SpecialForm, reason: impl Into<String>) -> Error {
    Error::InvalidInput {
        form,
        reason: reason.into(),
    }
}

fn parse_int(form: SpecialForm, token: &str) -> Result<Int> {
    token
        .parse::<Int>()
        .map_err(|_| invalid_input(form, format!("'{}' is not an integer", token)))
}

pub fn apply_read_line(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    let form = SpecialForm::ReadLine;
    check_arity(form, Arity::exactly(1), args)?;
    let key = expect_name(form, &args[0])?;
    let line = console
        .read_line()?
        .ok_or_else(|| invalid_input(form, "unexpected end of input"))?;
    let value = Value::String(line);
    env.define_or_assign(key, value.clone());
    Ok(value)
}

pub fn apply_read_int(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    let form = SpecialForm::ReadInt;
    check_arity(form, Arity::at_least(1), args)?;
    let mut value = Value::Nothing;
    for arg in args {
        let key = expect_name(form, arg)?;
        let token = console
            .next_token()?
            .ok_or_else(|| invalid_input(form, "unexpected end of input"))?;
        value = Value::Integer(parse_int(form, &token)?);
        env.define_or_assign(key, value.clone());
    }
    Ok(value)
}

/// Reads one line of integers. A single name receives the whole list; several
/// names receive one integer each.
pub fn apply_read_ints(args: &[Node], env: &Rc<Environment>, console: &mut Console) -> Result {
    let form = SpecialForm::ReadInts;
    check_arity(form, Arity::at_least(1), args)?;
    let keys = args
        .iter()
        .map(|arg| expect_name(form, arg))
        .collect::<Result<Vec<_>>>()?;
    let line = console
        .read_line()?
        .ok_or_else(|| invalid_input(form, "unexpected end of input"))?;
    let numbers = line
        .split_whitespace()
        .map(|token| parse_int(form, token))
        .collect::<Result<Vec<_>>>()?;

    if let [key] = keys.as_slice() {
        let value = Value::wrap_list(numbers.into_iter().map(Value::Integer).collect());
        env.define_or_assign(key, value.clone());
        return Ok(value);
    }
    if numbers.len() < keys.len() {
        return Err(invalid_input(
            form,
            format!("expected {} integers, found {}", keys.len(), numbers.len()),
        ));
    }
    for (key, &number) in keys.iter().zip(&numbers) {
        env.define_or_assign(key, Value::Integer(number));
    }
    Ok(Value::wrap_list(
        numbers.into_iter().map(Value::Integer).collect(),
    ))
}
