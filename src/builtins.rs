use crate::console::Console;
use crate::evaluator::{self, Error};
use crate::printer::{self, PrintMode};
use crate::types::{truthy, Arity, Int, PrimitiveFn, PrimitiveImpl, TypeMismatch, Value};
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arithmetic {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl Arithmetic {
    fn name(self) -> &'static str {
        match self {
            Arithmetic::Add => "+",
            Arithmetic::Sub => "-",
            Arithmetic::Mul => "*",
            Arithmetic::Div => "/",
            Arithmetic::FloorDiv => "div",
            Arithmetic::Mod => "mod",
        }
    }

    fn integers(self, x: Int, y: Int) -> evaluator::Result {
        use Arithmetic::*;
        if y == 0 && [Div, FloorDiv, Mod].contains(&self) {
            return Err(Error::DivideByZero(self.name()));
        }
        let value = match self {
            Add => Value::Integer(x.wrapping_add(y)),
            Sub => Value::Integer(x.wrapping_sub(y)),
            Mul => Value::Integer(x.wrapping_mul(y)),
            Div => Value::Float(x as f64 / y as f64),
            FloorDiv => {
                let q = x.wrapping_div(y);
                match x.wrapping_rem(y) != 0 && (x < 0) != (y < 0) {
                    true => Value::Integer(q - 1),
                    false => Value::Integer(q),
                }
            }
            Mod => {
                let r = x.wrapping_rem(y);
                match r != 0 && (r < 0) != (y < 0) {
                    true => Value::Integer(r + y),
                    false => Value::Integer(r),
                }
            }
        };
        Ok(value)
    }

    fn floats(self, x: f64, y: f64) -> evaluator::Result {
        use Arithmetic::*;
        if y == 0.0 && [Div, FloorDiv, Mod].contains(&self) {
            return Err(Error::DivideByZero(self.name()));
        }
        let value = match self {
            Add => x + y,
            Sub => x - y,
            Mul => x * y,
            Div => x / y,
            FloorDiv => (x / y).floor(),
            Mod => {
                let r = x % y;
                match r != 0.0 && (r < 0.0) != (y < 0.0) {
                    true => r + y,
                    false => r,
                }
            }
        };
        Ok(Value::Float(value))
    }
}

fn is_number(value: &Value) -> bool {
    value.as_float().is_some()
}

/// Applies `op` to two operands, mapping over lists. Two lists are combined
/// position by position and the longer one is cut short.
fn combine(op: Arithmetic, left: &Value, right: &Value) -> evaluator::Result {
    match (left, right) {
        (Value::List(xs), Value::List(ys)) => xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| combine(op, x, y))
            .collect::<evaluator::Result<Vec<_>>>()
            .map(Value::wrap_list),
        (Value::List(xs), y) if is_number(y) => xs
            .iter()
            .map(|x| combine(op, x, y))
            .collect::<evaluator::Result<Vec<_>>>()
            .map(Value::wrap_list),
        (x, Value::List(ys)) if is_number(x) => ys
            .iter()
            .map(|y| combine(op, x, y))
            .collect::<evaluator::Result<Vec<_>>>()
            .map(Value::wrap_list),
        (Value::Integer(x), Value::Integer(y)) => op.integers(*x, *y),
        _ => match (left.as_float(), right.as_float()) {
            (Some(x), Some(y)) => op.floats(x, y),
            _ if op == Arithmetic::Add => Ok(Value::String(format!("{}{}", left, right))),
            _ => Err(operand_mismatch(op.name(), left, right)),
        },
    }
}

fn operand_mismatch(operation: &'static str, left: &Value, right: &Value) -> Error {
    Error::TypeMismatch(TypeMismatch::Operands {
        operation,
        left: left.type_name(),
        right: right.type_name(),
    })
}

fn arithmetic_(args: &[Value], op: Arithmetic) -> evaluator::Result {
    args[1..]
        .iter()
        .try_fold(args[0].clone(), |acc, arg| combine(op, &acc, arg))
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: PrimitiveImpl::Pure(|args: &[Value]| arithmetic_(args, Arithmetic::Add)),
    arity: Arity::at_least(1),
};

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: PrimitiveImpl::Pure(|args: &[Value]| arithmetic_(args, Arithmetic::Sub)),
    arity: Arity::at_least(1),
};

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: PrimitiveImpl::Pure(|args: &[Value]| arithmetic_(args, Arithmetic::Mul)),
    arity: Arity::at_least(1),
};

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: PrimitiveImpl::Pure(|args: &[Value]| arithmetic_(args, Arithmetic::Div)),
    arity: Arity::at_least(1),
};

const FLOOR_DIV: PrimitiveFn = PrimitiveFn {
    name: "div",
    fn_ptr: PrimitiveImpl::Pure(|args: &[Value]| arithmetic_(args, Arithmetic::FloorDiv)),
    arity: Arity::at_least(1),
};

const MOD: PrimitiveFn = PrimitiveFn {
    name: "mod",
    fn_ptr: PrimitiveImpl::Pure(|args: &[Value]| arithmetic_(args, Arithmetic::Mod)),
    arity: Arity::at_least(1),
};

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => left.as_float()?.partial_cmp(&right.as_float()?),
    }
}

fn lt(left: &Value, right: &Value) -> Option<bool> {
    ordering(left, right).map(|o| o == Ordering::Less)
}

fn le(left: &Value, right: &Value) -> Option<bool> {
    ordering(left, right).map(|o| o != Ordering::Greater)
}

fn gt(left: &Value, right: &Value) -> Option<bool> {
    ordering(left, right).map(|o| o == Ordering::Greater)
}

fn ge(left: &Value, right: &Value) -> Option<bool> {
    ordering(left, right).map(|o| o != Ordering::Less)
}

fn eq(left: &Value, right: &Value) -> Option<bool> {
    Some(left == right)
}

fn ne(left: &Value, right: &Value) -> Option<bool> {
    Some(left != right)
}

type Comparison = fn(&Value, &Value) -> Option<bool>;

fn compare(
    name: &'static str,
    comp: Comparison,
    left: &Value,
    right: &Value,
) -> evaluator::Result {
    match (left, right) {
        (Value::List(xs), Value::List(ys)) => xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| compare(name, comp, x, y))
            .collect::<evaluator::Result<Vec<_>>>()
            .map(Value::wrap_list),
        (Value::List(xs), y) => xs
            .iter()
            .map(|x| compare(name, comp, x, y))
            .collect::<evaluator::Result<Vec<_>>>()
            .map(Value::wrap_list),
        (x, Value::List(ys)) => ys
            .iter()
            .map(|y| compare(name, comp, x, y))
            .collect::<evaluator::Result<Vec<_>>>()
            .map(Value::wrap_list),
        _ => comp(left, right)
            .map(Value::Bool)
            .ok_or_else(|| operand_mismatch(name, left, right)),
    }
}

fn comparison_(args: &[Value], name: &'static str, comp: Comparison) -> evaluator::Result {
    compare(name, comp, &args[0], &args[1])
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: PrimitiveImpl::Pure(
                    |args: &[Value]| comparison_(args, stringify!($SYMBOL), [<$NAME:lower>])
                ),
                arity: Arity::exactly(2),
            };
        }
    };
}

comparison_primitive!(<, LT);
comparison_primitive!(<=, LE);
comparison_primitive!(>, GT);
comparison_primitive!(>=, GE);
comparison_primitive!(=, EQ);
comparison_primitive!(!=, NE);

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    fn_ptr: PrimitiveImpl::Pure(not_),
    arity: Arity::exactly(1),
};

fn not_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Bool(!truthy(&args[0])))
}

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: PrimitiveImpl::Pure(list_),
    arity: Arity::at_least(0),
};

fn list_(args: &[Value]) -> evaluator::Result {
    Ok(Value::wrap_list(args.to_vec()))
}

fn index_into(operation: &'static str, len: usize, index: Int) -> evaluator::Result<usize> {
    match index >= 0 && (index as usize) < len {
        true => Ok(index as usize),
        false => Err(Error::BadIndex {
            operation,
            index,
            len,
        }),
    }
}

const GET: PrimitiveFn = PrimitiveFn {
    name: "get",
    fn_ptr: PrimitiveImpl::Pure(get_),
    arity: Arity::exactly(2),
};

fn get_(args: &[Value]) -> evaluator::Result {
    let index = args[1].as_int("get")?;
    match &args[0] {
        Value::List(xs) => Ok(xs[index_into("get", xs.len(), index)?].clone()),
        Value::String(s) => {
            let chars = s.chars().collect_vec();
            let c = chars[index_into("get", chars.len(), index)?];
            Ok(Value::String(c.to_string()))
        }
        other => Err(other.expected("get", "a list or string").into()),
    }
}

const LENGTH: PrimitiveFn = PrimitiveFn {
    name: "length",
    fn_ptr: PrimitiveImpl::Pure(length_),
    arity: Arity::exactly(1),
};

fn length_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::List(xs) => Ok(Value::Integer(xs.len() as Int)),
        Value::String(s) => Ok(Value::Integer(s.chars().count() as Int)),
        other => Err(other.expected("length", "a list or string").into()),
    }
}

const HEAD: PrimitiveFn = PrimitiveFn {
    name: "head",
    fn_ptr: PrimitiveImpl::Pure(head_),
    arity: Arity::exactly(1),
};

fn head_(args: &[Value]) -> evaluator::Result {
    let xs = args[0].as_list("head")?;
    Ok(xs.first().cloned().unwrap_or(Value::Nothing))
}

const TAIL: PrimitiveFn = PrimitiveFn {
    name: "tail",
    fn_ptr: PrimitiveImpl::Pure(tail_),
    arity: Arity::exactly(1),
};

fn tail_(args: &[Value]) -> evaluator::Result {
    let xs = args[0].as_list("tail")?;
    match xs.len() {
        0 | 1 => Ok(Value::new_list()),
        _ => Ok(Value::wrap_list(xs[1..].to_vec())),
    }
}

const APPEND: PrimitiveFn = PrimitiveFn {
    name: "append",
    fn_ptr: PrimitiveImpl::Pure(append_),
    arity: Arity::exactly(2),
};

fn append_(args: &[Value]) -> evaluator::Result {
    match (&args[0], &args[1]) {
        (Value::List(xs), Value::List(ys)) => Ok(Value::wrap_list(
            xs.iter().chain(ys.iter()).cloned().collect(),
        )),
        (Value::String(x), Value::String(y)) => Ok(Value::String(format!("{}{}", x, y))),
        (x, y) => Err(operand_mismatch("append", x, y)),
    }
}

const REVERSE: PrimitiveFn = PrimitiveFn {
    name: "reverse",
    fn_ptr: PrimitiveImpl::Pure(reverse_),
    arity: Arity::exactly(1),
};

fn reverse_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::List(xs) => Ok(Value::wrap_list(xs.iter().rev().cloned().collect())),
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        other => Err(other.expected("reverse", "a list or string").into()),
    }
}

/// `(push x xs)` is a new list with `x` in front of the elements of `xs`.
const PUSH: PrimitiveFn = PrimitiveFn {
    name: "push",
    fn_ptr: PrimitiveImpl::Pure(push_),
    arity: Arity::exactly(2),
};

fn push_(args: &[Value]) -> evaluator::Result {
    let xs = args[1].as_list("push")?;
    let mut pushed = Vec::with_capacity(xs.len() + 1);
    pushed.push(args[0].clone());
    pushed.extend(xs.iter().cloned());
    Ok(Value::wrap_list(pushed))
}

const EMPTY_TEST: PrimitiveFn = PrimitiveFn {
    name: "empty?",
    fn_ptr: PrimitiveImpl::Pure(empty_test_),
    arity: Arity::exactly(1),
};

fn empty_test_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::List(xs) => Ok(Value::Bool(xs.is_empty())),
        Value::String(s) => Ok(Value::Bool(s.is_empty())),
        other => Err(other.expected("empty?", "a list or string").into()),
    }
}

const TO_LIST: PrimitiveFn = PrimitiveFn {
    name: "to-list",
    fn_ptr: PrimitiveImpl::Pure(to_list_),
    arity: Arity::exactly(1),
};

fn to_list_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => Ok(Value::wrap_list(
            s.chars().map(|c| Value::String(c.to_string())).collect(),
        )),
        Value::List(xs) => Ok(Value::wrap_list(xs.to_vec())),
        other => Err(other.expected("to-list", "a string or list").into()),
    }
}

const TO_LOWER: PrimitiveFn = PrimitiveFn {
    name: "to-lower",
    fn_ptr: PrimitiveImpl::Pure(to_lower_),
    arity: Arity::exactly(1),
};

const TO_UPPER: PrimitiveFn = PrimitiveFn {
    name: "to-upper",
    fn_ptr: PrimitiveImpl::Pure(to_upper_),
    arity: Arity::exactly(1),
};

fn to_lower_(args: &[Value]) -> evaluator::Result {
    Ok(Value::String(args[0].as_string("to-lower")?.to_lowercase()))
}

fn to_upper_(args: &[Value]) -> evaluator::Result {
    Ok(Value::String(args[0].as_string("to-upper")?.to_uppercase()))
}

const GET_ASCII: PrimitiveFn = PrimitiveFn {
    name: "get-ascii",
    fn_ptr: PrimitiveImpl::Pure(get_ascii_),
    arity: Arity::exactly(1),
};

fn get_ascii_(args: &[Value]) -> evaluator::Result {
    let s = args[0].as_string("get-ascii")?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Integer(c as Int)),
        _ => Err(args[0]
            .expected("get-ascii", "a single-character string")
            .into()),
    }
}

const STR: PrimitiveFn = PrimitiveFn {
    name: "str",
    fn_ptr: PrimitiveImpl::Pure(str_),
    arity: Arity::at_least(0),
};

fn str_(args: &[Value]) -> evaluator::Result {
    let text = args
        .iter()
        .map(|arg| printer::pr_str(arg, PrintMode::Directly))
        .join("");
    Ok(Value::String(text))
}

const ALL_UNIQUE: PrimitiveFn = PrimitiveFn {
    name: "all-unique",
    fn_ptr: PrimitiveImpl::Pure(all_unique_),
    arity: Arity::exactly(1),
};

/// First occurrences only, in their original order.
fn all_unique_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.chars().unique().collect())),
        Value::List(xs) => {
            let mut seen: Vec<Value> = Vec::new();
            for x in xs.iter() {
                if !seen.contains(x) {
                    seen.push(x.clone());
                }
            }
            Ok(Value::wrap_list(seen))
        }
        other => Err(other.expected("all-unique", "a list or string").into()),
    }
}

const PRINT: PrimitiveFn = PrimitiveFn {
    name: "print",
    fn_ptr: PrimitiveImpl::Console(print_),
    arity: Arity::at_least(0),
};

fn print_(args: &[Value], console: &mut Console) -> evaluator::Result {
    let text = args
        .iter()
        .map(|arg| printer::pr_str(arg, PrintMode::Directly))
        .join(" ");
    console.write_line(&text)?;
    Ok(Value::Nothing)
}

static PRIMITIVES: &[PrimitiveFn] = &[
    // Arithmetic
    SUM,
    SUB,
    MUL,
    DIV,
    FLOOR_DIV,
    MOD,
    // Comparisons
    LT,
    LE,
    GT,
    GE,
    EQ,
    NE,
    NOT,
    // Working with lists
    LIST,
    GET,
    LENGTH,
    HEAD,
    TAIL,
    APPEND,
    REVERSE,
    PUSH,
    EMPTY_TEST,
    // Working with strings
    TO_LIST,
    TO_LOWER,
    TO_UPPER,
    GET_ASCII,
    STR,
    ALL_UNIQUE,
    // Other
    PRINT,
];

type Namespace = HashMap<&'static str, &'static PrimitiveFn>;
lazy_static! {
    pub static ref CORE: Namespace = PRIMITIVES.iter().map(|func| (func.name, func)).collect();
}
