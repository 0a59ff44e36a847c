use crate::types::{Literal, Node, Value};
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Strings appear bare. Used by `print`, `str` and string concatenation.
    Directly,
    /// Strings are quoted. Used for list elements and REPL echo.
    ReadableRepresentation,
}

pub fn pr_str(value: &Value, mode: PrintMode) -> String {
    match value {
        Value::Nothing => String::from("nothing"),
        Value::Integer(x) => x.to_string(),
        Value::Float(x) => float_repr(*x),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => match mode {
            PrintMode::Directly => s.clone(),
            PrintMode::ReadableRepresentation => format!("\"{}\"", s),
        },
        Value::List(elements) => format!(
            "[{}]",
            elements
                .iter()
                .map(|x| pr_str(x, PrintMode::ReadableRepresentation))
                .join(", ")
        ),
        Value::Primitive(f) => format!("#<builtin {}>", f.name),
        Value::Closure(c) => match &c.name {
            Some(name) => format!("#<function {}>", name.as_str()),
            None => String::from("#<lambda>"),
        },
    }
}

// A float always shows that it is one: 4.0, not 4.
fn float_repr(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// Canonical source text for a node. Reading the output back gives an equal node.
pub fn print_node(node: &Node) -> String {
    match node {
        Node::Literal(Literal::Integer(x)) => x.to_string(),
        Node::Literal(Literal::String(s)) => format!("\"{}\"", s),
        Node::Symbol(name) => name.0.clone(),
        Node::List(elements) => format!("({})", elements.iter().map(print_node).join(" ")),
    }
}

/// One top-level form per line.
pub fn print_program(forms: &[Node]) -> String {
    forms.iter().map(print_node).join("\n")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self, PrintMode::Directly))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", print_node(self))
    }
}
