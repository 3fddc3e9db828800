use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};

/// Every value a script can produce.  Reference kinds share their payload,
/// so copying a value never copies a function, class or instance.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// The callable capability, for functions, natives and classes.
    pub fn as_callable(&self) -> Option<Rc<dyn Callable>> {
        match self {
            Value::NativeFunction(native) => Some(Rc::clone(native) as Rc<dyn Callable>),
            Value::Function(function) => Some(Rc::clone(function) as Rc<dyn Callable>),
            Value::Class(class) => Some(Rc::clone(class) as Rc<dyn Callable>),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::NativeFunction(_) | Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    /// Values of different kinds are never equal; reference kinds compare
    /// by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write!(f, "{}", format_number(*n)),

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name()),

            Value::Instance(instance) => write!(f, "{} instance", instance.class().name()),
        }
    }
}

/// Shortest round-tripping form of `n`: integral values print without a
/// fraction (`10`), and magnitudes below 1e-4 or from 1e16 up switch to
/// exponent notation with a signed, two-digit exponent (`1e+21`, `1e-07`).
pub fn format_number(n: f64) -> String {
    if !n.is_finite() || n == 0.0 {
        return n.to_string();
    }

    let scientific: String = format!("{:e}", n);

    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return n.to_string();
    };

    match exponent.parse::<i32>() {
        Ok(exp) if !(-4..16).contains(&exp) => {
            let sign: char = if exp < 0 { '-' } else { '+' };

            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => n.to_string(),
    }
}
