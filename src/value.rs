use crate::control::BoundVar;
use crate::error::RpalError;
use std::fmt;
use std::rc::Rc;

/// A runtime value produced by the CSE machine. Tuples and strings are
/// reference-counted so sharing them across closures and stack frames is
/// cheap; everything else is small enough to copy.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
    Tuple(Rc<Vec<Value>>),
    Closure {
        k: usize,
        bv: BoundVar,
        env: usize,
    },
    /// Produced only by applying `Y*` to a closure (rule 12); its sole
    /// purpose is to be applied again, which triggers the eta-expansion
    /// step that materializes the recursive call (rule 13).
    YClosure {
        k: usize,
        bv: BoundVar,
        env: usize,
    },
    Builtin(&'static str),
    /// `Conc`'s first application, curried: a synthetic one-argument
    /// closure awaiting the second string.
    ConcPartial(Rc<str>),
    /// The `Y*` fixed-point operator itself, as a value, produced by
    /// reducing the `Y*` control item and consumed only by `gamma`.
    YStar,
}

impl Value {
    pub fn nil() -> Value {
        Value::Tuple(Rc::new(Vec::new()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "truth value",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::Closure { .. } => "function",
            Value::YClosure { .. } => "function",
            Value::Builtin(_) => "function",
            Value::ConcPartial(_) => "function",
            Value::YStar => "function",
        }
    }

    pub fn type_error(expected: &str, found: &Value) -> RpalError {
        RpalError::Type {
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    pub fn as_int(&self) -> Result<i64, RpalError> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(Value::type_error("integer", self)),
        }
    }

    pub fn as_str(&self) -> Result<&Rc<str>, RpalError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(Value::type_error("string", self)),
        }
    }

    pub fn as_tuple(&self) -> Result<&Rc<Vec<Value>>, RpalError> {
        match self {
            Value::Tuple(t) => Ok(t),
            _ => Err(Value::type_error("tuple", self)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, RpalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(Value::type_error("truth value", self)),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Value::Closure { .. } | Value::YClosure { .. } | Value::Builtin(_)
        )
    }

    /// Renders a value the way the interpreter's final output does:
    /// truth-values lowercase, strings raw, tuples parenthesized and
    /// comma-separated (the empty tuple prints as `()`, matching `nil`).
    pub fn format(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::format).collect();
                format!("({})", inner.join(", "))
            }
            Value::Closure { k, bv, .. } | Value::YClosure { k, bv, .. } => {
                format!("[lambda closure: {}: {}]", format_bv(bv), k)
            }
            Value::Builtin(name) => name.to_string(),
            Value::ConcPartial(_) => "[lambda closure: Conc: partial]".to_string(),
            Value::YStar => "Y*".to_string(),
        }
    }
}

fn format_bv(bv: &BoundVar) -> String {
    match bv {
        BoundVar::Single(name) => name.to_string(),
        BoundVar::Multi(names) => names.join(","),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Closure { k: k1, env: e1, .. }, Value::Closure { k: k2, env: e2, .. }) => {
                k1 == k2 && e1 == e2
            }
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::YStar, Value::YStar) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_nested_tuple() {
        let v = Value::Tuple(Rc::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        assert_eq!(v.format(), "(1, 2, 3)");
    }

    #[test]
    fn formats_singleton_tuple_without_trailing_comma() {
        let v = Value::Tuple(Rc::new(vec![Value::Int(5)]));
        assert_eq!(v.format(), "(5)");
    }

    #[test]
    fn nil_is_empty_tuple() {
        assert_eq!(Value::nil().format(), "()");
    }

    #[test]
    fn truth_values_print_lowercase() {
        assert_eq!(Value::Bool(true).format(), "true");
        assert_eq!(Value::Bool(false).format(), "false");
    }

    #[test]
    fn equality_is_structural_for_tuples() {
        let a = Value::Tuple(Rc::new(vec![Value::Int(1), Value::Str(Rc::from("x"))]));
        let b = Value::Tuple(Rc::new(vec![Value::Int(1), Value::Str(Rc::from("x"))]));
        assert_eq!(a, b);
    }
}
