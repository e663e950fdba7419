use crate::error::{Result, RpalError};
use crate::value::Value;
use std::rc::Rc;

/// Names bound in environment 0. `Conc` is curried through
/// `Value::ConcPartial` rather than handled specially by the machine: its
/// first application returns a synthetic one-argument closure, and the
/// second `gamma` that naturally follows `Conc s1 s2` applies it.
pub const NAMES: &[&str] = &[
    "Print",
    "print",
    "Conc",
    "Stern",
    "Stem",
    "Order",
    "Isinteger",
    "Istruthvalue",
    "Isstring",
    "Istuple",
    "Isfunction",
    "ItoS",
];

/// Applies a built-in to its single argument. `print_called` is set
/// whenever `Print`/`print` fires, so the CLI can skip auto-printing the
/// final result (the explicit call already produced the program's output).
pub fn apply(name: &str, arg: Value, print_called: &mut bool) -> Result<Value> {
    match name {
        "Print" | "print" => {
            print!("{}", arg.format());
            *print_called = true;
            Ok(arg)
        }
        "Conc" => {
            let s = arg.as_str()?;
            Ok(Value::ConcPartial(s.clone()))
        }
        "Stern" => {
            let s = arg.as_str()?;
            Ok(Value::Str(Rc::from(s.chars().skip(1).collect::<String>().as_str())))
        }
        "Stem" => {
            let s = arg.as_str()?;
            let first = s.chars().next().ok_or_else(|| RpalError::Type {
                expected: "non-empty string".to_string(),
                found: "empty string".to_string(),
            })?;
            Ok(Value::Str(Rc::from(first.to_string().as_str())))
        }
        "Order" => {
            let t = arg.as_tuple()?;
            Ok(Value::Int(t.len() as i64))
        }
        "Isinteger" => Ok(Value::Bool(matches!(arg, Value::Int(_)))),
        "Istruthvalue" => Ok(Value::Bool(matches!(arg, Value::Bool(_)))),
        "Isstring" => Ok(Value::Bool(matches!(arg, Value::Str(_)))),
        "Istuple" => Ok(Value::Bool(matches!(arg, Value::Tuple(_)))),
        "Isfunction" => Ok(Value::Bool(arg.is_function())),
        "ItoS" => {
            let n = arg.as_int()?;
            Ok(Value::Str(Rc::from(n.to_string().as_str())))
        }
        other => Err(RpalError::Internal(format!("unknown built-in: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_and_stern_split_first_character() {
        let mut flag = false;
        let stem = apply("Stem", Value::Str(Rc::from("hello")), &mut flag).unwrap();
        let stern = apply("Stern", Value::Str(Rc::from("hello")), &mut flag).unwrap();
        assert_eq!(stem, Value::Str(Rc::from("h")));
        assert_eq!(stern, Value::Str(Rc::from("ello")));
    }

    #[test]
    fn order_counts_tuple_components() {
        let mut flag = false;
        let t = Value::Tuple(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(apply("Order", t, &mut flag).unwrap(), Value::Int(2));
        assert_eq!(apply("Order", Value::nil(), &mut flag).unwrap(), Value::Int(0));
    }

    #[test]
    fn itos_rejects_non_integers() {
        let mut flag = false;
        assert!(apply("ItoS", Value::Bool(true), &mut flag).is_err());
    }

    #[test]
    fn print_sets_flag_and_returns_argument() {
        let mut flag = false;
        let v = apply("Print", Value::Int(42), &mut flag).unwrap();
        assert_eq!(v, Value::Int(42));
        assert!(flag);
    }
}
