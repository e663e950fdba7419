use crate::builtins;
use crate::ast::{BinOp, UnOp};
use crate::control::{BoundVar, ControlItem, ControlTable};
use crate::env::EnvArena;
use crate::error::{Result, RpalError};
use crate::value::Value;
use std::rc::Rc;

/// An entry on the value stack: either a real value, or a sentinel marking
/// the boundary of a call frame (matched against its `EnvMarker` control
/// item on the way out, rule 5).
#[derive(Debug, Clone)]
enum StackItem {
    Value(Value),
    EnvMarker(usize),
}

/// The control-stack-environment machine. Owns the environment arena and
/// the two runtime stacks; `table` is the read-only control-structure
/// family produced by [`crate::control::build`].
pub struct Machine<'a> {
    table: &'a ControlTable,
    control: Vec<ControlItem>,
    stack: Vec<StackItem>,
    env: EnvArena,
    current_env: usize,
    print_called: bool,
}

impl<'a> Machine<'a> {
    pub fn new(table: &'a ControlTable) -> Self {
        let mut env = EnvArena::new();
        for name in builtins::NAMES {
            env.define(0, Rc::from(*name), Value::Builtin(name));
        }
        env.define(0, Rc::from("Y*"), Value::YStar);

        let mut control = Vec::new();
        control.push(ControlItem::EnvMarker(0));
        control.extend(table[0].iter().cloned());

        let stack = vec![StackItem::EnvMarker(0)];

        Machine {
            table,
            control,
            stack,
            env,
            current_env: 0,
            print_called: false,
        }
    }

    /// Runs the machine to completion and returns the program's final
    /// value along with whether `Print`/`print` fired during evaluation.
    pub fn run(mut self) -> Result<(Value, bool)> {
        while let Some(item) = self.control.pop() {
            log::trace!("control: {item:?}, current_env: {}", self.current_env);
            self.step(item)?;
        }
        let result = self.pop_value()?;
        Ok((result, self.print_called))
    }

    fn step(&mut self, item: ControlItem) -> Result<()> {
        match item {
            ControlItem::Int(n) => self.stack.push(StackItem::Value(Value::Int(n))),
            ControlItem::Str(s) => self.stack.push(StackItem::Value(Value::Str(s))),
            ControlItem::Bool(b) => self.stack.push(StackItem::Value(Value::Bool(b))),
            ControlItem::Nil => self.stack.push(StackItem::Value(Value::nil())),
            ControlItem::YStar => self.stack.push(StackItem::Value(Value::YStar)),
            ControlItem::Ident(name) => {
                let value = self
                    .env
                    .lookup(self.current_env, &name)
                    .cloned()
                    .ok_or_else(|| RpalError::UndefinedVariable(name.to_string()))?;
                self.stack.push(StackItem::Value(value));
            }
            ControlItem::Lambda(k, bv) => self.stack.push(StackItem::Value(Value::Closure {
                k,
                bv,
                env: self.current_env,
            })),
            ControlItem::Tau(n) => {
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(self.pop_value()?);
                }
                self.stack.push(StackItem::Value(Value::Tuple(Rc::new(items))));
            }
            ControlItem::BinOp(op) => {
                let a = self.pop_value()?;
                let b = self.pop_value()?;
                self.stack.push(StackItem::Value(apply_binop(op, a, b)?));
            }
            ControlItem::UnOp(op) => {
                let a = self.pop_value()?;
                self.stack.push(StackItem::Value(apply_unop(op, a)?));
            }
            ControlItem::Beta => {
                let cond = self.pop_value()?.as_bool()?;
                // The control builder emits Condition(k_then), Condition(k_else), Beta
                // in that order; since later-pushed items sit closer to the top, the
                // else branch's marker is the one popped first here.
                let k_else = self.pop_condition()?;
                let k_then = self.pop_condition()?;
                let target = if cond { k_then } else { k_else };
                self.control.extend(self.table[target].iter().cloned());
            }
            ControlItem::Condition(_) => {
                return Err(RpalError::Internal(
                    "Condition marker reached outside of a beta reduction".to_string(),
                ));
            }
            ControlItem::EnvMarker(e) => self.exit_environment(e)?,
            ControlItem::Gamma => self.apply()?,
        }
        Ok(())
    }

    fn apply(&mut self) -> Result<()> {
        let rator = self.pop_value()?;
        let rand = self.pop_value()?;
        match rator {
            Value::Closure { k, bv, env: eparent } => {
                let e_prime = self.env.child(eparent);
                bind(&mut self.env, e_prime, &bv, rand)?;
                self.current_env = e_prime;
                self.stack.push(StackItem::EnvMarker(e_prime));
                self.control.push(ControlItem::EnvMarker(e_prime));
                self.control.extend(self.table[k].iter().cloned());
            }
            Value::Tuple(items) => {
                let i = rand.as_int()?;
                if i < 1 || i as usize > items.len() {
                    return Err(RpalError::Type {
                        expected: format!("index between 1 and {}", items.len()),
                        found: i.to_string(),
                    });
                }
                self.stack.push(StackItem::Value(items[(i - 1) as usize].clone()));
            }
            Value::YStar => match rand {
                Value::Closure { k, bv, env } => {
                    self.stack.push(StackItem::Value(Value::YClosure { k, bv, env }));
                }
                other => return Err(Value::type_error("function", &other)),
            },
            Value::YClosure { k, bv, env } => {
                // eta-expansion: Y* f = f (Y* f). Set up two synthetic gammas:
                // the first applies the wrapped closure to the Y-closure itself,
                // producing the function value the original call should have
                // had; the second applies that to the real argument.
                self.stack.push(StackItem::Value(rand));
                self.stack.push(StackItem::Value(Value::YClosure {
                    k,
                    bv: bv.clone(),
                    env,
                }));
                self.stack.push(StackItem::Value(Value::Closure { k, bv, env }));
                self.control.push(ControlItem::Gamma);
                self.control.push(ControlItem::Gamma);
            }
            Value::Builtin(name) => {
                let result = builtins::apply(name, rand, &mut self.print_called)?;
                self.stack.push(StackItem::Value(result));
            }
            Value::ConcPartial(first) => {
                let second = rand.as_str()?;
                let combined: String = first.chars().chain(second.chars()).collect();
                self.stack.push(StackItem::Value(Value::Str(Rc::from(combined.as_str()))));
            }
            other => return Err(Value::type_error("function", &other)),
        }
        Ok(())
    }

    fn exit_environment(&mut self, e: usize) -> Result<()> {
        let v = self.pop_value()?;
        match self.stack.pop() {
            Some(StackItem::EnvMarker(marker)) if marker == e => {}
            other => {
                return Err(RpalError::Internal(format!(
                    "expected EnvMarker({e}) beneath the call's result, found {other:?}"
                )))
            }
        }
        self.current_env = self
            .stack
            .iter()
            .rev()
            .find_map(|item| match item {
                StackItem::EnvMarker(m) => Some(*m),
                _ => None,
            })
            .unwrap_or(0);
        self.stack.push(StackItem::Value(v));
        Ok(())
    }

    fn pop_value(&mut self) -> Result<Value> {
        match self.stack.pop() {
            Some(StackItem::Value(v)) => Ok(v),
            other => Err(RpalError::Internal(format!(
                "expected a value on the stack, found {other:?}"
            ))),
        }
    }

    fn pop_condition(&mut self) -> Result<usize> {
        match self.control.pop() {
            Some(ControlItem::Condition(k)) => Ok(k),
            other => Err(RpalError::Internal(format!(
                "expected a Condition marker on the control, found {other:?}"
            ))),
        }
    }
}

fn bind(env: &mut EnvArena, target: usize, bv: &BoundVar, rand: Value) -> Result<()> {
    match bv {
        BoundVar::Single(name) => {
            env.define(target, name.clone(), rand);
            Ok(())
        }
        BoundVar::Multi(names) => {
            let items = rand.as_tuple()?;
            if items.len() < bv.arity() {
                return Err(RpalError::Type {
                    expected: format!("tuple of at least {} components", bv.arity()),
                    found: format!("tuple of {} components", items.len()),
                });
            }
            for (name, value) in names.iter().zip(items.iter()) {
                env.define(target, name.clone(), value.clone());
            }
            Ok(())
        }
    }
}

fn apply_binop(op: BinOp, a: Value, b: Value) -> Result<Value> {
    match op {
        BinOp::Add => Ok(Value::Int(a.as_int()? + b.as_int()?)),
        BinOp::Sub => Ok(Value::Int(a.as_int()? - b.as_int()?)),
        BinOp::Mul => Ok(Value::Int(a.as_int()? * b.as_int()?)),
        BinOp::Div => {
            let (x, y) = (a.as_int()?, b.as_int()?);
            if y == 0 {
                return Err(RpalError::Type {
                    expected: "non-zero divisor".to_string(),
                    found: "0".to_string(),
                });
            }
            Ok(Value::Int(x / y))
        }
        BinOp::Pow => {
            let (x, y) = (a.as_int()?, b.as_int()?);
            if y < 0 {
                return Err(RpalError::Type {
                    expected: "non-negative exponent".to_string(),
                    found: y.to_string(),
                });
            }
            Ok(Value::Int(x.pow(y as u32)))
        }
        BinOp::Gr => Ok(Value::Bool(a.as_int()? > b.as_int()?)),
        BinOp::Ge => Ok(Value::Bool(a.as_int()? >= b.as_int()?)),
        BinOp::Ls => Ok(Value::Bool(a.as_int()? < b.as_int()?)),
        BinOp::Le => Ok(Value::Bool(a.as_int()? <= b.as_int()?)),
        BinOp::Eq => Ok(Value::Bool(a == b)),
        BinOp::Ne => Ok(Value::Bool(a != b)),
        BinOp::Or => Ok(Value::Bool(a.as_bool()? || b.as_bool()?)),
        BinOp::And => Ok(Value::Bool(a.as_bool()? && b.as_bool()?)),
        BinOp::Aug => {
            let items = a.as_tuple()?;
            let mut widened = (**items).clone();
            widened.push(b);
            Ok(Value::Tuple(Rc::new(widened)))
        }
    }
}

fn apply_unop(op: UnOp, a: Value) -> Result<Value> {
    match op {
        UnOp::Neg => Ok(Value::Int(-a.as_int()?)),
        UnOp::Not => Ok(Value::Bool(!a.as_bool()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::build;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::standardize::standardize;

    fn eval(src: &str) -> (Value, bool) {
        let ast = parse(tokenize(src).unwrap()).unwrap();
        let st = standardize(ast).unwrap();
        let table = build(&st).unwrap();
        Machine::new(&table).run().unwrap()
    }

    #[test]
    fn evaluates_simple_let_binding() {
        let (v, _) = eval("let x = 5 in x + 3");
        assert_eq!(v, Value::Int(8));
    }

    #[test]
    fn evaluates_recursive_factorial() {
        let (v, _) = eval("let rec fact n = n eq 0 -> 1 | n * fact (n - 1) in fact 5");
        assert_eq!(v, Value::Int(120));
    }

    #[test]
    fn evaluates_multi_parameter_function() {
        let (v, _) = eval("let f x y = x - y in f 10 3");
        assert_eq!(v, Value::Int(7));
    }

    #[test]
    fn evaluates_simultaneous_and_binding() {
        let (v, _) = eval("let x = 3 and y = 4 in x ** 2 + y ** 2");
        assert_eq!(v, Value::Int(25));
    }

    #[test]
    fn evaluates_string_concatenation() {
        let (v, _) = eval("'Hello' @ Conc ' World'");
        assert_eq!(v, Value::Str(Rc::from("Hello World")));
    }

    #[test]
    fn print_sets_the_flag_and_leaves_its_argument_as_the_result() {
        let (v, printed) = eval("let Pairs = (1, 2, 3) in Print(Pairs)");
        assert!(printed);
        assert_eq!(v, Value::Tuple(Rc::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
    }

    #[test]
    fn tuple_selection_via_application() {
        let (v, _) = eval("let t = (10, 20, 30) in t 2");
        assert_eq!(v, Value::Int(20));
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        let ast = parse(tokenize("x + 1").unwrap()).unwrap();
        let st = standardize(ast).unwrap();
        let table = build(&st).unwrap();
        assert!(Machine::new(&table).run().is_err());
    }
}
