use crate::ast::{Ast, AstKind, BinOp, UnOp};
use crate::error::{Result, RpalError};
use std::rc::Rc;

/// How a lambda's parameter list is encoded: a single name, a tuple of
/// names bound component-wise, or the empty-parameter marker `()`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundVar {
    Single(Rc<str>),
    Multi(Vec<Rc<str>>),
}

impl BoundVar {
    pub fn arity(&self) -> usize {
        match self {
            BoundVar::Single(_) => 1,
            BoundVar::Multi(names) => names.len(),
        }
    }
}

/// One item in a flattened control structure. Distinct from `Value`: the
/// control algebra and the value algebra serve different purposes even
/// though several variants look alike.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlItem {
    Int(i64),
    Str(Rc<str>),
    Bool(bool),
    Nil,
    Ident(Rc<str>),
    YStar,
    Gamma,
    Lambda(usize, BoundVar),
    Tau(usize),
    Condition(usize),
    Beta,
    EnvMarker(usize),
    BinOp(BinOp),
    UnOp(UnOp),
}

/// `delta[0..]`: one linear control sequence per lambda body or
/// conditional branch, plus `delta[0]` for the whole program.
pub type ControlTable = Vec<Vec<ControlItem>>;

/// Flattens a standardized tree into the control-structure table.
pub fn build(st: &Ast) -> Result<ControlTable> {
    let mut table: ControlTable = vec![Vec::new()];
    let mut counter = 0usize;
    build_into(st, 0, &mut table, &mut counter)?;
    Ok(table)
}

fn ensure_len(table: &mut ControlTable, index: usize) {
    while table.len() <= index {
        table.push(Vec::new());
    }
}

fn build_into(node: &Ast, index: usize, table: &mut ControlTable, counter: &mut usize) -> Result<()> {
    match &node.kind {
        AstKind::Lambda => {
            *counter += 1;
            let k = *counter;
            ensure_len(table, k);
            let bv = bound_var_of(&node.children[0])?;
            table[index].push(ControlItem::Lambda(k, bv));
            build_into(&node.children[1], k, table, counter)
        }
        AstKind::Tau => {
            table[index].push(ControlItem::Tau(node.children.len()));
            for child in &node.children {
                build_into(child, index, table, counter)?;
            }
            Ok(())
        }
        AstKind::Arrow => {
            *counter += 1;
            let k_then = *counter;
            ensure_len(table, k_then);
            table[index].push(ControlItem::Condition(k_then));
            build_into(&node.children[1], k_then, table, counter)?;

            *counter += 1;
            let k_else = *counter;
            ensure_len(table, k_else);
            table[index].push(ControlItem::Condition(k_else));
            build_into(&node.children[2], k_else, table, counter)?;

            table[index].push(ControlItem::Beta);
            build_into(&node.children[0], index, table, counter)
        }
        AstKind::Gamma => {
            table[index].push(ControlItem::Gamma);
            for child in &node.children {
                build_into(child, index, table, counter)?;
            }
            Ok(())
        }
        AstKind::BinOp(op) => {
            table[index].push(ControlItem::BinOp(*op));
            for child in &node.children {
                build_into(child, index, table, counter)?;
            }
            Ok(())
        }
        AstKind::UnOp(op) => {
            table[index].push(ControlItem::UnOp(*op));
            for child in &node.children {
                build_into(child, index, table, counter)?;
            }
            Ok(())
        }
        AstKind::YStar => {
            table[index].push(ControlItem::YStar);
            Ok(())
        }
        AstKind::Int(n) => {
            table[index].push(ControlItem::Int(*n));
            Ok(())
        }
        AstKind::Str(s) => {
            table[index].push(ControlItem::Str(s.clone()));
            Ok(())
        }
        AstKind::Bool(b) => {
            table[index].push(ControlItem::Bool(*b));
            Ok(())
        }
        AstKind::Nil => {
            table[index].push(ControlItem::Nil);
            Ok(())
        }
        // RPAL's `dummy` denotes an inert placeholder value; it behaves like `nil`.
        AstKind::Dummy => {
            table[index].push(ControlItem::Nil);
            Ok(())
        }
        AstKind::Ident(name) => {
            table[index].push(ControlItem::Ident(name.clone()));
            Ok(())
        }
        other => Err(RpalError::Internal(format!(
            "unexpected node in standardized tree: {other:?}"
        ))),
    }
}

fn bound_var_of(binder: &Ast) -> Result<BoundVar> {
    match &binder.kind {
        AstKind::Ident(name) => Ok(BoundVar::Single(name.clone())),
        AstKind::EmptyParams => Ok(BoundVar::Multi(Vec::new())),
        AstKind::Comma => {
            let names = binder
                .children
                .iter()
                .map(|c| match &c.kind {
                    AstKind::Ident(name) => Ok(name.clone()),
                    other => Err(RpalError::Internal(format!(
                        "comma binder component is not an identifier: {other:?}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(BoundVar::Multi(names))
        }
        other => Err(RpalError::Internal(format!("invalid lambda binder: {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::standardize::standardize;

    fn build_src(src: &str) -> ControlTable {
        let ast = parse(tokenize(src).unwrap()).unwrap();
        let st = standardize(ast).unwrap();
        build(&st).unwrap()
    }

    #[test]
    fn simple_let_produces_two_structures() {
        let table = build_src("let x = 5 in x + 3");
        assert_eq!(table.len(), 2);
        assert!(matches!(table[0][0], ControlItem::Lambda(1, _)));
    }

    #[test]
    fn conditional_creates_two_branch_structures() {
        let table = build_src("let f x = x eq 0 -> 1 | 2 in f 0");
        // delta[1] is f's body: Condition(2), Condition(3), Beta, eq, x, 0
        let body = &table[1];
        assert!(matches!(body[0], ControlItem::Condition(2)));
        assert!(matches!(body[1], ControlItem::Condition(3)));
        assert_eq!(body[2], ControlItem::Beta);
    }

    #[test]
    fn tuple_emits_tau_then_components() {
        let table = build_src("let p = (1, 2, 3) in 0");
        let found = table.iter().any(|cs| matches!(cs.first(), Some(ControlItem::Tau(3))));
        assert!(found);
    }
}
