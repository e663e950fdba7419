use crate::ast::{Ast, AstKind};
use crate::error::{Result, RpalError};

/// Rewrites an AST into the kernel forms (`lambda`, `gamma`, `->`, `tau`,
/// `Y*`, leaves) that the control-structure builder understands. Rewrites
/// are bottom-up: children are standardized before the parent, except where
/// a rewrite introduces a new parent (`let`, `where`, `@`) that must itself
/// be re-standardized.
pub fn standardize(ast: Ast) -> Result<Ast> {
    let result = standardize_node(ast)?;
    debug_assert!(result.is_kernel(), "standardize produced a non-kernel node");
    Ok(result)
}

fn standardize_node(ast: Ast) -> Result<Ast> {
    match ast.kind {
        AstKind::Let => {
            let mut children = ast.children;
            let body = children.pop().expect("let has a body");
            let def = children.pop().expect("let has a definition");
            let (binder, expr) = standardize_definition(def)?;
            let body = standardize(body)?;
            Ok(Ast::node(
                AstKind::Gamma,
                vec![Ast::node(AstKind::Lambda, vec![binder, body]), expr],
            ))
        }
        AstKind::Where => {
            let mut children = ast.children;
            let def = children.pop().expect("where has a definition");
            let body = children.pop().expect("where has a body");
            let (binder, expr) = standardize_definition(def)?;
            let body = standardize(body)?;
            Ok(Ast::node(
                AstKind::Gamma,
                vec![Ast::node(AstKind::Lambda, vec![binder, body]), expr],
            ))
        }
        AstKind::At => {
            let mut children = ast.children;
            let right = children.pop().expect("@ has a right operand");
            let ident = children.pop().expect("@ names an infix function");
            let left = children.pop().expect("@ has a left operand");
            let inner = Ast::node(AstKind::Gamma, vec![ident, left]);
            standardize(Ast::node(AstKind::Gamma, vec![inner, right]))
        }
        AstKind::Lambda => {
            let mut children = ast.children;
            let body = children.pop().expect("lambda has a body");
            let binder = children.pop().expect("lambda has a binder");
            Ok(Ast::node(AstKind::Lambda, vec![binder, standardize(body)?]))
        }
        AstKind::Gamma | AstKind::Arrow | AstKind::Tau | AstKind::BinOp(_) | AstKind::UnOp(_) => {
            let children = ast
                .children
                .into_iter()
                .map(standardize)
                .collect::<Result<Vec<_>>>()?;
            Ok(Ast::node(ast.kind, children))
        }
        AstKind::Int(_)
        | AstKind::Str(_)
        | AstKind::Bool(_)
        | AstKind::Nil
        | AstKind::Dummy
        | AstKind::Ident(_)
        | AstKind::YStar
        | AstKind::EmptyParams
        | AstKind::Comma => Ok(Ast::node(ast.kind, ast.children)),
        AstKind::FcnForm | AstKind::Assign | AstKind::Rec | AstKind::And | AstKind::Within => {
            Err(RpalError::Standardize {
                kind: kind_name(&ast.kind),
            })
        }
    }
}

/// Resolves a definition node (`=`, `fcn_form`, `rec`, `and`, `within`) into
/// a `(binder, expr)` pair whose `expr` is already standardized, per the
/// canonical RPAL rewrite rules.
fn standardize_definition(def: Ast) -> Result<(Ast, Ast)> {
    match def.kind {
        AstKind::Assign => {
            let mut children = def.children;
            let expr = children.pop().expect("= has an expression");
            let binder = children.pop().expect("= has a binder");
            Ok((binder, standardize(expr)?))
        }
        AstKind::FcnForm => {
            let mut children = def.children;
            let body = children.pop().expect("fcn_form has a body");
            let body = standardize(body)?;
            let params: Vec<Ast> = children.drain(1..).collect();
            let binder = children.pop().expect("fcn_form names a function");
            let expr = params
                .into_iter()
                .rev()
                .fold(body, |acc, param| Ast::node(AstKind::Lambda, vec![param, acc]));
            Ok((binder, expr))
        }
        AstKind::Rec => {
            let mut children = def.children;
            let inner = children.pop().expect("rec wraps a definition");
            let (binder, expr) = standardize_definition(inner)?;
            let gamma = Ast::node(
                AstKind::Gamma,
                vec![
                    Ast::leaf(AstKind::YStar),
                    Ast::node(AstKind::Lambda, vec![binder.clone(), expr]),
                ],
            );
            Ok((binder, gamma))
        }
        AstKind::And => {
            let mut binders = Vec::new();
            let mut exprs = Vec::new();
            for child in def.children {
                let (binder, expr) = standardize_definition(child)?;
                binders.push(binder);
                exprs.push(expr);
            }
            Ok((Ast::node(AstKind::Comma, binders), Ast::node(AstKind::Tau, exprs)))
        }
        AstKind::Within => {
            let mut children = def.children;
            let outer = children.remove(0);
            let inner = children.remove(0);
            let (x1, e1) = standardize_definition(outer)?;
            let (x2, e2) = standardize_definition(inner)?;
            let expr = Ast::node(
                AstKind::Gamma,
                vec![Ast::node(AstKind::Lambda, vec![x1, e2]), e1],
            );
            Ok((x2, expr))
        }
        other => Err(RpalError::Standardize {
            kind: kind_name(&other),
        }),
    }
}

fn kind_name(kind: &AstKind) -> String {
    match kind {
        AstKind::Let => "let",
        AstKind::Where => "where",
        AstKind::Within => "within",
        AstKind::And => "and",
        AstKind::Rec => "rec",
        AstKind::FcnForm => "fcn_form",
        AstKind::At => "@",
        AstKind::Assign => "=",
        _ => "unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn standardize_src(src: &str) -> Ast {
        let ast = parse(tokenize(src).unwrap()).unwrap();
        standardize(ast).unwrap()
    }

    #[test]
    fn let_becomes_gamma_lambda() {
        let st = standardize_src("let x = 5 in x + 3");
        assert_eq!(st.kind, AstKind::Gamma);
        assert_eq!(st.children[0].kind, AstKind::Lambda);
    }

    #[test]
    fn rec_introduces_ystar() {
        let st = standardize_src("let rec fact n = n eq 0 -> 1 | n * fact (n - 1) in fact 5");
        // outer: gamma(lambda(fact, body), gamma(Y*, lambda(fact, ...)))
        let binding_value = &st.children[1];
        assert_eq!(binding_value.kind, AstKind::Gamma);
        assert_eq!(binding_value.children[0].kind, AstKind::YStar);
    }

    #[test]
    fn and_becomes_comma_tau() {
        let st = standardize_src("let x = 3 and y = 4 in x ** 2 + y ** 2");
        let lambda = &st.children[0];
        assert_eq!(lambda.children[0].kind, AstKind::Comma);
        assert_eq!(st.children[1].kind, AstKind::Tau);
    }

    #[test]
    fn standardization_is_idempotent() {
        let ast = parse(tokenize("let rec f n = n eq 0 -> 1 | n * f (n - 1) in f 5").unwrap()).unwrap();
        let once = standardize(ast).unwrap();
        let twice = standardize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_assign_at_top_is_an_error() {
        let ast = Ast::node(
            AstKind::Assign,
            vec![Ast::leaf(AstKind::Ident("x".into())), Ast::leaf(AstKind::Int(1))],
        );
        assert!(standardize(ast).is_err());
    }
}
