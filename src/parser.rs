use crate::ast::{Ast, AstKind, BinOp, UnOp};
use crate::error::{Result, RpalError};
use crate::lexer::Token;
use std::rc::Rc;

/// Recursive-descent parser over the RPAL grammar. One method per
/// nonterminal, mirroring the textbook production names (`E`, `Ew`, `T`,
/// `Ta`, `Tc`, `B`, `Bt`, `Bs`, `Bp`, `A`, `At`, `Af`, `Ap`, `R`, `Rn`, `D`,
/// `Da`, `Dr`, `Db`, `Vb`, `Vl`).
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

pub fn parse(tokens: Vec<Token>) -> Result<Ast> {
    let mut parser = Parser::new(tokens);
    let tree = parser.parse_e()?;
    if parser.pos != parser.tokens.len() {
        return Err(RpalError::Parse {
            expected: "end of input".to_string(),
            found: parser.peek().describe(),
        });
    }
    Ok(tree)
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or(&Token::Punctuation('\0'))
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Punctuation('\0'));
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Token::Keyword(k) if k == kw)
    }

    fn is_operator(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Operator(o) if o == op)
    }

    fn is_punct(&self, p: char) -> bool {
        matches!(self.peek(), Token::Punctuation(c) if *c == p)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.is_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(RpalError::Parse {
                expected: format!("keyword '{kw}'"),
                found: self.peek().describe(),
            })
        }
    }

    fn expect_operator(&mut self, op: &str) -> Result<()> {
        if self.is_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(RpalError::Parse {
                expected: format!("operator '{op}'"),
                found: self.peek().describe(),
            })
        }
    }

    fn expect_punct(&mut self, p: char) -> Result<()> {
        if self.is_punct(p) {
            self.advance();
            Ok(())
        } else {
            Err(RpalError::Parse {
                expected: format!("'{p}'"),
                found: self.peek().describe(),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<Rc<str>> {
        match self.advance() {
            Token::Identifier(name) => Ok(Rc::from(name.as_str())),
            other => Err(RpalError::Parse {
                expected: "identifier".to_string(),
                found: other.describe(),
            }),
        }
    }

    // E -> 'let' D 'in' E | 'fn' Vb+ '.' E | Ew
    fn parse_e(&mut self) -> Result<Ast> {
        if self.is_keyword("let") {
            self.advance();
            let d = self.parse_d()?;
            self.expect_keyword("in")?;
            let e = self.parse_e()?;
            return Ok(Ast::node(AstKind::Let, vec![d, e]));
        }
        if self.is_keyword("fn") {
            self.advance();
            let mut binders = vec![self.parse_vb()?];
            while self.is_identifier_start() || self.is_punct('(') {
                binders.push(self.parse_vb()?);
            }
            self.expect_punct('.')?;
            let body = self.parse_e()?;
            return Ok(Self::nest_lambdas(binders, body));
        }
        self.parse_ew()
    }

    fn is_identifier_start(&self) -> bool {
        matches!(self.peek(), Token::Identifier(_))
    }

    fn nest_lambdas(binders: Vec<Ast>, body: Ast) -> Ast {
        let mut result = body;
        for binder in binders.into_iter().rev() {
            result = Ast::node(AstKind::Lambda, vec![binder, result]);
        }
        result
    }

    // Ew -> T 'where' Dr | T
    fn parse_ew(&mut self) -> Result<Ast> {
        let t = self.parse_t()?;
        if self.is_keyword("where") {
            self.advance();
            let dr = self.parse_dr()?;
            return Ok(Ast::node(AstKind::Where, vec![t, dr]));
        }
        Ok(t)
    }

    // T -> Ta (',' Ta)+ | Ta
    fn parse_t(&mut self) -> Result<Ast> {
        let mut items = vec![self.parse_ta()?];
        while self.is_punct(',') {
            self.advance();
            items.push(self.parse_ta()?);
        }
        if items.len() > 1 {
            Ok(Ast::node(AstKind::Tau, items))
        } else {
            Ok(items.remove(0))
        }
    }

    // Ta -> Tc ('aug' Tc)*
    fn parse_ta(&mut self) -> Result<Ast> {
        let mut node = self.parse_tc()?;
        while self.is_keyword("aug") {
            self.advance();
            let rhs = self.parse_tc()?;
            node = Ast::node(AstKind::BinOp(BinOp::Aug), vec![node, rhs]);
        }
        Ok(node)
    }

    // Tc -> B '->' Tc '|' Tc | B
    fn parse_tc(&mut self) -> Result<Ast> {
        let b = self.parse_b()?;
        if self.is_operator("->") {
            self.advance();
            let then_branch = self.parse_tc()?;
            self.expect_operator("|")?;
            let else_branch = self.parse_tc()?;
            return Ok(Ast::node(AstKind::Arrow, vec![b, then_branch, else_branch]));
        }
        Ok(b)
    }

    // B -> Bt ('or' Bt)*
    fn parse_b(&mut self) -> Result<Ast> {
        let mut node = self.parse_bt()?;
        while self.is_keyword("or") {
            self.advance();
            let rhs = self.parse_bt()?;
            node = Ast::node(AstKind::BinOp(BinOp::Or), vec![node, rhs]);
        }
        Ok(node)
    }

    // Bt -> Bs ('&' Bs)*
    fn parse_bt(&mut self) -> Result<Ast> {
        let mut node = self.parse_bs()?;
        while self.is_operator("&") {
            self.advance();
            let rhs = self.parse_bs()?;
            node = Ast::node(AstKind::BinOp(BinOp::And), vec![node, rhs]);
        }
        Ok(node)
    }

    // Bs -> 'not' Bp | Bp
    fn parse_bs(&mut self) -> Result<Ast> {
        if self.is_keyword("not") {
            self.advance();
            let rhs = self.parse_bp()?;
            return Ok(Ast::node(AstKind::UnOp(UnOp::Not), vec![rhs]));
        }
        self.parse_bp()
    }

    // Bp -> A (rel-op A)?
    fn parse_bp(&mut self) -> Result<Ast> {
        let a = self.parse_a()?;
        let op = if self.is_keyword("gr") || self.is_operator(">") {
            Some(BinOp::Gr)
        } else if self.is_keyword("ge") || self.is_operator(">=") {
            Some(BinOp::Ge)
        } else if self.is_keyword("ls") || self.is_operator("<") {
            Some(BinOp::Ls)
        } else if self.is_keyword("le") || self.is_operator("<=") {
            Some(BinOp::Le)
        } else if self.is_keyword("eq") {
            Some(BinOp::Eq)
        } else if self.is_keyword("ne") {
            Some(BinOp::Ne)
        } else {
            None
        };
        match op {
            Some(op) => {
                self.advance();
                let rhs = self.parse_a()?;
                Ok(Ast::node(AstKind::BinOp(op), vec![a, rhs]))
            }
            None => Ok(a),
        }
    }

    // A -> '+' At | '-' At | At (('+'|'-') At)*
    fn parse_a(&mut self) -> Result<Ast> {
        if self.is_operator("+") {
            self.advance();
            return self.parse_at();
        }
        if self.is_operator("-") {
            self.advance();
            let at = self.parse_at()?;
            return Ok(Ast::node(AstKind::UnOp(UnOp::Neg), vec![at]));
        }
        let mut node = self.parse_at()?;
        loop {
            if self.is_operator("+") {
                self.advance();
                let rhs = self.parse_at()?;
                node = Ast::node(AstKind::BinOp(BinOp::Add), vec![node, rhs]);
            } else if self.is_operator("-") {
                self.advance();
                let rhs = self.parse_at()?;
                node = Ast::node(AstKind::BinOp(BinOp::Sub), vec![node, rhs]);
            } else {
                break;
            }
        }
        Ok(node)
    }

    // At -> Af (('*'|'/') Af)*
    fn parse_at(&mut self) -> Result<Ast> {
        let mut node = self.parse_af()?;
        loop {
            if self.is_operator("*") {
                self.advance();
                let rhs = self.parse_af()?;
                node = Ast::node(AstKind::BinOp(BinOp::Mul), vec![node, rhs]);
            } else if self.is_operator("/") {
                self.advance();
                let rhs = self.parse_af()?;
                node = Ast::node(AstKind::BinOp(BinOp::Div), vec![node, rhs]);
            } else {
                break;
            }
        }
        Ok(node)
    }

    // Af -> Ap ('**' Af)?
    fn parse_af(&mut self) -> Result<Ast> {
        let ap = self.parse_ap()?;
        if self.is_operator("**") {
            self.advance();
            let rhs = self.parse_af()?;
            return Ok(Ast::node(AstKind::BinOp(BinOp::Pow), vec![ap, rhs]));
        }
        Ok(ap)
    }

    // Ap -> R ('@' IDENTIFIER R)*
    fn parse_ap(&mut self) -> Result<Ast> {
        let mut node = self.parse_r()?;
        while self.is_operator("@") {
            self.advance();
            let name = self.expect_identifier()?;
            let ident = Ast::leaf(AstKind::Ident(name));
            let rhs = self.parse_r()?;
            node = Ast::node(AstKind::At, vec![node, ident, rhs]);
        }
        Ok(node)
    }

    // R -> Rn Rn*  (left-associative application)
    fn parse_r(&mut self) -> Result<Ast> {
        let mut node = self.parse_rn()?;
        while self.starts_rn() {
            let rhs = self.parse_rn()?;
            node = Ast::node(AstKind::Gamma, vec![node, rhs]);
        }
        Ok(node)
    }

    fn starts_rn(&self) -> bool {
        matches!(self.peek(), Token::Identifier(_) | Token::Integer(_) | Token::Str(_))
            || self.is_keyword("true")
            || self.is_keyword("false")
            || self.is_keyword("nil")
            || self.is_keyword("dummy")
            || self.is_punct('(')
    }

    // Rn -> IDENTIFIER | INTEGER | STRING | 'true' | 'false' | 'nil' | 'dummy' | '(' E ')'
    fn parse_rn(&mut self) -> Result<Ast> {
        match self.peek().clone() {
            Token::Identifier(_) => Ok(Ast::leaf(AstKind::Ident(self.expect_identifier()?))),
            Token::Integer(n) => {
                self.advance();
                Ok(Ast::leaf(AstKind::Int(n)))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Ast::leaf(AstKind::Str(Rc::from(s.as_str()))))
            }
            Token::Keyword(ref k) if k == "true" => {
                self.advance();
                Ok(Ast::leaf(AstKind::Bool(true)))
            }
            Token::Keyword(ref k) if k == "false" => {
                self.advance();
                Ok(Ast::leaf(AstKind::Bool(false)))
            }
            Token::Keyword(ref k) if k == "nil" => {
                self.advance();
                Ok(Ast::leaf(AstKind::Nil))
            }
            Token::Keyword(ref k) if k == "dummy" => {
                self.advance();
                Ok(Ast::leaf(AstKind::Dummy))
            }
            Token::Punctuation('(') => {
                self.advance();
                let e = self.parse_e()?;
                self.expect_punct(')')?;
                Ok(e)
            }
            other => Err(RpalError::Parse {
                expected: "identifier, literal, or '('".to_string(),
                found: other.describe(),
            }),
        }
    }

    // D -> Da 'within' D | Da
    fn parse_d(&mut self) -> Result<Ast> {
        let da = self.parse_da()?;
        if self.is_keyword("within") {
            self.advance();
            let d = self.parse_d()?;
            return Ok(Ast::node(AstKind::Within, vec![da, d]));
        }
        Ok(da)
    }

    // Da -> Dr ('and' Dr)*
    fn parse_da(&mut self) -> Result<Ast> {
        let mut items = vec![self.parse_dr()?];
        while self.is_keyword("and") {
            self.advance();
            items.push(self.parse_dr()?);
        }
        if items.len() > 1 {
            Ok(Ast::node(AstKind::And, items))
        } else {
            Ok(items.remove(0))
        }
    }

    // Dr -> 'rec' Db | Db
    fn parse_dr(&mut self) -> Result<Ast> {
        if self.is_keyword("rec") {
            self.advance();
            let db = self.parse_db()?;
            return Ok(Ast::node(AstKind::Rec, vec![db]));
        }
        self.parse_db()
    }

    // Db -> IDENTIFIER Vb+ '=' E | '(' D ')' | Vl '=' E
    fn parse_db(&mut self) -> Result<Ast> {
        if let Token::Identifier(name) = self.peek().clone() {
            let saved = self.pos;
            self.advance();
            let mut binders = Vec::new();
            while self.is_identifier_start() || self.is_punct('(') {
                binders.push(self.parse_vb()?);
            }
            if self.is_operator("=") && !binders.is_empty() {
                self.advance();
                let e = self.parse_e()?;
                let mut children = vec![Ast::leaf(AstKind::Ident(Rc::from(name.as_str())))];
                children.extend(binders);
                children.push(e);
                return Ok(Ast::node(AstKind::FcnForm, children));
            }
            self.pos = saved;
        }

        if self.is_punct('(') {
            self.advance();
            let d = self.parse_d()?;
            self.expect_punct(')')?;
            return Ok(d);
        }

        let vl = self.parse_vl()?;
        self.expect_operator("=")?;
        let e = self.parse_e()?;
        Ok(Ast::node(AstKind::Assign, vec![vl, e]))
    }

    // Vb -> IDENTIFIER | '(' Vl? ')'
    fn parse_vb(&mut self) -> Result<Ast> {
        if let Token::Identifier(_) = self.peek() {
            return Ok(Ast::leaf(AstKind::Ident(self.expect_identifier()?)));
        }
        if self.is_punct('(') {
            self.advance();
            if self.is_punct(')') {
                self.advance();
                return Ok(Ast::leaf(AstKind::EmptyParams));
            }
            let vl = self.parse_vl()?;
            self.expect_punct(')')?;
            return Ok(vl);
        }
        Err(RpalError::Parse {
            expected: "identifier or '('".to_string(),
            found: self.peek().describe(),
        })
    }

    // Vl -> IDENTIFIER (',' IDENTIFIER)*
    fn parse_vl(&mut self) -> Result<Ast> {
        let first = self.expect_identifier()?;
        if self.is_punct(',') {
            let mut idents = vec![Ast::leaf(AstKind::Ident(first))];
            while self.is_punct(',') {
                self.advance();
                idents.push(Ast::leaf(AstKind::Ident(self.expect_identifier()?)));
            }
            return Ok(Ast::node(AstKind::Comma, idents));
        }
        Ok(Ast::leaf(AstKind::Ident(first)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Ast {
        parse(tokenize(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_simple_let() {
        let ast = parse_src("let x = 5 in x + 3");
        assert_eq!(ast.kind, AstKind::Let);
        assert_eq!(ast.children[0].kind, AstKind::Assign);
    }

    #[test]
    fn parses_fcn_form_definition() {
        let ast = parse_src("let f x y = x - y in f 10 3");
        let def = &ast.children[0];
        assert_eq!(def.kind, AstKind::FcnForm);
        // f, x, y, body
        assert_eq!(def.children.len(), 4);
    }

    #[test]
    fn parses_conditional() {
        let ast = parse_src("let f x = x eq 0 -> 1 | x in f 0");
        let body = &ast.children[0].children[1];
        assert_eq!(body.kind, AstKind::Arrow);
    }

    #[test]
    fn parses_rec_and_within() {
        let ast = parse_src("let rec fact n = n eq 0 -> 1 | n * fact (n - 1) in fact 5");
        assert_eq!(ast.children[0].kind, AstKind::Rec);

        let ast2 = parse_src("let x = 1 within y = 2 in y");
        assert_eq!(ast2.children[0].kind, AstKind::Within);
    }

    #[test]
    fn parses_tuple_and_at_operator() {
        let ast = parse_src("(1, 2, 3)");
        assert_eq!(ast.kind, AstKind::Tau);
        assert_eq!(ast.children.len(), 3);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let tokens = tokenize("x )").unwrap();
        assert!(parse(tokens).is_err());
    }
}
