use crate::ast::*;
use crate::lexer::Token;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a token stream into a program. The first error aborts; there
/// is no recovery and no partial tree.
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .unwrap_or(Span::UNKNOWN)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<Span> {
        match self.peek() {
            Some(tok) if tok == expected => {
                let span = self.peek_span();
                self.advance();
                Ok(span)
            }
            Some(tok) => Err(self.error(format!("expected {:?}, got {:?}", expected, tok))),
            None => Err(self.error(format!("expected {:?}, got EOF", expected))),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            Some(tok) => Err(self.error(format!("expected identifier, got {:?}", tok))),
            None => Err(self.error("expected identifier, got EOF".into())),
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError { span: self.peek_span(), message }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // ---- Top-level parsing ----

    fn parse_program(&mut self) -> Result<Program> {
        let mut functions = Vec::new();
        while !self.at_end() {
            functions.push(self.parse_function()?);
        }
        Ok(Program { functions, source: None })
    }

    /// `func name(int a, int b) { ... }`
    fn parse_function(&mut self) -> Result<Function> {
        let start = self.expect(&Token::Func)?;
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                self.expect(&Token::Int)?;
                params.push(self.expect_ident()?);
                if self.peek() != Some(&Token::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&Token::RParen)?;
        let body = self.parse_block()?;
        let end = self.tokens[self.pos.saturating_sub(1)].1;
        Ok(Function { name, params, body, span: start.merge(end) })
    }

    /// `{ stmt* }`
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            if self.at_end() {
                return Err(self.error("unclosed block, expected '}'".into()));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.advance();
        Ok(stmts)
    }

    // ---- Statements ----

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.peek() {
            Some(Token::Int) => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Declare { name })
            }

            Some(Token::If) => {
                self.advance();
                self.expect(&Token::LParen)?;
                let condition = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let then_block = self.parse_block()?;
                let else_block = if self.peek() == Some(&Token::Else) {
                    self.advance();
                    Some(self.parse_block()?)
                } else {
                    None
                };
                Ok(Stmt::If { condition, then_block, else_block })
            }

            Some(Token::While) => {
                self.advance();
                self.expect(&Token::LParen)?;
                let condition = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let body = self.parse_block()?;
                Ok(Stmt::While { condition, body })
            }

            Some(Token::Return) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Return(expr))
            }

            Some(Token::Ident(_)) => {
                // One token of lookahead splits `x = ...` from `f(...)`.
                match self.peek_at(1) {
                    Some(Token::Assign) => {
                        let name = self.expect_ident()?;
                        self.advance();
                        let value = self.parse_expr()?;
                        self.expect(&Token::Semi)?;
                        Ok(Stmt::Assign { name, value })
                    }
                    Some(Token::LParen) => {
                        let name = self.expect_ident()?;
                        let args = self.parse_args()?;
                        self.expect(&Token::Semi)?;
                        Ok(Stmt::Call { name, args })
                    }
                    _ => Err(self.error("expected '=' or '(' after identifier".into())),
                }
            }

            Some(tok) => Err(self.error(format!("expected statement, got {:?}", tok))),
            None => Err(self.error("expected statement, got EOF".into())),
        }
    }

    // ---- Expressions ----
    //
    // comparison := additive [cmp additive]   (comparisons don't chain)
    // additive   := term (("+"|"-") term)*
    // term       := primary (("*"|"/"|"%") primary)*

    fn parse_expr(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinOp::Eq,
            Some(Token::NotEq) => BinOp::Ne,
            Some(Token::Less) => BinOp::Lt,
            Some(Token::LessEq) => BinOp::Le,
            Some(Token::Greater) => BinOp::Gt,
            Some(Token::GreaterEq) => BinOp::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right) })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_primary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek().cloned() {
            Some(Token::Number(value)) => {
                self.advance();
                Ok(Expr::Int(value))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                if self.peek() == Some(&Token::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(tok) => Err(self.error(format!("expected expression, got {:?}", tok))),
            None => Err(self.error("expected expression, got EOF".into())),
        }
    }

    /// `( expr, expr, ... )` — the opening paren is still pending.
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.peek() != Some(&Token::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }
}
