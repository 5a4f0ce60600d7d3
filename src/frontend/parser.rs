use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;
use tracing::trace;

use crate::frontend::{
    ast::{Expr, Function, Item, Prototype},
    diagnostics::{DiagnosticSink, StderrSink},
    lexer::{Lexer, Location, Token},
};

// Binary operator precedence used unless the caller installs its own.
// 1 is the lowest binding strength, a missing entry means "not an operator".
lazy_static! {
    pub static ref DEFAULT_PRECEDENCE: HashMap<char, i32> = {
        let mut map = HashMap::new();
        map.insert('<', 10);
        map.insert('+', 20);
        map.insert('-', 20);
        map.insert('*', 40);
        map.insert('/', 40);
        map
    };
}

/// How many expressions may nest inside each other before parsing gives up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Name given to the prototype wrapping a top-level expression.
pub const ANONYMOUS_FN: &str = "__anon_expr";

// Every variant remembers where the parser was when it gave up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{location}: unknown token when expecting an expression, found {found}")]
    UnexpectedToken { found: Token, location: Location },

    #[error("{location}: expected ')', found {found}")]
    ExpectedClosingParen { found: Token, location: Location },

    #[error("{location}: Expected ')' or ',' in argument list, found {found}")]
    ExpectedArgumentDelimiter { found: Token, location: Location },

    #[error("{location}: Expected function name in prototype, found {found}")]
    ExpectedFunctionName { found: Token, location: Location },

    #[error("{location}: Expected '(' in prototype, found {found}")]
    ExpectedPrototypeOpenParen { found: Token, location: Location },

    #[error("{location}: Expected ')' in prototype, found {found}")]
    ExpectedPrototypeCloseParen { found: Token, location: Location },

    #[error("{location}: expressions nested more than {limit} deep")]
    NestingTooDeep { limit: usize, location: Location },
}

impl ParseError {
    pub fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::ExpectedClosingParen { location, .. }
            | ParseError::ExpectedArgumentDelimiter { location, .. }
            | ParseError::ExpectedFunctionName { location, .. }
            | ParseError::ExpectedPrototypeOpenParen { location, .. }
            | ParseError::ExpectedPrototypeCloseParen { location, .. }
            | ParseError::NestingTooDeep { location, .. } => *location,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive descent parser with one token of lookahead.
///
/// A parser is one parse session: it owns its [`Lexer`], its current token,
/// its operator table and its diagnostic sink, so independent sessions never
/// share state. The rule that detects a mismatch reports it to the sink; the
/// enclosing rules just propagate the `Err`.
pub struct Parser<I, D = StderrSink> {
    lexer: Lexer<I>,
    current: Token,
    location: Location,
    precedence: HashMap<char, i32>,
    depth: usize,
    max_depth: usize,
    diagnostics: D,
}

impl<I> Parser<I, StderrSink>
where
    I: Iterator<Item = char>,
{
    pub fn new(lexer: Lexer<I>) -> Self {
        Self::with_diagnostics(lexer, StderrSink)
    }
}

impl<I, D> Parser<I, D>
where
    I: Iterator<Item = char>,
    D: DiagnosticSink,
{
    /// Creates the parser and reads the first token.
    pub fn with_diagnostics(lexer: Lexer<I>, diagnostics: D) -> Self {
        let mut parser = Self {
            lexer,
            current: Token::EndOfInput,
            location: Location::default(),
            precedence: DEFAULT_PRECEDENCE.clone(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            diagnostics,
        };
        parser.advance();
        parser
    }

    pub fn with_precedence(mut self, precedence: HashMap<char, i32>) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Installs or overrides a binary operator. A precedence of zero or
    /// less removes it.
    pub fn install_binop(&mut self, op: char, precedence: i32) {
        if precedence > 0 {
            self.precedence.insert(op, precedence);
        } else {
            self.precedence.remove(&op);
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> D {
        self.diagnostics
    }

    pub fn into_lexer(self) -> Lexer<I> {
        self.lexer
    }

    /// Replaces the current token with the next one from the lexer.
    pub fn advance(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        self.location = self.lexer.token_start();
        &self.current
    }

    fn error<T>(&mut self, error: ParseError) -> ParseResult<T> {
        self.diagnostics.report(&error);
        Err(error)
    }

    fn unexpected_token<T>(&mut self) -> ParseResult<T> {
        let found = self.current.clone();
        let location = self.location;
        self.error(ParseError::UnexpectedToken { found, location })
    }

    /// toplevel
    ///   ::= definition
    ///   ::= external
    ///   ::= expression
    ///   ::= ';'
    ///
    /// Returns `None` once the input is exhausted.
    pub fn parse_item(&mut self) -> Option<ParseResult<Item>> {
        while self.current.is_char(';') {
            self.advance();
        }

        let item = match self.current {
            Token::EndOfInput => return None,
            Token::FuncDef => self.parse_definition().map(Item::Definition),
            Token::Extern => self.parse_extern().map(Item::Extern),
            _ => self.parse_top_level_expr().map(Item::Expression),
        };

        Some(item)
    }

    /// definition ::= 'def' prototype expression
    pub fn parse_definition(&mut self) -> ParseResult<Function> {
        trace!(at = %self.location, "definition");

        if self.current != Token::FuncDef {
            return self.unexpected_token();
        }
        self.advance();

        let proto = self.parse_prototype()?;
        let body = self.parse_expression()?;

        Ok(Function::new(proto, body))
    }

    /// external ::= 'extern' prototype
    pub fn parse_extern(&mut self) -> ParseResult<Prototype> {
        trace!(at = %self.location, "extern");

        if self.current != Token::Extern {
            return self.unexpected_token();
        }
        self.advance();

        self.parse_prototype()
    }

    /// toplevelexpr ::= expression
    pub fn parse_top_level_expr(&mut self) -> ParseResult<Function> {
        let body = self.parse_expression()?;
        let proto = Prototype::new(ANONYMOUS_FN, vec![]);

        Ok(Function::new(proto, body))
    }

    /// prototype
    ///   ::= id '(' id* ')'
    pub fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        trace!(at = %self.location, "prototype");

        let name = match &self.current {
            Token::Identifier(name) => name.clone(),
            found => {
                let found = found.clone();
                let location = self.location;
                return self.error(ParseError::ExpectedFunctionName { found, location });
            }
        };
        self.advance();

        if !self.current.is_char('(') {
            let found = self.current.clone();
            let location = self.location;
            return self.error(ParseError::ExpectedPrototypeOpenParen { found, location });
        }

        let mut args = vec![];

        while let Token::Identifier(arg) = self.advance() {
            args.push(arg.clone());
        }

        if !self.current.is_char(')') {
            let found = self.current.clone();
            let location = self.location;
            return self.error(ParseError::ExpectedPrototypeCloseParen { found, location });
        }
        self.advance();

        Ok(Prototype::new(name, args))
    }

    /// expression
    ///   ::= primary binoprhs
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        trace!(at = %self.location, token = %self.current, "expression");

        if self.depth >= self.max_depth {
            let limit = self.max_depth;
            let location = self.location;
            return self.error(ParseError::NestingTooDeep { limit, location });
        }

        self.depth += 1;
        let expr = self
            .parse_primary()
            .and_then(|lhs| self.parse_binop_rhs(0, lhs));
        self.depth -= 1;

        expr
    }

    /// primary
    ///   ::= identifierexpr
    ///   ::= numberexpr
    ///   ::= parenexpr
    pub fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.current {
            Token::Identifier(_) => self.parse_identifier_expr(),
            Token::Number(_) => self.parse_number_expr(),
            Token::Char('(') => self.parse_paren_expr(),
            _ => self.unexpected_token(),
        }
    }

    /// numberexpr ::= number
    pub fn parse_number_expr(&mut self) -> ParseResult<Expr> {
        trace!(at = %self.location, "number expression");

        let Token::Number(value) = self.current else {
            return self.unexpected_token();
        };
        self.advance();

        Ok(Expr::Number(value))
    }

    /// parenexpr ::= '(' expression ')'
    pub fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        trace!(at = %self.location, "paren expression");

        if !self.current.is_char('(') {
            return self.unexpected_token();
        }
        self.advance();

        let expr = self.parse_expression()?;

        if !self.current.is_char(')') {
            let found = self.current.clone();
            let location = self.location;
            return self.error(ParseError::ExpectedClosingParen { found, location });
        }
        self.advance();

        // No grouping node, the parentheses only shape the tree.
        Ok(expr)
    }

    /// identifierexpr
    ///   ::= identifier
    ///   ::= identifier '(' expression* ')'
    pub fn parse_identifier_expr(&mut self) -> ParseResult<Expr> {
        trace!(at = %self.location, "identifier expression");

        let name = match &self.current {
            Token::Identifier(name) => name.clone(),
            _ => return self.unexpected_token(),
        };
        self.advance();

        // Variable Expression
        if !self.current.is_char('(') {
            return Ok(Expr::Variable(name));
        }
        self.advance();

        // Call Expression
        let mut args = vec![];

        if !self.current.is_char(')') {
            loop {
                args.push(self.parse_expression()?);

                if self.current.is_char(')') {
                    break;
                }

                if !self.current.is_char(',') {
                    let found = self.current.clone();
                    let location = self.location;
                    return self.error(ParseError::ExpectedArgumentDelimiter { found, location });
                }
                self.advance();
            }
        }

        // Swallow the closing parenthesis
        self.advance();

        Ok(Expr::Call {
            callee: name,
            args,
        })
    }

    // The current token as a binary operator and its precedence, if it is one.
    // Tutorial names this GetTokPrecedence.
    fn current_binop(&self) -> Option<(char, i32)> {
        match self.current {
            Token::Char(op) => self
                .precedence
                .get(&op)
                .copied()
                .filter(|&prec| prec > 0)
                .map(|prec| (op, prec)),
            _ => None,
        }
    }

    /// binoprhs
    ///   ::= (binop primary)*
    ///
    /// Operator-precedence climbing, every operator is left associative.
    fn parse_binop_rhs(&mut self, expr_prec: i32, mut lhs: Expr) -> ParseResult<Expr> {
        loop {
            let (op, tok_prec) = match self.current_binop() {
                Some((op, prec)) if prec >= expr_prec => (op, prec),
                _ => return Ok(lhs),
            };
            self.advance();

            let mut rhs = self.parse_primary()?;

            // Let a tighter operator on the right take `rhs` as its lhs first.
            if self
                .current_binop()
                .is_some_and(|(_, next_prec)| tok_prec < next_prec)
            {
                rhs = self.parse_binop_rhs(tok_prec + 1, rhs)?;
            }

            lhs = Expr::binary(op, lhs, rhs);
        }
    }
}
