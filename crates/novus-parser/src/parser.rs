//! Recursive-descent statement parser + Pratt-style expression parser
//! (spec §4.2).
//!
//! The parser owns a small lookahead buffer over the token stream (grounded
//! on `examples/original_source/include/parse/parser.hpp`'s `ParserImpl`,
//! which keeps a `std::deque<lex::Token>` read buffer ahead of the input
//! iterator). Line comments are filtered out here rather than at the lexer:
//! the lexer's contract is that comments *are* tokens (spec §4.1), but no
//! parse-tree node carries one, so the parser is where they become trivia.
//!
//! On a syntax error the parser never panics or returns `Result` up to the
//! caller — it records an [`crate::node::ExprKind::Error`] /
//! [`crate::node::ItemKind::Error`] node and resynchronizes at the next
//! statement-starting keyword or top-level `;`, exactly as spec §4.2
//! describes.

use std::collections::VecDeque;

use novus_common::Span;
use novus_lexer::{Lexer, Operator, Token, TokenKind};

use crate::node::{Expr, ExprKind, Item, ItemKind, Param, TypeExpr};
use crate::precedence::{
    infix_binding_power, prefix_binding_power, CONDITIONAL_BINDING_POWER, LOGICAL_AND_BINDING_POWER,
    LOGICAL_OR_BINDING_POWER,
};

/// Tokens that may begin a new top-level statement; used for error recovery.
fn starts_statement(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Fun | TokenKind::Act | TokenKind::Struct | TokenKind::Union | TokenKind::Enum | TokenKind::Import
    )
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    buffer: VecDeque<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            buffer: VecDeque::new(),
        }
    }

    /// Parses every top-level item until end-of-input.
    pub fn parse_all(&mut self) -> Vec<Item> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item() {
            items.push(item);
        }
        items
    }

    /// Parses one top-level item, or `None` at end-of-input.
    pub fn next_item(&mut self) -> Option<Item> {
        if self.peek(0).kind == TokenKind::Eof {
            return None;
        }
        Some(match self.peek(0).kind.clone() {
            TokenKind::Fun => self.parse_func_decl(false),
            TokenKind::Act => self.parse_func_decl(true),
            TokenKind::Struct => self.parse_struct_decl(),
            TokenKind::Union => self.parse_union_decl(),
            TokenKind::Enum => self.parse_enum_decl(),
            TokenKind::Import => self.parse_import(),
            _ => self.parse_exec_stmt(),
        })
    }

    /// Parses one expression, for standalone use (e.g. tests).
    pub fn next_expr(&mut self) -> Expr {
        self.parse_expr(0)
    }

    // -- Lookahead buffer --------------------------------------------------

    fn peek(&mut self, ahead: usize) -> &Token {
        while self.buffer.len() <= ahead {
            let tok = self.lexer.next_token();
            if matches!(tok.kind, TokenKind::LineComment(_)) {
                continue;
            }
            self.buffer.push_back(tok);
        }
        &self.buffer[ahead]
    }

    fn bump(&mut self) -> Token {
        self.peek(0);
        self.buffer.pop_front().expect("peek(0) always fills the buffer")
    }

    fn at(&mut self, kind: &TokenKind) -> bool {
        &self.peek(0).kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Span, (String, Span)> {
        let tok = self.bump();
        if tok.kind == kind {
            Ok(tok.span)
        } else {
            Err((format!("expected {kind:?}, found {:?}", tok.kind), tok.span))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), (String, Span)> {
        let tok = self.bump();
        match tok.kind {
            TokenKind::Ident(name) => Ok((name, tok.span)),
            other => Err((format!("expected identifier, found {other:?}"), tok.span)),
        }
    }

    /// Resynchronizes after a syntax error: skips tokens up to (not
    /// including) the next statement-starting keyword, consuming a
    /// top-level `;` if that is what stopped the skip (spec §4.2).
    fn resync(&mut self) {
        loop {
            match &self.peek(0).kind {
                TokenKind::Eof => return,
                TokenKind::Semi => {
                    self.bump();
                    return;
                }
                k if starts_statement(k) => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn error_item(&mut self, message: String, span: Span) -> Item {
        self.resync();
        Item::error(message, span)
    }

    // -- Type expressions ---------------------------------------------------

    fn parse_type_expr(&mut self) -> Result<TypeExpr, (String, Span)> {
        let (name, mut span) = self.expect_ident()?;
        let mut type_params = Vec::new();
        if self.eat(&TokenKind::LBrace) {
            loop {
                type_params.push(self.parse_type_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            span = span.merge(self.expect(TokenKind::RBrace)?);
        }
        Ok(TypeExpr { name, type_params, span })
    }

    fn parse_type_params(&mut self) -> Result<Vec<String>, (String, Span)> {
        let mut params = Vec::new();
        if self.eat(&TokenKind::LBrace) {
            loop {
                params.push(self.expect_ident()?.0);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace)?;
        }
        Ok(params)
    }

    // -- Statements -----------------------------------------------------------

    /// The name position of a `fun`/`act` declaration: a plain identifier,
    /// or an operator spelled literally (`+`, `==`, `[]`, `()`) to declare
    /// an operator overload (spec §4.4's `NonOverloadableOperator`/
    /// `OperatorOverloadWithoutArgs` diagnostics presuppose this surface
    /// form).
    fn parse_func_name(&mut self) -> Result<(String, Span), (String, Span)> {
        match self.peek(0).kind.clone() {
            TokenKind::Op(op) => {
                let span = self.bump().span;
                Ok((op.func_name().to_string(), span))
            }
            TokenKind::LBracket if self.peek(1).kind == TokenKind::RBracket => {
                let start = self.bump().span;
                let end = self.bump().span;
                Ok((Operator::SquareSquare.func_name().to_string(), start.merge(end)))
            }
            TokenKind::LParen if self.peek(1).kind == TokenKind::RParen => {
                let start = self.bump().span;
                let end = self.bump().span;
                Ok((Operator::ParenParen.func_name().to_string(), start.merge(end)))
            }
            _ => self.expect_ident(),
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, (String, Span)> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let ty = self.parse_type_expr()?;
                let (name, name_span) = self.expect_ident()?;
                let mut span = ty.span.merge(name_span);
                let default = if self.eat(&TokenKind::Eq) {
                    let value = self.parse_expr(0);
                    span = span.merge(value.span);
                    Some(value)
                } else {
                    None
                };
                params.push(Param { name, ty, default, span });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_func_decl(&mut self, is_action: bool) -> Item {
        let start = self.bump().span; // `fun` / `act`
        match self.parse_func_decl_inner(is_action) {
            Ok(item) => item,
            Err((message, span)) => self.error_item(message, start.merge(span)),
        }
    }

    fn parse_func_decl_inner(&mut self, is_action: bool) -> Result<Item, (String, Span)> {
        // `implicit` is not a keyword; it is recognized positionally as a
        // plain identifier right after `fun`, naming the declaration as an
        // implicit-conversion function (target-type name doubles as the
        // function name, no `->` is written since the return type is the
        // name itself).
        let mut is_implicit_conv = false;
        if let TokenKind::Ident(name) = &self.peek(0).kind {
            if name == "implicit" {
                is_implicit_conv = true;
                self.bump();
            }
        }

        let (name, name_span) = self.parse_func_name()?;
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        let ret = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let body = self.parse_expr(0);
        let span = name_span.merge(body.span);
        Ok(Item::new(
            ItemKind::Func {
                name,
                type_params,
                params,
                ret,
                is_action,
                is_implicit_conv,
                body,
            },
            span,
        ))
    }

    fn parse_struct_decl(&mut self) -> Item {
        let start = self.bump().span; // `struct`
        match self.parse_struct_decl_inner() {
            Ok(item) => item,
            Err((message, span)) => self.error_item(message, start.merge(span)),
        }
    }

    fn parse_struct_decl_inner(&mut self) -> Result<Item, (String, Span)> {
        let (name, mut span) = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let mut fields = Vec::new();
        if self.eat(&TokenKind::Eq) {
            loop {
                let ty = self.parse_type_expr()?;
                let (field_name, field_span) = self.expect_ident()?;
                span = span.merge(field_span);
                fields.push((field_name, ty));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(Item::new(ItemKind::Struct { name, type_params, fields }, span))
    }

    fn parse_union_decl(&mut self) -> Item {
        let start = self.bump().span; // `union`
        match self.parse_union_decl_inner() {
            Ok(item) => item,
            Err((message, span)) => self.error_item(message, start.merge(span)),
        }
    }

    fn parse_union_decl_inner(&mut self) -> Result<Item, (String, Span)> {
        let (name, mut span) = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(TokenKind::Eq)?;
        let mut members = Vec::new();
        loop {
            let member = self.parse_type_expr()?;
            span = span.merge(member.span);
            members.push(member);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Item::new(ItemKind::Union { name, type_params, members }, span))
    }

    fn parse_enum_decl(&mut self) -> Item {
        let start = self.bump().span; // `enum`
        match self.parse_enum_decl_inner() {
            Ok(item) => item,
            Err((message, span)) => self.error_item(message, start.merge(span)),
        }
    }

    fn parse_enum_decl_inner(&mut self) -> Result<Item, (String, Span)> {
        let (name, mut span) = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let mut entries = Vec::new();
        loop {
            let (entry_name, entry_span) = self.expect_ident()?;
            span = span.merge(entry_span);
            let value = if self.eat(&TokenKind::Colon) {
                let tok = self.bump();
                span = span.merge(tok.span);
                match tok.kind {
                    TokenKind::LitInt(v) => Some(v as i32),
                    TokenKind::Op(Operator::Minus) => {
                        let next = self.bump();
                        span = span.merge(next.span);
                        match next.kind {
                            TokenKind::LitInt(v) => Some(-(v as i32)),
                            other => return Err((format!("expected integer literal, found {other:?}"), next.span)),
                        }
                    }
                    other => return Err((format!("expected integer literal, found {other:?}"), tok.span)),
                }
            } else {
                None
            };
            entries.push((entry_name, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Item::new(ItemKind::Enum { name, entries }, span))
    }

    fn parse_import(&mut self) -> Item {
        let start = self.bump().span; // `import`
        let tok = self.bump();
        match tok.kind {
            TokenKind::LitString(path) => Item::new(ItemKind::Import { path }, start.merge(tok.span)),
            other => self.error_item(format!("expected string literal after 'import', found {other:?}"), start.merge(tok.span)),
        }
    }

    fn parse_exec_stmt(&mut self) -> Item {
        let expr = self.parse_expr(0);
        let span = expr.span;
        if expr.is_error() {
            self.resync();
        }
        Item::new(ItemKind::Exec(expr), span)
    }

    // -- Expressions (Pratt) --------------------------------------------------

    fn parse_expr(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_prefix();
        loop {
            // Ternary: `cond ? ifTrue : ifFalse`, lowest precedence, not an
            // `Operator` (spec §4.2: non-overloadable).
            if self.at(&TokenKind::QMark) {
                if CONDITIONAL_BINDING_POWER < min_bp {
                    break;
                }
                self.bump();
                let if_true = self.parse_expr(0);
                let colon_span = match self.expect(TokenKind::Colon) {
                    Ok(span) => span,
                    Err((message, span)) => {
                        let err = Expr::error(message, span);
                        lhs = Expr::new(
                            ExprKind::Conditional {
                                cond: Box::new(lhs.clone()),
                                if_true: Box::new(if_true),
                                if_false: Box::new(err),
                            },
                            span,
                        );
                        break;
                    }
                };
                let if_false = self.parse_expr(CONDITIONAL_BINDING_POWER);
                let span = lhs.span.merge(if_false.span).merge(colon_span);
                lhs = Expr::new(
                    ExprKind::Conditional {
                        cond: Box::new(lhs),
                        if_true: Box::new(if_true),
                        if_false: Box::new(if_false),
                    },
                    span,
                );
                continue;
            }

            if matches!(self.peek(0).kind, TokenKind::AmpAmp | TokenKind::PipePipe) {
                let is_and = self.peek(0).kind == TokenKind::AmpAmp;
                let (left_bp, right_bp) = if is_and {
                    LOGICAL_AND_BINDING_POWER
                } else {
                    LOGICAL_OR_BINDING_POWER
                };
                if left_bp < min_bp {
                    break;
                }
                self.bump();
                let rhs = self.parse_expr(right_bp);
                let span = lhs.span.merge(rhs.span);
                lhs = Expr::new(
                    if is_and {
                        ExprKind::LogicalAnd { lhs: Box::new(lhs), rhs: Box::new(rhs) }
                    } else {
                        ExprKind::LogicalOr { lhs: Box::new(lhs), rhs: Box::new(rhs) }
                    },
                    span,
                );
                continue;
            }

            let op = match &self.peek(0).kind {
                TokenKind::Op(op) => *op,
                _ => break,
            };
            let Some((left_bp, right_bp)) = infix_binding_power(op) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.bump();
            let rhs = self.parse_expr(right_bp);
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        lhs
    }

    fn parse_prefix(&mut self) -> Expr {
        if let TokenKind::Op(op) = self.peek(0).kind {
            if let Some(bp) = prefix_binding_power(op) {
                let start = self.bump().span;
                let operand = self.parse_expr(bp);
                let span = start.merge(operand.span);
                return Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                );
            }
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek(0).kind.clone() {
                TokenKind::Dot => {
                    self.bump();
                    match self.expect_ident() {
                        Ok((name, name_span)) => {
                            let span = expr.span.merge(name_span);
                            expr = Expr::new(
                                ExprKind::Field {
                                    target: Box::new(expr),
                                    name,
                                },
                                span,
                            );
                        }
                        Err((message, span)) => {
                            expr = Expr::error(message, expr.span.merge(span));
                            break;
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expr(0);
                    match self.expect(TokenKind::RBracket) {
                        Ok(end) => {
                            let span = expr.span.merge(end);
                            expr = Expr::new(
                                ExprKind::Index {
                                    target: Box::new(expr),
                                    index: Box::new(index),
                                },
                                span,
                            );
                        }
                        Err((message, span)) => {
                            expr = Expr::error(message, expr.span.merge(span));
                            break;
                        }
                    }
                }
                TokenKind::LParen => {
                    // A call applied to something other than a bare name
                    // (`name(args)` is already folded into `Call` inside
                    // `parse_ident_or_call`, so this only ever fires for a
                    // call on a parenthesized/indexed/field/call result).
                    match self.parse_call_args() {
                        Ok((args, args_span)) => {
                            let span = expr.span.merge(args_span);
                            expr = Expr::new(
                                ExprKind::CallDyn {
                                    target: Box::new(expr),
                                    args,
                                },
                                span,
                            );
                        }
                        Err((message, span)) => {
                            expr = Expr::error(message, expr.span.merge(span));
                            break;
                        }
                    }
                }
                TokenKind::Is => {
                    self.bump();
                    match self.parse_type_expr() {
                        Ok(ty) => {
                            let span = expr.span.merge(ty.span);
                            expr = Expr::new(ExprKind::Is { target: Box::new(expr), ty }, span);
                        }
                        Err((message, span)) => {
                            expr = Expr::error(message, expr.span.merge(span));
                            break;
                        }
                    }
                }
                TokenKind::As => {
                    self.bump();
                    match self.parse_type_expr() {
                        Ok(ty) => {
                            let mut span = expr.span.merge(ty.span);
                            let bind = if let TokenKind::Ident(_) = self.peek(0).kind {
                                let (name, name_span) = self.expect_ident().unwrap();
                                span = span.merge(name_span);
                                Some(name)
                            } else {
                                None
                            };
                            expr = Expr::new(
                                ExprKind::As {
                                    target: Box::new(expr),
                                    ty,
                                    bind,
                                },
                                span,
                            );
                        }
                        Err((message, span)) => {
                            expr = Expr::error(message, expr.span.merge(span));
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let tok = self.peek(0).clone();
        match tok.kind {
            TokenKind::True => {
                self.bump();
                Expr::new(ExprKind::LitBool(true), tok.span)
            }
            TokenKind::False => {
                self.bump();
                Expr::new(ExprKind::LitBool(false), tok.span)
            }
            TokenKind::LitInt(v) => {
                self.bump();
                Expr::new(ExprKind::LitInt(v), tok.span)
            }
            TokenKind::LitLong(v) => {
                self.bump();
                Expr::new(ExprKind::LitLong(v), tok.span)
            }
            TokenKind::LitFloat(v) => {
                self.bump();
                Expr::new(ExprKind::LitFloat(v), tok.span)
            }
            TokenKind::LitString(s) => {
                self.bump();
                Expr::new(ExprKind::LitString(s), tok.span)
            }
            TokenKind::LitChar(c) => {
                self.bump();
                Expr::new(ExprKind::LitChar(c), tok.span)
            }
            TokenKind::LParen => self.parse_paren_or_group(),
            TokenKind::If => self.parse_switch(),
            TokenKind::Lazy | TokenKind::Fork => {
                // `lazy expr` / `fork expr` modify a call's `CallMode`; the
                // frontend resolves the mode from the wrapped call shape
                // (spec §4.4), so the parser just wraps whatever follows.
                let is_lazy = tok.kind == TokenKind::Lazy;
                self.bump();
                let operand = self.parse_expr(0);
                let span = tok.span.merge(operand.span);
                let kind = if is_lazy {
                    ExprKind::Lazy(Box::new(operand))
                } else {
                    ExprKind::Fork(Box::new(operand))
                };
                Expr::new(kind, span)
            }
            TokenKind::Ident(name) if name == "lambda" => self.parse_lambda(),
            TokenKind::Intrinsic => self.parse_intrinsic_call(),
            TokenKind::Ident(name) => {
                self.bump();
                self.parse_ident_or_call(name, tok.span)
            }
            TokenKind::Error(message) => {
                self.bump();
                Expr::error(message, tok.span)
            }
            other => {
                self.bump();
                Expr::error(format!("expected an expression, found {other:?}"), tok.span)
            }
        }
    }

    fn parse_intrinsic_call(&mut self) -> Expr {
        let start = self.bump().span; // `intrinsic`
        match self.parse_intrinsic_call_inner() {
            Ok(expr) => expr,
            Err((message, span)) => Expr::error(message, start.merge(span)),
        }
    }

    fn parse_intrinsic_call_inner(&mut self) -> Result<Expr, (String, Span)> {
        self.expect(TokenKind::LBrace)?;
        let (name, name_span) = self.expect_ident()?;
        let end = self.expect(TokenKind::RBrace)?;
        let args = self.parse_call_args()?;
        let span = name_span.merge(end).merge(args.1);
        Ok(Expr::new(
            ExprKind::Call {
                callee: format!("intrinsic{{{name}}}"),
                type_args: Vec::new(),
                args: args.0,
            },
            span,
        ))
    }

    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, Span), (String, Span)> {
        let start = self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr(0));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(TokenKind::RParen)?;
        Ok((args, start.merge(end)))
    }

    fn parse_ident_or_call(&mut self, name: String, name_span: Span) -> Expr {
        let mut type_args = Vec::new();
        let mut span = name_span;
        if self.at(&TokenKind::LBrace) {
            match self.parse_call_type_args() {
                Ok((args, args_span)) => {
                    type_args = args;
                    span = span.merge(args_span);
                }
                Err((message, err_span)) => return Expr::error(message, span.merge(err_span)),
            }
        }
        if self.at(&TokenKind::LParen) {
            match self.parse_call_args() {
                Ok((args, args_span)) => {
                    return Expr::new(
                        ExprKind::Call {
                            callee: name,
                            type_args,
                            args,
                        },
                        span.merge(args_span),
                    )
                }
                Err((message, err_span)) => return Expr::error(message, span.merge(err_span)),
            }
        }
        if !type_args.is_empty() {
            // A bare `name{T1,T2}` with no argument list still denotes a
            // templated-zero-arg call/construction.
            return Expr::new(
                ExprKind::Call {
                    callee: name,
                    type_args,
                    args: Vec::new(),
                },
                span,
            );
        }
        Expr::new(ExprKind::Ident(name), span)
    }

    fn parse_call_type_args(&mut self) -> Result<(Vec<TypeExpr>, Span), (String, Span)> {
        let start = self.expect(TokenKind::LBrace)?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace)?;
        Ok((args, start.merge(end)))
    }

    /// `(expr)` or `(e1; e2; ...)` — a parenthesized group; `;`-separated
    /// sub-expressions collapse to `ExprKind::Group` (spec §3: "`Group`:
    /// sequenced evaluation; type = last element's type; size >= 2"), a bare
    /// `name = value` first element declares a local constant usable by the
    /// rest of the group (spec §4.4's const-decl rule, and the
    /// `if x = 1; true -> x` condition-group surface form).
    fn parse_paren_or_group(&mut self) -> Expr {
        let start = self.bump().span; // `(`
        let first = self.parse_group_element();
        let mut elements = vec![first];
        while self.eat(&TokenKind::Semi) {
            elements.push(self.parse_group_element());
        }
        let end = match self.expect(TokenKind::RParen) {
            Ok(span) => span,
            Err((message, span)) => return Expr::error(message, start.merge(span)),
        };
        let span = start.merge(end);
        if elements.len() == 1 {
            Expr::new(ExprKind::Paren(Box::new(elements.pop().unwrap())), span)
        } else {
            Expr::new(ExprKind::Group(elements), span)
        }
    }

    /// One element of a group: either `name = value` (const-decl) or a
    /// plain expression.
    fn parse_group_element(&mut self) -> Expr {
        if let TokenKind::Ident(name) = self.peek(0).kind.clone() {
            if self.peek(1).kind == TokenKind::Eq {
                let name_span = self.bump().span;
                self.bump(); // `=`
                let value = self.parse_expr(0);
                let span = name_span.merge(value.span);
                return Expr::new(
                    ExprKind::ConstDecl {
                        name,
                        value: Box::new(value),
                    },
                    span,
                );
            }
        }
        self.parse_expr(0)
    }

    /// `if c1 -> b1  if c2 -> b2  ...  else -> bN`, each condition/branch
    /// itself a full expression (often a `(x = expr; cond)` group, per the
    /// "declare consts in switch conditions" surface form).
    fn parse_switch(&mut self) -> Expr {
        let start = self.peek(0).span;
        let mut conditions = Vec::new();
        let mut branches = Vec::new();
        loop {
            self.bump(); // `if`
            conditions.push(self.parse_expr(0));
            if let Err((message, span)) = self.expect(TokenKind::Arrow) {
                branches.push(Expr::error(message, span));
                break;
            }
            branches.push(self.parse_expr(0));
            if !self.at(&TokenKind::If) {
                break;
            }
        }
        match self.expect(TokenKind::Else) {
            Ok(_) => {}
            Err((message, span)) => {
                branches.push(Expr::error(message, span));
                let span = start.merge(branches.last().unwrap().span);
                return Expr::new(ExprKind::Switch { conditions, branches }, span);
            }
        }
        if let Err((message, span)) = self.expect(TokenKind::Arrow) {
            branches.push(Expr::error(message, span));
        } else {
            branches.push(self.parse_expr(0));
        }
        let span = start.merge(branches.last().unwrap().span);
        Expr::new(ExprKind::Switch { conditions, branches }, span)
    }

    /// `lambda (params) [-> retType] body`.
    fn parse_lambda(&mut self) -> Expr {
        let start = self.bump().span; // `lambda`
        match self.parse_lambda_inner(start) {
            Ok(expr) => expr,
            Err((message, span)) => Expr::error(message, start.merge(span)),
        }
    }

    fn parse_lambda_inner(&mut self, start: Span) -> Result<Expr, (String, Span)> {
        let is_action = self.eat(&TokenKind::Act);
        let params = self.parse_params()?;
        let ret = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let body = self.parse_expr(0);
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                ret,
                is_action,
                body: Box::new(body),
            },
            span,
        ))
    }
}

#[cfg(test)]
#[path = "../tests/parser.rs"]
mod tests;
