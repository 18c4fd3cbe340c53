use super::ast::*;
use super::diagnostic::Diagnostics;
use super::lexer::{Keyword, Symbol, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    pub diags: Diagnostics,
    next_expr_id: ExprId,
    allow_composite_lit: bool,
}

/// Result of parsing an `if`/`for` header statement, where a `range` clause
/// may appear where an ordinary right-hand side would.
enum HeaderStmt {
    Simple(Stmt),
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        subject: Expr,
        span: Span,
    },
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span {
                    start: 0,
                    end: 0,
                    line: 1,
                    column: 1,
                },
            });
        }
        Self {
            tokens,
            idx: 0,
            diags: Diagnostics::default(),
            next_expr_id: 0,
            allow_composite_lit: true,
        }
    }

    fn new_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = self.next_expr_id;
        self.next_expr_id += 1;
        Expr { id, kind, span }
    }

    fn new_ident(&mut self, name: String, span: Span) -> Ident {
        let id = self.next_expr_id;
        self.next_expr_id += 1;
        Ident { id, name, span }
    }

    pub fn parse_file(&mut self) -> Option<File> {
        let package_name = self.parse_package_clause()?;
        self.consume_semis();
        let mut imports = Vec::new();
        while self.at_keyword(Keyword::Import) {
            self.parse_import_decl(&mut imports);
            self.consume_semis();
        }
        let mut decls = Vec::new();
        while !self.at_eof() {
            if self.at_symbol(Symbol::Semi) {
                self.bump();
                continue;
            }
            if self.at_keyword(Keyword::Func) {
                if let Some(func) = self.parse_func_decl() {
                    decls.push(Decl::Func(func));
                }
                continue;
            }
            if self.at_keyword(Keyword::Var) {
                self.parse_grouped(|p, out: &mut Vec<Decl>| {
                    if let Some(decl) = p.parse_var_spec() {
                        out.push(Decl::Var(decl));
                    }
                }, &mut decls);
                continue;
            }
            if self.at_keyword(Keyword::Const) {
                self.parse_grouped(|p, out: &mut Vec<Decl>| {
                    if let Some(decl) = p.parse_const_spec() {
                        out.push(Decl::Const(decl));
                    }
                }, &mut decls);
                continue;
            }
            if self.at_keyword(Keyword::Type) {
                self.parse_grouped(|p, out: &mut Vec<Decl>| {
                    if let Some(decl) = p.parse_type_spec() {
                        out.push(Decl::Type(decl));
                    }
                }, &mut decls);
                continue;
            }
            self.error_here("expected declaration");
            self.bump();
        }
        Some(File {
            package_name,
            imports,
            decls,
        })
    }

    fn parse_package_clause(&mut self) -> Option<String> {
        if !self.at_keyword(Keyword::Package) {
            self.error_here("file must start with `package`");
            return None;
        }
        self.bump();
        match self.bump().kind {
            TokenKind::Ident(name) => Some(name),
            _ => {
                self.error_here("expected package name");
                None
            }
        }
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) {
        self.bump(); // import
        if self.at_symbol(Symbol::LParen) {
            self.bump();
            while !self.at_symbol(Symbol::RParen) && !self.at_eof() {
                if self.at_symbol(Symbol::Semi) {
                    self.bump();
                    continue;
                }
                if let Some(spec) = self.parse_import_spec() {
                    imports.push(spec);
                }
            }
            self.expect_symbol(Symbol::RParen);
        } else if let Some(spec) = self.parse_import_spec() {
            imports.push(spec);
        }
    }

    fn parse_import_spec(&mut self) -> Option<ImportSpec> {
        let span = self.peek_span()?;
        let alias = match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Some(name)
            }
            TokenKind::Symbol(Symbol::Dot) => {
                // Dot imports are accepted but their names are not resolved.
                self.bump();
                None
            }
            _ => None,
        };
        match self.bump().kind {
            TokenKind::StringLit(path) => Some(ImportSpec { path, alias, span }),
            _ => {
                self.error_here("expected import path");
                None
            }
        }
    }

    /// Parses `var`/`const`/`type` declarations, both the single-spec and
    /// parenthesized group forms.
    fn parse_grouped<F>(&mut self, mut each: F, out: &mut Vec<Decl>)
    where
        F: FnMut(&mut Parser, &mut Vec<Decl>),
    {
        self.bump(); // var | const | type
        if self.at_symbol(Symbol::LParen) {
            self.bump();
            while !self.at_symbol(Symbol::RParen) && !self.at_eof() {
                if self.at_symbol(Symbol::Semi) {
                    self.bump();
                    continue;
                }
                each(self, out);
            }
            self.expect_symbol(Symbol::RParen);
        } else {
            each(self, out);
        }
    }

    fn parse_var_spec(&mut self) -> Option<VarDecl> {
        let span = self.peek_span()?;
        let names = self.parse_ident_list()?;
        let ty = if !self.at_symbol(Symbol::Eq)
            && !self.at_symbol(Symbol::Semi)
            && !self.at_symbol(Symbol::RParen)
            && !self.at_symbol(Symbol::RBrace)
            && !self.at_eof()
        {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.at_symbol(Symbol::Eq) {
            self.bump();
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        Some(VarDecl {
            names,
            ty,
            values,
            span,
        })
    }

    fn parse_const_spec(&mut self) -> Option<ConstDecl> {
        let var = self.parse_var_spec()?;
        Some(ConstDecl {
            names: var.names,
            ty: var.ty,
            values: var.values,
            span: var.span,
        })
    }

    fn parse_type_spec(&mut self) -> Option<TypeDecl> {
        let span = self.peek_span()?;
        let name = self.parse_ident()?;
        // `type alias = T` is treated like a definition; aliasing does not
        // change what this tool flags.
        if self.at_symbol(Symbol::Eq) {
            self.bump();
        }
        let ty = self.parse_type()?;
        Some(TypeDecl { name, ty, span })
    }

    fn parse_func_decl(&mut self) -> Option<FuncDecl> {
        let span = self.bump().span; // func
        let recv = if self.at_symbol(Symbol::LParen) {
            let fields = self.parse_field_list()?;
            fields.into_iter().next()
        } else {
            None
        };
        let name = match self.bump().kind {
            TokenKind::Ident(name) => name,
            _ => {
                self.error_here("expected function name");
                return None;
            }
        };
        let (params, results) = self.parse_signature()?;
        let body = if self.at_symbol(Symbol::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Some(FuncDecl {
            name,
            recv,
            params,
            results,
            body,
            span,
        })
    }

    fn parse_signature(&mut self) -> Option<(Vec<Field>, Vec<Field>)> {
        let params = self.parse_field_list()?;
        let results = if self.at_symbol(Symbol::LParen) {
            self.parse_field_list()?
        } else if self.at_type_start() {
            let ty = self.parse_type()?;
            vec![Field {
                names: Vec::new(),
                span: ty.span.clone(),
                ty,
            }]
        } else {
            Vec::new()
        };
        Some((params, results))
    }

    /// Parses a parenthesized parameter/result list. Go lets names share a
    /// trailing type (`a, b int`); names and types are disambiguated after
    /// the whole list is read, the way gc's parser does it.
    fn parse_field_list(&mut self) -> Option<Vec<Field>> {
        self.expect_symbol(Symbol::LParen);
        let mut items: Vec<(Option<Ident>, TypeExpr, Span)> = Vec::new();
        while !self.at_symbol(Symbol::RParen) && !self.at_eof() {
            let start = self.peek_span()?;
            if matches!(self.peek().kind, TokenKind::Ident(_)) && self.ident_then_type() {
                let name = self.parse_ident()?;
                let ty = self.parse_type()?;
                items.push((Some(name), ty, start));
            } else {
                let ty = self.parse_type()?;
                items.push((None, ty, start));
            }
            if self.at_symbol(Symbol::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_symbol(Symbol::RParen);

        if items.iter().all(|(name, _, _)| name.is_none()) {
            return Some(
                items
                    .into_iter()
                    .map(|(_, ty, span)| Field {
                        names: Vec::new(),
                        ty,
                        span,
                    })
                    .collect(),
            );
        }

        // Mixed mode: a bare item must be a plain identifier acting as a
        // name that shares the next explicitly-typed item's type.
        let mut fields = Vec::new();
        let mut pending: Vec<Ident> = Vec::new();
        for (name, ty, span) in items {
            match name {
                Some(name) => {
                    let mut names = std::mem::take(&mut pending);
                    names.push(name);
                    fields.push(Field { names, ty, span });
                }
                None => match ty.kind {
                    TypeExprKind::Named(text) => {
                        pending.push(self.new_ident(text, ty.span));
                    }
                    _ => {
                        self.diags.push(
                            "cannot mix named and unnamed parameters",
                            Some(ty.span.clone()),
                        );
                    }
                },
            }
        }
        if !pending.is_empty() {
            let span = pending[0].span.clone();
            self.diags
                .push("parameter names lack a type", Some(span));
        }
        Some(fields)
    }

    /// True when the token after the current identifier begins a type, which
    /// makes the identifier a parameter name rather than a type.
    fn ident_then_type(&self) -> bool {
        matches!(
            self.tokens.get(self.idx + 1).map(|t| &t.kind),
            Some(TokenKind::Ident(_))
                | Some(TokenKind::Symbol(Symbol::Star))
                | Some(TokenKind::Symbol(Symbol::LBracket))
                | Some(TokenKind::Symbol(Symbol::Ellipsis))
                | Some(TokenKind::Symbol(Symbol::Arrow))
                | Some(TokenKind::Keyword(Keyword::Map))
                | Some(TokenKind::Keyword(Keyword::Chan))
                | Some(TokenKind::Keyword(Keyword::Func))
                | Some(TokenKind::Keyword(Keyword::Interface))
                | Some(TokenKind::Keyword(Keyword::Struct))
        )
    }

    fn at_type_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident(_)
                | TokenKind::Symbol(Symbol::Star)
                | TokenKind::Symbol(Symbol::LBracket)
                | TokenKind::Symbol(Symbol::Arrow)
                | TokenKind::Keyword(Keyword::Map)
                | TokenKind::Keyword(Keyword::Chan)
                | TokenKind::Keyword(Keyword::Func)
                | TokenKind::Keyword(Keyword::Interface)
                | TokenKind::Keyword(Keyword::Struct)
        )
    }

    pub fn parse_type(&mut self) -> Option<TypeExpr> {
        let span = self.peek_span()?;
        match self.peek().kind.clone() {
            TokenKind::Symbol(Symbol::Star) => {
                self.bump();
                let inner = self.parse_type()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Pointer(Box::new(inner)),
                    span,
                })
            }
            TokenKind::Symbol(Symbol::LBracket) => {
                self.bump();
                if self.at_symbol(Symbol::RBracket) {
                    self.bump();
                    let elem = self.parse_type()?;
                    Some(TypeExpr {
                        kind: TypeExprKind::Slice(Box::new(elem)),
                        span,
                    })
                } else {
                    let _len = self.parse_expr()?;
                    self.expect_symbol(Symbol::RBracket);
                    let elem = self.parse_type()?;
                    Some(TypeExpr {
                        kind: TypeExprKind::Array(Box::new(elem)),
                        span,
                    })
                }
            }
            TokenKind::Symbol(Symbol::Ellipsis) => {
                self.bump();
                let inner = self.parse_type()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Ellipsis(Box::new(inner)),
                    span,
                })
            }
            TokenKind::Symbol(Symbol::Arrow) => {
                self.bump();
                self.expect_keyword(Keyword::Chan);
                let elem = self.parse_type()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Chan(Box::new(elem)),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Chan) => {
                self.bump();
                if self.at_symbol(Symbol::Arrow) {
                    self.bump();
                }
                let elem = self.parse_type()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Chan(Box::new(elem)),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Map) => {
                self.bump();
                self.expect_symbol(Symbol::LBracket);
                let key = self.parse_type()?;
                self.expect_symbol(Symbol::RBracket);
                let value = self.parse_type()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Map(Box::new(key), Box::new(value)),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Func) => {
                self.bump();
                let (params, results) = self.parse_signature()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Func {
                        params: params.into_iter().map(|f| f.ty).collect(),
                        results: results.into_iter().map(|f| f.ty).collect(),
                    },
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Interface) => {
                self.bump();
                self.skip_balanced_braces();
                Some(TypeExpr {
                    kind: TypeExprKind::Interface,
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Struct) => {
                self.bump();
                let fields = self.parse_struct_fields()?;
                Some(TypeExpr {
                    kind: TypeExprKind::Struct(fields),
                    span,
                })
            }
            TokenKind::Symbol(Symbol::LParen) => {
                self.bump();
                let inner = self.parse_type()?;
                self.expect_symbol(Symbol::RParen);
                Some(inner)
            }
            TokenKind::Ident(name) => {
                self.bump();
                if self.at_symbol(Symbol::Dot) {
                    self.bump();
                    match self.bump().kind {
                        TokenKind::Ident(member) => Some(TypeExpr {
                            kind: TypeExprKind::Qualified(name, member),
                            span,
                        }),
                        _ => {
                            self.error_here("expected type name after `.`");
                            None
                        }
                    }
                } else {
                    Some(TypeExpr {
                        kind: TypeExprKind::Named(name),
                        span,
                    })
                }
            }
            _ => {
                self.error_here("expected type");
                None
            }
        }
    }

    fn parse_struct_fields(&mut self) -> Option<Vec<Field>> {
        self.expect_symbol(Symbol::LBrace);
        let mut fields = Vec::new();
        while !self.at_symbol(Symbol::RBrace) && !self.at_eof() {
            if self.at_symbol(Symbol::Semi) {
                self.bump();
                continue;
            }
            let span = self.peek_span()?;
            if matches!(self.peek().kind, TokenKind::Ident(_)) && self.ident_then_type() {
                let mut names = vec![self.parse_ident()?];
                while self.at_symbol(Symbol::Comma) {
                    self.bump();
                    names.push(self.parse_ident()?);
                }
                let ty = self.parse_type()?;
                fields.push(Field { names, ty, span });
            } else {
                // Embedded field: the type stands alone.
                let ty = self.parse_type()?;
                fields.push(Field {
                    names: Vec::new(),
                    ty,
                    span,
                });
            }
            // Struct tags are skipped.
            if matches!(self.peek().kind, TokenKind::StringLit(_)) {
                self.bump();
            }
        }
        self.expect_symbol(Symbol::RBrace);
        Some(fields)
    }

    fn skip_balanced_braces(&mut self) {
        self.expect_symbol(Symbol::LBrace);
        let mut depth = 1usize;
        while depth > 0 && !self.at_eof() {
            if self.at_symbol(Symbol::LBrace) {
                depth += 1;
            } else if self.at_symbol(Symbol::RBrace) {
                depth -= 1;
            }
            self.bump();
        }
    }

    pub fn parse_block(&mut self) -> Option<Block> {
        let span = self.peek_span()?;
        let saved = self.allow_composite_lit;
        self.allow_composite_lit = true;
        self.expect_symbol(Symbol::LBrace);
        let mut stmts = Vec::new();
        while !self.at_symbol(Symbol::RBrace) && !self.at_eof() {
            if self.at_symbol(Symbol::Semi) {
                self.bump();
                continue;
            }
            if self.parse_decl_or_stmt(&mut stmts).is_none() {
                // Recover at the next statement boundary.
                while !self.at_symbol(Symbol::Semi)
                    && !self.at_symbol(Symbol::RBrace)
                    && !self.at_eof()
                {
                    self.bump();
                }
            }
            if self.at_symbol(Symbol::Semi) {
                self.bump();
            }
        }
        self.expect_symbol(Symbol::RBrace);
        self.allow_composite_lit = saved;
        Some(Block { stmts, span })
    }

    /// One entry of a statement list. A grouped `var (...)`/`const (...)`
    /// declaration expands to one statement per spec, all in the enclosing
    /// scope; everything else is a single statement.
    fn parse_decl_or_stmt(&mut self, out: &mut Vec<Stmt>) -> Option<()> {
        if self.at_keyword(Keyword::Var) {
            let mut decls = Vec::new();
            self.parse_grouped(|p, out: &mut Vec<Decl>| {
                if let Some(decl) = p.parse_var_spec() {
                    out.push(Decl::Var(decl));
                }
            }, &mut decls);
            for decl in decls {
                if let Decl::Var(decl) = decl {
                    out.push(Stmt::Var(decl));
                }
            }
            return Some(());
        }
        if self.at_keyword(Keyword::Const) {
            let mut decls = Vec::new();
            self.parse_grouped(|p, out: &mut Vec<Decl>| {
                if let Some(decl) = p.parse_const_spec() {
                    out.push(Decl::Const(decl));
                }
            }, &mut decls);
            for decl in decls {
                if let Decl::Const(decl) = decl {
                    out.push(Stmt::Const(decl));
                }
            }
            return Some(());
        }
        out.push(self.parse_stmt()?);
        Some(())
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        if self.at_keyword(Keyword::Return) {
            let span = self.bump().span;
            let results = if self.at_symbol(Symbol::Semi) || self.at_symbol(Symbol::RBrace) {
                Vec::new()
            } else {
                self.parse_expr_list()?
            };
            return Some(Stmt::Return { results, span });
        }
        if self.at_keyword(Keyword::Break) {
            let span = self.bump().span;
            if matches!(self.peek().kind, TokenKind::Ident(_)) {
                self.bump(); // label
            }
            return Some(Stmt::Break { span });
        }
        if self.at_keyword(Keyword::Continue) {
            let span = self.bump().span;
            if matches!(self.peek().kind, TokenKind::Ident(_)) {
                self.bump(); // label
            }
            return Some(Stmt::Continue { span });
        }
        if self.at_keyword(Keyword::Defer) {
            let span = self.bump().span;
            let call = self.parse_expr()?;
            if !matches!(call.kind, ExprKind::Call { .. }) {
                self.diags.push(
                    "expression in defer must be function call",
                    Some(call.span.clone()),
                );
            }
            return Some(Stmt::Defer { call, span });
        }
        if self.at_keyword(Keyword::Go) {
            let span = self.bump().span;
            let call = self.parse_expr()?;
            if !matches!(call.kind, ExprKind::Call { .. }) {
                self.diags.push(
                    "expression in go must be function call",
                    Some(call.span.clone()),
                );
            }
            return Some(Stmt::Go { call, span });
        }
        if self.at_keyword(Keyword::If) {
            return self.parse_if_stmt();
        }
        if self.at_keyword(Keyword::For) {
            return self.parse_for_stmt();
        }
        if self.at_keyword(Keyword::Switch) {
            return self.parse_switch_stmt();
        }
        if self.at_symbol(Symbol::LBrace) {
            return Some(Stmt::Block(self.parse_block()?));
        }
        match self.parse_header_stmt()? {
            HeaderStmt::Simple(stmt) => Some(stmt),
            HeaderStmt::Range { span, .. } => {
                self.diags
                    .push("range is only valid in a for statement", Some(span));
                None
            }
        }
    }

    /// One simple statement: expression, assignment, short declaration, or
    /// increment/decrement. Recognizes a trailing `range` clause so `for`
    /// headers can reuse it.
    fn parse_header_stmt(&mut self) -> Option<HeaderStmt> {
        let span = self.peek_span()?;
        let mut exprs = vec![self.parse_expr()?];
        while self.at_symbol(Symbol::Comma) {
            self.bump();
            exprs.push(self.parse_expr()?);
        }
        let op = match self.peek().kind {
            TokenKind::Symbol(Symbol::ColonEq) => Some(AssignOp::Define),
            TokenKind::Symbol(Symbol::Eq) => Some(AssignOp::Assign),
            TokenKind::Symbol(Symbol::PlusEq) => Some(AssignOp::AddAssign),
            TokenKind::Symbol(Symbol::MinusEq) => Some(AssignOp::SubAssign),
            TokenKind::Symbol(Symbol::StarEq) => Some(AssignOp::MulAssign),
            TokenKind::Symbol(Symbol::SlashEq) => Some(AssignOp::DivAssign),
            TokenKind::Symbol(Symbol::PercentEq) => Some(AssignOp::RemAssign),
            TokenKind::Symbol(Symbol::AmpEq) => Some(AssignOp::BitAndAssign),
            TokenKind::Symbol(Symbol::PipeEq) => Some(AssignOp::BitOrAssign),
            TokenKind::Symbol(Symbol::CaretEq) => Some(AssignOp::BitXorAssign),
            TokenKind::Symbol(Symbol::ShlEq) => Some(AssignOp::ShlAssign),
            TokenKind::Symbol(Symbol::ShrEq) => Some(AssignOp::ShrAssign),
            TokenKind::Symbol(Symbol::AmpCaretEq) => Some(AssignOp::AndNotAssign),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            if self.at_keyword(Keyword::Range) {
                self.bump();
                let subject = self.parse_expr()?;
                let mut iter = exprs.into_iter();
                return Some(HeaderStmt::Range {
                    key: iter.next(),
                    value: iter.next(),
                    define: op == AssignOp::Define,
                    subject,
                    span,
                });
            }
            let rhs = self.parse_expr_list()?;
            return Some(HeaderStmt::Simple(Stmt::Assign {
                op,
                lhs: exprs,
                rhs,
                span,
            }));
        }
        if self.at_symbol(Symbol::PlusPlus) || self.at_symbol(Symbol::MinusMinus) {
            let is_inc = self.at_symbol(Symbol::PlusPlus);
            self.bump();
            if exprs.len() != 1 {
                self.diags
                    .push("expected one operand for ++/--", Some(span.clone()));
            }
            let target = exprs.into_iter().next()?;
            return Some(HeaderStmt::Simple(Stmt::IncDec {
                target,
                is_inc,
                span,
            }));
        }
        if exprs.len() != 1 {
            self.diags
                .push("expected assignment after expression list", Some(span.clone()));
        }
        let expr = exprs.into_iter().next()?;
        Some(HeaderStmt::Simple(Stmt::Expr { expr, span }))
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let span = self.bump().span; // if
        let saved = self.allow_composite_lit;
        self.allow_composite_lit = false;
        let first = self.parse_header_stmt()?;
        let (init, cond) = if self.at_symbol(Symbol::Semi) {
            self.bump();
            let init = match first {
                HeaderStmt::Simple(stmt) => Some(Box::new(stmt)),
                HeaderStmt::Range { span, .. } => {
                    self.diags
                        .push("range is only valid in a for statement", Some(span));
                    None
                }
            };
            let cond = self.parse_expr()?;
            (init, cond)
        } else {
            match first {
                HeaderStmt::Simple(Stmt::Expr { expr, .. }) => (None, expr),
                HeaderStmt::Simple(other) => {
                    let stmt_span = stmt_span(&other);
                    self.diags
                        .push("missing condition in if statement", Some(stmt_span));
                    self.allow_composite_lit = saved;
                    return None;
                }
                HeaderStmt::Range { span, .. } => {
                    self.diags
                        .push("range is only valid in a for statement", Some(span));
                    self.allow_composite_lit = saved;
                    return None;
                }
            }
        };
        self.allow_composite_lit = saved;
        let then_block = self.parse_block()?;
        let else_branch = if self.at_keyword(Keyword::Else) {
            self.bump();
            if self.at_keyword(Keyword::If) {
                Some(Box::new(self.parse_if_stmt()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        Some(Stmt::If {
            init,
            cond,
            then_block,
            else_branch,
            span,
        })
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let span = self.bump().span; // for
        if self.at_symbol(Symbol::LBrace) {
            let body = self.parse_block()?;
            return Some(Stmt::For {
                init: None,
                cond: None,
                post: None,
                body,
                span,
            });
        }
        let saved = self.allow_composite_lit;
        self.allow_composite_lit = false;
        if self.at_keyword(Keyword::Range) {
            self.bump();
            let subject = self.parse_expr()?;
            self.allow_composite_lit = saved;
            let body = self.parse_block()?;
            return Some(Stmt::Range {
                key: None,
                value: None,
                define: false,
                subject,
                body,
                span,
            });
        }
        if self.at_symbol(Symbol::Semi) {
            // Three-clause form with empty init.
            self.bump();
            let stmt = self.parse_three_clause_tail(None, span)?;
            self.allow_composite_lit = saved;
            return Some(stmt);
        }
        let first = self.parse_header_stmt()?;
        let stmt = match first {
            HeaderStmt::Range {
                key,
                value,
                define,
                subject,
                ..
            } => {
                self.allow_composite_lit = saved;
                let body = self.parse_block()?;
                return Some(Stmt::Range {
                    key,
                    value,
                    define,
                    subject,
                    body,
                    span,
                });
            }
            HeaderStmt::Simple(stmt) => stmt,
        };
        if self.at_symbol(Symbol::LBrace) {
            // Condition-only loop.
            let cond = match stmt {
                Stmt::Expr { expr, .. } => expr,
                other => {
                    self.diags.push(
                        "missing condition in for statement",
                        Some(stmt_span(&other)),
                    );
                    self.allow_composite_lit = saved;
                    return None;
                }
            };
            self.allow_composite_lit = saved;
            let body = self.parse_block()?;
            return Some(Stmt::For {
                init: None,
                cond: Some(cond),
                post: None,
                body,
                span,
            });
        }
        self.expect_symbol(Symbol::Semi);
        let stmt = self.parse_three_clause_tail(Some(Box::new(stmt)), span)?;
        self.allow_composite_lit = saved;
        Some(stmt)
    }

    fn parse_three_clause_tail(&mut self, init: Option<Box<Stmt>>, span: Span) -> Option<Stmt> {
        let cond = if self.at_symbol(Symbol::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_symbol(Symbol::Semi);
        let post = if self.at_symbol(Symbol::LBrace) {
            None
        } else {
            match self.parse_header_stmt()? {
                HeaderStmt::Simple(stmt) => Some(Box::new(stmt)),
                HeaderStmt::Range { span, .. } => {
                    self.diags
                        .push("range is only valid in a for statement", Some(span));
                    None
                }
            }
        };
        let body = self.parse_block()?;
        Some(Stmt::For {
            init,
            cond,
            post,
            body,
            span,
        })
    }

    fn parse_switch_stmt(&mut self) -> Option<Stmt> {
        let span = self.bump().span; // switch
        let saved = self.allow_composite_lit;
        self.allow_composite_lit = false;
        let mut init = None;
        let mut tag = None;
        if !self.at_symbol(Symbol::LBrace) {
            match self.parse_header_stmt()? {
                HeaderStmt::Simple(stmt) => {
                    if self.at_symbol(Symbol::Semi) {
                        self.bump();
                        init = Some(Box::new(stmt));
                        if !self.at_symbol(Symbol::LBrace) {
                            match self.parse_header_stmt()? {
                                HeaderStmt::Simple(Stmt::Expr { expr, .. }) => tag = Some(expr),
                                _ => {
                                    self.error_here("expected switch expression");
                                }
                            }
                        }
                    } else if let Stmt::Expr { expr, .. } = stmt {
                        tag = Some(expr);
                    } else {
                        self.error_here("expected switch expression");
                    }
                }
                HeaderStmt::Range { span, .. } => {
                    self.diags
                        .push("range is only valid in a for statement", Some(span));
                }
            }
        }
        self.allow_composite_lit = saved;
        self.expect_symbol(Symbol::LBrace);
        let mut cases = Vec::new();
        self.consume_semis();
        while !self.at_symbol(Symbol::RBrace) && !self.at_eof() {
            let case_span = self.peek_span()?;
            let values = if self.at_keyword(Keyword::Case) {
                self.bump();
                self.parse_expr_list()?
            } else if self.at_keyword(Keyword::Default) {
                self.bump();
                Vec::new()
            } else {
                self.error_here("expected case or default");
                self.bump();
                continue;
            };
            self.expect_symbol(Symbol::Colon);
            let mut body = Vec::new();
            loop {
                self.consume_semis();
                if self.at_keyword(Keyword::Case)
                    || self.at_keyword(Keyword::Default)
                    || self.at_symbol(Symbol::RBrace)
                    || self.at_eof()
                {
                    break;
                }
                if self.at_keyword(Keyword::Fallthrough) {
                    self.bump();
                    continue;
                }
                if self.parse_decl_or_stmt(&mut body).is_none() {
                    self.bump();
                }
            }
            cases.push(SwitchCase {
                values,
                body,
                span: case_span,
            });
        }
        self.expect_symbol(Symbol::RBrace);
        Some(Stmt::Switch {
            init,
            tag,
            cases,
            span,
        })
    }

    fn parse_expr_list(&mut self) -> Option<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.at_symbol(Symbol::Comma) {
            self.bump();
            exprs.push(self.parse_expr()?);
        }
        Some(exprs)
    }

    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_binary_expr(0)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> Option<Expr> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let (prec, op) = match self.peek_binary_op() {
                Some(pair) if pair.0 > min_prec => pair,
                _ => break,
            };
            self.bump();
            let right = self.parse_binary_expr(prec)?;
            let span = left.span.clone();
            left = self.new_expr(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    fn peek_binary_op(&self) -> Option<(u8, BinaryOp)> {
        let pair = match self.peek().kind {
            TokenKind::Symbol(Symbol::PipePipe) => (1, BinaryOp::Or),
            TokenKind::Symbol(Symbol::AmpAmp) => (2, BinaryOp::And),
            TokenKind::Symbol(Symbol::EqEq) => (3, BinaryOp::Eq),
            TokenKind::Symbol(Symbol::NotEq) => (3, BinaryOp::NotEq),
            TokenKind::Symbol(Symbol::Lt) => (3, BinaryOp::Lt),
            TokenKind::Symbol(Symbol::Lte) => (3, BinaryOp::Lte),
            TokenKind::Symbol(Symbol::Gt) => (3, BinaryOp::Gt),
            TokenKind::Symbol(Symbol::Gte) => (3, BinaryOp::Gte),
            TokenKind::Symbol(Symbol::Plus) => (4, BinaryOp::Add),
            TokenKind::Symbol(Symbol::Minus) => (4, BinaryOp::Sub),
            TokenKind::Symbol(Symbol::Pipe) => (4, BinaryOp::BitOr),
            TokenKind::Symbol(Symbol::Caret) => (4, BinaryOp::BitXor),
            TokenKind::Symbol(Symbol::Star) => (5, BinaryOp::Mul),
            TokenKind::Symbol(Symbol::Slash) => (5, BinaryOp::Div),
            TokenKind::Symbol(Symbol::Percent) => (5, BinaryOp::Rem),
            TokenKind::Symbol(Symbol::Shl) => (5, BinaryOp::Shl),
            TokenKind::Symbol(Symbol::Shr) => (5, BinaryOp::Shr),
            TokenKind::Symbol(Symbol::Amp) => (5, BinaryOp::BitAnd),
            TokenKind::Symbol(Symbol::AmpCaret) => (5, BinaryOp::AndNot),
            _ => return None,
        };
        Some(pair)
    }

    fn parse_unary_expr(&mut self) -> Option<Expr> {
        let span = self.peek_span()?;
        let op = match self.peek().kind {
            TokenKind::Symbol(Symbol::Plus) => Some(UnaryOp::Plus),
            TokenKind::Symbol(Symbol::Minus) => Some(UnaryOp::Neg),
            TokenKind::Symbol(Symbol::Bang) => Some(UnaryOp::Not),
            TokenKind::Symbol(Symbol::Caret) => Some(UnaryOp::BitNot),
            TokenKind::Symbol(Symbol::Amp) => Some(UnaryOp::Addr),
            TokenKind::Symbol(Symbol::Arrow) => Some(UnaryOp::Recv),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let expr = self.parse_unary_expr()?;
            return Some(self.new_expr(
                ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
                span,
            ));
        }
        if self.at_symbol(Symbol::Star) {
            self.bump();
            let expr = self.parse_unary_expr()?;
            return Some(self.new_expr(ExprKind::Star(Box::new(expr)), span));
        }
        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            if self.at_symbol(Symbol::Dot) {
                self.bump();
                let span = expr.span.clone();
                match self.bump().kind {
                    TokenKind::Ident(name) => {
                        expr = self.new_expr(
                            ExprKind::Selector {
                                base: Box::new(expr),
                                name,
                            },
                            span,
                        );
                    }
                    TokenKind::Symbol(Symbol::LParen) => {
                        // Type assertion `x.(T)`: the operand is what matters.
                        if self.at_type_start() {
                            self.parse_type()?;
                        }
                        self.expect_symbol(Symbol::RParen);
                    }
                    _ => {
                        self.error_here("expected selector name");
                        return None;
                    }
                }
                continue;
            }
            if self.at_symbol(Symbol::LParen) {
                self.bump();
                let span = expr.span.clone();
                let saved = self.allow_composite_lit;
                self.allow_composite_lit = true;
                let mut args = Vec::new();
                while !self.at_symbol(Symbol::RParen) && !self.at_eof() {
                    args.push(self.parse_expr()?);
                    if self.at_symbol(Symbol::Ellipsis) {
                        self.bump(); // spread argument
                    }
                    if self.at_symbol(Symbol::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.allow_composite_lit = saved;
                self.expect_symbol(Symbol::RParen);
                expr = self.new_expr(
                    ExprKind::Call {
                        fun: Box::new(expr),
                        args,
                    },
                    span,
                );
                continue;
            }
            if self.at_symbol(Symbol::LBracket) {
                self.bump();
                let span = expr.span.clone();
                let saved = self.allow_composite_lit;
                self.allow_composite_lit = true;
                let index = self.parse_expr()?;
                self.allow_composite_lit = saved;
                self.expect_symbol(Symbol::RBracket);
                expr = self.new_expr(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
                continue;
            }
            if self.at_symbol(Symbol::LBrace) && self.allow_composite_lit {
                if let Some(ty) = composite_lit_type(&expr) {
                    let span = expr.span.clone();
                    let elems = self.parse_composite_elems()?;
                    expr = self.new_expr(ExprKind::CompositeLit { ty, elems }, span);
                    continue;
                }
            }
            break;
        }
        Some(expr)
    }

    fn parse_composite_elems(&mut self) -> Option<Vec<CompositeElem>> {
        self.expect_symbol(Symbol::LBrace);
        let saved = self.allow_composite_lit;
        self.allow_composite_lit = true;
        let mut elems = Vec::new();
        while !self.at_symbol(Symbol::RBrace) && !self.at_eof() {
            if self.at_symbol(Symbol::Semi) || self.at_symbol(Symbol::Comma) {
                self.bump();
                continue;
            }
            let first = self.parse_expr()?;
            if self.at_symbol(Symbol::Colon) {
                self.bump();
                let value = self.parse_expr()?;
                elems.push(CompositeElem {
                    key: Some(first),
                    value,
                });
            } else {
                elems.push(CompositeElem {
                    key: None,
                    value: first,
                });
            }
        }
        self.allow_composite_lit = saved;
        self.expect_symbol(Symbol::RBrace);
        Some(elems)
    }

    fn parse_primary_expr(&mut self) -> Option<Expr> {
        let span = self.peek_span()?;
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Some(self.new_expr(ExprKind::Ident(name), span))
            }
            TokenKind::IntLit(text) => {
                self.bump();
                Some(self.new_expr(ExprKind::IntLit(text), span))
            }
            TokenKind::FloatLit(text) => {
                self.bump();
                Some(self.new_expr(ExprKind::FloatLit(text), span))
            }
            TokenKind::StringLit(text) => {
                self.bump();
                Some(self.new_expr(ExprKind::StringLit(text), span))
            }
            TokenKind::CharLit(ch) => {
                self.bump();
                Some(self.new_expr(ExprKind::CharLit(ch), span))
            }
            TokenKind::Symbol(Symbol::LParen) => {
                self.bump();
                let saved = self.allow_composite_lit;
                self.allow_composite_lit = true;
                let inner = self.parse_expr()?;
                self.allow_composite_lit = saved;
                self.expect_symbol(Symbol::RParen);
                Some(self.new_expr(ExprKind::Paren(Box::new(inner)), span))
            }
            TokenKind::Keyword(Keyword::Func) => {
                self.bump();
                let (params, results) = self.parse_signature()?;
                let body = self.parse_block()?;
                Some(self.new_expr(
                    ExprKind::FuncLit {
                        params,
                        results,
                        body,
                    },
                    span,
                ))
            }
            TokenKind::Symbol(Symbol::LBracket)
            | TokenKind::Keyword(Keyword::Map)
            | TokenKind::Keyword(Keyword::Struct) => {
                // Composite literal of a slice/array/map/struct type.
                let ty = self.parse_type()?;
                if self.at_symbol(Symbol::LBrace) {
                    let elems = self.parse_composite_elems()?;
                    Some(self.new_expr(ExprKind::CompositeLit { ty, elems }, span))
                } else {
                    self.error_here("expected `{` after type literal");
                    None
                }
            }
            _ => {
                self.error_here("expected expression");
                self.bump();
                None
            }
        }
    }

    fn parse_ident(&mut self) -> Option<Ident> {
        let span = self.peek_span()?;
        match self.bump().kind {
            TokenKind::Ident(name) => Some(self.new_ident(name, span)),
            _ => {
                self.error_here("expected identifier");
                None
            }
        }
    }

    fn parse_ident_list(&mut self) -> Option<Vec<Ident>> {
        let mut names = vec![self.parse_ident()?];
        while self.at_symbol(Symbol::Comma) {
            self.bump();
            names.push(self.parse_ident()?);
        }
        Some(names)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.idx += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn at_symbol(&self, symbol: Symbol) -> bool {
        matches!(&self.peek().kind, TokenKind::Symbol(sym) if *sym == symbol)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    fn consume_semis(&mut self) {
        while self.at_symbol(Symbol::Semi) {
            self.bump();
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol) {
        if !self.at_symbol(symbol) {
            self.error_here("unexpected token");
        } else {
            self.bump();
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) {
        if !self.at_keyword(keyword) {
            self.error_here("unexpected token");
        } else {
            self.bump();
        }
    }

    fn peek_span(&self) -> Option<Span> {
        Some(self.peek().span.clone())
    }

    fn error_here(&mut self, message: &str) {
        self.diags.push(message, self.peek_span());
    }
}

/// A composite literal's type position only admits a (possibly qualified)
/// type name once expression parsing has started.
fn composite_lit_type(expr: &Expr) -> Option<TypeExpr> {
    match &expr.kind {
        ExprKind::Ident(name) => Some(TypeExpr {
            kind: TypeExprKind::Named(name.clone()),
            span: expr.span.clone(),
        }),
        ExprKind::Selector { base, name } => match &base.kind {
            ExprKind::Ident(pkg) => Some(TypeExpr {
                kind: TypeExprKind::Qualified(pkg.clone(), name.clone()),
                span: expr.span.clone(),
            }),
            _ => None,
        },
        _ => None,
    }
}

fn stmt_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::Var(decl) => decl.span.clone(),
        Stmt::Const(decl) => decl.span.clone(),
        Stmt::Assign { span, .. }
        | Stmt::IncDec { span, .. }
        | Stmt::Expr { span, .. }
        | Stmt::Return { span, .. }
        | Stmt::If { span, .. }
        | Stmt::For { span, .. }
        | Stmt::Range { span, .. }
        | Stmt::Switch { span, .. }
        | Stmt::Defer { span, .. }
        | Stmt::Go { span, .. }
        | Stmt::Break { span }
        | Stmt::Continue { span } => span.clone(),
        Stmt::Block(block) => block.span.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(src: &str) -> File {
        let (tokens, _) = Lexer::new(src).lex_all();
        let mut parser = Parser::new(tokens);
        let file = parser.parse_file().expect("file parses");
        assert!(
            parser.diags.is_empty(),
            "unexpected parse diagnostics: {:?}",
            parser.diags.items
        );
        file
    }

    fn first_func(file: &File) -> &FuncDecl {
        file.decls
            .iter()
            .find_map(|d| match d {
                Decl::Func(f) => Some(f),
                _ => None,
            })
            .expect("function decl")
    }

    #[test]
    fn parses_named_result_group() {
        let file = parse("package p\n\nfunc f() (val int, err error) {\n\treturn 0, nil\n}\n");
        let func = first_func(&file);
        assert_eq!(func.results.len(), 2);
        assert_eq!(func.results[0].names[0].name, "val");
        assert_eq!(func.results[1].names[0].name, "err");
        assert!(matches!(
            func.results[1].ty.kind,
            TypeExprKind::Named(ref n) if n == "error"
        ));
    }

    #[test]
    fn parses_shared_type_names() {
        let file = parse("package p\n\nfunc f(a, b int) {}\n");
        let func = first_func(&file);
        assert_eq!(func.params.len(), 1);
        let names: Vec<_> = func.params[0].names.iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn parses_unnamed_results() {
        let file = parse("package p\n\nfunc f() (int, error) {\n\treturn 0, nil\n}\n");
        let func = first_func(&file);
        assert_eq!(func.results.len(), 2);
        assert!(func.results[0].names.is_empty());
        assert!(func.results[1].names.is_empty());
    }

    #[test]
    fn parses_defer_with_func_lit() {
        let file = parse(
            "package p\n\nfunc f() {\n\tdefer func() {\n\t\tx := 1\n\t\t_ = x\n\t}()\n}\n",
        );
        let func = first_func(&file);
        let body = func.body.as_ref().expect("body");
        match &body.stmts[0] {
            Stmt::Defer { call, .. } => match &call.kind {
                ExprKind::Call { fun, .. } => {
                    assert!(matches!(fun.kind, ExprKind::FuncLit { .. }));
                }
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected defer, got {:?}", other),
        }
    }

    #[test]
    fn defer_of_non_call_is_a_diagnostic() {
        let (tokens, _) = Lexer::new("package p\n\nfunc f() {\n\tdefer x\n}\n").lex_all();
        let mut parser = Parser::new(tokens);
        parser.parse_file();
        assert!(parser
            .diags
            .items
            .iter()
            .any(|d| d.message.contains("defer must be function call")));
    }

    #[test]
    fn parses_struct_type_decl() {
        let file = parse("package p\n\ntype wrapper struct {\n\terr error\n}\n");
        match &file.decls[0] {
            Decl::Type(decl) => {
                assert_eq!(decl.name.name, "wrapper");
                match &decl.ty.kind {
                    TypeExprKind::Struct(fields) => {
                        assert_eq!(fields.len(), 1);
                        assert_eq!(fields[0].names[0].name, "err");
                    }
                    other => panic!("expected struct type, got {:?}", other),
                }
            }
            other => panic!("expected type decl, got {:?}", other),
        }
    }

    #[test]
    fn parses_three_clause_for_with_incdec() {
        let file = parse(
            "package p\n\nfunc f() {\n\tfor i := 0; i < 1; i++ {\n\t\t_ = i\n\t}\n}\n",
        );
        let func = first_func(&file);
        match &func.body.as_ref().expect("body").stmts[0] {
            Stmt::For {
                init, cond, post, ..
            } => {
                assert!(matches!(init.as_deref(), Some(Stmt::Assign { .. })));
                assert!(cond.is_some());
                assert!(matches!(post.as_deref(), Some(Stmt::IncDec { .. })));
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn parses_if_with_init_stmt() {
        let file = parse(
            "package p\n\nfunc f() {\n\tif err := g(); err != nil {\n\t\t_ = err\n\t}\n}\nfunc g() error { return nil }\n",
        );
        let func = first_func(&file);
        match &func.body.as_ref().expect("body").stmts[0] {
            Stmt::If { init, .. } => assert!(init.is_some()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn grouped_var_statement_keeps_every_spec() {
        let file = parse(
            "package p\n\nfunc f() {\n\tvar (\n\t\tn int\n\t\terr error\n\t)\n\t_ = n\n\t_ = err\n}\n",
        );
        let func = first_func(&file);
        let body = func.body.as_ref().expect("body");
        let var_names: Vec<_> = body
            .stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::Var(decl) => Some(decl.names[0].name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(var_names, vec!["n", "err"]);
    }

    #[test]
    fn grouped_const_statement_keeps_every_spec() {
        let file = parse(
            "package p\n\nfunc f() {\n\tconst (\n\t\ta = 1\n\t\tb = 2\n\t)\n\t_ = a\n\t_ = b\n}\n",
        );
        let func = first_func(&file);
        let body = func.body.as_ref().expect("body");
        let count = body
            .stmts
            .iter()
            .filter(|s| matches!(s, Stmt::Const(_)))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn parses_composite_literal_in_assignment() {
        let file = parse("package p\n\ntype w struct{}\n\nfunc f() {\n\tx := w{}\n\t_ = x\n}\n");
        let func = first_func(&file);
        match &func.body.as_ref().expect("body").stmts[0] {
            Stmt::Assign { op, rhs, .. } => {
                assert_eq!(*op, AssignOp::Define);
                assert!(matches!(rhs[0].kind, ExprKind::CompositeLit { .. }));
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn parses_grouped_imports() {
        let file = parse("package p\n\nimport (\n\t\"errors\"\n\tio2 \"io\"\n)\n");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].local_name(), "errors");
        assert_eq!(file.imports[1].local_name(), "io2");
    }

    #[test]
    fn parses_multi_assign_with_blank() {
        let file = parse("package p\n\nfunc f() {\n\t_, w := g()\n\t_ = w\n}\nfunc g() (int, int) { return 1, 2 }\n");
        let func = first_func(&file);
        match &func.body.as_ref().expect("body").stmts[0] {
            Stmt::Assign { op, lhs, .. } => {
                assert_eq!(*op, AssignOp::Define);
                assert_eq!(lhs.len(), 2);
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn parses_method_with_receiver() {
        let file = parse(
            "package p\n\ntype w struct{}\n\nfunc (r *w) close() error {\n\treturn nil\n}\n",
        );
        let func = first_func(&file);
        assert!(func.recv.is_some());
        assert_eq!(func.name, "close");
    }

    #[test]
    fn range_loop_over_slice() {
        let file = parse(
            "package p\n\nfunc f(xs []int) {\n\tfor i, x := range xs {\n\t\t_ = i\n\t\t_ = x\n\t}\n}\n",
        );
        let func = first_func(&file);
        match &func.body.as_ref().expect("body").stmts[0] {
            Stmt::Range { key, value, define, .. } => {
                assert!(key.is_some());
                assert!(value.is_some());
                assert!(*define);
            }
            other => panic!("expected range, got {:?}", other),
        }
    }
}
