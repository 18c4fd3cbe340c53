// Purpose: Scope-sensitive name resolution and type assignment for one file.
// Inputs/Outputs: Takes a parsed File; produces symbol identities plus
//   defining-occurrence and use tables keyed by expression id.
// Invariants: Two identifiers with the same text but different bindings get
//   different SymbolIds; `_` never gets a symbol.
// Gotchas: Type assignment is deliberately conservative. Anything the
//   resolver cannot prove is Unknown, and Unknown is never flagged.

pub mod types;

use std::collections::HashMap;

use crate::frontend::ast::*;
use self::types::{basic_from_name, lower_type, BasicType, Type};

pub type SymbolId = usize;

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Var,
    Func,
    TypeName,
    Const,
    Package,
    Builtin,
}

/// Resolution facts for one file. `defs` holds defining occurrences (a
/// declared name, or the new names of a `:=`); `uses` holds every resolved
/// non-defining occurrence.
#[derive(Debug, Default)]
pub struct Resolution {
    pub symbols: Vec<Symbol>,
    pub defs: HashMap<ExprId, SymbolId>,
    pub uses: HashMap<ExprId, SymbolId>,
}

impl Resolution {
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    /// The symbol an identifier occurrence denotes, defining or not.
    /// Mirrors what a type-checker's ObjectOf lookup provides.
    pub fn object_of(&self, expr_id: ExprId) -> Option<SymbolId> {
        self.defs
            .get(&expr_id)
            .or_else(|| self.uses.get(&expr_id))
            .copied()
    }

    /// True when this occurrence introduces a new binding.
    pub fn is_def(&self, expr_id: ExprId) -> bool {
        self.defs.contains_key(&expr_id)
    }

    pub fn type_of(&self, expr_id: ExprId) -> Option<&Type> {
        self.object_of(expr_id).map(|sym| &self.symbol(sym).ty)
    }
}

pub fn resolve(file: &File) -> Resolution {
    let mut resolver = Resolver::new();
    resolver.run(file);
    resolver.res
}

struct Resolver {
    res: Resolution,
    scopes: Vec<HashMap<String, SymbolId>>,
    /// Import local name -> import path, for well-known signature lookups.
    packages: HashMap<String, String>,
    /// Package-level function name -> result types, for call inference.
    func_results: HashMap<String, Vec<Type>>,
}

impl Resolver {
    fn new() -> Self {
        let mut resolver = Self {
            res: Resolution::default(),
            scopes: vec![HashMap::new()],
            packages: HashMap::new(),
            func_results: HashMap::new(),
        };
        resolver.declare_universe();
        resolver
    }

    fn declare_universe(&mut self) {
        let span = Span {
            start: 0,
            end: 0,
            line: 0,
            column: 0,
        };
        let declare = |resolver: &mut Resolver, name: &str, ty: Type| {
            resolver.declare(name.to_string(), ty, SymbolKind::Builtin, span.clone());
        };
        declare(self, "true", Type::Basic(BasicType::Bool));
        declare(self, "false", Type::Basic(BasicType::Bool));
        declare(self, "iota", Type::Basic(BasicType::Int));
        declare(self, "nil", Type::Unknown);
        for builtin in [
            "append", "cap", "close", "complex", "copy", "delete", "imag", "len", "make",
            "max", "min", "new", "panic", "print", "println", "real", "recover",
        ] {
            declare(self, builtin, Type::Func);
        }
    }

    fn run(&mut self, file: &File) {
        self.push_scope(); // package scope

        for import in &file.imports {
            let local = import.local_name().to_string();
            self.packages.insert(local.clone(), import.path.clone());
            self.declare(local, Type::Unknown, SymbolKind::Package, import.span.clone());
        }

        // Package-level functions and type names are visible file-wide.
        for decl in &file.decls {
            match decl {
                Decl::Func(func) => {
                    if func.recv.is_none() {
                        self.func_results
                            .insert(func.name.clone(), flatten_result_types(&func.results));
                        self.declare(
                            func.name.clone(),
                            Type::Func,
                            SymbolKind::Func,
                            func.span.clone(),
                        );
                    }
                }
                Decl::Type(decl) => {
                    let sym = self.declare(
                        decl.name.name.clone(),
                        Type::Named(decl.name.name.clone()),
                        SymbolKind::TypeName,
                        decl.name.span.clone(),
                    );
                    self.res.defs.insert(decl.name.id, sym);
                }
                _ => {}
            }
        }

        for decl in &file.decls {
            match decl {
                Decl::Var(decl) => self.walk_var_decl(decl, SymbolKind::Var),
                Decl::Const(decl) => {
                    let var = VarDecl {
                        names: decl.names.clone(),
                        ty: decl.ty.clone(),
                        values: decl.values.clone(),
                        span: decl.span.clone(),
                    };
                    self.walk_var_decl(&var, SymbolKind::Const);
                }
                _ => {}
            }
        }

        for decl in &file.decls {
            if let Decl::Func(func) = decl {
                self.walk_func(func);
            }
        }

        self.pop_scope();
    }

    fn walk_func(&mut self, func: &FuncDecl) {
        let Some(body) = &func.body else { return };
        // Receiver, parameters, and result names share the body's scope.
        self.push_scope();
        if let Some(recv) = &func.recv {
            self.declare_field(recv);
        }
        for field in &func.params {
            self.declare_field(field);
        }
        for field in &func.results {
            self.declare_field(field);
        }
        self.walk_block(body, false);
        self.pop_scope();
    }

    fn declare_field(&mut self, field: &Field) {
        let ty = lower_type(&field.ty);
        for name in &field.names {
            if name.is_blank() {
                continue;
            }
            let sym = self.declare(
                name.name.clone(),
                ty.clone(),
                SymbolKind::Var,
                name.span.clone(),
            );
            self.res.defs.insert(name.id, sym);
        }
    }

    fn walk_block(&mut self, block: &Block, new_scope: bool) {
        if new_scope {
            self.push_scope();
        }
        for stmt in &block.stmts {
            self.walk_stmt(stmt);
        }
        if new_scope {
            self.pop_scope();
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(decl) => self.walk_var_decl(decl, SymbolKind::Var),
            Stmt::Const(decl) => {
                let var = VarDecl {
                    names: decl.names.clone(),
                    ty: decl.ty.clone(),
                    values: decl.values.clone(),
                    span: decl.span.clone(),
                };
                self.walk_var_decl(&var, SymbolKind::Const);
            }
            Stmt::Assign { op, lhs, rhs, .. } => {
                for value in rhs {
                    self.walk_expr(value);
                }
                if *op == AssignOp::Define {
                    let value_types = self.assigned_types(lhs.len(), rhs);
                    for (i, target) in lhs.iter().enumerate() {
                        match &target.kind {
                            ExprKind::Ident(name) if name == "_" => {}
                            ExprKind::Ident(name) => {
                                // Go redeclares only names absent from the
                                // current scope; others are plain reuses.
                                if let Some(sym) = self.in_current_scope(name) {
                                    self.res.uses.insert(target.id, sym);
                                } else {
                                    let sym = self.declare(
                                        name.clone(),
                                        value_types[i].clone(),
                                        SymbolKind::Var,
                                        target.span.clone(),
                                    );
                                    self.res.defs.insert(target.id, sym);
                                }
                            }
                            _ => self.walk_expr(target),
                        }
                    }
                } else {
                    for target in lhs {
                        self.walk_expr(target);
                    }
                }
            }
            Stmt::IncDec { target, .. } => self.walk_expr(target),
            Stmt::Expr { expr, .. } => self.walk_expr(expr),
            Stmt::Return { results, .. } => {
                for expr in results {
                    self.walk_expr(expr);
                }
            }
            Stmt::If {
                init,
                cond,
                then_block,
                else_branch,
                ..
            } => {
                self.push_scope();
                if let Some(init) = init {
                    self.walk_stmt(init);
                }
                self.walk_expr(cond);
                self.walk_block(then_block, true);
                if let Some(else_branch) = else_branch {
                    self.walk_stmt(else_branch);
                }
                self.pop_scope();
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                self.push_scope();
                if let Some(init) = init {
                    self.walk_stmt(init);
                }
                if let Some(cond) = cond {
                    self.walk_expr(cond);
                }
                if let Some(post) = post {
                    self.walk_stmt(post);
                }
                self.walk_block(body, true);
                self.pop_scope();
            }
            Stmt::Range {
                key,
                value,
                define,
                subject,
                body,
                ..
            } => {
                self.push_scope();
                self.walk_expr(subject);
                for target in [key, value].into_iter().flatten() {
                    match &target.kind {
                        ExprKind::Ident(name) if name == "_" => {}
                        ExprKind::Ident(name) if *define => {
                            let sym = self.declare(
                                name.clone(),
                                Type::Unknown,
                                SymbolKind::Var,
                                target.span.clone(),
                            );
                            self.res.defs.insert(target.id, sym);
                        }
                        _ => self.walk_expr(target),
                    }
                }
                self.walk_block(body, true);
                self.pop_scope();
            }
            Stmt::Switch {
                init, tag, cases, ..
            } => {
                self.push_scope();
                if let Some(init) = init {
                    self.walk_stmt(init);
                }
                if let Some(tag) = tag {
                    self.walk_expr(tag);
                }
                for case in cases {
                    for value in &case.values {
                        self.walk_expr(value);
                    }
                    self.push_scope();
                    for stmt in &case.body {
                        self.walk_stmt(stmt);
                    }
                    self.pop_scope();
                }
                self.pop_scope();
            }
            Stmt::Block(block) => self.walk_block(block, true),
            Stmt::Defer { call, .. } | Stmt::Go { call, .. } => self.walk_expr(call),
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    fn walk_var_decl(&mut self, decl: &VarDecl, kind: SymbolKind) {
        for value in &decl.values {
            self.walk_expr(value);
        }
        let declared = decl.ty.as_ref().map(lower_type);
        let value_types = match declared {
            Some(_) => Vec::new(),
            None => self.assigned_types(decl.names.len(), &decl.values),
        };
        for (i, name) in decl.names.iter().enumerate() {
            if name.is_blank() {
                continue;
            }
            let ty = match &declared {
                Some(ty) => ty.clone(),
                None => value_types[i].clone(),
            };
            let sym = self.declare(name.name.clone(), ty, kind, name.span.clone());
            self.res.defs.insert(name.id, sym);
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => {
                if name == "_" {
                    return;
                }
                if let Some(sym) = self.lookup(name) {
                    self.res.uses.insert(expr.id, sym);
                }
            }
            ExprKind::Selector { base, .. } => self.walk_expr(base),
            ExprKind::Index { base, index } => {
                self.walk_expr(base);
                self.walk_expr(index);
            }
            ExprKind::Call { fun, args } => {
                self.walk_expr(fun);
                for arg in args {
                    self.walk_expr(arg);
                }
            }
            ExprKind::FuncLit {
                params,
                results,
                body,
            } => {
                self.push_scope();
                for field in params {
                    self.declare_field(field);
                }
                for field in results {
                    self.declare_field(field);
                }
                self.walk_block(body, false);
                self.pop_scope();
            }
            ExprKind::CompositeLit { elems, .. } => {
                for elem in elems {
                    // A bare identifier key names a struct field, not a
                    // variable; anything else is a real expression.
                    if let Some(key) = &elem.key {
                        if !matches!(key.kind, ExprKind::Ident(_)) {
                            self.walk_expr(key);
                        }
                    }
                    self.walk_expr(&elem.value);
                }
            }
            ExprKind::Unary { expr, .. } => self.walk_expr(expr),
            ExprKind::Binary { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }
            ExprKind::Paren(inner) | ExprKind::Star(inner) => self.walk_expr(inner),
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::CharLit(_) => {}
        }
    }

    /// Types for the targets of a `:=` or untyped `var`, padded with
    /// Unknown whenever the shape does not line up.
    fn assigned_types(&self, target_count: usize, values: &[Expr]) -> Vec<Type> {
        let mut out = Vec::with_capacity(target_count);
        if values.len() == target_count {
            for value in values {
                out.push(self.type_of_expr(value));
            }
        } else if values.len() == 1 {
            if let ExprKind::Call { fun, .. } = &values[0].kind {
                out = self.call_result_types(fun);
            }
        }
        out.resize(target_count, Type::Unknown);
        out
    }

    fn type_of_expr(&self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Ident(name) => match self.lookup(name) {
                Some(sym) => self.res.symbol(sym).ty.clone(),
                None => Type::Unknown,
            },
            ExprKind::IntLit(_) => Type::Basic(BasicType::Int),
            ExprKind::FloatLit(_) => Type::Basic(BasicType::Float64),
            ExprKind::StringLit(_) => Type::Basic(BasicType::String),
            ExprKind::CharLit(_) => Type::Basic(BasicType::Rune),
            ExprKind::Call { fun, .. } => {
                // Conversions to basic types and to `error` look like calls.
                if let ExprKind::Ident(name) = &fun.kind {
                    if name == "error" {
                        return Type::Error;
                    }
                    if let Some(basic) = basic_from_name(name) {
                        if self.lookup(name).is_none() {
                            return Type::Basic(basic);
                        }
                    }
                }
                self.call_result_types(fun)
                    .into_iter()
                    .next()
                    .unwrap_or(Type::Unknown)
            }
            ExprKind::CompositeLit { ty, .. } => lower_type(ty),
            ExprKind::Unary { op, expr } => match op {
                UnaryOp::Not => Type::Basic(BasicType::Bool),
                UnaryOp::Addr => Type::Pointer(Box::new(self.type_of_expr(expr))),
                UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => self.type_of_expr(expr),
                UnaryOp::Recv => match self.type_of_expr(expr) {
                    Type::Chan(elem) => *elem,
                    _ => Type::Unknown,
                },
            },
            ExprKind::Binary { op, left, .. } => match op {
                BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte
                | BinaryOp::And
                | BinaryOp::Or => Type::Basic(BasicType::Bool),
                _ => self.type_of_expr(left),
            },
            ExprKind::Paren(inner) => self.type_of_expr(inner),
            ExprKind::Star(inner) => match self.type_of_expr(inner) {
                Type::Pointer(pointee) => *pointee,
                _ => Type::Unknown,
            },
            ExprKind::Index { base, .. } => match self.type_of_expr(base) {
                Type::Slice(elem) | Type::Array(elem) => *elem,
                Type::Map(_, value) => *value,
                _ => Type::Unknown,
            },
            ExprKind::FuncLit { .. } => Type::Func,
            ExprKind::Selector { .. } => Type::Unknown,
        }
    }

    fn call_result_types(&self, fun: &Expr) -> Vec<Type> {
        match &fun.kind {
            ExprKind::Ident(name) => self
                .func_results
                .get(name)
                .cloned()
                .unwrap_or_default(),
            ExprKind::Selector { base, name } => {
                if let ExprKind::Ident(pkg) = &base.kind {
                    if let Some(path) = self.packages.get(pkg) {
                        return well_known_results(path, name);
                    }
                }
                Vec::new()
            }
            ExprKind::Paren(inner) => self.call_result_types(inner),
            _ => Vec::new(),
        }
    }

    fn declare(&mut self, name: String, ty: Type, kind: SymbolKind, span: Span) -> SymbolId {
        let id = self.res.symbols.len();
        self.res.symbols.push(Symbol {
            name: name.clone(),
            ty,
            kind,
            span,
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, id);
        }
        id
    }

    fn lookup(&self, name: &str) -> Option<SymbolId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&sym) = scope.get(name) {
                return Some(sym);
            }
        }
        None
    }

    fn in_current_scope(&self, name: &str) -> Option<SymbolId> {
        self.scopes.last().and_then(|scope| scope.get(name)).copied()
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }
}

fn flatten_result_types(results: &[Field]) -> Vec<Type> {
    let mut out = Vec::new();
    for field in results {
        let ty = lower_type(&field.ty);
        let count = field.names.len().max(1);
        for _ in 0..count {
            out.push(ty.clone());
        }
    }
    out
}

/// Result signatures of stdlib functions the checker knows about. The Go
/// original gets these from full type information; without a type-checked
/// import graph, a short allowlist keeps the common error constructors
/// recognizable while everything else stays Unknown.
fn well_known_results(path: &str, name: &str) -> Vec<Type> {
    match (path, name) {
        ("errors", "New") | ("errors", "Join") => vec![Type::Error],
        ("errors", "Unwrap") => vec![Type::Error],
        ("fmt", "Errorf") => vec![Type::Error],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    fn resolve_src(src: &str) -> Resolution {
        let (tokens, _) = Lexer::new(src).lex_all();
        let mut parser = Parser::new(tokens);
        let file = parser.parse_file().expect("file parses");
        assert!(
            parser.diags.is_empty(),
            "unexpected parse diagnostics: {:?}",
            parser.diags.items
        );
        resolve(&file)
    }

    fn vars_named<'a>(res: &'a Resolution, name: &str) -> Vec<&'a Symbol> {
        res.symbols
            .iter()
            .filter(|s| s.name == name && s.kind == SymbolKind::Var)
            .collect()
    }

    #[test]
    fn var_with_explicit_error_type() {
        let res = resolve_src("package p\n\nfunc f() {\n\tvar err error\n\t_ = err\n}\n");
        let errs = vars_named(&res, "err");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].ty, Type::Error);
    }

    #[test]
    fn short_decl_in_closure_shadows_outer_binding() {
        let res = resolve_src(
            "package p\n\nimport \"errors\"\n\nfunc f() {\n\tvar err error\n\t_ = err\n\tg := func() {\n\t\terr := errors.New(\"x\")\n\t\t_ = err\n\t}\n\tg()\n}\n",
        );
        // Outer `var err` and the closure's `err :=` are distinct bindings.
        let errs = vars_named(&res, "err");
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn short_decl_reuses_existing_binding_in_same_scope() {
        let res = resolve_src(
            "package p\n\nfunc g() (int, error) { return 0, nil }\n\nfunc f() {\n\tvar err error\n\t_ = err\n\tx, err := g()\n\t_ = x\n\t_ = err\n}\n",
        );
        // `x, err :=` reuses err: only one err symbol in the function.
        let errs = vars_named(&res, "err");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn named_results_get_declared_types() {
        let res = resolve_src(
            "package p\n\nfunc f() (val int, err error) {\n\treturn val, err\n}\n",
        );
        let errs = vars_named(&res, "err");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].ty, Type::Error);
        let vals = vars_named(&res, "val");
        assert_eq!(vals[0].ty, Type::Basic(BasicType::Int));
    }

    #[test]
    fn blank_identifier_gets_no_symbol() {
        let res = resolve_src("package p\n\nfunc g() (int, int) { return 1, 2 }\n\nfunc f() {\n\t_, x := g()\n\t_ = x\n}\n");
        assert!(vars_named(&res, "_").is_empty());
    }

    #[test]
    fn infers_error_from_well_known_constructor() {
        let res = resolve_src(
            "package p\n\nimport \"errors\"\n\nfunc f() {\n\terr := errors.New(\"boom\")\n\t_ = err\n}\n",
        );
        let errs = vars_named(&res, "err");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].ty, Type::Error);
    }

    #[test]
    fn infers_results_of_local_functions() {
        let res = resolve_src(
            "package p\n\nfunc g() error { return nil }\n\nfunc f() {\n\terr := g()\n\t_ = err\n}\n",
        );
        let errs = vars_named(&res, "err");
        assert_eq!(errs[0].ty, Type::Error);
    }

    #[test]
    fn defined_type_over_error_is_distinct_identity() {
        let res = resolve_src(
            "package p\n\ntype myErr error\n\nfunc f() {\n\tvar e myErr\n\t_ = e\n}\n",
        );
        let es = vars_named(&res, "e");
        assert_eq!(es[0].ty, Type::Named("myErr".to_string()));
        assert!(!es[0].ty.is_error());
    }

    #[test]
    fn unknown_call_results_stay_unknown() {
        let res = resolve_src(
            "package p\n\nimport \"io\"\n\nfunc f() {\n\t_, w := io.Pipe()\n\t_ = w\n}\n",
        );
        let ws = vars_named(&res, "w");
        assert_eq!(ws[0].ty, Type::Unknown);
    }

    #[test]
    fn object_of_prefers_defining_occurrence() {
        let res = resolve_src("package p\n\nfunc f() {\n\tx := 1\n\t_ = x\n}\n");
        let def_ids: Vec<_> = res.defs.keys().copied().collect();
        for id in def_ids {
            assert!(res.is_def(id));
            assert!(res.object_of(id).is_some());
        }
    }
}
