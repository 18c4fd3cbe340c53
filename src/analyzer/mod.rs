// Purpose: Detects deferred closures that assign to an error variable which
//   is not a named result of the enclosing function.
// Inputs/Outputs: Takes a parsed File plus its Resolution; yields lints with
//   spans, messages, and a suggested fix.
// Invariants: A lint requires all of: the target resolves to a binding whose
//   type is exactly `error`, the occurrence is not a new `:=` binding, the
//   name is not blank, and the binding is not a named result of the function
//   the defer belongs to.
// Gotchas: Only defers that appear as direct statements of the function body
//   are roots by default; `defer` inside a loop keeps only the closure of the
//   last iteration pending, so flagging those produces noise.

use std::collections::HashSet;

use crate::frontend::ast::*;
use crate::resolve::{Resolution, SymbolId};

/// Which defer statements of a function become scan roots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeferScan {
    /// Only defers that are direct statements of the function body.
    #[default]
    DirectOnly,
    /// Defers at any statement depth, including inside loops and branches.
    Recursive,
}

#[derive(Clone, Debug)]
pub struct Lint {
    pub span: Span,
    pub var_name: String,
    pub message: String,
    pub suggested_fix: String,
}

pub fn analyze(file: &File, res: &Resolution) -> Vec<Lint> {
    analyze_with(file, res, DeferScan::default())
}

pub fn analyze_with(file: &File, res: &Resolution, scan: DeferScan) -> Vec<Lint> {
    let mut lints = Vec::new();
    for decl in &file.decls {
        if let Decl::Func(func) = decl {
            if let Some(body) = &func.body {
                check_func(func, body, res, scan, &mut lints);
            }
        }
    }
    lints
}

fn check_func(
    func: &FuncDecl,
    body: &Block,
    res: &Resolution,
    scan: DeferScan,
    lints: &mut Vec<Lint>,
) {
    let named_errors = named_error_results(func, res);

    let mut roots: Vec<&Expr> = Vec::new();
    match scan {
        DeferScan::DirectOnly => {
            for stmt in &body.stmts {
                if let Stmt::Defer { call, .. } = stmt {
                    roots.push(call);
                }
            }
        }
        DeferScan::Recursive => collect_defers(body, &mut roots),
    }

    for call in roots {
        // Only `defer func() { ... }()` carries a body to scan; a deferred
        // call of a named function cannot assign to this function's locals.
        if let ExprKind::Call { fun, .. } = &call.kind {
            if let ExprKind::FuncLit { body, .. } = &fun.kind {
                scan_block(body, res, &named_errors, lints);
            }
        }
    }
}

/// Named results of `func` whose declared type is exactly `error`.
/// Assignments to these from a deferred closure do change the return value.
fn named_error_results(func: &FuncDecl, res: &Resolution) -> HashSet<SymbolId> {
    let mut named = HashSet::new();
    for field in &func.results {
        for ident in &field.names {
            if ident.is_blank() {
                continue;
            }
            if let Some(&sym) = res.defs.get(&ident.id) {
                if res.symbol(sym).ty.is_error() {
                    named.insert(sym);
                }
            }
        }
    }
    named
}

/// Gathers defer statements at any block depth, without descending into
/// function literals: a defer inside a closure pends on that closure, not
/// on the function under inspection.
fn collect_defers<'a>(block: &'a Block, out: &mut Vec<&'a Expr>) {
    for stmt in &block.stmts {
        collect_defers_stmt(stmt, out);
    }
}

fn collect_defers_stmt<'a>(stmt: &'a Stmt, out: &mut Vec<&'a Expr>) {
    match stmt {
        Stmt::Defer { call, .. } => out.push(call),
        Stmt::Block(block) => collect_defers(block, out),
        Stmt::If {
            then_block,
            else_branch,
            ..
        } => {
            collect_defers(then_block, out);
            if let Some(else_branch) = else_branch {
                collect_defers_stmt(else_branch, out);
            }
        }
        Stmt::For { body, .. } | Stmt::Range { body, .. } => collect_defers(body, out),
        Stmt::Switch { cases, .. } => {
            for case in cases {
                for stmt in &case.body {
                    collect_defers_stmt(stmt, out);
                }
            }
        }
        _ => {}
    }
}

/// Walks a deferred closure's body. Assignments count at any depth,
/// including inside closures and defers nested within the deferred one.
fn scan_block(
    block: &Block,
    res: &Resolution,
    named_errors: &HashSet<SymbolId>,
    lints: &mut Vec<Lint>,
) {
    for stmt in &block.stmts {
        scan_stmt(stmt, res, named_errors, lints);
    }
}

fn scan_stmt(
    stmt: &Stmt,
    res: &Resolution,
    named_errors: &HashSet<SymbolId>,
    lints: &mut Vec<Lint>,
) {
    match stmt {
        Stmt::Assign { lhs, rhs, .. } => {
            for target in lhs {
                check_target(target, res, named_errors, lints);
            }
            for value in rhs {
                scan_expr(value, res, named_errors, lints);
            }
        }
        Stmt::Var(decl) => {
            for value in &decl.values {
                scan_expr(value, res, named_errors, lints);
            }
        }
        Stmt::Const(decl) => {
            for value in &decl.values {
                scan_expr(value, res, named_errors, lints);
            }
        }
        Stmt::IncDec { target, .. } => scan_expr(target, res, named_errors, lints),
        Stmt::Expr { expr, .. } => scan_expr(expr, res, named_errors, lints),
        Stmt::Return { results, .. } => {
            for expr in results {
                scan_expr(expr, res, named_errors, lints);
            }
        }
        Stmt::If {
            init,
            cond,
            then_block,
            else_branch,
            ..
        } => {
            if let Some(init) = init {
                scan_stmt(init, res, named_errors, lints);
            }
            scan_expr(cond, res, named_errors, lints);
            scan_block(then_block, res, named_errors, lints);
            if let Some(else_branch) = else_branch {
                scan_stmt(else_branch, res, named_errors, lints);
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => {
            if let Some(init) = init {
                scan_stmt(init, res, named_errors, lints);
            }
            if let Some(cond) = cond {
                scan_expr(cond, res, named_errors, lints);
            }
            if let Some(post) = post {
                scan_stmt(post, res, named_errors, lints);
            }
            scan_block(body, res, named_errors, lints);
        }
        Stmt::Range { subject, body, .. } => {
            scan_expr(subject, res, named_errors, lints);
            scan_block(body, res, named_errors, lints);
        }
        Stmt::Switch {
            init, tag, cases, ..
        } => {
            if let Some(init) = init {
                scan_stmt(init, res, named_errors, lints);
            }
            if let Some(tag) = tag {
                scan_expr(tag, res, named_errors, lints);
            }
            for case in cases {
                for value in &case.values {
                    scan_expr(value, res, named_errors, lints);
                }
                for stmt in &case.body {
                    scan_stmt(stmt, res, named_errors, lints);
                }
            }
        }
        Stmt::Block(block) => scan_block(block, res, named_errors, lints),
        Stmt::Defer { call, .. } | Stmt::Go { call, .. } => {
            scan_expr(call, res, named_errors, lints)
        }
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
    }
}

fn scan_expr(
    expr: &Expr,
    res: &Resolution,
    named_errors: &HashSet<SymbolId>,
    lints: &mut Vec<Lint>,
) {
    match &expr.kind {
        ExprKind::FuncLit { body, .. } => scan_block(body, res, named_errors, lints),
        ExprKind::Call { fun, args } => {
            scan_expr(fun, res, named_errors, lints);
            for arg in args {
                scan_expr(arg, res, named_errors, lints);
            }
        }
        ExprKind::Selector { base, .. } => scan_expr(base, res, named_errors, lints),
        ExprKind::Index { base, index } => {
            scan_expr(base, res, named_errors, lints);
            scan_expr(index, res, named_errors, lints);
        }
        ExprKind::CompositeLit { elems, .. } => {
            for elem in elems {
                if let Some(key) = &elem.key {
                    scan_expr(key, res, named_errors, lints);
                }
                scan_expr(&elem.value, res, named_errors, lints);
            }
        }
        ExprKind::Unary { expr, .. } => scan_expr(expr, res, named_errors, lints),
        ExprKind::Binary { left, right, .. } => {
            scan_expr(left, res, named_errors, lints);
            scan_expr(right, res, named_errors, lints);
        }
        ExprKind::Paren(inner) | ExprKind::Star(inner) => {
            scan_expr(inner, res, named_errors, lints)
        }
        ExprKind::Ident(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::StringLit(_)
        | ExprKind::CharLit(_) => {}
    }
}

fn check_target(
    target: &Expr,
    res: &Resolution,
    named_errors: &HashSet<SymbolId>,
    lints: &mut Vec<Lint>,
) {
    // Field, index, and dereference targets store through another object;
    // only a plain identifier binds a local the return path could miss.
    let ExprKind::Ident(name) = &target.kind else {
        return;
    };
    if name == "_" {
        return;
    }
    // A defining occurrence introduces a fresh variable; nothing is lost.
    if res.is_def(target.id) {
        return;
    }
    let Some(sym) = res.object_of(target.id) else {
        return;
    };
    if !res.symbol(sym).ty.is_error() {
        return;
    }
    if named_errors.contains(&sym) {
        return;
    }
    lints.push(Lint {
        span: target.span.clone(),
        var_name: name.clone(),
        message: format!(
            "deferred function assigns to error {:?}, which is not a named return \u{2013} this assignment will not affect the function's return value",
            name
        ),
        suggested_fix: format!("Consider making {:?} a named return value", name),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use crate::resolve::resolve;

    fn lints_for(src: &str) -> Vec<Lint> {
        lints_with(src, DeferScan::DirectOnly)
    }

    fn lints_with(src: &str, scan: DeferScan) -> Vec<Lint> {
        let (tokens, _) = Lexer::new(src).lex_all();
        let mut parser = Parser::new(tokens);
        let file = parser.parse_file().expect("file parses");
        assert!(
            parser.diags.is_empty(),
            "unexpected parse diagnostics: {:?}",
            parser.diags.items
        );
        let res = resolve(&file);
        analyze_with(&file, &res, scan)
    }

    #[test]
    fn assignment_to_named_error_result_is_clean() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() (err error) {\n\tdefer func() {\n\t\terr = errors.New(\"cleanup\")\n\t}()\n\treturn nil\n}\n",
        );
        assert!(lints.is_empty(), "got {:?}", lints);
    }

    #[test]
    fn assignment_to_local_error_is_flagged() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tdefer func() {\n\t\terr = errors.New(\"lost\")\n\t}()\n\treturn err\n}\n",
        );
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].var_name, "err");
        assert!(lints[0].message.contains("\"err\""));
        assert!(lints[0].message.contains("not a named return"));
        assert_eq!(
            lints[0].suggested_fix,
            "Consider making \"err\" a named return value"
        );
    }

    #[test]
    fn multi_value_results_without_names_are_flagged() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() (int, error) {\n\tvar err error\n\tdefer func() {\n\t\terr = errors.New(\"lost\")\n\t}()\n\treturn 0, err\n}\n",
        );
        assert_eq!(lints.len(), 1);
    }

    #[test]
    fn error_declared_in_grouped_var_is_flagged() {
        // The error variable sits in a later spec of a `var (...)` group.
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar (\n\t\tn int\n\t\terr error\n\t)\n\t_ = n\n\tdefer func() {\n\t\terr = errors.New(\"lost\")\n\t}()\n\treturn err\n}\n",
        );
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].var_name, "err");
    }

    #[test]
    fn blank_target_is_ignored() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tdefer func() {\n\t\t_ = errors.New(\"dropped\")\n\t}()\n\treturn nil\n}\n",
        );
        assert!(lints.is_empty());
    }

    #[test]
    fn short_declaration_inside_closure_is_not_flagged() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() (err error) {\n\tdefer func() {\n\t\terr := errors.New(\"shadow\")\n\t\t_ = err\n\t}()\n\treturn nil\n}\n",
        );
        assert!(lints.is_empty(), "got {:?}", lints);
    }

    #[test]
    fn plain_assignment_to_shadowing_binding_is_flagged() {
        // The `:=` introduces a new err; the later `=` writes to that new
        // binding, which is not the named result.
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() (err error) {\n\tdefer func() {\n\t\terr := errors.New(\"shadow\")\n\t\terr = errors.New(\"written to shadow\")\n\t\t_ = err\n\t}()\n\treturn nil\n}\n",
        );
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].var_name, "err");
    }

    #[test]
    fn struct_field_target_is_ignored() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\ntype result struct {\n\terr error\n}\n\nfunc f() error {\n\tr := result{}\n\tdefer func() {\n\t\tr.err = errors.New(\"field\")\n\t}()\n\treturn r.err\n}\n",
        );
        assert!(lints.is_empty(), "got {:?}", lints);
    }

    #[test]
    fn defined_type_over_error_is_not_flagged() {
        let lints = lints_for(
            "package p\n\ntype myErr error\n\nfunc f() error {\n\tvar e myErr\n\tdefer func() {\n\t\te = nil\n\t}()\n\t_ = e\n\treturn nil\n}\n",
        );
        assert!(lints.is_empty(), "got {:?}", lints);
    }

    #[test]
    fn defer_inside_loop_is_skipped_by_default() {
        let src = "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tfor i := 0; i < 3; i++ {\n\t\tdefer func() {\n\t\t\terr = errors.New(\"loop\")\n\t\t}()\n\t}\n\treturn err\n}\n";
        assert!(lints_for(src).is_empty());
        // Recursive scanning treats loop defers as roots too.
        assert_eq!(lints_with(src, DeferScan::Recursive).len(), 1);
    }

    #[test]
    fn assignment_in_nested_closure_is_found() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tdefer func() {\n\t\tg := func() {\n\t\t\terr = errors.New(\"deep\")\n\t\t}\n\t\tg()\n\t}()\n\treturn err\n}\n",
        );
        assert_eq!(lints.len(), 1);
    }

    #[test]
    fn defer_nested_inside_deferred_closure_is_scanned_not_rooted() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tdefer func() {\n\t\tdefer func() {\n\t\t\terr = errors.New(\"inner\")\n\t\t}()\n\t}()\n\treturn err\n}\n",
        );
        assert_eq!(lints.len(), 1);
    }

    #[test]
    fn short_declaration_reusing_named_result_keeps_it_named() {
        // `n, err := g()` reuses the named result err, so the write counts
        // toward the return value.
        let lints = lints_for(
            "package p\n\nfunc g() (int, error) { return 0, nil }\n\nfunc f() (err error) {\n\tdefer func() {\n\t\tn, err := g()\n\t\t_ = n\n\t\t_ = err\n\t}()\n\treturn nil\n}\n",
        );
        assert!(lints.is_empty(), "got {:?}", lints);
    }

    #[test]
    fn deferred_named_function_has_nothing_to_scan() {
        let lints = lints_for(
            "package p\n\nfunc cleanup() {}\n\nfunc f() error {\n\tvar err error\n\tdefer cleanup()\n\treturn err\n}\n",
        );
        assert!(lints.is_empty());
    }

    #[test]
    fn unknown_typed_target_is_never_flagged() {
        let lints = lints_for(
            "package p\n\nimport \"io\"\n\nfunc f() error {\n\t_, w := io.Pipe()\n\tdefer func() {\n\t\tw = nil\n\t}()\n\t_ = w\n\treturn nil\n}\n",
        );
        assert!(lints.is_empty(), "got {:?}", lints);
    }

    #[test]
    fn multiple_assignments_produce_multiple_lints() {
        let lints = lints_for(
            "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tvar other error\n\tdefer func() {\n\t\terr = errors.New(\"a\")\n\t\tother = errors.New(\"b\")\n\t}()\n\t_ = other\n\treturn err\n}\n",
        );
        assert_eq!(lints.len(), 2);
        assert_eq!(lints[0].var_name, "err");
        assert_eq!(lints[1].var_name, "other");
    }
}
