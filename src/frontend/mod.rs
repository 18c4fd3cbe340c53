// Purpose: Go-subset front end shared by the resolver and the analyzer.
// Inputs/Outputs: Source text in; spanned tokens, comments, and AST out.
// Invariants: Spans must stay byte-accurate; parse failures surface as
//   diagnostics, never panics.
// Gotchas: Semicolon insertion mirrors the Go spec rule, including the
//   implied newline at end of file.

pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
