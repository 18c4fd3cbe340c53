// Purpose: Provide default binary entry for the checker CLI.
// Inputs/Outputs: Reads process args and returns process exit code from CLI dispatcher.
// Invariants: Main must not bypass centralized CLI argument/diagnostic handling.
// Gotchas: Exit codes are part of the CLI contract; do not remap them here.

fn main() {
    let code = deferrlint::cli::run_cli(std::env::args().skip(1));
    std::process::exit(code);
}
