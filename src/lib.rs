// Purpose: Define crate-level module surface for the checker and its tooling.
// Inputs/Outputs: Re-exports internal modules for the binary and integration tests.
// Invariants: Public module boundaries should remain stable for internal callers.
// Gotchas: Keep module wiring consistent with the src/main.rs entry path.

pub mod analyzer;
pub mod cli;
pub mod driver;
pub mod frontend;
pub mod resolve;
