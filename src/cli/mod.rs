// Purpose: Command-line entry point for the deferred-error-assignment check.
// Inputs/Outputs: Reads path patterns and flags from process args; prints
//   findings to stdout and errors to stderr; returns a process exit code.
// Invariants: Exit 0 means clean, 1 means findings, 2 means the run itself
//   failed (bad usage, unreadable input, parse failure).
// Gotchas: JSON mode still reports run failures on stderr so the stdout
//   stream stays machine-readable.

use crate::analyzer::DeferScan;
use crate::driver::{self, Options, CHECK_NAME};

pub fn run_cli<I>(args: I) -> i32
where
    I: IntoIterator<Item = String>,
{
    let mut json = false;
    let mut scan = DeferScan::DirectOnly;
    let mut patterns = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-json" => json = true,
            "-nested-defers" => scan = DeferScan::Recursive,
            "-h" | "-help" | "--help" => {
                print_usage();
                return 0;
            }
            _ if arg.starts_with('-') => {
                eprintln!("unknown flag: {}", arg);
                print_usage();
                return 2;
            }
            _ => patterns.push(arg),
        }
    }
    if patterns.is_empty() {
        print_usage();
        return 2;
    }

    let files = match driver::expand_patterns(&patterns) {
        Ok(files) => files,
        Err(err) => {
            eprintln!("{}: {:#}", CHECK_NAME, err);
            return 2;
        }
    };
    if files.is_empty() {
        eprintln!("{}: no .go files matched", CHECK_NAME);
        return 2;
    }

    let options = Options { scan };
    let mut reports = Vec::new();
    let mut failed = false;
    for file in &files {
        match driver::check_file(file, options) {
            Ok(mut found) => reports.append(&mut found),
            Err(err) => {
                eprintln!("{}: {:#}", CHECK_NAME, err);
                failed = true;
            }
        }
    }

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("{}: encode reports: {}", CHECK_NAME, err);
                return 2;
            }
        }
    } else {
        for report in &reports {
            println!("{}", driver::render_human(report));
        }
    }

    if failed {
        2
    } else if reports.is_empty() {
        0
    } else {
        1
    }
}

fn print_usage() {
    eprintln!("usage: {} [flags] <path|dir|dir/...> ...", CHECK_NAME);
    eprintln!("  -json           print findings as JSON");
    eprintln!("  -nested-defers  also scan defers inside loops and branches");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
            .display()
            .to_string()
    }

    fn run(args: &[&str]) -> i32 {
        run_cli(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn clean_input_exits_zero() {
        assert_eq!(run(&[&fixture("ok")]), 0);
    }

    #[test]
    fn findings_exit_one() {
        assert_eq!(run(&[&fixture("fail")]), 1);
        assert_eq!(run(&["-json", &fixture("fail")]), 1);
    }

    #[test]
    fn nested_defers_flag_changes_the_verdict() {
        assert_eq!(run(&[&fixture("loop_defer")]), 0);
        assert_eq!(run(&["-nested-defers", &fixture("loop_defer")]), 1);
    }

    #[test]
    fn missing_arguments_exit_two() {
        assert_eq!(run(&[]), 2);
    }

    #[test]
    fn unknown_flag_exits_two() {
        assert_eq!(run(&["-frobnicate", &fixture("ok")]), 2);
    }

    #[test]
    fn unmatched_pattern_exits_two() {
        let bogus = fixture("no_such_fixture_dir");
        assert_eq!(run(&[&format!("{}/...", bogus)]), 2);
    }

    #[test]
    fn help_exits_zero() {
        assert_eq!(run(&["-help"]), 0);
    }
}
