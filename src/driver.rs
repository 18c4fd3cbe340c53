// Purpose: File-level driver tying the front end, resolver, and analyzer
//   together for the CLI.
// Inputs/Outputs: Expands path patterns to .go files; per file produces
//   serializable reports with file/line/column positions.
// Invariants: Parse failures abort the file with an error instead of
//   producing partial reports; suppressed lines never reach the output.
// Gotchas: A `dir/...` pattern recurses; a bare directory takes only its
//   immediate .go files, matching how package patterns usually behave.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::analyzer::{self, DeferScan};
use crate::frontend::lexer::{Comment, Lexer};
use crate::frontend::parser::Parser;
use crate::resolve;

/// Name the checker answers to in `//nolint:` comments.
pub const CHECK_NAME: &str = "deferrlint";

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub scan: DeferScan,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub suggested_fix: String,
}

pub fn render_human(report: &Report) -> String {
    format!(
        "{}:{}:{}: {}",
        report.file, report.line, report.column, report.message
    )
}

/// Expands CLI path patterns: a `.go` file stands for itself, a directory
/// for its immediate `.go` files, and `dir/...` for the whole subtree.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if let Some(root) = pattern.strip_suffix("/...") {
            collect_go_files(Path::new(root), true, &mut files)?;
        } else {
            let path = Path::new(pattern);
            if path.is_dir() {
                collect_go_files(path, false, &mut files)?;
            } else {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_go_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_go_files(&path, true, out)?;
            }
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("go") {
            out.push(path);
        }
    }
    Ok(())
}

pub fn check_file(path: &Path, options: Options) -> Result<Vec<Report>> {
    let source =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    check_source(&path.display().to_string(), &source, options)
}

pub fn check_source(file: &str, source: &str, options: Options) -> Result<Vec<Report>> {
    let (tokens, comments) = Lexer::new(source).lex_all();
    let mut parser = Parser::new(tokens);
    let parsed = parser.parse_file();
    if !parser.diags.is_empty() {
        bail!("{}", parser.diags.render_all(file, source));
    }
    let Some(parsed) = parsed else {
        bail!("{}: missing package clause", file);
    };
    let res = resolve::resolve(&parsed);
    let lints = analyzer::analyze_with(&parsed, &res, options.scan);
    let suppressed = suppressed_lines(&comments);
    Ok(lints
        .into_iter()
        .filter(|lint| !suppressed.contains(&lint.span.line))
        .map(|lint| Report {
            file: file.to_string(),
            line: lint.span.line,
            column: lint.span.column,
            message: lint.message,
            suggested_fix: lint.suggested_fix,
        })
        .collect())
}

/// Lines whose trailing comment opts out of this checker, either a bare
/// `//nolint` or a `//nolint:` list naming it.
fn suppressed_lines(comments: &[Comment]) -> HashSet<usize> {
    comments
        .iter()
        .filter(|comment| {
            let text = comment.text.trim();
            match text.strip_prefix("nolint") {
                Some("") => true,
                Some(rest) => rest
                    .strip_prefix(':')
                    .is_some_and(|names| names.split(',').any(|name| name.trim() == CHECK_NAME)),
                None => false,
            }
        })
        .map(|comment| comment.span.line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn fixture_dir(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
    }

    /// Parses `// want "pattern"` comments: line number plus the pattern the
    /// report message on that line must match. The quoted text is unescaped
    /// like a string literal and then compiled as a regex.
    fn expectations(source: &str) -> Vec<(usize, Regex)> {
        let marker = Regex::new(r#"// want "((?:[^"\\]|\\.)*)""#).expect("marker regex");
        source
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                marker.captures(line).map(|caps| {
                    let pattern = caps[1].replace("\\\"", "\"").replace("\\\\", "\\");
                    let re = Regex::new(&pattern).expect("want pattern compiles");
                    (i + 1, re)
                })
            })
            .collect()
    }

    fn check_fixture(name: &str, options: Options) -> (Vec<Report>, Vec<(usize, Regex)>) {
        let dir = fixture_dir(name);
        let files = expand_patterns(&[dir.display().to_string()]).expect("expand fixture dir");
        assert!(!files.is_empty(), "no fixture files under {}", dir.display());
        let mut reports = Vec::new();
        let mut wants = Vec::new();
        for path in files {
            let source = fs::read_to_string(&path).expect("read fixture");
            wants.extend(expectations(&source));
            reports.extend(
                check_source(&path.display().to_string(), &source, options).expect("check"),
            );
        }
        (reports, wants)
    }

    fn assert_fixture(name: &str) {
        let (reports, wants) = check_fixture(name, Options::default());
        for (line, pattern) in &wants {
            assert!(
                reports
                    .iter()
                    .any(|r| r.line == *line && pattern.is_match(&r.message)),
                "{}: no report on line {} matching {:?}",
                name,
                line,
                pattern.as_str()
            );
        }
        for report in &reports {
            assert!(
                wants
                    .iter()
                    .any(|(line, pattern)| report.line == *line && pattern.is_match(&report.message)),
                "{}: unexpected report {}",
                name,
                render_human(report)
            );
        }
    }

    #[test]
    fn fixture_ok() {
        assert_fixture("ok");
    }

    #[test]
    fn fixture_fail() {
        assert_fixture("fail");
    }

    #[test]
    fn fixture_multireturn() {
        assert_fixture("multireturn");
    }

    #[test]
    fn fixture_shadowed() {
        assert_fixture("shadowed");
    }

    #[test]
    fn fixture_structassign() {
        assert_fixture("structassign");
    }

    #[test]
    fn fixture_nested_defer() {
        assert_fixture("nested_defer");
    }

    #[test]
    fn fixture_loop_defer_is_clean_by_default() {
        assert_fixture("loop_defer");
        let (reports, _) = check_fixture("loop_defer", Options::default());
        assert!(reports.is_empty());
    }

    #[test]
    fn fixture_loop_defer_flagged_when_scanning_recursively() {
        let options = Options {
            scan: DeferScan::Recursive,
        };
        let (reports, _) = check_fixture("loop_defer", options);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("\"err\""));
    }

    #[test]
    fn fixture_pipe_exception_is_suppressed() {
        let (reports, _) = check_fixture("pipe_exception", Options::default());
        assert!(reports.is_empty(), "nolint should suppress: {:?}", reports);
    }

    #[test]
    fn triple_dot_pattern_recurses() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");
        let pattern = format!("{}/...", root.display());
        let files = expand_patterns(&[pattern]).expect("expand");
        assert!(files.len() >= 8);
        assert!(files
            .iter()
            .all(|f| f.extension().and_then(|e| e.to_str()) == Some("go")));
    }

    #[test]
    fn reports_serialize_with_position_fields() {
        let report = Report {
            file: "x.go".to_string(),
            line: 7,
            column: 3,
            message: "m".to_string(),
            suggested_fix: "f".to_string(),
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"file\":\"x.go\""));
        assert!(json.contains("\"line\":7"));
        assert!(json.contains("\"column\":3"));
    }

    #[test]
    fn parse_failure_surfaces_as_error() {
        let err = check_source("broken.go", "package p\n\nfunc f() {\n", Options::default());
        assert!(err.is_err());
    }

    #[test]
    fn bare_nolint_suppresses_too() {
        let src = "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tdefer func() {\n\t\terr = errors.New(\"x\") //nolint\n\t}()\n\treturn err\n}\n";
        let reports = check_source("t.go", src, Options::default()).expect("check");
        assert!(reports.is_empty());
    }

    #[test]
    fn nolint_for_other_checker_does_not_suppress() {
        let src = "package p\n\nimport \"errors\"\n\nfunc f() error {\n\tvar err error\n\tdefer func() {\n\t\terr = errors.New(\"x\") //nolint:unused\n\t}()\n\treturn err\n}\n";
        let reports = check_source("t.go", src, Options::default()).expect("check");
        assert_eq!(reports.len(), 1);
    }
}
