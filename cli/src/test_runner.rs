use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use mddoc::Warning;
use renderer::{RecordingBuilder, Region, RenderOptions};

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must be reported on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Rendering options, same keys as `mddoc.toml`.
    #[serde(default)]
    pub options: RenderOptions,

    /// Expected plain-text rendition of the body (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected text of the primary page header.
    #[serde(default)]
    pub expect_header: Option<String>,

    /// Expected text of the primary page footer.
    #[serde(default)]
    pub expect_footer: Option<String>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    /// Each entry checks message substring and optionally the source line.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Parse a `.test.md` file into its TOML config and markup source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    // 2. Parse frontmatter
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let description = config.description.clone();
    let outcome = match check(&config, source) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Convert `source` and compare against the expectations. Returns
/// `Some(reason)` on the first mismatch.
fn check(config: &TestConfig, source: &str) -> Option<String> {
    let mut builder = RecordingBuilder::new();
    let warnings = renderer::convert(source, &mut builder, &config.options);

    let renditions = [
        ("output", config.expect_output.as_deref(), builder.body_text()),
        (
            "header",
            config.expect_header.as_deref(),
            builder.region_text(Region::HeaderPrimary),
        ),
        (
            "footer",
            config.expect_footer.as_deref(),
            builder.region_text(Region::FooterPrimary),
        ),
    ];
    for (what, expected, actual) in renditions {
        let Some(expected) = expected else {
            continue;
        };
        let (expected, actual) = (expected.trim(), actual.trim());
        if expected != actual {
            return Some(format!(
                "{} mismatch\n  expected: {}\n  actual:   {}",
                what,
                expected.replace('\n', "\n            "),
                actual.replace('\n', "\n            ")
            ));
        }
    }

    config
        .expect_warnings
        .as_ref()
        .and_then(|expected| check_warnings(&warnings, expected))
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(warnings: &[Warning], expected: &[ExpectedWarning]) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual
            ));
        }

        if let Some(expected_line) = expected.line {
            if actual.line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but reported on line {}",
                    i, expected_line, actual.line
                ));
            }
        }
    }

    None
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with(".test.md"))
}

fn test_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_test_file(path))
        .collect();
    files.sort();
    files
}

/// Conformance suites are one folder deep: each subfolder of `root` is a
/// category, and files directly in `root` fall under "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories = BTreeMap::new();

    let loose = test_files_in(root);
    if !loose.is_empty() {
        categories.insert(String::new(), loose);
    }

    for dir in std::fs::read_dir(root).into_iter().flatten().flatten() {
        let path = dir.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let files = test_files_in(&path);
        if !files.is_empty() {
            categories.insert(name.to_string(), files);
        }
    }
    categories
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

/// Outcome tally of one `mddoc test` invocation.
#[derive(Default)]
struct Summary {
    passed: usize,
    failures: Vec<TestResult>,
}

impl Summary {
    fn record(&mut self, result: TestResult, no_color: bool) {
        let label = result.description.clone().unwrap_or_else(|| {
            result
                .path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "?".to_string())
        });
        match result.outcome {
            TestOutcome::Pass => {
                self.passed += 1;
                eprintln!("  {}  {}", paint("PASS", "32", no_color), label);
            }
            TestOutcome::Fail(_) => {
                eprintln!("  {}  {}", paint("FAIL", "31", no_color), label);
                self.failures.push(result);
            }
        }
    }

    /// Print failure details and the final tally; returns the exit code.
    fn finish(self, no_color: bool) -> i32 {
        for failure in &self.failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }

        eprintln!();
        let failed = self.failures.len();
        if failed == 0 {
            eprintln!(
                "test result: {}. {} passed, 0 failed",
                paint("ok", "32", no_color),
                self.passed
            );
            0
        } else {
            eprintln!(
                "test result: {}. {} passed, {} failed (of {})",
                paint("FAILED", "31", no_color),
                self.passed,
                failed,
                self.passed + failed
            );
            1
        }
    }
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only those categories run; names match
/// the subfolder exactly. Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let mut summary = Summary::default();

    if path.is_file() {
        summary.record(run_single_test(path), no_color);
        return summary.finish(no_color);
    }

    let mut suites = discover_categorized(path);
    if suites.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    if !categories.is_empty() {
        for request in categories {
            if !suites.contains_key(request.as_str()) {
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    request,
                    suites
                        .keys()
                        .map(|k| category_label(k))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        suites.retain(|category, _| categories.iter().any(|c| c == category));
        if suites.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
    }

    for (category, files) in &suites {
        eprintln!();
        eprintln!("{}", paint(category_label(category), "1", no_color));
        for file in files {
            summary.record(run_single_test(file), no_color);
        }
    }
    summary.finish(no_color)
}
