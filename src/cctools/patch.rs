//! Named text patches for third-party build scripts.
//!
//! Patches are plain substring replacements. A rule whose pattern is not
//! found is reported rather than silently skipped, so drift in the upstream
//! sources shows up in the output.

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};

/// One search/replace applied to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
    /// Label used in messages.
    pub name: String,
    /// File relative to the source directory.
    pub file: PathBuf,
    pub search: String,
    pub replace: String,
}

impl PatchRule {
    pub fn new(
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        search: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// What happened when a rule was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub rule: String,
    pub file: PathBuf,
    /// Number of occurrences replaced; zero means the pattern was not found.
    pub replacements: usize,
}

/// Apply `rules` to files under `source_dir`, in order.
///
/// A missing file is an error; a missing pattern is a warning.
pub fn apply_rules(source_dir: &Path, rules: &[PatchRule]) -> Result<Vec<PatchOutcome>> {
    let mut outcomes = Vec::with_capacity(rules.len());

    for rule in rules {
        let path = source_dir.join(&rule.file);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::filesystem(&path, format!("patch '{}' cannot read file: {}", rule.name, e))
        })?;

        let replacements = if rule.search.is_empty() {
            0
        } else {
            content.matches(rule.search.as_str()).count()
        };

        if replacements == 0 {
            eprintln!(
                "warning: patch '{}' found no match for {:?} in {}",
                rule.name,
                rule.search,
                path.display()
            );
        } else {
            let patched = content.replace(rule.search.as_str(), &rule.replace);
            std::fs::write(&path, patched).map_err(|e| {
                Error::filesystem(&path, format!("patch '{}' cannot write file: {}", rule.name, e))
            })?;
        }

        outcomes.push(PatchOutcome {
            rule: rule.name.clone(),
            file: rule.file.clone(),
            replacements,
        });
    }

    Ok(outcomes)
}

/// Remove `components` from the whitespace-separated list assigned to
/// `variable` in a makefile (continuation lines included).
///
/// Best effort: returns the names that were not present, without failing.
pub fn exclude_components(
    makefile: &Path,
    variable: &str,
    components: &[String],
) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(makefile)
        .map_err(|e| Error::filesystem(makefile, format!("cannot read makefile: {}", e)))?;

    let (patched, removed) = strip_from_assignment(&content, variable, components);

    let missing: Vec<String> = components
        .iter()
        .filter(|c| !removed.contains(c))
        .cloned()
        .collect();
    for name in &missing {
        eprintln!(
            "warning: component '{}' not listed in {} of {}",
            name,
            variable,
            makefile.display()
        );
    }

    if !removed.is_empty() {
        std::fs::write(makefile, patched)
            .map_err(|e| Error::filesystem(makefile, format!("cannot write makefile: {}", e)))?;
    }
    Ok(missing)
}

fn strip_from_assignment(
    content: &str,
    variable: &str,
    components: &[String],
) -> (String, Vec<String>) {
    let mut out = String::with_capacity(content.len());
    let mut removed = Vec::new();
    let mut in_assignment = false;

    for line in content.split_inclusive('\n') {
        let starts = is_assignment_of(line, variable);
        if starts || in_assignment {
            let (prefix, body) = if starts {
                split_assignment(line)
            } else {
                ("", line)
            };
            let continued = body.trim_end().ends_with('\\');
            out.push_str(prefix);
            out.push_str(&strip_words(body, components, &mut removed));
            in_assignment = continued;
        } else {
            out.push_str(line);
        }
    }

    (out, removed)
}

fn is_assignment_of(line: &str, variable: &str) -> bool {
    let Some(rest) = line.strip_prefix(variable) else {
        return false;
    };
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.starts_with('=') || rest.starts_with(":=") || rest.starts_with("+=")
}

/// Split `VAR = a b c` into (`VAR =`, ` a b c`).
fn split_assignment(line: &str) -> (&str, &str) {
    match line.find('=') {
        Some(idx) => line.split_at(idx + 1),
        None => (line, ""),
    }
}

fn strip_words(body: &str, components: &[String], removed: &mut Vec<String>) -> String {
    let newline = if body.ends_with('\n') { "\n" } else { "" };
    let trimmed = body.trim_end_matches('\n');
    let continued = trimmed.trim_end().ends_with('\\');
    let words = trimmed.trim_end().trim_end_matches('\\');

    let kept: Vec<&str> = words
        .split_whitespace()
        .filter(|word| {
            if let Some(name) = components.iter().find(|c| c.as_str() == *word) {
                removed.push(name.clone());
                false
            } else {
                true
            }
        })
        .collect();

    let mut line = String::new();
    if !kept.is_empty() {
        line.push(' ');
        line.push_str(&kept.join(" "));
    }
    if continued {
        line.push_str(" \\");
    }
    line.push_str(newline);
    line
}
