//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gitclone::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::defaults;

/// Generate an error for when an explicitly requested configuration file
/// does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a {yaml} or {txt} file in the current directory\n\
         hint: Use --config / --text-config to point at another file\n\
         hint: Pass a repository directly: gitclone clone <url> [directory]",
        path = path.display(),
        yaml = defaults::CONFIG_FILE,
        txt = defaults::TEXT_CONFIG_FILE,
    )
}

/// Generate an error for when `git` cannot be executed.
pub fn git_not_installed(cause: &crate::error::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "{cause}\n\n\
         hint: Install git from https://git-scm.com/downloads\n\
         hint: Make sure the directory containing git is on your PATH"
    )
}

/// Hint text for an unknown key in a configuration mapping.
///
/// `valid` lists the keys accepted where the unknown one was found.
pub fn unknown_config_key(key: &str, valid: &[&str]) -> String {
    match find_similar(key, valid) {
        Some(similar) => format!("Did you mean '{similar}'?"),
        None => format!("Valid keys here are: {}", valid.join(", ")),
    }
}

/// Hint text for an invalid `includes` regular expression.
pub fn invalid_regex(error: &regex::Error) -> String {
    match error {
        regex::Error::Syntax(msg) if msg.contains("unclosed") => {
            "Check for unclosed brackets, parentheses, or braces".to_string()
        }
        regex::Error::Syntax(msg) if msg.contains("repetition") => {
            "Repetition operators (+, *, ?) must follow a pattern".to_string()
        }
        _ => "Test patterns at https://regex101.com (select Rust flavor)".to_string(),
    }
}

/// Hint text for two repositories that resolve to the same destination.
pub fn duplicate_destination(second: &str) -> String {
    format!(
        "give {} its own directory, e.g. '{} other-name'",
        second, second
    )
}

/// Hint text for a repository specification that could not be parsed.
pub fn repository_format(repostr: &str) -> String {
    let after_scheme = repostr
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(repostr);
    if after_scheme.contains("//") {
        return "Remove the doubled '/' from the repository path".to_string();
    }
    if !repostr.contains("://") && !repostr.contains(':') {
        return format!(
            "Add a scheme or ssh user, e.g. https://{repostr} or git@{}",
            repostr.replacen('/', ":", 1)
        );
    }
    if repostr.trim_end().ends_with(".git") && repostr.split_whitespace().count() > 1 {
        return "Destination directories must not end in '.git'".to_string();
    }
    "Examples: https://github.com/org/repo.git@main dir, git@github.com:org/repo.git".to_string()
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
