//! # Repository Specifications
//!
//! This module turns free-form repository specification strings into
//! [`CloneJob`] records. A specification has the form
//!
//! ```text
//! <url>[@<branch>] [<destination>]
//! ```
//!
//! where `<url>` takes one of three shapes, tried in this order:
//!
//! 1. **SSH**: `user@host:path`, e.g. `git@github.com:org/repo.git`
//! 2. **OAuth token**: `scheme://token@host/path`, e.g.
//!    `https://token@github.com/org/repo.git`
//! 3. **Normal**: `scheme://host/path`, e.g. `https://github.com/org/repo`
//!
//! Branch and destination are split off right-to-left: the destination is
//! whatever follows the last whitespace, the branch is whatever follows the
//! single `@` allowed in the path part. When no destination is given it is
//! derived from the last path segment with a trailing `.git` removed.
//!
//! ```
//! use gitclone::repository::{parse, Delimiter};
//!
//! let job = parse("git@github.com:org/repo.git@main").unwrap();
//! assert_eq!(job.base_url(), "git@github.com");
//! assert_eq!(job.delimiter(), Delimiter::Colon);
//! assert_eq!(job.remote_src(), "org/repo.git");
//! assert_eq!(job.branch(), Some("main"));
//! assert_eq!(job.dest(), std::path::Path::new("repo"));
//! assert_eq!(job.full_url(), "git@github.com:org/repo.git");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{Error, Result};

const SSH_PATTERN: &str = r"^([^@/]+@[^:]+):([^@]+)(?:@([^@]+))?$";
const OAUTH_PATTERN: &str = r"^([a-z]+://[^@/]+@[^@/]+)/([^@]+)(?:@([^@]+))?$";
const NORMAL_PATTERN: &str = r"^([a-z]+://[^@/]+)/([^@]+)(?:@([^@]+))?$";

/// URL shapes in match priority order.
const SHAPES: [(Delimiter, &str); 3] = [
    (Delimiter::Colon, SSH_PATTERN),
    (Delimiter::Slash, OAUTH_PATTERN),
    (Delimiter::Slash, NORMAL_PATTERN),
];

/// Separator between the server part and the remote path of a clone URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `/`, used by `scheme://host/path` URLs.
    Slash,
    /// `:`, used by scp-like `user@host:path` URLs.
    Colon,
}

impl Delimiter {
    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::Slash => "/",
            Delimiter::Colon => ":",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One repository to clone.
///
/// Records are immutable once built. `full_url` is computed a single time
/// from `base_url`, `delimiter` and `remote_src`; nothing else rebuilds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CloneJob {
    base_url: String,
    delimiter: Delimiter,
    remote_src: String,
    full_url: String,
    dest: PathBuf,
    branch: Option<String>,
}

impl CloneJob {
    /// Build a job from its parts. An empty branch is treated as "default
    /// branch".
    pub fn new(
        base_url: impl Into<String>,
        delimiter: Delimiter,
        remote_src: impl Into<String>,
        dest: impl Into<PathBuf>,
        branch: Option<String>,
    ) -> Self {
        let base_url = base_url.into();
        let remote_src = remote_src.into();
        let full_url = format!("{}{}{}", base_url, delimiter, remote_src);
        Self {
            base_url,
            delimiter,
            remote_src,
            full_url,
            dest: dest.into(),
            branch: branch.filter(|b| !b.is_empty()),
        }
    }

    /// Server part used to group jobs for throttling.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn remote_src(&self) -> &str {
        &self.remote_src
    }

    /// The URL handed to `git clone`.
    pub fn full_url(&self) -> &str {
        &self.full_url
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Returns a copy of this job targeting another destination.
    ///
    /// Used by callers resolving relative destinations against a root
    /// directory; the URL parts are carried over unchanged.
    pub fn with_dest(&self, dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for CloneJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_url)?;
        if let Some(branch) = &self.branch {
            write!(f, "@{}", branch)?;
        }
        write!(f, " {}", self.dest.display())
    }
}

/// Parse a repository specification into a [`CloneJob`].
///
/// Fails with [`Error::RepositoryFormat`] carrying the raw input when the
/// string does not match any supported shape.
pub fn parse(repostr: &str) -> Result<CloneJob> {
    let invalid = || Error::RepositoryFormat {
        repostr: repostr.to_string(),
    };

    let trimmed = repostr.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (url, dest) = match trimmed.rsplit_once(char::is_whitespace) {
        Some((url, dest)) => (url.trim(), dest.trim()),
        None => (trimmed, ""),
    };
    if url.is_empty() || url.contains(char::is_whitespace) {
        return Err(invalid());
    }

    for (delimiter, pattern) in SHAPES {
        let regex = Regex::new(pattern).map_err(Error::Regex)?;
        let Some(captures) = regex.captures(url) else {
            continue;
        };

        let base_url = &captures[1];
        let raw_path = &captures[2];
        let branch = captures.get(3).map(|m| m.as_str().to_string());

        if raw_path.contains("//") {
            return Err(invalid());
        }
        let remote_src = raw_path.trim_end_matches('/');
        if remote_src.is_empty() {
            return Err(invalid());
        }

        let dest = if dest.is_empty() {
            derive_dest(remote_src).ok_or_else(invalid)?
        } else {
            if dest.contains("//") || dest.ends_with(".git") {
                return Err(invalid());
            }
            dest.to_string()
        };

        return Ok(CloneJob::new(
            base_url, delimiter, remote_src, dest, branch,
        ));
    }

    Err(invalid())
}

/// Last path segment of `remote_src` without a trailing `.git`.
fn derive_dest(remote_src: &str) -> Option<String> {
    let segment = remote_src.rsplit('/').next()?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    if name.is_empty() || name.ends_with(".git") {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parsed(
        input: &str,
        base_url: &str,
        delimiter: Delimiter,
        remote_src: &str,
        branch: Option<&str>,
        dest: &str,
    ) {
        let job = parse(input).unwrap_or_else(|e| panic!("'{}' should parse: {}", input, e));
        assert_eq!(job.base_url(), base_url, "base_url of '{}'", input);
        assert_eq!(job.delimiter(), delimiter, "delimiter of '{}'", input);
        assert_eq!(job.remote_src(), remote_src, "remote_src of '{}'", input);
        assert_eq!(job.branch(), branch, "branch of '{}'", input);
        assert_eq!(job.dest(), Path::new(dest), "dest of '{}'", input);
    }

    fn assert_rejected(input: &str) {
        match parse(input) {
            Err(Error::RepositoryFormat { repostr }) => assert_eq!(repostr, input),
            other => panic!("'{}' should be rejected, got {:?}", input, other),
        }
    }

    // ========================================================================
    // Normal shape
    // ========================================================================

    #[test]
    fn test_https_with_dest() {
        assert_parsed(
            "https://github.com/org/repo.git myrepo",
            "https://github.com",
            Delimiter::Slash,
            "org/repo.git",
            None,
            "myrepo",
        );
    }

    #[test]
    fn test_https_without_dest() {
        assert_parsed(
            "https://github.com/evyli/gitclone",
            "https://github.com",
            Delimiter::Slash,
            "evyli/gitclone",
            None,
            "gitclone",
        );
    }

    #[test]
    fn test_https_git_extension_stripped_from_derived_dest() {
        assert_parsed(
            "https://github.com/evyli/gitclone.git",
            "https://github.com",
            Delimiter::Slash,
            "evyli/gitclone.git",
            None,
            "gitclone",
        );
    }

    #[test]
    fn test_https_other_extension_kept_in_derived_dest() {
        assert_parsed(
            "https://github.com/evyli/gitclone.other",
            "https://github.com",
            Delimiter::Slash,
            "evyli/gitclone.other",
            None,
            "gitclone.other",
        );
    }

    #[test]
    fn test_https_explicit_dest_with_extension() {
        assert_parsed(
            "https://github.com/evyli/gitclone.git gitclone.test",
            "https://github.com",
            Delimiter::Slash,
            "evyli/gitclone.git",
            None,
            "gitclone.test",
        );
    }

    #[test]
    fn test_https_branch() {
        assert_parsed(
            "https://github.com/evyli/gitclone@main",
            "https://github.com",
            Delimiter::Slash,
            "evyli/gitclone",
            Some("main"),
            "gitclone",
        );
    }

    #[test]
    fn test_https_feature_branch_with_dest() {
        assert_parsed(
            "https://github.com/evyli/gitclone@feature/main gitclone",
            "https://github.com",
            Delimiter::Slash,
            "evyli/gitclone",
            Some("feature/main"),
            "gitclone",
        );
    }

    #[test]
    fn test_https_trailing_slash_removed() {
        let job = parse("https://github.com/evyli/gitclone/").unwrap();
        assert_eq!(job.remote_src(), "evyli/gitclone");
        assert_eq!(job.dest(), Path::new("gitclone"));
        assert_eq!(job.full_url(), "https://github.com/evyli/gitclone");
    }

    #[test]
    fn test_nested_dest_is_kept_as_given() {
        let job = parse("https://github.com/leahevy/gitclone.git base/gitclone").unwrap();
        assert_eq!(job.dest(), Path::new("base/gitclone"));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let job = parse("  https://github.com/org/repo   dest  ").unwrap();
        assert_eq!(job.full_url(), "https://github.com/org/repo");
        assert_eq!(job.dest(), Path::new("dest"));
    }

    // ========================================================================
    // SSH shape
    // ========================================================================

    #[test]
    fn test_ssh_with_branch() {
        assert_parsed(
            "git@github.com:org/repo.git@main",
            "git@github.com",
            Delimiter::Colon,
            "org/repo.git",
            Some("main"),
            "repo",
        );
    }

    #[test]
    fn test_ssh_with_branch_and_dest() {
        assert_parsed(
            "git@github.com:evyli/gitclone.git@main dest",
            "git@github.com",
            Delimiter::Colon,
            "evyli/gitclone.git",
            Some("main"),
            "dest",
        );
    }

    #[test]
    fn test_ssh_with_feature_branch() {
        assert_parsed(
            "git@github.com:evyli/gitclone.git@feature/main dest",
            "git@github.com",
            Delimiter::Colon,
            "evyli/gitclone.git",
            Some("feature/main"),
            "dest",
        );
    }

    #[test]
    fn test_ssh_single_at_in_remainder_is_branch() {
        assert_parsed(
            "git@github.com:evyli@gitclone.git",
            "git@github.com",
            Delimiter::Colon,
            "evyli",
            Some("gitclone.git"),
            "evyli",
        );
    }

    #[test]
    fn test_ssh_full_url_uses_colon() {
        let job = parse("git@github.com:evyli/gitclone.git").unwrap();
        assert_eq!(job.full_url(), "git@github.com:evyli/gitclone.git");
    }

    // ========================================================================
    // OAuth shape
    // ========================================================================

    #[test]
    fn test_oauth() {
        assert_parsed(
            "https://oauth-key@github.com/evyli/gitclone.git",
            "https://oauth-key@github.com",
            Delimiter::Slash,
            "evyli/gitclone.git",
            None,
            "gitclone",
        );
    }

    #[test]
    fn test_oauth_with_branch_and_dest() {
        assert_parsed(
            "https://oauth-key@github.com/evyli/gitclone.git@dev dest",
            "https://oauth-key@github.com",
            Delimiter::Slash,
            "evyli/gitclone.git",
            Some("dev"),
            "dest",
        );
    }

    // ========================================================================
    // Rejections
    // ========================================================================

    #[test]
    fn test_rejects_empty_and_blank() {
        assert_rejected("");
        assert_rejected("   ");
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert_rejected("github.com/evyli/gitclone");
        assert_rejected("github.com");
        assert_rejected("github.com dest");
        assert_rejected("github.com@main dest");
    }

    #[test]
    fn test_rejects_missing_path() {
        assert_rejected("https://github.com/");
        assert_rejected("https://github.com");
    }

    #[test]
    fn test_rejects_double_separator() {
        assert_rejected("https://github.com/evyli//gitclone");
        assert_rejected("https://github.com/evyli/gitclone dest//sub");
        assert_rejected("git@github.com:evyli//gitclone.git");
    }

    #[test]
    fn test_rejects_empty_branch() {
        assert_rejected("git@github.com:evyli/gitclone.git@");
        assert_rejected("https://github.com/evyli/gitclone@ dest");
    }

    #[test]
    fn test_rejects_third_token() {
        assert_rejected("git@github.com:evyli/gitclone.git@main dest dest2");
    }

    #[test]
    fn test_rejects_at_in_path_followed_by_branch() {
        assert_rejected("git@github.com:evyli@gitclone.git@main dest");
        assert_rejected("git@github.com:evyli.com@gitclone.git@main dest");
        assert_rejected("https://github.com/evyli@gitclone.git@main dest");
        assert_rejected("https://github.com/evyli.com@gitclone.git@main dest");
    }

    #[test]
    fn test_rejects_empty_user_or_token() {
        assert_rejected("https://oauth-key@/evyli/gitclone.git");
        assert_rejected("https://@github.com/evyli/gitclone.git");
        assert_rejected("@github.com/evyli/gitclone.git");
        assert_rejected("@github.com:evyli/gitclone.git");
    }

    #[test]
    fn test_rejects_malformed_scheme() {
        assert_rejected("https:/@github.com/evyli/gitclone.git");
        assert_rejected("https:/github.com/evyli/gitclone.git");
        assert_rejected("https:github.com/evyli/gitclone.git");
        assert_rejected("https/github.com/evyli/gitclone.git");
        assert_rejected("https:@github.com/evyli/gitclone.git");
        assert_rejected("https/@github.com/evyli/gitclone.git");
        assert_rejected("https@github.com/evyli/gitclone.git");
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        for input in ["@", "@/", "/@", "/@/", "@ dest"] {
            assert_rejected(input);
        }
    }

    #[test]
    fn test_rejects_dest_ending_in_git() {
        assert_rejected("https://github.com/org/repo repo.git");
    }

    #[test]
    fn test_rejects_path_without_name() {
        assert_rejected("https://github.com/org/.git");
    }

    // ========================================================================
    // Record behaviour
    // ========================================================================

    #[test]
    fn test_parse_is_idempotent() {
        let input = "https://github.com/org/repo.git@main dest";
        assert_eq!(parse(input).unwrap(), parse(input).unwrap());
    }

    #[test]
    fn test_with_dest_keeps_url_parts() {
        let job = parse("git@github.com:org/repo.git@main").unwrap();
        let moved = job.with_dest("/srv/mirror/repo");
        assert_eq!(moved.full_url(), job.full_url());
        assert_eq!(moved.branch(), Some("main"));
        assert_eq!(moved.dest(), Path::new("/srv/mirror/repo"));
        assert_ne!(moved, job);
    }

    #[test]
    fn test_new_treats_empty_branch_as_default() {
        let job = CloneJob::new(
            "https://example.com",
            Delimiter::Slash,
            "a/b",
            "b",
            Some(String::new()),
        );
        assert_eq!(job.branch(), None);
        assert_eq!(job.full_url(), "https://example.com/a/b");
    }

    #[test]
    fn test_display() {
        let job = parse("git@github.com:org/repo.git@main dest").unwrap();
        assert_eq!(job.to_string(), "git@github.com:org/repo.git@main dest");
    }
}
