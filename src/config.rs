//! # Configuration Schema and Parsing
//!
//! This module defines the data structures behind the two configuration
//! files `gitclone` reads from the working directory, and the logic for
//! parsing them.
//!
//! ## `gitclone.yaml`
//!
//! ```yaml
//! dest: ~/src
//! autofetch:
//!   - github:
//!       user: evyli
//!       method: ssh
//!       path: "github/{user}/{repo}"
//! repositories:
//!   - https://github.com/evyli/gitclone.git@main tools/gitclone
//! ```
//!
//! Every mapping rejects keys it does not know; the resulting
//! [`Error::Config`] carries a "Did you mean" hint when the unknown key is a
//! near miss of a valid one.
//!
//! ## `gitclone.txt`
//!
//! One repository specification per line. Blank lines and lines starting
//! with `#` are ignored.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::suggestions;

/// How autofetched repositories are cloned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneMethod {
    /// `git@github.com:{full_name}.git`
    Ssh,
    /// `https://github.com/{full_name}.git`
    #[default]
    Https,
}

/// GitHub autofetch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubAutofetch {
    /// Account whose repositories are listed. Ignored for listing when a
    /// token is given; the token's own account is used instead.
    pub user: String,
    #[serde(default)]
    pub method: CloneMethod,
    /// Personal access token. Enables listing private repositories.
    #[serde(default)]
    pub token: Option<String>,
    /// Include private repositories (only meaningful with a token).
    #[serde(default)]
    pub private: bool,
    /// Destination template. `{user}` and `{repo}` are substituted.
    #[serde(default = "defaults::default_autofetch_path")]
    pub path: String,
    /// Regular expressions matched against the start of each generated
    /// specification. Empty keeps everything.
    #[serde(default)]
    pub includes: Vec<String>,
}

/// One entry of the `autofetch` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutofetchEntry {
    #[serde(default)]
    pub github: Option<GithubAutofetch>,
}

/// The contents of `gitclone.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root that relative destinations are resolved against.
    #[serde(default = "defaults::default_dest_root")]
    pub dest: String,
    #[serde(default)]
    pub autofetch: Vec<AutofetchEntry>,
    /// Repository specifications, in the same format as the command line.
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dest: defaults::default_dest_root(),
            autofetch: Vec::new(),
            repositories: Vec::new(),
        }
    }
}

impl Config {
    /// Check the values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.autofetch {
            let Some(github) = &entry.github else {
                continue;
            };
            if github.user.trim().is_empty() {
                return Err(Error::Config {
                    message: "autofetch.github.user must not be empty".to_string(),
                    hint: None,
                });
            }
            if github.path.is_empty() {
                return Err(Error::Config {
                    message: format!(
                        "Empty path given for autofetch user '{}'",
                        github.user
                    ),
                    hint: Some(format!(
                        "Use a template such as \"{}\"",
                        defaults::default_autofetch_path()
                    )),
                });
            }
            for include in &github.includes {
                if let Err(e) = Regex::new(include) {
                    return Err(Error::Config {
                        message: format!("Invalid includes pattern '{}': {}", include, e),
                        hint: Some(suggestions::invalid_regex(&e)),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Parse and validate the contents of a `gitclone.yaml` file.
///
/// An empty document yields the default configuration.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml_content).map_err(config_error)?;
    let config = if value.is_null() {
        Config::default()
    } else {
        serde_yaml::from_value::<Config>(value).map_err(config_error)?
    };
    config.validate()?;
    Ok(config)
}

/// Read and parse a `gitclone.yaml` file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Turn a serde error into [`Error::Config`], adding a hint for unknown keys.
fn config_error(error: serde_yaml::Error) -> Error {
    let message = error.to_string();
    let hint = unknown_field(&message)
        .map(|(field, valid)| suggestions::unknown_config_key(field, &valid));
    Error::Config { message, hint }
}

/// Split serde's "unknown field `name`, expected one of `a`, `b`" message
/// into the unknown name and the accepted ones.
fn unknown_field(message: &str) -> Option<(&str, Vec<&str>)> {
    let rest = message.split_once("unknown field `")?.1;
    let (field, rest) = rest.split_once('`')?;
    let expected = rest
        .split_once("expected")
        .map(|(_, list)| list)
        .unwrap_or_default();
    let valid = expected.split('`').skip(1).step_by(2).collect();
    Some((field, valid))
}

/// The contents of `gitclone.txt`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextConfig {
    pub repositories: Vec<String>,
}

impl TextConfig {
    pub fn parse(content: &str) -> Self {
        let repositories = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { repositories }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Ok(Self::parse(&content))
    }
}
