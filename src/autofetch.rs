//! # Repository Autofetch
//!
//! Expands the `autofetch` entries of `gitclone.yaml` into repository
//! specifications by listing an account's repositories on GitHub.
//!
//! Listing goes through the [`RepositoryLister`] trait so the expansion
//! logic can be tested without network access. [`GithubLister`] is the real
//! implementation on top of the GitHub REST API.

use log::{debug, info};
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;

use crate::config::{CloneMethod, Config, GithubAutofetch};
use crate::error::{Error, Result};

/// Public GitHub REST API endpoint.
pub const GITHUB_API: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// A repository returned by a lister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoListing {
    /// Login of the account the listing was made for, used for `{user}`.
    pub login: String,
    /// Short repository name, used for `{repo}`.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
}

/// Lists the repositories an autofetch entry refers to.
pub trait RepositoryLister {
    fn list(&self, github: &GithubAutofetch) -> Result<Vec<RepoListing>>;
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

/// Lists repositories through the GitHub REST API.
///
/// With a token the authenticated account's repositories are listed,
/// including private ones when `private` is set. Without a token the public
/// repositories of `user` are listed.
pub struct GithubLister {
    client: Client,
    api_base: String,
}

impl GithubLister {
    pub fn new() -> Result<Self> {
        Self::with_api_base(GITHUB_API)
    }

    /// Use another API endpoint, e.g. a GitHub Enterprise instance.
    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gitclone/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .header(ACCEPT, "application/vnd.github+json");
        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        user: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Autofetch {
                user: user.to_string(),
                message: format!("GitHub API returned {} for {}", status, response.url()),
            });
        }
        Ok(response.json::<T>()?)
    }
}

impl RepositoryLister for GithubLister {
    fn list(&self, github: &GithubAutofetch) -> Result<Vec<RepoListing>> {
        let token = github.token.as_deref();
        let (login, path, visibility) = match token {
            Some(_) => {
                let me: ApiUser = self.fetch(&github.user, self.get("/user", token))?;
                let visibility = if github.private { "all" } else { "public" };
                (me.login, "/user/repos".to_string(), Some(visibility))
            }
            None => (
                github.user.clone(),
                format!("/users/{}/repos", github.user),
                None,
            ),
        };

        let mut listings = Vec::new();
        for page in 1.. {
            let mut request = self
                .get(&path, token)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            if let Some(visibility) = visibility {
                request = request.query(&[("visibility", visibility)]);
            }
            let repos: Vec<ApiRepo> = self.fetch(&github.user, request)?;
            debug!("GitHub page {} for {}: {} repositories", page, login, repos.len());

            let last = repos.len() < PER_PAGE;
            listings.extend(repos.into_iter().map(|repo| RepoListing {
                login: login.clone(),
                name: repo.name,
                full_name: repo.full_name,
            }));
            if last {
                break;
            }
        }
        Ok(listings)
    }
}

/// Repository specification for one listed repository.
pub fn spec_for(github: &GithubAutofetch, listing: &RepoListing) -> String {
    let path = github
        .path
        .replace("{user}", &listing.login)
        .replace("{repo}", &listing.name);
    match github.method {
        CloneMethod::Ssh => format!("git@github.com:{}.git {}", listing.full_name, path),
        CloneMethod::Https => format!("https://github.com/{}.git {}", listing.full_name, path),
    }
}

/// Expand every autofetch entry of `config` into repository specifications.
///
/// When an entry has `includes`, only specifications matching at least one
/// of them at their start are kept.
pub fn expand(config: &Config, lister: &dyn RepositoryLister) -> Result<Vec<String>> {
    let mut specs = Vec::new();
    for github in config.autofetch.iter().filter_map(|entry| entry.github.as_ref()) {
        let includes = github
            .includes
            .iter()
            .map(|pattern| Regex::new(&format!("^(?:{})", pattern)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let listings = lister.list(github)?;
        let before = specs.len();
        specs.extend(
            listings
                .iter()
                .map(|listing| spec_for(github, listing))
                .filter(|spec| includes.is_empty() || includes.iter().any(|re| re.is_match(spec))),
        );
        info!(
            "Autofetch for {}: {} of {} repositories selected",
            github.user,
            specs.len() - before,
            listings.len()
        );
    }
    Ok(specs)
}
