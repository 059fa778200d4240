//! Services that can host an identity proof.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::CoreError;

/// How a proof message must appear in fetched content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// The armored block must appear line by line; surrounding whitespace on
    /// each line is ignored.
    Armored,
    /// All whitespace is removed from both sides before matching. Used where
    /// the host reflows text.
    Collapsed,
}

/// A closed set of supported services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Github,
    Twitter,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Github, Service::Twitter];

    pub fn tag(&self) -> &'static str {
        match self {
            Service::Github => "github",
            Service::Twitter => "twitter",
        }
    }

    /// Proof URL template; `{name}` is the account and `{id}` the post id.
    pub fn url_template(&self) -> &'static str {
        match self {
            Service::Github => "https://gist.github.com/{name}/{id}",
            Service::Twitter => "https://twitter.com/{name}/status/{id}",
        }
    }

    pub fn content_rule(&self) -> ContentRule {
        match self {
            Service::Github => ContentRule::Armored,
            Service::Twitter => ContentRule::Collapsed,
        }
    }

    /// Check that `url` is a proof location for account `name`.
    pub fn check_url(&self, name: &str, url: &Url) -> Result<(), CoreError> {
        let invalid = || CoreError::InvalidUser(format!("invalid {} proof url: {}", self, url));

        if url.scheme() != "https" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid());
        }
        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(invalid)?
            .collect();

        let ok = match self {
            Service::Github => {
                url.host_str() == Some("gist.github.com")
                    && matches!(segments.as_slice(), [n, id] if *n == name && !id.is_empty())
            }
            Service::Twitter => {
                url.host_str() == Some("twitter.com")
                    && matches!(
                        segments.as_slice(),
                        [n, "status", id] if *n == name && !id.is_empty()
                    )
            }
        };
        if ok {
            Ok(())
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Service {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .into_iter()
            .find(|svc| svc.tag() == s)
            .ok_or_else(|| CoreError::InvalidUser(format!("unknown service: {}", s)))
    }
}
