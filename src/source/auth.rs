// ABOUTME: Clone credentials and clone-target resolution for supported source hosts.
// ABOUTME: Picks exactly one auth style (basic, token, inline URL, anonymous) per fetch.

use crate::types::ProjectRef;
use std::fmt;

use super::FetchError;

/// Username sent with token authentication; hosts only look at the password.
pub const TOKEN_USERNAME: &str = "access";

const GITHUB_HOST: &str = "github.com";

/// Credentials supplied with a deployment request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Token(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// HTTP basic credentials handed to the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Where and how to clone one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneTarget {
    pub url: String,
    pub auth: Option<BasicAuth>,
}

impl CloneTarget {
    /// Resolve the clone URL and auth for a project.
    ///
    /// Precedence: basic credentials with a password, then a token, then a
    /// username-only inline URL, then anonymous access.
    pub fn resolve(
        project: &ProjectRef,
        credentials: Option<&Credentials>,
    ) -> Result<Self, FetchError> {
        if project.host() != GITHUB_HOST || project.path().is_empty() {
            return Err(FetchError::UnsupportedHost {
                project: project.to_string(),
            });
        }

        let plain_url = format!("https://{}.git", project);

        let target = match credentials {
            Some(Credentials::Basic { username, password }) if !password.is_empty() => Self {
                url: plain_url,
                auth: Some(BasicAuth {
                    username: username.clone(),
                    password: password.clone(),
                }),
            },
            Some(Credentials::Token(token)) => Self {
                url: plain_url,
                auth: Some(BasicAuth {
                    username: TOKEN_USERNAME.to_string(),
                    password: token.clone(),
                }),
            },
            Some(Credentials::Basic { username, .. }) if !username.is_empty() => Self {
                url: format!(
                    "https://{}:@{}.git",
                    urlencoding::encode(username),
                    project
                ),
                auth: None,
            },
            _ => Self {
                url: plain_url,
                auth: None,
            },
        };

        Ok(target)
    }
}
