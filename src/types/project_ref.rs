// ABOUTME: Validated project reference such as github.com/owner/name.
// ABOUTME: Used as workspace path prefix and (lowercased) as image repository prefix.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectRefError {
    #[error("project reference cannot be empty")]
    Empty,

    #[error("project reference has an empty path segment: {0}")]
    EmptySegment(String),

    #[error("project reference segment '{0}' is not allowed")]
    ReservedSegment(String),

    #[error("invalid character in project reference: '{0}'")]
    InvalidChar(char),
}

/// A stable key identifying a source repository, e.g. `github.com/acme/app`.
///
/// The value must be safe to join onto a filesystem path and must not contain
/// the image tag separator `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef(String);

impl ProjectRef {
    pub fn new(value: &str) -> Result<Self, ProjectRefError> {
        let value = value.trim().trim_matches('/');
        if value.is_empty() {
            return Err(ProjectRefError::Empty);
        }

        for segment in value.split('/') {
            if segment.is_empty() {
                return Err(ProjectRefError::EmptySegment(value.to_string()));
            }
            if segment == "." || segment == ".." {
                return Err(ProjectRefError::ReservedSegment(segment.to_string()));
            }
            if let Some(c) = segment
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
            {
                return Err(ProjectRefError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host part (first segment), e.g. `github.com`.
    pub fn host(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// Everything after the host, e.g. `acme/app`.
    pub fn path(&self) -> &str {
        self.0.split_once('/').map(|(_, rest)| rest).unwrap_or_default()
    }

    /// Image repository name for this project. Engines only accept lowercase
    /// repository names, while source hosts treat owner/name case-insensitively.
    pub fn image_repository(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Image-name prefix shared by every build of this project.
    pub fn image_prefix(&self) -> String {
        format!("{}:", self.image_repository())
    }

    /// Relative path of this project below the storage root.
    pub fn relative_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProjectRef {
    type Err = ProjectRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
