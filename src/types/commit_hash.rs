// ABOUTME: Validated git commit hash (full or abbreviated hex object name).
// ABOUTME: Normalised to lowercase so it can be used as an image tag and directory name.

use std::fmt;
use thiserror::Error;

const MIN_LEN: usize = 4;
const MAX_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitHashError {
    #[error("commit hash cannot be empty")]
    Empty,

    #[error("commit hash must be between 4 and 64 characters, got {0}")]
    BadLength(usize),

    #[error("commit hash must be hexadecimal, found '{0}'")]
    NotHex(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitHash(String);

impl CommitHash {
    pub fn new(value: &str) -> Result<Self, CommitHashError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CommitHashError::Empty);
        }
        if !(MIN_LEN..=MAX_LEN).contains(&value.len()) {
            return Err(CommitHashError::BadLength(value.len()));
        }
        if let Some(c) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(CommitHashError::NotHex(c));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a full SHA-1 or SHA-256 object name.
    pub fn is_full(&self) -> bool {
        self.0.len() == 40 || self.0.len() == 64
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CommitHash {
    type Err = CommitHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
