// ABOUTME: Image tag for one project commit, formatted as <project>:<commit>.
// ABOUTME: The same commit always maps to the same tag, so rebuilds overwrite it.

use super::{CommitHash, ProjectRef};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageTag {
    repository: String,
    commit: CommitHash,
}

impl ImageTag {
    pub fn new(project: &ProjectRef, commit: &CommitHash) -> Self {
        Self {
            repository: project.image_repository(),
            commit: commit.clone(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn commit(&self) -> &CommitHash {
        &self.commit
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.commit)
    }
}
