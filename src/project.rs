use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// The owner/name pair identifying a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub repo: String,
}

impl FromStr for Repo {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InputError::MissingRepository);
        }
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(Repo {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(InputError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

pub fn resolve_repo(value: Option<&str>) -> Result<Repo, InputError> {
    value.ok_or(InputError::MissingRepository)?.parse()
}
