use std::fmt;

use serde_derive::Deserialize;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunnerStatus {
    Online,
    Offline,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunnerStatus::Online => "online",
            RunnerStatus::Offline => "offline",
            RunnerStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Label {
    pub name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Runner {
    pub id: u64,
    pub name: String,
    pub status: RunnerStatus,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub busy: bool,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Deserialize, Debug)]
pub struct RunnerPage {
    pub runners: Vec<Runner>,
}

impl Runner {
    pub fn is_dummy(&self, dummy_runner: Option<&str>) -> bool {
        dummy_runner.map_or(false, |dummy| self.name == dummy)
    }

    /// Online runners and the dummy runner are kept. Everything else,
    /// including runners in an unknown state, is removed.
    pub fn should_delete(&self, dummy_runner: Option<&str>) -> bool {
        self.status != RunnerStatus::Online && !self.is_dummy(dummy_runner)
    }
}

#[cfg(test)]
pub(crate) fn runner(id: u64, status: RunnerStatus, name: &str) -> Runner {
    Runner {
        id,
        name: name.to_string(),
        status,
        os: Some("Linux".to_string()),
        busy: false,
        labels: Vec::new(),
    }
}
