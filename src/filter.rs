// View filter for the todo list

use eyre::{Result, eyre};
use std::str::FromStr;

/// Which subset of todos the filtered view exposes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Active => "active",
            FilterMode::Completed => "completed",
        }
    }

    /// Whether an item with the given completion flag belongs in this view
    pub fn matches(self, completed: bool) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !completed,
            FilterMode::Completed => completed,
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(FilterMode::All),
            "active" => Ok(FilterMode::Active),
            "completed" => Ok(FilterMode::Completed),
            other => Err(eyre!(
                "Invalid filter: {} (expected all, active or completed)",
                other
            )),
        }
    }
}
