use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction in which successive ranks are placed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    #[serde(rename = "LR", alias = "left-to-right")]
    LeftToRight,
    #[serde(rename = "TB", alias = "top-to-bottom")]
    TopToBottom,
}

impl RankDir {
    pub fn is_horizontal(self) -> bool {
        self == RankDir::LeftToRight
    }
}

impl fmt::Display for RankDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankDir::LeftToRight => f.write_str("LR"),
            RankDir::TopToBottom => f.write_str("TB"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown rank direction {0:?}, expected LR or TB")]
pub struct ParseRankDirError(pub String);

impl FromStr for RankDir {
    type Err = ParseRankDirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lr" | "left-to-right" => Ok(RankDir::LeftToRight),
            "tb" | "top-to-bottom" => Ok(RankDir::TopToBottom),
            _ => Err(ParseRankDirError(s.to_string())),
        }
    }
}
