//! Valve-related type definitions
//!
//! Supporting types shared between the valve, its configuration and the bus.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Routing mode of a merge valve
///
/// Exactly one mode is active at any time. `Merged` is the default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValveMode {
    /// Both inputs feed the combine pipeline; the merge observer receives results
    #[default]
    Merged,
    /// Each input is routed independently to its own observer
    Passthrough,
}

impl std::fmt::Display for ValveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValveMode::Merged => write!(f, "merged"),
            ValveMode::Passthrough => write!(f, "passthrough"),
        }
    }
}

impl FromStr for ValveMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merged" | "merge" => Ok(ValveMode::Merged),
            "passthrough" | "passthru" => Ok(ValveMode::Passthrough),
            other => Err(Error::InvalidInput(format!("unknown valve mode '{}'", other))),
        }
    }
}

/// Logical input side of a valve
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InputSide {
    /// The primary (first) input
    Primary,
    /// The secondary (second) input
    Secondary,
}

impl InputSide {
    /// Get the opposite side
    pub fn other(&self) -> Self {
        match self {
            InputSide::Primary => InputSide::Secondary,
            InputSide::Secondary => InputSide::Primary,
        }
    }
}

impl std::fmt::Display for InputSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSide::Primary => write!(f, "primary"),
            InputSide::Secondary => write!(f, "secondary"),
        }
    }
}

impl FromStr for InputSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(InputSide::Primary),
            "secondary" => Ok(InputSide::Secondary),
            other => Err(Error::InvalidInput(format!("unknown input side '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valve_mode_default_is_merged() {
        assert_eq!(ValveMode::default(), ValveMode::Merged);
    }

    #[test]
    fn test_valve_mode_parse_accepts_aliases() {
        assert_eq!("merged".parse::<ValveMode>().unwrap(), ValveMode::Merged);
        assert_eq!("Passthru".parse::<ValveMode>().unwrap(), ValveMode::Passthrough);
        assert!("sideways".parse::<ValveMode>().is_err());
    }

    #[test]
    fn test_valve_mode_serializes_lowercase() {
        let json = serde_json::to_string(&ValveMode::Passthrough).unwrap();
        assert_eq!(json, "\"passthrough\"");
    }

    #[test]
    fn test_input_side_other() {
        assert_eq!(InputSide::Primary.other(), InputSide::Secondary);
        assert_eq!(InputSide::Secondary.other(), InputSide::Primary);
        assert_eq!(InputSide::Primary.to_string(), "primary");
    }
}
