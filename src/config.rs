//! Battle scan limits, loadable from a TOML file.
//!
//! ```toml
//! max_round = 15
//! max_stack = 5
//! lookahead = 8
//! min_marker_gap = 4
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Highest round number a phase marker may carry
    #[serde(default = "default_max_round")]
    pub max_round: u8,
    /// Highest stack index accepted as actor or target
    #[serde(default = "default_max_stack")]
    pub max_stack: u8,
    /// Bytes searched after a phase marker for position and damage
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
    /// Minimum distance between accepted phase markers
    #[serde(default = "default_min_marker_gap")]
    pub min_marker_gap: usize,
}

fn default_max_round() -> u8 {
    15
}
fn default_max_stack() -> u8 {
    5
}
fn default_lookahead() -> usize {
    8
}
fn default_min_marker_gap() -> usize {
    4
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            max_round: default_max_round(),
            max_stack: default_max_stack(),
            lookahead: default_lookahead(),
            min_marker_gap: default_min_marker_gap(),
        }
    }
}

impl ScanConfig {
    pub fn from_toml_str(text: &str) -> Result<ScanConfig> {
        let config: ScanConfig =
            toml::from_str(text).map_err(|e| StarsError::Config(e.to_string()))?;
        if config.min_marker_gap == 0 {
            return Err(StarsError::Config("min_marker_gap must be at least 1".to_string()));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<ScanConfig> {
        debug!("Loading scan configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .map_err(|e| StarsError::Config(format!("{}: {}", path.display(), e)))?;
        ScanConfig::from_toml_str(&text)
    }

    pub fn is_round(&self, byte: u8) -> bool {
        byte <= self.max_round
    }

    pub fn is_stack(&self, byte: u8) -> bool {
        byte <= self.max_stack
    }
}
