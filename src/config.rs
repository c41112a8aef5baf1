//! Optional JSON configuration for the synthesizer.
//!
//! ```json
//! { "base_contract": "Kake.Module", "entry_routine": "Configure", "runtime_library": "Kake" }
//! ```
//! Missing keys fall back to the defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::processor::SynthesisOptions;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub base_contract: String,
    pub entry_routine: String,
    pub runtime_library: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = SynthesisOptions::default();
        Self {
            base_contract: options.base_contract,
            entry_routine: options.entry_routine,
            runtime_library: options.runtime_library,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Parsing configuration JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Loading {}", path.display()))
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            base_contract: self.base_contract.clone(),
            entry_routine: self.entry_routine.clone(),
            runtime_library: self.runtime_library.clone(),
        }
    }
}
