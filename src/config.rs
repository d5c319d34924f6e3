use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What `cycle` does when it fetches a word that decodes to no instruction
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownOpcodePolicy {
    /// Return `Error::UnknownOpcode` and leave the PC on the bad instruction
    Halt,
    /// Log a warning and step over it
    Skip,
}

impl Default for UnknownOpcodePolicy {
    fn default() -> Self {
        UnknownOpcodePolicy::Halt
    }
}

/// Points where historical interpreters disagree
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Quirks {
    /// 8XY1, 8XY2 and 8XY3 reset VF to 0
    pub logic_resets_vf: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            logic_resets_vf: true,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quirks: Quirks,
    pub unknown_opcode: UnknownOpcodePolicy,
    /// Seed for CXNN. Seeded from the OS when absent
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Parse a JSON config. Missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Config> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn permissive(mut self) -> Self {
        self.unknown_opcode = UnknownOpcodePolicy::Skip;
        self
    }
}
