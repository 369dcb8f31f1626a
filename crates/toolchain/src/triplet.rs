//! Triplet Parser
//!
//! Splits a platform descriptor such as `arm-neon-linux-static` into its
//! architecture, OS and modifier segments.

use std::fmt;
use tracing::debug;

/// OS assumed when the descriptor has no OS segment
pub const DEFAULT_OS: &str = "linux";

/// ABI modifier selecting NEON on 32-bit ARM
pub const NEON: &str = "neon";

/// Target operating system of a triplet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetOs {
    Linux,
    Android,
    Windows,
    Osx,
    Other(String),
}

impl TargetOs {
    /// Parse from the OS token of a triplet
    pub fn from_token(token: &str) -> Self {
        match token {
            "linux" => TargetOs::Linux,
            "android" => TargetOs::Android,
            "windows" => TargetOs::Windows,
            "osx" => TargetOs::Osx,
            other => TargetOs::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Android => "android",
            TargetOs::Windows => "windows",
            TargetOs::Osx => "osx",
            TargetOs::Other(s) => s,
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed platform descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet {
    /// The descriptor as given
    pub raw: String,
    /// Architecture token (always the first segment)
    pub arch: String,
    /// OS token, `linux` when absent
    pub os: String,
    /// `neon` for the `<arch>-neon-<os>` form, otherwise the variant
    pub abi_modifier: Option<String>,
    /// Opaque segment after the OS (e.g. `static`)
    pub variant: Option<String>,
}

impl Triplet {
    /// Parse a descriptor. Never fails: missing segments take defaults.
    pub fn parse(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split('-').collect();
        let arch = tokens[0].to_string();

        let (os, os_index, neon) = if tokens.len() >= 3 && tokens[1] == NEON {
            (tokens[2], Some(2), true)
        } else if tokens.len() >= 2 {
            (tokens[1], Some(1), false)
        } else {
            (DEFAULT_OS, None, false)
        };

        let variant = os_index
            .and_then(|i| tokens.get(i + 1..))
            .filter(|rest| !rest.is_empty())
            .map(|rest| rest.join("-"));

        let abi_modifier = if neon {
            Some(NEON.to_string())
        } else {
            variant.clone()
        };

        let triplet = Self {
            raw: raw.to_string(),
            arch,
            os: os.to_string(),
            abi_modifier,
            variant,
        };
        debug!("Parsed triplet {:?}", triplet);
        triplet
    }

    /// Target OS of this triplet
    pub fn target_os(&self) -> TargetOs {
        TargetOs::from_token(&self.os)
    }

    pub fn is_android(&self) -> bool {
        self.target_os() == TargetOs::Android
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
