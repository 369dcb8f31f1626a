//! Architecture normalization
//!
//! Maps the raw architecture token of a triplet to the identifier used by the
//! toolchain tables and by CMake's architecture selection.

use std::fmt;

use crate::triplet::{Triplet, NEON};

/// Canonical architecture identifier (`armneon`, `Win32`, `x86_64`, `64`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalArch(String);

impl CanonicalArch {
    /// Normalize an (arch, os, modifier) combination. Total: unknown
    /// combinations keep the architecture token unchanged.
    pub fn normalize(arch: &str, os: &str, abi_modifier: Option<&str>) -> Self {
        let canonical = match (arch, os, abi_modifier) {
            ("arm", _, Some(NEON)) => "armneon",
            ("x86", "windows", _) => "Win32",
            ("x64", "osx", _) => "x86_64",
            ("x64", "linux", _) => "64",
            ("x86", "linux", _) => "32",
            (other, _, _) => other,
        };
        Self(canonical.to_string())
    }

    /// Normalize a parsed triplet
    pub fn of(triplet: &Triplet) -> Self {
        Self::normalize(&triplet.arch, &triplet.os, triplet.abi_modifier.as_deref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
