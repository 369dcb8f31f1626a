//! Environment Composer
//!
//! Turns a resolved [`ToolchainConfig`] into the ordered environment
//! overlay handed to the CMake invocation.

use std::fmt;
use tracing::debug;

use crate::registry::ToolchainConfig;

/// Overlay variables, in emission order
pub const OVERLAY_KEYS: [&str; 6] = ["CC", "CXX", "LD", "CFLAGS", "CXXFLAGS", "LDFLAGS"];

/// Ordered environment assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: Vec<(&'static str, String)>,
}

impl EnvOverlay {
    /// One assignment per set field; unset and empty fields are omitted
    pub fn compose(config: &ToolchainConfig) -> Self {
        let fields = [
            &config.cc,
            &config.cxx,
            &config.ld,
            &config.cflags,
            &config.cxxflags,
            &config.ldflags,
        ];

        let vars: Vec<(&'static str, String)> = OVERLAY_KEYS
            .iter()
            .zip(fields)
            .filter_map(|(key, value)| match value {
                Some(v) if !v.is_empty() => Some((*key, v.clone())),
                _ => None,
            })
            .collect();

        debug!("Composed overlay with {} assignments", vars.len());
        Self { vars }
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Value of `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `KEY="VALUE"` strings in order
    pub fn assignments(&self) -> Vec<String> {
        self.iter()
            .map(|(key, value)| format!("{}=\"{}\"", key, shell_escape(value)))
            .collect()
    }
}

impl fmt::Display for EnvOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.assignments().join(" "))
    }
}

/// Escape `value` for use inside double quotes
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quote a command word for a POSIX shell; plain words are left as they are
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ',' | '+' | '@' | '%'));
    if plain {
        word.to_string()
    } else {
        format!("\"{}\"", shell_escape(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let overlay = EnvOverlay::compose(&ToolchainConfig::default());
        assert!(overlay.is_empty());
        assert!(overlay.assignments().is_empty());
        assert_eq!(overlay.to_string(), "");
    }

    #[test]
    fn test_single_field() {
        let config = ToolchainConfig {
            cflags: Some("-O2".to_string()),
            ..Default::default()
        };
        let overlay = EnvOverlay::compose(&config);

        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.get("CFLAGS"), Some("-O2"));
        for key in ["CC", "CXX", "LD", "CXXFLAGS", "LDFLAGS"] {
            assert_eq!(overlay.get(key), None);
        }
        assert_eq!(overlay.assignments(), vec!["CFLAGS=\"-O2\"".to_string()]);
    }

    #[test]
    fn test_fixed_order() {
        let config = ToolchainConfig {
            ldflags: Some("-static".to_string()),
            cc: Some("gcc -m64".to_string()),
            cxxflags: Some("-m64".to_string()),
            ld: Some("ld".to_string()),
            ..Default::default()
        };
        let overlay = EnvOverlay::compose(&config);

        let keys: Vec<&str> = overlay.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["CC", "LD", "CXXFLAGS", "LDFLAGS"]);
        assert_eq!(
            overlay.to_string(),
            "CC=\"gcc -m64\" LD=\"ld\" CXXFLAGS=\"-m64\" LDFLAGS=\"-static\""
        );
    }

    #[test]
    fn test_empty_string_is_omitted() {
        let config = ToolchainConfig {
            cc: Some(String::new()),
            cxx: Some("g++".to_string()),
            ..Default::default()
        };
        let overlay = EnvOverlay::compose(&config);
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.get("CC"), None);
    }

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("a\"b$c"), "a\\\"b\\$c");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("--config"), "--config");
        assert_eq!(shell_quote("-DVCPKG_TARGET_TRIPLET=x64-linux"), "-DVCPKG_TARGET_TRIPLET=x64-linux");
        assert_eq!(shell_quote("/home/me/my src"), "\"/home/me/my src\"");
        assert_eq!(shell_quote("a$b\"c"), "\"a\\$b\\\"c\"");
        assert_eq!(shell_quote(""), "\"\"");
    }
}
