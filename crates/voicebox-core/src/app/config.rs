//! Cache configuration loaded from environment variables.
//!
//! A `.env` file next to the working directory is honoured via `dotenvy`.

use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::{CacheError, Result};

pub const DEFAULT_MAX_CACHE_SIZE: usize = 10;
pub const DEFAULT_STORE_ROOT: &str = "uploads";
pub const DEFAULT_EXTENSION: &str = "mp3";

/// `MAX_NAME_LEN` の名前でも一時ファイル名が 255 バイトに収まる長さ
pub const MAX_EXTENSION_LEN: usize = 16;

/// 書き込み中の一時ファイルに使う拡張子
const TEMP_EXTENSION: &str = "part";

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of resident artifacts (`VOICEBOX_MAX_CACHE_SIZE`)
    pub max_cache_size: usize,

    /// Store directory (`VOICEBOX_STORE_ROOT`)
    pub store_root: PathBuf,

    /// Artifact file extension, without the dot (`VOICEBOX_EXTENSION`)
    pub extension: String,

    /// Rebuild the index from a directory scan at startup (`VOICEBOX_RECONCILE`)
    pub reconcile_on_start: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            store_root: PathBuf::from(DEFAULT_STORE_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            reconcile_on_start: false,
        }
    }
}

impl CacheConfig {
    /// Load configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            max_cache_size: parse_var(&lookup, "VOICEBOX_MAX_CACHE_SIZE")?
                .unwrap_or(defaults.max_cache_size),
            store_root: lookup("VOICEBOX_STORE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_root),
            extension: lookup("VOICEBOX_EXTENSION").unwrap_or(defaults.extension),
            reconcile_on_start: parse_bool(&lookup, "VOICEBOX_RECONCILE")?
                .unwrap_or(defaults.reconcile_on_start),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cache_size == 0 {
            return Err(CacheError::Config(
                "VOICEBOX_MAX_CACHE_SIZE must be at least 1".into(),
            ));
        }
        let ext = self.extension.as_str();
        if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN || ext.contains(['.', '/', '\\']) {
            return Err(CacheError::Config(format!(
                "VOICEBOX_EXTENSION {ext:?} must be a bare extension of at most \
                 {MAX_EXTENSION_LEN} bytes such as \"mp3\""
            )));
        }
        if ext.eq_ignore_ascii_case(TEMP_EXTENSION) {
            return Err(CacheError::Config(format!(
                "VOICEBOX_EXTENSION {ext:?} is reserved for temporary files"
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CacheError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(None),
        Some("1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some("0" | "false" | "no" | "off") => Ok(Some(false)),
        Some(other) => Err(CacheError::Config(format!(
            "{key}={other:?}: expected true/false"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = CacheConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.max_cache_size, 10);
        assert_eq!(config.store_root, PathBuf::from("uploads"));
    }

    #[test]
    fn reads_all_variables() {
        let config = CacheConfig::from_lookup(lookup(&[
            ("VOICEBOX_MAX_CACHE_SIZE", " 3 "),
            ("VOICEBOX_STORE_ROOT", "/var/voicebox"),
            ("VOICEBOX_EXTENSION", "ogg"),
            ("VOICEBOX_RECONCILE", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.max_cache_size, 3);
        assert_eq!(config.store_root, PathBuf::from("/var/voicebox"));
        assert_eq!(config.extension, "ogg");
        assert!(config.reconcile_on_start);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = CacheConfig::from_lookup(lookup(&[("VOICEBOX_MAX_CACHE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn garbage_values_are_rejected() {
        assert!(CacheConfig::from_lookup(lookup(&[("VOICEBOX_MAX_CACHE_SIZE", "ten")])).is_err());
        assert!(CacheConfig::from_lookup(lookup(&[("VOICEBOX_RECONCILE", "maybe")])).is_err());
        assert!(CacheConfig::from_lookup(lookup(&[("VOICEBOX_EXTENSION", ".mp3")])).is_err());
    }

    #[rstest]
    #[case::temp_suffix("part")]
    #[case::temp_suffix_upper("PART")]
    #[case::too_long("abcdefghijklmnopq")]
    fn unusable_extensions_are_rejected(#[case] ext: &str) {
        let err = CacheConfig::from_lookup(lookup(&[("VOICEBOX_EXTENSION", ext)])).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn longest_extension_is_accepted() {
        let ext = "a".repeat(MAX_EXTENSION_LEN);
        let config = CacheConfig::from_lookup(lookup(&[("VOICEBOX_EXTENSION", ext.as_str())])).unwrap();
        assert_eq!(config.extension, ext);
    }
}
