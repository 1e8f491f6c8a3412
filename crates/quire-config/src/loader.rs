// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later layers override earlier ones:
//! 1. compiled defaults
//! 2. `/etc/quire/quire.toml`
//! 3. `$XDG_CONFIG_HOME/quire/quire.toml`
//! 4. `./quire.toml`
//! 5. `QUIRE_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::QuireConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/quire/quire.toml";
pub(crate) const LOCAL_CONFIG: &str = "quire.toml";

/// Sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &["journal", "provider", "memory"];

/// Path of the per-user config file, if a config directory is known.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("quire").join(LOCAL_CONFIG))
}

/// Builds the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(QuireConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(LOCAL_CONFIG)).merge(env_provider())
}

/// Loads configuration from the standard hierarchy plus env overrides.
pub fn load_config() -> Result<QuireConfig, figment::Error> {
    build_figment().extract()
}

/// Loads configuration from an inline TOML string over the defaults.
/// No files and no environment variables are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<QuireConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuireConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads one explicit file over the defaults, with env overrides on top.
pub fn load_config_from_path(path: &Path) -> Result<QuireConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuireConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `QUIRE_<SECTION>_<KEY>` maps to `<section>.<key>`.
///
/// Only the first underscore after a known section is turned into a dot, so
/// `QUIRE_PROVIDER_API_KEY` lands on `provider.api_key`.
fn env_provider() -> Env {
    Env::prefixed("QUIRE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("provider_api_key"), "provider.api_key");
        assert_eq!(map_env_key("journal_log_level"), "journal.log_level");
        assert_eq!(
            map_env_key("memory_episodic_similarity_threshold"),
            "memory.episodic_similarity_threshold"
        );
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG,
                r#"
[provider]
kind = "deepseek"
max_tokens = 512
"#,
            )?;
            jail.set_env("QUIRE_PROVIDER_MAX_TOKENS", "4096");
            jail.set_env("QUIRE_MEMORY_ENABLED", "false");

            let config = load_config()?;
            assert_eq!(config.provider.kind, quire_core::ProviderKind::DeepSeek);
            assert_eq!(config.provider.max_tokens, 4096);
            assert!(!config.memory.enabled);
            Ok(())
        });
    }
}
