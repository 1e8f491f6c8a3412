// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Quire journaling pipeline.
//!
//! TOML files are merged with Figment, validated strictly
//! (`deny_unknown_fields` plus semantic checks) and reported through miette
//! with typo suggestions.
//!
//! ```no_run
//! use quire_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("provider: {}", config.provider.kind);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{JournalConfig, MemoryConfig, ProviderConfig, QuireConfig};

/// Loads the layered configuration and validates it.
pub fn load_and_validate() -> Result<QuireConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Loads and validates an inline TOML document over the defaults.
pub fn load_and_validate_str(toml_content: &str) -> Result<QuireConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Loads and validates one explicit config file.
pub fn load_and_validate_path(path: &Path) -> Result<QuireConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

#[allow(clippy::result_large_err)]
fn finish<F>(
    loaded: Result<QuireConfig, figment::Error>,
    sources: F,
) -> Result<QuireConfig, Vec<ConfigError>>
where
    F: FnOnce() -> Vec<(String, String)>,
{
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(provider = %config.provider.kind, "configuration loaded");
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads the TOML files of the hierarchy that exist, for span lookup.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join(loader::LOCAL_CONFIG))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG.into());

    [Some(local), loader::user_config_path(), Some(loader::SYSTEM_CONFIG.into())]
        .into_iter()
        .flatten()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
