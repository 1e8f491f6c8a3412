// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quire doctor` command implementation.
//!
//! Configuration has already been validated by the time this runs; the
//! checks here cover credentials, endpoint and provider connectivity.

use std::time::{Duration, Instant};

use quire_config::{ProviderConfig, QuireConfig};
use quire_core::{CompletionProvider, PluginAdapter, QuireError};

use crate::provider;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn timed(name: &'static str, started: Instant, outcome: Result<String, String>) -> Self {
        let (status, message) = match outcome {
            Ok(message) => (CheckStatus::Pass, message),
            Err(message) => (CheckStatus::Fail, message),
        };
        Self {
            name,
            status,
            message,
            duration: started.elapsed(),
        }
    }
}

pub async fn run(config: &QuireConfig) -> Result<(), QuireError> {
    let results = checks(&config.provider, provider::build).await;

    println!();
    println!("  quire doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Fail => "[FAIL]",
        };
        println!(
            "    {tag} {:<14} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }
    println!();

    let failed = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
    if failed > 0 {
        return Err(QuireError::Internal(format!("{failed} check(s) failed")));
    }
    Ok(())
}

/// Runs the checks in order; connectivity is skipped once the provider
/// cannot be built.
async fn checks<F>(config: &ProviderConfig, build: F) -> Vec<CheckResult>
where
    F: FnOnce(&ProviderConfig) -> Result<std::sync::Arc<dyn CompletionProvider>, QuireError>,
{
    let mut results = vec![CheckResult {
        name: "config",
        status: CheckStatus::Pass,
        message: format!("provider `{}`", config.kind),
        duration: Duration::ZERO,
    }];

    let started = Instant::now();
    let key = config
        .resolve_api_key()
        .map(|_| "API key present".to_string())
        .map_err(|e| e.to_string());
    results.push(CheckResult::timed("credentials", started, key));

    let started = Instant::now();
    let endpoint = config
        .kind
        .resolve_base_url(config.endpoint.as_deref())
        .map_err(|e| e.to_string());
    results.push(CheckResult::timed("endpoint", started, endpoint));

    let started = Instant::now();
    let provider = match build(config) {
        Ok(provider) => provider,
        Err(e) => {
            results.push(CheckResult::timed("connectivity", started, Err(format!("skipped: {e}"))));
            return results;
        }
    };

    let outcome = match provider.probe().await {
        Ok(true) => Ok(format!("{} accepted the credentials", provider.name())),
        Ok(false) => Err(format!("{} rejected the credentials", provider.name())),
        Err(e) => Err(e.to_string()),
    };
    results.push(CheckResult::timed("connectivity", started, outcome));
    results
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_core::ProviderKind;
    use quire_test_utils::MockProvider;

    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            kind: ProviderKind::OpenAi,
            api_key: Some("k".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn all_checks_pass_with_accepting_provider() {
        let provider: Arc<dyn CompletionProvider> = Arc::new(MockProvider::new());
        let results = checks(&config(), move |_| Ok(provider)).await;
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.status == CheckStatus::Pass));
    }

    #[tokio::test]
    async fn rejected_credentials_fail_connectivity() {
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(MockProvider::new().rejecting_credentials());
        let results = checks(&config(), move |_| Ok(provider)).await;
        assert_eq!(results[3].name, "connectivity");
        assert_eq!(results[3].status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn build_failure_skips_probe() {
        let results = checks(&config(), |_| {
            Err(QuireError::InvalidEndpoint {
                endpoint: "x".into(),
                reason: "not absolute".into(),
            })
        })
        .await;
        assert_eq!(results.len(), 4);
        assert!(results[3].message.starts_with("skipped"));
    }
}
