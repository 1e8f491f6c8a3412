// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all adapters implement.

use async_trait::async_trait;

use crate::error::QuireError;
use crate::types::HealthStatus;

/// The base trait for all Quire adapters.
///
/// Provides identity and a health check. Adapters are stateless handles
/// constructed per call site or per test and injected explicitly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, QuireError>;
}
