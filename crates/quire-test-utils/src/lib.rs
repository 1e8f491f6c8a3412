// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Quire integration tests.
//!
//! Provides [`MockProvider`], a scripted completion provider for fast,
//! deterministic tests without network access, and [`DripServer`], a
//! one-shot HTTP server that writes a chunked body slowly.

pub mod drip_server;
pub mod mock_provider;

pub use drip_server::DripServer;
pub use mock_provider::{MockProvider, Reply};
