// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Journal generation for Quire.
//!
//! [`JournalSession`] pairs one provider with one prompt builder and
//! serializes calls made through it.

pub mod session;

pub use session::{collect_stream, Collected, JournalSession};
