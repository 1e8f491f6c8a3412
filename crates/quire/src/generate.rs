// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quire generate` command implementation.

use futures::StreamExt;
use quire_config::QuireConfig;
use quire_core::{Fragment, QuireError};
use quire_journal::JournalSession;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::provider;

fn stdout_error(e: std::io::Error) -> QuireError {
    QuireError::Internal(format!("failed to write to stdout: {e}"))
}

pub async fn run(config: &QuireConfig, fragments: &[Fragment], structured: bool) -> Result<(), QuireError> {
    let session = JournalSession::from_config(provider::build(&config.provider)?, config);

    if structured {
        let output = session.generate_journal(fragments).await?;
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| QuireError::Internal(format!("failed to encode journal entry: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    let mut stream = session.stream_journal(fragments).await?;
    let mut stdout = tokio::io::stdout();
    let mut chunks = 0usize;

    // Text already written stays on screen if the stream fails midway.
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                stdout.write_all(chunk.as_bytes()).await.map_err(stdout_error)?;
                stdout.flush().await.map_err(stdout_error)?;
                chunks += 1;
            }
            Err(e) => {
                stdout.write_all(b"\n").await.map_err(stdout_error)?;
                return Err(e);
            }
        }
    }
    stdout.write_all(b"\n").await.map_err(stdout_error)?;
    stdout.flush().await.map_err(stdout_error)?;

    info!(chunks, "journal streamed");
    Ok(())
}
