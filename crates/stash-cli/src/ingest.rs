//! Secret ingestion boundary: gather secret bytes from stdin or an inline
//! argument.
//!
//! Guarantees, on every exit path including errors and cancellation:
//! - the byte ceiling ([`MAX_SECRET_LEN`]) aborts the moment it is exceeded,
//!   not after full accumulation;
//! - the idle timeout resets on every chunk, so a slow-but-alive pipe is not
//!   unfairly killed;
//! - every intermediate chunk and the accumulator are zeroed before their
//!   memory is released.

use std::io::IsTerminal;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use zeroize::{Zeroize, Zeroizing};

use common::protocol::MAX_SECRET_LEN;
use common::StashError;

/// Where the secret bytes come from.
pub enum SecretSource {
    /// Passed inline on the command line.
    Inline(String),
    /// Piped through standard input.
    Stdin,
}

/// Read the secret from `source`, enforcing the ingestion rules.
///
/// # Errors
///
/// [`StashError::Input`] for an interactive terminal, empty or
/// whitespace-only input, the byte ceiling, or an idle pipe;
/// [`StashError::Cancelled`] when `cancel` fires mid-read.
pub async fn read_secret(
    source: SecretSource,
    idle_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Zeroizing<Vec<u8>>, StashError> {
    match source {
        SecretSource::Inline(text) => {
            let text = Zeroizing::new(text);
            finalise(Zeroizing::new(text.as_bytes().to_vec()))
        }
        SecretSource::Stdin => {
            if std::io::stdin().is_terminal() {
                return Err(StashError::Input(
                    "no secret piped to stdin; pass one as an argument or pipe it in".into(),
                ));
            }
            read_from(tokio::io::stdin(), idle_timeout, cancel).await
        }
    }
}

/// Chunked read loop, generic over the reader so tests can drive it.
async fn read_from<R: AsyncRead + Unpin>(
    mut reader: R,
    idle_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Zeroizing<Vec<u8>>, StashError> {
    let mut buffer = Zeroizing::new(Vec::with_capacity(1024));
    let mut chunk = [0u8; 1024];

    loop {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                chunk.zeroize();
                return Err(StashError::Cancelled);
            }
            outcome = tokio::time::timeout(idle_timeout, reader.read(&mut chunk)) => outcome,
        };

        let n = match outcome {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                chunk.zeroize();
                return Err(StashError::Input(format!("failed to read stdin: {e}")));
            }
            Err(_elapsed) => {
                chunk.zeroize();
                return Err(StashError::Input(format!(
                    "stdin produced no data for {}s",
                    idle_timeout.as_secs()
                )));
            }
        };
        if n == 0 {
            break;
        }

        buffer.extend_from_slice(&chunk[..n]);
        chunk[..n].zeroize();

        if buffer.len() > MAX_SECRET_LEN {
            return Err(StashError::Input(format!(
                "secret exceeds the {MAX_SECRET_LEN}-byte limit"
            )));
        }
    }

    chunk.zeroize();
    finalise(buffer)
}

/// Final checks shared by both sources; strips exactly one trailing newline
/// (an artefact of `echo` and heredocs, not part of the secret).
fn finalise(mut buffer: Zeroizing<Vec<u8>>) -> Result<Zeroizing<Vec<u8>>, StashError> {
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    }
    if buffer.is_empty() {
        return Err(StashError::Input("secret is empty".into()));
    }
    if buffer.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(StashError::Input("secret is whitespace only".into()));
    }
    if buffer.len() > MAX_SECRET_LEN {
        return Err(StashError::Input(format!(
            "secret exceeds the {MAX_SECRET_LEN}-byte limit"
        )));
    }
    Ok(buffer)
}
