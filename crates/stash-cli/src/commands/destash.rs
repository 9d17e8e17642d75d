//! `stash destash` — claim a secret: fetch, decrypt, print. Works once.

use std::io::{IsTerminal, Write};

use tokio_util::sync::CancellationToken;
use tracing::info;

use common::StashError;
use stash_client::crypto::envelope;
use stash_client::{token, StashApi};

use crate::config::Config;

/// Parse the token, fetch the payload, decrypt, and write the plaintext to
/// stdout.
///
/// Raw bytes are written as-is; a newline is appended only when stdout is an
/// interactive terminal, so piped output stays byte-exact.
pub async fn run(
    cfg: &Config,
    token_text: &str,
    cancel: &CancellationToken,
) -> Result<(), StashError> {
    let parsed = token::parse(token_text)?;

    let api = StashApi::new(&cfg.api_url, cfg.retry_policy())?;
    let wire = api.destash(&parsed.id, cancel).await?;

    let plaintext = envelope::decrypt(&wire, parsed.key.as_bytes())?;
    info!(id = %parsed.id, bytes = plaintext.len(), "secret claimed");

    let mut stdout = std::io::stdout();
    stdout
        .write_all(&plaintext)
        .and_then(|()| {
            if stdout.is_terminal() && plaintext.last() != Some(&b'\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()
        })
        .map_err(|e| StashError::Internal(format!("failed to write secret to stdout: {e}")))?;
    Ok(())
}
