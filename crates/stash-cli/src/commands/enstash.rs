//! `stash enstash` — encrypt a secret and print the one-time claim token.

use tokio_util::sync::CancellationToken;
use tracing::info;

use common::StashError;
use stash_client::crypto::envelope;
use stash_client::{payload, token, StashApi};

use crate::config::Config;
use crate::ingest::{self, SecretSource};

/// Read the secret, encrypt it, store the payload, print the token.
///
/// The plaintext buffer is dropped (and zeroed) before the network call; the
/// key lives only until the token has been printed.
pub async fn run(
    cfg: &Config,
    secret: Option<String>,
    cancel: &CancellationToken,
) -> Result<(), StashError> {
    let source = match secret {
        Some(text) => SecretSource::Inline(text),
        None => SecretSource::Stdin,
    };
    let plaintext = ingest::read_secret(source, cfg.idle_timeout(), cancel).await?;

    let envelope = envelope::encrypt(&plaintext)?;
    drop(plaintext);

    let wire = payload::from_envelope(&envelope);
    let api = StashApi::new(&cfg.api_url, cfg.retry_policy())?;
    let id = api.enstash(&wire, cancel).await?;

    info!(%id, "secret stashed");
    println!("{}", token::format(&id, &envelope.key));
    Ok(())
}
