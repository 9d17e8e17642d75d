//! `stash unstash` — delete a stored secret without revealing it.

use tokio_util::sync::CancellationToken;
use tracing::info;

use common::StashError;
use stash_client::{token, StashApi};

use crate::config::Config;

/// Extract the stash id from a token or bare UUID and delete the secret.
pub async fn run(
    cfg: &Config,
    target: &str,
    cancel: &CancellationToken,
) -> Result<(), StashError> {
    let id = token::extract_uuid(target).ok_or_else(|| {
        StashError::Input("expected a stash token or a bare stash id".into())
    })?;

    let api = StashApi::new(&cfg.api_url, cfg.retry_policy())?;
    let echoed = api.unstash(&id, cancel).await?;

    info!(id = %echoed, "secret unstashed");
    println!("{echoed}");
    Ok(())
}
