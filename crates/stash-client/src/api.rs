//! Typed client for the stash backend endpoints.
//!
//! Maps the three operations — `POST /enstash`, `GET /destash/:id`,
//! `DELETE /unstash/:id` — onto the resilient request layer and translates
//! HTTP statuses into the [`StashError`] taxonomy. 404 means the id is
//! unknown; 410 means the secret expired or was already claimed, with the
//! body's `error` field distinguishing the two.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{header, Method, Request, Response, StatusCode, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use common::protocol::{DeleteResponse, ErrorResponse, StoreResponse, WirePayload, MAX_WIRE_LEN};
use common::StashError;

use crate::net::{retry, RetryPolicy};
use crate::payload;
use crate::token;

/// HTTP client for one stash backend, constructed once per invocation.
pub struct StashApi {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    base_url: String,
    policy: RetryPolicy,
}

impl StashApi {
    /// Build a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StashError::Input`] if `base_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(base_url: &str, policy: RetryPolicy) -> Result<Self, StashError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let uri: Uri = trimmed
            .parse()
            .map_err(|_| StashError::Input(format!("invalid api url: {base_url}")))?;
        if !matches!(uri.scheme_str(), Some("http") | Some("https")) {
            return Err(StashError::Input(format!(
                "api url must start with http:// or https://: {base_url}"
            )));
        }
        if uri.authority().is_none() {
            return Err(StashError::Input(format!("api url has no host: {base_url}")));
        }

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
            policy,
        })
    }

    /// Store an encrypted payload; returns the backend-minted stash id.
    ///
    /// # Errors
    ///
    /// [`StashError::Validation`] if the payload is oversized or the backend
    /// response is malformed, plus the request-layer failures.
    pub async fn enstash(
        &self,
        wire: &WirePayload,
        cancel: &CancellationToken,
    ) -> Result<String, StashError> {
        let body = Bytes::from(payload::encode(wire)?);
        let uri = format!("{}/enstash", self.base_url);
        debug!(bytes = body.len(), "storing payload");

        let response = retry::send(
            &self.client,
            || {
                Request::builder()
                    .method(Method::POST)
                    .uri(&uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Full::new(body.clone()))
            },
            &self.policy,
            cancel,
        )
        .await?;

        let (status, text) = read_response(response).await?;
        if !status.is_success() {
            return Err(map_failure_status(status, &text));
        }

        let store: StoreResponse = serde_json::from_str(&text)
            .map_err(|_| StashError::Validation("store response is not valid JSON".into()))?;
        if !token::validate_uuid(&store.id) {
            return Err(StashError::Validation(format!(
                "backend returned a malformed id: {}",
                store.id
            )));
        }
        Ok(store.id.to_ascii_lowercase())
    }

    /// Fetch the encrypted payload for `id`. The backend consumes the secret
    /// as a side effect — this succeeds at most once per id.
    ///
    /// # Errors
    ///
    /// [`StashError::NotFound`] on 404, [`StashError::Expired`] on 410, plus
    /// validation and request-layer failures.
    pub async fn destash(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<WirePayload, StashError> {
        let uri = format!("{}/destash/{id}", self.base_url);
        debug!(%id, "fetching payload");

        let response = retry::send(
            &self.client,
            || {
                Request::builder()
                    .method(Method::GET)
                    .uri(&uri)
                    .body(Full::new(Bytes::new()))
            },
            &self.policy,
            cancel,
        )
        .await?;

        let (status, text) = read_response(response).await?;
        if !status.is_success() {
            return Err(map_failure_status(status, &text));
        }
        Ok(payload::decode(&text)?)
    }

    /// Delete the secret under `id` without revealing it; returns the echoed
    /// id.
    ///
    /// # Errors
    ///
    /// Same status mapping as [`StashApi::destash`].
    pub async fn unstash(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, StashError> {
        let uri = format!("{}/unstash/{id}", self.base_url);
        debug!(%id, "deleting payload");

        let response = retry::send(
            &self.client,
            || {
                Request::builder()
                    .method(Method::DELETE)
                    .uri(&uri)
                    .body(Full::new(Bytes::new()))
            },
            &self.policy,
            cancel,
        )
        .await?;

        let (status, text) = read_response(response).await?;
        if !status.is_success() {
            return Err(map_failure_status(status, &text));
        }

        let deleted: DeleteResponse = serde_json::from_str(&text)
            .map_err(|_| StashError::Validation("delete response is not valid JSON".into()))?;
        Ok(deleted.id)
    }
}

/// Read a response body, enforcing the wire-size ceiling locally.
async fn read_response(response: Response<Incoming>) -> Result<(StatusCode, String), StashError> {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| StashError::Network(format!("failed to read response body: {e}")))?
        .to_bytes();
    if bytes.len() > MAX_WIRE_LEN {
        return Err(StashError::Validation(format!(
            "response body is {} bytes, limit is {MAX_WIRE_LEN}",
            bytes.len()
        )));
    }
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|_| StashError::Validation("response body is not valid UTF-8".into()))?;
    Ok((status, text))
}

/// Translate a non-2xx, non-retryable status into the error taxonomy.
fn map_failure_status(status: StatusCode, body: &str) -> StashError {
    match status.as_u16() {
        404 => StashError::NotFound,
        410 => {
            let expired = serde_json::from_str::<ErrorResponse>(body)
                .map(|e| e.error == "Expired")
                .unwrap_or(false);
            if expired {
                StashError::Expired("secret expired".into())
            } else {
                StashError::Expired("secret already claimed".into())
            }
        }
        s => StashError::Remote {
            status: s,
            attempts: 1,
        },
    }
}
