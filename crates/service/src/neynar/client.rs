use std::time::Duration;

use reqwest::{header::ACCEPT, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use configs::NeynarConfig;

use super::types::{
    CastBody, CastEnvelope, Channel, ChannelEnvelope, ErrorBody, SignedKeyBody, SignerRecord,
};
use crate::errors::ServiceError;
use crate::metrics;

/// Thin client over the Neynar REST API.
///
/// `endpoint` is the API base (e.g. `https://api.neynar.com/v2/farcaster`);
/// every call authenticates with the `api_key` header.
#[derive(Clone)]
pub struct NeynarClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl NeynarClient {
    pub fn new(cfg: &NeynarConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| ServiceError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self::with_client(http, &cfg.endpoint, &cfg.api_key))
    }

    pub fn with_client(http: reqwest::Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// Publish a cast and return its hash.
    pub async fn publish_cast(
        &self,
        signer_uuid: &str,
        text: &str,
        parent: Option<&str>,
    ) -> Result<String, ServiceError> {
        let body = CastBody { signer_uuid, text, parent };
        let req = self.http.post(self.url("cast")).json(&body);
        let envelope: CastEnvelope = self.send_json("cast", req).await?;
        envelope
            .cast
            .and_then(|c| c.hash)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| self.failed("cast", "response missing cast.hash"))
    }

    /// Look up a channel by id. `Ok(None)` when Neynar does not know it.
    pub async fn lookup_channel(&self, id: &str) -> Result<Option<Channel>, ServiceError> {
        let req = self.http.get(self.url("channel")).query(&[("id", id)]);
        let (status, bytes) = self.send("channel", req).await?;
        if status == StatusCode::NOT_FOUND {
            debug!(channel = %id, "channel not found");
            return Ok(None);
        }
        let envelope: ChannelEnvelope = self.decode("channel", status, &bytes)?;
        Ok(Some(envelope.channel))
    }

    /// Create a fresh signer owned by this application.
    pub async fn create_signer(&self) -> Result<SignerRecord, ServiceError> {
        let req = self.http.post(self.url("signer"));
        self.send_json("create_signer", req).await
    }

    /// Register a signed key request for a signer; the response carries the approval URL.
    pub async fn register_signed_key(
        &self,
        signer_uuid: &str,
        app_fid: u64,
        deadline: u64,
        signature: &str,
    ) -> Result<SignerRecord, ServiceError> {
        let body = SignedKeyBody { signer_uuid, app_fid, deadline, signature };
        let req = self.http.post(self.url("signer/signed_key")).json(&body);
        self.send_json("register_signed_key", req).await
    }

    pub async fn lookup_signer(&self, signer_uuid: &str) -> Result<SignerRecord, ServiceError> {
        let req = self
            .http
            .get(self.url("signer"))
            .query(&[("signer_uuid", signer_uuid)]);
        self.send_json("lookup_signer", req).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        req: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let (status, bytes) = self.send(op, req).await?;
        self.decode(op, status, &bytes)
    }

    async fn send(
        &self,
        op: &'static str,
        req: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), ServiceError> {
        let timer = metrics::UPSTREAM_DURATION.with_label_values(&[op]).start_timer();
        let res = req
            .header(ACCEPT, "application/json")
            .header("api_key", &self.api_key)
            .send()
            .await;
        let resp = match res {
            Ok(resp) => resp,
            Err(e) => {
                timer.observe_duration();
                return Err(self.failed(op, format!("request failed: {e}")));
            }
        };
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| self.failed(op, format!("reading body failed: {e}")))?;
        timer.observe_duration();
        debug!(op, %status, len = bytes.len(), "neynar response");
        Ok((status, bytes.to_vec()))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        op: &'static str,
        status: StatusCode,
        bytes: &[u8],
    ) -> Result<T, ServiceError> {
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(bytes)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();
            return Err(self.failed(op, format!("status {status}: {message}")));
        }
        serde_json::from_slice(bytes).map_err(|e| self.failed(op, format!("malformed response: {e}")))
    }

    fn failed(&self, op: &'static str, message: impl Into<String>) -> ServiceError {
        let message = message.into();
        metrics::UPSTREAM_ERRORS_TOTAL.with_label_values(&[op]).inc();
        warn!(op, error = %message, "neynar call failed");
        ServiceError::upstream(op, message)
    }
}
