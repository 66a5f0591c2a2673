//! DNS-over-HTTPS client for the DNS fallback path.

use bytes::{Bytes, BytesMut};
use edge_core::defaults::{DEFAULT_DOH_URL, DNS_MESSAGE_CONTENT_TYPE};
use edge_proto::MAX_DNS_MESSAGE_LEN;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::error::ServerError;

/// Sends raw DNS messages as RFC 8484 POST requests.
#[derive(Debug, Clone)]
pub struct DohClient {
    client: Client,
    url: String,
}

impl DohClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create with a custom reqwest [`Client`] (for timeouts, proxies, etc.).
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolve one wire-format query and return the wire-format answer.
    ///
    /// Answers longer than the largest DNS message are rejected.
    pub async fn query(&self, message: Bytes) -> Result<Bytes, ServerError> {
        let mut resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .header(ACCEPT, DNS_MESSAGE_CONTENT_TYPE)
            .body(message)
            .send()
            .await
            .map_err(|e| ServerError::FallbackQueryFailure(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ServerError::FallbackQueryFailure(format!(
                "HTTP {}",
                resp.status().as_u16()
            )));
        }

        if resp
            .content_length()
            .is_some_and(|len| len > MAX_DNS_MESSAGE_LEN as u64)
        {
            return Err(oversized());
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ServerError::FallbackQueryFailure(e.to_string()))?
        {
            if body.len() + chunk.len() > MAX_DNS_MESSAGE_LEN {
                return Err(oversized());
            }
            body.extend_from_slice(&chunk);
        }
        if body.is_empty() {
            return Err(ServerError::FallbackQueryFailure("empty response body".into()));
        }
        Ok(body.freeze())
    }
}

fn oversized() -> ServerError {
    ServerError::FallbackQueryFailure(format!(
        "response body exceeds {MAX_DNS_MESSAGE_LEN} bytes"
    ))
}

impl Default for DohClient {
    fn default() -> Self {
        Self::new(DEFAULT_DOH_URL)
    }
}
