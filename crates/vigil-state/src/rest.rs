//! REST key-value store speaking the Upstash / Vercel KV wire format.
//!
//! ```text
//! GET  {base}/get/{key}            → {"result": "value"} | {"result": null}
//! POST {base}/set/{key}  body=value → {"result": "OK"}
//! any failure                       → {"error": "message"}
//! ```
//!
//! Requests carry `Authorization: Bearer {token}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::KvStore;
use crate::error::{StoreError, StoreResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a remote REST key-value service.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    token: String,
}

impl RestStore {
    pub fn new(base_url: &str, token: &str) -> StoreResult<Self> {
        let base = Url::parse(base_url).map_err(|e| StoreError::Open(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Open(format!("not a base URL: {base_url}")));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self {
            client,
            base,
            token: token.to_string(),
        })
    }

    fn command_url(&self, command: &str, key: &str) -> StoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Open(format!("not a base URL: {}", self.base)))?
            .pop_if_empty()
            .push(command)
            .push(key);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<Option<serde_json::Value>> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let reply: Option<RestReply> = serde_json::from_str(&body).ok();
        if let Some(RestReply { error: Some(message), .. }) = &reply {
            return Err(StoreError::Remote(message.clone()));
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        match reply {
            Some(reply) => Ok(reply.result),
            None => Err(StoreError::Decode(body)),
        }
    }
}

#[async_trait]
impl KvStore for RestStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let url = self.command_url("get", key)?;
        let result = self.send(self.client.get(url)).await?;
        let value = match result {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s),
            // Numbers written by other clients come back unquoted.
            Some(other) => Some(other.to_string()),
        };
        debug!(%key, found = value.is_some(), "rest kv get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let url = self.command_url("set", key)?;
        let result = self
            .send(self.client.post(url).body(value.to_string()))
            .await?;
        match result {
            Some(serde_json::Value::String(s)) if s == "OK" => {
                debug!(%key, "rest kv set");
                Ok(())
            }
            other => Err(StoreError::Decode(format!("unexpected set result: {other:?}"))),
        }
    }
}
