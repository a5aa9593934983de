//! Thin HTTP client for the node's `/vc` API.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9001";

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

pub struct NodeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// `RequestInfo` envelope block for a call.
    pub fn request_info(api_id: &str) -> Value {
        json!({
            "apiId": api_id,
            "ver": "1.0",
            "ts": chrono::Utc::now().timestamp_millis(),
        })
    }

    /// POST a JSON body. `Ok(None)` when the node cannot be reached.
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> anyhow::Result<Option<T>> {
        let url = format!("{}{}", self.endpoint, path);
        tracing::debug!(%url, "POST");
        let resp = self.http.post(&url).json(body).send().await;
        self.handle(resp).await
    }

    /// GET a path. `Ok(None)` when the node cannot be reached.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<Option<T>> {
        let url = format!("{}{}", self.endpoint, path);
        tracing::debug!(%url, "GET");
        let resp = self.http.get(&url).send().await;
        self.handle(resp).await
    }

    async fn handle<T: DeserializeOwned>(
        &self,
        resp: Result<reqwest::Response, reqwest::Error>,
    ) -> anyhow::Result<Option<T>> {
        match resp {
            Ok(r) if r.status().is_success() => Ok(Some(r.json().await?)),
            Ok(r) => {
                let status = r.status();
                if let Ok(err) = r.json::<ErrorResponse>().await {
                    anyhow::bail!(
                        "request failed (HTTP {}): {}: {}",
                        status,
                        err.error.code,
                        err.error.message
                    );
                } else {
                    anyhow::bail!("request failed (HTTP {})", status);
                }
            }
            Err(e) => {
                println!("Could not reach node at {}", self.endpoint);
                println!("  Error: {}", e);
                println!();
                println!("Is the node running? Start it with: attest-node");
                Ok(None)
            }
        }
    }
}
