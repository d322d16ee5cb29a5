use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::error::FetchError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Transport settings shared by every source. Each source still gets its own
/// client so cookies never leak between boards.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSettings {
    /// Fresh client with an empty cookie jar.
    pub fn session(&self) -> Result<Client, FetchError> {
        let client = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .cookie_store(true)
            .build()?;
        Ok(client)
    }
}

async fn send_checked(request: RequestBuilder) -> Result<Response, FetchError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: resp.url().to_string(),
            status,
        });
    }
    Ok(resp)
}

/// Send and decode a JSON body into a loosely typed document.
pub async fn json(request: RequestBuilder) -> Result<Value, FetchError> {
    let resp = send_checked(request).await?;
    let body = resp.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))
}

/// Send and return the body as text (HTML boards).
pub async fn text(request: RequestBuilder) -> Result<String, FetchError> {
    let resp = send_checked(request).await?;
    Ok(resp.text().await?)
}

/// Send and discard the body. Used to seed session cookies.
pub async fn touch(request: RequestBuilder) -> Result<(), FetchError> {
    let resp = send_checked(request).await?;
    resp.bytes().await?;
    Ok(())
}
