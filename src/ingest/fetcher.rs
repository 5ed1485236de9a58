use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Fixed per-request deadline, applied at the client so no caller can relax
/// it. A slow or hanging remote cannot stall the scheduler beyond this.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed client identifier sent with every request.
pub const USER_AGENT: &str = concat!("trawl/", env!("CARGO_PKG_VERSION"));

/// Response bodies are fully buffered before parsing; cap them so a hostile
/// feed cannot exhaust memory.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10 MiB

/// A failed retrieval.
///
/// The variants exist so logs can say why a fetch failed; callers never
/// branch on them — every variant aborts the poll cycle the same way.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body read)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded [`FETCH_TIMEOUT`]
    #[error("request timed out")]
    Timeout,
    /// Non-2xx response
    #[error("server responded with status {0}")]
    Status(u16),
    /// Response body exceeded [`MAX_BODY_SIZE`]
    #[error("response body too large")]
    TooLarge,
}

/// Build the HTTP client the scheduler hands to every cycle: fixed timeout,
/// fixed User-Agent.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

/// GET a feed URL and return the complete response payload.
///
/// No body is sent and no retries are attempted; retry policy, if any, is
/// the scheduler's concern.
pub async fn fetch_source(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await.map_err(classify)?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }

    read_limited(response, MAX_BODY_SIZE).await
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err)
    }
}

/// Buffer the body in chunks, bailing out as soon as the running total
/// passes `limit`. The Content-Length header, when present, is only a fast
/// path — a lying or absent header still cannot overrun the cap.
async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(classify)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
