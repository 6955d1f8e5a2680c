//! HTTP access to the remote reference feed

use crate::RefdataError;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Google Play supported devices,
/// https://support.google.com/googleplay/answer/1727131
pub const DEFAULT_FEED_URL: &str =
    "https://storage.googleapis.com/play_public/supported_devices.csv";

/// Response header carrying the payload's content hashes
const HASH_HEADER: &str = "x-goog-hash";

/// Result of a HEAD probe
#[derive(Debug, Clone)]
pub struct ProbeInfo {
    /// base64 MD5 content hash, empty if the header was absent
    pub hash: String,
}

/// Result of a full GET
#[derive(Debug, Clone)]
pub struct FeedPayload {
    /// base64 MD5 content hash, empty if the header was absent
    pub hash: String,
    /// Payload decoded per the response's declared charset
    pub body: String,
}

/// HTTP client for the reference feed
pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    /// Create a feed client with the given request timeout
    pub fn new(url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("droidbatt/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self { url, client }
    }

    /// Lightweight existence probe: HEAD request, hash header only
    pub async fn probe(&self) -> Result<ProbeInfo, RefdataError> {
        tracing::debug!("Probing reference feed at {}", self.url);

        let response = self
            .client
            .head(&self.url)
            .send()
            .await
            .map_err(|e| RefdataError::Probe(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RefdataError::Probe(format!(
                "feed returned {}",
                response.status()
            )));
        }

        Ok(ProbeInfo {
            hash: content_hash(response.headers()),
        })
    }

    /// Full download, body decoded per the declared charset
    pub async fn fetch(&self) -> Result<FeedPayload, RefdataError> {
        tracing::debug!("Downloading reference feed from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RefdataError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RefdataError::Fetch(format!(
                "feed returned {}",
                response.status()
            )));
        }

        let hash = content_hash(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| RefdataError::Fetch(e.to_string()))?;

        Ok(FeedPayload { hash, body })
    }
}

/// Extract the base64 MD5 member of the content-hash header.
///
/// The header lists hashes as `<algorithm>=<base64>` members, possibly
/// comma-separated or repeated; only the `md5` member is of interest.
/// Returns an empty string when no such member is present.
fn content_hash(headers: &HeaderMap) -> String {
    for value in headers.get_all(HASH_HEADER) {
        let Ok(text) = value.to_str() else {
            continue;
        };
        for member in text.split(',') {
            if let Some((algorithm, hash)) = member.trim().split_once('=') {
                if algorithm == "md5" {
                    return hash.to_string();
                }
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_content_hash_md5_member() {
        let mut headers = HeaderMap::new();
        headers.insert(HASH_HEADER, HeaderValue::from_static("md5=nYmkoaPC7cvQ+eYk0zRzGg=="));
        assert_eq!(content_hash(&headers), "nYmkoaPC7cvQ+eYk0zRzGg==");
    }

    #[test]
    fn test_content_hash_comma_separated() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HASH_HEADER,
            HeaderValue::from_static("crc32c=AAAAAA==, md5=nYmkoaPC7cvQ+eYk0zRzGg=="),
        );
        assert_eq!(content_hash(&headers), "nYmkoaPC7cvQ+eYk0zRzGg==");
    }

    #[test]
    fn test_content_hash_repeated_header() {
        let mut headers = HeaderMap::new();
        headers.append(HASH_HEADER, HeaderValue::from_static("crc32c=AAAAAA=="));
        headers.append(HASH_HEADER, HeaderValue::from_static("md5=abc=="));
        assert_eq!(content_hash(&headers), "abc==");
    }

    #[test]
    fn test_content_hash_absent() {
        let headers = HeaderMap::new();
        assert_eq!(content_hash(&headers), "");
    }
}
