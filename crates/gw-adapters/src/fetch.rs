//! Spec fetching: HTTP(S) URL or local file path, read whole under a hard
//! deadline (spec.md §4.1, "Fetch").

use std::time::Duration;

use crate::error::AdapterError;

/// Fetch the raw bytes of a spec from either an `http(s)://` URL or a local
/// file path, bounded by `timeout`.
pub async fn fetch(api_name: &str, source: &str, timeout: Duration) -> Result<Vec<u8>, AdapterError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_http(api_name, source, timeout).await
    } else {
        fetch_file(api_name, source, timeout).await
    }
}

async fn fetch_http(api_name: &str, url: &str, timeout: Duration) -> Result<Vec<u8>, AdapterError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AdapterError::Fetch {
            api: api_name.to_string(),
            source_label: url.to_string(),
            message: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| AdapterError::Fetch {
        api: api_name.to_string(),
        source_label: url.to_string(),
        message: e.to_string(),
    })?;

    let response = response.error_for_status().map_err(|e| AdapterError::Fetch {
        api: api_name.to_string(),
        source_label: url.to_string(),
        message: e.to_string(),
    })?;

    let bytes = response.bytes().await.map_err(|e| AdapterError::Fetch {
        api: api_name.to_string(),
        source_label: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(bytes.to_vec())
}

async fn fetch_file(api_name: &str, path: &str, timeout: Duration) -> Result<Vec<u8>, AdapterError> {
    tokio::time::timeout(timeout, tokio::fs::read(path))
        .await
        .map_err(|_| AdapterError::Fetch {
            api: api_name.to_string(),
            source_label: path.to_string(),
            message: "timed out reading spec file".to_string(),
        })?
        .map_err(|e| AdapterError::Fetch {
            api: api_name.to_string(),
            source_label: path.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_local_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("gw_adapters_fetch_test.json");
        tokio::fs::write(&path, b"{\"openapi\":\"3.0.0\"}").await.unwrap();
        let bytes = fetch("test", path.to_str().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(bytes, b"{\"openapi\":\"3.0.0\"}");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let err = fetch("test", "/no/such/file.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Fetch { .. }));
    }
}
