//! Authenticated GET client for a single BMC's Redfish API.

use common::error::InventoryError;
use log::{debug, error};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// One Redfish endpoint. The `reqwest::Client` is shared across hosts and
/// carries the connection pool and TLS settings; this struct only binds
/// the base URL and credentials.
pub struct RedfishClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl RedfishClient {
    pub fn new(base_url: String, username: String, password: String, http: reqwest::Client) -> Self {
        RedfishClient {
            base_url,
            username,
            password,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a GET against the given Redfish path and decode the JSON
    /// response. Cancelling the token aborts an in-flight request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &str,
    ) -> Result<T, InventoryError> {
        let url = format!("{}{}", self.base_url, path);

        debug!("[redfish] GET {url}");

        let request = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("accept", "application/json");

        let send_result = tokio::select! {
            _ = cancel.cancelled() => return Err(InventoryError::Cancelled),
            result = request.send() => result,
        };

        let response = match send_result {
            Ok(result) => result,
            Err(err) => {
                error!("[redfish] Request to {url} failed: {err:?}");
                if err.is_timeout() {
                    return Err(InventoryError::Timeout);
                }
                if err.is_connect() {
                    return Err(InventoryError::ConnectionFailed);
                }
                return Err(InventoryError::redfish(
                    &self.base_url,
                    path,
                    0,
                    "",
                    &err.to_string(),
                ));
            }
        };

        let status = response.status();
        debug!("[redfish] GET {url} completed with status {status}");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("[redfish] Authentication rejected by {url} ({status})");
            return Err(InventoryError::AuthFailed);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(InventoryError::NotFound);
        }

        let body_result = tokio::select! {
            _ = cancel.cancelled() => return Err(InventoryError::Cancelled),
            result = response.bytes() => result,
        };
        let body = match body_result {
            Ok(result) => result,
            Err(err) => {
                error!("[redfish] Failed to read response from {url}: {err:?}");
                return Err(InventoryError::InvalidResponse);
            }
        };

        if status.as_u16() >= 400 {
            let body_text = String::from_utf8_lossy(&body);
            error!("[redfish] API error from {url}: {status} {body_text}");
            return Err(InventoryError::redfish(
                &self.base_url,
                path,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &body_text,
            ));
        }

        match serde_json::from_slice(&body) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("[redfish] Failed to decode response from {url}: {err:?}");
                Err(InventoryError::InvalidResponse)
            }
        }
    }
}
