use crate::api_types::ApiResponse;
use crate::error::ApiError;
use serde::de::DeserializeOwned;

/// Turns a backend response into its payload, classifying failures by status.
pub async fn into_payload<T>(response: reqwest::Response, path: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| String::from_utf8_lossy(&body).trim().to_owned());
        tracing::warn!("{} failed with status {}", path, status);
        return Err(ApiError::from_status(status.as_u16(), path, message));
    }

    serde_json::from_slice::<ApiResponse<T>>(&body)?.into_result(path)
}
