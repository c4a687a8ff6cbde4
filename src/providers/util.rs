use crate::core::error::FetchError;
use tracing::debug;

/// Upper bound on a provider response body.
pub const MAX_BODY_BYTES: usize = 32 << 10;

/// Characters of an error body kept in [`FetchError::Status`].
const ERROR_BODY_PREVIEW: usize = 512;

/// Reads at most `limit` bytes of the body, failing with
/// [`FetchError::BodyTooLarge`] as soon as more arrives.
pub async fn read_limited_body(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::BodyTooLarge { limit });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            debug!(read = body.len(), limit, "Response body over limit");
            return Err(FetchError::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Turns a non-2xx response into [`FetchError::Status`] with a short body preview.
pub async fn status_error(mut response: reqwest::Response) -> FetchError {
    let status = response.status().as_u16();

    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() >= ERROR_BODY_PREVIEW {
            break;
        }
    }

    let text = String::from_utf8_lossy(&body);
    let preview: String = text.trim().chars().take(ERROR_BODY_PREVIEW).collect();
    FetchError::Status {
        status,
        body: preview,
    }
}
