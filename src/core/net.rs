use crate::core::InsiderError;

/// Read the response body as text, turning non-2xx statuses into [`InsiderError::Status`].
pub(crate) async fn get_text(resp: reqwest::Response) -> Result<String, InsiderError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(InsiderError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        });
    }

    let text = resp.text().await?;
    tracing::trace!(bytes = text.len(), "read response body");
    Ok(text)
}
