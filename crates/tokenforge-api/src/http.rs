/// Status and body of a response outside the 2xx range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    pub body: String,
}

/// Pass 2xx responses through; read the body of anything else.
pub async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, HttpFailure> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(HttpFailure { status, body })
}
