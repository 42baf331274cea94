use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::auth::bearer_token;
use crate::proxy::{dispatch, ProxyError, ProxyRequest, ProxyResponse};
use crate::state::AppState;

/// POST /functions/v1/youtube-api
///
/// The body is parsed by hand so malformed requests get the same
/// `400 {error}` shape as every other proxy failure.
pub async fn handle_youtube_proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProxyResponse>, ProxyError> {
    let request: ProxyRequest = serde_json::from_slice(&body)
        .map_err(|e| ProxyError::InvalidRequest(format!("Invalid request: {e}")))?;
    let token = bearer_token(&headers);

    let response = dispatch(state.platform.as_ref(), request, token.as_deref()).await?;
    Ok(Json(response))
}
