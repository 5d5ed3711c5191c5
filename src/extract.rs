use std::{convert::Infallible, net::SocketAddr};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{error::ApiError, store::ClientInfo};

/// JSON body extractor that ignores the content type and rejects with
/// `400 {"error": "Invalid JSON"}` instead of axum's plain-text rejections.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::BadRequest("Invalid JSON".into()))?;
        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            debug!(error = %e, "rejecting request body");
            ApiError::BadRequest("Invalid JSON".into())
        })
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(client_info(&parts.headers, peer))
    }
}

fn client_info(headers: &HeaderMap, peer: Option<String>) -> ClientInfo {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    // first hop of X-Forwarded-For is the original client
    let ip = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str("x-real-ip"))
        .map(str::to_string)
        .or(peer);

    ClientInfo {
        ip,
        user_agent: header_str(header::USER_AGENT.as_str()).map(str::to_string),
    }
}
