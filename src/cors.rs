use crate::config::normalize_origin;
use crate::models::MessageResponse;
use axum::{
    extract::{Request, State},
    http::{header::ORIGIN, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

pub const ORIGIN_REJECTED_MESSAGE: &str = "Not allowed by CORS";

/// Origins the frontends are served from. Requests that carry no `Origin`
/// header are not cross-origin and always pass.
#[derive(Debug, Clone)]
pub struct OriginAllowList {
    origins: Arc<Vec<HeaderValue>>,
}

impl OriginAllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .filter_map(|origin| {
                let origin = normalize_origin(origin.as_ref());
                if origin == "*" {
                    tracing::warn!("Skipping wildcard allowed origin; credentialed CORS needs explicit origins");
                    return None;
                }
                match HeaderValue::from_str(&origin) {
                    Ok(value) if !origin.is_empty() => Some(value),
                    Ok(_) => None,
                    Err(_) => {
                        tracing::warn!("Skipping invalid allowed origin {:?}", origin);
                        None
                    }
                }
            })
            .collect();

        Self {
            origins: Arc::new(origins),
        }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Response headers for allowed origins: GET and POST only, with
    /// credentials.
    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.iter().cloned()))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

/// Turns away cross-origin requests, preflights included, before they reach
/// a handler.
pub async fn reject_disallowed_origin(
    State(allow_list): State<OriginAllowList>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(ORIGIN) {
        if !allow_list.allows(origin) {
            tracing::warn!("Rejected request from origin {:?}", origin);
            return (
                StatusCode::FORBIDDEN,
                Json(MessageResponse::new(ORIGIN_REJECTED_MESSAGE)),
            )
                .into_response();
        }
    }

    next.run(request).await
}
