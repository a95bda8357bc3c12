//! API key authentication middleware
//!
//! Guards the job submission and status routes the way the hosted queue API
//! does: `Authorization: Bearer <key>`. An empty key set disables
//! authentication; `/health` always bypasses it.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use serde_json::json;
use std::{
    collections::HashSet,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

/// Authentication layer
#[derive(Clone)]
pub struct AuthLayer {
    api_keys: Arc<HashSet<String>>,
}

impl AuthLayer {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys.into_iter().collect()),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            api_keys: self.api_keys.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    api_keys: Arc<HashSet<String>>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Health checks are never authenticated
        if request.uri().path() == "/health" || self.api_keys.is_empty() {
            let future = self.inner.call(request);
            return Box::pin(async move { future.await });
        }

        let bearer = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|h| h.trim_start_matches("Bearer ").to_string());

        match bearer {
            Some(key) if self.api_keys.contains(&key) => {
                let future = self.inner.call(request);
                Box::pin(async move { future.await })
            }
            Some(_) => {
                warn!("Invalid API key provided");
                Box::pin(async move { Ok(unauthorized("Invalid API key")) })
            }
            None => {
                warn!("No API key provided");
                Box::pin(async move {
                    Ok(unauthorized(
                        "API key required. Provide via Authorization header: 'Bearer YOUR_API_KEY'",
                    ))
                })
            }
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}
