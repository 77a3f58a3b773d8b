// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Example API instrumented with the NetWatch agent.
//!
//! Start a collector (or anything answering `POST /api/metrics/batch`) on
//! localhost:5001, then:
//!
//! ```sh
//! NETWATCH_API_KEY=nw_example_key_12345 \
//! NETWATCH_COLLECTOR_ENDPOINT=http://localhost:5001 \
//! cargo run --example axum_host
//! ```

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use netwatch_agent::buffer::MetricsBuffer;
use netwatch_agent::config::AgentConfig;
use netwatch_agent::observer::{generate_trace_id, RequestObserver};
use netwatch_agent::transport::HttpTransport;
use netwatch_agent::MetricsTransport;
use netwatch_core::RequestMetric;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match AgentConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Error creating agent config on startup: {e}");
            return;
        }
    };

    let transport = match HttpTransport::new(&config) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Error creating transport on startup: {e}");
            return;
        }
    };

    if !transport.is_healthy().await {
        info!("Collector is not reachable yet, metrics will be retried and may be dropped");
    }

    let buffer = match MetricsBuffer::start(transport, &config) {
        Ok(buffer) => buffer,
        Err(e) => {
            error!("Error starting metrics buffer: {e}");
            return;
        }
    };
    let observer = RequestObserver::new(Arc::clone(&config), buffer.clone());

    let app = Router::new()
        .route("/api/test/fast", get(fast_handler))
        .route("/api/test/slow", get(slow_handler))
        .route("/api/test/error", get(error_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            observer,
            track_requests,
        ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("failed to bind port 3000");
    info!("Example API listening on http://127.0.0.1:3000");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("server error");

    // Final best-effort flush of whatever is still pending.
    buffer.shutdown().await;
}

/// Observes every request the gate lets through; never fails the request.
async fn track_requests(
    State(observer): State<RequestObserver>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if !observer.should_capture(&path) {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let query = req.uri().query().map(str::to_string);
    let user_agent = if observer.captures_header("User-Agent") {
        req.headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    } else {
        None
    };

    let started = Instant::now();
    let response = next.run(req).await;

    let mut builder = RequestMetric::builder(
        generate_trace_id(),
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis() as u64,
    )
    .client(None, user_agent);
    if let Some(query) = query {
        builder = builder.query_string(query);
    }
    observer.record(builder.build());

    response
}

async fn fast_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "fast endpoint" }))
}

async fn slow_handler() -> Json<serde_json::Value> {
    let delay = rand::thread_rng().gen_range(500..2000);
    tokio::time::sleep(Duration::from_millis(delay)).await;
    Json(serde_json::json!({ "message": "slow endpoint", "delayMs": delay }))
}

async fn error_handler() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "message": "intentional error" })),
    )
}

/// Excluded from capture by the default ignore list.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
