// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::http_utils::{
    json_response, log_and_create_error_response, log_and_create_http_response,
    verify_request_content_length, HttpResponse,
};
use crate::queue::QueueService;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{http, Method, Request, StatusCode};
use netwatch_core::{MetricsBatch, MetricsBatchResponse, MetricsProcessingJob};
use serde_json::json;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const BATCH_ENDPOINT_PATH: &str = "/api/metrics/batch";
const QUEUE_STATS_ENDPOINT_PATH: &str = "/api/metrics/queue/stats";
const HEALTH_ENDPOINT_PATH: &str = "/health";

const COLLECTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP front of the collector: validates incoming batches and hands them
/// to the queue backend.
pub struct CollectorServer {
    pub config: Arc<CollectorConfig>,
    pub queue: Arc<dyn QueueService>,
}

impl CollectorServer {
    pub fn new(config: Arc<CollectorConfig>, queue: Arc<dyn QueueService>) -> Self {
        CollectorServer { config, queue }
    }

    /// Bind the configured port and serve until the listener fails.
    pub async fn start(&self) -> Result<(), CollectorError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(&addr).await?;
        info!("Collector listening on port {}", self.config.port);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), CollectorError> {
        let config = Arc::clone(&self.config);
        let queue = Arc::clone(&self.queue);
        let service = service_fn(move |req| {
            let config = Arc::clone(&config);
            let queue = Arc::clone(&queue);
            Self::endpoint_handler(config, queue, req)
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        // Don't kill the server on a handler panic.
                        error!("Connection handler panicked: {e:?}");
                        continue;
                    }
                    Ok(()) | Err(_) => continue,
                },
            };

            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    async fn endpoint_handler(
        config: Arc<CollectorConfig>,
        queue: Arc<dyn QueueService>,
        req: Request<Incoming>,
    ) -> http::Result<HttpResponse> {
        match (req.method(), req.uri().path()) {
            (&Method::POST, BATCH_ENDPOINT_PATH) => {
                Self::batch_handler(config, queue, req).await
            }
            (&Method::GET, QUEUE_STATS_ENDPOINT_PATH) => Self::queue_stats_handler(queue).await,
            (&Method::GET, HEALTH_ENDPOINT_PATH) => Self::health_handler(queue).await,
            _ => log_and_create_http_response("Endpoint not found", StatusCode::NOT_FOUND),
        }
    }

    /// Accepts a metrics batch: validates size, enqueues a processing job,
    /// acknowledges with 202 + job id. Validation failures are 4xx so the
    /// agent drops the batch instead of retrying; queue unavailability is
    /// 503 so it retries.
    async fn batch_handler(
        config: Arc<CollectorConfig>,
        queue: Arc<dyn QueueService>,
        req: Request<Incoming>,
    ) -> http::Result<HttpResponse> {
        let (parts, body) = req.into_parts();
        if let Some(response) = verify_request_content_length(
            &parts.headers,
            config.max_content_length,
            "Error receiving metrics batch",
        ) {
            return response;
        }

        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return log_and_create_error_response(
                    "Invalid request",
                    &format!("Error reading request body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        let batch: MetricsBatch = match serde_json::from_slice(&body_bytes) {
            Ok(batch) => batch,
            Err(e) => {
                return log_and_create_error_response(
                    "Invalid request",
                    &format!("Request body is not a valid metrics batch: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        if batch.is_empty() {
            return log_and_create_error_response(
                "Invalid request",
                "Metrics list is empty",
                StatusCode::BAD_REQUEST,
            );
        }

        if batch.len() > config.max_batch_records {
            return log_and_create_error_response(
                "Batch too large",
                &format!(
                    "Maximum batch size is {}, received {}",
                    config.max_batch_records,
                    batch.len()
                ),
                StatusCode::BAD_REQUEST,
            );
        }

        info!(
            "Received batch with {} metrics from {}",
            batch.len(),
            batch.hostname.as_deref().unwrap_or("unknown")
        );

        let accepted = batch.len();
        let job = MetricsProcessingJob::new(
            batch.metrics,
            batch.hostname,
            Some(batch.agent_version),
        );

        match queue.enqueue(&job).await {
            Ok(stream_id) => {
                info!(
                    "Batch enqueued. job_id={}, stream_id={stream_id}, metrics={accepted}",
                    job.job_id
                );
                json_response(
                    StatusCode::ACCEPTED,
                    &MetricsBatchResponse {
                        job_id: job.job_id,
                        accepted,
                        rejected: 0,
                        message: "Batch queued for processing".to_string(),
                    },
                )
            }
            Err(e) => {
                error!("Failed to enqueue batch: {e}");
                log_and_create_error_response(
                    "Service unavailable",
                    "Failed to queue metrics for processing",
                    StatusCode::SERVICE_UNAVAILABLE,
                )
            }
        }
    }

    async fn queue_stats_handler(queue: Arc<dyn QueueService>) -> http::Result<HttpResponse> {
        match queue.stats().await {
            Ok(stats) => json_response(StatusCode::OK, &stats),
            Err(e) => {
                error!("Failed to get queue stats: {e}");
                log_and_create_error_response(
                    "Internal Server Error",
                    "Failed to retrieve queue stats",
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        }
    }

    async fn health_handler(queue: Arc<dyn QueueService>) -> http::Result<HttpResponse> {
        if queue.is_healthy().await {
            debug!("Health check passed");
            json_response(
                StatusCode::OK,
                &json!({
                    "status": "healthy",
                    "timestamp": chrono::Utc::now(),
                    "version": COLLECTOR_VERSION,
                }),
            )
        } else {
            log_and_create_http_response(
                "Queue backend is not responsive",
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
