// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::CollectorError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use netwatch_core::{MetricsProcessingJob, QueueStats};
use redis::aio::ConnectionManager;
use tracing::{debug, info, warn};

/// Seam between the HTTP handlers and the queue backend.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Enqueue one processing job; returns the backend's entry id.
    async fn enqueue(&self, job: &MetricsProcessingJob) -> Result<String, CollectorError>;

    /// Best-effort backend reachability probe.
    async fn is_healthy(&self) -> bool;

    /// Point-in-time queue statistics.
    async fn stats(&self) -> Result<QueueStats, CollectorError>;
}

/// Queue backed by a Redis stream.
///
/// Jobs are appended with `XADD` as a JSON `data` field plus an
/// `enqueuedAt` unix-milliseconds field and a `type` tag, so downstream
/// consumers can route without parsing the payload.
pub struct RedisQueueService {
    conn: ConnectionManager,
    queue_name: String,
}

impl RedisQueueService {
    /// Connect to Redis; the connection manager reconnects on failure and
    /// every clone shares the same multiplexed connection.
    pub async fn connect(redis_url: &str, queue_name: &str) -> Result<Self, CollectorError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis queue backend at {redis_url}");
        Ok(RedisQueueService {
            conn,
            queue_name: queue_name.to_string(),
        })
    }
}

#[async_trait]
impl QueueService for RedisQueueService {
    async fn enqueue(&self, job: &MetricsProcessingJob) -> Result<String, CollectorError> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.conn.clone();
        let stream_id: String = redis::cmd("XADD")
            .arg(&self.queue_name)
            .arg("*")
            .arg("data")
            .arg(payload)
            .arg("enqueuedAt")
            .arg(Utc::now().timestamp_millis())
            .arg("type")
            .arg("MetricsProcessingJob")
            .query_async(&mut conn)
            .await?;

        debug!(
            "Enqueued job {} to {} (stream id {stream_id})",
            job.job_id, self.queue_name
        );
        Ok(stream_id)
    }

    async fn is_healthy(&self) -> bool {
        let mut conn = self.conn.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Redis health check failed: {e}");
                false
            }
        }
    }

    async fn stats(&self) -> Result<QueueStats, CollectorError> {
        let mut conn = self.conn.clone();
        let pending_count: u64 = redis::cmd("XLEN")
            .arg(&self.queue_name)
            .query_async(&mut conn)
            .await?;

        // The newest entry's autogenerated id carries its enqueue time.
        let last: Vec<(String, Vec<(String, String)>)> = redis::cmd("XREVRANGE")
            .arg(&self.queue_name)
            .arg("+")
            .arg("-")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await?;
        let last_enqueued_at = last
            .first()
            .and_then(|(id, _fields)| parse_stream_id_timestamp(id));

        Ok(QueueStats {
            queue_name: self.queue_name.clone(),
            pending_count,
            processed_count: 0,
            last_enqueued_at,
        })
    }
}

/// Redis stream ids are `<unix-ms>-<sequence>`.
fn parse_stream_id_timestamp(stream_id: &str) -> Option<DateTime<Utc>> {
    let millis = stream_id.split('-').next()?.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_id_timestamp() {
        let parsed = parse_stream_id_timestamp("1700000000000-0").unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_parse_stream_id_garbage() {
        assert!(parse_stream_id_timestamp("not-a-stream-id").is_none());
        assert!(parse_stream_id_timestamp("").is_none());
    }
}
