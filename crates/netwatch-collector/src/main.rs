// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use netwatch_collector::config::CollectorConfig;
use netwatch_collector::queue::RedisQueueService;
use netwatch_collector::server::CollectorServer;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() {
    let config = match CollectorConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error creating config on collector startup: {e}");
            return;
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let queue = match RedisQueueService::connect(&config.redis_url, &config.queue_name).await {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            error!("Error connecting to Redis on collector startup: {e}");
            return;
        }
    };

    let server = CollectorServer::new(Arc::clone(&config), queue);

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                error!("Collector server error: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down collector");
        }
    }
}
