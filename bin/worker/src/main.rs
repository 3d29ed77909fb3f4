//! The copper-courier queue worker.
//!
//! Consumes queued messages from the relay's work-queue stream and drives
//! each one through the dispatcher. Outcomes decide the acknowledgement:
//! replied, reset, and discarded deliveries are acked; failed deliveries
//! are left unacked so the queue redelivers them.

mod config;
mod error;

use std::sync::Arc;

use axum::{Router, routing::get};
use futures::StreamExt;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use copper_courier_agent::AgentClient;
use copper_courier_core::Result;
use copper_courier_dispatch::{DispatchOutcome, Dispatcher, HttpMessagingClient};
use copper_courier_ingest::ensure_stream;
use copper_courier_media::{MediaUploader, ObjectBucketStore};
use copper_courier_session::PgSessionStore;

use crate::config::WorkerConfig;
use crate::error::WorkerError;

type WorkerDispatcher =
    Dispatcher<PgSessionStore, AgentClient, HttpMessagingClient, ObjectBucketStore>;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(report) = run().await {
        tracing::error!(error = %report, "worker failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), WorkerError> {
    let config = WorkerConfig::from_env().map_err(|e| WorkerError::Config {
        details: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| WorkerError::Database {
            details: e.to_string(),
        })?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| WorkerError::Database {
            details: e.to_string(),
        })?;

    let queue_config = config.queue_config();
    let nats_client =
        async_nats::connect(&config.nats.url)
            .await
            .map_err(|e| WorkerError::Queue {
                details: e.to_string(),
            })?;
    let jetstream = async_nats::jetstream::new(nats_client);
    ensure_stream(&jetstream, &queue_config)
        .await
        .map_err(|e| WorkerError::Queue {
            details: e.to_string(),
        })?;

    let stream =
        jetstream
            .get_stream(queue_config.stream())
            .await
            .map_err(|e| WorkerError::Queue {
                details: e.to_string(),
            })?;
    let consumer = stream
        .get_or_create_consumer(
            &config.nats.consumer_name,
            async_nats::jetstream::consumer::pull::Config {
                durable_name: Some(config.nats.consumer_name.clone()),
                ack_policy: async_nats::jetstream::consumer::AckPolicy::Explicit,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| WorkerError::Queue {
            details: e.to_string(),
        })?;

    let media_store = ObjectBucketStore::connect(&config.nats.url, &config.media.bucket)
        .await
        .map_err(|e| WorkerError::MediaBucket {
            details: e.to_string(),
        })?;

    let dispatcher = Arc::new(Dispatcher::new(
        PgSessionStore::new(db_pool),
        AgentClient::new(config.agent_config()),
        HttpMessagingClient::new(config.messaging_config()),
        MediaUploader::new(media_store),
    ));

    // Health endpoint for the hosting platform's liveness checks.
    let app = Router::new().route("/health", get(health));
    let listener = tokio::net::TcpListener::bind(&config.http.listen_addr)
        .await
        .map_err(|e| WorkerError::Bind {
            details: e.to_string(),
        })?;
    tracing::info!("health endpoint on http://{}", config.http.listen_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            tracing::error!(error = %e, "health server exited");
        }
    });

    let mut messages = consumer.messages().await.map_err(|e| WorkerError::Queue {
        details: e.to_string(),
    })?;

    tracing::info!(
        stream = queue_config.stream(),
        consumer = %config.nats.consumer_name,
        "worker started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
            next = messages.next() => {
                match next {
                    Some(Ok(delivery)) => {
                        handle(&dispatcher, delivery).await;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "failed to receive delivery");
                    }
                    None => {
                        tracing::warn!("consumer stream ended");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("worker stopped");
    Ok(())
}

/// Dispatches one delivery and acknowledges it unless the dispatch failed.
///
/// A failed dispatch leaves the delivery unacked; the stream's ack-wait
/// expiry brings it back for another attempt.
async fn handle(dispatcher: &Arc<WorkerDispatcher>, delivery: async_nats::jetstream::Message) {
    let outcome = dispatcher.handle_delivery(&delivery.payload).await;
    match outcome {
        DispatchOutcome::Failed { reason } => {
            tracing::warn!(%reason, "dispatch failed; leaving delivery for redelivery");
        }
        outcome => {
            tracing::debug!(?outcome, "dispatch complete");
            if let Err(e) = delivery.ack().await {
                tracing::warn!(error = %e, "failed to ack delivery");
            }
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
