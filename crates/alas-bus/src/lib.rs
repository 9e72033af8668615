//! # alas-bus
//!
//! Kafka producer/consumer lifecycle, mirroring the shape of
//! `original_source/shared/application/kafka.go`: bootstrap the topics a
//! service needs, hand back a shared producer, and spawn one consumer
//! task per topic that observes a [`CancellationToken`] — outer fetch
//! loop checks cancellation, an in-flight handler call completes, then
//! the loop exits and the consumer is dropped (which commits and closes
//! on drop).

use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// A connected producer plus the broker address consumers are spawned
/// against. `sync` mirrors `KAFKA_SYNC`: when true, `publish` waits for
/// the broker's ack before returning; when false, the send is fired and
/// the delivery future is driven to completion on a background task —
/// the async-batched-writes behavior `spec.md` §5 allows.
#[derive(Clone)]
pub struct Bus {
    producer: FutureProducer,
    sync: bool,
}

impl Bus {
    pub async fn connect(kafka_host: &str, sync: bool, topics: &[&str]) -> Result<Self, BusError> {
        let brokers = format!("{kafka_host}:9092");

        ensure_topics(&brokers, topics).await?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer, sync })
    }

    /// Publish `payload` to `topic`. Delivery failures surface as
    /// `BusError::Kafka`; callers map this to `InternalError`.
    pub async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
        let record = FutureRecord::to(topic).payload(payload).key("");

        if self.sync {
            self.producer
                .send(record, Duration::from_secs(5))
                .await
                .map_err(|(e, _)| e)?;
        } else {
            let producer = self.producer.clone();
            let topic = topic.to_string();
            let payload = payload.to_vec();
            tokio::spawn(async move {
                let record = FutureRecord::to(&topic).payload(&payload).key("");
                if let Err((e, _)) = producer.send(record, Duration::from_secs(5)).await {
                    tracing::error!(error = %e, topic, "async publish failed");
                }
            });
        }

        Ok(())
    }

    /// Spawn a consumer loop for `topic` in consumer group `group`,
    /// calling `handler` for every message. The loop exits once `cancel`
    /// fires and the in-flight `handler` call (if any) returns.
    pub fn spawn_consumer<F>(
        &self,
        kafka_host: &str,
        group: &str,
        topic: &str,
        cancel: CancellationToken,
        handler: F,
    ) -> JoinHandle<()>
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        let brokers = format!("{kafka_host}:9092");
        let group = group.to_string();
        let topic = topic.to_string();

        tokio::spawn(async move {
            let consumer: StreamConsumer = match ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &group)
                .set("enable.auto.commit", "true")
                .set("auto.commit.interval.ms", "1000")
                .set("auto.offset.reset", "earliest")
                .create()
            {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, topic, "failed to create consumer");
                    return;
                }
            };

            if let Err(e) = consumer.subscribe(&[&topic]) {
                tracing::error!(error = %e, topic, "failed to subscribe");
                return;
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!(topic, "consumer shutting down");
                        break;
                    }
                    result = consumer.recv() => {
                        match result {
                            Ok(message) => {
                                if let Some(payload) = message.payload() {
                                    handler(payload.to_vec());
                                }
                            }
                            Err(e) => {
                                tracing::error!(error = %e, topic, "failed to consume message");
                            }
                        }
                    }
                }
            }
        })
    }
}

async fn ensure_topics(brokers: &str, topics: &[&str]) -> Result<(), BusError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()?;

    let new_topics: Vec<NewTopic> = topics
        .iter()
        .map(|t| NewTopic::new(t, 1, TopicReplication::Fixed(1)))
        .collect();

    let results = admin
        .create_topics(&new_topics, &AdminOptions::new())
        .await?;

    for result in results {
        if let Err((topic, err)) = result {
            tracing::debug!(topic, %err, "topic create returned non-fatal error (likely already exists)");
        }
    }

    Ok(())
}
