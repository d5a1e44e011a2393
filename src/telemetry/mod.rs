pub mod discovery;
pub mod sink;

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::collector::Collector;
use crate::domain::snapshot::Snapshot;
use crate::runner::CommandRunner;
use self::discovery::{Device, SensorSet};

/// One publication: a topic, a JSON payload, and whether the bus should keep
/// it as the topic's last value.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub topic: String,
    pub retain: bool,
    pub payload: serde_json::Value,
}

impl Message {
    pub fn state(topics: &Topics, snapshot: &Snapshot) -> Result<Self> {
        Ok(Self {
            topic: topics.state(),
            retain: false,
            payload: serde_json::to_value(snapshot)?,
        })
    }
}

pub trait Publisher: Send + Sync {
    fn publish(&self, message: &Message) -> impl Future<Output = Result<()>> + Send;
}

/// Topic layout for one host under a discovery prefix.
#[derive(Debug, Clone)]
pub struct Topics {
    prefix: String,
    hostname: String,
}

impl Topics {
    pub fn new(prefix: &str, hostname: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            hostname: hostname.to_string(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn state(&self) -> String {
        format!("{}/sensor/{}/state", self.prefix, self.hostname)
    }

    pub fn config(&self, key: &str) -> String {
        format!("{}/sensor/{}_{}/config", self.prefix, self.hostname, key)
    }
}

/// Publish every message in order, stopping at the first failure.
pub async fn publish_all<P: Publisher>(publisher: &P, messages: &[Message]) -> Result<()> {
    for message in messages {
        publisher.publish(message).await?;
    }
    Ok(())
}

/// Publishes snapshots, announcing discovery documents first whenever the
/// sensor set has not yet been accepted by the publisher.
pub struct Publication<'a, P> {
    publisher: &'a P,
    topics: &'a Topics,
    device: &'a Device,
    announced: Option<SensorSet>,
}

impl<'a, P: Publisher> Publication<'a, P> {
    pub fn new(publisher: &'a P, topics: &'a Topics, device: &'a Device) -> Self {
        Self {
            publisher,
            topics,
            device,
            announced: None,
        }
    }

    /// Whether discovery for this snapshot's sensors still has to be sent.
    pub fn discovery_pending(&self, snapshot: &Snapshot) -> bool {
        self.announced.as_ref() != Some(&SensorSet::of(snapshot))
    }

    pub async fn publish(&mut self, snapshot: &Snapshot) {
        if self.discovery_pending(snapshot) {
            self.announce(snapshot).await;
        }

        let message = match Message::state(self.topics, snapshot) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot");
                return;
            }
        };

        match self.publisher.publish(&message).await {
            Ok(()) => debug!(topic = %message.topic, "Published state"),
            Err(e) => warn!(error = %e, "Failed to publish state"),
        }
    }

    async fn announce(&mut self, snapshot: &Snapshot) {
        let result = match discovery::messages(self.topics, self.device, snapshot) {
            Ok(messages) => publish_all(self.publisher, &messages)
                .await
                .map(|()| messages.len()),
            Err(e) => Err(e),
        };

        match result {
            Ok(sensors) => {
                info!(sensors, "Published discovery documents");
                self.announced = Some(SensorSet::of(snapshot));
            }
            Err(e) => warn!(error = %e, "Failed to publish discovery documents, retrying next pass"),
        }
    }
}

/// Collect and publish every `interval`. A pass that exceeds
/// `collect_timeout` is abandoned and the loop waits for the next tick.
pub async fn run_publish_loop<R: CommandRunner, P: Publisher>(
    collector: &Collector<R>,
    mut publication: Publication<'_, P>,
    interval: Duration,
    collect_timeout: Duration,
) {
    info!(
        state_topic = %publication.topics.state(),
        interval_secs = interval.as_secs(),
        "Starting publish loop"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match tokio::time::timeout(collect_timeout, collector.collect()).await {
            Ok(snapshot) => publication.publish(&snapshot).await,
            Err(_) => warn!(
                timeout_secs = collect_timeout.as_secs(),
                "Collection pass timed out"
            ),
        }
    }
}
