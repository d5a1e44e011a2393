use std::time::Duration;

use anyhow::{Context, Result};

use super::{Message, Publisher};

/// Posts each message as JSON to an HTTP bridge in front of the bus.
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl Publisher for HttpPublisher {
    async fn publish(&self, message: &Message) -> Result<()> {
        self.client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .with_context(|| format!("sending {} to sink", message.topic))?
            .error_for_status()
            .context("sink returned error status")?;

        Ok(())
    }
}

/// Writes each message as one JSON line on stdout.
#[derive(Debug, Default)]
pub struct StdoutPublisher;

impl Publisher for StdoutPublisher {
    async fn publish(&self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message).context("serializing message")?;
        println!("{}", line);
        Ok(())
    }
}
