//! AMQP consumer loop
//!
//! One subscription per process. Deliveries are dispatched one at a time; a
//! shutdown signal is only observed between deliveries, so an in-flight
//! dispatch always runs to completion.

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::BrokerConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::status::StatusStore;

/// Consumer tag announced to the broker
pub const CONSUMER_TAG: &str = "package-follower";

/// Broker acknowledgement owed for a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckAction {
    /// Broker already considers the delivery acknowledged
    None,
    Ack,
    /// Negative acknowledgement without requeue
    Reject,
}

/// Acknowledgement for a dispatch outcome under the given ack mode
pub fn ack_action(auto_ack: bool, outcome: DispatchOutcome) -> AckAction {
    if auto_ack {
        return AckAction::None;
    }
    match outcome {
        DispatchOutcome::Completed | DispatchOutcome::Skipped => AckAction::Ack,
        DispatchOutcome::Rejected => AckAction::Reject,
    }
}

/// Subscribes to the follower queue and feeds deliveries to a [`Dispatcher`]
pub struct QueueConsumer<S> {
    config: BrokerConfig,
    dispatcher: Arc<Dispatcher<S>>,
}

impl<S: StatusStore + 'static> QueueConsumer<S> {
    pub fn new(config: BrokerConfig, dispatcher: Arc<Dispatcher<S>>) -> Self {
        Self { config, dispatcher }
    }

    /// Consume until `shutdown` resolves or the broker closes the stream
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let connection = Connection::connect(
            &self.config.url(),
            ConnectionProperties::default().with_connection_name(CONSUMER_TAG.into()),
        )
        .await
        .with_context(|| format!("Failed to connect to {}", self.config.url_redacted()))?;

        let channel = connection
            .create_channel()
            .await
            .context("Failed to open AMQP channel")?;

        if !self.config.auto_ack {
            channel
                .basic_qos(1, BasicQosOptions::default())
                .await
                .context("Failed to set prefetch")?;
        }

        channel
            .queue_declare(
                &self.config.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare queue '{}'", self.config.queue))?;

        let mut deliveries = channel
            .basic_consume(
                &self.config.queue,
                CONSUMER_TAG,
                BasicConsumeOptions {
                    no_ack: self.config.auto_ack,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to consume from '{}'", self.config.queue))?;

        info!(
            broker = %self.config.url_redacted(),
            queue = %self.config.queue,
            auto_ack = self.config.auto_ack,
            "Waiting for messages"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping consumer");
                    break;
                },
                next = deliveries.next() => match next {
                    Some(Ok(delivery)) => {
                        let report = self.dispatcher.dispatch(&delivery.data).await;
                        let action = ack_action(self.config.auto_ack, report.outcome);
                        debug!(tag = delivery.delivery_tag, action = ?action, "Delivery processed");

                        let acked = match action {
                            AckAction::None => Ok(()),
                            AckAction::Ack => delivery.acker.ack(BasicAckOptions::default()).await,
                            AckAction::Reject => {
                                delivery
                                    .acker
                                    .nack(BasicNackOptions {
                                        requeue: false,
                                        ..Default::default()
                                    })
                                    .await
                            },
                        };
                        if let Err(e) = acked {
                            error!(tag = delivery.delivery_tag, error = %e, "Failed to acknowledge delivery");
                        }
                    },
                    Some(Err(e)) => {
                        return Err(e).context("Delivery stream failed");
                    },
                    None => {
                        warn!("Broker closed the delivery stream");
                        break;
                    },
                },
            }
        }

        if let Err(e) = channel.close(200, "consumer stopped").await {
            warn!(error = %e, "Failed to close AMQP channel");
        }
        if let Err(e) = connection.close(200, "consumer stopped").await {
            warn!(error = %e, "Failed to close AMQP connection");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_ack_never_acknowledges() {
        for outcome in [
            DispatchOutcome::Completed,
            DispatchOutcome::Skipped,
            DispatchOutcome::Rejected,
        ] {
            assert_eq!(ack_action(true, outcome), AckAction::None);
        }
    }

    #[test]
    fn test_manual_ack() {
        assert_eq!(ack_action(false, DispatchOutcome::Completed), AckAction::Ack);
        assert_eq!(ack_action(false, DispatchOutcome::Skipped), AckAction::Ack);
        assert_eq!(ack_action(false, DispatchOutcome::Rejected), AckAction::Reject);
    }
}
