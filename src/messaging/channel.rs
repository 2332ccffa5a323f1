//! FIFO processing loop between a transport and the [`MessageHandler`].

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::messaging::handler::MessageHandler;
use crate::messaging::protocol::OutboundMessage;

/// Default capacity of the inbound and outbound queues
pub const CHANNEL_CAPACITY: usize = 64;

/// Handles raw JSON frames strictly one at a time, in arrival order
pub struct MessageChannel {
    handler: MessageHandler,
}

impl MessageChannel {
    pub fn new(handler: MessageHandler) -> Self {
        Self { handler }
    }

    /// Run until `inbound` closes or the outbound receiver goes away.
    ///
    /// Each frame's response is sent before the next frame is read, so a
    /// request never starts while an earlier one is still running.
    /// Returns the number of frames processed.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<String>,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> usize {
        let mut processed = 0;

        while let Some(frame) = inbound.recv().await {
            let response = self.handler.handle_json(&frame).await;
            processed += 1;

            if outbound.send(response).await.is_err() {
                debug!("Outbound receiver dropped, stopping channel");
                break;
            }
        }

        info!(processed, "Message channel closed");
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::git::{CommandOutput, MockCommandRunner};
    use crate::types::ErrorCode;
    use crate::workspace::Workspace;
    use std::sync::Arc;

    fn channel(runner: &MockCommandRunner) -> MessageChannel {
        MessageChannel::new(MessageHandler::new(
            &Config::default(),
            Arc::new(Workspace::fixed("/channel/repo")),
            Arc::new(runner.clone()),
        ))
    }

    #[tokio::test]
    async fn test_responses_follow_request_order() {
        let runner = MockCommandRunner::new();
        runner.on(&["branch"], CommandOutput::ok("main"));

        let (in_tx, in_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (out_tx, mut out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(channel(&runner).run(in_rx, out_tx));

        in_tx
            .send(r#"{"command":"getLocalBranches"}"#.to_string())
            .await
            .unwrap();
        in_tx.send("garbage".to_string()).await.unwrap();
        in_tx
            .send(r#"{"command":"pullBranch","branchName":"main"}"#.to_string())
            .await
            .unwrap();
        drop(in_tx);

        let mut responses = Vec::new();
        while let Some(response) = out_rx.recv().await {
            responses.push(response);
        }

        assert_eq!(task.await.unwrap(), 3);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].command_name(), "localBranches");
        assert!(matches!(
            responses[1],
            OutboundMessage::Error {
                code: ErrorCode::InvalidMessage,
                ..
            }
        ));
        assert_eq!(responses[2].command_name(), "pullSuccess");
        assert_eq!(
            runner.command_lines(),
            vec!["branch --format=%(refname:short)", "fetch origin main:main"]
        );
    }

    #[tokio::test]
    async fn test_stops_when_outbound_dropped() {
        let runner = MockCommandRunner::new();

        let (in_tx, in_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        drop(out_rx);

        in_tx
            .send(r#"{"command":"getLocalBranches"}"#.to_string())
            .await
            .unwrap();

        let processed = channel(&runner).run(in_rx, out_tx).await;
        assert_eq!(processed, 1);
    }
}
