//! Newline-delimited JSON bridge for an editor extension host.
//!
//! One request per input line, one response per output line. stdout carries
//! nothing but protocol frames.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::messaging::channel::{MessageChannel, CHANNEL_CAPACITY};
use crate::messaging::handler::MessageHandler;

/// Serve the panel protocol over the process's stdin and stdout
pub async fn run_stdio_bridge(handler: MessageHandler) -> io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    run_bridge(handler, stdin, &mut stdout).await
}

/// Pump frames from `reader` through the channel and write responses to `writer`
/// until `reader` reaches end of input.
pub async fn run_bridge<R, W>(handler: MessageHandler, reader: R, writer: &mut W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (in_tx, in_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (out_tx, mut out_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let channel = tokio::spawn(MessageChannel::new(handler).run(in_rx, out_tx));

    let reader_task = tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if in_tx.send(line).await.is_err() {
                break;
            }
        }
        debug!("Bridge input closed");
        Ok::<_, io::Error>(())
    });

    while let Some(response) = out_rx.recv().await {
        let mut frame = serde_json::to_string(&response).map_err(io::Error::other)?;
        frame.push('\n');
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
    }

    reader_task.await.map_err(io::Error::other)??;
    let processed = channel.await.map_err(io::Error::other)?;
    info!(processed, "Bridge finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::git::{CommandOutput, MockCommandRunner};
    use crate::workspace::Workspace;
    use serde_json::Value;
    use std::sync::Arc;

    fn handler(runner: &MockCommandRunner) -> MessageHandler {
        MessageHandler::new(
            &Config::default(),
            Arc::new(Workspace::fixed("/bridge/repo")),
            Arc::new(runner.clone()),
        )
    }

    fn frames(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_response_line_per_request_line() {
        let runner = MockCommandRunner::new();
        runner.on(&["branch"], CommandOutput::ok("main\ndevelop"));

        let input: &'static [u8] =
            b"{\"command\":\"getLocalBranches\"}\n\n{\"command\":\"checkBranchStatus\",\"branchName\":\"main\"}\n";
        let mut output = Vec::new();

        run_bridge(handler(&runner), tokio::io::BufReader::new(input), &mut output)
            .await
            .unwrap();

        let frames = frames(&output);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["command"], "localBranches");
        assert_eq!(frames[0]["branches"][1], "develop");
        assert_eq!(frames[1]["command"], "branchStatus");
        assert_eq!(frames[1]["isBehind"], false);
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_stop_bridge() {
        let runner = MockCommandRunner::new();

        let input: &'static [u8] = b"{\"command\":\n{\"command\":\"getLocalBranches\"}\n";
        let mut output = Vec::new();

        run_bridge(handler(&runner), tokio::io::BufReader::new(input), &mut output)
            .await
            .unwrap();

        let frames = frames(&output);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["command"], "error");
        assert_eq!(frames[0]["code"], "invalid_message");
        assert_eq!(frames[1]["command"], "localBranches");
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let runner = MockCommandRunner::new();
        let input: &'static [u8] = b"";
        let mut output = Vec::new();

        run_bridge(handler(&runner), tokio::io::BufReader::new(input), &mut output)
            .await
            .unwrap();

        assert!(output.is_empty());
        assert!(runner.commands().is_empty());
    }
}
