//! API state management for the REST server.

use std::sync::Arc;

use crate::config::Config;
use crate::messaging::MessageHandler;

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    /// Panel message handler bound to the workspace repository
    pub handler: MessageHandler,
    /// Application configuration
    pub config: Arc<Config>,
}

impl ApiState {
    pub fn new(config: Config, handler: MessageHandler) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }

    /// Whether a git operation currently holds the workspace repository
    pub async fn is_busy(&self) -> bool {
        match self.handler.orchestrator() {
            Some(orchestrator) => orchestrator.lock().is_busy().await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockCommandRunner;
    use crate::workspace::Workspace;

    #[tokio::test]
    async fn test_busy_follows_repository_lock() {
        let config = Config::default();
        let handler = MessageHandler::new(
            &config,
            Arc::new(Workspace::fixed("/state-test/busy")),
            Arc::new(MockCommandRunner::new()),
        );
        let state = ApiState::new(config, handler);

        assert!(!state.is_busy().await);

        let orchestrator = state.handler.orchestrator().unwrap();
        let _held = orchestrator.lock().try_acquire().await.unwrap();
        assert!(state.is_busy().await);
    }

    #[tokio::test]
    async fn test_no_workspace_is_never_busy() {
        let config = Config::default();
        let handler = MessageHandler::new(
            &config,
            Arc::new(Workspace::empty()),
            Arc::new(MockCommandRunner::new()),
        );

        assert!(!ApiState::new(config, handler).is_busy().await);
    }
}
