//! Message dispatcher.
//!
//! Runs every handler of every token that prefix-matches a message, all
//! concurrently, and reduces the results into an [`Outcome`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use super::events::{EventBus, Signal};
use super::registry::{CommandHandler, CommandRegistry};

/// Result of dispatching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one token matched, whatever its handlers did.
    Handled,
    /// No registered token matched.
    Unhandled,
}

impl Outcome {
    pub fn is_handled(self) -> bool {
        matches!(self, Outcome::Handled)
    }
}

/// Command registry plus the bus it reports handler failures to.
#[derive(Debug)]
pub struct Dispatcher {
    registry: CommandRegistry,
    events: Arc<EventBus>,
}

impl Dispatcher {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            events,
        }
    }

    /// Register a handler for `token`. Must happen before dispatching.
    pub fn register(&mut self, token: impl Into<String>, handler: CommandHandler) {
        self.registry.register(token, handler);
    }

    /// Dispatch `message` to every matching token.
    ///
    /// Handler failures are logged and turned into one command-error event
    /// per failing token; they never reach the caller.
    pub async fn dispatch(&self, message: &str) -> Outcome {
        let matched: Vec<_> = self.registry.matching(message).collect();
        if matched.is_empty() {
            debug!("No command matches message");
            return Outcome::Unhandled;
        }

        let runs = matched.iter().map(|(token, handlers)| async move {
            let futures = handlers.iter().map(|h| h(message.to_owned()));
            let results = settle(futures).await;
            let mut failed = false;
            for err in results.into_iter().filter_map(Result::err) {
                warn!(token, error = %err, "Command handler failed");
                failed = true;
            }
            (*token, failed)
        });

        for (token, failed) in join_all(runs).await {
            debug!(token, failed, "Command dispatched");
            if failed {
                self.events.publish(Signal::CommandError).await;
            }
        }

        Outcome::Handled
    }
}

/// Drive every future to completion, turning panics into errors.
pub(super) async fn settle<I>(futures: I) -> Vec<anyhow::Result<()>>
where
    I: IntoIterator<Item = BoxFuture<'static, anyhow::Result<()>>>,
{
    join_all(futures.into_iter().map(|fut| async move {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("handler panicked")),
        }
    }))
    .await
}
