//! Event bus.
//!
//! Four independent subscription lists. The tracker publishes to them; the
//! chat transport subscribes to turn events into replies. Publication waits
//! for every subscriber and ignores individual failures.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::warn;

use super::dispatch::settle;
use super::habits::Habit;

/// Subscriber to the item-added channel.
pub type ItemAddedSubscriber =
    Arc<dyn Fn(Habit, String) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Subscriber to a channel without payload.
pub type Subscriber = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Channels without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    ChatUnknown,
    CommandUnknown,
    CommandError,
}

impl Signal {
    fn as_str(self) -> &'static str {
        match self {
            Signal::ChatUnknown => "chat_unknown",
            Signal::CommandUnknown => "command_unknown",
            Signal::CommandError => "command_error",
        }
    }
}

/// Append-only subscription lists, safe to read while publishing.
#[derive(Default)]
pub struct EventBus {
    item_added: RwLock<Vec<ItemAddedSubscriber>>,
    chat_unknown: RwLock<Vec<Subscriber>>,
    command_unknown: RwLock<Vec<Subscriber>>,
    command_error: RwLock<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to items being stored.
    pub fn on_item_added<F, Fut>(&self, f: F)
    where
        F: Fn(Habit, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.item_added
            .write()
            .push(Arc::new(move |habit, item| f(habit, item).boxed()));
    }

    /// Subscribe to one of the payload-less channels.
    pub fn on<F, Fut>(&self, signal: Signal, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.list(signal).write().push(Arc::new(move || f().boxed()));
    }

    /// Notify every item-added subscriber and wait for all of them.
    pub async fn publish_item_added(&self, habit: Habit, item: &str) {
        // Clone out of the lock so nothing is held across the await.
        let subscribers = self.item_added.read().clone();
        let futures = subscribers.iter().map(|s| s(habit, item.to_owned()));
        log_failures("item_added", settle(futures).await);
    }

    /// Notify every subscriber of `signal` and wait for all of them.
    pub async fn publish(&self, signal: Signal) {
        let subscribers = self.list(signal).read().clone();
        let futures = subscribers.iter().map(|s| s());
        log_failures(signal.as_str(), settle(futures).await);
    }

    fn list(&self, signal: Signal) -> &RwLock<Vec<Subscriber>> {
        match signal {
            Signal::ChatUnknown => &self.chat_unknown,
            Signal::CommandUnknown => &self.command_unknown,
            Signal::CommandError => &self.command_error,
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("item_added", &self.item_added.read().len())
            .field("chat_unknown", &self.chat_unknown.read().len())
            .field("command_unknown", &self.command_unknown.read().len())
            .field("command_error", &self.command_error.read().len())
            .finish()
    }
}

fn log_failures(channel: &str, results: Vec<anyhow::Result<()>>) {
    for err in results.into_iter().filter_map(Result::err) {
        warn!(channel, error = %err, "Event subscriber failed");
    }
}
