//! Command registry.
//!
//! Maps a command token to the handlers registered for it. Registration
//! appends; nothing is ever replaced or removed.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

/// Handler for a command token. Receives the whole message text.
pub type CommandHandler = Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`CommandHandler`].
pub fn command_handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |message| f(message).boxed())
}

/// Ordered table of command tokens and their handlers.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    // Vec keeps first-registration order; the table stays tiny.
    entries: Vec<(String, Vec<CommandHandler>)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `token`, creating the list if absent.
    pub fn register(&mut self, token: impl Into<String>, handler: CommandHandler) {
        let token = token.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some((_, handlers)) => handlers.push(handler),
            None => self.entries.push((token, vec![handler])),
        }
    }

    /// Distinct tokens in first-registration order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    /// Handlers for `token`, in registration order.
    #[allow(dead_code)]
    pub fn handlers(&self, token: &str) -> &[CommandHandler] {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, handlers)| handlers.as_slice())
            .unwrap_or(&[])
    }

    /// Tokens that prefix-match `message`, with their handlers.
    pub fn matching<'a>(
        &'a self,
        message: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [CommandHandler])> + 'a {
        self.entries
            .iter()
            .filter(move |(t, _)| message.starts_with(t.as_str()))
            .map(|(t, handlers)| (t.as_str(), handlers.as_slice()))
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("tokens", &self.tokens().collect::<Vec<_>>())
            .finish()
    }
}
