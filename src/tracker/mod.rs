//! Habit tracker engine.
//!
//! A [`HabitTracker`] is built per incoming message for the chat that sent
//! it. It checks authorization once, dispatches the text to the registered
//! command handlers and publishes what happened on its [`EventBus`].

mod dispatch;
mod error;
mod events;
mod habits;
mod registry;
mod report;

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::storage::{Chat, Storage};

use dispatch::Dispatcher;
use error::TrackerError;
use events::{EventBus, Signal};
use habits::capitalize;
use registry::command_handler;

pub use habits::Habit;
pub use report::Reporter;

/// Authorization gate in front of the command dispatcher.
pub struct HabitTracker {
    auth: bool,
    storage: Arc<dyn Storage>,
    dispatcher: Dispatcher,
    events: Arc<EventBus>,
}

impl HabitTracker {
    /// Resolve authorization for `chat` and build its tracker.
    ///
    /// A missing user, an unauthorized one, or a failed lookup all yield an
    /// unauthorized tracker.
    pub async fn for_chat(chat: &Chat, storage: Arc<dyn Storage>) -> Self {
        let auth = match storage.get_user_by_chat(chat).await {
            Ok(user) => user.is_some_and(|u| u.auth),
            Err(e) => {
                warn!("Failed to look up user for chat {}: {}", chat.id, e);
                false
            }
        };
        Self::new(auth, storage)
    }

    /// Tracker for an already authorized user.
    #[allow(dead_code)]
    pub fn for_known_user(storage: Arc<dyn Storage>) -> Self {
        Self::new(true, storage)
    }

    /// Tracker that rejects everything.
    #[allow(dead_code)]
    pub fn for_unknown_user(storage: Arc<dyn Storage>) -> Self {
        Self::new(false, storage)
    }

    fn new(auth: bool, storage: Arc<dyn Storage>) -> Self {
        let events = Arc::new(EventBus::new());
        let mut tracker = Self {
            auth,
            storage,
            dispatcher: Dispatcher::new(events.clone()),
            events,
        };
        for habit in Habit::ALL {
            tracker.add_habit_command(habit);
        }
        tracker
    }

    fn add_habit_command(&mut self, habit: Habit) {
        let storage = self.storage.clone();
        let events = self.events.clone();
        let handler = command_handler(move |message| {
            let storage = storage.clone();
            let events = events.clone();
            async move {
                let item = habit_item(habit, &message)?;
                storage
                    .add_item_to_habit(habit.name(), &item)
                    .await
                    .map_err(TrackerError::Storage)?;
                events.publish_item_added(habit, &item).await;
                Ok(())
            }
        });
        self.dispatcher.register(habit.token(), handler);
    }

    pub fn is_authorized(&self) -> bool {
        self.auth
    }

    /// Report handle carrying this tracker's authorization.
    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.auth, self.storage.clone())
    }

    /// Handle one incoming message. Returns `true` if a command ran.
    ///
    /// Exactly one of chat-unknown or command-unknown is published for a
    /// rejected message. Nothing escapes this call.
    pub async fn accept(&self, message: &str) -> bool {
        if !self.auth {
            info!("Rejected message from unauthorized chat");
            self.events.publish(Signal::ChatUnknown).await;
            return false;
        }

        if self.dispatcher.dispatch(message).await.is_handled() {
            return true;
        }

        self.events.publish(Signal::CommandUnknown).await;
        false
    }

    /// Today's report, empty for an unauthorized chat.
    #[allow(dead_code)]
    pub async fn report(&self) -> anyhow::Result<String> {
        self.reporter().report().await
    }

    // Subscriptions

    /// Run `f` with the whole message whenever it starts with `token`.
    pub fn on_command<F, Fut>(&mut self, token: &str, f: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.dispatcher.register(token, command_handler(f));
    }

    pub fn on_item_added<F, Fut>(&self, f: F)
    where
        F: Fn(Habit, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.events.on_item_added(f);
    }

    pub fn on_chat_unknown<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.events.on(Signal::ChatUnknown, f);
    }

    pub fn on_command_unknown<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.events.on(Signal::CommandUnknown, f);
    }

    pub fn on_command_error<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.events.on(Signal::CommandError, f);
    }
}

/// Item to store for a habit command, from the message that matched it.
fn habit_item(habit: Habit, message: &str) -> Result<String, TrackerError> {
    let text = message
        .strip_prefix(habit.token())
        .unwrap_or_default()
        .trim();

    if text.is_empty() && !habit.allows_empty() {
        return Err(TrackerError::MissingArgument { habit });
    }

    let text = if text.is_empty() { habit.name() } else { text };
    Ok(capitalize(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::report::NO_REPORT_MESSAGE;
    use crate::storage::{KNOWN_CHAT, MemoryStorage, UNAUTH_CHAT, UNKNOWN_CHAT, User};
    use async_trait::async_trait;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EMPTY_REPORT: &str = "Desayuno:
  No hay items
Media mañana:
  No hay items
Almuerzo:
  No hay items
Merienda:
  No hay items
Cena:
  No hay items
Agua:
  0 vasos";

    /// Records every storage call before delegating.
    #[derive(Default)]
    struct SpyStorage {
        inner: MemoryStorage,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Storage for SpyStorage {
        async fn get_items_from_habit(&self, habit: &str) -> anyhow::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_items_from_habit(habit).await
        }

        async fn add_item_to_habit(&self, habit: &str, item: &str) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.add_item_to_habit(habit, item).await
        }

        async fn get_user_by_chat(&self, chat: &Chat) -> anyhow::Result<Option<User>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_user_by_chat(chat).await
        }
    }

    /// Storage whose every call fails.
    struct BrokenStorage;

    #[async_trait]
    impl Storage for BrokenStorage {
        async fn get_items_from_habit(&self, _habit: &str) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("service unavailable")
        }

        async fn add_item_to_habit(&self, _habit: &str, _item: &str) -> anyhow::Result<()> {
            anyhow::bail!("service unavailable")
        }

        async fn get_user_by_chat(&self, _chat: &Chat) -> anyhow::Result<Option<User>> {
            anyhow::bail!("service unavailable")
        }
    }

    #[derive(Default, Clone)]
    struct Counters {
        items: Arc<Mutex<Vec<(Habit, String)>>>,
        chat_unknown: Arc<AtomicUsize>,
        command_unknown: Arc<AtomicUsize>,
        command_error: Arc<AtomicUsize>,
    }

    impl Counters {
        fn attach(tracker: &HabitTracker) -> Self {
            let counters = Self::default();
            let items = counters.items.clone();
            tracker.on_item_added(move |habit, item| {
                let items = items.clone();
                async move {
                    items.lock().push((habit, item));
                    Ok(())
                }
            });
            let c = counters.chat_unknown.clone();
            tracker.on_chat_unknown(move || bump(&c));
            let c = counters.command_unknown.clone();
            tracker.on_command_unknown(move || bump(&c));
            let c = counters.command_error.clone();
            tracker.on_command_error(move || bump(&c));
            counters
        }

        fn get(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    fn bump(counter: &AtomicUsize) -> BoxFuture<'static, anyhow::Result<()>> {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }

    fn known() -> HabitTracker {
        HabitTracker::for_known_user(Arc::new(MemoryStorage::new()))
    }

    fn report_with(section: &str, body: &str) -> String {
        EMPTY_REPORT.replacen(&format!("{}:\n  No hay items", section), &format!("{}:\n  {}", section, body), 1)
    }

    // Command handling, reporting and storing

    #[tokio::test]
    async fn test_unknown_command_is_rejected() {
        let tracker = known();
        assert!(!tracker.accept("start").await);
    }

    #[tokio::test]
    async fn test_empty_report() {
        assert_eq!(known().report().await.unwrap(), EMPTY_REPORT);
    }

    #[tokio::test]
    async fn test_add_item_to_each_food_habit() {
        let cases = [
            ("/desayuno café", "Desayuno", "Café"),
            ("/media_maniana yogur", "Media mañana", "Yogur"),
            ("/almuerzo ensalada", "Almuerzo", "Ensalada"),
            ("/merienda café", "Merienda", "Café"),
            ("/cena pollo", "Cena", "Pollo"),
        ];

        for (message, section, item) in cases {
            let tracker = known();
            assert!(tracker.accept(message).await, "{message} should be handled");
            assert_eq!(tracker.report().await.unwrap(), report_with(section, item));
        }
    }

    #[tokio::test]
    async fn test_item_text_is_trimmed() {
        let tracker = known();
        let counters = Counters::attach(&tracker);

        assert!(tracker.accept("/cena   sopa de calabaza  ").await);
        assert_eq!(*counters.items.lock(), vec![(Habit::Dinner, "Sopa de calabaza".to_string())]);
    }

    #[tokio::test]
    async fn test_add_glass_of_water() {
        let tracker = known();
        assert!(tracker.accept("/agua").await);
        assert_eq!(
            tracker.report().await.unwrap(),
            EMPTY_REPORT.replace("0 vasos", "1 vaso")
        );
    }

    #[tokio::test]
    async fn test_two_items_same_habit() {
        let tracker = known();
        tracker.accept("/desayuno cafe").await;
        tracker.accept("/desayuno tostadas").await;
        assert_eq!(
            tracker.report().await.unwrap(),
            report_with("Desayuno", "Cafe\n  Tostadas")
        );
    }

    #[tokio::test]
    async fn test_two_glasses_of_water() {
        let tracker = known();
        tracker.accept("/agua").await;
        tracker.accept("/agua").await;
        assert_eq!(
            tracker.report().await.unwrap(),
            EMPTY_REPORT.replace("0 vasos", "2 vasos")
        );
    }

    #[tokio::test]
    async fn test_report_is_idempotent() {
        let tracker = known();
        tracker.accept("/almuerzo milanesa").await;
        let first = tracker.report().await.unwrap();
        let second = tracker.report().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_storage_round_trip_shows_in_report() {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_item_to_habit("merienda", "Café").await.unwrap();
        assert!(storage.get_items_from_habit("merienda").await.unwrap().contains(&"Café".to_string()));

        let tracker = HabitTracker::for_known_user(storage);
        assert_eq!(tracker.report().await.unwrap(), report_with("Merienda", "Café"));
    }

    // Custom commands

    #[tokio::test]
    async fn test_subscribe_to_command() {
        let mut tracker = known();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        tracker.on_command("/start", move |_| bump(&h));

        assert!(tracker.accept("/start").await);
        assert_eq!(Counters::get(&hits), 1);
    }

    #[tokio::test]
    async fn test_command_runs_only_for_its_token() {
        let mut tracker = known();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        tracker.on_command("/start", move |_| bump(&h));

        tracker.accept("/desayuno cafe").await;
        assert_eq!(Counters::get(&hits), 0);
    }

    #[tokio::test]
    async fn test_command_receives_whole_message() {
        let mut tracker = known();
        let seen = Arc::new(Mutex::new(String::new()));
        let s = seen.clone();
        tracker.on_command("/desayuno", move |msg| {
            let s = s.clone();
            async move {
                *s.lock() = msg;
                Ok(())
            }
        });

        tracker.accept("/desayuno cafe").await;
        assert_eq!(*seen.lock(), "/desayuno cafe");
    }

    #[tokio::test]
    async fn test_two_handlers_same_command() {
        let mut tracker = known();
        let counters = Counters::attach(&tracker);
        let hits = Arc::new(AtomicUsize::new(0));
        tracker.on_command("/start", |_| async { anyhow::bail!("first handler fails") });
        let h = hits.clone();
        tracker.on_command("/start", move |_| bump(&h));

        assert!(tracker.accept("/start").await);
        assert_eq!(Counters::get(&hits), 1);
        assert_eq!(Counters::get(&counters.command_error), 1);
        assert_eq!(Counters::get(&counters.command_unknown), 0);
    }

    // Rejections and events

    #[tokio::test]
    async fn test_food_habit_without_item_is_an_error() {
        for habit in Habit::ALL.into_iter().filter(|h| !h.allows_empty()) {
            let tracker = known();
            let counters = Counters::attach(&tracker);

            assert!(tracker.accept(habit.token()).await);
            assert!(counters.items.lock().is_empty());
            assert_eq!(Counters::get(&counters.command_error), 1);
            assert_eq!(Counters::get(&counters.command_unknown), 0);
            assert_eq!(tracker.report().await.unwrap(), EMPTY_REPORT);
        }
    }

    #[tokio::test]
    async fn test_food_habit_with_item_publishes_item_added() {
        for habit in Habit::ALL.into_iter().filter(|h| !h.allows_empty()) {
            let tracker = known();
            let counters = Counters::attach(&tracker);

            assert!(tracker.accept(&format!("{} café", habit.token())).await);
            assert_eq!(*counters.items.lock(), vec![(habit, "Café".to_string())]);
            assert_eq!(Counters::get(&counters.command_error), 0);
        }
    }

    #[tokio::test]
    async fn test_water_uses_habit_name_as_item() {
        let tracker = known();
        let counters = Counters::attach(&tracker);

        tracker.accept("/agua").await;
        assert_eq!(*counters.items.lock(), vec![(Habit::Water, "Agua".to_string())]);
    }

    #[tokio::test]
    async fn test_item_added_only_when_stored() {
        let tracker = known();
        let counters = Counters::attach(&tracker);

        tracker.accept("/desayuno").await;
        assert!(counters.items.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_publishes_command_unknown() {
        let tracker = known();
        let counters = Counters::attach(&tracker);

        assert!(!tracker.accept("desayuno cafe").await);
        assert_eq!(Counters::get(&counters.command_unknown), 1);
        assert_eq!(Counters::get(&counters.chat_unknown), 0);
        assert_eq!(Counters::get(&counters.command_error), 0);
    }

    #[tokio::test]
    async fn test_command_unknown_only_for_unknown_commands() {
        let tracker = known();
        let counters = Counters::attach(&tracker);

        tracker.accept("/desayuno cafe").await;
        assert_eq!(Counters::get(&counters.command_unknown), 0);
        tracker.accept("desayuno cafe").await;
        assert_eq!(Counters::get(&counters.command_unknown), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_a_command_error() {
        let tracker = HabitTracker::for_known_user(Arc::new(BrokenStorage));
        let counters = Counters::attach(&tracker);

        assert!(tracker.accept("/cena pollo").await);
        assert_eq!(Counters::get(&counters.command_error), 1);
        assert!(counters.items.lock().is_empty());
        assert!(tracker.report().await.is_err());
    }

    // Authorization

    #[tokio::test]
    async fn test_unauthorized_chat_never_touches_storage() {
        let storage = Arc::new(SpyStorage::default());
        let mut tracker = HabitTracker::for_unknown_user(storage.clone());
        let counters = Counters::attach(&tracker);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        tracker.on_command("/desayuno", move |_| bump(&h));

        for message in ["/desayuno cafe", "/agua", "hola", ""] {
            assert!(!tracker.accept(message).await);
        }
        assert_eq!(tracker.report().await.unwrap(), NO_REPORT_MESSAGE);

        assert_eq!(storage.calls.load(Ordering::SeqCst), 0);
        assert_eq!(Counters::get(&hits), 0);
        assert_eq!(Counters::get(&counters.chat_unknown), 4);
        assert_eq!(Counters::get(&counters.command_unknown), 0);
        assert_eq!(Counters::get(&counters.command_error), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_reporter_never_touches_storage() {
        let storage = Arc::new(SpyStorage::default());
        let reporter = HabitTracker::for_unknown_user(storage.clone()).reporter();

        assert_eq!(reporter.clone().report().await.unwrap(), "");
        assert_eq!(reporter.report().await.unwrap(), NO_REPORT_MESSAGE);
        assert_eq!(storage.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reporter_outlives_its_tracker() {
        let reporter = {
            let tracker = known();
            tracker.accept("/cena pollo").await;
            tracker.reporter()
        };
        assert_eq!(reporter.report().await.unwrap(), report_with("Cena", "Pollo"));
    }

    #[tokio::test]
    async fn test_identify_unknown_chat_gets_no_report() {
        let storage = Arc::new(SpyStorage::default());
        let tracker = HabitTracker::for_chat(&UNKNOWN_CHAT, storage.clone()).await;
        let lookups = storage.calls.load(Ordering::SeqCst);

        assert_eq!(tracker.reporter().report().await.unwrap(), NO_REPORT_MESSAGE);
        assert_eq!(storage.calls.load(Ordering::SeqCst), lookups);
    }

    #[tokio::test]
    async fn test_identify_known_chat() {
        let tracker = HabitTracker::for_chat(&KNOWN_CHAT, Arc::new(MemoryStorage::new())).await;
        assert!(tracker.is_authorized());
        assert!(tracker.accept("/desayuno cafe").await);
    }

    #[tokio::test]
    async fn test_identify_unknown_chat() {
        let tracker = HabitTracker::for_chat(&UNKNOWN_CHAT, Arc::new(MemoryStorage::new())).await;
        let counters = Counters::attach(&tracker);
        assert!(!tracker.accept("/desayuno cafe").await);
        assert_eq!(Counters::get(&counters.chat_unknown), 1);
    }

    #[tokio::test]
    async fn test_identify_unauthorized_chat() {
        let tracker = HabitTracker::for_chat(&UNAUTH_CHAT, Arc::new(MemoryStorage::new())).await;
        assert!(!tracker.accept("/desayuno cafe").await);
    }

    #[tokio::test]
    async fn test_failed_user_lookup_is_unauthorized() {
        let tracker = HabitTracker::for_chat(&KNOWN_CHAT, Arc::new(BrokenStorage)).await;
        assert!(!tracker.is_authorized());
    }

    #[tokio::test]
    async fn test_authorization_is_looked_up_once() {
        let storage = Arc::new(SpyStorage::default());
        let tracker = HabitTracker::for_chat(&KNOWN_CHAT, storage.clone()).await;
        assert_eq!(storage.calls.load(Ordering::SeqCst), 1);

        tracker.accept("/cena pollo").await;
        // One write, no further lookups
        assert_eq!(storage.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_habit_item() {
        assert_eq!(habit_item(Habit::Breakfast, "/desayuno café").unwrap(), "Café");
        assert_eq!(habit_item(Habit::Water, "/agua").unwrap(), "Agua");
        assert_eq!(habit_item(Habit::Water, "/agua  grande ").unwrap(), "Grande");
        assert!(matches!(
            habit_item(Habit::Lunch, "/almuerzo   "),
            Err(TrackerError::MissingArgument { habit: Habit::Lunch })
        ));
    }
}
