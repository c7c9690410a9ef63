//! Achievement notifications
//!
//! A small synchronous publish/subscribe sink. Listeners run in registration
//! order; a listener that fails or panics is logged and skipped so the rest
//! still receive the event.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

/// Notification emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AchievementEvent {
    #[serde(rename = "achievement.unlocked")]
    Unlocked { key: String },
    #[serde(rename = "catalog.changed")]
    CatalogChanged,
}

impl AchievementEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AchievementEvent::Unlocked { .. } => "achievement.unlocked",
            AchievementEvent::CatalogChanged => "catalog.changed",
        }
    }
}

/// Subscriber to achievement notifications
pub trait EventListener: Send {
    /// Handle an event. Errors are logged by the sink, never propagated.
    fn handle(&mut self, event: &AchievementEvent) -> anyhow::Result<()>;

    /// Listener name (for logs)
    fn name(&self) -> &str;

    /// Whether this listener wants the event
    fn should_handle(&self, _event: &AchievementEvent) -> bool {
        true
    }
}

/// Closure-backed listener
pub struct FnListener<F>
where
    F: FnMut(&AchievementEvent) -> anyhow::Result<()> + Send,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: FnMut(&AchievementEvent) -> anyhow::Result<()> + Send,
{
    pub fn new(name: &str, handler: F) -> Self {
        Self {
            name: name.to_string(),
            handler,
        }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: FnMut(&AchievementEvent) -> anyhow::Result<()> + Send,
{
    fn handle(&mut self, event: &AchievementEvent) -> anyhow::Result<()> {
        (self.handler)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Synchronous fan-out to registered listeners
pub struct EventSink {
    listeners: Vec<Box<dyn EventListener>>,
    history: VecDeque<AchievementEvent>,
    max_history: usize,
}

impl EventSink {
    pub fn new() -> Self {
        Self::with_history_size(100)
    }

    pub fn with_history_size(max_history: usize) -> Self {
        Self {
            listeners: Vec::new(),
            history: VecDeque::new(),
            max_history,
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        tracing::debug!(listener = listener.name(), "listener subscribed");
        self.listeners.push(listener);
    }

    /// Deliver an event to every listener.
    ///
    /// Returns the number of listeners that failed.
    pub fn publish(&mut self, event: &AchievementEvent) -> usize {
        self.add_to_history(event.clone());

        let mut failures = 0;
        for listener in &mut self.listeners {
            if !listener.should_handle(event) {
                continue;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| listener.handle(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    tracing::warn!(
                        listener = listener.name(),
                        event = event.event_type(),
                        error = %err,
                        "achievement listener failed"
                    );
                }
                Err(_) => {
                    failures += 1;
                    tracing::warn!(
                        listener = listener.name(),
                        event = event.event_type(),
                        "achievement listener panicked"
                    );
                }
            }
        }
        failures
    }

    fn add_to_history(&mut self, event: AchievementEvent) {
        if self.max_history == 0 {
            return;
        }
        if self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// Most recent events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &AchievementEvent> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.listeners.iter().map(|l| l.name()).collect();
        f.debug_struct("EventSink")
            .field("listeners", &names)
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(name: &str, seen: Arc<Mutex<Vec<String>>>) -> Box<dyn EventListener> {
        let tag = name.to_string();
        Box::new(FnListener::new(name, move |event| {
            seen.lock().unwrap().push(format!("{}:{}", tag, event.event_type()));
            Ok(())
        }))
    }

    #[test]
    fn delivers_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sink = EventSink::new();
        sink.subscribe(recorder("first", seen.clone()));
        sink.subscribe(recorder("second", seen.clone()));

        sink.publish(&AchievementEvent::CatalogChanged);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:catalog.changed", "second:catalog.changed"]
        );
    }

    #[test]
    fn failing_listeners_do_not_stop_delivery() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sink = EventSink::new();
        sink.subscribe(Box::new(FnListener::new("errors", |_| {
            anyhow::bail!("disk full")
        })));
        sink.subscribe(Box::new(FnListener::new("panics", |_| -> anyhow::Result<()> {
            panic!("listener bug")
        })));
        sink.subscribe(recorder("last", seen.clone()));

        let failures = sink.publish(&AchievementEvent::Unlocked { key: "a".into() });

        assert_eq!(failures, 2);
        assert_eq!(*seen.lock().unwrap(), vec!["last:achievement.unlocked"]);
    }

    #[test]
    fn history_is_bounded() {
        let mut sink = EventSink::with_history_size(2);
        for key in ["a", "b", "c"] {
            sink.publish(&AchievementEvent::Unlocked { key: key.into() });
        }
        let keys: Vec<_> = sink.history().cloned().collect();
        assert_eq!(
            keys,
            vec![
                AchievementEvent::Unlocked { key: "b".into() },
                AchievementEvent::Unlocked { key: "c".into() },
            ]
        );
    }

    #[test]
    fn event_wire_names() {
        let json = serde_json::to_value(AchievementEvent::Unlocked { key: "a".into() }).unwrap();
        assert_eq!(json["type"], "achievement.unlocked");
        assert_eq!(json["key"], "a");
    }
}
