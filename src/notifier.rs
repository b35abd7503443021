use std::{
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, RwLock,
    },
    thread::{self, JoinHandle},
};

/// Sent to subscribers after a write to a collection succeeds. Keys are the
/// logical collection keys, without the store namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Saved { key: String, count: usize },
    Appended { key: String, id: Option<String> },
    Updated { key: String, id: String },
    Removed { key: String, ids: Vec<String> },
    KeyRemoved { key: String },
}

impl StoreEvent {
    pub fn key(&self) -> &str {
        match self {
            StoreEvent::Saved { key, .. }
            | StoreEvent::Appended { key, .. }
            | StoreEvent::Updated { key, .. }
            | StoreEvent::Removed { key, .. }
            | StoreEvent::KeyRemoved { key } => key,
        }
    }
}

/// Fan-out of events to any number of channel receivers. Receivers that
/// have been dropped are pruned on the next notify.
#[derive(Clone)]
pub struct Notifier<Event: Send + Sync + Clone + 'static> {
    senders: Arc<RwLock<Vec<Sender<Event>>>>,
}

impl<Event: Send + Sync + Clone + 'static> Notifier<Event> {
    pub fn new() -> Self {
        Self {
            senders: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn notify(&self, event: Event) {
        let mut senders = self.senders.write().unwrap_or_else(|e| e.into_inner());
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn observer(&self) -> Receiver<Event> {
        let (tx, rx) = channel();
        self.senders
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Calls `callback` for every event on a background thread. The thread
    /// ends when the notifier and all its clones are dropped.
    pub fn observe(&self, mut callback: impl FnMut(Event) + Send + 'static) -> JoinHandle<()> {
        let rx = self.observer();
        thread::spawn(move || {
            rx.iter().for_each(|e| callback(e));
        })
    }
}

impl<Event: Send + Sync + Clone + 'static> Default for Notifier<Event> {
    fn default() -> Self {
        Self::new()
    }
}
