//! Recently emitted stimuli per history key.
//!
//! The window for a key is fed back into the next prompt as an exclusion
//! list so consecutive sessions do not repeat themselves.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use stimulus_core::HistoryKey;

/// Entries kept per key unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 40;

/// Storage for recently emitted labels.
pub trait HistoryStore: Send + Sync {
    /// Most recent first. Unknown keys yield an empty list.
    fn get(&self, key: &HistoryKey) -> Vec<String>;

    /// Record a batch in emission order, keeping only the newest entries.
    fn append(&self, key: &HistoryKey, labels: &[String]);
}

/// Process-local history with one lock per key.
#[derive(Debug)]
pub struct InMemoryHistory {
    capacity: usize,
    windows: RwLock<HashMap<HistoryKey, Arc<Mutex<VecDeque<String>>>>>,
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero capacity is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys with at least one recorded append.
    pub fn keys(&self) -> Vec<HistoryKey> {
        let mut keys: Vec<HistoryKey> = self.windows.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of entries stored for `key`.
    pub fn len(&self, key: &HistoryKey) -> usize {
        self.window(key).map_or(0, |w| w.lock().len())
    }

    pub fn is_empty(&self, key: &HistoryKey) -> bool {
        self.len(key) == 0
    }

    fn window(&self, key: &HistoryKey) -> Option<Arc<Mutex<VecDeque<String>>>> {
        self.windows.read().get(key).cloned()
    }

    fn window_or_insert(&self, key: &HistoryKey) -> Arc<Mutex<VecDeque<String>>> {
        if let Some(window) = self.window(key) {
            return window;
        }
        self.windows
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(self.capacity))))
            .clone()
    }
}

impl HistoryStore for InMemoryHistory {
    fn get(&self, key: &HistoryKey) -> Vec<String> {
        self.window(key)
            .map(|w| w.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    fn append(&self, key: &HistoryKey, labels: &[String]) {
        if labels.is_empty() {
            return;
        }

        let window = self.window_or_insert(key);
        let mut window = window.lock();
        // Prepend in reverse so the batch keeps emission order at the front.
        for label in labels.iter().rev() {
            window.push_front(label.clone());
        }
        window.truncate(self.capacity);
    }
}
