//! Shared replay-latest subscriptions keyed by cache key or entity id.
//!
//! The first subscriber for a key starts one pump task that drives the
//! underlying store stream into a single-slot `watch` channel. Later
//! subscribers attach to the same slot and receive the latest value
//! immediately. When the last subscriber goes away the pump stops and the
//! store listener is released.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

type Slot<T> = Arc<watch::Sender<Option<T>>>;
type Feeds<K, T> = Arc<Mutex<HashMap<K, Slot<T>>>>;

pub struct FeedRegistry<K, T> {
    feeds: Feeds<K, T>,
}

impl<K, T> Clone for FeedRegistry<K, T> {
    fn clone(&self) -> Self {
        Self {
            feeds: Arc::clone(&self.feeds),
        }
    }
}

impl<K, T> Debug for FeedRegistry<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedRegistry")
            .field("active", &self.feeds.lock().len())
            .finish()
    }
}

impl<K, T> Default for FeedRegistry<K, T> {
    fn default() -> Self {
        Self {
            feeds: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> FeedRegistry<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a running pump.
    pub fn len(&self) -> usize {
        self.feeds.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to `key`, starting `source` only if no feed is running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F, S>(&self, key: K, source: F) -> BoxStream<'static, T>
    where
        F: FnOnce() -> S,
        S: Stream<Item = T> + Send + 'static,
    {
        let mut feeds = self.feeds.lock();
        let rx = match feeds.get(&key) {
            Some(slot) => slot.subscribe(),
            None => {
                let (tx, rx) = watch::channel(None);
                let slot = Arc::new(tx);
                feeds.insert(key.clone(), Arc::clone(&slot));
                debug!(?key, "Starting feed");
                tokio::spawn(pump(
                    key,
                    slot,
                    source(),
                    Arc::clone(&self.feeds),
                ));
                rx
            }
        };
        drop(feeds);

        WatchStream::new(rx)
            .filter_map(|value| async move { value })
            .boxed()
    }
}

async fn pump<K, T, S>(key: K, slot: Slot<T>, source: S, feeds: Feeds<K, T>)
where
    K: Eq + Hash + Debug,
    T: PartialEq,
    S: Stream<Item = T>,
{
    let mut source = std::pin::pin!(source);
    loop {
        tokio::select! {
            next = source.next() => match next {
                Some(value) => {
                    slot.send_if_modified(|current| {
                        if current.as_ref() == Some(&value) {
                            false
                        } else {
                            *current = Some(value);
                            true
                        }
                    });
                }
                None => break,
            },
            _ = slot.closed() => {
                // Subscribers attach under this lock, so the count is stable
                let mut feeds = feeds.lock();
                if slot.receiver_count() > 0 {
                    continue;
                }
                remove_if_current(&mut feeds, &key, &slot);
                debug!(?key, "Feed stopped; no subscribers left");
                return;
            }
        }
    }

    remove_if_current(&mut feeds.lock(), &key, &slot);
    debug!(?key, "Feed source ended");
}

fn remove_if_current<K: Eq + Hash, T>(
    feeds: &mut HashMap<K, Slot<T>>,
    key: &K,
    slot: &Slot<T>,
) {
    if feeds.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
        feeds.remove(key);
    }
}
