//! In-memory key-value stores for testing.

use super::{KeyStream, KeyValueStore, OpenOptions, StoreHandle, StoreOpener, StoredValue};
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use async_trait::async_trait;
use exn::OptionExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory key-value store. Keys are listed in sorted order.
///
/// # Examples
///
/// ```
/// use kvdrive_storage::{KeyValueStore, MockStore, StoredValue};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_values([("a", StoredValue::Text("one".to_string()))]);
/// assert_eq!(store.keys().await?, vec!["a".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockStore {
    name: String,
    values: BTreeMap<String, StoredValue>,
    read_delays: HashMap<String, Duration>,
    reads: AtomicUsize,
}
impl MockStore {
    pub fn with_values(values: impl IntoIterator<Item = (impl Into<String>, StoredValue)>) -> Self {
        Self {
            name: "mock".to_string(),
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            read_delays: HashMap::new(),
            reads: AtomicUsize::new(0),
        }
    }

    /// Latency applied to every read of one key.
    pub fn with_read_delay(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.read_delays.insert(key.into(), delay);
        self
    }

    /// Number of `get_value` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys_stream(&self) -> KeyStream<'_> {
        Box::pin(stream! {
            for key in self.values.keys() {
                yield Ok(key.clone());
            }
        })
    }

    async fn get_value(&self, key: &str) -> Result<Option<StoredValue>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.values.get(key).cloned())
    }
}

/// In-memory set of named stores, recording every open request.
#[derive(Default)]
pub struct MockStores {
    stores: HashMap<String, Arc<MockStore>>,
    opened: Mutex<Vec<(String, OpenOptions)>>,
}
impl MockStores {
    pub fn with_store(mut self, id_or_name: impl Into<String>, mut store: MockStore) -> Self {
        let id_or_name = id_or_name.into();
        store.name = id_or_name.clone();
        self.stores.insert(id_or_name, Arc::new(store));
        self
    }

    /// Shared handle to a registered store, for inspecting reads.
    pub fn store(&self, id_or_name: &str) -> Option<Arc<MockStore>> {
        self.stores.get(id_or_name).cloned()
    }

    pub async fn opened(&self) -> Vec<(String, OpenOptions)> {
        self.opened.lock().await.clone()
    }
}

#[async_trait]
impl StoreOpener for MockStores {
    async fn open(&self, id_or_name: &str, options: OpenOptions) -> Result<StoreHandle> {
        self.opened.lock().await.push((id_or_name.to_string(), options));
        let store = self
            .stores
            .get(id_or_name)
            .cloned()
            .ok_or_raise(|| ErrorKind::StoreNotFound(id_or_name.to_string()))?;
        Ok(store)
    }
}
