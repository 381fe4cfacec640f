use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::dom::NodeSpec;

/// Identity of one actor card: display name, linked page and avatar image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorKey {
    pub name: String,
    pub page_url: String,
    pub image_url: String,
}

impl ActorKey {
    pub fn new(
        name: impl Into<String>,
        page_url: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            page_url: page_url.into(),
            image_url: image_url.into(),
        }
    }
}

/// Renderable card content. Never inserted directly: the card renderer
/// builds fresh nodes from it each time it is shown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub children: Vec<NodeSpec>,
}

impl Fragment {
    pub fn new(children: Vec<NodeSpec>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

pub trait ContentFetcher: Send + Sync {
    /// Resolves card content for `key`; `None` when nothing could be loaded.
    fn fetch(&self, key: &ActorKey) -> impl Future<Output = Option<Fragment>> + Send;
}

type Slot = Arc<OnceCell<Option<Arc<Fragment>>>>;

/// Memoizes a [`ContentFetcher`] per [`ActorKey`] for the lifetime of the cache.
///
/// Entries are never evicted. Actor lists are small and closed, so growth is
/// bounded by the catalog. Callers racing on the same key share one fetch, and
/// an empty result is remembered like any other.
pub struct FragmentCache<F> {
    fetcher: F,
    slots: Mutex<HashMap<ActorKey, Slot>>,
}

impl<F: ContentFetcher> FragmentCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &ActorKey) -> Option<Arc<Fragment>> {
        let slot = self.slot(key);
        slot.get_or_init(|| async {
            debug!(actor = %key.name, "fetching hover card content");
            self.fetcher
                .fetch(key)
                .await
                .filter(|fragment| !fragment.is_empty())
                .map(Arc::new)
        })
        .await
        .clone()
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &ActorKey) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(key.clone()).or_default().clone()
    }
}
