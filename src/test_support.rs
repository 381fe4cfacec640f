use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::dom::{Element, NodeSpec};
use crate::hovercard::cache::{ActorKey, ContentFetcher, Fragment};

pub fn temp_path(prefix: &str) -> PathBuf {
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "marquee_{prefix}_{}_{}",
        std::process::id(),
        now_ns
    ))
}

pub fn remove_file_if_exists(path: &Path) {
    let _ = std::fs::remove_file(path);
}

pub const SAMPLE_CATALOG_YAML: &str = r#"
movies:
  - id: analytical-engine
    title: The Analytical Engine
    poster: /posters/analytical-engine.jpg
    trailer: /api/trailers/analytical-engine
    cast: [Ada Lovelace, Charles Babbage]
  - id: compiler
    title: The Compiler
    cast: [Grace Hopper]
actors:
  - name: Ada Lovelace
    image_url: /img/ada.jpg
    page_url: /actors/ada-lovelace
    biography: Wrote the first published algorithm.
    known_for: [The Analytical Engine]
  - name: Charles Babbage
    image_url: /img/babbage.jpg
    page_url: /actors/charles-babbage
  - name: Grace Hopper
    image_url: /img/grace.jpg
    page_url: /actors/grace-hopper
trailers:
  - id: analytical-engine
    type: video/mp4
    url: /media/analytical-engine.mp4
"#;

/// Content fetcher that answers from the key alone and counts calls.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    calls: Arc<AtomicUsize>,
    empty: Arc<AtomicBool>,
}

impl StaticFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }
}

impl ContentFetcher for StaticFetcher {
    async fn fetch(&self, key: &ActorKey) -> Option<Fragment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.empty.load(Ordering::SeqCst) {
            return None;
        }
        Some(Fragment::new(vec![
            NodeSpec::new(Element::new("div").with_class("hover-card-message"))
                .with_child(NodeSpec::new(
                    Element::new("img").with_attr("src", key.image_url.clone()),
                ))
                .with_child(NodeSpec::new(
                    Element::new("p").with_text(key.name.clone()),
                )),
        ]))
    }
}
