//! Poster and trailer renderers for movie records.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use reqwest::Url;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::catalog::Movie;
use crate::dom::{Document, Element, NodeId};

pub const NOT_FOUND_POSTER: &str = "/assets/poster-not-found.png";
pub const POSTER_CONTAINER_CLASS: &str = "movie-poster-container";
pub const VIDEO_SOURCE_ID: &str = "videoSource";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrailerInfo {
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
}

impl TrailerInfo {
    fn is_playable(&self) -> bool {
        !self.mime_type.trim().is_empty() && !self.url.trim().is_empty()
    }
}

pub trait TrailerSource: Send + Sync {
    fn trailer(&self, url: &str) -> impl Future<Output = Option<TrailerInfo>> + Send;
}

/// Builds a copy of `container` holding the movie's poster image.
pub fn render_poster(document: &mut Document, container: NodeId, movie: &Movie) -> Option<NodeId> {
    let poster_container = document.clone_shallow(container)?;
    if let Some(element) = document.get_mut(poster_container) {
        element.classes = vec![POSTER_CONTAINER_CLASS.to_owned()];
    }
    let src = movie
        .poster
        .as_deref()
        .map(str::trim)
        .filter(|poster| !poster.is_empty())
        .unwrap_or(NOT_FOUND_POSTER);

    let caption = format!("{} movie poster", movie.title);
    document.append(
        poster_container,
        Element::new("img")
            .with_class("movie-poster")
            .with_attr("crossorigin", "anonymous")
            .with_attr("src", src)
            .with_attr("alt", caption.clone())
            .with_attr("title", caption),
    );
    Some(poster_container)
}

/// Builds a `video` element for the movie's trailer, or nothing when no
/// playable trailer can be resolved.
pub async fn render_trailer<S: TrailerSource>(
    document: &mut Document,
    movie: &Movie,
    source: &S,
) -> Option<NodeId> {
    let trailer_url = movie
        .trailer
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())?;

    let Some(info) = source.trailer(trailer_url).await.filter(TrailerInfo::is_playable) else {
        debug!(movie = %movie.id, "no playable trailer found");
        return None;
    };

    let video = document.create(
        Element::new("video")
            .with_class("video-player")
            .with_attr("tabindex", "-1")
            .with_attr("controls", "")
            .with_attr("loop", "")
            .with_attr("playsinline", ""),
    );
    document.append(
        video,
        Element::new("source")
            .with_attr("id", VIDEO_SOURCE_ID)
            .with_attr("src", info.url)
            .with_attr("type", info.mime_type),
    );
    Some(video)
}

#[derive(Debug, thiserror::Error)]
pub enum TrailerFetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid trailer URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone)]
pub struct HttpTrailerSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTrailerSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Resolves `url` against the API base; absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(url)
    }

    async fn fetch(&self, url: &str) -> Result<TrailerInfo, TrailerFetchError> {
        let url = self.resolve(url)?;
        let info = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<TrailerInfo>()
            .await?;
        Ok(info)
    }
}

impl TrailerSource for HttpTrailerSource {
    async fn trailer(&self, url: &str) -> Option<TrailerInfo> {
        match self.fetch(url).await {
            Ok(info) => Some(info),
            Err(error) => {
                warn!(url = %url, error = %error, "trailer fetch failed");
                None
            }
        }
    }
}

type TrailerSlot = Arc<OnceCell<Option<TrailerInfo>>>;

/// Memoizes a [`TrailerSource`] per trailer URL for the lifetime of the cache.
///
/// Like the hover card content cache, entries are never evicted and failed
/// lookups are remembered.
pub struct CachedTrailerSource<S> {
    source: S,
    slots: Mutex<HashMap<String, TrailerSlot>>,
}

impl<S: TrailerSource> CachedTrailerSource<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, url: &str) -> TrailerSlot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(url.to_owned()).or_default().clone()
    }
}

impl<S: TrailerSource> TrailerSource for CachedTrailerSource<S> {
    async fn trailer(&self, url: &str) -> Option<TrailerInfo> {
        let slot = self.slot(url);
        slot.get_or_init(|| async {
            debug!(url = %url, "fetching trailer");
            self.source.trailer(url).await
        })
        .await
        .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::catalog::Movie;
    use crate::dom::{Document, Element};

    use super::*;

    struct FixedTrailer(Option<TrailerInfo>);

    #[derive(Clone, Default)]
    struct CountingTrailer {
        calls: Arc<AtomicUsize>,
    }

    impl TrailerSource for CountingTrailer {
        async fn trailer(&self, url: &str) -> Option<TrailerInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (url != "/missing").then(|| TrailerInfo {
                mime_type: "video/mp4".to_owned(),
                url: format!("{url}.mp4"),
            })
        }
    }

    impl TrailerSource for FixedTrailer {
        async fn trailer(&self, _url: &str) -> Option<TrailerInfo> {
            self.0.clone()
        }
    }

    fn movie(poster: Option<&str>, trailer: Option<&str>) -> Movie {
        Movie {
            id: "analytical-engine".to_owned(),
            title: "The Analytical Engine".to_owned(),
            poster: poster.map(str::to_owned),
            trailer: trailer.map(str::to_owned),
            cast: Vec::new(),
        }
    }

    fn poster_src(doc: &Document, node: NodeId) -> String {
        let img = doc.first_child(node).expect("poster image exists");
        doc.get(img)
            .and_then(|img| img.attr("src"))
            .expect("src is set")
            .to_owned()
    }

    #[test]
    fn poster_renders_into_copy_of_container() {
        let mut doc = Document::new();
        let container = doc.append(doc.root(), Element::new("figure").with_class("poster"));

        let node = render_poster(&mut doc, container, &movie(Some("/p.jpg"), None))
            .expect("poster renders");

        assert_ne!(node, container);
        let copy = doc.get(node).expect("copy");
        assert_eq!(copy.tag, "figure");
        assert_eq!(copy.classes, [POSTER_CONTAINER_CLASS]);
        assert!(doc.get(container).expect("original").has_class("poster"));
        assert!(doc.get(container).expect("original").children().is_empty());
        assert_eq!(poster_src(&doc, node), "/p.jpg");

        let img = doc.first_child(node).expect("poster image exists");
        let img = doc.get(img).expect("poster image");
        assert!(img.has_class("movie-poster"));
        assert_eq!(img.attr("crossorigin"), Some("anonymous"));
        assert_eq!(img.attr("alt"), Some("The Analytical Engine movie poster"));
        assert_eq!(img.attr("title"), Some("The Analytical Engine movie poster"));
    }

    #[test]
    fn missing_poster_falls_back_to_not_found_image() {
        let mut doc = Document::new();
        let container = doc.append(doc.root(), Element::new("figure"));

        let node = render_poster(&mut doc, container, &movie(None, None)).expect("poster renders");
        assert_eq!(poster_src(&doc, node), NOT_FOUND_POSTER);

        let node =
            render_poster(&mut doc, container, &movie(Some("  "), None)).expect("poster renders");
        assert_eq!(poster_src(&doc, node), NOT_FOUND_POSTER);
    }

    #[tokio::test]
    async fn trailer_renders_video_with_source() {
        let mut doc = Document::new();
        let source = FixedTrailer(Some(TrailerInfo {
            mime_type: "video/mp4".to_owned(),
            url: "/media/engine.mp4".to_owned(),
        }));

        let video = render_trailer(&mut doc, &movie(None, Some("/api/trailers/x")), &source)
            .await
            .expect("video renders");

        let element = doc.get(video).expect("video element");
        assert_eq!(element.tag, "video");
        assert!(element.has_class("video-player"));
        assert_eq!(element.attr("tabindex"), Some("-1"));
        for flag in ["controls", "loop", "playsinline"] {
            assert!(element.attributes.contains_key(flag), "missing {flag}");
        }
        let source_node = doc.first_child(video).expect("source element");
        let source_element = doc.get(source_node).expect("source element");
        assert_eq!(source_element.attr("id"), Some(VIDEO_SOURCE_ID));
        assert_eq!(source_element.attr("src"), Some("/media/engine.mp4"));
        assert_eq!(source_element.attr("type"), Some("video/mp4"));
    }

    #[tokio::test]
    async fn trailer_renders_nothing_without_valid_data() {
        let mut doc = Document::new();
        let valid = FixedTrailer(Some(TrailerInfo {
            mime_type: "video/mp4".to_owned(),
            url: "/m.mp4".to_owned(),
        }));
        assert!(render_trailer(&mut doc, &movie(None, None), &valid).await.is_none());

        let missing = FixedTrailer(None);
        assert!(
            render_trailer(&mut doc, &movie(None, Some("/t")), &missing)
                .await
                .is_none()
        );

        let blank = FixedTrailer(Some(TrailerInfo {
            mime_type: String::new(),
            url: "/m.mp4".to_owned(),
        }));
        assert!(
            render_trailer(&mut doc, &movie(None, Some("/t")), &blank)
                .await
                .is_none()
        );
    }

    #[test]
    fn relative_trailer_urls_resolve_against_base() {
        let source = HttpTrailerSource::new("http://localhost:3000/");
        let resolve = |url: &str| source.resolve(url).expect("url resolves").to_string();
        assert_eq!(resolve("/api/trailers/x"), "http://localhost:3000/api/trailers/x");
        assert_eq!(
            resolve("https://cdn.example.com/t.json"),
            "https://cdn.example.com/t.json"
        );

        assert!(HttpTrailerSource::new("not a url").resolve("/t").is_err());
    }

    #[tokio::test]
    async fn cached_source_fetches_each_url_once() {
        let counting = CountingTrailer::default();
        let cached = CachedTrailerSource::new(counting.clone());

        let first = cached.trailer("/api/trailers/x").await;
        let second = cached.trailer("/api/trailers/x").await;
        assert_eq!(first, second);
        assert_eq!(first.map(|info| info.url).as_deref(), Some("/api/trailers/x.mp4"));

        assert!(cached.trailer("/missing").await.is_none());
        assert!(cached.trailer("/missing").await.is_none());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_trailer_lookups_share_one_fetch() {
        let counting = CountingTrailer::default();
        let cached = CachedTrailerSource::new(counting.clone());

        let (a, b) = tokio::join!(cached.trailer("/t"), cached.trailer("/t"));
        assert_eq!(a, b);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }
}
