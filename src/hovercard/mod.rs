//! Actor hover card: shows a floating preview next to a hovered or focused
//! actor link.
//!
//! [`HoverCard`] owns the document it paints into and the card state, so
//! several independent cards can coexist. The card moves through
//! [`CardPhase::Idle`] → [`CardPhase::Pending`] → [`CardPhase::Shown`] and back
//! to idle when hidden. Activations that are superseded while their content
//! loads never render.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::dom::{Document, NodeId};

pub mod cache;
pub mod geometry;
pub mod profile;
pub mod render;

use self::cache::{ActorKey, ContentFetcher, FragmentCache};
use self::render::{CONTAINER_CLASS, IMG_URL_ATTR, find_container, hide_card, show_card};

pub const DEFAULT_ACTIVATE_DELAY: Duration = Duration::from_millis(250);
pub const DEFAULT_DEACTIVATE_DELAY: Duration = Duration::from_millis(100);
pub const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverCardConfig {
    /// How long a pointer must rest on a target before the card appears.
    pub activate_delay: Duration,
    /// Grace period before a card is dismissed after the pointer leaves.
    pub deactivate_delay: Duration,
}

impl Default for HoverCardConfig {
    fn default() -> Self {
        Self {
            activate_delay: DEFAULT_ACTIVATE_DELAY,
            deactivate_delay: DEFAULT_DEACTIVATE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardPhase {
    #[default]
    Idle,
    Pending,
    Shown,
}

#[derive(Debug, Default)]
pub struct CardState {
    pub current_target: Option<NodeId>,
    /// Element that had focus when the card was activated.
    pub activating_element: Option<NodeId>,
    pub phase: CardPhase,
    pub last_mouse_x: f64,
    deactivate_timer: Option<JoinHandle<()>>,
    /// Bumped whenever a deactivation is scheduled or cancelled; a timer only
    /// acts while its generation is still the latest.
    deactivate_generation: u64,
}

impl CardState {
    pub fn clear_target(&mut self) {
        self.current_target = None;
        self.activating_element = None;
        self.phase = CardPhase::Idle;
    }

    fn cancel_deactivation(&mut self) {
        self.deactivate_generation = self.deactivate_generation.wrapping_add(1);
        if let Some(timer) = self.deactivate_timer.take() {
            timer.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Mouse,
    Keyboard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverEvent {
    pub source: InputSource,
    pub target: NodeId,
    /// Horizontal pointer position for mouse events.
    pub client_x: Option<f64>,
    /// For pointer leave events, the element the pointer moved to.
    pub related_target: Option<NodeId>,
    pub key: Option<String>,
}

impl HoverEvent {
    pub fn mouse(target: NodeId, client_x: f64) -> Self {
        Self {
            source: InputSource::Mouse,
            target,
            client_x: Some(client_x),
            related_target: None,
            key: None,
        }
    }

    pub fn mouse_leave(target: NodeId, related_target: Option<NodeId>) -> Self {
        Self {
            source: InputSource::Mouse,
            target,
            client_x: None,
            related_target,
            key: None,
        }
    }

    pub fn keyboard(target: NodeId) -> Self {
        Self {
            source: InputSource::Keyboard,
            target,
            client_x: None,
            related_target: None,
            key: None,
        }
    }

    pub fn key_up(target: NodeId, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::keyboard(target)
        }
    }
}

/// Page-level input the card listens to.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    MouseMove { x: f64 },
    TargetMouseOver(HoverEvent),
    TargetMouseOut(HoverEvent),
    TargetFocus(HoverEvent),
    CardMouseEnter,
    CardMouseLeave(HoverEvent),
    KeyUp(HoverEvent),
}

struct Shared {
    document: Document,
    state: CardState,
}

struct Inner<F> {
    shared: Mutex<Shared>,
    cache: FragmentCache<F>,
    config: HoverCardConfig,
}

pub struct HoverCard<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for HoverCard<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ContentFetcher + 'static> HoverCard<F> {
    pub fn new(document: Document, fetcher: F, config: HoverCardConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    document,
                    state: CardState::default(),
                }),
                cache: FragmentCache::new(fetcher),
                config,
            }),
        }
    }

    pub fn config(&self) -> HoverCardConfig {
        self.inner.config
    }

    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.lock().document)
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.lock().state.current_target
    }

    pub fn activating_element(&self) -> Option<NodeId> {
        self.lock().state.activating_element
    }

    pub fn phase(&self) -> CardPhase {
        self.lock().state.phase
    }

    pub async fn dispatch(&self, event: PageEvent) {
        match event {
            PageEvent::MouseMove { x } => self.handle_mouse_move(x),
            PageEvent::TargetMouseOver(event) => self.activate_with_timeout(&event).await,
            PageEvent::TargetFocus(event) => self.activate(&event, Duration::ZERO).await,
            PageEvent::TargetMouseOut(event) | PageEvent::CardMouseLeave(event) => {
                self.deactivate_with_timeout(&event)
            }
            PageEvent::CardMouseEnter => self.cancel_deactivation(),
            PageEvent::KeyUp(event) => self.handle_key_up(&event),
        }
    }

    pub fn handle_mouse_move(&self, x: f64) {
        self.lock().state.last_mouse_x = x;
    }

    /// Shows the card for the target under `event` once its content has loaded
    /// and at least `minimum_delay` has passed.
    pub async fn activate(&self, event: &HoverEvent, minimum_delay: Duration) {
        let (target, key) = {
            let mut shared = self.lock();
            let Shared { document, state } = &mut *shared;

            if let Some(x) = event.client_x {
                state.last_mouse_x = x;
            }
            let Some(target) = document.closest_with_attr(event.target, IMG_URL_ATTR) else {
                return;
            };
            if state.current_target == Some(target) {
                return;
            }
            if document
                .closest_with_class(event.target, CONTAINER_CLASS)
                .is_some()
            {
                return;
            }

            hide_card(document, state);
            state.current_target = Some(target);
            state.activating_element = document.focused();
            state.phase = CardPhase::Pending;
            (target, actor_key(document, target))
        };

        let (content, ()) = tokio::join!(self.inner.cache.get(&key), sleep(minimum_delay));

        let mut shared = self.lock();
        let Shared { document, state } = &mut *shared;
        if state.current_target != Some(target) {
            debug!(actor = %key.name, "discarding superseded hover card activation");
            return;
        }
        let Some(content) = content else {
            debug!(actor = %key.name, "no hover card content available");
            return;
        };

        if show_card(document, &content, target, state.last_mouse_x).is_none() {
            return;
        }
        state.phase = CardPhase::Shown;
        debug!(actor = %key.name, "hover card shown");

        if event.source == InputSource::Keyboard
            && let Some(container) = find_container(document)
        {
            document.focus(container);
        }
    }

    pub async fn activate_with_timeout(&self, event: &HoverEvent) {
        self.activate(event, self.inner.config.activate_delay).await;
    }

    pub fn deactivate(&self, event: &HoverEvent) {
        let mut shared = self.lock();
        deactivate_locked(&mut shared, event);
    }

    /// Schedules a deactivation that only fires if the card still belongs to
    /// the target that was current when it was scheduled.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn deactivate_with_timeout(&self, event: &HoverEvent) {
        let mut shared = self.lock();
        shared.state.cancel_deactivation();

        let generation = shared.state.deactivate_generation;
        let captured = shared.state.current_target;
        let delay = self.inner.config.deactivate_delay;
        let card = self.clone();
        let event = event.clone();
        let timer = tokio::spawn(async move {
            sleep(delay).await;
            let mut shared = card.lock();
            fire_deactivation(&mut shared, generation, captured, &event);
        });
        shared.state.deactivate_timer = Some(timer);
    }

    pub fn cancel_deactivation(&self) {
        self.lock().state.cancel_deactivation();
    }

    pub fn handle_key_up(&self, event: &HoverEvent) {
        if event.key.as_deref() == Some(ESCAPE_KEY) {
            self.deactivate(event);
        }
    }

    pub fn hide_card(&self) {
        let mut shared = self.lock();
        let Shared { document, state } = &mut *shared;
        hide_card(document, state);
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn fire_deactivation(
    shared: &mut Shared,
    generation: u64,
    captured: Option<NodeId>,
    event: &HoverEvent,
) {
    if shared.state.deactivate_generation != generation {
        return;
    }
    shared.state.deactivate_timer = None;
    if shared.state.current_target == captured {
        deactivate_locked(shared, event);
    }
}

fn deactivate_locked(shared: &mut Shared, event: &HoverEvent) {
    let Shared { document, state } = shared;
    if state.current_target.is_none() {
        return;
    }

    match event.source {
        InputSource::Mouse => {
            if let Some(related) = event.related_target {
                let stays_on_card = document.closest_with_class(related, CONTAINER_CLASS).is_some()
                    || document.closest_with_attr(related, IMG_URL_ATTR).is_some();
                if stays_on_card {
                    return;
                }
            }
        }
        InputSource::Keyboard => {
            if let Some(element) = state.activating_element {
                document.focus(element);
            }
        }
    }

    hide_card(document, state);
}

fn actor_key(document: &Document, target: NodeId) -> ActorKey {
    let element = document.get(target);
    let attr = |name: &str| {
        element
            .and_then(|element| element.attr(name))
            .unwrap_or_default()
            .to_owned()
    };
    ActorKey::new(
        document.text_content(target).trim(),
        attr("href"),
        attr(IMG_URL_ATTR),
    )
}
