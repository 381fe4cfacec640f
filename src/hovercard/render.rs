use tracing::debug;

use crate::dom::{Document, Element, NodeId};

use super::CardState;
use super::cache::Fragment;
use super::geometry::{PlacementInput, Position, Quadrant, compute_position};

pub const CONTAINER_CLASS: &str = "hover-card-container";
/// Class given to the body element when the page does not provide one.
pub const CARD_BODY_CLASS: &str = "hover-card-body";
pub const MESSAGE_CLASS_PREFIX: &str = "hover-card-message--";
pub const IMG_URL_ATTR: &str = "data-hovercard-img-url";
pub const Z_INDEX_OVERRIDE_ATTR: &str = "data-hovercard-z-index-override";
pub const DEFAULT_Z_INDEX: i32 = 100;

pub fn find_container(document: &Document) -> Option<NodeId> {
    document.find_by_class(CONTAINER_CLASS)
}

pub fn message_class(quadrant: Quadrant) -> String {
    format!("{MESSAGE_CLASS_PREFIX}{quadrant}")
}

/// The container's first child, which holds the card content.
fn card_body(document: &mut Document, container: NodeId) -> NodeId {
    match document.first_child(container) {
        Some(body) => body,
        None => document.append(container, Element::new("div").with_class(CARD_BODY_CLASS)),
    }
}

/// Places the container next to `target` and reveals it.
pub fn position_card(
    document: &mut Document,
    target: NodeId,
    container: NodeId,
    mouse_x: f64,
) -> Option<Position> {
    document.set_style(container, "display", "none");

    let body = document.first_child(container);
    let message_nodes = body
        .and_then(|body| document.get(body))
        .map(|body| body.children().to_vec())
        .unwrap_or_default();
    for node in &message_nodes {
        document.remove_classes_with_prefix(*node, MESSAGE_CLASS_PREFIX);
    }

    let card = document.get(container)?.bounding_rect();
    let target_element = document.get(target)?;
    let position = compute_position(PlacementInput {
        client_rects: &target_element.client_rects,
        bounding_rect: target_element.bounding_rect(),
        card_width: card.width,
        card_height: card.height,
        viewport_width: document.viewport.width,
        mouse_x,
    });
    let z_index = z_index_for(target_element);

    let class = message_class(position.quadrant);
    for node in &message_nodes {
        document.add_class(*node, &class);
    }

    let page_top = position.top + document.viewport.scroll_y;
    let page_left = position.left + document.viewport.scroll_x;
    document.set_style(container, "top", format!("{page_top}px"));
    document.set_style(container, "left", format!("{page_left}px"));
    document.set_style(container, "z-index", z_index.to_string());
    document.remove_style(container, "display");

    Some(position)
}

/// Copies `fragment` into the card container and positions it; no-op without a container.
pub fn show_card(
    document: &mut Document,
    fragment: &Fragment,
    target: NodeId,
    mouse_x: f64,
) -> Option<Position> {
    let Some(container) = find_container(document) else {
        debug!("hover card container missing; skipping show");
        return None;
    };

    let body = card_body(document, container);
    document.clear_children(body);
    let wrapper = document.append(body, Element::new("div"));
    for child in &fragment.children {
        document.instantiate(wrapper, child);
    }

    position_card(document, target, container, mouse_x)
}

pub fn hide_card(document: &mut Document, state: &mut CardState) {
    if let Some(container) = find_container(document) {
        document.set_style(container, "display", "none");
        if let Some(body) = document.first_child(container) {
            document.clear_children(body);
        }
    }
    state.clear_target();
}

fn z_index_for(target: &Element) -> i32 {
    target
        .attr(Z_INDEX_OVERRIDE_ATTR)
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .unwrap_or(DEFAULT_Z_INDEX)
}
