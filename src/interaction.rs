//! Small DOM helpers for the pointer interaction layer.

use wasm_bindgen::JsCast;
use web_sys::{Element, EventTarget, HtmlElement};

/// Overlay controls marked with this attribute swallow pointer gestures.
pub const FILTER_UI_SELECTOR: &str = "[data-filter-ui=\"true\"]";

/// Whether an event target sits inside a floating control overlay.
pub fn targets_overlay(target: Option<EventTarget>) -> bool {
    let Some(element) = target.and_then(|t| t.dyn_into::<Element>().ok()) else {
        return false;
    };
    matches!(element.closest(FILTER_UI_SELECTOR), Ok(Some(_)))
}

/// Cursor to restore once a drag ends: the hover affordance when the pointer
/// is still over the viewport, nothing otherwise.
pub fn cursor_after_drag(is_hovering: bool) -> &'static str {
    if is_hovering {
        "grab"
    } else {
        ""
    }
}

/// Set or clear the inline cursor on an element. An empty value removes the
/// property so the stylesheet cursor shows through again.
pub fn set_cursor(element: &HtmlElement, cursor: &str) {
    let style = element.style();
    let result = if cursor.is_empty() {
        style.remove_property("cursor").map(|_| ())
    } else {
        style.set_property("cursor", cursor)
    };
    if let Err(err) = result {
        log::warn!("cursor style update failed: {err:?}");
    }
}

/// Toggle the page-wide dragging class so the grab cursor survives the
/// pointer leaving the viewport mid-drag.
pub fn set_page_dragging(dragging: bool) {
    let Some(body) = web_sys::window().and_then(|w| w.document()).and_then(|d| d.body()) else {
        return;
    };
    if let Err(err) = body
        .class_list()
        .toggle_with_force("cursor-grabbing", dragging)
    {
        log::warn!("body class toggle failed: {err:?}");
    }
}
