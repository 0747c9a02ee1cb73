//! The interactive image viewport: translates pointer and wheel gestures into
//! transform updates, drives progressive loads on selection changes, and keeps
//! the renderer's viewport geometry current.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement, KeyboardEvent, PointerEvent, WheelEvent};

use crate::api;
use crate::dispatcher::TransformDispatcher;
use crate::interaction::{cursor_after_drag, set_cursor, set_page_dragging, targets_overlay};
use crate::loader::LoadCoordinator;
use crate::state::AppState;
use crate::transform;
use crate::viewport_sync::{self, GeometrySync};

#[component]
pub fn InteractionViewport() -> impl IntoView {
    let state = expect_context::<AppState>();
    let viewport_ref = NodeRef::<leptos::html::Div>::new();

    let coordinator = LoadCoordinator::new();
    let dispatcher = TransformDispatcher::new();
    let sync: Rc<RefCell<Option<GeometrySync>>> = Rc::new(RefCell::new(None));

    // Drag bookkeeping: last pointer position in client coordinates while a
    // primary-button drag is active, and whether the pointer is over the
    // viewport (drives the cursor restored when a drag ends).
    let last_pointer: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);
    let is_hovering = RwSignal::new(false);

    // Memoized so signal notifications that leave the selected path unchanged
    // (a folder relist, say) do not re-run the selection machinery: the reset
    // and the load must happen only when the path itself changes.
    let current_path = Memo::new(move |_| state.current_path());

    // Attach the geometry synchronizer once the element exists.
    {
        let sync = Rc::clone(&sync);
        Effect::new(move || {
            let Some(div) = viewport_ref.get() else {
                return;
            };
            if sync.borrow().is_some() {
                return;
            }
            let element: Element = div.into();
            *sync.borrow_mut() = GeometrySync::attach(element);
        });
    }

    // Selection changes reset the transform and kick off a progressive load.
    {
        let coordinator = coordinator.clone();
        Effect::new(move || {
            let Some(path) = current_path.get() else {
                return;
            };
            state.reset_transform(None);

            let proxy = state.best_proxy_untracked(&path);
            let geometry = viewport_ref
                .get_untracked()
                .and_then(|div| {
                    let element: Element = div.into();
                    viewport_sync::measure(&element)
                })
                .unwrap_or(crate::types::ViewportGeometry {
                    x: 0.0,
                    y: 0.0,
                    width: 0.0,
                    height: 0.0,
                });
            coordinator.select(&path, proxy.as_deref(), geometry, js_sys::Date::now());

            // Warm the proxy caches for this image in the background.
            if state
                .thumbnails
                .with_untracked(|map| !map.contains_key(&path))
            {
                let thumb_path = path.clone();
                spawn_local(async move {
                    match api::get_thumbnail(&thumb_path).await {
                        Ok(thumbnail) => state.thumbnails.update(|map| {
                            map.insert(thumb_path, thumbnail);
                        }),
                        Err(err) => log::warn!("get_thumbnail failed for {thumb_path}: {err:?}"),
                    }
                });
            }
            if state.previews.with_untracked(|map| !map.contains_key(&path)) {
                let preview_path = path.clone();
                spawn_local(async move {
                    match api::prepare_preview(&preview_path).await {
                        Ok(preview) => state.previews.update(|map| {
                            map.insert(preview_path, preview);
                        }),
                        Err(err) => {
                            log::warn!("prepare_preview failed for {preview_path}: {err:?}")
                        }
                    }
                });
            }
        });
    }

    // A better proxy arriving for the displayed image hot-swaps its texture.
    {
        let coordinator = coordinator.clone();
        Effect::new(move || {
            let Some(path) = current_path.get() else {
                return;
            };
            if let Some(proxy) = state.best_proxy(&path) {
                coordinator.proxy_ready(&path, &proxy);
            }
        });
    }

    // Forward transform changes to the renderer, batched per frame.
    {
        let dispatcher = dispatcher.clone();
        Effect::new(move || {
            let transform = state.transform.get();
            if state.has_image_untracked() {
                dispatcher.push(transform);
            }
        });
    }

    let on_pointer_down = move |ev: PointerEvent| {
        if ev.button() != 0 || !state.has_image_untracked() {
            return;
        }
        if targets_overlay(ev.target()) {
            return;
        }
        ev.prevent_default();
        let Some(div) = viewport_ref.get_untracked() else {
            return;
        };
        if let Err(err) = div.set_pointer_capture(ev.pointer_id()) {
            log::warn!("pointer capture failed: {err:?}");
        }
        last_pointer.set(Some((ev.client_x() as f64, ev.client_y() as f64)));
        let element: HtmlElement = div.into();
        set_cursor(&element, "grabbing");
        set_page_dragging(true);
    };

    let on_pointer_move = move |ev: PointerEvent| {
        let Some((last_x, last_y)) = last_pointer.get_untracked() else {
            return;
        };
        let Some(div) = viewport_ref.get_untracked() else {
            return;
        };
        let x = ev.client_x() as f64;
        let y = ev.client_y() as f64;
        last_pointer.set(Some((x, y)));

        let width = div.client_width() as f64;
        let height = div.client_height() as f64;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let next = transform::drag_pan(
            state.transform.get_untracked(),
            x - last_x,
            y - last_y,
            width,
            height,
        );
        state.apply_transform(next);
    };

    // Up and cancel end the drag the same way.
    let end_drag = move |ev: PointerEvent| {
        if last_pointer.get_untracked().is_none() {
            return;
        }
        last_pointer.set(None);
        set_page_dragging(false);
        if let Some(div) = viewport_ref.get_untracked() {
            let _ = div.release_pointer_capture(ev.pointer_id());
            let element: HtmlElement = div.into();
            let hovering = is_hovering.get_untracked() && state.has_image_untracked();
            set_cursor(&element, cursor_after_drag(hovering));
        }
    };

    let on_pointer_enter = move |_ev: PointerEvent| {
        is_hovering.set(true);
        if !state.has_image_untracked() || last_pointer.get_untracked().is_some() {
            return;
        }
        if let Some(div) = viewport_ref.get_untracked() {
            let element: HtmlElement = div.into();
            set_cursor(&element, "grab");
        }
    };

    // Capture keeps move/up events flowing mid-drag, so leave only records
    // the hover state and clears the hover cursor.
    let on_pointer_leave = move |_ev: PointerEvent| {
        is_hovering.set(false);
        if last_pointer.get_untracked().is_some() {
            return;
        }
        if let Some(div) = viewport_ref.get_untracked() {
            let element: HtmlElement = div.into();
            set_cursor(&element, "");
        }
    };

    let on_wheel = move |ev: WheelEvent| {
        if !state.has_image_untracked() || targets_overlay(ev.target()) {
            return;
        }
        ev.prevent_default();
        let Some(div) = viewport_ref.get_untracked() else {
            return;
        };
        let current = state.transform.get_untracked();
        let next = if ev.ctrl_key() || ev.meta_key() {
            let rect = div.get_bounding_client_rect();
            if rect.width() <= 0.0 || rect.height() <= 0.0 {
                return;
            }
            let (cx, cy) = transform::normalized_cursor(
                ev.client_x() as f64,
                ev.client_y() as f64,
                rect.left(),
                rect.top(),
                rect.width(),
                rect.height(),
            );
            transform::zoom_at_cursor(current, cx, cy, transform::zoom_factor(ev.delta_y()))
        } else {
            let width = div.client_width() as f64;
            let height = div.client_height() as f64;
            if width <= 0.0 || height <= 0.0 {
                return;
            }
            transform::wheel_pan(current, ev.delta_x(), ev.delta_y(), width, height)
        };
        state.apply_transform(next);
    };

    // Arrow-key navigation listens on the window so it works without focus
    // on the viewport itself.
    let keydown: Rc<Closure<dyn FnMut(KeyboardEvent)>> =
        Rc::new(Closure::new(move |ev: KeyboardEvent| match ev.key().as_str() {
            "ArrowLeft" => {
                ev.prevent_default();
                state.select_delta(-1);
            }
            "ArrowRight" => {
                ev.prevent_default();
                state.select_delta(1);
            }
            _ => {}
        }));
    if let Some(window) = web_sys::window() {
        if let Err(err) = window
            .add_event_listener_with_callback("keydown", keydown.as_ref().as_ref().unchecked_ref())
        {
            log::warn!("keydown listener registration failed: {err:?}");
        }
    }

    {
        let sync = Rc::clone(&sync);
        let coordinator = coordinator.clone();
        let dispatcher = dispatcher.clone();
        let keydown = Rc::clone(&keydown);
        // `on_cleanup` demands `Send + Sync`, but these captures are all
        // single-threaded wasm types; `SendWrapper` asserts that the cleanup
        // runs on the thread that created it.
        let cleanup = send_wrapper::SendWrapper::new(move || {
            if let Some(sync) = sync.borrow_mut().take() {
                sync.detach();
            }
            coordinator.teardown();
            dispatcher.reset();
            set_page_dragging(false);
            if let Some(div) = viewport_ref.get_untracked() {
                let element: HtmlElement = div.into();
                set_cursor(&element, "");
            }
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "keydown",
                    keydown.as_ref().as_ref().unchecked_ref(),
                );
            }
        });
        on_cleanup(move || cleanup.take()());
    }

    let empty_message = move || {
        if state.images.with(Vec::is_empty) {
            "No folder selected. Pick a folder to start."
        } else {
            "Select an image to view."
        }
    };

    view! {
        <div
            class="viewport"
            node_ref=viewport_ref
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=end_drag
            on:pointercancel=end_drag
            on:pointerenter=on_pointer_enter
            on:pointerleave=on_pointer_leave
            on:wheel=on_wheel
        >
            {move || {
                if state.has_image() {
                    view! {
                        <div class="viewport-overlay" data-filter-ui="true">
                            <ZoomReadout />
                        </div>
                    }
                    .into_any()
                } else {
                    view! { <div class="empty-state">{empty_message}</div> }.into_any()
                }
            }}
        </div>
    }
}

/// Current zoom as a percentage, with a click-to-reset affordance.
#[component]
fn ZoomReadout() -> impl IntoView {
    let state = expect_context::<AppState>();
    let percent = move || format!("{:.0}%", state.transform.get().scale * 100.0);

    view! {
        <button class="zoom-readout" on:click=move |_| state.reset_transform(None)>
            {percent}
        </button>
    }
}
