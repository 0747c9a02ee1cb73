//! Keeps the renderer's notion of the viewport rectangle in sync with the DOM.
//!
//! Resize and capture-phase scroll events both funnel into one debounced
//! dispatch; the geometry is re-measured from the element at dispatch time so
//! a stale rect can never be sent.

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, ResizeObserver};

use crate::api;
use crate::timers::DebouncedTask;
use crate::types::ViewportGeometry;

/// How long layout must stay quiet before the renderer is told about it.
pub const VIEWPORT_DEBOUNCE_MS: i32 = 100;

/// Measure an element's draw rectangle in device pixels.
pub fn measure(element: &Element) -> Option<ViewportGeometry> {
    let ratio = web_sys::window()?.device_pixel_ratio();
    let rect = element.get_bounding_client_rect();
    Some(ViewportGeometry::from_client_rect(
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height(),
        ratio,
    ))
}

/// Observes one element for geometry changes and forwards them, debounced, to
/// the renderer. Dropped or detached, it stops listening and fires nothing.
pub struct GeometrySync {
    task: Rc<DebouncedTask>,
    observer: ResizeObserver,
    scroll_cb: Closure<dyn FnMut(web_sys::Event)>,
    _resize_cb: Closure<dyn FnMut(js_sys::Array)>,
}

impl GeometrySync {
    /// Start observing `element`. Sends the initial geometry once the debounce
    /// window passes.
    pub fn attach(element: Element) -> Option<Self> {
        let task = {
            let element = element.clone();
            Rc::new(DebouncedTask::new(VIEWPORT_DEBOUNCE_MS, move || {
                let Some(geometry) = measure(&element) else {
                    return;
                };
                spawn_local(async move {
                    if let Err(err) = api::update_viewport(geometry).await {
                        log::warn!("update_viewport failed: {err:?}");
                    }
                });
            }))
        };

        let resize_cb = {
            let task = Rc::clone(&task);
            Closure::new(move |_entries: js_sys::Array| task.schedule())
        };
        let observer = ResizeObserver::new(resize_cb.as_ref().unchecked_ref()).ok()?;
        observer.observe(&element);

        // Capture phase so scrolls inside ancestor containers are seen too.
        let scroll_cb = {
            let task = Rc::clone(&task);
            Closure::new(move |_event: web_sys::Event| task.schedule())
        };
        let window = web_sys::window()?;
        if let Err(err) = window.add_event_listener_with_callback_and_bool(
            "scroll",
            scroll_cb.as_ref().unchecked_ref(),
            true,
        ) {
            log::warn!("scroll listener registration failed: {err:?}");
        }

        task.schedule();

        Some(Self {
            task,
            observer,
            scroll_cb,
            _resize_cb: resize_cb,
        })
    }

    pub fn detach(&self) {
        self.observer.disconnect();
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback_and_bool(
                "scroll",
                self.scroll_cb.as_ref().unchecked_ref(),
                true,
            );
        }
        self.task.cancel();
    }
}

impl Drop for GeometrySync {
    fn drop(&mut self) {
        self.detach();
    }
}
