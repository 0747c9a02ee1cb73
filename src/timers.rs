//! One-shot browser timer wrappers shared by the geometry synchronizer, the
//! transform dispatcher and the deferred full-decode path. Each holds a single
//! pending slot: scheduling again supersedes the unfired callback, so only the
//! most recent request ever runs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

/// Pure supersede bookkeeping behind the timer wrappers. Every schedule opens
/// a new generation and only the callback holding the latest generation is
/// admitted, at most once. A burst of schedules therefore runs the action
/// exactly once, for the last schedule in the burst.
#[derive(Debug, Default)]
pub struct ScheduleGate {
    current: u64,
}

impl ScheduleGate {
    /// Open a new generation, superseding every earlier one.
    pub fn arm(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Whether the callback holding `generation` is still the latest.
    pub fn admit(&mut self, generation: u64) -> bool {
        if generation != self.current {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn cancel(&mut self) {
        self.current += 1;
    }
}

/// A debounced action on a `setTimeout` slot.
pub struct DebouncedTask {
    action: Rc<dyn Fn()>,
    delay_ms: i32,
    gate: Rc<RefCell<ScheduleGate>>,
    handle: Rc<Cell<Option<i32>>>,
}

impl DebouncedTask {
    pub fn new(delay_ms: i32, action: impl Fn() + 'static) -> Self {
        Self {
            action: Rc::new(action),
            delay_ms,
            gate: Rc::new(RefCell::new(ScheduleGate::default())),
            handle: Rc::new(Cell::new(None)),
        }
    }

    /// (Re)start the timer. The gate drops any superseded callback, so a
    /// burst of schedules runs the action exactly once, after the burst
    /// settles.
    pub fn schedule(&self) {
        self.clear_pending();
        let Some(window) = web_sys::window() else {
            return;
        };
        let generation = self.gate.borrow_mut().arm();
        let handle = Rc::clone(&self.handle);
        let gate = Rc::clone(&self.gate);
        let action = Rc::clone(&self.action);
        let callback = Closure::once_into_js(move || {
            handle.set(None);
            if gate.borrow_mut().admit(generation) {
                action();
            }
        });
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            self.delay_ms,
        ) {
            Ok(id) => self.handle.set(Some(id)),
            Err(err) => log::warn!("setTimeout failed: {err:?}"),
        }
    }

    pub fn cancel(&self) {
        self.gate.borrow_mut().cancel();
        self.clear_pending();
    }

    // The gate already rejects superseded callbacks; clearing the browser
    // timer just releases the slot early.
    fn clear_pending(&self) {
        if let Some(id) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(id);
            }
        }
    }
}

impl Drop for DebouncedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// An action batched to the next animation frame.
pub struct FrameTask {
    action: Rc<dyn Fn()>,
    gate: Rc<RefCell<ScheduleGate>>,
    handle: Rc<Cell<Option<i32>>>,
}

impl FrameTask {
    pub fn new(action: impl Fn() + 'static) -> Self {
        Self {
            action: Rc::new(action),
            gate: Rc::new(RefCell::new(ScheduleGate::default())),
            handle: Rc::new(Cell::new(None)),
        }
    }

    /// Schedule the action for the next display refresh tick, superseding any
    /// previously scheduled-but-unfired run.
    pub fn schedule(&self) {
        self.clear_pending();
        let Some(window) = web_sys::window() else {
            return;
        };
        let generation = self.gate.borrow_mut().arm();
        let handle = Rc::clone(&self.handle);
        let gate = Rc::clone(&self.gate);
        let action = Rc::clone(&self.action);
        let callback = Closure::once_into_js(move |_timestamp: JsValue| {
            handle.set(None);
            if gate.borrow_mut().admit(generation) {
                action();
            }
        });
        match window.request_animation_frame(callback.unchecked_ref()) {
            Ok(id) => self.handle.set(Some(id)),
            Err(err) => log::warn!("requestAnimationFrame failed: {err:?}"),
        }
    }

    pub fn cancel(&self) {
        self.gate.borrow_mut().cancel();
        self.clear_pending();
    }

    fn clear_pending(&self) {
        if let Some(id) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }
}

impl Drop for FrameTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
