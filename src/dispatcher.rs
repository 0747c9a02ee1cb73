//! Batches transform updates to the renderer at display refresh rate.
//!
//! Any number of pushes within one frame collapse to a single dispatch
//! carrying the latest value, and a value identical to the last one sent is
//! dropped before it ever schedules a frame.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;

use crate::api;
use crate::timers::FrameTask;
use crate::transform::Transform;

/// Whether `next` differs from the last transform actually sent.
pub fn should_send(last_sent: Option<Transform>, next: Transform) -> bool {
    last_sent != Some(next)
}

#[derive(Clone)]
pub struct TransformDispatcher {
    last_sent: Rc<Cell<Option<Transform>>>,
    latest: Rc<Cell<Option<Transform>>>,
    frame: Rc<FrameTask>,
}

impl TransformDispatcher {
    pub fn new() -> Self {
        let last_sent = Rc::new(Cell::new(None::<Transform>));
        let latest = Rc::new(Cell::new(None::<Transform>));

        let frame = {
            let last_sent = Rc::clone(&last_sent);
            let latest = Rc::clone(&latest);
            Rc::new(FrameTask::new(move || {
                let Some(transform) = latest.take() else {
                    return;
                };
                last_sent.set(Some(transform));
                spawn_local(async move {
                    if let Err(err) = api::update_transform(transform).await {
                        log::warn!("update_transform failed: {err:?}");
                    }
                });
            }))
        };

        Self {
            last_sent,
            latest,
            frame,
        }
    }

    /// Queue a transform for the next frame. No-ops when it matches the last
    /// one sent.
    pub fn push(&self, transform: Transform) {
        if !should_send(self.last_sent.get(), transform) {
            return;
        }
        self.latest.set(Some(transform));
        self.frame.schedule();
    }

    /// Drop the pending frame and forget the last-sent value, so the next
    /// push always dispatches (viewport remount).
    pub fn reset(&self) {
        self.frame.cancel();
        self.latest.set(None);
        self.last_sent.set(None);
    }
}

impl Default for TransformDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
