//! Progressive image-load coordination.
//!
//! Navigation issues a proxy-first load on the next animation frame; when the
//! user is scrubbing (selections under the scrub threshold apart) the
//! full-resolution decode is deferred behind a settle timer. The backend's
//! request id is the sole correlation token: swap and full-decode calls are
//! only ever issued against the id of the currently active selection, which is
//! how late responses for superseded images get dropped.
//!
//! `LoadPlanner` holds all of the decision logic and no browser state, so the
//! protocol is testable without a DOM; `LoadCoordinator` wires it to timers
//! and the command bridge.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;

use crate::api;
use crate::scrub::ScrubDetector;
use crate::timers::{DebouncedTask, FrameTask};
use crate::types::ViewportGeometry;

/// How long navigation must stay quiet before a deferred full decode starts.
pub const FULL_DECODE_DEBOUNCE_MS: i32 = 180;

/// A load call to issue to the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadPlan {
    pub path: String,
    pub proxy: Option<String>,
    pub defer_full: bool,
}

#[derive(Debug)]
struct ActiveRequest {
    path: String,
    request_id: Option<u64>,
    /// Last proxy handed to the backend for this request, either with the
    /// load call itself or through a later swap.
    swapped_proxy: Option<String>,
    defer_full: bool,
}

/// Pure decision logic for the two-phase load protocol.
#[derive(Debug, Default)]
pub struct LoadPlanner {
    scrub: ScrubDetector,
    last_load_key: Option<String>,
    active: Option<ActiveRequest>,
}

impl LoadPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a selection. Returns the load to issue, or None when the
    /// selection repeats the last requested path+proxy pair.
    pub fn begin_selection(
        &mut self,
        path: &str,
        proxy: Option<&str>,
        now_ms: f64,
    ) -> Option<LoadPlan> {
        let key = match proxy {
            Some(proxy) => format!("{path}|{proxy}"),
            None => path.to_owned(),
        };
        if self.last_load_key.as_deref() == Some(key.as_str()) {
            return None;
        }
        self.last_load_key = Some(key);

        let scrubbing = self.scrub.mark_selection(now_ms);
        let defer_full = proxy.is_some() && scrubbing;

        // Superseding the previous request invalidates everything tied to its
        // id; late responses will fail the path/id guards below.
        self.active = Some(ActiveRequest {
            path: path.to_owned(),
            request_id: None,
            swapped_proxy: proxy.map(str::to_owned),
            defer_full,
        });

        Some(LoadPlan {
            path: path.to_owned(),
            proxy: proxy.map(str::to_owned),
            defer_full,
        })
    }

    /// Store the backend's request id for `path`. Returns false for a stale
    /// response (the user has navigated on), which the caller discards.
    pub fn accept_request_id(&mut self, path: &str, request_id: u64) -> bool {
        match self.active.as_mut() {
            Some(active) if active.path == path && active.request_id.is_none() => {
                active.request_id = Some(request_id);
                true
            }
            _ => false,
        }
    }

    /// Whether the active request still owes a deferred full decode.
    pub fn defer_pending(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.defer_full)
    }

    /// Consume the armed full-decode target, at most once per selection.
    pub fn take_full_decode(&mut self) -> Option<(String, u64)> {
        let active = self.active.as_mut()?;
        if !active.defer_full {
            return None;
        }
        let request_id = active.request_id?;
        active.defer_full = false;
        Some((active.path.clone(), request_id))
    }

    /// A (possibly better) proxy became available for `path`. Returns the
    /// swap to issue, or None when the path is not active, the request id has
    /// not arrived yet, or that proxy has already been handed over.
    pub fn proxy_changed(&mut self, path: &str, proxy: &str) -> Option<(String, u64)> {
        let active = self.active.as_mut()?;
        if active.path != path {
            return None;
        }
        let request_id = active.request_id?;
        if active.swapped_proxy.as_deref() == Some(proxy) {
            return None;
        }
        active.swapped_proxy = Some(proxy.to_owned());
        Some((proxy.to_owned(), request_id))
    }

    /// Drop all request and scrub state (viewport unmount).
    pub fn clear(&mut self) {
        self.scrub.reset();
        self.last_load_key = None;
        self.active = None;
    }
}

struct PendingLoad {
    plan: LoadPlan,
    geometry: ViewportGeometry,
}

/// Wires the planner to the animation-frame tick, the settle timer and the
/// backend commands. Clones share one planner.
#[derive(Clone)]
pub struct LoadCoordinator {
    planner: Rc<RefCell<LoadPlanner>>,
    pending: Rc<RefCell<Option<PendingLoad>>>,
    full_task: Rc<DebouncedTask>,
    load_frame: Rc<FrameTask>,
}

impl LoadCoordinator {
    pub fn new() -> Self {
        let planner = Rc::new(RefCell::new(LoadPlanner::new()));
        let pending = Rc::new(RefCell::new(None::<PendingLoad>));

        let full_task = {
            let planner = Rc::clone(&planner);
            Rc::new(DebouncedTask::new(FULL_DECODE_DEBOUNCE_MS, move || {
                let target = planner.borrow_mut().take_full_decode();
                let Some((path, request_id)) = target else {
                    return;
                };
                spawn_local(async move {
                    if let Err(err) = api::start_full_image_load(&path, request_id).await {
                        log::warn!("start_full_image_load failed for {path}: {err:?}");
                    }
                });
            }))
        };

        let load_frame = {
            let planner = Rc::clone(&planner);
            let pending = Rc::clone(&pending);
            let full_task = Rc::clone(&full_task);
            Rc::new(FrameTask::new(move || {
                let Some(load) = pending.borrow_mut().take() else {
                    return;
                };
                issue_load(load, Rc::clone(&planner), Rc::clone(&full_task));
            }))
        };

        Self {
            planner,
            pending,
            full_task,
            load_frame,
        }
    }

    /// React to a change of the selected image. Coalesces with paint by
    /// issuing the load on the next animation frame.
    pub fn select(&self, path: &str, proxy: Option<&str>, geometry: ViewportGeometry, now_ms: f64) {
        let plan = self
            .planner
            .borrow_mut()
            .begin_selection(path, proxy, now_ms);
        // A duplicate selection must leave an armed deferred decode alone, so
        // the previous image's timer is cancelled only once a new load is
        // actually happening.
        let Some(plan) = plan else {
            return;
        };
        self.full_task.cancel();
        *self.pending.borrow_mut() = Some(PendingLoad { plan, geometry });
        self.load_frame.schedule();
    }

    /// React to the best available proxy for `path` changing.
    pub fn proxy_ready(&self, path: &str, proxy: &str) {
        let swap = self.planner.borrow_mut().proxy_changed(path, proxy);
        let Some((proxy, request_id)) = swap else {
            return;
        };
        spawn_local(async move {
            if let Err(err) = api::swap_requested_texture(&proxy, request_id).await {
                log::warn!("swap_requested_texture failed for {proxy}: {err:?}");
            }
        });
    }

    /// Cancel all timers and clear request/scrub state (viewport unmount).
    pub fn teardown(&self) {
        self.full_task.cancel();
        self.load_frame.cancel();
        self.pending.borrow_mut().take();
        self.planner.borrow_mut().clear();
    }
}

impl Default for LoadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn issue_load(load: PendingLoad, planner: Rc<RefCell<LoadPlanner>>, full_task: Rc<DebouncedTask>) {
    let PendingLoad { plan, geometry } = load;
    spawn_local(async move {
        let result = api::load_image(
            &plan.path,
            plan.proxy.as_deref(),
            geometry,
            plan.defer_full,
        )
        .await;
        match result {
            Ok(request_id) => {
                // A stale id (user already navigated on) is discarded
                // silently; nothing may reference it.
                if planner.borrow_mut().accept_request_id(&plan.path, request_id)
                    && plan.defer_full
                {
                    full_task.schedule();
                }
            }
            Err(err) => {
                log::warn!("load_image failed for {}: {err:?}", plan.path);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_selection_of_same_path_and_proxy_is_suppressed() {
        let mut planner = LoadPlanner::new();
        assert!(planner.begin_selection("a.raw", Some("a.thumb"), 0.0).is_some());
        assert!(planner.begin_selection("a.raw", Some("a.thumb"), 500.0).is_none());
        // A different proxy for the same path is a new load key.
        assert!(planner.begin_selection("a.raw", Some("a.prev"), 1_000.0).is_some());
    }

    #[test]
    fn scrubbing_with_proxy_defers_the_full_decode() {
        let mut planner = LoadPlanner::new();
        let first = planner.begin_selection("a.raw", None, 0.0).unwrap();
        assert!(!first.defer_full, "first selection is never scrubbing");

        let second = planner.begin_selection("b.raw", Some("b.thumb"), 50.0).unwrap();
        assert!(second.defer_full);

        assert!(planner.accept_request_id("b.raw", 7));
        assert_eq!(planner.take_full_decode(), Some(("b.raw".into(), 7)));
        // At most one full decode per selection.
        assert_eq!(planner.take_full_decode(), None);
    }

    #[test]
    fn scrubbing_without_proxy_never_defers() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", Some("a.thumb"), 0.0);
        let plan = planner.begin_selection("b.raw", None, 30.0).unwrap();
        assert!(!plan.defer_full);
        planner.accept_request_id("b.raw", 1);
        assert_eq!(planner.take_full_decode(), None);
    }

    #[test]
    fn stale_request_id_is_discarded() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", None, 0.0);
        planner.begin_selection("b.raw", None, 1_000.0);
        // Response for the superseded image arrives late.
        assert!(!planner.accept_request_id("a.raw", 3));
        assert!(planner.accept_request_id("b.raw", 4));
        // Only the first id for the active path wins.
        assert!(!planner.accept_request_id("b.raw", 5));
    }

    #[test]
    fn new_selection_invalidates_pending_full_decode() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", Some("a.thumb"), 0.0);
        let plan = planner.begin_selection("b.raw", Some("b.thumb"), 40.0).unwrap();
        assert!(plan.defer_full);
        planner.accept_request_id("b.raw", 9);

        // User moves on before the settle timer fires.
        planner.begin_selection("c.raw", None, 1_000.0);
        assert_eq!(planner.take_full_decode(), None, "b's decode must not start");
    }

    #[test]
    fn duplicate_selection_does_not_disturb_armed_decode() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", Some("a.thumb"), 0.0);
        planner.begin_selection("b.raw", Some("b.thumb"), 50.0);
        planner.accept_request_id("b.raw", 7);

        // The image list refreshing re-reports the same selection; nothing
        // about the in-flight load may change.
        assert_eq!(planner.begin_selection("b.raw", Some("b.thumb"), 60.0), None);
        assert!(planner.defer_pending());
        assert_eq!(planner.take_full_decode(), Some(("b.raw".into(), 7)));
    }

    #[test]
    fn full_decode_requires_request_id() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", Some("a.thumb"), 0.0);
        let plan = planner.begin_selection("b.raw", Some("b.thumb"), 40.0).unwrap();
        assert!(plan.defer_full);
        // No id stored yet, so nothing can fire.
        assert_eq!(planner.take_full_decode(), None);
        assert!(planner.defer_pending());
    }

    #[test]
    fn swap_is_idempotent_per_proxy_path() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", Some("a.thumb"), 0.0);
        planner.accept_request_id("a.raw", 11);

        // The proxy sent with the load call itself never re-fires.
        assert_eq!(planner.proxy_changed("a.raw", "a.thumb"), None);

        assert_eq!(
            planner.proxy_changed("a.raw", "a.preview"),
            Some(("a.preview".into(), 11))
        );
        assert_eq!(planner.proxy_changed("a.raw", "a.preview"), None);
    }

    #[test]
    fn swap_for_inactive_path_or_missing_id_is_ignored() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", None, 0.0);
        // Id not yet assigned.
        assert_eq!(planner.proxy_changed("a.raw", "a.thumb"), None);
        planner.accept_request_id("a.raw", 2);
        assert_eq!(planner.proxy_changed("other.raw", "x.thumb"), None);
        assert_eq!(
            planner.proxy_changed("a.raw", "a.thumb"),
            Some(("a.thumb".into(), 2))
        );
    }

    #[test]
    fn scrub_scenario_defers_only_the_settled_image() {
        let mut planner = LoadPlanner::new();

        // Image A, no proxy available: load immediately, defer_full = false.
        let a = planner.begin_selection("a.raw", None, 0.0).unwrap();
        assert!(!a.defer_full);
        assert_eq!(a.proxy, None);

        // Image B selected 50 ms later with a proxy: scrubbing, defer.
        let b = planner.begin_selection("b.raw", Some("b.thumb"), 50.0).unwrap();
        assert!(b.defer_full);
        planner.accept_request_id("b.raw", 21);

        // 200 ms pass with no further navigation; the timer fires once, for B.
        assert_eq!(planner.take_full_decode(), Some(("b.raw".into(), 21)));
        assert_eq!(planner.take_full_decode(), None);
    }

    #[test]
    fn clear_resets_everything() {
        let mut planner = LoadPlanner::new();
        planner.begin_selection("a.raw", Some("a.thumb"), 0.0);
        planner.accept_request_id("a.raw", 1);
        planner.clear();
        assert!(!planner.accept_request_id("a.raw", 2));
        assert_eq!(planner.proxy_changed("a.raw", "a.prev"), None);
        // Selecting the same key again after a clear issues a fresh load,
        // and the scrub history is gone.
        let plan = planner.begin_selection("a.raw", Some("a.thumb"), 1.0).unwrap();
        assert!(!plan.defer_full);
    }
}
