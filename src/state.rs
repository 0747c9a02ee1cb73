use std::collections::HashMap;

use leptos::prelude::*;

use crate::transform::Transform;
use crate::types::PreviewInfo;

/// Shared application state provided via context.
///
/// The ordered image list and proxy lookups are filled in by the surrounding
/// data layer; this crate owns the selection, the pan/zoom transform and the
/// proxy caches it needs for progressive loading.
#[derive(Clone, Copy)]
pub struct AppState {
    /// Ordered, navigable image paths.
    pub images: RwSignal<Vec<String>>,
    pub current_index: RwSignal<Option<usize>>,
    /// path -> cached thumbnail path.
    pub thumbnails: RwSignal<HashMap<String, String>>,
    /// path -> prepared mid-resolution preview.
    pub previews: RwSignal<HashMap<String, PreviewInfo>>,
    pub transform: RwSignal<Transform>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            images: RwSignal::new(Vec::new()),
            current_index: RwSignal::new(None),
            thumbnails: RwSignal::new(HashMap::new()),
            previews: RwSignal::new(HashMap::new()),
            transform: RwSignal::new(Transform::fit_to_view()),
        }
    }

    /// Replace the navigable image list, clearing a selection that no longer
    /// points at a valid entry.
    pub fn set_images(&self, paths: Vec<String>) {
        let len = paths.len();
        self.images.set(paths);
        if self.current_index.get_untracked().is_some_and(|i| i >= len) {
            self.current_index.set(None);
        }
    }

    pub fn current_path(&self) -> Option<String> {
        let index = self.current_index.get()?;
        self.images.with(|images| images.get(index).cloned())
    }

    pub fn current_path_untracked(&self) -> Option<String> {
        let index = self.current_index.get_untracked()?;
        self.images
            .with_untracked(|images| images.get(index).cloned())
    }

    pub fn has_image(&self) -> bool {
        self.current_index.get().is_some()
    }

    pub fn has_image_untracked(&self) -> bool {
        self.current_index.get_untracked().is_some()
    }

    pub fn select_index(&self, index: usize) {
        let len = self.images.with_untracked(Vec::len);
        if index >= len {
            return;
        }
        if self.current_index.get_untracked() != Some(index) {
            self.current_index.set(Some(index));
        }
    }

    /// Step the selection forward or backward, clamped to the list bounds.
    pub fn select_delta(&self, delta: isize) {
        let len = self.images.with_untracked(Vec::len);
        if len == 0 {
            return;
        }
        let next = match self.current_index.get_untracked() {
            Some(index) => (index as isize + delta).clamp(0, len as isize - 1) as usize,
            // Nothing selected yet: the first step lands on the first image.
            None => 0,
        };
        self.select_index(next);
    }

    /// Best available low-cost proxy for `path`: cached thumbnail first, then
    /// a prepared preview.
    pub fn best_proxy(&self, path: &str) -> Option<String> {
        self.thumbnails
            .with(|map| map.get(path).cloned())
            .or_else(|| self.previews.with(|map| map.get(path).map(|p| p.path.clone())))
    }

    pub fn best_proxy_untracked(&self, path: &str) -> Option<String> {
        self.thumbnails
            .with_untracked(|map| map.get(path).cloned())
            .or_else(|| {
                self.previews
                    .with_untracked(|map| map.get(path).map(|p| p.path.clone()))
            })
    }

    // Transform setters. Each is a no-op when the value is structurally equal
    // to the current one, so equal values never reach the dispatcher.

    pub fn set_scale(&self, scale: f64) {
        let current = self.transform.get_untracked();
        if current.scale == scale {
            return;
        }
        self.transform.set(Transform { scale, ..current });
    }

    pub fn set_offset(&self, x: f64, y: f64) {
        let current = self.transform.get_untracked();
        if current.offset_x == x && current.offset_y == y {
            return;
        }
        self.transform.set(Transform {
            offset_x: x,
            offset_y: y,
            ..current
        });
    }

    pub fn apply_transform(&self, next: Transform) {
        if self.transform.get_untracked() == next {
            return;
        }
        self.transform.set(next);
    }

    /// Reset to the supplied transform, or the fit-to-view default.
    pub fn reset_transform(&self, overrides: Option<Transform>) {
        self.apply_transform(overrides.unwrap_or_else(Transform::fit_to_view));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relisting_keeps_a_still_valid_selection() {
        let state = AppState::new();
        state.set_images(vec!["a.raw".into(), "b.raw".into()]);
        state.select_index(1);
        state.set_images(vec!["a.raw".into(), "b.raw".into(), "c.raw".into()]);
        assert_eq!(state.current_path_untracked().as_deref(), Some("b.raw"));
    }

    #[test]
    fn relisting_clears_an_out_of_range_selection() {
        let state = AppState::new();
        state.set_images(vec!["a.raw".into(), "b.raw".into()]);
        state.select_index(1);
        state.set_images(vec!["a.raw".into()]);
        assert_eq!(state.current_path_untracked(), None);
        assert!(!state.has_image_untracked());
    }

    #[test]
    fn select_delta_clamps_to_list_bounds() {
        let state = AppState::new();
        state.set_images(vec!["a.raw".into(), "b.raw".into()]);
        state.select_delta(1);
        assert_eq!(state.current_index.get_untracked(), Some(0));
        state.select_delta(5);
        assert_eq!(state.current_index.get_untracked(), Some(1));
        state.select_delta(-5);
        assert_eq!(state.current_index.get_untracked(), Some(0));
    }
}
