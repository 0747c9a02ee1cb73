//! Pan/zoom transform math shared by the wheel and drag handlers.
//!
//! Offsets live in normalized device space (roughly [-1, 1]); a world point `w`
//! appears on screen at `offset + scale * w`. All mutation goes through the
//! setters on `AppState`, which skip structurally equal values so downstream
//! dispatch never fires redundantly.

pub const MIN_SCALE: f64 = 0.01;
pub const MAX_SCALE: f64 = 30.0;
pub const PAN_SPEED: f64 = 1.5;

/// Fit-to-view default, applied whenever the selected image changes.
pub const DEFAULT_SCALE: f64 = 0.97;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Transform {
    pub fn fit_to_view() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::fit_to_view()
    }
}

/// Exponential zoom step for one wheel notch.
pub fn zoom_factor(delta_y: f64) -> f64 {
    if delta_y > 0.0 {
        0.9
    } else {
        1.1
    }
}

/// Zoom about a cursor position given in normalized [-1, 1] viewport space.
///
/// The offset is adjusted so the world point under the cursor stays at the
/// same screen position: `offset' = offset + (1 - f) * (cursor - offset)`
/// where `f` is the ratio of clamped new scale to old scale.
pub fn zoom_at_cursor(t: Transform, cursor_x: f64, cursor_y: f64, factor: f64) -> Transform {
    let new_scale = (t.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    let ratio = new_scale / t.scale;
    Transform {
        scale: new_scale,
        offset_x: t.offset_x + (1.0 - ratio) * (cursor_x - t.offset_x),
        offset_y: t.offset_y + (1.0 - ratio) * (cursor_y - t.offset_y),
    }
}

/// Translate wheel deltas into a pan, normalized by the element's pixel size.
pub fn wheel_pan(t: Transform, delta_x: f64, delta_y: f64, width: f64, height: f64) -> Transform {
    let width = if width > 0.0 { width } else { 1.0 };
    let height = if height > 0.0 { height } else { 1.0 };
    Transform {
        offset_x: t.offset_x - (delta_x * PAN_SPEED) / width,
        offset_y: t.offset_y + (delta_y * PAN_SPEED) / height,
        ..t
    }
}

/// Translate a pointer drag delta (pixels) into a pan. Y is inverted: screen
/// Y grows downward while normalized device Y grows upward.
pub fn drag_pan(t: Transform, delta_x: f64, delta_y: f64, width: f64, height: f64) -> Transform {
    let width = if width > 0.0 { width } else { 1.0 };
    let height = if height > 0.0 { height } else { 1.0 };
    Transform {
        offset_x: t.offset_x + (delta_x * PAN_SPEED) / width,
        offset_y: t.offset_y - (delta_y * PAN_SPEED) / height,
        ..t
    }
}

/// Map a client-space cursor position to normalized [-1, 1] viewport space,
/// with +Y pointing up.
pub fn normalized_cursor(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
    rect_width: f64,
    rect_height: f64,
) -> (f64, f64) {
    let width = if rect_width > 0.0 { rect_width } else { 1.0 };
    let height = if rect_height > 0.0 { rect_height } else { 1.0 };
    let x = ((client_x - rect_left) / width) * 2.0 - 1.0;
    let y = -(((client_y - rect_top) / height) * 2.0 - 1.0);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_in_keeps_anchor_point_fixed() {
        let t = Transform {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let (cx, cy) = (0.5, 0.5);
        let zoomed = zoom_at_cursor(t, cx, cy, 1.1);
        assert!((zoomed.scale - 1.1).abs() < 1e-12);

        // The world point under the cursor before the zoom must map back to
        // the cursor position afterwards.
        let world_x = (cx - t.offset_x) / t.scale;
        let world_y = (cy - t.offset_y) / t.scale;
        let screen_x = zoomed.offset_x + zoomed.scale * world_x;
        let screen_y = zoomed.offset_y + zoomed.scale * world_y;
        assert!((screen_x - cx).abs() < 1e-12, "anchor drifted in x: {screen_x}");
        assert!((screen_y - cy).abs() < 1e-12, "anchor drifted in y: {screen_y}");
    }

    #[test]
    fn zoom_out_keeps_anchor_point_fixed() {
        let t = Transform {
            scale: 2.0,
            offset_x: 0.3,
            offset_y: -0.1,
        };
        let (cx, cy) = (-0.25, 0.75);
        let zoomed = zoom_at_cursor(t, cx, cy, 0.9);
        let world_x = (cx - t.offset_x) / t.scale;
        let world_y = (cy - t.offset_y) / t.scale;
        assert!((zoomed.offset_x + zoomed.scale * world_x - cx).abs() < 1e-12);
        assert!((zoomed.offset_y + zoomed.scale * world_y - cy).abs() < 1e-12);
    }

    #[test]
    fn zoom_clamps_to_scale_bounds() {
        let near_max = Transform {
            scale: 29.5,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        assert_eq!(zoom_at_cursor(near_max, 0.0, 0.0, 1.1).scale, MAX_SCALE);

        let near_min = Transform {
            scale: 0.011,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        assert_eq!(zoom_at_cursor(near_min, 0.0, 0.0, 0.9).scale, MIN_SCALE);
    }

    #[test]
    fn drag_pan_scales_deltas_by_element_size() {
        // Drag from (100, 100) to (150, 120) on a 500x400 element.
        let t = Transform {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let panned = drag_pan(t, 50.0, 20.0, 500.0, 400.0);
        assert!((panned.offset_x - 0.15).abs() < 1e-12);
        assert!((panned.offset_y - -0.075).abs() < 1e-12);
        assert_eq!(panned.scale, t.scale);
    }

    #[test]
    fn wheel_pan_moves_against_delta_x_and_with_delta_y() {
        let t = Transform::default();
        let panned = wheel_pan(t, 100.0, -200.0, 500.0, 400.0);
        assert!((panned.offset_x - (t.offset_x - 0.3)).abs() < 1e-12);
        assert!((panned.offset_y - (t.offset_y - 0.75)).abs() < 1e-12);
    }

    #[test]
    fn zero_sized_element_does_not_blow_up() {
        let t = Transform::default();
        let panned = drag_pan(t, 10.0, 10.0, 0.0, 0.0);
        assert!(panned.offset_x.is_finite());
        assert!(panned.offset_y.is_finite());
    }

    #[test]
    fn normalized_cursor_maps_corners_and_center() {
        // Center of a 200x100 rect at (10, 20).
        assert_eq!(normalized_cursor(110.0, 70.0, 10.0, 20.0, 200.0, 100.0), (0.0, 0.0));
        // Top-left corner is (-1, +1): +Y is up.
        assert_eq!(normalized_cursor(10.0, 20.0, 10.0, 20.0, 200.0, 100.0), (-1.0, 1.0));
        // Bottom-right corner.
        assert_eq!(normalized_cursor(210.0, 120.0, 10.0, 20.0, 200.0, 100.0), (1.0, -1.0));
    }

    #[test]
    fn zoom_factor_follows_wheel_direction() {
        assert_eq!(zoom_factor(3.0), 0.9);
        assert_eq!(zoom_factor(-3.0), 1.1);
        assert_eq!(zoom_factor(0.0), 1.1);
    }
}
