use serde::{Deserialize, Serialize};

/// A prepared mid-resolution proxy for an image, produced by the backend's
/// `prepare_preview` command.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PreviewInfo {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// The viewport's on-screen draw rectangle, in device pixels. Derived from the
/// DOM element on every dispatch; never cached across dispatch cycles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportGeometry {
    /// Scale a CSS-pixel client rect by the device pixel ratio.
    pub fn from_client_rect(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    ) -> Self {
        Self {
            x: x * device_pixel_ratio,
            y: y * device_pixel_ratio,
            width: width * device_pixel_ratio,
            height: height * device_pixel_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rect_is_scaled_by_device_pixel_ratio() {
        let geometry = ViewportGeometry::from_client_rect(10.0, 20.0, 300.0, 200.0, 2.0);
        assert_eq!(
            geometry,
            ViewportGeometry {
                x: 20.0,
                y: 40.0,
                width: 600.0,
                height: 400.0,
            }
        );
    }
}
