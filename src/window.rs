//! Intensity windowing.
//!
//! A window maps the Hounsfield range `[center - width/2, center + width/2]`
//! linearly onto `0..=255`. Samples outside the range saturate.

use image::{ImageBuffer, Luma};
use ndarray::{Array2, ArrayView2, Zip};

use crate::enums::WindowPreset;
use crate::view_state::ViewError;

/// Smallest and largest center offered by the window sliders.
pub const CENTER_RANGE: (i32, i32) = (-1000, 1000);
/// Smallest and largest width offered by the window sliders.
pub const WIDTH_RANGE: (i32, i32) = (1, 4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSetting {
    center: i32,
    width: i32,
}

impl Default for WindowSetting {
    fn default() -> Self {
        Self::from_preset(WindowPreset::PEProtocol)
    }
}

impl WindowSetting {
    /// Create a window, rejecting widths below 1.
    pub fn new(center: i32, width: i32) -> Result<Self, ViewError> {
        if width < 1 {
            return Err(ViewError::InvalidWindowWidth(width));
        }
        Ok(Self { center, width })
    }

    pub fn from_preset(preset: WindowPreset) -> Self {
        let (center, width) = preset.center_width();
        Self { center, width }
    }

    pub fn center(&self) -> i32 {
        self.center
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// `(low, high)` using truncating division of the width.
    pub fn bounds(&self) -> (i32, i32) {
        let half = self.width / 2;
        (self.center - half, self.center + half)
    }

    /// Window a single sample onto `0.0..=255.0`.
    ///
    /// A degenerate range (`low == high`, only possible for width 1) maps
    /// every sample to 0.
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        let (low, high) = self.bounds();
        if high == low {
            return 0.0;
        }
        let (low, high) = (f64::from(low), f64::from(high));
        let clamped = f64::from(value).clamp(low, high);
        ((clamped - low) / (high - low) * 255.0) as f32
    }

    /// Window a single sample and truncate to a display byte.
    #[inline]
    pub fn apply_u8(&self, value: f32) -> u8 {
        // `as` saturates and maps NaN to 0
        self.apply(value) as u8
    }
}

/// Window every sample of a slice, keeping the float result.
pub fn apply_window(slice: &ArrayView2<'_, f32>, window: WindowSetting) -> Array2<f32> {
    Zip::from(slice).par_map_collect(|&v| window.apply(v))
}

/// Window every sample of a slice into display bytes.
pub fn apply_window_u8(slice: &ArrayView2<'_, f32>, window: WindowSetting) -> Array2<u8> {
    Zip::from(slice).par_map_collect(|&v| window.apply_u8(v))
}

/// Convert a windowed `(rows, columns)` array into a grayscale image.
pub fn to_image(windowed: &Array2<u8>) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let (height, width) = windowed.dim();
    // iter() walks in logical order, so transposed views come out row-major
    let pixel_data: Vec<u8> = windowed.iter().copied().collect();
    ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn pulmonary_window_matches_reference_values() {
        let window = WindowSetting::new(-600, 1500).unwrap();
        assert_eq!(window.bounds(), (-1350, 150));
        assert_eq!(window.apply_u8(-1350.0), 0);
        assert_eq!(window.apply_u8(150.0), 255);
        assert_eq!(window.apply_u8(-600.0), 127);
        assert_eq!(window.apply(-600.0), 127.5);
    }

    #[test]
    fn out_of_range_samples_saturate() {
        let window = WindowSetting::from_preset(WindowPreset::Mediastinal);
        assert_eq!(window.apply_u8(-3000.0), 0);
        assert_eq!(window.apply_u8(f32::MIN), 0);
        assert_eq!(window.apply_u8(3000.0), 255);
        assert_eq!(window.apply_u8(f32::MAX), 255);
    }

    #[test]
    fn output_is_bounded_and_monotonic() {
        for (center, width) in [(-600, 1500), (40, 400), (100, 700), (0, 2), (7, 3)] {
            let window = WindowSetting::new(center, width).unwrap();
            let mut previous = 0.0f32;
            for raw in (-2000..=2000).step_by(7) {
                let out = window.apply(raw as f32);
                assert!((0.0..=255.0).contains(&out), "{out} for {raw}");
                assert!(out >= previous, "not monotonic at {raw}");
                previous = out;
            }
        }
    }

    #[test]
    fn width_one_is_degenerate_and_yields_zero() {
        let window = WindowSetting::new(10, 1).unwrap();
        assert_eq!(window.bounds(), (10, 10));
        assert_eq!(window.apply(10.0), 0.0);
        assert_eq!(window.apply(-500.0), 0.0);
        assert_eq!(window.apply(500.0), 0.0);
    }

    #[test]
    fn rejects_non_positive_width() {
        assert_eq!(
            WindowSetting::new(0, 0),
            Err(ViewError::InvalidWindowWidth(0))
        );
        assert!(WindowSetting::new(0, -20).is_err());
    }

    #[test]
    fn apply_window_keeps_shape() {
        let slice = array![[-1350.0f32, -600.0, 150.0], [-5000.0, 5000.0, 0.0]];
        let window = WindowSetting::new(-600, 1500).unwrap();
        let out = apply_window_u8(&slice.view(), window);
        assert_eq!(out.dim(), (2, 3));
        assert_eq!(out, array![[0u8, 127, 255], [0, 255, 229]]);
    }

    #[test]
    fn image_uses_rows_as_height() {
        let windowed = array![[1u8, 2, 3], [4, 5, 6]];
        let image = to_image(&windowed).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [6]);
    }
}
