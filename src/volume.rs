use crate::enums::Plane;
use crate::window::{WindowSetting, apply_window_u8, to_image};

use image::ImageBuffer;
use image::Luma;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::Axis;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VolumeError {
    #[error("Slice {index} is outside the {plane} extent of {extent}")]
    SliceOutOfRange {
        plane: Plane,
        index: usize,
        extent: usize,
    },

    #[error("Could not build a {width}x{height} image from the slice")]
    ImageBuffer { width: usize, height: usize },
}

/// Hounsfield-unit volume indexed as `[x, y, z]`.
#[derive(Debug, Default)]
pub struct Volume {
    data: Array3<f32>,
    spacing: (f32, f32, f32),
}

impl Volume {
    pub fn new(data: Array3<f32>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume `(Dx, Dy, Dz)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Voxel spacing in millimetres `(x, y, z)`
    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    pub fn extent(&self, plane: Plane) -> usize {
        plane.extent(self.dim())
    }

    /// Slice along `plane`, with the in-plane axes swapped for display.
    ///
    /// Axial slices have `Dy` rows and `Dx` columns, sagittal slices `Dz`
    /// rows and `Dy` columns, coronal slices `Dz` rows and `Dx` columns.
    pub fn get_slice_from_axis(
        &self,
        index: usize,
        plane: Plane,
    ) -> Result<ArrayView2<'_, f32>, VolumeError> {
        if !self.is_valid_index(index, plane) {
            return Err(VolumeError::SliceOutOfRange {
                plane,
                index,
                extent: self.extent(plane),
            });
        }
        let axis = match plane {
            Plane::Sagittal => Axis(0),
            Plane::Coronal => Axis(1),
            Plane::Axial => Axis(2),
        };
        Ok(self.data.index_axis(axis, index).reversed_axes())
    }

    /// Window the slice at `index` and return it as an 8-bit image.
    pub fn get_image_from_axis(
        &self,
        index: usize,
        plane: Plane,
        window: WindowSetting,
    ) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, VolumeError> {
        let slice = self.get_slice_from_axis(index, plane)?;
        let (height, width) = slice.dim();
        let windowed = apply_window_u8(&slice, window);
        to_image(&windowed).ok_or(VolumeError::ImageBuffer { width, height })
    }

    fn is_valid_index(&self, index: usize, plane: Plane) -> bool {
        index < self.extent(plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::WindowPreset;

    fn ramp(dims: (usize, usize, usize)) -> Volume {
        // value encodes the voxel position as x*10000 + y*100 + z
        let data = Array3::from_shape_fn(dims, |(x, y, z)| (x * 10_000 + y * 100 + z) as f32);
        Volume::new(data, (1.0, 1.0, 1.0))
    }

    #[test]
    fn slices_preserve_free_dimensions() {
        let volume = Volume::new(Array3::zeros((256, 256, 128)), (0.7, 0.7, 1.0));
        assert_eq!(
            volume.get_slice_from_axis(64, Plane::Axial).unwrap().dim(),
            (256, 256)
        );
        let volume = ramp((5, 6, 7));
        assert_eq!(volume.get_slice_from_axis(0, Plane::Axial).unwrap().dim(), (6, 5));
        assert_eq!(volume.get_slice_from_axis(0, Plane::Sagittal).unwrap().dim(), (7, 6));
        assert_eq!(volume.get_slice_from_axis(0, Plane::Coronal).unwrap().dim(), (7, 5));
    }

    #[test]
    fn slices_are_transposed_views_of_the_fixed_axis() {
        let volume = ramp((5, 6, 7));

        let axial = volume.get_slice_from_axis(3, Plane::Axial).unwrap();
        // row = y, column = x
        assert_eq!(axial[[2, 4]], 40_203.0);

        let sagittal = volume.get_slice_from_axis(1, Plane::Sagittal).unwrap();
        // row = z, column = y
        assert_eq!(sagittal[[6, 5]], 10_506.0);

        let coronal = volume.get_slice_from_axis(2, Plane::Coronal).unwrap();
        // row = z, column = x
        assert_eq!(coronal[[1, 3]], 30_201.0);
    }

    #[test]
    fn out_of_range_slice_is_an_error() {
        let volume = ramp((5, 6, 7));
        assert_eq!(
            volume.get_slice_from_axis(7, Plane::Axial).unwrap_err(),
            VolumeError::SliceOutOfRange {
                plane: Plane::Axial,
                index: 7,
                extent: 7
            }
        );
        assert!(volume.get_slice_from_axis(4, Plane::Sagittal).is_ok());
    }

    #[test]
    fn image_is_windowed_with_display_orientation() {
        let mut data = Array3::from_elem((4, 3, 2), -2000.0f32);
        data[[3, 0, 1]] = 2000.0;
        let volume = Volume::new(data, (1.0, 1.0, 1.0));

        let image = volume
            .get_image_from_axis(1, Plane::Axial, WindowSetting::from_preset(WindowPreset::Bone))
            .unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(3, 0).0, [255]);
        assert_eq!(image.get_pixel(0, 0).0, [0]);
    }
}
