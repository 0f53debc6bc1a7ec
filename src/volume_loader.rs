use crate::{enums::SortBy, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::{debug, info};
use ndarray::{Array2, Array3, ArrayD, Axis, Ix3, IxDyn, s};
use nifti::{NiftiObject, ReaderOptions, volume::ndarray::IntoNdArray};
use rayon::prelude::*;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::error::NiftiError),

    #[error("Expected a volume with at least 3 dimensions, got {0:?}")]
    NotAVolume(Vec<usize>),
}

/// Spacing assumed when the series carries no pixel spacing or thickness.
const DEFAULT_SPACING: (f32, f32, f32) = (1.0, 1.0, 1.0);

fn is_nifti_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|name| name.ends_with(".nii") || name.ends_with(".nii.gz"))
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a Hounsfield-unit volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects, one per axial image
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut images_with_order: Vec<_> = dicom_objects
            .par_iter()
            .filter_map(|dicom_object| Self::extract_image_with_order(dicom_object, &sort_by))
            .collect();

        if images_with_order.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        debug!(
            "Decoded {} of {} DICOM objects",
            images_with_order.len(),
            dicom_objects.len()
        );

        Self::sort_images(&mut images_with_order, sort_by);

        let images: Vec<_> = images_with_order
            .into_iter()
            .map(|(_, image)| image)
            .collect();

        Self::validate_dimensions(&images)?;

        let volume_array = Self::build_volume_array(&images);
        let spacing = Self::get_spacing(dicom_objects).unwrap_or(DEFAULT_SPACING);
        info!(
            "Loaded volume {:?} with spacing {:?}",
            volume_array.dim(),
            spacing
        );

        Ok(Volume::new(volume_array, spacing))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        // file order is the fallback ordering for SortBy::None
        paths.sort();

        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Load a NIfTI file, or every DICOM file of a directory
    pub fn load_from_path(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        if is_nifti_file(path) {
            Self::load_from_nifti(path)
        } else {
            Self::load_from_directory(path, sort_by)
        }
    }

    /// Load a volume from a NIfTI file (`.nii` or `.nii.gz`)
    ///
    /// The stored values are scaled with the header's slope and intercept,
    /// which for CT yields Hounsfield units. Only the first volume of a 4D
    /// series is kept.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or has fewer than 3 dimensions
    pub fn load_from_nifti(path: impl AsRef<Path>) -> Result<Volume, VolumeLoaderError> {
        let object = ReaderOptions::new().read_file(path.as_ref())?;
        let pixdim = object.header().pixdim;
        let spacing = match (pixdim[1], pixdim[2], pixdim[3]) {
            (x, y, z) if x > 0.0 && y > 0.0 && z > 0.0 => (x, y, z),
            _ => DEFAULT_SPACING,
        };

        let array = object.into_volume().into_ndarray::<f32>()?;
        let shape = array.shape().to_vec();
        let values: Vec<f32> = array.iter().copied().collect();
        let data = Self::first_volume(&shape, values)?;
        info!(
            "Loaded NIfTI volume {:?} with spacing {:?}",
            data.dim(),
            spacing
        );

        Ok(Volume::new(data, spacing))
    }

    /// Rebuild a `[x, y, z, ...]` array from its logical-order values and
    /// drop every axis past the third at index 0.
    fn first_volume(shape: &[usize], values: Vec<f32>) -> Result<Array3<f32>, VolumeLoaderError> {
        let not_a_volume = || VolumeLoaderError::NotAVolume(shape.to_vec());
        if shape.len() < 3 || shape[..3].contains(&0) {
            return Err(not_a_volume());
        }
        let mut data =
            ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| not_a_volume())?;
        while data.ndim() > 3 {
            let last = Axis(data.ndim() - 1);
            if data.len_of(last) == 0 {
                return Err(not_a_volume());
            }
            data = data.index_axis_move(last, 0);
        }
        data.into_dimensionality::<Ix3>()
            .map_err(|_| not_a_volume())
    }

    fn extract_image_with_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<(Option<f32>, Array2<f32>)> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image_2d = Self::decode_image(dicom_object)?;
        Some((order, image_2d))
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    /// Decode the first frame in Hounsfield units (modality rescale applied,
    /// no VOI window).
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_images(images_with_order: &mut [(Option<f32>, Array2<f32>)], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            images_with_order
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            images_with_order.reverse();
        }
    }

    fn validate_dimensions(images: &[Array2<f32>]) -> Result<(), VolumeLoaderError> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    /// Stack `(rows, columns)` images into an `[x, y, z]` volume, where
    /// `x` is the column, `y` the row and `z` the image position.
    fn build_volume_array(images: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((width, height, depth));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![.., .., i]).assign(&image.t());
        }

        volume
    }

    fn get_spacing(dicom_objects: &[FileDicomObject<InMemDicomObject>]) -> Option<(f32, f32, f32)> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;

            let slice_thickness = dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()?
                .to_float32()
                .ok()?;

            // PixelSpacing is (row spacing, column spacing) = (y, x)
            Some((pixel_spacing[1], pixel_spacing[0], slice_thickness))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Plane;
    use ndarray::array;

    #[test]
    fn stacked_images_round_trip_through_axial_slices() {
        let first = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let second = first.mapv(|v| v * -10.0);
        let data = VolumeLoader::build_volume_array(&[first.clone(), second.clone()]);
        assert_eq!(data.dim(), (3, 2, 2));

        let volume = Volume::new(data, DEFAULT_SPACING);
        assert_eq!(volume.get_slice_from_axis(0, Plane::Axial).unwrap(), first);
        assert_eq!(volume.get_slice_from_axis(1, Plane::Axial).unwrap(), second);
    }

    #[test]
    fn image_position_sorts_descending() {
        let image = Array2::<f32>::zeros((1, 1));
        let mut images = vec![
            (Some(-20.0), image.clone()),
            (Some(5.0), image.clone()),
            (None, image.clone()),
            (Some(-3.5), image),
        ];
        VolumeLoader::sort_images(&mut images, SortBy::ImagePositionPatient);
        let order: Vec<_> = images.iter().map(|(order, _)| *order).collect();
        assert_eq!(order, vec![Some(5.0), Some(-3.5), Some(-20.0), None]);
    }

    #[test]
    fn mismatched_images_are_rejected() {
        let images = [Array2::<f32>::zeros((2, 2)), Array2::<f32>::zeros((2, 3))];
        assert!(matches!(
            VolumeLoader::validate_dimensions(&images),
            Err(VolumeLoaderError::InconsistentDimensions)
        ));
    }

    /// Minimal single-file NIfTI-1 image of float32 samples, `x` fastest.
    fn write_nifti(path: &Path, dims: (u16, u16, u16), spacing: [f32; 3], values: &[f32]) {
        let mut bytes = vec![0u8; 352];
        bytes[0..4].copy_from_slice(&348i32.to_le_bytes());
        let dim: [i16; 8] = [3, dims.0 as i16, dims.1 as i16, dims.2 as i16, 1, 1, 1, 1];
        for (i, d) in dim.iter().enumerate() {
            bytes[40 + 2 * i..42 + 2 * i].copy_from_slice(&d.to_le_bytes());
        }
        // datatype FLOAT32, 32 bits per voxel
        bytes[70..72].copy_from_slice(&16i16.to_le_bytes());
        bytes[72..74].copy_from_slice(&32i16.to_le_bytes());
        let pixdim = [1.0f32, spacing[0], spacing[1], spacing[2], 1.0, 1.0, 1.0, 1.0];
        for (i, p) in pixdim.iter().enumerate() {
            bytes[76 + 4 * i..80 + 4 * i].copy_from_slice(&p.to_le_bytes());
        }
        bytes[108..112].copy_from_slice(&352.0f32.to_le_bytes());
        bytes[112..116].copy_from_slice(&1.0f32.to_le_bytes());
        bytes[344..348].copy_from_slice(b"n+1\0");
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn nifti_volume_is_indexed_by_x_y_z() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chest.nii");
        let dims = (4usize, 3usize, 2usize);
        // stored with x varying fastest
        let mut values = Vec::new();
        for z in 0..dims.2 {
            for y in 0..dims.1 {
                for x in 0..dims.0 {
                    values.push((x * 100 + y * 10 + z) as f32 - 1000.0);
                }
            }
        }
        write_nifti(&path, (4, 3, 2), [0.7, 0.8, 1.5], &values);

        let volume = VolumeLoader::load_from_nifti(&path).unwrap();
        assert_eq!(volume.dim(), dims);
        assert_eq!(volume.spacing(), (0.7, 0.8, 1.5));
        assert_eq!(volume.data()[[3, 2, 1]], 321.0 - 1000.0);
        assert_eq!(volume.data()[[1, 0, 0]], 100.0 - 1000.0);

        let axial = volume.get_slice_from_axis(1, Plane::Axial).unwrap();
        assert_eq!(axial.dim(), (3, 4));
        assert_eq!(axial[[2, 3]], 321.0 - 1000.0);
    }

    #[test]
    fn path_loading_picks_format_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SCAN.NII");
        write_nifti(&path, (2, 2, 2), [1.0, 1.0, 1.0], &[0.0; 8]);

        let volume = VolumeLoader::load_from_path(&path, SortBy::default()).unwrap();
        assert_eq!(volume.dim(), (2, 2, 2));
        assert!(matches!(
            VolumeLoader::load_from_path(dir.path(), SortBy::default()),
            Err(VolumeLoaderError::NoValidImages)
        ));
        assert!(is_nifti_file(Path::new("chest.nii.gz")));
        assert!(!is_nifti_file(Path::new("chest.npz")));
    }

    #[test]
    fn four_dimensional_data_keeps_first_volume() {
        let values: Vec<f32> = (0..2 * 2 * 2 * 3).map(|v| v as f32).collect();
        let data = VolumeLoader::first_volume(&[2, 2, 2, 3], values).unwrap();
        assert_eq!(data.dim(), (2, 2, 2));
        // logical order puts the fourth axis innermost
        assert_eq!(data[[0, 0, 1]], 3.0);
        assert_eq!(data[[1, 1, 1]], 21.0);
    }

    #[test]
    fn flat_images_are_not_volumes() {
        assert!(matches!(
            VolumeLoader::first_volume(&[4, 4], vec![0.0; 16]),
            Err(VolumeLoaderError::NotAVolume(_))
        ));
    }

    #[test]
    fn directory_without_dicom_files_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        assert!(matches!(
            VolumeLoader::load_from_directory(dir.path(), SortBy::default()),
            Err(VolumeLoaderError::NoValidImages)
        ));
    }
}
