//! # CTPA viewer library
//!
//! This crate serves the client side of a CT pulmonary angiography (CTPA)
//! viewer: slice navigation and intensity windowing over a scan volume, and a
//! typed client for the analysis backend that ingests scans, answers
//! questions about them and writes reports.
//!
//! A scan can be viewed in three anatomical planes:
//!  - Axial
//!  - Sagittal
//!  - Coronal
//!
//! The view of a scan is a [`ViewState`] value that every navigation or
//! window operation takes and returns, so slice indices always stay inside
//! the volume. Windowing maps Hounsfield units onto display bytes with a
//! center and width, either by the backend (see [`api::ApiClient`]) or
//! locally for volumes read from a NIfTI file or a DICOM directory with
//! [`volume_loader::VolumeLoader`].
//!
//! # Examples
//!
//! ## Rendering a slice locally
//!
//! Read all DICOM files from the dicom/ directory, move one slice past the
//! middle of the axial stack and save it with the pulmonary window.
//!
//! ```no_run
//! # use ctpa_viewer::{Direction, Plane, SortBy, ViewState, VolumeLoader, WindowPreset};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let view = ViewState::new(volume.dim())
//!     .expect("volume should not be empty")
//!     .navigate(Direction::Next, volume.dim())
//!     .apply_preset(WindowPreset::Pulmonary);
//! let image = volume
//!     .get_image_from_axis(view.current_slice(), Plane::Axial, view.window())
//!     .expect("slice should be inside the volume");
//! image.save("result.png");
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod enums;
pub mod notification;
pub mod report;
pub mod session;
pub mod view_state;
pub mod viewer;
pub mod volume;
pub mod volume_loader;
pub mod window;

pub use enums::{Direction, Plane, SortBy, WindowPreset};
pub use view_state::{ViewError, ViewState};
pub use volume::{Volume, VolumeError};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
pub use window::WindowSetting;
