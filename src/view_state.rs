//! Navigation state for one active scan.
//!
//! Every operation takes the state by value and returns the updated one. All
//! operations keep the active plane's slice index inside
//! `[0, extent(plane) - 1]`.

use thiserror::Error;

use crate::enums::{Direction, Plane, WindowPreset};
use crate::window::WindowSetting;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("Window width must be at least 1, got {0}")]
    InvalidWindowWidth(i32),

    #[error("Volume has an empty axis: {0:?}")]
    EmptyVolume((usize, usize, usize)),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    plane: Plane,
    slices: [Option<usize>; 3],
    window: WindowSetting,
}

fn middle(plane: Plane, dims: (usize, usize, usize)) -> usize {
    plane.extent(dims) / 2
}

fn clamp_to_extent(index: usize, plane: Plane, dims: (usize, usize, usize)) -> usize {
    index.min(plane.extent(dims).saturating_sub(1))
}

impl ViewState {
    /// Fresh view of a volume: axial plane at mid-volume, PE protocol window.
    pub fn new(dims: (usize, usize, usize)) -> Result<Self, ViewError> {
        if dims.0 == 0 || dims.1 == 0 || dims.2 == 0 {
            return Err(ViewError::EmptyVolume(dims));
        }
        let mut slices = [None; 3];
        slices[Plane::Axial.index()] = Some(middle(Plane::Axial, dims));
        Ok(Self {
            plane: Plane::Axial,
            slices,
            window: WindowSetting::default(),
        })
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn window(&self) -> WindowSetting {
        self.window
    }

    /// Remembered index for `plane`, if it has been visited.
    pub fn remembered(&self, plane: Plane) -> Option<usize> {
        self.slices[plane.index()]
    }

    /// Index of the active plane.
    pub fn current_slice(&self) -> usize {
        self.slices[self.plane.index()].unwrap_or_default()
    }

    fn with_current(mut self, index: usize) -> Self {
        self.slices[self.plane.index()] = Some(index);
        self
    }

    pub fn switch_plane(mut self, plane: Plane, dims: (usize, usize, usize)) -> Self {
        self.plane = plane;
        let index = match self.remembered(plane) {
            Some(index) => clamp_to_extent(index, plane, dims),
            None => middle(plane, dims),
        };
        self.with_current(index)
    }

    /// Step one slice; stays put at either end of the axis.
    pub fn navigate(self, direction: Direction, dims: (usize, usize, usize)) -> Self {
        let current = clamp_to_extent(self.current_slice(), self.plane, dims);
        let index = match direction {
            Direction::Previous => current.saturating_sub(1),
            Direction::Next => clamp_to_extent(current + 1, self.plane, dims),
        };
        self.with_current(index)
    }

    /// Position the active plane directly, as a slider would.
    pub fn set_slice(self, index: usize, dims: (usize, usize, usize)) -> Self {
        let index = clamp_to_extent(index, self.plane, dims);
        self.with_current(index)
    }

    pub fn reset_view(self, dims: (usize, usize, usize)) -> Self {
        let index = middle(self.plane, dims);
        self.with_current(index)
    }

    /// Replace the window. Widths below 1 are rejected; the caller's copy of
    /// the state stays as it was.
    pub fn set_window(mut self, center: i32, width: i32) -> Result<Self, ViewError> {
        self.window = WindowSetting::new(center, width)?;
        Ok(self)
    }

    pub fn apply_preset(mut self, preset: WindowPreset) -> Self {
        self.window = WindowSetting::from_preset(preset);
        self
    }

    /// Re-clamp every remembered index after the volume dimensions changed.
    pub fn reconcile(mut self, dims: (usize, usize, usize)) -> Self {
        for plane in Plane::ALL {
            if let Some(index) = self.slices[plane.index()] {
                self.slices[plane.index()] = Some(clamp_to_extent(index, plane, dims));
            }
        }
        if self.remembered(self.plane).is_none() {
            let index = middle(self.plane, dims);
            return self.with_current(index);
        }
        self
    }
}
