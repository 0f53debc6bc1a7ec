use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Anatomical viewing plane. Each plane holds one volume axis fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Plane {
    #[default]
    Axial,
    Sagittal,
    Coronal,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Axial, Plane::Sagittal, Plane::Coronal];

    /// Position of the plane in per-plane tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Plane::Axial => 0,
            Plane::Sagittal => 1,
            Plane::Coronal => 2,
        }
    }

    /// Number of slices along the fixed axis of a `(Dx, Dy, Dz)` volume.
    pub fn extent(self, dims: (usize, usize, usize)) -> usize {
        match self {
            Plane::Axial => dims.2,
            Plane::Sagittal => dims.0,
            Plane::Coronal => dims.1,
        }
    }

    /// Lowercase name used by the backend's `view` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Plane::Axial => "axial",
            Plane::Sagittal => "sagittal",
            Plane::Coronal => "coronal",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Named window settings for common chest CT reading tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPreset {
    Pulmonary,
    Mediastinal,
    Bone,
    PEProtocol,
}

impl WindowPreset {
    pub const ALL: [WindowPreset; 4] = [
        WindowPreset::PEProtocol,
        WindowPreset::Pulmonary,
        WindowPreset::Mediastinal,
        WindowPreset::Bone,
    ];

    /// `(center, width)` in Hounsfield units
    pub fn center_width(self) -> (i32, i32) {
        match self {
            WindowPreset::Pulmonary => (-600, 1500),
            WindowPreset::Mediastinal => (40, 400),
            WindowPreset::Bone => (500, 2000),
            WindowPreset::PEProtocol => (100, 700),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WindowPreset::Pulmonary => "pulmonary",
            WindowPreset::Mediastinal => "mediastinal",
            WindowPreset::Bone => "bone",
            WindowPreset::PEProtocol => "pe-protocol",
        }
    }
}

impl fmt::Display for WindowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for Plane {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plane::ALL
            .into_iter()
            .find(|plane| plane.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "plane",
                value: s.to_string(),
            })
    }
}

impl FromStr for WindowPreset {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        WindowPreset::ALL
            .into_iter()
            .find(|preset| preset.name().replace('-', "") == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "window preset",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
