// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Planar projections used by the intersection searches.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{ConnectivityError, Position};

/// Subset of axes along which distances are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IntersectionPlane {
    #[default]
    Xyz,
    Xy,
    Xz,
    Yz,
    X,
    Y,
    Z,
}

impl IntersectionPlane {
    pub const ALL: [IntersectionPlane; 7] = [
        Self::Xyz,
        Self::Xy,
        Self::Xz,
        Self::Yz,
        Self::X,
        Self::Y,
        Self::Z,
    ];

    /// Indices of the axes kept by the projection
    pub fn axes(&self) -> &'static [usize] {
        match self {
            Self::Xyz => &[0, 1, 2],
            Self::Xy => &[0, 1],
            Self::Xz => &[0, 2],
            Self::Yz => &[1, 2],
            Self::X => &[0],
            Self::Y => &[1],
            Self::Z => &[2],
        }
    }

    pub fn includes(&self, axis: usize) -> bool {
        self.axes().contains(&axis)
    }

    /// Zero the axes outside the plane
    #[inline]
    pub fn project(&self, position: Position) -> Position {
        let mut projected = [0.0; 3];
        for &axis in self.axes() {
            projected[axis] = position[axis];
        }
        projected
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xyz => "xyz",
            Self::Xy => "xy",
            Self::Xz => "xz",
            Self::Yz => "yz",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

impl FromStr for IntersectionPlane {
    type Err = ConnectivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|plane| plane.as_str() == s)
            .ok_or_else(|| ConnectivityError::InvalidPlane(s.to_string()))
    }
}

impl TryFrom<String> for IntersectionPlane {
    type Error = ConnectivityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IntersectionPlane> for String {
    fn from(plane: IntersectionPlane) -> Self {
        plane.as_str().to_string()
    }
}

impl fmt::Display for IntersectionPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
