//! Axis labels and UV origin conventions.

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};

/// The three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index of this axis in a `[x, y, z]` vector.
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// An axis with a sign, written `+x`, `-z` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedAxis {
    pub axis: Axis,
    pub negative: bool,
}

impl SignedAxis {
    pub const fn positive(axis: Axis) -> Self {
        Self {
            axis,
            negative: false,
        }
    }

    pub const fn negative(axis: Axis) -> Self {
        Self {
            axis,
            negative: true,
        }
    }

    /// Parse `+x`, `-y`, or a bare `z` (positive).
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('-') {
            Axis::from_str(rest).map(Self::negative)
        } else {
            Axis::from_str(s.strip_prefix('+').unwrap_or(s)).map(Self::positive)
        }
    }

    /// `-1.0` for a negated axis, `1.0` otherwise.
    pub fn sign(&self) -> f32 {
        if self.negative {
            -1.0
        } else {
            1.0
        }
    }
}

impl std::fmt::Display for SignedAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.negative { '-' } else { '+' };
        write!(f, "{}{}", sign, self.axis)
    }
}

impl Serialize for SignedAxis {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignedAxis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        SignedAxis::from_str(&label).ok_or_else(|| {
            de::Error::invalid_value(Unexpected::Str(&label), &"an axis label such as +x or -z")
        })
    }
}

/// Where texture coordinate (0, 0) sits in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UvOrigin {
    UpperLeft,
    LowerLeft,
}

impl UvOrigin {
    /// Parse `upperLeft` / `lowerLeft` (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "upperleft" => Some(UvOrigin::UpperLeft),
            "lowerleft" => Some(UvOrigin::LowerLeft),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for UvOrigin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        UvOrigin::from_str(&label).ok_or_else(|| {
            de::Error::invalid_value(Unexpected::Str(&label), &"upperLeft or lowerLeft")
        })
    }
}

impl std::fmt::Display for UvOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UvOrigin::UpperLeft => write!(f, "upperLeft"),
            UvOrigin::LowerLeft => write!(f, "lowerLeft"),
        }
    }
}

/// Signed engine-native axis for each document axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AxisSystem {
    pub x: SignedAxis,
    pub y: SignedAxis,
    pub z: SignedAxis,
}

impl AxisSystem {
    pub const fn new(x: SignedAxis, y: SignedAxis, z: SignedAxis) -> Self {
        Self { x, y, z }
    }

    pub fn axes(&self) -> [SignedAxis; 3] {
        [self.x, self.y, self.z]
    }
}

impl std::fmt::Display for AxisSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The axis convention and UV origin a document is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateSystem {
    pub axes: AxisSystem,
    pub uv_origin: UvOrigin,
}

impl<'de> Deserialize<'de> for CoordinateSystem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Written flat: `{ "x": "+x", "y": "+y", "z": "-z", "uvOrigin": "upperLeft" }`.
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawCoordinateSystem {
            x: SignedAxis,
            y: SignedAxis,
            z: SignedAxis,
            uv_origin: UvOrigin,
        }

        let raw = RawCoordinateSystem::deserialize(deserializer)?;
        Ok(CoordinateSystem {
            axes: AxisSystem::new(raw.x, raw.y, raw.z),
            uv_origin: raw.uv_origin,
        })
    }
}
