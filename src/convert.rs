//! Coordinate-system normalization.
//!
//! A document declares the axis convention and UV origin it was authored in.
//! [`select_transform`] matches that declaration against the closed preset
//! table and yields one [`Transform`] which is then applied to every piece of
//! geometry: bone heads and tails, vertex positions, normals, tangents, UVs,
//! triangle winding and morph deltas.

use crate::error::{LbsmError, Result};
use crate::types::{Axis, AxisSystem, CoordinateSystem, SignedAxis, UvOrigin};
use glam::Vec3;
use serde::Serialize;

/// Known axis conventions, expressed against the engine-native axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinatePreset {
    /// Left-handed, Y-up, Z-forward.
    EngineNative,
    /// Right-handed, Y-up, X mirrored (glTF convention).
    InterchangeYUp,
    /// Right-handed, Y-up, Z pointing back (OpenGL convention).
    ZBack,
}

const PRESETS: [(CoordinatePreset, AxisSystem); 3] = [
    (
        CoordinatePreset::EngineNative,
        AxisSystem::new(
            SignedAxis::positive(Axis::X),
            SignedAxis::positive(Axis::Y),
            SignedAxis::positive(Axis::Z),
        ),
    ),
    (
        CoordinatePreset::InterchangeYUp,
        AxisSystem::new(
            SignedAxis::negative(Axis::X),
            SignedAxis::positive(Axis::Y),
            SignedAxis::positive(Axis::Z),
        ),
    ),
    (
        CoordinatePreset::ZBack,
        AxisSystem::new(
            SignedAxis::positive(Axis::X),
            SignedAxis::positive(Axis::Y),
            SignedAxis::negative(Axis::Z),
        ),
    ),
];

/// UV origin assumed for documents that do not declare a coordinate system.
pub const DEFAULT_UV_ORIGIN: UvOrigin = UvOrigin::LowerLeft;

impl CoordinatePreset {
    pub const ALL: [CoordinatePreset; 3] = [
        CoordinatePreset::EngineNative,
        CoordinatePreset::InterchangeYUp,
        CoordinatePreset::ZBack,
    ];

    pub fn axes(&self) -> AxisSystem {
        PRESETS
            .iter()
            .find(|(preset, _)| preset == self)
            .map(|(_, axes)| *axes)
            .unwrap_or(PRESETS[0].1)
    }

    /// The preset with exactly these axes, if any.
    pub fn from_axes(axes: &AxisSystem) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(_, preset_axes)| preset_axes == axes)
            .map(|(preset, _)| *preset)
    }

    pub fn with_uv_origin(self, uv_origin: UvOrigin) -> CoordinateSystem {
        CoordinateSystem {
            axes: self.axes(),
            uv_origin,
        }
    }

    /// Parse `engineNative`, `interchangeYUp` or `zBack` (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "enginenative" | "native" => Some(CoordinatePreset::EngineNative),
            "interchangeyup" | "gltf" => Some(CoordinatePreset::InterchangeYUp),
            "zback" => Some(CoordinatePreset::ZBack),
            _ => None,
        }
    }
}

impl std::fmt::Display for CoordinatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatePreset::EngineNative => write!(f, "engineNative"),
            CoordinatePreset::InterchangeYUp => write!(f, "interchangeYUp"),
            CoordinatePreset::ZBack => write!(f, "zBack"),
        }
    }
}

/// Axis reflection applied to geometric vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reflection {
    Identity,
    NegateX,
    NegateZ,
    /// Both X and Z; a half turn about Y, so winding is preserved.
    NegateXZ,
}

impl Reflection {
    fn from_negated(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Reflection::Identity,
            (true, false) => Reflection::NegateX,
            (false, true) => Reflection::NegateZ,
            (true, true) => Reflection::NegateXZ,
        }
    }

    pub fn negates_x(&self) -> bool {
        matches!(self, Reflection::NegateX | Reflection::NegateXZ)
    }

    pub fn negates_z(&self) -> bool {
        matches!(self, Reflection::NegateZ | Reflection::NegateXZ)
    }

    /// Number of negated axes.
    pub fn count(&self) -> usize {
        self.negates_x() as usize + self.negates_z() as usize
    }
}

/// The conversion from a document's convention into the target convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    reflection: Reflection,
    flip_uv: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        reflection: Reflection::Identity,
        flip_uv: false,
    };

    pub fn new(reflection: Reflection, flip_uv: bool) -> Self {
        Self {
            reflection,
            flip_uv,
        }
    }

    /// Conversion between two presets and UV origins.
    pub fn between(
        source: CoordinatePreset,
        source_uv: UvOrigin,
        target: CoordinatePreset,
        target_uv: UvOrigin,
    ) -> Self {
        let (s, t) = (source.axes(), target.axes());
        Self {
            reflection: Reflection::from_negated(
                s.x.negative != t.x.negative,
                s.z.negative != t.z.negative,
            ),
            flip_uv: source_uv != target_uv,
        }
    }

    pub fn reflection(&self) -> Reflection {
        self.reflection
    }

    pub fn flips_uv(&self) -> bool {
        self.flip_uv
    }

    /// Whether triangles must be reversed to keep their front face.
    pub fn flips_winding(&self) -> bool {
        self.reflection.count() % 2 == 1
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether positions, normals and tangents are rewritten.
    pub fn reflects(&self) -> bool {
        self.reflection != Reflection::Identity
    }

    /// Apply `self` and then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            reflection: Reflection::from_negated(
                self.reflection.negates_x() != next.reflection.negates_x(),
                self.reflection.negates_z() != next.reflection.negates_z(),
            ),
            flip_uv: self.flip_uv != next.flip_uv,
        }
    }

    pub fn apply_point(&self, p: [f32; 3]) -> [f32; 3] {
        [
            if self.reflection.negates_x() { -p[0] } else { p[0] },
            p[1],
            if self.reflection.negates_z() { -p[2] } else { p[2] },
        ]
    }

    /// Directions (normals, displacements) reflect like points.
    pub fn apply_direction(&self, d: [f32; 3]) -> [f32; 3] {
        self.apply_point(d)
    }

    pub fn apply_vec3(&self, v: Vec3) -> Vec3 {
        Vec3::from(self.apply_point(v.to_array()))
    }

    /// Reflect the tangent direction and, on a handedness change, its bitangent sign.
    pub fn apply_tangent(&self, t: [f32; 4]) -> [f32; 4] {
        let [x, y, z] = self.apply_direction([t[0], t[1], t[2]]);
        let w = if self.flips_winding() { -t[3] } else { t[3] };
        [x, y, z, w]
    }

    pub fn apply_uv(&self, uv: [f32; 2]) -> [f32; 2] {
        if self.flip_uv {
            [uv[0], 1.0 - uv[1]]
        } else {
            uv
        }
    }

    pub fn apply_triangle(&self, tri: [u32; 3]) -> [u32; 3] {
        if self.flips_winding() {
            [tri[2], tri[1], tri[0]]
        } else {
            tri
        }
    }
}

/// Select the transform from `source` into the engine-native convention.
pub fn select_transform(source: &CoordinateSystem) -> Result<Transform> {
    select_transform_to(source, CoordinatePreset::EngineNative, DEFAULT_UV_ORIGIN)
}

/// Select the transform from `source` into an explicit target convention.
pub fn select_transform_to(
    source: &CoordinateSystem,
    target: CoordinatePreset,
    target_uv: UvOrigin,
) -> Result<Transform> {
    let preset = CoordinatePreset::from_axes(&source.axes).ok_or_else(|| {
        LbsmError::UnsupportedCoordinateSystem(format!(
            "axes {} match no known preset",
            source.axes
        ))
    })?;
    Ok(Transform::between(preset, source.uv_origin, target, target_uv))
}
