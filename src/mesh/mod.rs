//! Mesh buffers assembled from buffer views.
//!
//! [`MeshBuffers`] is the engine-agnostic output for one mesh: a vertex layout,
//! one byte buffer per stream, an index buffer and its submesh ranges. Buffers
//! borrow the binary blob and are copied only when the coordinate transform
//! rewrites them.

mod assembler;
mod layout;

pub use assembler::assemble_mesh;
pub use layout::{VertexAttributeDescriptor, VertexLayout};

use crate::document::VertexSemantic;
use crate::error::{LbsmError, Result};
use crate::morph::BlendShapeFrame;
use crate::types::BoundingBox;
use glam::Mat4;
use serde::Serialize;
use std::borrow::Cow;

/// Index element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// Map a byte stride to a format; only 2 and 4 are valid.
    pub fn from_stride(stride: usize) -> Result<Self> {
        match stride {
            2 => Ok(IndexFormat::U16),
            4 => Ok(IndexFormat::U32),
            other => Err(LbsmError::UnsupportedIndexFormat(format!(
                "index stride {} (expected 2 or 4)",
                other
            ))),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// A contiguous range of the index buffer drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubMeshRange {
    pub start: usize,
    pub count: usize,
    pub material: Option<usize>,
}

impl SubMeshRange {
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

/// CPU-side buffers and layout for one mesh.
#[derive(Debug, Clone)]
pub struct MeshBuffers<'a> {
    pub name: String,
    pub vertex_count: usize,
    pub layout: VertexLayout,
    /// One interleaved buffer per stream, in stream order.
    pub vertex_buffers: Vec<Cow<'a, [u8]>>,
    pub index_format: IndexFormat,
    pub index_count: usize,
    pub index_buffer: Cow<'a, [u8]>,
    pub sub_meshes: Vec<SubMeshRange>,
    /// Bounds of the converted positions; `None` without `f32` positions.
    pub bounds: Option<BoundingBox>,
    /// Skeleton bone per skinning slot.
    pub joints: Vec<usize>,
    /// One bind pose per entry of `joints`.
    pub bind_poses: Vec<Mat4>,
    pub blend_shapes: Vec<BlendShapeFrame>,
}

impl<'a> MeshBuffers<'a> {
    pub fn is_skinned(&self) -> bool {
        !self.bind_poses.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }

    /// Decode the index buffer, widening to `u32`.
    pub fn indices(&self) -> Vec<u32> {
        (0..self.index_count)
            .map(|i| read_index(&self.index_buffer, self.index_format, i))
            .collect()
    }

    /// Indices of one submesh.
    pub fn sub_mesh_indices(&self, sub_mesh: usize) -> Option<Vec<u32>> {
        let range = self.sub_meshes.get(sub_mesh)?;
        Some(
            (range.start..range.end())
                .map(|i| read_index(&self.index_buffer, self.index_format, i))
                .collect(),
        )
    }

    /// Read every vertex's components of an `f32` attribute.
    pub fn read_f32_attribute(&self, semantic: VertexSemantic) -> Option<Vec<Vec<f32>>> {
        let attribute = self.layout.find(semantic)?;
        if attribute.format != crate::document::VertexFormat::F32 {
            return None;
        }
        let stride = self.layout.strides[attribute.stream];
        let buffer = &self.vertex_buffers[attribute.stream];
        Some(
            (0..self.vertex_count)
                .map(|v| {
                    let base = v * stride + attribute.offset;
                    (0..attribute.dimension)
                        .map(|c| read_f32(buffer, base + c * 4))
                        .collect()
                })
                .collect(),
        )
    }

    /// Positions as `[x, y, z]`, when stored as `f32 × 3` or wider.
    pub fn positions(&self) -> Option<Vec<[f32; 3]>> {
        let attribute = self.layout.find(VertexSemantic::Position)?;
        if attribute.dimension < 3 {
            return None;
        }
        self.read_f32_attribute(VertexSemantic::Position)
            .map(|values| values.iter().map(|p| [p[0], p[1], p[2]]).collect())
    }

    /// Whether a buffer was copied out of the blob.
    pub fn owns_vertex_buffer(&self, stream: usize) -> bool {
        matches!(self.vertex_buffers.get(stream), Some(Cow::Owned(_)))
    }
}

pub(crate) fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

pub(crate) fn write_f32(bytes: &mut [u8], offset: usize, value: f32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

pub(crate) fn read_index(bytes: &[u8], format: IndexFormat, i: usize) -> u32 {
    match format {
        IndexFormat::U16 => read_u16(bytes, i * 2) as u32,
        IndexFormat::U32 => read_u32(bytes, i * 4),
    }
}

pub(crate) fn write_index(bytes: &mut [u8], format: IndexFormat, i: usize, value: u32) {
    match format {
        IndexFormat::U16 => bytes[i * 2..i * 2 + 2].copy_from_slice(&(value as u16).to_le_bytes()),
        IndexFormat::U32 => bytes[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes()),
    }
}
