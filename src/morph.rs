//! Blend shapes from sparse morph targets.

use crate::buffer_view::BufferViewResolver;
use crate::convert::Transform;
use crate::document::MorphTarget;
use crate::error::{LbsmError, Result};
use crate::mesh::{read_f32, read_u16};
use serde::Serialize;

/// Byte size of one `f32 × 3` displacement.
const DELTA_SIZE: usize = 12;

/// One dense blend shape: a displacement for every vertex of the mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendShapeFrame {
    pub name: String,
    pub deltas: Vec<[f32; 3]>,
}

impl BlendShapeFrame {
    /// Number of vertices with a non-zero displacement.
    pub fn affected_vertices(&self) -> usize {
        self.deltas.iter().filter(|d| **d != [0.0; 3]).count()
    }
}

/// Expand a sparse morph target into a dense, converted blend shape.
pub fn build_morph_target(
    morph: &MorphTarget,
    mesh_index_stride: usize,
    resolver: &BufferViewResolver<'_, '_>,
    vertex_count: usize,
    transform: &Transform,
) -> Result<BlendShapeFrame> {
    if mesh_index_stride != 2 {
        return Err(LbsmError::UnsupportedIndexFormat(format!(
            "morph target '{}' on a mesh with index stride {} (only 16-bit meshes carry morph targets)",
            morph.name, mesh_index_stride
        )));
    }
    if morph.index_stride != 2 {
        return Err(LbsmError::UnsupportedIndexFormat(format!(
            "morph target '{}' index stride {} (expected 2)",
            morph.name, morph.index_stride
        )));
    }

    let indices = resolver.resolve(&morph.indices)?;
    let positions = resolver.resolve(&morph.positions)?;
    let index_count = indices.len() / morph.index_stride;
    let position_count = positions.len() / DELTA_SIZE;
    if indices.len() % morph.index_stride != 0
        || positions.len() % DELTA_SIZE != 0
        || index_count != position_count
    {
        return Err(LbsmError::MorphTargetSizeMismatch {
            name: morph.name.clone(),
            indices: index_count,
            positions: position_count,
        });
    }

    let mut deltas = Vec::new();
    deltas.try_reserve_exact(vertex_count).map_err(|e| {
        LbsmError::CapacityOverflow(format!(
            "morph target '{}' over {} vertices: {}",
            morph.name, vertex_count, e
        ))
    })?;
    deltas.resize(vertex_count, [0.0f32; 3]);
    for i in 0..index_count {
        let vertex = read_u16(indices.bytes, i * 2) as usize;
        let slot = deltas.get_mut(vertex).ok_or_else(|| {
            LbsmError::InvalidReference(format!(
                "morph target '{}' displaces vertex {} of {}",
                morph.name, vertex, vertex_count
            ))
        })?;
        let at = i * DELTA_SIZE;
        let delta = [
            read_f32(positions.bytes, at),
            read_f32(positions.bytes, at + 4),
            read_f32(positions.bytes, at + 8),
        ];
        *slot = transform.apply_direction(delta);
    }

    tracing::debug!(morph = %morph.name, entries = index_count, "built blend shape");
    Ok(BlendShapeFrame {
        name: morph.name.clone(),
        deltas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Reflection;
    use crate::document::{BufferViewRef, SceneDocument};
    use crate::document::decode_document;
    use crate::test_util::{document, BlobBuilder};

    fn morph(name: &str, index_stride: usize) -> MorphTarget {
        MorphTarget {
            name: name.to_string(),
            index_stride,
            indices: BufferViewRef::Index(0),
            positions: BufferViewRef::Index(1),
        }
    }

    fn doc(blob: &BlobBuilder) -> SceneDocument {
        decode_document(&document(&blob.views, serde_json::json!([])).to_string()).unwrap()
    }

    #[test]
    fn test_sparse_to_dense() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("smile.indx", &[1, 3]);
        blob.push_f32("smile.pos", &[0.5, 0.0, 0.25, 0.0, -1.0, 2.0]);
        let doc = doc(&blob);
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);

        let frame =
            build_morph_target(&morph("smile", 2), 2, &resolver, 4, &Transform::IDENTITY).unwrap();
        assert_eq!(frame.name, "smile");
        assert_eq!(
            frame.deltas,
            vec![[0.0; 3], [0.5, 0.0, 0.25], [0.0; 3], [0.0, -1.0, 2.0]]
        );
        assert_eq!(frame.affected_vertices(), 2);
    }

    #[test]
    fn test_deltas_are_converted() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("i", &[0]);
        blob.push_f32("p", &[1.0, 2.0, 3.0]);
        let doc = doc(&blob);
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);

        let transform = Transform::new(Reflection::NegateX, false);
        let frame = build_morph_target(&morph("m", 2), 2, &resolver, 1, &transform).unwrap();
        assert_eq!(frame.deltas, vec![[-1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_rejects_wide_indices() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("i", &[0]);
        blob.push_f32("p", &[1.0, 2.0, 3.0]);
        let doc = doc(&blob);
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);

        assert!(matches!(
            build_morph_target(&morph("m", 2), 4, &resolver, 1, &Transform::IDENTITY),
            Err(LbsmError::UnsupportedIndexFormat(_))
        ));
        assert!(matches!(
            build_morph_target(&morph("m", 4), 2, &resolver, 1, &Transform::IDENTITY),
            Err(LbsmError::UnsupportedIndexFormat(_))
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("i", &[0, 1]);
        blob.push_f32("p", &[1.0, 2.0, 3.0]);
        let doc = doc(&blob);
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);

        match build_morph_target(&morph("m", 2), 2, &resolver, 2, &Transform::IDENTITY) {
            Err(LbsmError::MorphTargetSizeMismatch { indices, positions, .. }) => {
                assert_eq!((indices, positions), (2, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_huge_vertex_count_is_an_error() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("i", &[]);
        blob.push_f32("p", &[]);
        let doc = doc(&blob);
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);

        assert!(matches!(
            build_morph_target(&morph("m", 2), 2, &resolver, usize::MAX / 8, &Transform::IDENTITY),
            Err(LbsmError::CapacityOverflow(_))
        ));
    }

    #[test]
    fn test_vertex_out_of_range() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("i", &[5]);
        blob.push_f32("p", &[1.0, 2.0, 3.0]);
        let doc = doc(&blob);
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);

        assert!(matches!(
            build_morph_target(&morph("m", 2), 2, &resolver, 5, &Transform::IDENTITY),
            Err(LbsmError::InvalidReference(_))
        ));
    }
}
