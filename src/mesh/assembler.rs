//! Assembly of one mesh's vertex and index buffers.

use super::layout::{VertexAttributeDescriptor, VertexLayout};
use super::{read_f32, read_index, read_u16, read_u32, write_f32, write_index};
use super::{IndexFormat, MeshBuffers, SubMeshRange};
use crate::buffer_view::BufferViewResolver;
use crate::convert::Transform;
use crate::document::{Mesh, SceneDocument, VertexFormat, VertexSemantic};
use crate::error::{LbsmError, Result};
use crate::types::BoundingBox;
use std::borrow::Cow;

/// Build the layout, buffers and submesh ranges of `mesh` and convert them with `transform`.
///
/// Bind poses and blend shapes are left empty; see [`crate::Scene::assemble_mesh`].
pub fn assemble_mesh<'a>(
    doc: &SceneDocument,
    mesh: &Mesh,
    resolver: &BufferViewResolver<'_, 'a>,
    transform: &Transform,
) -> Result<MeshBuffers<'a>> {
    let layout = VertexLayout::from_streams(&mesh.vertex_streams);
    if layout.stream_count() == 0 && mesh.vertex_count > 0 {
        return Err(LbsmError::VertexStreamSizeMismatch {
            stream: 0,
            expected: mesh.vertex_count,
            actual: 0,
        });
    }

    let mut vertex_buffers = Vec::with_capacity(layout.stream_count());
    for (stream, declared) in mesh.vertex_streams.iter().enumerate() {
        let range = resolver.resolve(&declared.buffer_view)?;
        let stride = layout.strides[stream];
        let expected = mesh.vertex_count.checked_mul(stride).ok_or_else(|| {
            LbsmError::VertexStreamSizeMismatch {
                stream,
                expected: usize::MAX,
                actual: range.len(),
            }
        })?;
        if range.len() != expected {
            return Err(LbsmError::VertexStreamSizeMismatch {
                stream,
                expected,
                actual: range.len(),
            });
        }
        vertex_buffers.push(Cow::Borrowed(range.bytes));
    }

    let index_format = IndexFormat::from_stride(mesh.indices.stride)?;
    let index_range = resolver.resolve(&mesh.indices.buffer_view)?;
    if index_range.len() % index_format.size() != 0 {
        return Err(LbsmError::UnsupportedIndexFormat(format!(
            "index buffer of {} bytes is not a multiple of stride {}",
            index_range.len(),
            index_format.size()
        )));
    }
    let index_count = index_range.len() / index_format.size();
    let mut index_buffer = Cow::Borrowed(index_range.bytes);

    for i in 0..index_count {
        let index = read_index(&index_buffer, index_format, i);
        if index as usize >= mesh.vertex_count {
            return Err(LbsmError::InvalidReference(format!(
                "mesh '{}' index {} refers to vertex {} of {}",
                mesh.name, i, index, mesh.vertex_count
            )));
        }
    }

    let sub_meshes = partition_sub_meshes(doc, mesh, index_count)?;

    for (stream, buffer) in vertex_buffers.iter_mut().enumerate() {
        convert_stream(buffer, &layout, stream, mesh.vertex_count, transform)?;
    }

    if transform.flips_winding() {
        let bytes = index_buffer.to_mut();
        for tri in 0..index_count / 3 {
            let base = tri * 3;
            let original = [
                read_index(bytes, index_format, base),
                read_index(bytes, index_format, base + 1),
                read_index(bytes, index_format, base + 2),
            ];
            for (k, index) in transform.apply_triangle(original).into_iter().enumerate() {
                write_index(bytes, index_format, base + k, index);
            }
        }
    }

    let mut buffers = MeshBuffers {
        name: mesh.name.clone(),
        vertex_count: mesh.vertex_count,
        layout,
        vertex_buffers,
        index_format,
        index_count,
        index_buffer,
        sub_meshes,
        bounds: None,
        joints: mesh.joints.clone(),
        bind_poses: Vec::new(),
        blend_shapes: Vec::new(),
    };
    buffers.bounds = buffers
        .positions()
        .and_then(|positions| BoundingBox::from_points(positions.into_iter()));

    tracing::debug!(
        mesh = %buffers.name,
        vertices = buffers.vertex_count,
        indices = buffers.index_count,
        streams = buffers.vertex_buffers.len(),
        "assembled mesh"
    );
    Ok(buffers)
}

/// Walk the declared submeshes with a running offset.
fn partition_sub_meshes(
    doc: &SceneDocument,
    mesh: &Mesh,
    index_count: usize,
) -> Result<Vec<SubMeshRange>> {
    if mesh.sub_meshes.is_empty() {
        return Ok(vec![SubMeshRange {
            start: 0,
            count: index_count,
            material: None,
        }]);
    }

    let mut ranges = Vec::with_capacity(mesh.sub_meshes.len());
    let mut offset = 0usize;
    for sub_mesh in &mesh.sub_meshes {
        if let Some(material) = sub_mesh.material {
            if material >= doc.materials.len() {
                return Err(LbsmError::InvalidReference(format!(
                    "mesh '{}' submesh material {} out of range ({} materials)",
                    mesh.name,
                    material,
                    doc.materials.len()
                )));
            }
        }
        ranges.push(SubMeshRange {
            start: offset,
            count: sub_mesh.draw_count,
            material: sub_mesh.material,
        });
        offset = offset.saturating_add(sub_mesh.draw_count);
    }

    if offset != index_count {
        return Err(LbsmError::SubMeshRangeMismatch {
            consumed: offset,
            index_count,
        });
    }
    Ok(ranges)
}

/// Whether `transform` rewrites this attribute.
fn needs_conversion(attribute: &VertexAttributeDescriptor, transform: &Transform) -> bool {
    match attribute.semantic {
        VertexSemantic::Position | VertexSemantic::Normal | VertexSemantic::Tangent => {
            transform.reflects()
        }
        VertexSemantic::Tex0 | VertexSemantic::Tex1 => {
            transform.flips_uv() && attribute.dimension >= 2
        }
        VertexSemantic::Color | VertexSemantic::BlendWeights | VertexSemantic::BlendIndices => {
            false
        }
    }
}

fn convert_stream(
    buffer: &mut Cow<'_, [u8]>,
    layout: &VertexLayout,
    stream: usize,
    vertex_count: usize,
    transform: &Transform,
) -> Result<()> {
    let attributes: Vec<VertexAttributeDescriptor> = layout
        .stream_attributes(stream)
        .filter(|a| needs_conversion(a, transform))
        .copied()
        .collect();
    if attributes.is_empty() {
        return Ok(());
    }

    for attribute in &attributes {
        if attribute.semantic.is_uv() {
            continue;
        }
        if attribute.format != VertexFormat::F32 || attribute.dimension < 3 {
            return Err(LbsmError::UnsupportedVertexFormat(format!(
                "{} stored as {}x{} cannot be reflected",
                attribute.semantic, attribute.format, attribute.dimension
            )));
        }
    }

    let stride = layout.strides[stream];
    let bytes = buffer.to_mut();
    for vertex in 0..vertex_count {
        let base = vertex * stride;
        for attribute in &attributes {
            convert_attribute(bytes, base + attribute.offset, attribute, transform);
        }
    }
    Ok(())
}

fn convert_attribute(
    bytes: &mut [u8],
    at: usize,
    attribute: &VertexAttributeDescriptor,
    transform: &Transform,
) {
    match attribute.semantic {
        VertexSemantic::Position | VertexSemantic::Normal => {
            let v = [read_f32(bytes, at), read_f32(bytes, at + 4), read_f32(bytes, at + 8)];
            let converted = if attribute.semantic == VertexSemantic::Position {
                transform.apply_point(v)
            } else {
                transform.apply_direction(v)
            };
            for (c, value) in converted.into_iter().enumerate() {
                write_f32(bytes, at + c * 4, value);
            }
        }
        VertexSemantic::Tangent => {
            let w = if attribute.dimension == 4 { read_f32(bytes, at + 12) } else { 1.0 };
            let t = [read_f32(bytes, at), read_f32(bytes, at + 4), read_f32(bytes, at + 8), w];
            let converted = transform.apply_tangent(t);
            for (c, value) in converted.into_iter().take(attribute.dimension).enumerate() {
                write_f32(bytes, at + c * 4, value);
            }
        }
        VertexSemantic::Tex0 | VertexSemantic::Tex1 => flip_v(bytes, at, attribute.format, transform),
        _ => {}
    }
}

/// Flip the second UV component. Integer UVs are UNORM, so `v' = MAX - v`.
fn flip_v(bytes: &mut [u8], at: usize, format: VertexFormat, transform: &Transform) {
    match format {
        VertexFormat::F32 => {
            let uv = transform.apply_uv([read_f32(bytes, at), read_f32(bytes, at + 4)]);
            write_f32(bytes, at + 4, uv[1]);
        }
        VertexFormat::U16 => {
            let v = u16::MAX - read_u16(bytes, at + 2);
            bytes[at + 2..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        VertexFormat::U32 => {
            let v = u32::MAX - read_u32(bytes, at + 4);
            bytes[at + 4..at + 8].copy_from_slice(&v.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{CoordinatePreset, Reflection};
    use crate::document::decode_document;
    use crate::test_util::{
        document, position_uv_stream, position_uv_vertices, read_f32s, read_u16s, BlobBuilder,
    };
    use crate::types::UvOrigin;
    use serde_json::{json, Value};

    /// A quad: four vertices, two triangles.
    fn quad_blob() -> BlobBuilder {
        let mut blob = BlobBuilder::new();
        blob.push_f32(
            "quad.vert",
            &position_uv_vertices(&[
                ([0.0, 0.0, 0.0], [0.0, 0.0]),
                ([1.0, 0.0, 0.0], [1.0, 0.0]),
                ([1.0, 1.0, 2.0], [1.0, 1.0]),
                ([0.0, 1.0, 2.0], [0.0, 0.25]),
            ]),
        );
        blob.push_u16("quad.indx", &[0, 1, 2, 0, 2, 3]);
        blob
    }

    fn quad_mesh(extra: Value) -> Value {
        let mut mesh = json!({
            "name": "quad",
            "vertexCount": 4,
            "vertexStreams": [position_uv_stream(0)],
            "indices": { "stride": 2, "bufferView": 1 },
        });
        if let (Some(mesh), Some(extra)) = (mesh.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                mesh.insert(k.clone(), v.clone());
            }
        }
        mesh
    }

    fn assemble(
        blob: &BlobBuilder,
        mesh: Value,
        materials: Value,
        transform: Transform,
    ) -> Result<MeshBuffers<'_>> {
        let mut root = document(&blob.views, json!([mesh]));
        root["materials"] = materials;
        let doc = decode_document(&root.to_string()).unwrap();
        let resolver = BufferViewResolver::new(&doc, &blob.data, true);
        assemble_mesh(&doc, &doc.meshes[0], &resolver, &transform)
    }

    #[test]
    fn test_identity_borrows_blob() {
        let blob = quad_blob();
        let mesh = assemble(&blob, quad_mesh(json!({})), json!([]), Transform::IDENTITY).unwrap();

        assert_eq!(mesh.vertex_count, 4);
        assert_eq!(mesh.index_format, IndexFormat::U16);
        assert_eq!(mesh.index_count, 6);
        assert_eq!(mesh.indices(), vec![0, 1, 2, 0, 2, 3]);
        assert!(!mesh.owns_vertex_buffer(0));
        assert!(matches!(mesh.index_buffer, Cow::Borrowed(_)));
        assert_eq!(mesh.sub_meshes, vec![SubMeshRange { start: 0, count: 6, material: None }]);

        let bounds = mesh.bounds.unwrap();
        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_submesh_ranges_contiguous() {
        let mut blob = BlobBuilder::new();
        blob.push_f32("v", &position_uv_vertices(&[([0.0; 3], [0.0; 2]); 3]));
        let indices: Vec<u16> = (0..18).map(|i| i % 3).collect();
        blob.push_u16("i", &indices);
        let mesh = json!({
            "name": "two",
            "vertexCount": 3,
            "vertexStreams": [position_uv_stream(0)],
            "indices": { "stride": 2, "bufferView": 1 },
            "subMeshes": [{ "drawCount": 6 }, { "drawCount": 12, "materialIndex": 0 }],
        });

        let mesh = assemble(&blob, mesh, json!([{ "name": "m" }]), Transform::IDENTITY).unwrap();
        assert_eq!(mesh.sub_meshes.len(), 2);
        assert_eq!((mesh.sub_meshes[0].start, mesh.sub_meshes[0].end()), (0, 6));
        assert_eq!((mesh.sub_meshes[1].start, mesh.sub_meshes[1].end()), (6, 18));
        assert_eq!(mesh.sub_meshes[0].material, None);
        assert_eq!(mesh.sub_meshes[1].material, Some(0));
        assert_eq!(mesh.sub_mesh_indices(1).unwrap().len(), 12);
    }

    #[test]
    fn test_submesh_sum_mismatch() {
        let blob = quad_blob();
        for counts in [json!([{ "drawCount": 3 }]), json!([{ "drawCount": 6 }, { "drawCount": 3 }])] {
            let mesh = quad_mesh(json!({ "subMeshes": counts }));
            assert!(matches!(
                assemble(&blob, mesh, json!([]), Transform::IDENTITY),
                Err(LbsmError::SubMeshRangeMismatch { index_count: 6, .. })
            ));
        }
    }

    #[test]
    fn test_submesh_material_out_of_range() {
        let blob = quad_blob();
        let mesh = quad_mesh(json!({ "subMeshes": [{ "drawCount": 6, "materialIndex": 2 }] }));
        assert!(matches!(
            assemble(&blob, mesh, json!([{ "name": "only" }]), Transform::IDENTITY),
            Err(LbsmError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_unsupported_index_stride() {
        let blob = quad_blob();
        let mesh = quad_mesh(json!({ "indices": { "stride": 1, "bufferView": 1 } }));
        assert!(matches!(
            assemble(&blob, mesh, json!([]), Transform::IDENTITY),
            Err(LbsmError::UnsupportedIndexFormat(_))
        ));
    }

    #[test]
    fn test_u32_indices() {
        let mut blob = BlobBuilder::new();
        blob.push_f32("v", &position_uv_vertices(&[([0.0; 3], [0.0; 2]); 3]));
        blob.push_u32("i", &[0, 1, 2]);
        let mesh = quad_mesh(json!({ "vertexCount": 3, "indices": { "stride": 4, "bufferView": 1 } }));

        let transform = Transform::new(Reflection::NegateZ, false);
        let mesh = assemble(&blob, mesh, json!([]), transform).unwrap();
        assert_eq!(mesh.index_format, IndexFormat::U32);
        assert_eq!(mesh.indices(), vec![2, 1, 0]);
    }

    #[test]
    fn test_vertex_stream_size_mismatch() {
        let blob = quad_blob();
        let mesh = quad_mesh(json!({ "vertexCount": 5 }));
        assert!(matches!(
            assemble(&blob, mesh, json!([]), Transform::IDENTITY),
            Err(LbsmError::VertexStreamSizeMismatch { stream: 0, expected: 100, actual: 80 })
        ));
    }

    #[test]
    fn test_vertex_count_without_streams() {
        let mut blob = BlobBuilder::new();
        blob.push_bytes("empty", &[]);
        let mesh = json!({
            "name": "ghost",
            "vertexCount": usize::MAX / 8,
            "vertexStreams": [],
            "indices": { "stride": 2, "bufferView": 0 },
        });
        assert!(matches!(
            assemble(&blob, mesh, json!([]), Transform::IDENTITY),
            Err(LbsmError::VertexStreamSizeMismatch { stream: 0, actual: 0, .. })
        ));
    }

    #[test]
    fn test_empty_mesh_without_streams() {
        let mut blob = BlobBuilder::new();
        blob.push_bytes("empty", &[]);
        let mesh = json!({
            "name": "empty",
            "vertexCount": 0,
            "vertexStreams": [],
            "indices": { "stride": 2, "bufferView": 0 },
        });
        let mesh = assemble(&blob, mesh, json!([]), Transform::IDENTITY).unwrap();
        assert_eq!(mesh.index_count, 0);
        assert!(mesh.vertex_buffers.is_empty());
        assert!(mesh.bounds.is_none());
    }

    #[test]
    fn test_index_past_vertex_count() {
        let mut blob = BlobBuilder::new();
        blob.push_f32("v", &position_uv_vertices(&[([0.0; 3], [0.0; 2]); 3]));
        blob.push_u16("i", &[0, 1, 3]);
        let mesh = quad_mesh(json!({ "vertexCount": 3 }));
        assert!(matches!(
            assemble(&blob, mesh, json!([]), Transform::IDENTITY),
            Err(LbsmError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_reflection_converts_positions_and_winding() {
        let blob = quad_blob();
        let transform = Transform::between(
            CoordinatePreset::InterchangeYUp,
            UvOrigin::LowerLeft,
            CoordinatePreset::EngineNative,
            UvOrigin::LowerLeft,
        );
        let mesh = assemble(&blob, quad_mesh(json!({})), json!([]), transform).unwrap();

        assert!(mesh.owns_vertex_buffer(0));
        assert_eq!(mesh.positions().unwrap()[1], [-1.0, 0.0, 0.0]);
        assert_eq!(mesh.indices(), vec![2, 1, 0, 3, 2, 0]);
        let bounds = mesh.bounds.unwrap();
        assert_eq!(bounds.min, [-1.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [0.0, 1.0, 2.0]);

        // UVs untouched without an origin change.
        let uvs = mesh.read_f32_attribute(VertexSemantic::Tex0).unwrap();
        assert_eq!(uvs[3], vec![0.0, 0.25]);
        // The source blob is never written.
        assert_eq!(read_u16s(&blob.data[80..92]), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_uv_flip_only() {
        let blob = quad_blob();
        let transform = Transform::new(Reflection::Identity, true);
        let mesh = assemble(&blob, quad_mesh(json!({})), json!([]), transform).unwrap();

        let uvs = mesh.read_f32_attribute(VertexSemantic::Tex0).unwrap();
        assert_eq!(uvs[0], vec![0.0, 1.0]);
        assert_eq!(uvs[3], vec![0.0, 0.75]);
        assert_eq!(mesh.positions().unwrap()[2], [1.0, 1.0, 2.0]);
        assert_eq!(mesh.indices(), vec![0, 1, 2, 0, 2, 3]);
        assert!(matches!(mesh.index_buffer, Cow::Borrowed(_)));
    }

    #[test]
    fn test_normals_and_tangents_reflected() {
        let mut blob = BlobBuilder::new();
        // position(3) normal(3) tangent(4) for one vertex.
        blob.push_f32("v", &[1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        blob.push_u16("i", &[0, 0, 0]);
        let mesh = json!({
            "name": "point",
            "vertexCount": 1,
            "vertexStreams": [{
                "bufferView": 0,
                "attributes": [
                    { "semantic": "position", "format": "f32", "dimension": 3 },
                    { "semantic": "normal", "format": "f32", "dimension": 3 },
                    { "semantic": "tangent", "format": "f32", "dimension": 4 },
                ],
            }],
            "indices": { "stride": 2, "bufferView": 1 },
        });

        let transform = Transform::new(Reflection::NegateZ, false);
        let mesh = assemble(&blob, mesh, json!([]), transform).unwrap();
        let values = read_f32s(&mesh.vertex_buffers[0]);
        assert_eq!(values, vec![1.0, 2.0, -3.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_integer_uv_flip() {
        let mut blob = BlobBuilder::new();
        blob.push_f32("p", &[0.0, 0.0, 0.0]);
        blob.push_u16("uv", &[100, 1000]);
        blob.push_u16("i", &[0, 0, 0]);
        let mesh = json!({
            "name": "unorm",
            "vertexCount": 1,
            "vertexStreams": [
                { "bufferView": 0, "attributes": [{ "semantic": "position", "format": "f32", "dimension": 3 }] },
                { "bufferView": 1, "attributes": [{ "semantic": "tex0", "format": "u16", "dimension": 2 }] },
            ],
            "indices": { "stride": 2, "bufferView": 2 },
        });

        let transform = Transform::new(Reflection::Identity, true);
        let mesh = assemble(&blob, mesh, json!([]), transform).unwrap();
        assert!(!mesh.owns_vertex_buffer(0));
        assert_eq!(read_u16s(&mesh.vertex_buffers[1]), vec![100, u16::MAX - 1000]);
    }

    #[test]
    fn test_non_float_position_cannot_reflect() {
        let mut blob = BlobBuilder::new();
        blob.push_u16("p", &[1, 2, 3]);
        blob.push_u16("i", &[0, 0, 0]);
        let mesh = json!({
            "name": "packed",
            "vertexCount": 1,
            "vertexStreams": [
                { "bufferView": 0, "attributes": [{ "semantic": "position", "format": "u16", "dimension": 3 }] },
            ],
            "indices": { "stride": 2, "bufferView": 1 },
        });

        let transform = Transform::new(Reflection::NegateX, false);
        assert!(matches!(
            assemble(&blob, mesh.clone(), json!([]), transform),
            Err(LbsmError::UnsupportedVertexFormat(_))
        ));
        // Without a reflection the packed positions pass through, with no bounds.
        let mesh = assemble(&blob, mesh, json!([]), Transform::IDENTITY).unwrap();
        assert!(mesh.bounds.is_none());
    }
}
