//! Typed scene document carried by the `JSON` chunk.
//!
//! These types deserialize straight from the JSON text. Older exporter
//! spellings are accepted as aliases. [`decode_document`] reports every
//! failure with the path of the offending field.

pub mod schema;

pub use schema::decode_document;

use crate::types::CoordinateSystem;
use serde::{Deserialize, Serialize};

/// The decoded scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub asset: Asset,
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub textures: Vec<Texture>,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    /// The rig was called `joints` at the root before it became `bones`.
    #[serde(default, alias = "joints")]
    pub bones: Vec<Bone>,
}

/// Asset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Format revision string written by the exporter (e.g. `alpha`).
    pub version: String,
    /// Declared convention; `None` for revisions that predate the field.
    pub coordinate_system: Option<CoordinateSystem>,
}

/// A named byte range of the binary blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    #[serde(default)]
    pub name: String,
    pub byte_offset: usize,
    pub byte_length: usize,
}

/// How a record points at a buffer view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BufferViewRef {
    /// Ordinal into `bufferViews`.
    Index(usize),
    /// Lookup by `bufferViews[].name`, as written by the older exporters.
    Name(String),
}

impl std::fmt::Display for BufferViewRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferViewRef::Index(i) => write!(f, "#{}", i),
            BufferViewRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// What a vertex attribute means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VertexSemantic {
    Position,
    Normal,
    Tangent,
    Color,
    Tex0,
    Tex1,
    BlendWeights,
    /// Older exporters wrote `blendJoints`.
    #[serde(alias = "blendJoints")]
    BlendIndices,
}

impl VertexSemantic {
    /// Texture coordinate channels.
    pub fn is_uv(&self) -> bool {
        matches!(self, VertexSemantic::Tex0 | VertexSemantic::Tex1)
    }
}

impl std::fmt::Display for VertexSemantic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VertexSemantic::Position => "position",
            VertexSemantic::Normal => "normal",
            VertexSemantic::Tangent => "tangent",
            VertexSemantic::Color => "color",
            VertexSemantic::Tex0 => "tex0",
            VertexSemantic::Tex1 => "tex1",
            VertexSemantic::BlendWeights => "blendWeights",
            VertexSemantic::BlendIndices => "blendIndices",
        };
        write!(f, "{}", name)
    }
}

/// Component storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexFormat {
    F32,
    U16,
    U32,
}

impl VertexFormat {
    /// Size of one component in bytes.
    pub fn size(&self) -> usize {
        match self {
            VertexFormat::F32 | VertexFormat::U32 => 4,
            VertexFormat::U16 => 2,
        }
    }
}

impl std::fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VertexFormat::F32 => write!(f, "f32"),
            VertexFormat::U16 => write!(f, "u16"),
            VertexFormat::U32 => write!(f, "u32"),
        }
    }
}

/// One attribute of an interleaved vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(alias = "vertexAttribute")]
    pub semantic: VertexSemantic,
    pub format: VertexFormat,
    /// Component count, 1 to 4.
    #[serde(deserialize_with = "schema::dimension")]
    pub dimension: usize,
}

impl Attribute {
    pub fn new(semantic: VertexSemantic, format: VertexFormat, dimension: usize) -> Self {
        Self {
            semantic,
            format,
            dimension,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.format.size() * self.dimension
    }
}

/// An interleaved vertex buffer and the attributes packed in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexStream {
    pub buffer_view: BufferViewRef,
    pub attributes: Vec<Attribute>,
}

impl VertexStream {
    /// Bytes per vertex in this stream.
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(Attribute::byte_size).sum()
    }
}

/// Index buffer declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSpec {
    /// Bytes per index; only 2 and 4 are assemblable.
    pub stride: usize,
    pub buffer_view: BufferViewRef,
}

/// A draw range of the index buffer bound to one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubMesh {
    #[serde(
        default,
        rename = "materialIndex",
        alias = "material",
        deserialize_with = "schema::optional_index"
    )]
    pub material: Option<usize>,
    pub draw_count: usize,
}

/// Sparse per-vertex displacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorphTarget {
    pub name: String,
    pub index_stride: usize,
    /// Affected vertex indices.
    #[serde(rename = "indexBufferView", alias = "indices")]
    pub indices: BufferViewRef,
    /// One `f32 × 3` displacement per index.
    #[serde(rename = "positionBufferView", alias = "positions")]
    pub positions: BufferViewRef,
}

/// A mesh description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    pub name: String,
    pub vertex_count: usize,
    #[serde(deserialize_with = "schema::vertex_streams")]
    pub vertex_streams: Vec<VertexStream>,
    pub indices: IndexSpec,
    #[serde(default)]
    pub sub_meshes: Vec<SubMesh>,
    /// Indices into [`SceneDocument::bones`], one per skinning slot.
    #[serde(default)]
    pub joints: Vec<usize>,
    #[serde(default)]
    pub morph_targets: Vec<MorphTarget>,
}

impl Mesh {
    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty()
    }
}

/// A skeleton bone in the document's coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(
        default,
        rename = "parentIndex",
        alias = "parent",
        deserialize_with = "schema::optional_index"
    )]
    pub parent: Option<usize>,
    pub head: [f32; 3],
    pub tail: Option<[f32; 3]>,
}

/// An encoded image stored in the blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    #[serde(default)]
    pub name: String,
    pub buffer_view: BufferViewRef,
    pub mime_type: Option<String>,
}

/// Surface description referenced by submeshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default)]
    pub name: String,
    /// Base color, RGBA.
    #[serde(default = "schema::white")]
    pub color: [f32; 4],
    #[serde(default, deserialize_with = "schema::optional_index")]
    pub color_texture: Option<usize>,
}
