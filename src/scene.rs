//! The decode pipeline.
//!
//! [`Scene::parse`] runs the container reader, the document decoder and the
//! scene-wide steps (coordinate transform, skeleton, materials). Meshes are
//! assembled on demand so that one malformed mesh does not hide the others.

use crate::buffer_view::BufferViewResolver;
use crate::container::parse_container;
use crate::convert::{select_transform_to, CoordinatePreset, Transform, DEFAULT_UV_ORIGIN};
use crate::document::{decode_document, SceneDocument};
use crate::error::{LbsmError, Result};
use crate::material::{resolve_materials, resolve_textures, MaterialDescriptor, TextureDescriptor};
use crate::mesh::{assemble_mesh, MeshBuffers};
use crate::morph::build_morph_target;
use crate::skin::{bind_skeleton, Skeleton};
use crate::types::{CoordinateSystem, UvOrigin};

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Axis convention meshes are converted into.
    pub target: CoordinatePreset,
    /// UV origin meshes are converted into.
    pub target_uv_origin: UvOrigin,
    /// Accept buffer views referenced by name.
    pub allow_name_references: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            target: CoordinatePreset::EngineNative,
            target_uv_origin: DEFAULT_UV_ORIGIN,
            allow_name_references: true,
        }
    }
}

impl DecoderConfig {
    pub fn with_target(mut self, target: CoordinatePreset) -> Self {
        self.target = target;
        self
    }

    pub fn with_target_uv_origin(mut self, uv_origin: UvOrigin) -> Self {
        self.target_uv_origin = uv_origin;
        self
    }

    pub fn with_name_references(mut self, allow: bool) -> Self {
        self.allow_name_references = allow;
        self
    }
}

/// A parsed container with its scene-wide data resolved.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    version: u32,
    document: SceneDocument,
    blob: &'a [u8],
    source: CoordinateSystem,
    transform: Transform,
    skeleton: Skeleton,
    textures: Vec<TextureDescriptor<'a>>,
    materials: Vec<MaterialDescriptor>,
    config: DecoderConfig,
}

impl<'a> Scene<'a> {
    pub fn parse(bytes: &'a [u8], config: &DecoderConfig) -> Result<Self> {
        let container = parse_container(bytes)?;
        let document = decode_document(container.json()?)?;
        let blob = container.binary().unwrap_or(&[]);

        let source = match &document.asset.coordinate_system {
            Some(declared) => *declared,
            None => {
                tracing::debug!("no coordinate system declared, assuming engine-native");
                CoordinatePreset::EngineNative.with_uv_origin(DEFAULT_UV_ORIGIN)
            }
        };
        let transform = select_transform_to(&source, config.target, config.target_uv_origin)?;
        let skeleton = bind_skeleton(&document.bones, &transform)?;

        let resolver = BufferViewResolver::new(&document, blob, config.allow_name_references);
        let textures = resolve_textures(&document, &resolver)?;
        let materials = resolve_materials(&document)?;

        tracing::debug!(
            version = container.version,
            meshes = document.meshes.len(),
            bones = skeleton.len(),
            materials = materials.len(),
            textures = textures.len(),
            source = %source.axes,
            transform = ?transform,
            "parsed scene"
        );

        Ok(Self {
            version: container.version,
            document,
            blob,
            source,
            transform,
            skeleton,
            textures,
            materials,
            config: config.clone(),
        })
    }

    /// Container format version from the header.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// The binary blob; empty when the container has no `BIN` chunk.
    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }

    /// The convention the document was authored in.
    pub fn source_coordinate_system(&self) -> &CoordinateSystem {
        &self.source
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn textures(&self) -> &[TextureDescriptor<'a>] {
        &self.textures
    }

    pub fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn mesh_count(&self) -> usize {
        self.document.meshes.len()
    }

    fn resolver(&self) -> BufferViewResolver<'_, 'a> {
        BufferViewResolver::new(&self.document, self.blob, self.config.allow_name_references)
    }

    /// Assemble one mesh with its bind poses and blend shapes.
    pub fn assemble_mesh(&self, index: usize) -> Result<MeshBuffers<'a>> {
        let mesh = self.document.meshes.get(index).ok_or_else(|| {
            LbsmError::InvalidReference(format!(
                "mesh {} out of range ({} meshes)",
                index,
                self.document.meshes.len()
            ))
        })?;
        let resolver = self.resolver();

        let mut buffers = assemble_mesh(&self.document, mesh, &resolver, &self.transform)?;
        if mesh.is_skinned() {
            buffers.bind_poses = self.skeleton.bind_poses(&mesh.joints)?;
        }
        buffers.blend_shapes = mesh
            .morph_targets
            .iter()
            .map(|morph| {
                build_morph_target(
                    morph,
                    mesh.indices.stride,
                    &resolver,
                    mesh.vertex_count,
                    &self.transform,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(buffers)
    }

    /// Assemble every mesh independently; failures are reported per mesh.
    pub fn meshes(&self) -> impl Iterator<Item = Result<MeshBuffers<'a>>> + '_ {
        (0..self.mesh_count()).map(move |i| self.assemble_mesh(i))
    }

    /// Assemble every mesh, stopping at the first failure.
    pub fn assemble_all(&self) -> Result<Vec<MeshBuffers<'a>>> {
        self.meshes().collect()
    }

    /// Assemble everything into one owned result.
    pub fn into_asset(self) -> Result<DecodedAsset<'a>> {
        let meshes = self.assemble_all()?;
        Ok(DecodedAsset {
            version: self.version,
            transform: self.transform,
            skeleton: self.skeleton,
            materials: self.materials,
            textures: self.textures,
            meshes,
            document: self.document,
        })
    }
}

/// Everything decoded from one container.
#[derive(Debug, Clone)]
pub struct DecodedAsset<'a> {
    pub version: u32,
    pub document: SceneDocument,
    pub transform: Transform,
    pub skeleton: Skeleton,
    pub materials: Vec<MaterialDescriptor>,
    pub textures: Vec<TextureDescriptor<'a>>,
    pub meshes: Vec<MeshBuffers<'a>>,
}
