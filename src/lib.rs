//! # LBSM
//!
//! A Rust library for decoding LBSM skinned-mesh containers.
//!
//! ## Overview
//!
//! An LBSM file is a small chunked container: a `JSON` chunk carrying the
//! scene document (buffer views, meshes, bones, materials, textures) and a
//! `BIN` chunk carrying the raw bytes those views point into. This library
//! parses the container, decodes and validates the document, converts all
//! geometry into one target coordinate convention and produces
//! engine-agnostic mesh buffers, bind poses and blend shapes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lbsm::{decode, Scene, DecoderConfig};
//!
//! // Decode everything, failing on the first error
//! let asset = decode(&bytes)?;
//! for mesh in &asset.meshes {
//!     println!("{}: {} triangles", mesh.name, mesh.triangle_count());
//! }
//!
//! // Or parse once and assemble meshes one at a time
//! let scene = Scene::parse(&bytes, &DecoderConfig::default())?;
//! for result in scene.meshes() {
//!     match result {
//!         Ok(mesh) => { /* upload */ }
//!         Err(e) => eprintln!("skipping mesh: {}", e),
//!     }
//! }
//! ```
//!
//! ## Coordinate conventions
//!
//! Documents declare the axes and UV origin they were authored in. Meshes are
//! converted into [`DecoderConfig::target`] (engine-native by default), with
//! triangle winding reversed whenever the conversion mirrors the scene.

pub mod buffer_view;
pub mod container;
pub mod convert;
pub mod document;
pub mod error;
pub mod material;
pub mod mesh;
pub mod morph;
pub mod scene;
pub mod skin;
pub mod types;

#[cfg(test)]
mod test_util;

// Re-export main types for convenience
pub use buffer_view::{BufferViewResolver, ByteRange};
pub use container::{parse_container, Chunk, ChunkType, Container};
pub use convert::{select_transform, select_transform_to, CoordinatePreset, Reflection, Transform};
pub use document::{decode_document, SceneDocument};
pub use error::{LbsmError, Result};
pub use material::{
    DecodedImage, ImageCrateDecoder, ImageDecoder, MaterialDescriptor, TextureDescriptor,
};
pub use mesh::{IndexFormat, MeshBuffers, SubMeshRange, VertexLayout};
pub use morph::BlendShapeFrame;
pub use scene::{DecodedAsset, DecoderConfig, Scene};
pub use skin::{Skeleton, SkeletonBone};
pub use types::{Axis, AxisSystem, BoundingBox, CoordinateSystem, SignedAxis, UvOrigin};

/// Decode a whole container with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<DecodedAsset<'_>> {
    decode_with_config(bytes, &DecoderConfig::default())
}

/// Decode a whole container, converting into the configured convention.
pub fn decode_with_config<'a>(bytes: &'a [u8], config: &DecoderConfig) -> Result<DecodedAsset<'a>> {
    Scene::parse(bytes, config)?.into_asset()
}
